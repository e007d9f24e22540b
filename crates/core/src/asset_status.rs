//! Asset processing status and the lifecycle transition table.
//!
//! An asset moves through a fixed sequence of external processing stages:
//!
//! ```text
//! created
//!   -> generating sparse point cloud   (colmap job queued)
//!   -> generating 3d splat             (colmap point cloud reported)
//!   -> processing ptv3                 (gaussian splat reported)
//!   -> processing saga                 (ptv3 segmentation reported)
//!   -> completed                       (saga segmentation reported)
//! ```
//!
//! Every move goes through [`next_status`]. A pair that is not in the table
//! yields `None` and the caller leaves the status alone.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// AssetStatus
// ---------------------------------------------------------------------------

/// Processing status of an asset. Serialized as the human-readable label
/// stored in the `assets.status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetStatus {
    #[serde(rename = "created")]
    Created,
    #[serde(rename = "generating sparse point cloud")]
    GeneratingSparsePointCloud,
    #[serde(rename = "generating 3d splat")]
    Generating3dSplat,
    #[serde(rename = "processing ptv3")]
    ProcessingPtv3,
    #[serde(rename = "processing saga")]
    ProcessingSaga,
    #[serde(rename = "completed")]
    Completed,
}

impl AssetStatus {
    /// All statuses in pipeline order.
    pub const ALL: [AssetStatus; 6] = [
        Self::Created,
        Self::GeneratingSparsePointCloud,
        Self::Generating3dSplat,
        Self::ProcessingPtv3,
        Self::ProcessingSaga,
        Self::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::GeneratingSparsePointCloud => "generating sparse point cloud",
            Self::Generating3dSplat => "generating 3d splat",
            Self::ProcessingPtv3 => "processing ptv3",
            Self::ProcessingSaga => "processing saga",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown asset status: '{s}'")))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl TryFrom<String> for AssetStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PipelineStage
// ---------------------------------------------------------------------------

/// An external processing stage that reports its output through a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Colmap sparse reconstruction; output is a point cloud.
    SparsePointCloud,
    /// Gaussian splatting; output is a splat file.
    GaussianSplat,
    /// PTv3 point-cloud segmentation; output is a directory.
    Ptv3Segmentation,
    /// SAGA splat segmentation; output is a directory.
    SagaSegmentation,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 4] = [
        Self::SparsePointCloud,
        Self::GaussianSplat,
        Self::Ptv3Segmentation,
        Self::SagaSegmentation,
    ];

    /// Path segment used by the worker callback routes.
    pub fn route_segment(&self) -> &'static str {
        match self {
            Self::SparsePointCloud => "pointcloud",
            Self::GaussianSplat => "gaussian",
            Self::Ptv3Segmentation => "ptv3",
            Self::SagaSegmentation => "saga",
        }
    }

    pub fn from_route_segment(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.route_segment() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown pipeline stage: '{s}'")))
    }

    /// The status an asset must be in for this stage's report to advance it.
    pub fn expected_status(&self) -> AssetStatus {
        match self {
            Self::SparsePointCloud => AssetStatus::GeneratingSparsePointCloud,
            Self::GaussianSplat => AssetStatus::Generating3dSplat,
            Self::Ptv3Segmentation => AssetStatus::ProcessingPtv3,
            Self::SagaSegmentation => AssetStatus::ProcessingSaga,
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.route_segment())
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Something that happened to an asset which may move its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The colmap job for a freshly created asset was handed to the outbox.
    ColmapQueued,
    /// A worker reported the output of a stage.
    StageCompleted(PipelineStage),
}

/// Look up the status that follows `current` when `event` happens.
///
/// Returns `None` when the pair is not a legal transition.
pub fn next_status(current: AssetStatus, event: LifecycleEvent) -> Option<AssetStatus> {
    use AssetStatus as S;
    use LifecycleEvent as E;
    use PipelineStage as P;

    match (current, event) {
        (S::Created, E::ColmapQueued) => Some(S::GeneratingSparsePointCloud),
        (S::GeneratingSparsePointCloud, E::StageCompleted(P::SparsePointCloud)) => {
            Some(S::Generating3dSplat)
        }
        (S::Generating3dSplat, E::StageCompleted(P::GaussianSplat)) => Some(S::ProcessingPtv3),
        (S::ProcessingPtv3, E::StageCompleted(P::Ptv3Segmentation)) => Some(S::ProcessingSaga),
        (S::ProcessingSaga, E::StageCompleted(P::SagaSegmentation)) => Some(S::Completed),
        _ => None,
    }
}
