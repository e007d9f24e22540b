//! Capture type of an uploaded asset.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// How the raw capture was produced. Lidar captures ship their own point
/// cloud alongside the photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Lidar,
    NonLidar,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lidar => "lidar",
            Self::NonLidar => "non_lidar",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "lidar" => Ok(Self::Lidar),
            "non_lidar" => Ok(Self::NonLidar),
            _ => Err(CoreError::Validation(format!(
                "Invalid asset type: '{s}'. Must be one of: lidar, non_lidar"
            ))),
        }
    }
}

impl TryFrom<String> for AssetType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names() {
        assert_eq!(AssetType::from_str("lidar").unwrap(), AssetType::Lidar);
        assert_eq!(AssetType::from_str("non_lidar").unwrap(), AssetType::NonLidar);
        assert_eq!(
            serde_json::to_value(AssetType::NonLidar).unwrap(),
            serde_json::json!("non_lidar")
        );
    }

    #[test]
    fn rejects_retired_capture_kinds() {
        assert!(AssetType::from_str("photo").is_err());
        assert!(AssetType::from_str("video").is_err());
        assert!(AssetType::from_str("LIDAR").is_err());
    }
}
