//! Path conventions shared with the storage service.

use crate::error::CoreError;
use crate::types::DbId;

/// Path segment holding raw uploads.
pub const FILES_SEGMENT: &str = "files";

/// Path segment holding generated thumbnails.
pub const THUMBNAIL_SEGMENT: &str = "thumbnail";

/// Map a raw upload directory to the storage path that serves its thumbnail.
///
/// Only whole `files` path segments are replaced, so `/files/profiles/x`
/// becomes `/thumbnail/profiles/x`.
pub fn thumbnail_path(photo_dir_url: &str) -> Result<String, CoreError> {
    let mut replaced = false;
    let mapped: Vec<&str> = photo_dir_url
        .split('/')
        .map(|segment| {
            if segment == FILES_SEGMENT {
                replaced = true;
                THUMBNAIL_SEGMENT
            } else {
                segment
            }
        })
        .collect();

    if !replaced {
        return Err(CoreError::Validation(format!(
            "photoDirUrl must contain a '/{FILES_SEGMENT}/' segment: '{photo_dir_url}'"
        )));
    }
    Ok(mapped.join("/"))
}

/// Longest accepted segmentation identifier.
pub const MAX_UNIQUE_IDENTIFIER_LENGTH: usize = 128;

/// Segmentation identifiers become file names, so only ASCII letters,
/// digits, `-` and `_` are allowed.
pub fn validate_unique_identifier(id: &str) -> Result<(), CoreError> {
    if id.is_empty() || id.len() > MAX_UNIQUE_IDENTIFIER_LENGTH {
        return Err(CoreError::Validation(format!(
            "uniqueIdentifier must be 1-{MAX_UNIQUE_IDENTIFIER_LENGTH} characters"
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CoreError::Validation(
            "uniqueIdentifier may only contain letters, digits, '-' and '_'".into(),
        ));
    }
    Ok(())
}

/// Where the SAGA worker writes the result of an interactive segmentation.
pub fn segmentation_output_path(asset_id: DbId, unique_identifier: &str) -> String {
    format!("/{FILES_SEGMENT}/{asset_id}/{unique_identifier}.ply")
}
