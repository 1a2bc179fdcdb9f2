//! Upload ingestion route.
//!
//! Accepts a single multipart `file` field, validates its declared kind and
//! size, and stores it content-addressed (see [`crate::storage`]). The
//! response carries the deduplicated storage path for the caller to persist
//! alongside its quiz.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use crate::context::AppContext;
use crate::error::AppError;

/// Audio kinds accepted for upload.
const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/ogg",
    "audio/wav",
    "audio/x-m4a",
];

/// Upload response payload.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    /// Deduplicated storage path to persist in the quiz's audio record.
    pub filepath: String,
    /// Derived filename: `<sha256>.<ext>`.
    pub filename: String,
}

/// Fallback extension for uploads whose filename carries none.
fn extension_for_content_type(content_type: &str) -> &'static str {
    match content_type {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/ogg" => "ogg",
        "audio/wav" => "wav",
        "audio/x-m4a" => "m4a",
        _ => "bin",
    }
}

/// Extension from an uploaded filename, if it has one.
fn extension_from_filename(name: &str) -> Option<&str> {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// POST /api/upload
#[utoipa::path(
    post,
    path = "/api/upload",
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "Missing file, bad kind, or too large"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn upload(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| quaver_core::Error::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(str::to_owned)
            .ok_or_else(|| quaver_core::Error::Validation("Missing content type".into()))?;

        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(quaver_core::Error::Validation("Invalid file type".into()).into());
        }

        let file_name = field.file_name().map(str::to_owned);

        let data = field
            .bytes()
            .await
            .map_err(|e| quaver_core::Error::Validation(format!("Error reading upload: {e}")))?;

        let max = ctx.config.storage.max_upload_bytes;
        if data.len() as u64 > max {
            return Err(quaver_core::Error::Validation(format!(
                "File too large (max {} bytes)",
                max
            ))
            .into());
        }

        let extension = file_name
            .as_deref()
            .and_then(extension_from_filename)
            .unwrap_or_else(|| extension_for_content_type(&content_type));

        let stored = ctx.store.store(&data, extension)?;

        if stored.deduplicated {
            tracing::debug!(hash = %stored.hash, "Upload deduplicated against existing file");
        } else {
            tracing::info!(hash = %stored.hash, size = stored.size, "Stored new upload");
        }

        return Ok(Json(UploadResponse {
            success: true,
            filepath: stored.filepath,
            filename: stored.filename,
        }));
    }

    Err(quaver_core::Error::Validation("No file provided".into()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_from_regular_filename() {
        assert_eq!(extension_from_filename("song.mp3"), Some("mp3"));
        assert_eq!(extension_from_filename("a.b.ogg"), Some("ogg"));
    }

    #[test]
    fn extension_missing_or_degenerate() {
        assert_eq!(extension_from_filename("noext"), None);
        assert_eq!(extension_from_filename(".hidden"), None);
        assert_eq!(extension_from_filename("trailing."), None);
    }

    #[test]
    fn fallback_extension_by_kind() {
        assert_eq!(extension_for_content_type("audio/mpeg"), "mp3");
        assert_eq!(extension_for_content_type("audio/mp3"), "mp3");
        assert_eq!(extension_for_content_type("audio/ogg"), "ogg");
        assert_eq!(extension_for_content_type("audio/wav"), "wav");
        assert_eq!(extension_for_content_type("audio/x-m4a"), "m4a");
    }

    #[test]
    fn allowed_kinds_match_upload_contract() {
        assert!(ALLOWED_CONTENT_TYPES.contains(&"audio/mpeg"));
        assert!(ALLOWED_CONTENT_TYPES.contains(&"audio/x-m4a"));
        assert!(!ALLOWED_CONTENT_TYPES.contains(&"audio/flac"));
        assert!(!ALLOWED_CONTENT_TYPES.contains(&"video/mp4"));
    }
}
