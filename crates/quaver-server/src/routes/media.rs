//! Audio streaming route handlers with HTTP range request support.
//!
//! Serves stored quiz audio directly, honoring `Range` headers so that
//! browser `<audio>` elements can seek. Out-of-bounds and malformed ranges
//! are repaired (see [`crate::range`]) rather than rejected: a broken seek
//! must degrade to playback from the start, not an error page.

use axum::body::Body;
use axum::extract::{Extension, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use quaver_core::{AudioId, UserId};
use quaver_db::models::Audio;
use quaver_db::queries::{audios, quizzes};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::access::{self, AccessDecision};
use crate::context::AppContext;
use crate::error::AppError;
use crate::range::ByteRange;

/// Streaming chunk size.
const CHUNK_SIZE: usize = 64 * 1024;

/// Cache policy for audio responses. Content-addressed files never change,
/// but access to them can be revoked, so the TTL stays short.
const CACHE_CONTROL: &str = "public, max-age=3600";

/// Map a stored file extension to its served MIME type.
///
/// Only the audio kinds accepted at upload are servable; anything else is
/// reported as unsupported.
fn content_type_for(filepath: &str) -> Option<&'static str> {
    let ext = filepath.rsplit('.').next()?.to_lowercase();
    match ext.as_str() {
        "mp3" => Some("audio/mpeg"),
        "ogg" => Some("audio/ogg"),
        "wav" => Some("audio/wav"),
        "m4a" => Some("audio/x-m4a"),
        _ => None,
    }
}

/// Look up the audio record and run the access gate.
///
/// Returns the ready-made early-exit response (404/403, or 500 on a lookup
/// failure) as the error branch. The unknown-id case deliberately reads
/// `Audio not found` rather than a validation error: media identifiers are
/// opaque to clients.
fn resolve_and_authorize(
    ctx: &AppContext,
    audio_id: &str,
    user_id: UserId,
) -> Result<Audio, Response> {
    let not_found = || (StatusCode::NOT_FOUND, "Audio not found").into_response();
    let internal = |e: quaver_core::Error| AppError::from(e).into_response();

    let Ok(id) = audio_id.parse::<AudioId>() else {
        return Err(not_found());
    };

    let conn = quaver_db::pool::get_conn(&ctx.db).map_err(internal)?;

    let audio = audios::get_audio(&conn, id)
        .map_err(internal)?
        .ok_or_else(not_found)?;

    let attrs = match audio.quiz_id {
        Some(quiz_id) => quizzes::get_access_attributes(&conn, quiz_id).map_err(internal)?,
        None => None,
    };

    if let AccessDecision::Denied(reason) = access::evaluate(user_id, attrs.as_ref()) {
        tracing::debug!(audio_id = %id, user_id = %user_id, reason, "Audio access denied");
        return Err((StatusCode::FORBIDDEN, "Forbidden").into_response());
    }

    Ok(audio)
}

/// GET /api/media/{audio_id}
///
/// Serves the stored file with range support: 200 for full-file requests,
/// 206 with `Content-Range` when a `Range` header is present.
pub async fn get_audio(
    State(ctx): State<AppContext>,
    Path(audio_id): Path<String>,
    Extension(user_id): Extension<UserId>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let audio = match resolve_and_authorize(&ctx, &audio_id, user_id) {
        Ok(audio) => audio,
        Err(early) => return Ok(early),
    };

    let Some(content_type) = content_type_for(&audio.filepath) else {
        return Ok((StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported file type").into_response());
    };

    let file_path = std::path::Path::new(&audio.filepath);

    // The file can vanish between the DB lookup and the open; that is an
    // internal inconsistency, not a client-visible 404.
    let metadata = tokio::fs::metadata(file_path).await?;
    let total = metadata.len();

    if total == 0 {
        // A zero-length file cannot satisfy any range.
        return Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type.to_string()),
                (header::CONTENT_LENGTH, "0".to_string()),
                (header::ACCEPT_RANGES, "bytes".to_string()),
                (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
            ],
            Body::empty(),
        )
            .into_response());
    }

    let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());

    match range_header {
        Some(value) => {
            let range = ByteRange::parse(Some(value), total);
            let length = range.len();

            let mut file = tokio::fs::File::open(file_path).await?;
            file.seek(std::io::SeekFrom::Start(range.start)).await?;

            // Take limits reads to exactly `length` bytes; the handle is
            // dropped with the stream on completion or disconnect.
            let stream = ReaderStream::with_capacity(file.take(length), CHUNK_SIZE);
            let body = Body::from_stream(stream);

            Ok((
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_TYPE, content_type.to_string()),
                    (
                        header::CONTENT_RANGE,
                        format!("bytes {range}/{total}"),
                    ),
                    (header::CONTENT_LENGTH, length.to_string()),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                    (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
                ],
                body,
            )
                .into_response())
        }
        None => {
            let file = tokio::fs::File::open(file_path).await?;

            let stream = ReaderStream::with_capacity(file, CHUNK_SIZE);
            let body = Body::from_stream(stream);

            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type.to_string()),
                    (header::CONTENT_LENGTH, total.to_string()),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                    (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
                ],
                body,
            )
                .into_response())
        }
    }
}

/// HEAD /api/media/{audio_id}
///
/// Same lookup and access gate as GET, but headers only: no range
/// handling and no body bytes.
pub async fn head_audio(
    State(ctx): State<AppContext>,
    Path(audio_id): Path<String>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, AppError> {
    let audio = match resolve_and_authorize(&ctx, &audio_id, user_id) {
        Ok(audio) => audio,
        Err(early) => return Ok(early),
    };

    let Some(content_type) = content_type_for(&audio.filepath) else {
        return Ok((StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported file type").into_response());
    };

    let metadata = tokio::fs::metadata(std::path::Path::new(&audio.filepath)).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_LENGTH, metadata.len().to_string()),
            (header::ACCEPT_RANGES, "bytes".to_string()),
            (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
        ],
        Body::empty(),
    )
        .into_response())
}
