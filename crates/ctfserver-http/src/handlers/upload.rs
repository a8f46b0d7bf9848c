use std::io;

use actix_multipart::Multipart;
use actix_web::http::header::{self, HeaderMap};
use actix_web::{HttpRequest, HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use tokio_util::io::StreamReader;
use tracing::warn;

use crate::error::ApiError;
use crate::models::UploadResponse;
use crate::state::AppState;

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

/// Bytes of boundaries and part headers a request body may carry on top of
/// the file itself.
const MULTIPART_FRAMING_ALLOWANCE: u64 = 16 * 1024;

/// Accept a single file from the `file` field of a multipart body.
///
/// The file size is estimated before any content is read, from the part's
/// own `Content-Length` or else the request's minus framing, and checked
/// against the ceiling. The store enforces the exact ceiling on the bytes
/// actually received.
pub async fn upload(
    state: web::Data<AppState>,
    req: HttpRequest,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let body_size = content_length(req.headers());

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(malformed)?;

        if field.name() != Some(FILE_FIELD) {
            while let Some(chunk) = field.next().await {
                chunk.map_err(malformed)?;
            }
            continue;
        }

        let raw_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned)
            .ok_or(ApiError::NoFileProvided)?;

        let declared_size = content_length(field.headers()).unwrap_or_else(|| {
            body_size
                .unwrap_or(0)
                .saturating_sub(MULTIPART_FRAMING_ALLOWANCE)
        });

        let filename = state
            .validator
            .validate(declared_size, &raw_name)
            .inspect_err(|e| warn!(filename = %raw_name, error = ?e, "upload rejected"))?;

        let body = field.map_err(|e| io::Error::other(e.to_string()));
        let reader = StreamReader::new(Box::pin(body));
        let result = state.store.store(&filename, reader).await?;

        return Ok(HttpResponse::Created().json(UploadResponse::from(result)));
    }

    Err(ApiError::NoFileProvided)
}

fn malformed(err: actix_multipart::MultipartError) -> ApiError {
    warn!(error = %err, "failed to parse multipart body");
    ApiError::MalformedForm(err.to_string())
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}
