//! Route handlers.

mod health;
mod tree;
mod upload;
mod uploads;

use actix_web::HttpRequest;
use actix_web::http::header;
use actix_web::web;
use serde::Deserialize;

use crate::error::ApiError;

pub use health::health;
pub use tree::{filetree, pretty_filetree};
pub use upload::upload;
pub use uploads::uploads;

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

#[derive(Debug, Default, Deserialize)]
struct FormatQuery {
    format: Option<String>,
}

/// Whether the client asked for JSON instead of the default plain text,
/// either with `Accept: application/json` or `?format=json`.
fn wants_json(req: &HttpRequest) -> bool {
    let accept_json = req
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("application/json"));

    let query_json = web::Query::<FormatQuery>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.into_inner().format)
        .is_some_and(|f| f.eq_ignore_ascii_case("json"));

    accept_json || query_json
}

/// Fallback for known paths hit with the wrong method.
pub async fn method_not_allowed() -> Result<actix_web::HttpResponse, ApiError> {
    Err(ApiError::MethodNotAllowed)
}
