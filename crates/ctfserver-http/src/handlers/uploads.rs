use actix_web::{HttpRequest, HttpResponse, web};

use crate::error::ApiError;
use crate::handlers::{PLAIN_TEXT, wants_json};
use crate::models::UploadsListResponse;
use crate::state::AppState;

/// Contents of the upload directory.
///
/// The text form keeps directory order; the JSON form is newest first.
pub async fn uploads(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let lister = state.lister.clone();
    let mut listing = web::block(move || lister.list()).await??;

    if wants_json(&req) {
        listing.sort_newest_first();
        return Ok(HttpResponse::Ok().json(UploadsListResponse::from(listing)));
    }
    Ok(HttpResponse::Ok().content_type(PLAIN_TEXT).body(listing.pretty))
}
