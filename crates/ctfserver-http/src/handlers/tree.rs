use actix_web::{HttpRequest, HttpResponse, web};

use ctfserver_scan::render_pretty;

use crate::error::ApiError;
use crate::handlers::{PLAIN_TEXT, wants_json};
use crate::models::{FileTreeResponse, PrettyFileTreeResponse};
use crate::state::AppState;

/// JSON tree of the served root.
pub async fn filetree(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let builder = state.tree_builder.clone();
    let root = web::block(move || builder.build()).await??;

    Ok(HttpResponse::Ok().json(FileTreeResponse::new(root)))
}

/// Box-drawing tree of the served root; JSON when negotiated.
pub async fn pretty_filetree(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let builder = state.tree_builder.clone();
    let (root, text) = web::block(move || {
        builder.build().map(|root| {
            let text = render_pretty(&root);
            (root, text)
        })
    })
    .await??;

    if wants_json(&req) {
        return Ok(HttpResponse::Ok().json(PrettyFileTreeResponse::new(root, text)));
    }
    Ok(HttpResponse::Ok().content_type(PLAIN_TEXT).body(text))
}
