//! HTTP surface of ctfserver.
//!
//! Routes are mounted twice, at the root and under [`API_PREFIX`], so both
//! `curl host:8080/tree` and `curl host:8080/api/v1/tree` work:
//!
//! | path | method | handler |
//! |---|---|---|
//! | `/health` | GET | service status |
//! | `/filetree` | GET | JSON tree of the served root |
//! | `/filetree/pretty`, `/tree`, `/ls` | GET | text tree (JSON on request) |
//! | `/upload` | POST | multipart upload, field `file` |
//! | `/uploads`, `/ul`, `/loot` | GET | text upload list (JSON on request) |
//! | `/files/{path}` | GET | static download from the served root |
//!
//! Any other method on these paths gets a JSON 405.

mod error;
mod handlers;
mod middleware;
mod models;
mod state;

use std::io;

use actix_files::Files;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::from_fn;
use actix_web::{App, Error, HttpServer, web};
use tracing::info;

use ctfserver_core::ServerConfig;

pub use error::ApiError;
pub use middleware::{log_requests, recover_panics};
pub use models::{
    ErrorResponse, FileTreeResponse, HealthResponse, PrettyFileTreeResponse, UploadResponse,
    UploadsListResponse, VERSION,
};
pub use state::AppState;

/// Versioned prefix every route is also mounted under.
pub const API_PREFIX: &str = "/api/v1";

/// Seconds in-flight requests get to finish after a shutdown signal.
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

const PRETTY_TREE_PATHS: [&str; 3] = ["/filetree/pretty", "/tree", "/ls"];
const UPLOADS_PATHS: [&str; 3] = ["/uploads", "/ul", "/loot"];

/// Register application state and all routes on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(web::Data::new(state.clone()))
        .service(web::scope(API_PREFIX).configure(|api| routes(api, state)));
    routes(cfg, state);
}

fn routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.service(
        web::resource("/health")
            .route(web::get().to(handlers::health))
            .default_service(web::to(handlers::method_not_allowed)),
    )
    .service(
        web::resource("/filetree")
            .route(web::get().to(handlers::filetree))
            .default_service(web::to(handlers::method_not_allowed)),
    )
    .service(
        web::resource(PRETTY_TREE_PATHS)
            .route(web::get().to(handlers::pretty_filetree))
            .default_service(web::to(handlers::method_not_allowed)),
    )
    .service(
        web::resource("/upload")
            .route(web::post().to(handlers::upload))
            .default_service(web::to(handlers::method_not_allowed)),
    )
    .service(
        web::resource(UPLOADS_PATHS)
            .route(web::get().to(handlers::uploads))
            .default_service(web::to(handlers::method_not_allowed)),
    )
    .service(Files::new("/files", &state.config.root_dir).use_hidden_files());
}

/// The complete application: middleware plus every route.
///
/// [`recover_panics`] sits closest to the handlers and [`log_requests`]
/// wraps it, so panics still show up in the access log as 500s.
pub fn app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(from_fn(recover_panics))
        .wrap(from_fn(log_requests))
        .configure(move |cfg| configure(cfg, &state))
}

/// Bind and serve until a shutdown signal arrives.
pub async fn serve(config: ServerConfig) -> io::Result<()> {
    let state = AppState::new(config);
    let address = state.config.bind_address();

    info!(
        address = %address,
        root_dir = %state.config.root_dir.display(),
        upload_dir = %state.config.upload_dir.display(),
        max_upload_size = state.config.max_upload_size,
        "starting server"
    );

    HttpServer::new(move || app(state.clone()))
        .bind(&address)?
        .shutdown_timeout(SHUTDOWN_TIMEOUT_SECS)
        .run()
        .await
}

/// Run [`serve`] on a fresh actix system, blocking the calling thread.
pub fn run(config: ServerConfig) -> io::Result<()> {
    actix_web::rt::System::new().block_on(serve(config))
}
