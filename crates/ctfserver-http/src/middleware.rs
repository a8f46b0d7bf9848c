//! Request logging and panic recovery.
//!
//! Both are plain async functions meant for
//! [`actix_web::middleware::from_fn`]. Register [`recover_panics`] first and
//! [`log_requests`] second so the access log also records the 500 produced
//! for a panicking handler.
//!
//! Neither middleware may hold a clone of the `HttpRequest` while the inner
//! service runs: the router needs the only reference to fill in match info.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::Next;
use actix_web::Error;
use futures::FutureExt;
use tracing::{error, info};

use crate::error::ApiError;

/// Log one line per request with its outcome and duration.
///
/// Errors from inner middleware are logged with the status their response
/// will carry, then passed through unchanged.
pub async fn log_requests<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req.path().to_string();
    let peer = req
        .connection_info()
        .peer_addr()
        .unwrap_or("-")
        .to_string();
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let res = next.call(req).await;

    let status = match &res {
        Ok(res) => res.status(),
        Err(err) => err.as_response_error().status_code(),
    };
    info!(
        method = %method,
        path = %path,
        peer = %peer,
        user_agent = %user_agent,
        status = status.as_u16(),
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "request completed"
    );
    res
}

/// Turn a panic inside the handler chain into a JSON 500.
///
/// The request is gone once the inner future unwinds, so the 500 travels
/// as an [`ApiError::Panicked`] and actix renders it.
pub async fn recover_panics<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let method = req.method().to_string();
    let path = req.path().to_string();

    match AssertUnwindSafe(async move { next.call(req).await })
        .catch_unwind()
        .await
    {
        Ok(res) => res,
        Err(panic) => {
            let message = panic_message(&*panic).to_string();
            error!(
                method = %method,
                path = %path,
                panic = %message,
                "handler panicked"
            );
            Err(ApiError::Panicked(message).into())
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}
