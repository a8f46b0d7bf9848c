use actix_web::{HttpResponse, Responder};

use crate::models::HealthResponse;

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse::healthy())
}
