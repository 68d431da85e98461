use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use std::env;

use crate::services::session_service::SessionStore;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    environment: String,
    version: String,
    base_currency: String,
    strict_currencies: bool,
    active_sessions: usize,
}

pub async fn health_check(store: web::Data<SessionStore>) -> impl Responder {
    let health = HealthStatus {
        status: "ok".to_string(),
        environment: env::var("RUST_ENV").unwrap_or("development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
        base_currency: store.currencies().base_currency().to_string(),
        strict_currencies: store.currencies().is_strict(),
        active_sessions: store.len(),
    };

    HttpResponse::Ok().json(health)
}
