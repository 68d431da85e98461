use actix_web::{web, HttpResponse, Responder, ResponseError};
use serde::Serialize;
use uuid::Uuid;

use crate::error::PricingError;
use crate::services::session_service::{PricingRequest, SessionStore};

fn parse_id(path: web::Path<String>) -> Result<Uuid, HttpResponse> {
    Uuid::parse_str(path.into_inner().as_str())
        .map_err(|_| HttpResponse::BadRequest().json(serde_json::json!({ "error": "Invalid ID" })))
}

fn respond<T: Serialize>(result: Result<T, PricingError>) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(err) => err.error_response(),
    }
}

/*
    POST /api/sessions
*/
pub async fn create(store: web::Data<SessionStore>) -> impl Responder {
    HttpResponse::Created().json(store.create_session())
}

/*
    GET /api/sessions/{id}
*/
pub async fn get_by_id(path: web::Path<String>, store: web::Data<SessionStore>) -> impl Responder {
    let id = match parse_id(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(store.with_session(id, |session| Ok(session.snapshot())))
}

/*
    DELETE /api/sessions/{id}
*/
pub async fn end(path: web::Path<String>, store: web::Data<SessionStore>) -> impl Responder {
    let id = match parse_id(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match store.end_session(id) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => err.error_response(),
    }
}

/*
    POST /api/sessions/{id}/pricing
*/
pub async fn calculate(
    path: web::Path<String>,
    store: web::Data<SessionStore>,
    body: web::Json<PricingRequest>,
) -> impl Responder {
    let id = match parse_id(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let request = body.into_inner();
    respond(store.with_session(id, |session| session.recalculate(request)))
}

/*
    GET /api/sessions/{id}/history
*/
pub async fn get_history(path: web::Path<String>, store: web::Data<SessionStore>) -> impl Responder {
    let id = match parse_id(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(store.with_session(id, |session| {
        session.history().cloned().ok_or(PricingError::NoPricing)
    }))
}

/*
    DELETE /api/sessions/{id}/history
*/
pub async fn reset_history(path: web::Path<String>, store: web::Data<SessionStore>) -> impl Responder {
    let id = match parse_id(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match store.with_session(id, |session| {
        session.reset_history();
        Ok(())
    }) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => err.error_response(),
    }
}

/*
    GET /api/sessions/{id}/comparison
*/
pub async fn get_comparison(path: web::Path<String>, store: web::Data<SessionStore>) -> impl Responder {
    let id = match parse_id(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(store.with_session(id, |session| session.comparison()))
}

/*
    GET /api/sessions/{id}/conflicts
*/
pub async fn get_conflicts(path: web::Path<String>, store: web::Data<SessionStore>) -> impl Responder {
    let id = match parse_id(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(store.with_session(id, |session| Ok(session.conflicts())))
}
