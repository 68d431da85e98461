use actix_web::{web, HttpResponse, Responder, ResponseError};
use serde::Deserialize;

use crate::models::money::Money;
use crate::services::session_service::SessionStore;

#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub amount: Money,
    pub target: String,
}

/*
    /api/currencies
*/
pub async fn get_currencies(store: web::Data<SessionStore>) -> impl Responder {
    HttpResponse::Ok().json(store.currencies().options())
}

/*
    /api/currencies/convert
*/
pub async fn convert(store: web::Data<SessionStore>, body: web::Json<ConvertRequest>) -> impl Responder {
    let request = body.into_inner();
    match store.currencies().convert(&request.amount, &request.target) {
        Ok(converted) => HttpResponse::Ok().json(converted),
        Err(err) => err.error_response(),
    }
}
