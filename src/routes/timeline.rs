use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::models::timeline::ScheduledActivity;
use crate::services::timeline_service::detect_conflicts;

#[derive(Debug, Deserialize)]
pub struct ConflictRequest {
    pub activities: Vec<ScheduledActivity>,
}

/*
    /api/timeline/conflicts
*/
pub async fn conflicts(body: web::Json<ConflictRequest>) -> impl Responder {
    HttpResponse::Ok().json(detect_conflicts(&body.activities))
}
