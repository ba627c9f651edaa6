use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::storage::Repository;

/// Health check endpoint
///
/// Reports liveness, the storage backend in use and the current time.
#[get("/health")]
pub async fn health(repo: web::Data<dyn Repository>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "storage": repo.storage_type(),
        "timestamp": Utc::now()
    }))
}
