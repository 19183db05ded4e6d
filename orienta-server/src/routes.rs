use actix_web::{web, HttpResponse};
use log::{error, info, warn};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::journal::PredictionLogEntry;
use crate::state::AppState;

const BODY_REQUIRED: &str = "JSON body required";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/predict", web::post().to(predict))
        .route("/admin_data", web::get().to(admin_data))
        .route("/rania", web::get().to(rania_root));

    for prefix in ["", "/rania"] {
        cfg.route(&format!("{}/recommend", prefix), web::post().to(recommend))
            .route(&format!("{}/formations", prefix), web::get().to(formations))
            .route(&format!("{}/stats", prefix), web::get().to(stats))
            .route(&format!("{}/students", prefix), web::get().to(students))
            .route(&format!("{}/students_clusters", prefix), web::get().to(students_clusters))
            .route(&format!("{}/explore", prefix), web::get().to(explore));
    }
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Corps JSON obligatoire : absent, illisible ou `null` → 400.
fn required_json(body: &[u8]) -> Result<Value, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Null) | Err(_) => Err(ApiError::BadRequest(BODY_REQUIRED.to_string())),
        Ok(value) => Ok(value),
    }
}

/// Corps JSON facultatif : absent ou `null` → `{}`.
fn optional_json(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(json!({}));
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Null) => Ok(json!({})),
        Ok(value) => Ok(value),
        Err(e) => Err(ApiError::BadRequest(format!("JSON invalide: {}", e))),
    }
}

async fn predict(state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    let data = required_json(&body)?;

    let worker_state = state.clone();
    let payload = data.clone();
    let result = web::block(move || worker_state.models.predict_student(&payload))
        .await?
        .map_err(|e| {
            if e.is_user_error() {
                warn!("Requête de prédiction invalide: {}", e);
            } else {
                error!("Erreur de prédiction: {}", e);
            }
            ApiError::from(e)
        })?;

    state.journal.append(PredictionLogEntry::new(&data, &result));
    info!(
        "Prédiction: {} / cluster {} ({} entrées journalisées)",
        result.predicted_level,
        result.cluster_soft,
        state.journal.len()
    );

    Ok(HttpResponse::Ok().json(result))
}

async fn admin_data(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.journal.snapshot())
}

async fn recommend(state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    let profile = optional_json(&body)?;

    let worker_state = state.clone();
    let details = web::block(move || worker_state.models.get_recommendation_details(&profile))
        .await?
        .map_err(|e| {
            warn!("Recommandation impossible: {}", e);
            ApiError::from(e)
        })?;

    info!("Recommandation: {} ({})", details.recommended_option, details.cluster);
    Ok(HttpResponse::Ok().json(details))
}

async fn rania_root() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": "Section Rania – API de recommandation" }))
}

async fn formations(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "formations": state.models.formations() }))
}

async fn stats(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.models.stats())
}

async fn students(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.models.students())
}

async fn students_clusters(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.models.clustered_students())
}

async fn explore(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.models.exploration_overview())
}
