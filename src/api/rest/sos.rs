use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;

use crate::engine::alerts::{self, NewSos, ProblemCodeInfo};
use crate::error::AppError;
use crate::models::sos::SosMessage;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sos", post(submit_sos).get(list_sos))
        .route("/sos/codes", get(problem_codes))
}

async fn submit_sos(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewSos>,
) -> Result<Json<SosMessage>, AppError> {
    alerts::submit_sos(&state, payload).map(Json)
}

async fn list_sos(State(state): State<Arc<AppState>>) -> Json<Vec<SosMessage>> {
    Json(alerts::list_sos(&state))
}

async fn problem_codes() -> Json<Vec<ProblemCodeInfo>> {
    Json(alerts::problem_code_catalog())
}
