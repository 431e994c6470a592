use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::engine::intake::{self, NewOrder, OrderFilter};
use crate::engine::lifecycle;
use crate::error::AppError;
use crate::models::order::{ConfirmationMethod, Order, OrderStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", patch(update_status))
        .route("/orders/:id/driver", patch(assign_driver))
        .route("/orders/:id/confirmation", post(confirm_delivery))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub return_reason: Option<String>,
}

#[derive(Deserialize)]
pub struct AssignDriverRequest {
    pub driver_id: String,
}

#[derive(Deserialize)]
pub struct ConfirmationRequest {
    pub method: ConfirmationMethod,
    pub payload: String,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewOrder>,
) -> Result<Json<Order>, AppError> {
    intake::create_order(&state, payload).map(Json)
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<OrderFilter>,
) -> Json<Vec<Order>> {
    Json(intake::list_orders(&state, &filter))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    intake::get_order(&state, &id).map(Json)
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, AppError> {
    lifecycle::transition(&state, &id, payload.status, payload.return_reason).map(Json)
}

async fn assign_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<AssignDriverRequest>,
) -> Result<Json<Order>, AppError> {
    lifecycle::assign_driver(&state, &id, payload.driver_id.trim()).map(Json)
}

async fn confirm_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<ConfirmationRequest>,
) -> Result<Json<Order>, AppError> {
    lifecycle::confirm_delivery(&state, &id, payload.method, payload.payload).map(Json)
}
