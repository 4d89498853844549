use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::RequireVale,
    models::{
        catalog::WarehouseCode,
        transfer::{StockMovementView, TransferLine, TransferReceipt},
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TransferPayload {
    pub origin: WarehouseCode,
    pub destination: WarehouseCode,

    #[validate(length(min = 1, message = "Cargue productos para transferir."))]
    pub items: Vec<TransferLine>,
}

#[utoipa::path(
    post,
    path = "/api/inventory/transfers",
    tag = "Inventory",
    security(("api_jwt" = [])),
    request_body = TransferPayload,
    responses(
        (status = 201, body = TransferReceipt),
        (status = 400, description = "Depósitos iguales o cantidades inválidas"),
        (status = 409, description = "Stock insuficiente en el origen"),
    )
)]
pub async fn create_transfer(
    State(app_state): State<AppState>,
    RequireVale(admin): RequireVale,
    Json(payload): Json<TransferPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let receipt = app_state
        .transfer_service
        .transfer_stock(payload.origin, payload.destination, &payload.items, admin.id)
        .await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MovementQuery {
    /// Cantidad máxima de renglones (default 100).
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/inventory/movements",
    tag = "Inventory",
    security(("api_jwt" = [])),
    params(MovementQuery),
    responses((status = 200, body = [StockMovementView]))
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    Query(query): Query<MovementQuery>,
) -> Result<Json<Vec<StockMovementView>>, AppError> {
    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    let movements = app_state.transfer_repo.list_movements(limit).await?;
    Ok(Json(movements))
}
