use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AuthenticatedUser, RequireVale},
    models::audit::{
        SessionItemView, SessionSummary, StockControlItem, StockControlSession, StockCount,
    },
};

// ---
// Payload: crear auditoría
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionPayload {
    #[validate(length(min = 1, message = "El nombre del control es obligatorio."))]
    pub name: String,

    pub warehouse_id: Uuid,

    #[validate(length(min = 1, message = "Seleccione al menos un artículo."))]
    pub codarts: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/api/audits",
    tag = "Audits",
    security(("api_jwt" = [])),
    responses((status = 200, body = [SessionSummary]))
)]
pub async fn list_sessions(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<SessionSummary>>, AppError> {
    let sessions = app_state.audit_service.list_sessions().await?;
    Ok(Json(sessions))
}

#[utoipa::path(
    post,
    path = "/api/audits",
    tag = "Audits",
    security(("api_jwt" = [])),
    request_body = CreateSessionPayload,
    responses((status = 201, body = StockControlSession), (status = 403, description = "Solo administradores"))
)]
pub async fn create_session(
    State(app_state): State<AppState>,
    RequireVale(admin): RequireVale,
    Json(payload): Json<CreateSessionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let session = app_state
        .audit_service
        .create_session(&payload.name, payload.warehouse_id, &payload.codarts, admin.id)
        .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

// Sesión + ítems en el orden de alta, con conteos y derivados: lo que
// consumen tanto la pantalla de carga como la de conciliación.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionItemsResponse {
    pub session: StockControlSession,
    pub items: Vec<SessionItemView>,
}

#[utoipa::path(
    get,
    path = "/api/audits/{id}/items",
    tag = "Audits",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "Id de la auditoría")),
    responses((status = 200, body = SessionItemsResponse), (status = 404, description = "Auditoría no encontrada"))
)]
pub async fn get_session_items(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionItemsResponse>, AppError> {
    let (session, items) = app_state.audit_service.session_items(id).await?;
    Ok(Json(SessionItemsResponse { session, items }))
}

// ---
// Payload: conteo físico
// ---
// qty viaja como texto crudo: el parseo (y la política ante valores no
// numéricos) es del servidor, no del cliente.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveCountPayload {
    pub qty: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavedCountResponse {
    pub count: StockCount,
    /// Señal orientativa: el conteo redondeado coincide con el sistema.
    pub matches_system: bool,
}

#[utoipa::path(
    put,
    path = "/api/audits/{id}/items/{item_id}/count",
    tag = "Audits",
    security(("api_jwt" = [])),
    params(
        ("id" = Uuid, Path, description = "Id de la auditoría"),
        ("item_id" = i64, Path, description = "Id del ítem"),
    ),
    request_body = SaveCountPayload,
    responses(
        (status = 200, body = SavedCountResponse),
        (status = 204, description = "Valor no numérico ignorado (política 'ignore')"),
        (status = 400, description = "Valor no numérico rechazado"),
        (status = 409, description = "Auditoría cerrada"),
    )
)]
pub async fn save_count(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, item_id)): Path<(Uuid, i64)>,
    Json(payload): Json<SaveCountPayload>,
) -> Result<Response, AppError> {
    let saved = app_state
        .audit_service
        .save_count(id, item_id, user.id, &payload.qty)
        .await?;

    match saved {
        Some((count, matches_system)) => {
            Ok(Json(SavedCountResponse { count, matches_system }).into_response())
        }
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

// ---
// Payload: corrección del revisor
// ---
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionPayload {
    /// null limpia la corrección; la cantidad final vuelve al sistema.
    pub corrected_qty: Option<Decimal>,
}

#[utoipa::path(
    put,
    path = "/api/audits/{id}/items/{item_id}/correction",
    tag = "Audits",
    security(("api_jwt" = [])),
    params(
        ("id" = Uuid, Path, description = "Id de la auditoría"),
        ("item_id" = i64, Path, description = "Id del ítem"),
    ),
    request_body = CorrectionPayload,
    responses((status = 200, body = StockControlItem), (status = 409, description = "Auditoría cerrada"))
)]
pub async fn set_correction(
    State(app_state): State<AppState>,
    _guard: RequireVale,
    Path((id, item_id)): Path<(Uuid, i64)>,
    Json(payload): Json<CorrectionPayload>,
) -> Result<Json<StockControlItem>, AppError> {
    let item = app_state
        .audit_service
        .set_correction(id, item_id, payload.corrected_qty)
        .await?;
    Ok(Json(item))
}

#[utoipa::path(
    post,
    path = "/api/audits/{id}/close",
    tag = "Audits",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "Id de la auditoría")),
    responses((status = 200, body = StockControlSession), (status = 409, description = "Ya estaba cerrada"))
)]
pub async fn close_session(
    State(app_state): State<AppState>,
    _guard: RequireVale,
    Path(id): Path<Uuid>,
) -> Result<Json<StockControlSession>, AppError> {
    let session = app_state.audit_service.close_session(id).await?;
    Ok(Json(session))
}

#[utoipa::path(
    delete,
    path = "/api/audits/{id}",
    tag = "Audits",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "Id de la auditoría")),
    responses((status = 204, description = "Borrada junto con ítems y conteos"))
)]
pub async fn delete_session(
    State(app_state): State<AppState>,
    _guard: RequireVale,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.audit_service.delete_session(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/audits/{id}/export",
    tag = "Audits",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "Id de la auditoría")),
    responses((status = 200, description = "Planilla XLSX de diferencias"))
)]
pub async fn export_session(
    State(app_state): State<AppState>,
    _guard: RequireVale,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let (session, items) = app_state.audit_service.session_items(id).await?;
    let report = app_state.report_service.export_session(&session, &items)?;

    let headers = [
        (
            header::CONTENT_TYPE,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", report.filename),
        ),
    ];

    Ok((headers, report.bytes).into_response())
}
