use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "movement_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    Ingreso,
    Ajuste,
    Transferencia,
    Reverso,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "movement_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MovementStatus {
    Activo,
    Anulado,
}

// Un renglón del libro de movimientos. Una transferencia graba dos:
// salida (cantidad negativa) en el origen y entrada en el destino,
// atadas por transfer_group_code.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,
    pub codart: String,
    pub warehouse_id: Uuid,
    pub quantity: Decimal,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub status: MovementStatus,
    pub transfer_group_code: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

// Vista del historial con nombres ya resueltos.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovementView {
    pub id: Uuid,
    pub codart: String,
    pub desart: String,
    pub warehouse_name: String,
    pub quantity: Decimal,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub status: MovementStatus,
    pub transfer_group_code: Option<String>,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

// Un renglón pedido de transferencia: artículo y cantidad a mover.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferLine {
    pub codart: String,
    pub qty: Decimal,
}

// Comprobante que devuelve la operación.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub reference_code: String,
    pub lines: usize,
}
