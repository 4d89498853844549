use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::transfer::{MovementType, StockMovement, StockMovementView},
};

// Repositorio del libro de movimientos de stock.
#[derive(Clone)]
pub struct TransferRepository {
    pool: PgPool,
}

impl TransferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record_movement<'e, E>(
        &self,
        executor: E,
        codart: &str,
        warehouse_id: Uuid,
        quantity: Decimal,
        movement_type: MovementType,
        transfer_group_code: Option<&str>,
        created_by: Uuid,
    ) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements
                (codart, warehouse_id, quantity, type, transfer_group_code, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(codart)
        .bind(warehouse_id)
        .bind(quantity)
        .bind(movement_type)
        .bind(transfer_group_code)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(movement)
    }

    pub async fn list_movements(&self, limit: i64) -> Result<Vec<StockMovementView>, AppError> {
        let movements = sqlx::query_as::<_, StockMovementView>(
            r#"
            SELECT m.id, m.codart, mp.desart, w.name AS warehouse_name,
                   m.quantity, m.type, m.status, m.transfer_group_code,
                   p.name AS user_name, m.created_at
            FROM stock_movements m
            JOIN master_products mp ON mp.codart = m.codart
            JOIN warehouses w ON w.id = m.warehouse_id
            JOIN profiles p ON p.id = m.created_by
            ORDER BY m.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(movements)
    }
}
