use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::audit::{SessionStatus, StockControlItem, StockControlSession, StockCount},
};

// Fila del registro: la sesión con su depósito y cuántos ítems tiene.
#[derive(Debug, sqlx::FromRow)]
pub struct SessionWithMeta {
    pub id: Uuid,
    pub name: String,
    pub warehouse_id: Uuid,
    pub status: SessionStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub warehouse_name: String,
    pub item_count: i64,
}

// Progreso agregado de un participante en una sesión.
#[derive(Debug, sqlx::FromRow)]
pub struct ProgressRow {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub counted: i64,
}

// Ítem con la descripción del artículo ya resuelta.
#[derive(Debug, sqlx::FromRow)]
pub struct ItemWithProduct {
    pub id: i64,
    pub session_id: Uuid,
    pub codart: String,
    pub desart: String,
    pub system_qty: Decimal,
    pub corrected_qty: Option<Decimal>,
}

// Conteo con el nombre del armador ya resuelto.
#[derive(Debug, sqlx::FromRow)]
pub struct CountWithUser {
    pub item_id: i64,
    pub user_id: Uuid,
    pub user_name: String,
    pub qty: Decimal,
    pub counted_at: DateTime<Utc>,
}

// Repositorio del árbol sesión -> ítems -> conteos.
#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Lecturas
    // ---

    pub async fn list_sessions(&self) -> Result<Vec<SessionWithMeta>, AppError> {
        let sessions = sqlx::query_as::<_, SessionWithMeta>(
            r#"
            SELECT s.id, s.name, s.warehouse_id, s.status, s.created_by, s.created_at,
                   w.name AS warehouse_name,
                   (SELECT COUNT(*) FROM stock_control_items i
                     WHERE i.session_id = s.id) AS item_count
            FROM stock_control_sessions s
            JOIN warehouses w ON w.id = s.warehouse_id
            ORDER BY s.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    /// Cuántos ítems contó cada participante, por sesión. El orden por
    /// primer conteo hace que "Armador 1" sea quien empezó primero.
    pub async fn progress_by_user(&self) -> Result<Vec<ProgressRow>, AppError> {
        let rows = sqlx::query_as::<_, ProgressRow>(
            r#"
            SELECT i.session_id, c.user_id, p.name AS user_name,
                   COUNT(*) AS counted
            FROM stock_control_counts c
            JOIN stock_control_items i ON i.id = c.item_id
            JOIN profiles p ON p.id = c.user_id
            GROUP BY i.session_id, c.user_id, p.name
            ORDER BY i.session_id, MIN(c.counted_at)
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_session(&self, id: Uuid) -> Result<Option<StockControlSession>, AppError> {
        let session = sqlx::query_as::<_, StockControlSession>(
            "SELECT * FROM stock_control_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    /// Ítems de la sesión en orden de id ascendente (el orden de alta, y el
    /// orden que debe respetar la exportación).
    pub async fn items_for_session(
        &self,
        session_id: Uuid,
    ) -> Result<Vec<ItemWithProduct>, AppError> {
        let items = sqlx::query_as::<_, ItemWithProduct>(
            r#"
            SELECT i.id, i.session_id, i.codart, m.desart, i.system_qty, i.corrected_qty
            FROM stock_control_items i
            JOIN master_products m ON m.codart = i.codart
            WHERE i.session_id = $1
            ORDER BY i.id ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Conteos de la sesión en orden de carga. El servicio después los
    /// reordena por primera carga de cada armador en la sesión.
    pub async fn counts_for_session(
        &self,
        session_id: Uuid,
    ) -> Result<Vec<CountWithUser>, AppError> {
        let counts = sqlx::query_as::<_, CountWithUser>(
            r#"
            SELECT c.item_id, c.user_id, p.name AS user_name, c.qty, c.counted_at
            FROM stock_control_counts c
            JOIN stock_control_items i ON i.id = c.item_id
            JOIN profiles p ON p.id = c.user_id
            WHERE i.session_id = $1
            ORDER BY c.counted_at ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    pub async fn find_item(&self, item_id: i64) -> Result<Option<StockControlItem>, AppError> {
        let item = sqlx::query_as::<_, StockControlItem>(
            "SELECT * FROM stock_control_items WHERE id = $1",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    // ---
    // Escrituras
    // ---

    pub async fn insert_session<'e, E>(
        &self,
        executor: E,
        name: &str,
        warehouse_id: Uuid,
        created_by: Uuid,
    ) -> Result<StockControlSession, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let session = sqlx::query_as::<_, StockControlSession>(
            r#"
            INSERT INTO stock_control_sessions (name, warehouse_id, status, created_by)
            VALUES ($1, $2, 'active', $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(warehouse_id)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(session)
    }

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        session_id: Uuid,
        codart: &str,
        system_qty: Decimal,
    ) -> Result<StockControlItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, StockControlItem>(
            r#"
            INSERT INTO stock_control_items (session_id, codart, system_qty)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(codart)
        .bind(system_qty)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    /// Upsert por (item_id, user_id): reenviar reemplaza el conteo anterior
    /// de ese armador, nunca lo duplica. counted_at conserva la primera
    /// carga; corregir un valor no cambia quién contó primero.
    pub async fn upsert_count(
        &self,
        item_id: i64,
        user_id: Uuid,
        qty: Decimal,
    ) -> Result<StockCount, AppError> {
        let count = sqlx::query_as::<_, StockCount>(
            r#"
            INSERT INTO stock_control_counts (item_id, user_id, qty)
            VALUES ($1, $2, $3)
            ON CONFLICT (item_id, user_id)
            DO UPDATE SET qty = EXCLUDED.qty
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(user_id)
        .bind(qty)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn set_correction(
        &self,
        item_id: i64,
        corrected_qty: Option<Decimal>,
    ) -> Result<StockControlItem, AppError> {
        sqlx::query_as::<_, StockControlItem>(
            r#"
            UPDATE stock_control_items
            SET corrected_qty = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(corrected_qty)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::ItemNotFound)
    }

    pub async fn close_session(&self, id: Uuid) -> Result<StockControlSession, AppError> {
        sqlx::query_as::<_, StockControlSession>(
            r#"
            UPDATE stock_control_sessions
            SET status = 'finished'
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::SessionNotFound)
    }

    /// Borra la sesión; los ítems y conteos caen por cascada.
    pub async fn delete_session(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM stock_control_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
