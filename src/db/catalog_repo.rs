use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{MasterProduct, Warehouse, WarehouseCode},
};

// Repositorio del maestro de artículos y los depósitos.
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_all_products(&self) -> Result<Vec<MasterProduct>, AppError> {
        let products = sqlx::query_as::<_, MasterProduct>(
            "SELECT * FROM master_products ORDER BY desart ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Artículos por lista de códigos (la selección del armado de auditoría).
    pub async fn get_products_by_codes<'e, E>(
        &self,
        executor: E,
        codarts: &[String],
    ) -> Result<Vec<MasterProduct>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, MasterProduct>(
            "SELECT * FROM master_products WHERE codart = ANY($1)",
        )
        .bind(codarts)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    pub async fn get_warehouses(&self) -> Result<Vec<Warehouse>, AppError> {
        let warehouses =
            sqlx::query_as::<_, Warehouse>("SELECT * FROM warehouses ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(warehouses)
    }

    pub async fn find_warehouse(&self, id: Uuid) -> Result<Option<Warehouse>, AppError> {
        let warehouse = sqlx::query_as::<_, Warehouse>("SELECT * FROM warehouses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(warehouse)
    }

    pub async fn find_warehouse_by_name(&self, name: &str) -> Result<Option<Warehouse>, AppError> {
        let warehouse = sqlx::query_as::<_, Warehouse>("SELECT * FROM warehouses WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(warehouse)
    }

    /// Bloquea el renglón del artículo dentro de la transacción de
    /// transferencia, para que la validación de stock no corra una carrera
    /// contra otra transferencia simultánea.
    pub async fn get_product_for_update<'e, E>(
        &self,
        executor: E,
        codart: &str,
    ) -> Result<Option<MasterProduct>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, MasterProduct>(
            "SELECT * FROM master_products WHERE codart = $1 FOR UPDATE",
        )
        .bind(codart)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    /// Mueve 'qty' de la columna de stock del origen a la del destino en un
    /// solo UPDATE. Los nombres de columna salen de WarehouseCode, nunca de
    /// entrada del usuario.
    pub async fn apply_transfer_delta<'e, E>(
        &self,
        executor: E,
        origin: WarehouseCode,
        destination: WarehouseCode,
        codart: &str,
        qty: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE master_products \
             SET {origin} = {origin} - $1, {dest} = {dest} + $1, updated_at = now() \
             WHERE codart = $2",
            origin = origin.stock_column(),
            dest = destination.stock_column(),
        );

        sqlx::query(&sql)
            .bind(qty)
            .bind(codart)
            .execute(executor)
            .await?;
        Ok(())
    }
}
