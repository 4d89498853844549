use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::error::AppError,
    config::AppState,
    models::catalog::{MasterProduct, Warehouse, filter_products},
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductQuery {
    /// Palabras a buscar en descripción y código (todas deben aparecer).
    pub search: Option<String>,
    pub familia: Option<String>,
    pub nomprov: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/catalog/products",
    tag = "Catalog",
    security(("api_jwt" = [])),
    params(ProductQuery),
    responses((status = 200, body = [MasterProduct]))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<MasterProduct>>, AppError> {
    let products = app_state.catalog_repo.get_all_products().await?;

    let filtered = filter_products(
        &products,
        query.search.as_deref().unwrap_or(""),
        query.familia.as_deref(),
        query.nomprov.as_deref(),
    )
    .into_iter()
    .cloned()
    .collect();

    Ok(Json(filtered))
}

#[utoipa::path(
    get,
    path = "/api/catalog/warehouses",
    tag = "Catalog",
    security(("api_jwt" = [])),
    responses((status = 200, body = [Warehouse]))
)]
pub async fn list_warehouses(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Warehouse>>, AppError> {
    let warehouses = app_state.catalog_repo.get_warehouses().await?;
    Ok(Json(warehouses))
}
