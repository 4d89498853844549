use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

/// Tope de resultados del buscador de artículos.
pub const MAX_SEARCH_RESULTS: usize = 200;

// Los dos depósitos físicos. El stock de cada uno vive en su propia
// columna del maestro de artículos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum WarehouseCode {
    Llerena,
    Betbeder,
}

impl WarehouseCode {
    pub fn from_name(name: &str) -> Result<Self, AppError> {
        match name {
            "LLERENA" => Ok(WarehouseCode::Llerena),
            "BETBEDER" => Ok(WarehouseCode::Betbeder),
            _ => Err(AppError::WarehouseNotFound),
        }
    }

    pub fn as_name(&self) -> &'static str {
        match self {
            WarehouseCode::Llerena => "LLERENA",
            WarehouseCode::Betbeder => "BETBEDER",
        }
    }

    /// Columna de stock correspondiente en 'master_products'.
    pub fn stock_column(&self) -> &'static str {
        match self {
            WarehouseCode::Llerena => "stock_llerena",
            WarehouseCode::Betbeder => "stock_betbeder",
        }
    }

    pub fn stock_of(&self, product: &MasterProduct) -> Decimal {
        match self {
            WarehouseCode::Llerena => product.stock_llerena,
            WarehouseCode::Betbeder => product.stock_betbeder,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Warehouse {
    pub id: Uuid,
    pub name: String,
}

// Un artículo del maestro, tal como viene de la tabla.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MasterProduct {
    pub codart: String,
    pub desart: String,
    pub cbarra: Option<String>,
    pub familia: Option<String>,
    pub nsubf: Option<String>,
    pub nomprov: Option<String>,
    pub costo: Decimal,
    pub pventa_1: Decimal,
    pub stock_llerena: Decimal,
    pub stock_betbeder: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Filtro del armado de auditorías: cada palabra del término de búsqueda
/// tiene que aparecer en algún lado de "desart codart" (AND de tokens, sin
/// distinguir mayúsculas), más filtros exactos por familia y proveedor.
/// Devuelve a lo sumo los primeros MAX_SEARCH_RESULTS artículos.
pub fn filter_products<'a>(
    products: &'a [MasterProduct],
    search: &str,
    familia: Option<&str>,
    nomprov: Option<&str>,
) -> Vec<&'a MasterProduct> {
    let keywords: Vec<String> = search
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    products
        .iter()
        .filter(|p| {
            let haystack = format!("{} {}", p.desart, p.codart).to_lowercase();
            let matches_search = keywords.iter().all(|k| haystack.contains(k));
            let matches_familia =
                familia.is_none_or(|f| p.familia.as_deref() == Some(f));
            let matches_prov =
                nomprov.is_none_or(|n| p.nomprov.as_deref() == Some(n));
            matches_search && matches_familia && matches_prov
        })
        .take(MAX_SEARCH_RESULTS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn product(codart: &str, desart: &str, familia: Option<&str>, nomprov: Option<&str>) -> MasterProduct {
        MasterProduct {
            codart: codart.to_string(),
            desart: desart.to_string(),
            cbarra: None,
            familia: familia.map(str::to_string),
            nsubf: None,
            nomprov: nomprov.map(str::to_string),
            costo: Decimal::ZERO,
            pventa_1: Decimal::ZERO,
            stock_llerena: Decimal::ZERO,
            stock_betbeder: Decimal::ZERO,
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn search_requires_all_keywords_in_any_order() {
        let products = vec![
            product("A100", "ACEITE GIRASOL 1.5L", Some("ALMACEN"), Some("COTO")),
            product("A200", "ACEITE OLIVA 500ML", Some("ALMACEN"), Some("COTO")),
        ];

        let hits = filter_products(&products, "girasol aceite", None, None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].codart, "A100");

        // Una palabra que no aparece descarta el artículo aunque otra matchee.
        assert!(filter_products(&products, "aceite maiz", None, None).is_empty());
    }

    #[test]
    fn search_is_case_insensitive_and_matches_code() {
        let products = vec![product("XZ9", "YERBA MATE", None, None)];
        assert_eq!(filter_products(&products, "xz9", None, None).len(), 1);
        assert_eq!(filter_products(&products, "yErBa", None, None).len(), 1);
    }

    #[test]
    fn empty_search_matches_everything() {
        let products = vec![
            product("1", "UNO", None, None),
            product("2", "DOS", None, None),
        ];
        assert_eq!(filter_products(&products, "", None, None).len(), 2);
        assert_eq!(filter_products(&products, "   ", None, None).len(), 2);
    }

    #[test]
    fn familia_and_provider_filters_are_exact() {
        let products = vec![
            product("1", "FIDEOS GUISEROS", Some("ALMACEN"), Some("MOLINOS")),
            product("2", "FIDEOS SPAGHETTI", Some("ALMACEN"), Some("LUCCHETTI")),
            product("3", "LAVANDINA", Some("LIMPIEZA"), Some("AYUDIN")),
        ];

        let hits = filter_products(&products, "", Some("ALMACEN"), None);
        assert_eq!(hits.len(), 2);

        let hits = filter_products(&products, "fideos", Some("ALMACEN"), Some("MOLINOS"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].codart, "1");
    }

    #[test]
    fn results_are_capped() {
        let products: Vec<_> = (0..MAX_SEARCH_RESULTS + 50)
            .map(|i| product(&format!("C{i}"), "REPETIDO", None, None))
            .collect();
        assert_eq!(
            filter_products(&products, "repetido", None, None).len(),
            MAX_SEARCH_RESULTS
        );
    }

    #[test]
    fn warehouse_code_maps_to_its_stock_column() {
        let mut p = product("1", "ALGO", None, None);
        p.stock_llerena = Decimal::from(7);
        p.stock_betbeder = Decimal::from(3);

        assert_eq!(WarehouseCode::Llerena.stock_of(&p), Decimal::from(7));
        assert_eq!(WarehouseCode::Betbeder.stock_of(&p), Decimal::from(3));
        assert_eq!(WarehouseCode::Llerena.stock_column(), "stock_llerena");
        assert!(WarehouseCode::from_name("ISEAS").is_err());
    }
}
