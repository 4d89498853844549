use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::CountInputPolicy,
    db::{AuditRepository, CatalogRepository, audit_repo::CountWithUser},
    models::{
        audit::{
            SessionItemView, SessionStatus, SessionSummary, StockControlItem,
            StockControlSession, StockCount, UserProgress, count_matches_system,
        },
        catalog::WarehouseCode,
    },
};

/// Decide qué hacer con el texto crudo de un conteo: número parseado,
/// rechazo con mensaje, o ignorar en silencio según la política.
pub fn parse_count(raw_qty: &str, policy: CountInputPolicy) -> Result<Option<Decimal>, AppError> {
    match raw_qty.trim().parse::<Decimal>() {
        Ok(qty) => Ok(Some(qty)),
        Err(_) => match policy {
            CountInputPolicy::Reject => Err(AppError::InvalidQuantity(raw_qty.to_string())),
            CountInputPolicy::Ignore => Ok(None),
        },
    }
}

/// Primera aparición de cada código, en el orden de la selección. La UI
/// puede mandar repetidos; un artículo entra una sola vez por sesión.
fn unique_codarts(codarts: &[String]) -> Vec<&String> {
    let mut seen = HashSet::new();
    codarts.iter().filter(|c| seen.insert(c.as_str())).collect()
}

/// Ordena los conteos por la primera carga de cada armador en la sesión:
/// quien empezó a contar primero es "Armador 1" en todos los ítems, aunque
/// haya llegado más tarde a alguno en particular.
fn sort_by_first_submission(counts: &mut [CountWithUser]) {
    let mut first_seen: HashMap<Uuid, DateTime<Utc>> = HashMap::new();
    for count in counts.iter() {
        first_seen
            .entry(count.user_id)
            .and_modify(|t| *t = (*t).min(count.counted_at))
            .or_insert(count.counted_at);
    }
    counts.sort_by_key(|c| (first_seen[&c.user_id], c.user_id));
}

#[derive(Clone)]
pub struct AuditService {
    audit_repo: AuditRepository,
    catalog_repo: CatalogRepository,
    pool: PgPool,
    count_policy: CountInputPolicy,
}

impl AuditService {
    pub fn new(
        audit_repo: AuditRepository,
        catalog_repo: CatalogRepository,
        pool: PgPool,
        count_policy: CountInputPolicy,
    ) -> Self {
        Self { audit_repo, catalog_repo, pool, count_policy }
    }

    // --- ARMADO DE SESIÓN ---
    // Una transacción: la sesión y todos sus ítems entran juntos o no entra
    // nada. system_qty queda congelado con el stock del depósito elegido.
    pub async fn create_session(
        &self,
        name: &str,
        warehouse_id: Uuid,
        codarts: &[String],
        created_by: Uuid,
    ) -> Result<StockControlSession, AppError> {
        let warehouse = self
            .catalog_repo
            .find_warehouse(warehouse_id)
            .await?
            .ok_or(AppError::WarehouseNotFound)?;
        let code = WarehouseCode::from_name(&warehouse.name)?;
        let codarts = unique_codarts(codarts);

        let mut tx = self.pool.begin().await?;

        let session = self
            .audit_repo
            .insert_session(&mut *tx, name, warehouse_id, created_by)
            .await?;

        let codes: Vec<String> = codarts.iter().map(|c| c.to_string()).collect();
        let products = self
            .catalog_repo
            .get_products_by_codes(&mut *tx, &codes)
            .await?;
        let by_code: HashMap<&str, Decimal> = products
            .iter()
            .map(|p| (p.codart.as_str(), code.stock_of(p)))
            .collect();

        for &codart in &codarts {
            let system_qty = by_code
                .get(codart.as_str())
                .copied()
                .ok_or_else(|| AppError::ProductNotFound(codart.clone()))?;
            self.audit_repo
                .insert_item(&mut *tx, session.id, codart, system_qty)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Auditoría '{}' creada: {} ítems en {}",
            session.name,
            codarts.len(),
            warehouse.name
        );
        Ok(session)
    }

    // --- REGISTRO ---
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, AppError> {
        let sessions = self.audit_repo.list_sessions().await?;
        let progress = self.audit_repo.progress_by_user().await?;

        let mut by_session: HashMap<Uuid, Vec<UserProgress>> = HashMap::new();
        for row in progress {
            by_session.entry(row.session_id).or_default().push(UserProgress {
                user_id: row.user_id,
                user_name: row.user_name,
                counted: row.counted,
            });
        }

        Ok(sessions
            .into_iter()
            .map(|s| {
                let user_progress = by_session.remove(&s.id).unwrap_or_default();
                SessionSummary {
                    id: s.id,
                    name: s.name,
                    warehouse_id: s.warehouse_id,
                    warehouse_name: s.warehouse_name,
                    status: s.status,
                    created_by: s.created_by,
                    created_at: s.created_at,
                    item_count: s.item_count,
                    user_progress,
                }
            })
            .collect())
    }

    // --- CONCILIACIÓN / EJECUCIÓN ---
    // Arma el modelo de lectura anidado: ítems en orden de alta con sus
    // conteos (nombre de armador incluido) y los derivados ya calculados.
    pub async fn session_items(
        &self,
        session_id: Uuid,
    ) -> Result<(StockControlSession, Vec<SessionItemView>), AppError> {
        let session = self
            .audit_repo
            .find_session(session_id)
            .await?
            .ok_or(AppError::SessionNotFound)?;

        let items = self.audit_repo.items_for_session(session_id).await?;
        let mut counts = self.audit_repo.counts_for_session(session_id).await?;

        // "Armador 1" es quien empezó a contar primero en la sesión, en
        // todos los ítems por igual.
        sort_by_first_submission(&mut counts);

        let mut by_item: HashMap<i64, Vec<(Uuid, String, Decimal)>> = HashMap::new();
        for c in counts {
            by_item
                .entry(c.item_id)
                .or_default()
                .push((c.user_id, c.user_name, c.qty));
        }

        let views = items
            .into_iter()
            .map(|i| {
                let item_counts = by_item.remove(&i.id).unwrap_or_default();
                SessionItemView::new(
                    i.id,
                    i.codart,
                    i.desart,
                    i.system_qty,
                    i.corrected_qty,
                    item_counts,
                )
            })
            .collect();

        Ok((session, views))
    }

    // --- CARGA DE CONTEO ---
    // El payload trae el texto crudo del input. Si no parsea como número,
    // la política decide: rechazar con mensaje (default, auditable) o
    // ignorar en silencio como hacía el sistema madre.
    pub async fn save_count(
        &self,
        session_id: Uuid,
        item_id: i64,
        user_id: Uuid,
        raw_qty: &str,
    ) -> Result<Option<(StockCount, bool)>, AppError> {
        let item = self.require_active_item(session_id, item_id).await?;

        let Some(qty) = parse_count(raw_qty, self.count_policy)? else {
            tracing::debug!(
                "Conteo no numérico ignorado para ítem {}: {:?}",
                item_id,
                raw_qty
            );
            return Ok(None);
        };

        let count = self.audit_repo.upsert_count(item_id, user_id, qty).await?;
        let matches = count_matches_system(qty, item.system_qty);
        Ok(Some((count, matches)))
    }

    // --- CORRECCIÓN DEL REVISOR ---
    // corrected_qty = None limpia la corrección y la cantidad final vuelve
    // a ser la del sistema.
    pub async fn set_correction(
        &self,
        session_id: Uuid,
        item_id: i64,
        corrected_qty: Option<Decimal>,
    ) -> Result<StockControlItem, AppError> {
        self.require_active_item(session_id, item_id).await?;
        self.audit_repo.set_correction(item_id, corrected_qty).await
    }

    // --- CIERRE ---
    pub async fn close_session(&self, session_id: Uuid) -> Result<StockControlSession, AppError> {
        let session = self
            .audit_repo
            .find_session(session_id)
            .await?
            .ok_or(AppError::SessionNotFound)?;
        if session.status == SessionStatus::Finished {
            return Err(AppError::SessionFinished);
        }

        let closed = self.audit_repo.close_session(session_id).await?;
        tracing::info!("Auditoría '{}' cerrada", closed.name);
        Ok(closed)
    }

    pub async fn delete_session(&self, session_id: Uuid) -> Result<(), AppError> {
        let deleted = self.audit_repo.delete_session(session_id).await?;
        if deleted == 0 {
            return Err(AppError::SessionNotFound);
        }
        Ok(())
    }

    /// El ítem tiene que existir, pertenecer a la sesión, y la sesión tiene
    /// que seguir abierta.
    async fn require_active_item(
        &self,
        session_id: Uuid,
        item_id: i64,
    ) -> Result<StockControlItem, AppError> {
        let session = self
            .audit_repo
            .find_session(session_id)
            .await?
            .ok_or(AppError::SessionNotFound)?;
        if session.status == SessionStatus::Finished {
            return Err(AppError::SessionFinished);
        }

        let item = self
            .audit_repo
            .find_item(item_id)
            .await?
            .ok_or(AppError::ItemNotFound)?;
        if item.session_id != session_id {
            return Err(AppError::ItemNotFound);
        }

        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_count_acepta_decimales_con_espacios() {
        let qty = parse_count(" 12.5 ", CountInputPolicy::Reject).unwrap();
        assert_eq!(qty, Some(Decimal::new(125, 1)));
    }

    #[test]
    fn parse_count_rechaza_texto_con_politica_estricta() {
        let err = parse_count("doce", CountInputPolicy::Reject).unwrap_err();
        assert!(matches!(err, AppError::InvalidQuantity(raw) if raw == "doce"));
    }

    #[test]
    fn parse_count_ignora_texto_con_politica_laxa() {
        let qty = parse_count("doce", CountInputPolicy::Ignore).unwrap();
        assert_eq!(qty, None);
    }

    #[test]
    fn codigos_repetidos_entran_una_sola_vez() {
        let codes = vec![
            "A100".to_string(),
            "B200".to_string(),
            "A100".to_string(),
            "C300".to_string(),
            "B200".to_string(),
        ];
        let unique: Vec<&str> = unique_codarts(&codes).into_iter().map(|c| c.as_str()).collect();
        assert_eq!(unique, vec!["A100", "B200", "C300"]);
    }

    fn count(item_id: i64, user_id: Uuid, name: &str, at: DateTime<Utc>) -> CountWithUser {
        CountWithUser {
            item_id,
            user_id,
            user_name: name.to_string(),
            qty: Decimal::ONE,
            counted_at: at,
        }
    }

    #[test]
    fn el_primer_armador_de_la_sesion_va_primero_en_todos_los_items() {
        let pedro = Uuid::new_v4();
        let juan = Uuid::new_v4();
        let t0 = Utc::now();
        let sec = chrono::Duration::seconds(1);

        // Pedro arranca la sesión; en el ítem 2 Juan carga antes que él.
        let mut counts = vec![
            count(1, pedro, "PEDRO", t0),
            count(1, juan, "JUAN", t0 + sec),
            count(2, juan, "JUAN", t0 + sec),
            count(2, pedro, "PEDRO", t0 + sec * 3),
        ];
        sort_by_first_submission(&mut counts);

        for item_id in [1, 2] {
            let per_item: Vec<&CountWithUser> =
                counts.iter().filter(|c| c.item_id == item_id).collect();
            assert_eq!(per_item[0].user_id, pedro, "ítem {item_id}");
            assert_eq!(per_item[1].user_id, juan, "ítem {item_id}");
        }
    }

    #[test]
    fn el_orden_de_armadores_no_depende_de_quien_cargo_ultimo() {
        let pedro = Uuid::new_v4();
        let juan = Uuid::new_v4();
        let t0 = Utc::now();
        let sec = chrono::Duration::seconds(1);

        // Pedro contó primero (t0) y Juan después (t0+1). Pedro corrige su
        // valor: como el upsert conserva counted_at, la fila sigue en t0 y
        // Pedro sigue siendo "Armador 1".
        let mut counts = vec![
            count(1, juan, "JUAN", t0 + sec),
            count(1, pedro, "PEDRO", t0),
        ];
        sort_by_first_submission(&mut counts);

        assert_eq!(counts[0].user_id, pedro);
        assert_eq!(counts[1].user_id, juan);
    }
}
