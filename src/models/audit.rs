use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Estado de una sesión de auditoría ---
// 'active' admite conteos y correcciones; 'finished' queda congelada
// (solo lectura, exportación y borrado).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "session_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Finished,
}

// Una sesión de control físico, acotada a un depósito y un subconjunto
// de artículos elegido al crearla.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockControlSession {
    pub id: Uuid,
    pub name: String,
    pub warehouse_id: Uuid,
    pub status: SessionStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

// Un artículo enrolado en una sesión. system_qty es la foto del stock del
// sistema al momento de crear la sesión; no se refresca nunca.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockControlItem {
    pub id: i64,
    pub session_id: Uuid,
    pub codart: String,
    pub system_qty: Decimal,
    pub corrected_qty: Option<Decimal>,
}

// El conteo ciego de un participante para un ítem. Clave (item_id, user_id):
// reenviar reemplaza el valor anterior.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockCount {
    pub item_id: i64,
    pub user_id: Uuid,
    pub qty: Decimal,
    pub counted_at: DateTime<Utc>,
}

// ---
// Conciliación (valores derivados, nunca persistidos)
// ---

/// Cantidad final: la corrección del administrador manda; sin corrección,
/// vale la foto del sistema (se asume que no hubo discrepancia física).
pub fn final_qty(corrected_qty: Option<Decimal>, system_qty: Decimal) -> Decimal {
    corrected_qty.unwrap_or(system_qty)
}

/// Ajuste con signo que va al reporte: final - sistema.
pub fn diff(corrected_qty: Option<Decimal>, system_qty: Decimal) -> Decimal {
    final_qty(corrected_qty, system_qty) - system_qty
}

/// Hay conflicto si algún conteo difiere del sistema, o si los dos
/// armadores cargaron valores distintos entre sí.
pub fn has_conflict(system_qty: Decimal, counts: &[Decimal]) -> bool {
    let c1 = counts.first().copied();
    let c2 = counts.get(1).copied();

    c1.is_some_and(|q| q != system_qty)
        || c2.is_some_and(|q| q != system_qty)
        || matches!((c1, c2), (Some(a), Some(b)) if a != b)
}

/// Señal puramente orientativa para el armador: su conteo redondeado
/// coincide con el stock de sistema redondeado. No bloquea nada ni pesa
/// en la conciliación.
pub fn count_matches_system(count: Decimal, system_qty: Decimal) -> bool {
    count.round() == system_qty.round()
}

// ---
// Modelos de lectura (la forma anidada exacta que consume la UI)
// ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountView {
    pub user_id: Uuid,
    pub user_name: String,
    pub qty: Decimal,
    pub matches_system: bool,
}

// Un ítem con todo lo que la pantalla de conciliación necesita: foto del
// sistema, hasta dos conteos con nombre de armador, corrección y derivados.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionItemView {
    pub id: i64,
    pub codart: String,
    pub desart: String,
    pub system_qty: Decimal,
    pub corrected_qty: Option<Decimal>,
    pub counts: Vec<CountView>,
    pub final_qty: Decimal,
    pub diff: Decimal,
    pub has_conflict: bool,
}

impl SessionItemView {
    pub fn new(
        id: i64,
        codart: String,
        desart: String,
        system_qty: Decimal,
        corrected_qty: Option<Decimal>,
        counts: Vec<(Uuid, String, Decimal)>,
    ) -> Self {
        let qtys: Vec<Decimal> = counts.iter().map(|(_, _, q)| *q).collect();
        let counts = counts
            .into_iter()
            .map(|(user_id, user_name, qty)| CountView {
                user_id,
                user_name,
                qty,
                matches_system: count_matches_system(qty, system_qty),
            })
            .collect();

        SessionItemView {
            id,
            codart,
            desart,
            system_qty,
            corrected_qty,
            counts,
            final_qty: final_qty(corrected_qty, system_qty),
            diff: diff(corrected_qty, system_qty),
            has_conflict: has_conflict(system_qty, &qtys),
        }
    }
}

// Progreso de un participante dentro de una sesión (cuántos ítems contó).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: Uuid,
    pub user_name: String,
    pub counted: i64,
}

// Tarjeta del registro de auditorías.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: Uuid,
    pub name: String,
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub status: SessionStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub item_count: i64,
    pub user_progress: Vec<UserProgress>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn d(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn final_qty_prefers_correction_and_falls_back_to_system() {
        assert_eq!(final_qty(Some(d(4)), d(10)), d(4));
        assert_eq!(final_qty(None, d(10)), d(10));
    }

    #[test]
    fn clearing_a_correction_restores_the_precorrection_diff() {
        let system = d(10);
        let before = diff(None, system);
        assert_eq!(before, d(0));

        assert_eq!(diff(Some(d(6)), system), d(-4));
        // Limpiar la corrección vuelve a calcular contra el sistema solo.
        assert_eq!(diff(None, system), before);
    }

    #[test]
    fn conflict_rules_with_zero_one_and_two_counts() {
        // Sin conteos no hay nada que discuta con el sistema.
        assert!(!has_conflict(d(10), &[]));

        // Un conteo igual al sistema: sin conflicto. Distinto: conflicto.
        assert!(!has_conflict(d(10), &[d(10)]));
        assert!(has_conflict(d(10), &[d(9)]));

        // Dos conteos iguales entre sí e iguales al sistema: limpio.
        assert!(!has_conflict(d(10), &[d(10), d(10)]));
        // Dos conteos iguales entre sí pero distintos del sistema.
        assert!(has_conflict(d(10), &[d(8), d(8)]));
        // Conteos que coinciden con el sistema por separado no existen si
        // difieren entre sí; el desacuerdo mutuo alcanza.
        assert!(has_conflict(d(10), &[d(10), d(11)]));
    }

    #[test]
    fn reconciliation_scenario_three_items() {
        // Sesión con 3 ítems, sistema [10, 0, 5].
        // Armador A carga [10, 2, 5]; armador B carga [10, 1, 5].
        assert!(!has_conflict(d(10), &[d(10), d(10)]));
        assert!(has_conflict(d(0), &[d(2), d(1)]));
        assert!(!has_conflict(d(5), &[d(5), d(5)]));

        // El revisor corrige el ítem 2 a 1: ajuste = 1 - 0 = +1,
        // los otros quedan en 0.
        assert_eq!(diff(None, d(10)), d(0));
        assert_eq!(diff(Some(d(1)), d(0)), d(1));
        assert_eq!(diff(None, d(5)), d(0));
    }

    #[test]
    fn advisory_signal_compares_rounded_values() {
        let system = Decimal::new(102, 1); // 10.2
        assert!(count_matches_system(d(10), system));
        assert!(count_matches_system(Decimal::new(96, 1), system)); // 9.6 -> 10
        assert!(!count_matches_system(d(11), system));
    }

    #[test]
    fn item_view_derives_everything_at_construction() {
        let armador1 = Uuid::new_v4();
        let armador2 = Uuid::new_v4();
        let view = SessionItemView::new(
            7,
            "A100".into(),
            "ACEITE GIRASOL 1.5L".into(),
            d(0),
            Some(d(1)),
            vec![
                (armador1, "PEDRO".into(), d(2)),
                (armador2, "JUAN".into(), d(1)),
            ],
        );

        assert_eq!(view.final_qty, d(1));
        assert_eq!(view.diff, d(1));
        assert!(view.has_conflict);
        assert_eq!(view.counts.len(), 2);
        assert!(!view.counts[0].matches_system); // 2 vs 0
        assert!(!view.counts[1].matches_system); // 1 vs 0
    }
}
