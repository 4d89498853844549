use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::{
    common::error::AppError,
    models::audit::{SessionItemView, StockControlSession},
};

const HEADERS: [&str; 9] = [
    "Código",
    "Producto",
    "Stock Sistema",
    "Conteo Armador 1",
    "Armador 1 Nombre",
    "Conteo Armador 2",
    "Armador 2 Nombre",
    "Stock Corregido",
    "Diferencia (Ajuste)",
];

// Un renglón del reporte de diferencias, ya con los fallbacks aplicados:
// conteo ausente -> "Pendiente", corrección ausente -> stock de sistema.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub codigo: String,
    pub producto: String,
    pub stock_sistema: Decimal,
    pub conteo_1: Option<Decimal>,
    pub armador_1: Option<String>,
    pub conteo_2: Option<Decimal>,
    pub armador_2: Option<String>,
    pub stock_corregido: Decimal,
    pub diferencia: Decimal,
}

impl ReportRow {
    pub fn from_item(item: &SessionItemView) -> Self {
        let c1 = item.counts.first();
        let c2 = item.counts.get(1);
        ReportRow {
            codigo: item.codart.clone(),
            producto: item.desart.clone(),
            stock_sistema: item.system_qty,
            conteo_1: c1.map(|c| c.qty),
            armador_1: c1.map(|c| c.user_name.clone()),
            conteo_2: c2.map(|c| c.qty),
            armador_2: c2.map(|c| c.user_name.clone()),
            stock_corregido: item.corrected_qty.unwrap_or(item.system_qty),
            diferencia: item.diff,
        }
    }
}

/// Filas del reporte: exactamente una por ítem, en el orden en que vienen
/// (orden de id ascendente, el mismo de la pantalla de conciliación).
pub fn report_rows(items: &[SessionItemView]) -> Vec<ReportRow> {
    items.iter().map(ReportRow::from_item).collect()
}

pub struct ExportedReport {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ReportService;

impl ReportService {
    pub fn new() -> Self {
        Self
    }

    /// Genera la planilla de la sesión, lista para descargar. Operación de
    /// solo lectura sobre el modelo de datos.
    pub fn export_session(
        &self,
        session: &StockControlSession,
        items: &[SessionItemView],
    ) -> Result<ExportedReport, AppError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Auditoria")?;

        for (col, header) in HEADERS.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header)?;
        }

        for (idx, row) in report_rows(items).iter().enumerate() {
            let r = (idx + 1) as u32;
            worksheet.write_string(r, 0, &row.codigo)?;
            worksheet.write_string(r, 1, &row.producto)?;
            write_number(worksheet, r, 2, row.stock_sistema)?;
            match row.conteo_1 {
                Some(qty) => write_number(worksheet, r, 3, qty)?,
                None => worksheet.write_string(r, 3, "Pendiente").map(|_| ())?,
            }
            worksheet.write_string(r, 4, row.armador_1.as_deref().unwrap_or("-"))?;
            match row.conteo_2 {
                Some(qty) => write_number(worksheet, r, 5, qty)?,
                None => worksheet.write_string(r, 5, "Pendiente").map(|_| ())?,
            }
            worksheet.write_string(r, 6, row.armador_2.as_deref().unwrap_or("-"))?;
            write_number(worksheet, r, 7, row.stock_corregido)?;
            write_number(worksheet, r, 8, row.diferencia)?;
        }

        let bytes = workbook.save_to_buffer()?;
        let filename = format!(
            "Auditoria_{}_{}.xlsx",
            sanitize_for_filename(&session.name),
            Utc::now().format("%Y-%m-%d")
        );

        Ok(ExportedReport { filename, bytes })
    }
}

/// El nombre de la sesión viaja dentro del header Content-Disposition y
/// como nombre de archivo: comillas, separadores de ruta y caracteres de
/// control se reemplazan por guion bajo.
fn sanitize_for_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '/' | '\\' | ':' | '*' | '?' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

fn write_number(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Decimal,
) -> Result<(), AppError> {
    worksheet.write_number(row, col, value.to_f64().unwrap_or(0.0))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audit::SessionItemView;
    use uuid::Uuid;

    fn d(n: i64) -> Decimal {
        Decimal::from(n)
    }

    fn item(
        id: i64,
        system: i64,
        corrected: Option<i64>,
        counts: Vec<(&str, i64)>,
    ) -> SessionItemView {
        SessionItemView::new(
            id,
            format!("C{id}"),
            format!("PRODUCTO {id}"),
            d(system),
            corrected.map(d),
            counts
                .into_iter()
                .map(|(name, qty)| (Uuid::new_v4(), name.to_string(), d(qty)))
                .collect(),
        )
    }

    #[test]
    fn one_row_per_item_in_fetch_order() {
        let items = vec![
            item(1, 10, None, vec![("PEDRO", 10), ("JUAN", 10)]),
            item(2, 0, Some(1), vec![("PEDRO", 2), ("JUAN", 1)]),
            item(3, 5, None, vec![]),
        ];

        let rows = report_rows(&items);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].codigo, "C1");
        assert_eq!(rows[1].codigo, "C2");
        assert_eq!(rows[2].codigo, "C3");
    }

    #[test]
    fn missing_counts_become_pendiente_placeholders() {
        let rows = report_rows(&[item(1, 5, None, vec![("PEDRO", 5)])]);

        assert_eq!(rows[0].conteo_1, Some(d(5)));
        assert_eq!(rows[0].armador_1.as_deref(), Some("PEDRO"));
        assert_eq!(rows[0].conteo_2, None);
        assert_eq!(rows[0].armador_2, None);
    }

    #[test]
    fn corrected_falls_back_to_system_and_diff_is_signed() {
        // Escenario de la conciliación: sistema [10, 0, 5], corrección 1 en
        // el segundo ítem -> ajustes [0, +1, 0].
        let items = vec![
            item(1, 10, None, vec![("A", 10), ("B", 10)]),
            item(2, 0, Some(1), vec![("A", 2), ("B", 1)]),
            item(3, 5, None, vec![("A", 5), ("B", 5)]),
        ];

        let rows = report_rows(&items);
        assert_eq!(rows[0].stock_corregido, d(10));
        assert_eq!(rows[0].diferencia, d(0));
        assert_eq!(rows[1].stock_corregido, d(1));
        assert_eq!(rows[1].diferencia, d(1));
        assert_eq!(rows[2].diferencia, d(0));

        // Una corrección hacia abajo da ajuste negativo.
        let down = report_rows(&[item(4, 10, Some(6), vec![])]);
        assert_eq!(down[0].diferencia, d(-4));
    }

    #[test]
    fn workbook_is_generated_with_session_name_in_filename() {
        let session = StockControlSession {
            id: Uuid::new_v4(),
            name: "CONTROL MAYO".into(),
            warehouse_id: Uuid::new_v4(),
            status: crate::models::audit::SessionStatus::Active,
            created_by: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
        };
        let items = vec![item(1, 10, None, vec![])];

        let report = ReportService::new().export_session(&session, &items).unwrap();
        assert!(report.filename.starts_with("Auditoria_CONTROL MAYO_"));
        assert!(report.filename.ends_with(".xlsx"));
        assert!(!report.bytes.is_empty());
    }

    #[test]
    fn filename_escapes_characters_unsafe_for_the_header() {
        let session = StockControlSession {
            id: Uuid::new_v4(),
            name: "CONTROL \"MAYO\"/06".into(),
            warehouse_id: Uuid::new_v4(),
            status: crate::models::audit::SessionStatus::Active,
            created_by: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
        };
        let items = vec![item(1, 10, None, vec![])];

        let report = ReportService::new().export_session(&session, &items).unwrap();
        assert!(!report.filename.contains('"'));
        assert!(!report.filename.contains('/'));
        assert!(report.filename.starts_with("Auditoria_CONTROL _MAYO__06_"));
    }
}
