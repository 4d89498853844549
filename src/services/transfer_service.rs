use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, TransferRepository},
    models::{
        catalog::WarehouseCode,
        transfer::{MovementType, TransferLine, TransferReceipt},
    },
};

/// Chequeos previos que no tocan la base: depósitos distintos, al menos un
/// renglón, cantidades positivas.
pub fn validate_transfer(
    origin: WarehouseCode,
    destination: WarehouseCode,
    lines: &[TransferLine],
) -> Result<(), AppError> {
    if origin == destination {
        return Err(AppError::SameWarehouse);
    }
    if lines.is_empty() {
        return Err(AppError::InvalidQuantity(
            "cargue productos para transferir".into(),
        ));
    }
    for line in lines {
        if line.qty <= Decimal::ZERO {
            return Err(AppError::InvalidQuantity(line.qty.to_string()));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct TransferService {
    catalog_repo: CatalogRepository,
    transfer_repo: TransferRepository,
    pool: PgPool,
}

impl TransferService {
    pub fn new(
        catalog_repo: CatalogRepository,
        transfer_repo: TransferRepository,
        pool: PgPool,
    ) -> Self {
        Self { catalog_repo, transfer_repo, pool }
    }

    // --- TRANSFERENCIA INTER-DEPÓSITO ---
    // El movimiento completo es una transacción: si un renglón no tiene
    // stock suficiente, no se mueve nada. Cada renglón graba salida y
    // entrada en el libro, atadas por el código de referencia.
    pub async fn transfer_stock(
        &self,
        origin: WarehouseCode,
        destination: WarehouseCode,
        lines: &[TransferLine],
        user_id: Uuid,
    ) -> Result<TransferReceipt, AppError> {
        validate_transfer(origin, destination, lines)?;

        let origin_wh = self
            .catalog_repo
            .find_warehouse_by_name(origin.as_name())
            .await?
            .ok_or(AppError::WarehouseNotFound)?;
        let destination_wh = self
            .catalog_repo
            .find_warehouse_by_name(destination.as_name())
            .await?
            .ok_or(AppError::WarehouseNotFound)?;

        let reference_code = new_reference_code();
        let mut tx = self.pool.begin().await?;

        for line in lines {
            // FOR UPDATE: el saldo no puede cambiar entre la validación y
            // el descuento.
            let product = self
                .catalog_repo
                .get_product_for_update(&mut *tx, &line.codart)
                .await?
                .ok_or_else(|| AppError::ProductNotFound(line.codart.clone()))?;

            let available = origin.stock_of(&product);
            if available < line.qty {
                return Err(AppError::InsufficientStock(line.codart.clone()));
            }

            self.catalog_repo
                .apply_transfer_delta(&mut *tx, origin, destination, &line.codart, line.qty)
                .await?;

            self.transfer_repo
                .record_movement(
                    &mut *tx,
                    &line.codart,
                    origin_wh.id,
                    -line.qty,
                    MovementType::Transferencia,
                    Some(&reference_code),
                    user_id,
                )
                .await?;
            self.transfer_repo
                .record_movement(
                    &mut *tx,
                    &line.codart,
                    destination_wh.id,
                    line.qty,
                    MovementType::Transferencia,
                    Some(&reference_code),
                    user_id,
                )
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Transferencia {} realizada: {} renglones {} -> {}",
            reference_code,
            lines.len(),
            origin.as_name(),
            destination.as_name()
        );

        Ok(TransferReceipt { reference_code, lines: lines.len() })
    }
}

/// Código de referencia legible para el comprobante, estilo "TRF-3F9A2C".
fn new_reference_code() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("TRF-{}", id[..6].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(codart: &str, qty: i64) -> TransferLine {
        TransferLine { codart: codart.to_string(), qty: Decimal::from(qty) }
    }

    #[test]
    fn rejects_same_origin_and_destination() {
        let result = validate_transfer(
            WarehouseCode::Llerena,
            WarehouseCode::Llerena,
            &[line("A1", 1)],
        );
        assert!(matches!(result, Err(AppError::SameWarehouse)));
    }

    #[test]
    fn rejects_empty_and_nonpositive_lines() {
        let empty = validate_transfer(WarehouseCode::Llerena, WarehouseCode::Betbeder, &[]);
        assert!(matches!(empty, Err(AppError::InvalidQuantity(_))));

        let zero = validate_transfer(
            WarehouseCode::Llerena,
            WarehouseCode::Betbeder,
            &[line("A1", 0)],
        );
        assert!(matches!(zero, Err(AppError::InvalidQuantity(_))));

        let negative = validate_transfer(
            WarehouseCode::Llerena,
            WarehouseCode::Betbeder,
            &[line("A1", -3)],
        );
        assert!(matches!(negative, Err(AppError::InvalidQuantity(_))));
    }

    #[test]
    fn accepts_a_well_formed_transfer() {
        let ok = validate_transfer(
            WarehouseCode::Betbeder,
            WarehouseCode::Llerena,
            &[line("A1", 2), line("B7", 1)],
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn reference_codes_are_prefixed_and_short() {
        let code = new_reference_code();
        assert!(code.starts_with("TRF-"));
        assert_eq!(code.len(), 10);
        assert_eq!(code, code.to_uppercase());
    }
}
