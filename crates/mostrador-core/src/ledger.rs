//! # Inventory Ledger
//!
//! Stock is never stored. It is the fold of every movement's signed
//! quantity:
//!
//! ```text
//!   Entrada  10   → +10
//!   Salida    3   →  -3
//!                   ────
//!   stock            7
//! ```
//!
//! The database computes the same fold in SQL; this module is the reference
//! definition used by tests and by code that already holds the rows.

use crate::types::{Flow, MovementEntry};

/// Signed quantity of one movement.
///
/// A movement whose type is unknown (`None`) contributes nothing.
#[inline]
pub fn signed_quantity(flujo: Option<Flow>, cantidad: i64) -> i64 {
    flujo.map(|f| f.signed(cantidad)).unwrap_or(0)
}

/// Current stock from `(flow, quantity)` pairs.
pub fn current_stock<I>(movements: I) -> i64
where
    I: IntoIterator<Item = (Option<Flow>, i64)>,
{
    movements
        .into_iter()
        .map(|(flujo, cantidad)| signed_quantity(flujo, cantidad))
        .sum()
}

/// Current stock of one product from already-joined history rows.
pub fn stock_of(codigo_producto: &str, entries: &[MovementEntry]) -> i64 {
    current_stock(
        entries
            .iter()
            .filter(|e| e.codigo_producto == codigo_producto)
            .map(|e| (Some(e.flujo), e.cantidad)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(id: i64, producto: &str, flujo: Flow, cantidad: i64) -> MovementEntry {
        MovementEntry {
            id,
            fecha: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            cantidad,
            cantidad_con_signo: flujo.signed(cantidad),
            codigo_tipo_movimiento: 1,
            nombre_tipo_movimiento: flujo.to_string(),
            flujo,
            codigo_producto: producto.to_string(),
            nombre_producto: None,
            codigo_venta: None,
            observacion: None,
        }
    }

    #[test]
    fn test_in_ten_out_three_is_seven() {
        let stock = current_stock([(Some(Flow::Entrada), 10), (Some(Flow::Salida), 3)]);
        assert_eq!(stock, 7);
    }

    #[test]
    fn test_no_movements_is_zero() {
        assert_eq!(current_stock(Vec::new()), 0);
    }

    #[test]
    fn test_unknown_flow_counts_as_zero() {
        let stock = current_stock([(Some(Flow::Entrada), 4), (None, 100)]);
        assert_eq!(stock, 4);
    }

    #[test]
    fn test_stock_can_go_negative() {
        assert_eq!(current_stock([(Some(Flow::Salida), 2)]), -2);
    }

    #[test]
    fn test_fold_equals_sum_of_signed_quantities() {
        let entries = vec![
            entry(1, "X", Flow::Entrada, 10),
            entry(2, "Y", Flow::Entrada, 50),
            entry(3, "X", Flow::Salida, 3),
            entry(4, "X", Flow::Entrada, 1),
        ];
        let expected: i64 = entries
            .iter()
            .filter(|e| e.codigo_producto == "X")
            .map(|e| e.cantidad_con_signo)
            .sum();
        assert_eq!(stock_of("X", &entries), expected);
        assert_eq!(stock_of("X", &entries), 8);
        assert_eq!(stock_of("Z", &entries), 0);
    }
}
