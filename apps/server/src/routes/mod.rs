//! # HTTP Routes
//!
//! | Module | Paths |
//! |--------|-------|
//! | [`health`] | `/api/health` |
//! | [`clientes`] | `/api/clientes`, `/api/cliente/{id}` |
//! | [`productos`] | `/api/productos`, `/api/producto/{codigo}` |
//! | [`vendedor`] | `/api/vendedor` |
//! | [`tipos_movimiento`] | `/api/tipos-movimiento[/{codigo}]` |
//! | [`inventario`] | `/api/movimientos-inventario`, `/api/existencias/{codigo}` |
//! | [`ventas`] | `/api/venta`, `/api/ventas`, `/api/venta/{codigo}[/factura]` |
//!
//! Each module exposes `router()`; [`crate::build_router`] merges them.

use serde::Serialize;

pub mod clientes;
pub mod health;
pub mod inventario;
pub mod productos;
pub mod tipos_movimiento;
pub mod vendedor;
pub mod ventas;

/// `{ "ok": true }` acknowledgement for deletes.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Ack { ok: true }
    }
}

/// Empty query values (`?flujo=`) mean "no filter".
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses an optional query value, reporting the field on failure.
pub(crate) fn parse_param<T: std::str::FromStr>(
    field: &str,
    value: Option<String>,
) -> Result<Option<T>, mostrador_core::ValidationError> {
    non_empty(value)
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| mostrador_core::ValidationError::InvalidFormat {
                    field: field.to_string(),
                    reason: format!("valor no válido: {v}"),
                })
        })
        .transpose()
}
