//! # Sales
//!
//! Everything about a sale that does not touch the database: the sale code
//! format, line-item aggregation, request validation, the seller snapshot,
//! and the committed row shapes.
//!
//! ## Lifecycle
//! ```text
//!   POST /api/venta body
//!          │
//!          ▼  SaleDraft::from_request  (validate, default date/time, aggregate)
//!   ┌─────────────┐
//!   │  SaleDraft  │  in memory only
//!   └──────┬──────┘
//!          │  SaleRepository::create   (one transaction)
//!          ▼
//!   ┌─────────────┐
//!   │    Sale     │  committed; deletion is physical, there is no void state
//!   └─────────────┘
//! ```
//!
//! ## Aggregation
//! ```text
//!   line.subtotal = precio_unitario × cantidad
//!   line.total    = (precio_unitario + IVA_unitario) × cantidad
//!   sale.subtotal = Σ line.subtotal
//!   sale.total    = Σ line.total
//! ```
//! Non-numeric inputs count as zero (see [`crate::coerce`]); negative
//! values and amounts that overflow the cent range are rejected.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::coerce;
use crate::customer::CustomerKind;
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Seller;
use crate::{SALE_CODE_DIGITS, SALE_CODE_PREFIX};

// =============================================================================
// Sale Code
// =============================================================================

/// Sale identifier: `V` followed by a 9-digit zero-padded number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SaleCode(String);

impl SaleCode {
    /// Formats a sequence number as a sale code.
    ///
    /// ## Example
    /// ```rust
    /// use mostrador_core::SaleCode;
    ///
    /// assert_eq!(SaleCode::from_number(1).as_str(), "V000000001");
    /// assert_eq!(SaleCode::from_number(42).as_str(), "V000000042");
    /// ```
    pub fn from_number(numero: i64) -> Self {
        SaleCode(format!(
            "{}{:0width$}",
            SALE_CODE_PREFIX,
            numero,
            width = SALE_CODE_DIGITS
        ))
    }

    /// The numeric part.
    pub fn number(&self) -> i64 {
        // Shape is checked on construction
        self.0[1..].parse().unwrap_or(0)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl FromStr for SaleCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidFormat {
            field: "codigo".to_string(),
            reason: format!(
                "se esperaba {}{}",
                SALE_CODE_PREFIX,
                "9".repeat(SALE_CODE_DIGITS)
            ),
        };

        let digits = s.strip_prefix(SALE_CODE_PREFIX).ok_or_else(invalid)?;
        if digits.len() != SALE_CODE_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        Ok(SaleCode(s.to_string()))
    }
}

impl fmt::Display for SaleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Line Items
// =============================================================================

/// One product line as posted by the sale form.
///
/// Numeric fields are raw JSON so that anything unparseable becomes zero
/// instead of rejecting the whole sale.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct LineItemInput {
    #[serde(default)]
    pub codigo_producto: Option<String>,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    #[ts(type = "number | string")]
    pub cantidad: Value,
    #[serde(default)]
    #[ts(type = "number | string")]
    pub precio_unitario: Value,
    #[serde(default, rename = "IVA_unitario", alias = "iva_unitario")]
    #[ts(type = "number | string")]
    pub iva_unitario: Value,
}

/// A line after coercion and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct SaleLineItem {
    pub codigo_producto: Option<String>,
    pub nombre: String,
    pub cantidad: i64,
    #[ts(type = "number")]
    pub precio_unitario: Money,
    #[ts(type = "number")]
    pub iva_unitario: Money,
    #[ts(type = "number")]
    pub subtotal: Money,
    #[ts(type = "number")]
    pub total: Money,
}

/// Names a field of line `index` the way the sale form does.
fn line_field(index: usize, name: &str) -> String {
    format!("productos[{}].{}", index, name)
}

fn rejected(field: String, why: coerce::Rejected) -> ValidationError {
    match why {
        coerce::Rejected::Negative => ValidationError::Negative { field },
        coerce::Rejected::TooLarge => ValidationError::TooLarge { field },
    }
}

impl SaleLineItem {
    /// Coerces one input line and computes its subtotal and total.
    ///
    /// `index` is the line's position in the request, used in error fields.
    ///
    /// ## Errors
    /// - `Negative` for a negative quantity, price or tax
    /// - `TooLarge` when a value or the line amount cannot be stored
    pub fn from_input(index: usize, input: &LineItemInput) -> Result<Self, ValidationError> {
        let cantidad = coerce::quantity_or_zero(&input.cantidad)
            .map_err(|why| rejected(line_field(index, "cantidad"), why))?;
        let precio_unitario = coerce::money_or_zero(&input.precio_unitario)
            .map_err(|why| rejected(line_field(index, "precio_unitario"), why))?;
        let iva_unitario = coerce::money_or_zero(&input.iva_unitario)
            .map_err(|why| rejected(line_field(index, "IVA_unitario"), why))?;

        let subtotal = precio_unitario
            .checked_mul_quantity(cantidad)
            .ok_or_else(|| ValidationError::TooLarge {
                field: line_field(index, "subtotal"),
            })?;
        let total = precio_unitario
            .checked_add(iva_unitario)
            .and_then(|unit| unit.checked_mul_quantity(cantidad))
            .ok_or_else(|| ValidationError::TooLarge {
                field: line_field(index, "total"),
            })?;

        Ok(SaleLineItem {
            codigo_producto: input
                .codigo_producto
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            nombre: input.nombre.trim().to_string(),
            cantidad,
            precio_unitario,
            iva_unitario,
            subtotal,
            total,
        })
    }
}

/// Order-level sums.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct SaleTotals {
    #[ts(type = "number")]
    pub subtotal: Money,
    #[ts(type = "number")]
    pub total: Money,
}

impl SaleTotals {
    /// Sums the lines; `TooLarge` if the order total cannot be stored.
    pub fn from_lines(lines: &[SaleLineItem]) -> Result<Self, ValidationError> {
        let too_large = |field: &str| ValidationError::TooLarge {
            field: field.to_string(),
        };
        Ok(SaleTotals {
            subtotal: Money::checked_sum(lines.iter().map(|l| l.subtotal))
                .ok_or_else(|| too_large("subtotal"))?,
            total: Money::checked_sum(lines.iter().map(|l| l.total))
                .ok_or_else(|| too_large("total"))?,
        })
    }

    /// IVA portion of the order.
    #[inline]
    pub fn tax(&self) -> Money {
        self.total - self.subtotal
    }
}

/// Computes every line and the order totals.
///
/// ## Example
/// ```rust
/// use mostrador_core::sale::{aggregate, LineItemInput};
/// use serde_json::json;
///
/// let line = LineItemInput {
///     nombre: "Cuaderno".into(),
///     cantidad: json!(2),
///     precio_unitario: json!(1500),
///     iva_unitario: json!(285),
///     ..Default::default()
/// };
/// let (_, totals) = aggregate(&[line]).unwrap();
/// assert_eq!(totals.subtotal.to_decimal_string(), "3000.00");
/// assert_eq!(totals.total.to_decimal_string(), "3570.00");
/// ```
pub fn aggregate(
    inputs: &[LineItemInput],
) -> Result<(Vec<SaleLineItem>, SaleTotals), ValidationError> {
    let lines = inputs
        .iter()
        .enumerate()
        .map(|(i, input)| SaleLineItem::from_input(i, input))
        .collect::<Result<Vec<_>, _>>()?;
    let totals = SaleTotals::from_lines(&lines)?;
    Ok((lines, totals))
}

// =============================================================================
// Request
// =============================================================================

/// Accepts a JSON string or number as text; null or missing is empty.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Seller fields the sale form may send to override the stored seller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, TS)]
#[ts(export)]
pub struct SellerOverrides {
    #[serde(default, rename = "NIT_vendedor", alias = "nit_vendedor")]
    pub nit_vendedor: Option<String>,
    #[serde(default)]
    pub nombre_o_razon_social_vendedor: Option<String>,
    #[serde(default)]
    pub direccion_vendedor: Option<String>,
    #[serde(default)]
    pub telefono_vendedor: Option<String>,
    #[serde(default)]
    pub municipio_vendedor: Option<String>,
    #[serde(default)]
    pub responsabilidad_fiscal_vendedor: Option<String>,
}

/// Body of `POST /api/venta`.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct SaleRequest {
    /// `YYYY-MM-DD`; today when absent.
    #[serde(default)]
    pub fecha: Option<String>,
    /// `HH:MM:SS` or `HH:MM`; now when absent.
    #[serde(default)]
    pub hora: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub identificacion_cliente: String,
    #[serde(default)]
    pub productos: Vec<LineItemInput>,
    #[serde(flatten)]
    #[ts(flatten)]
    pub vendedor: SellerOverrides,
}

fn parse_fecha(raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    // Full timestamps from date pickers carry the date in the first 10 chars
    let date_part = raw.get(..10).filter(|_| raw.len() > 10 && raw.as_bytes()[10] == b'T');
    NaiveDate::parse_from_str(date_part.unwrap_or(raw), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: "fecha".to_string(),
            reason: "se esperaba AAAA-MM-DD".to_string(),
        }
    })
}

fn parse_hora(raw: &str) -> Result<NaiveTime, ValidationError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| ValidationError::InvalidFormat {
            field: "hora".to_string(),
            reason: "se esperaba HH:MM:SS".to_string(),
        })
}

/// Treats a blank optional string as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// Draft
// =============================================================================

/// A validated, fully computed sale that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleDraft {
    pub fecha: NaiveDate,
    pub hora: NaiveTime,
    pub identificacion_cliente: String,
    pub lineas: Vec<SaleLineItem>,
    pub totales: SaleTotals,
    pub vendedor: SellerOverrides,
}

impl SaleDraft {
    /// Validates a request and computes its totals.
    ///
    /// `now` fills in a missing date or time.
    ///
    /// ## Errors
    /// - `Required` when the customer id or the product list is missing,
    ///   or a line has neither name nor product code
    /// - `InvalidFormat` for a malformed date or time
    /// - `Negative` / `TooLarge` for line amounts, see [`SaleLineItem::from_input`]
    pub fn from_request(request: SaleRequest, now: NaiveDateTime) -> Result<Self, ValidationError> {
        let identificacion_cliente = request.identificacion_cliente.trim().to_string();

        let mut missing = Vec::new();
        if identificacion_cliente.is_empty() {
            missing.push("identificacion_cliente");
        }
        if request.productos.is_empty() {
            missing.push("productos");
        }
        if !missing.is_empty() {
            return Err(ValidationError::required(missing.join(", ")));
        }

        let fecha = match present(&request.fecha) {
            Some(raw) => parse_fecha(raw)?,
            None => now.date(),
        };
        let hora = match present(&request.hora) {
            Some(raw) => parse_hora(raw)?,
            None => now.time().with_nanosecond(0).unwrap_or_else(|| now.time()),
        };

        let (lineas, totales) = aggregate(&request.productos)?;
        if let Some(i) = lineas
            .iter()
            .position(|l| l.nombre.is_empty() && l.codigo_producto.is_none())
        {
            return Err(ValidationError::required(format!("productos[{}].nombre", i)));
        }

        Ok(SaleDraft {
            fecha,
            hora,
            identificacion_cliente,
            lineas,
            totales,
            vendedor: request.vendedor,
        })
    }
}

// =============================================================================
// Seller Snapshot
// =============================================================================

/// Seller fields frozen on a sale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct SellerSnapshot {
    pub nit: String,
    pub nombre: String,
    pub direccion: String,
    pub telefono: String,
    pub municipio: String,
    pub responsabilidad_fiscal: String,
}

impl SellerSnapshot {
    /// Request fields win field by field; the stored seller fills the rest.
    pub fn merge(stored: Option<&Seller>, overrides: &SellerOverrides) -> Self {
        let pick = |over: &Option<String>, base: Option<&String>| -> String {
            present(over)
                .map(str::to_string)
                .or_else(|| base.cloned())
                .unwrap_or_default()
        };

        SellerSnapshot {
            nit: pick(&overrides.nit_vendedor, stored.map(|s| &s.nit)),
            nombre: pick(
                &overrides.nombre_o_razon_social_vendedor,
                stored.map(|s| &s.nombre_o_razon_social),
            ),
            direccion: pick(&overrides.direccion_vendedor, stored.map(|s| &s.direccion)),
            telefono: pick(&overrides.telefono_vendedor, stored.map(|s| &s.telefono)),
            municipio: pick(&overrides.municipio_vendedor, stored.map(|s| &s.municipio)),
            responsabilidad_fiscal: pick(
                &overrides.responsabilidad_fiscal_vendedor,
                stored.map(|s| &s.responsabilidad_fiscal),
            ),
        }
    }
}

// =============================================================================
// Committed Rows
// =============================================================================

/// A committed sale header with its customer and seller snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub codigo: String,
    pub numero: i64,
    #[ts(type = "string")]
    pub fecha: NaiveDate,
    #[ts(type = "string")]
    pub hora: NaiveTime,
    #[ts(type = "number")]
    pub subtotal: Money,
    #[ts(type = "number")]
    pub total: Money,
    pub identificacion_cliente: String,
    pub tipo_cliente: CustomerKind,
    pub nombre_cliente: String,
    pub direccion_cliente: Option<String>,
    pub ciudad_cliente: Option<String>,
    pub telefono_cliente: Option<String>,
    pub correo_cliente: Option<String>,
    pub nit_vendedor: String,
    pub nombre_vendedor: String,
    pub direccion_vendedor: String,
    pub telefono_vendedor: String,
    pub municipio_vendedor: String,
    pub responsabilidad_fiscal_vendedor: String,
}

impl Sale {
    /// Total in Colombian currency format (`$3.570,00`).
    pub fn total_formateado(&self) -> String {
        self.total.to_string()
    }
}

/// A stored sale line (`DETALLE_PRODUCTO_VENDIDO`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleDetail {
    pub id: i64,
    pub codigo_venta: String,
    pub codigo_producto: Option<String>,
    pub nombre_producto: String,
    pub cantidad: i64,
    #[ts(type = "number")]
    pub precio_unitario: Money,
    #[ts(type = "number")]
    pub costo_unitario: Money,
    #[ts(type = "number")]
    pub iva_unitario: Money,
    #[ts(type = "number")]
    pub subtotal: Money,
    #[ts(type = "number")]
    pub total: Money,
}

/// A sale read back with its lines, as returned by `GET /api/venta/{codigo}`.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct SaleReceipt {
    #[serde(flatten)]
    #[ts(flatten)]
    pub venta: Sale,
    pub total_formateado: String,
    pub detalles: Vec<SaleDetail>,
}

impl SaleReceipt {
    pub fn new(venta: Sale, detalles: Vec<SaleDetail>) -> Self {
        SaleReceipt {
            total_formateado: venta.total_formateado(),
            venta,
            detalles,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(14, 30, 15)
            .unwrap()
    }

    fn line(nombre: &str, cantidad: Value, precio: Value, iva: Value) -> LineItemInput {
        LineItemInput {
            codigo_producto: None,
            nombre: nombre.to_string(),
            cantidad,
            precio_unitario: precio,
            iva_unitario: iva,
        }
    }

    #[test]
    fn test_sale_code_format() {
        assert_eq!(SaleCode::from_number(1).to_string(), "V000000001");
        assert_eq!(SaleCode::from_number(123_456_789).as_str(), "V123456789");

        let code: SaleCode = "V000000042".parse().unwrap();
        assert_eq!(code.number(), 42);

        assert!("V42".parse::<SaleCode>().is_err());
        assert!("X000000042".parse::<SaleCode>().is_err());
        assert!("V00000004a".parse::<SaleCode>().is_err());
    }

    #[test]
    fn test_p001_scenario() {
        let (lines, totals) =
            aggregate(&[line("Cuaderno", json!(2), json!(1500), json!(285))]).unwrap();
        assert_eq!(lines[0].subtotal.to_decimal_string(), "3000.00");
        assert_eq!(lines[0].total.to_decimal_string(), "3570.00");
        assert_eq!(totals.subtotal, Money::from_units(3000));
        assert_eq!(totals.total, Money::from_units(3570));
        assert_eq!(totals.tax(), Money::from_units(570));
    }

    #[test]
    fn test_non_numeric_fields_count_as_zero() {
        let (lines, totals) = aggregate(&[
            line("A", json!("dos"), json!(1000), json!(190)),
            line("B", json!(3), json!(null), json!(10)),
            line("C", json!("4"), json!("500"), json!({})),
        ])
        .unwrap();
        assert_eq!(lines[0].cantidad, 0);
        assert_eq!(lines[0].total, Money::zero());
        assert_eq!(lines[1].subtotal, Money::zero());
        assert_eq!(lines[1].total, Money::from_units(30));
        assert_eq!(lines[2].total, Money::from_units(2000));

        let expected_subtotal: Money = lines.iter().map(|l| l.precio_unitario * l.cantidad).sum();
        let expected_total: Money = lines
            .iter()
            .map(|l| (l.precio_unitario + l.iva_unitario) * l.cantidad)
            .sum();
        assert_eq!(totals.subtotal, expected_subtotal);
        assert_eq!(totals.total, expected_total);
    }

    #[test]
    fn test_huge_quantity_is_rejected_not_wrapped() {
        let err = aggregate(&[line("A", json!(1e15), json!(1_000_000), json!(0))]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooLarge {
                field: "productos[0].subtotal".into()
            }
        );

        let err = aggregate(&[
            line("A", json!(1), json!(1), json!(0)),
            line("B", json!(1e19), json!(1), json!(0)),
        ])
        .unwrap_err();
        assert_eq!(err.to_string(), "productos[1].cantidad excede el valor máximo permitido");
    }

    #[test]
    fn test_order_total_overflow_is_rejected() {
        // 5e18 cents per line fits; the 1e19 sum does not
        let large = json!(50_000_000_000_000_u64);
        let err = aggregate(&[
            line("A", json!(1000), large.clone(), json!(0)),
            line("B", json!(1000), large, json!(0)),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooLarge {
                field: "subtotal".into()
            }
        );
    }

    #[test]
    fn test_negative_amounts_are_rejected() {
        let request = SaleRequest {
            identificacion_cliente: "1".into(),
            productos: vec![
                line("A", json!(2), json!(1500), json!(285)),
                line("B", json!(-5), json!(1500), json!(285)),
            ],
            ..Default::default()
        };
        let err = SaleDraft::from_request(request, now()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Negative {
                field: "productos[1].cantidad".into()
            }
        );
        assert_eq!(err.to_string(), "productos[1].cantidad no puede ser negativo");

        let err = aggregate(&[line("A", json!(1), json!("-10"), json!(0))]).unwrap_err();
        assert!(matches!(err, ValidationError::Negative { .. }));
    }

    #[test]
    fn test_iva_unitario_accepts_both_spellings() {
        let upper: LineItemInput =
            serde_json::from_value(json!({"nombre": "A", "IVA_unitario": 5})).unwrap();
        let lower: LineItemInput =
            serde_json::from_value(json!({"nombre": "A", "iva_unitario": 5})).unwrap();
        assert_eq!(upper.iva_unitario, json!(5));
        assert_eq!(lower.iva_unitario, json!(5));
    }

    #[test]
    fn test_draft_requires_customer_and_products() {
        let err = SaleDraft::from_request(SaleRequest::default(), now()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Faltan campos requeridos: identificacion_cliente, productos"
        );
    }

    #[test]
    fn test_draft_defaults_date_and_time() {
        let request: SaleRequest = serde_json::from_value(json!({
            "identificacion_cliente": 1020304050u64,
            "productos": [{"nombre": "Cuaderno", "cantidad": 1, "precio_unitario": 100}],
        }))
        .unwrap();
        let draft = SaleDraft::from_request(request, now()).unwrap();
        assert_eq!(draft.identificacion_cliente, "1020304050");
        assert_eq!(draft.fecha, now().date());
        assert_eq!(draft.hora, NaiveTime::from_hms_opt(14, 30, 15).unwrap());
    }

    #[test]
    fn test_draft_parses_and_rejects_dates() {
        let mut request = SaleRequest {
            fecha: Some("2024-01-31".into()),
            hora: Some("09:05".into()),
            identificacion_cliente: "1".into(),
            productos: vec![line("A", json!(1), json!(1), json!(0))],
            ..Default::default()
        };
        let draft = SaleDraft::from_request(request.clone(), now()).unwrap();
        assert_eq!(draft.fecha, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert_eq!(draft.hora, NaiveTime::from_hms_opt(9, 5, 0).unwrap());

        request.fecha = Some("31/01/2024".into());
        assert!(matches!(
            SaleDraft::from_request(request, now()),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_draft_rejects_anonymous_line() {
        let request = SaleRequest {
            identificacion_cliente: "1".into(),
            productos: vec![
                line("A", json!(1), json!(1), json!(0)),
                line("  ", json!(1), json!(1), json!(0)),
            ],
            ..Default::default()
        };
        let err = SaleDraft::from_request(request, now()).unwrap_err();
        assert_eq!(err, ValidationError::required("productos[1].nombre"));
    }

    #[test]
    fn test_seller_snapshot_merges_field_by_field() {
        let stored = Seller {
            nit: "900111222".into(),
            nombre_o_razon_social: "Mostrador S.A.S.".into(),
            direccion: "Calle 1".into(),
            telefono: "3000000".into(),
            municipio: "Bogotá".into(),
            responsabilidad_fiscal: "R-99-PN".into(),
        };
        let overrides = SellerOverrides {
            telefono_vendedor: Some("3111111".into()),
            municipio_vendedor: Some("  ".into()),
            ..Default::default()
        };

        let snapshot = SellerSnapshot::merge(Some(&stored), &overrides);
        assert_eq!(snapshot.nit, "900111222");
        assert_eq!(snapshot.telefono, "3111111");
        assert_eq!(snapshot.municipio, "Bogotá");

        let empty = SellerSnapshot::merge(None, &SellerOverrides::default());
        assert_eq!(empty, SellerSnapshot::default());
    }

    #[test]
    fn test_seller_overrides_read_from_flat_body() {
        let request: SaleRequest = serde_json::from_value(json!({
            "identificacion_cliente": "1",
            "productos": [],
            "NIT_vendedor": "800",
            "nombre_o_razon_social_vendedor": "Tienda",
        }))
        .unwrap();
        assert_eq!(request.vendedor.nit_vendedor.as_deref(), Some("800"));
        assert_eq!(
            request.vendedor.nombre_o_razon_social_vendedor.as_deref(),
            Some("Tienda")
        );
    }
}
