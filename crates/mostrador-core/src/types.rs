//! # Domain Types
//!
//! Catalog and inventory types used throughout Mostrador POS.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  MovementType   │   │ InventoryMove-  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │      ment       │       │
//! │  │  codigo (PK)    │   │  codigo (auto)  │   │  ─────────────  │       │
//! │  │  nombre         │   │  nombre         │   │  id (auto)      │       │
//! │  │  costo, precio  │   │  flujo ─────────┼──►│  cantidad (>0)  │       │
//! │  │  tasa_iva (bps) │   │  es_sistema     │   │  codigo_venta?  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │      Flow       │   │     Seller      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Entrada (+)    │   │  singleton      │       │
//! │  │  1900 = 19%     │   │  Salida  (-)    │   │  id = 1         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Names
//! Field names stay in Spanish because the React client and the stored
//! schema both use them.

use chrono::NaiveDate;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{validate_name, validate_product_code};
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1900 bps = 19% (Colombian general IVA)
///
/// On the wire the rate is a fraction (`0.19`), which is what the client
/// sends in `tasa_iva`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct TaxRate(u32);

impl TaxRate {
    /// General IVA rate applied when a product names no rate.
    pub const DEFAULT_IVA: TaxRate = TaxRate(1900);

    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a fraction (`0.19` -> 1900 bps).
    ///
    /// Negative or non-finite fractions are rejected.
    pub fn from_fraction(fraction: f64) -> Option<Self> {
        if !fraction.is_finite() || fraction < 0.0 || fraction > 1.0 {
            return None;
        }
        Some(TaxRate((fraction * 10_000.0).round() as u32))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a fraction (`0.19`).
    #[inline]
    pub fn fraction(&self) -> f64 {
        self.0 as f64 / 10_000.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::DEFAULT_IVA
    }
}

impl Serialize for TaxRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.fraction())
    }
}

impl<'de> Deserialize<'de> for TaxRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fraction = f64::deserialize(deserializer)?;
        TaxRate::from_fraction(fraction)
            .ok_or_else(|| de::Error::custom("tasa_iva debe estar entre 0 y 1"))
    }
}

// =============================================================================
// Flow
// =============================================================================

/// Direction of an inventory movement.
///
/// `Entrada` adds stock, `Salida` removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Flow {
    Entrada,
    Salida,
}

impl Flow {
    /// Applies the flow's sign to a positive magnitude.
    #[inline]
    pub const fn signed(&self, cantidad: i64) -> i64 {
        match self {
            Flow::Entrada => cantidad,
            Flow::Salida => -cantidad,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Flow::Entrada => "Entrada",
            Flow::Salida => "Salida",
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flow {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Entrada" => Ok(Flow::Entrada),
            "Salida" => Ok(Flow::Salida),
            _ => Err(ValidationError::NotAllowed {
                field: "flujo".to_string(),
                allowed: vec!["Entrada".to_string(), "Salida".to_string()],
            }),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// Whether a product is offered at the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ProductStatus {
    #[default]
    Activo,
    Inactivo,
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Business key chosen by the shop (`P001`).
    pub codigo: String,

    pub nombre: String,

    /// Purchase cost per unit.
    #[ts(type = "number")]
    pub costo: Money,

    /// Sale price per unit, before IVA.
    #[ts(type = "number")]
    pub precio: Money,

    pub descripcion: Option<String>,

    pub estado: ProductStatus,

    /// Resolved IVA rate (0 for exempt products).
    #[ts(type = "number")]
    pub tasa_iva: TaxRate,
}

impl Product {
    /// IVA charged on one unit at the product's rate.
    ///
    /// ## Example
    /// ```rust
    /// use mostrador_core::{Money, Product, ProductStatus, TaxRate};
    ///
    /// let product = Product {
    ///     codigo: "P001".into(),
    ///     nombre: "Cuaderno".into(),
    ///     costo: Money::from_units(1000),
    ///     precio: Money::from_units(1500),
    ///     descripcion: None,
    ///     estado: ProductStatus::Activo,
    ///     tasa_iva: TaxRate::DEFAULT_IVA,
    /// };
    /// assert_eq!(product.unit_tax(), Money::from_units(285));
    /// ```
    pub fn unit_tax(&self) -> Money {
        self.precio.calculate_tax(self.tasa_iva)
    }

    /// Unit price including IVA.
    pub fn price_with_tax(&self) -> Money {
        self.precio + self.unit_tax()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.estado == ProductStatus::Activo
    }
}

/// Create/update body for a product.
///
/// `costo` and `precio` are optional here so a missing field surfaces as
/// "Faltan campos requeridos" instead of a decode error.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct ProductInput {
    #[serde(default)]
    pub codigo: String,
    #[serde(default)]
    pub nombre: String,
    #[ts(type = "number | null")]
    pub costo: Option<Money>,
    #[ts(type = "number | null")]
    pub precio: Option<Money>,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub estado: Option<ProductStatus>,
    /// Explicit IVA fraction; ignored when `exento` is set.
    #[serde(default)]
    #[ts(type = "number | null")]
    pub tasa_iva: Option<TaxRate>,
    #[serde(default)]
    pub exento: bool,
}

impl ProductInput {
    /// Resolves the effective IVA rate.
    ///
    /// ## Rule
    /// ```text
    /// exento = true        → 0
    /// tasa_iva = Some(r)   → r
    /// otherwise            → 19%
    /// ```
    pub fn resolved_tax_rate(&self) -> TaxRate {
        if self.exento {
            TaxRate::zero()
        } else {
            self.tasa_iva.unwrap_or(TaxRate::DEFAULT_IVA)
        }
    }

    /// Validates the body and builds the product to store.
    ///
    /// `codigo_path` is the code from the URL on update; it wins over the body.
    pub fn into_product(self, codigo_path: Option<&str>) -> Result<Product, ValidationError> {
        let codigo = codigo_path
            .map(str::to_string)
            .unwrap_or_else(|| self.codigo.trim().to_string());

        let mut missing = Vec::new();
        if codigo.is_empty() {
            missing.push("codigo");
        }
        if self.nombre.trim().is_empty() {
            missing.push("nombre");
        }
        if self.costo.is_none() {
            missing.push("costo");
        }
        if self.precio.is_none() {
            missing.push("precio");
        }
        if !missing.is_empty() {
            return Err(ValidationError::required(missing.join(", ")));
        }

        validate_product_code(&codigo)?;
        validate_name("nombre", &self.nombre)?;

        let tasa_iva = self.resolved_tax_rate();
        let costo = self.costo.unwrap_or_default();
        let precio = self.precio.unwrap_or_default();
        if costo.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "costo".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
        if precio.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "precio".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }

        Ok(Product {
            codigo,
            nombre: self.nombre.trim().to_string(),
            costo,
            precio,
            descripcion: self.descripcion.filter(|d| !d.trim().is_empty()),
            estado: self.estado.unwrap_or_default(),
            tasa_iva,
        })
    }
}

// =============================================================================
// Seller
// =============================================================================

/// The shop's own fiscal identity, stored as a single row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Seller {
    #[serde(default)]
    pub nit: String,
    #[serde(default)]
    pub nombre_o_razon_social: String,
    #[serde(default)]
    pub direccion: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub municipio: String,
    #[serde(default)]
    pub responsabilidad_fiscal: String,
}

// =============================================================================
// Movement Types
// =============================================================================

/// A named category of inventory movement (Compra, Venta, ajustes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MovementType {
    pub codigo: i64,
    pub nombre: String,
    pub flujo: Flow,
    /// Seeded defaults cannot be deleted or re-flowed.
    pub es_sistema: bool,
}

impl MovementType {
    /// Whether this type can stand for sales when posting sale movements.
    ///
    /// Outbound, with "venta" or "sale" somewhere in the name.
    pub fn is_sale_type(&self) -> bool {
        if self.flujo != Flow::Salida {
            return false;
        }
        let name = self.nombre.to_lowercase();
        name.contains("venta") || name.contains("sale")
    }
}

/// Create/update body for a movement type.
///
/// `flujo` arrives as free text so that an unknown value is reported as
/// "Flujo no válido" rather than a decode failure.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct MovementTypeInput {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub flujo: String,
}

impl MovementTypeInput {
    /// Returns the trimmed name and parsed flow.
    pub fn validate(&self) -> Result<(String, Flow), ValidationError> {
        let nombre = self.nombre.trim();
        if nombre.is_empty() || self.flujo.trim().is_empty() {
            return Err(ValidationError::required("nombre, flujo"));
        }
        validate_name("nombre", nombre)?;
        let flujo = self
            .flujo
            .parse::<Flow>()
            .map_err(|_| ValidationError::InvalidFormat {
                field: "flujo".to_string(),
                reason: "Flujo no válido".to_string(),
            })?;
        Ok((nombre.to_string(), flujo))
    }
}

// =============================================================================
// Inventory Movements
// =============================================================================

/// A stored inventory movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryMovement {
    pub id: i64,
    #[ts(type = "string")]
    pub fecha: NaiveDate,
    /// Positive magnitude; the sign comes from the type's flow.
    pub cantidad: i64,
    pub codigo_tipo_movimiento: i64,
    pub codigo_producto: String,
    /// Sale that posted this movement, if any.
    pub codigo_venta: Option<String>,
    pub observacion: Option<String>,
}

/// A movement joined with its type and product, as listed in history views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MovementEntry {
    pub id: i64,
    #[ts(type = "string")]
    pub fecha: NaiveDate,
    pub cantidad: i64,
    pub cantidad_con_signo: i64,
    pub codigo_tipo_movimiento: i64,
    pub nombre_tipo_movimiento: String,
    pub flujo: Flow,
    pub codigo_producto: String,
    pub nombre_producto: Option<String>,
    pub codigo_venta: Option<String>,
    pub observacion: Option<String>,
}

/// One entry of a batch movement post.
///
/// `cantidad` is kept loose so the batch can report which entry is bad.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct NewMovement {
    #[serde(default)]
    #[ts(type = "string | null")]
    pub fecha: Option<NaiveDate>,
    #[serde(default)]
    #[ts(type = "number")]
    pub cantidad: serde_json::Value,
    pub codigo_tipo_movimiento: i64,
    #[serde(default)]
    pub codigo_producto: String,
    #[serde(default)]
    pub observacion: Option<String>,
}

/// Filters for the movement history listing.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct MovementFilter {
    pub codigo_producto: Option<String>,
    pub codigo_tipo_movimiento: Option<i64>,
    pub flujo: Option<Flow>,
    #[ts(type = "string | null")]
    pub desde: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub hasta: Option<NaiveDate>,
    pub pagina: Option<u32>,
    pub por_pagina: Option<u32>,
}

impl MovementFilter {
    /// Returns `(page, per_page)` clamped to valid bounds.
    pub fn page(&self) -> Page {
        Page::new(self.pagina, self.por_pagina)
    }
}

/// One page of movement history plus the unpaginated count.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct MovementPage {
    pub movimientos: Vec<MovementEntry>,
    pub total: i64,
    pub pagina: u32,
    pub por_pagina: u32,
}

// =============================================================================
// Pagination
// =============================================================================

/// Normalized page request (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    /// Clamps a requested page: number at least 1, size in `1..=MAX_PAGE_SIZE`.
    pub fn new(number: Option<u32>, size: Option<u32>) -> Self {
        Page {
            number: number.unwrap_or(1).max(1),
            size: size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    #[inline]
    pub fn offset(&self) -> i64 {
        (self.number as i64 - 1) * self.size as i64
    }

    #[inline]
    pub fn limit(&self) -> i64 {
        self.size as i64
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn input(exento: bool, tasa: Option<TaxRate>) -> ProductInput {
        ProductInput {
            codigo: "P001".into(),
            nombre: "Cuaderno".into(),
            costo: Some(Money::from_units(1000)),
            precio: Some(Money::from_units(1500)),
            tasa_iva: tasa,
            exento,
            ..Default::default()
        }
    }

    #[test]
    fn test_tax_rate_resolution() {
        assert_eq!(input(true, Some(TaxRate::from_bps(500))).resolved_tax_rate(), TaxRate::zero());
        assert_eq!(input(false, Some(TaxRate::from_bps(500))).resolved_tax_rate().bps(), 500);
        assert_eq!(input(false, None).resolved_tax_rate(), TaxRate::DEFAULT_IVA);
    }

    #[test]
    fn test_tax_rate_wire_format() {
        assert_eq!(serde_json::to_string(&TaxRate::DEFAULT_IVA).unwrap(), "0.19");
        let rate: TaxRate = serde_json::from_str("0.05").unwrap();
        assert_eq!(rate.bps(), 500);
        assert!(serde_json::from_str::<TaxRate>("1.5").is_err());
    }

    #[test]
    fn test_product_requires_fields() {
        let err = ProductInput {
            codigo: "P009".into(),
            ..Default::default()
        }
        .into_product(None)
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::required("nombre, costo, precio")
        );
    }

    #[test]
    fn test_product_unit_tax() {
        let product = input(false, None).into_product(None).unwrap();
        assert_eq!(product.unit_tax(), Money::from_units(285));
        assert_eq!(product.price_with_tax(), Money::from_units(1785));
        assert!(product.is_active());
    }

    #[test]
    fn test_path_code_wins_on_update() {
        let product = input(false, None).into_product(Some("P777")).unwrap();
        assert_eq!(product.codigo, "P777");
    }

    #[test]
    fn test_flow_parsing_and_sign() {
        assert_eq!("Entrada".parse::<Flow>().unwrap(), Flow::Entrada);
        assert!("entrada".parse::<Flow>().is_err());
        assert_eq!(Flow::Entrada.signed(10), 10);
        assert_eq!(Flow::Salida.signed(3), -3);
    }

    #[test]
    fn test_movement_type_input_validation() {
        let empty = MovementTypeInput {
            nombre: "  ".into(),
            flujo: "Entrada".into(),
        };
        assert!(matches!(
            empty.validate(),
            Err(ValidationError::Required { .. })
        ));

        let bad_flow = MovementTypeInput {
            nombre: "Merma".into(),
            flujo: "Lateral".into(),
        };
        let err = bad_flow.validate().unwrap_err();
        assert!(err.to_string().contains("Flujo no válido"));
    }

    #[test]
    fn test_sale_type_detection() {
        let venta = MovementType {
            codigo: 2,
            nombre: "Venta mostrador".into(),
            flujo: Flow::Salida,
            es_sistema: true,
        };
        assert!(venta.is_sale_type());

        let wrong_flow = MovementType {
            flujo: Flow::Entrada,
            ..venta.clone()
        };
        assert!(!wrong_flow.is_sale_type());

        let english = MovementType {
            nombre: "POS SALE".into(),
            ..venta
        };
        assert!(english.is_sale_type());
    }

    #[test]
    fn test_page_clamping() {
        let page = Page::new(None, None);
        assert_eq!((page.number, page.size), (1, DEFAULT_PAGE_SIZE));

        let page = Page::new(Some(0), Some(10_000));
        assert_eq!((page.number, page.size), (1, MAX_PAGE_SIZE));

        let page = Page::new(Some(3), Some(20));
        assert_eq!(page.offset(), 40);
    }
}
