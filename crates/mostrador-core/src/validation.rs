//! # Validation Module
//!
//! Input validation utilities for Mostrador POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (React forms)                                       │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: axum handler (Rust)                                          │
//! │  ├── JSON decoding                                                     │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── PRIMARY KEY (sale codes, product codes)                           │
//! │  └── Triggers protecting system movement types                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here runs before any write.

use serde_json::Value;

use crate::coerce;
use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of business codes (product codes, identifications).
pub const MAX_CODE_LEN: usize = 50;

/// Maximum length of display names.
pub const MAX_NAME_LEN: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - No whitespace inside (codes are typed into URLs)
///
/// ## Example
/// ```rust
/// use mostrador_core::validation::validate_product_code;
///
/// assert!(validate_product_code("P001").is_ok());
/// assert!(validate_product_code("").is_err());
/// assert!(validate_product_code("P 001").is_err());
/// ```
pub fn validate_product_code(codigo: &str) -> ValidationResult<()> {
    validate_code("codigo", codigo)
}

/// Validates a customer identification (CC, NIT with check digit, ...).
///
/// ## Example
/// ```rust
/// use mostrador_core::validation::validate_identificacion;
///
/// assert!(validate_identificacion("900123456-7").is_ok());
/// assert!(validate_identificacion("  ").is_err());
/// ```
pub fn validate_identificacion(identificacion: &str) -> ValidationResult<()> {
    validate_code("identificacion", identificacion)
}

fn validate_code(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > MAX_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_CODE_LEN,
        });
    }

    if value.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "no debe contener espacios".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (product, customer, movement type).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an optional e-mail address: blank is fine, otherwise it needs
/// a local part and a dotted domain.
pub fn validate_email(correo: Option<&str>) -> ValidationResult<()> {
    let Some(correo) = correo.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(());
    };

    let valid = correo
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.ends_with('.'))
        .unwrap_or(false);

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "correo".to_string(),
            reason: "no es un correo válido".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the quantity of a manually posted movement.
///
/// Unlike sale lines, a movement with a bad quantity is rejected: it must be
/// a positive whole number (a numeric string is accepted).
pub fn validate_movement_quantity(cantidad: &Value) -> ValidationResult<i64> {
    if cantidad.is_null() {
        return Err(ValidationError::required("cantidad"));
    }
    coerce::positive_quantity(cantidad).ok_or_else(|| ValidationError::MustBePositive {
        field: "cantidad".to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
