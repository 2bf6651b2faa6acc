//! # Error Types
//!
//! Domain-specific error types for mostrador-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mostrador-core errors (this file)                                     │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  mostrador-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  HTTP errors (in server)                                               │
//! │  └── ApiError         - What the frontend sees ({ error, code })       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Frontend     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Messages are Spanish because the frontend shows them verbatim.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No outbound movement type named like "Venta"/"Sale" exists.
    ///
    /// ## When This Occurs
    /// - The system movement types were renamed
    /// - The database was created without the default seed rows
    #[error("No hay un tipo de movimiento de venta configurado")]
    SaleMovementTypeMissing,

    /// System movement types cannot be removed or re-flowed.
    #[error("El tipo de movimiento {0} es del sistema y no se puede modificar")]
    SystemMovementType(i64),

    /// A product with inventory history stays in the catalog; it can be
    /// marked `inactivo` instead.
    #[error("El producto {0} tiene movimientos de inventario; márquelo como inactivo")]
    ProductHasMovements(String),

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// All of them are detected before anything is written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("Faltan campos requeridos: {field}")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} debe tener como máximo {max} caracteres")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} debe estar entre {min} y {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} debe ser mayor que cero")]
    MustBePositive { field: String },

    /// Value may be zero but not below.
    #[error("{field} no puede ser negativo")]
    Negative { field: String },

    /// Value, or an amount computed from it, exceeds what can be stored.
    #[error("{field} excede el valor máximo permitido")]
    TooLarge { field: String },

    /// Value must be a number.
    #[error("{field} debe ser numérico")]
    NotNumeric { field: String },

    /// Invalid format (e.g., invalid date, invalid sale code).
    #[error("{field} tiene un formato inválido: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} debe ser uno de: {}", .allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::SaleMovementTypeMissing;
        assert_eq!(
            err.to_string(),
            "No hay un tipo de movimiento de venta configurado"
        );

        let err = CoreError::SystemMovementType(2);
        assert_eq!(
            err.to_string(),
            "El tipo de movimiento 2 es del sistema y no se puede modificar"
        );

        let err = CoreError::ProductHasMovements("P001".into());
        assert_eq!(
            err.to_string(),
            "El producto P001 tiene movimientos de inventario; márquelo como inactivo"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("nombre");
        assert_eq!(err.to_string(), "Faltan campos requeridos: nombre");

        let err = ValidationError::NotAllowed {
            field: "flujo".to_string(),
            allowed: vec!["Entrada".to_string(), "Salida".to_string()],
        };
        assert_eq!(err.to_string(), "flujo debe ser uno de: Entrada, Salida");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("codigo").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "Faltan campos requeridos: codigo");
    }
}
