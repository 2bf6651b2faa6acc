//! # Customers
//!
//! A customer is one base record plus at most one subtype detail:
//!
//! ```text
//! ┌─────────────────────┐
//! │      CLIENTE        │  identificacion (PK), direccion, ciudad,
//! │   (base, shared)    │  telefono, correo
//! └─────────┬───────────┘
//!           │ exactly one of
//!     ┌─────┴──────────────────┐
//!     ▼                        ▼
//! ┌─────────────────┐   ┌──────────────────┐
//! │ CLIENTE_NATURAL │   │ CLIENTE_JURIDICO │
//! │ nombres,        │   │ razon_social     │
//! │ apellidos, doc  │   │                  │
//! └─────────────────┘   └──────────────────┘
//! ```
//!
//! In Rust the detail is the sum type [`CustomerDetail`]. A base row whose
//! detail row is missing resolves to [`CustomerDetail::Desconocido`]; that is
//! tolerated, the display name is just empty.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::{validate_email, validate_identificacion};

// =============================================================================
// Kind
// =============================================================================

/// Subtype tag, as stored on sales and shown in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum CustomerKind {
    /// Natural person (identified by CC, CE, passport...).
    Natural,
    /// Legal entity (identified by NIT).
    Juridico,
    /// Base row without detail row.
    Desconocido,
}

impl CustomerKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CustomerKind::Natural => "natural",
            CustomerKind::Juridico => "juridico",
            CustomerKind::Desconocido => "desconocido",
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Subtype-specific customer data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tipo", rename_all = "lowercase")]
pub enum CustomerDetail {
    Natural {
        primer_nombre: String,
        otros_nombres: Option<String>,
        primer_apellido: String,
        segundo_apellido: Option<String>,
        tipo_documento: String,
    },
    Juridico {
        razon_social: String,
    },
    Desconocido,
}

impl CustomerDetail {
    pub fn kind(&self) -> CustomerKind {
        match self {
            CustomerDetail::Natural { .. } => CustomerKind::Natural,
            CustomerDetail::Juridico { .. } => CustomerKind::Juridico,
            CustomerDetail::Desconocido => CustomerKind::Desconocido,
        }
    }

    /// Name shown on screens and frozen on sales.
    ///
    /// Natural persons use first name and first surname; legal entities
    /// use the registered company name.
    pub fn display_name(&self) -> String {
        match self {
            CustomerDetail::Natural {
                primer_nombre,
                primer_apellido,
                ..
            } => format!("{} {}", primer_nombre.trim(), primer_apellido.trim())
                .trim()
                .to_string(),
            CustomerDetail::Juridico { razon_social } => razon_social.trim().to_string(),
            CustomerDetail::Desconocido => String::new(),
        }
    }
}

/// A full customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub identificacion: String,
    pub direccion: Option<String>,
    pub ciudad: Option<String>,
    pub telefono: Option<String>,
    pub correo: Option<String>,
    #[serde(flatten)]
    pub detalle: CustomerDetail,
}

impl Customer {
    #[inline]
    pub fn kind(&self) -> CustomerKind {
        self.detalle.kind()
    }

    #[inline]
    pub fn display_name(&self) -> String {
        self.detalle.display_name()
    }

    /// Collapses the record into the view the sale workflow consumes.
    pub fn resolve(&self) -> ResolvedCustomer {
        ResolvedCustomer {
            identificacion: self.identificacion.clone(),
            tipo: self.kind(),
            nombre: self.display_name(),
            direccion: self.direccion.clone(),
            ciudad: self.ciudad.clone(),
            telefono: self.telefono.clone(),
            correo: self.correo.clone(),
        }
    }
}

/// The merged view of a customer: subtype tag, display name, contact fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResolvedCustomer {
    pub identificacion: String,
    pub tipo: CustomerKind,
    pub nombre: String,
    pub direccion: Option<String>,
    pub ciudad: Option<String>,
    pub telefono: Option<String>,
    pub correo: Option<String>,
}

// =============================================================================
// Input
// =============================================================================

/// Flat create/update body, as posted by the customer form.
///
/// `tipo` selects which of the subtype fields are read.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInput {
    #[serde(default)]
    pub identificacion: String,
    #[serde(default)]
    pub tipo: String,
    pub direccion: Option<String>,
    pub ciudad: Option<String>,
    pub telefono: Option<String>,
    pub correo: Option<String>,
    pub primer_nombre: Option<String>,
    pub otros_nombres: Option<String>,
    pub primer_apellido: Option<String>,
    pub segundo_apellido: Option<String>,
    pub tipo_documento: Option<String>,
    pub razon_social: Option<String>,
}

/// Trims and drops blank optional text.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CustomerInput {
    /// Validates the body and builds the customer to store.
    ///
    /// `identificacion_path` is the id from the URL on update; it wins over
    /// the body.
    pub fn into_customer(
        self,
        identificacion_path: Option<&str>,
    ) -> Result<Customer, ValidationError> {
        let identificacion = identificacion_path
            .map(str::to_string)
            .unwrap_or(self.identificacion)
            .trim()
            .to_string();
        validate_identificacion(&identificacion)?;
        validate_email(self.correo.as_deref())?;

        let detalle = match self.tipo.trim().to_lowercase().as_str() {
            "natural" => {
                let primer_nombre = clean(self.primer_nombre);
                let primer_apellido = clean(self.primer_apellido);
                match (primer_nombre, primer_apellido) {
                    (Some(primer_nombre), Some(primer_apellido)) => CustomerDetail::Natural {
                        primer_nombre,
                        otros_nombres: clean(self.otros_nombres),
                        primer_apellido,
                        segundo_apellido: clean(self.segundo_apellido),
                        tipo_documento: clean(self.tipo_documento)
                            .unwrap_or_else(|| "CC".to_string()),
                    },
                    _ => {
                        return Err(ValidationError::required("primer_nombre, primer_apellido"))
                    }
                }
            }
            "juridico" | "jurídico" => match clean(self.razon_social) {
                Some(razon_social) => CustomerDetail::Juridico { razon_social },
                None => return Err(ValidationError::required("razon_social")),
            },
            "" => return Err(ValidationError::required("tipo")),
            _ => {
                return Err(ValidationError::NotAllowed {
                    field: "tipo".to_string(),
                    allowed: vec!["natural".to_string(), "juridico".to_string()],
                })
            }
        };

        Ok(Customer {
            identificacion,
            direccion: clean(self.direccion),
            ciudad: clean(self.ciudad),
            telefono: clean(self.telefono),
            correo: clean(self.correo),
            detalle,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
