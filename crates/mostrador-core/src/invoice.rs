//! # Electronic Invoice Payload
//!
//! Maps a committed sale to the JSON body the invoicing gateway (Factus)
//! expects when registering an electronic invoice. Sending it, token
//! handling, and the PDF/XML downloads belong to the client application;
//! this module only builds the document.
//!
//! ## Shape
//! ```text
//! {
//!   "document": "01",                 sales invoice
//!   "reference_code": "V000000007",   our sale code
//!   "payment_form": "1",              cash (contado)
//!   "payment_method_code": "10",      efectivo
//!   "customer": { identification, dv, names | company, ...ids },
//!   "items": [ { code_reference, name, quantity, price, tax_rate, ... } ]
//! }
//! ```
//!
//! ## Gateway Codes
//! | Field                        | Value | Meaning                        |
//! |------------------------------|-------|--------------------------------|
//! | `legal_organization_id`      | 1 / 2 | legal entity / natural person  |
//! | `tribute_id` (customer)      | 18/21 | IVA responsible / not liable   |
//! | `identification_document_id` | 3 / 6 | cédula / NIT (see table below) |
//! | `unit_measure_id`            | 70    | unit                           |
//! | `standard_code_id`           | 1     | seller's own product code      |
//! | `tribute_id` (item)          | 1     | IVA                            |

use serde::Serialize;
use ts_rs::TS;

use crate::customer::{Customer, CustomerDetail, CustomerKind};
use crate::money::Money;
use crate::sale::{Sale, SaleDetail};

pub const DOCUMENT_SALES_INVOICE: &str = "01";
pub const PAYMENT_FORM_CASH: &str = "1";
pub const PAYMENT_METHOD_CASH: &str = "10";
pub const UNIT_MEASURE_UNIT: u32 = 70;
pub const STANDARD_CODE_OWN: u32 = 1;
pub const ITEM_TRIBUTE_IVA: u32 = 1;

/// Weights applied right-to-left when computing a NIT check digit.
const NIT_WEIGHTS: [u32; 15] = [3, 7, 13, 17, 19, 23, 29, 37, 41, 43, 47, 53, 59, 67, 71];

// =============================================================================
// Payload Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct InvoicePayload {
    pub document: String,
    pub reference_code: String,
    pub observation: String,
    pub payment_form: String,
    pub payment_method_code: String,
    pub customer: InvoiceCustomer,
    pub items: Vec<InvoiceItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct InvoiceCustomer {
    pub identification: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub names: Option<String>,
    pub address: String,
    pub email: String,
    pub phone: String,
    pub legal_organization_id: String,
    pub tribute_id: String,
    pub identification_document_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct InvoiceItem {
    pub code_reference: String,
    pub name: String,
    pub quantity: i64,
    pub discount_rate: f64,
    /// Unit price including IVA, two decimals.
    pub price: String,
    /// IVA percentage, two decimals (`"19.00"`).
    pub tax_rate: String,
    pub unit_measure_id: u32,
    pub standard_code_id: u32,
    /// 1 when the line carries no IVA.
    pub is_excluded: u8,
    pub tribute_id: u32,
    #[ts(type = "Array<unknown>")]
    pub withholding_taxes: Vec<serde_json::Value>,
}

// =============================================================================
// Mapping
// =============================================================================

/// Gateway id for a Colombian identity document abbreviation.
///
/// | Doc | Id | Document                    |
/// |-----|----|-----------------------------|
/// | RC  | 1  | registro civil              |
/// | TI  | 2  | tarjeta de identidad        |
/// | CC  | 3  | cédula de ciudadanía        |
/// | TE  | 4  | tarjeta de extranjería      |
/// | CE  | 5  | cédula de extranjería       |
/// | NIT | 6  | NIT                         |
/// | PA  | 7  | pasaporte                   |
/// | PEP | 9  | permiso especial            |
pub fn document_type_id(tipo_documento: &str) -> &'static str {
    match tipo_documento.trim().to_uppercase().as_str() {
        "RC" => "1",
        "TI" => "2",
        "TE" => "4",
        "CE" => "5",
        "NIT" => "6",
        "PA" | "PASAPORTE" => "7",
        "PEP" => "9",
        _ => "3",
    }
}

/// DIAN check digit (dígito de verificación) for a NIT.
///
/// ## Example
/// ```rust
/// use mostrador_core::invoice::nit_check_digit;
///
/// assert_eq!(nit_check_digit("900373115"), Some(3));
/// assert_eq!(nit_check_digit("800197268"), Some(4));
/// assert_eq!(nit_check_digit("abc"), None);
/// ```
pub fn nit_check_digit(nit: &str) -> Option<u32> {
    if nit.is_empty() || nit.len() > NIT_WEIGHTS.len() {
        return None;
    }
    let mut sum = 0;
    for (digit, weight) in nit.chars().rev().zip(NIT_WEIGHTS) {
        sum += digit.to_digit(10)? * weight;
    }
    let rest = sum % 11;
    Some(if rest > 1 { 11 - rest } else { rest })
}

/// Splits `900123456-7` into number and check digit.
fn split_nit(identificacion: &str) -> (String, Option<String>) {
    match identificacion.split_once('-') {
        Some((number, dv)) => (number.trim().to_string(), Some(dv.trim().to_string())),
        None => (identificacion.trim().to_string(), None),
    }
}

/// IVA percentage implied by a unit price and its unit tax.
fn implied_tax_rate(precio: Money, iva: Money) -> String {
    if precio.is_zero() || iva.is_zero() {
        return "0.00".to_string();
    }
    // Hundredths of a percent, rounded half up
    let bps = (iva.cents() as i128 * 10_000 + precio.cents() as i128 / 2) / precio.cents() as i128;
    format!("{}.{:02}", bps / 100, bps % 100)
}

fn build_customer(sale: &Sale, customer: Option<&Customer>) -> InvoiceCustomer {
    let kind = customer.map(Customer::kind).unwrap_or(sale.tipo_cliente);
    let is_legal = kind == CustomerKind::Juridico;
    let (identification, explicit_dv) = split_nit(&sale.identificacion_cliente);

    let tipo_documento = match customer.map(|c| &c.detalle) {
        Some(CustomerDetail::Natural { tipo_documento, .. }) => tipo_documento.as_str(),
        _ if is_legal => "NIT",
        _ => "CC",
    };
    let identification_document_id = document_type_id(tipo_documento);

    let dv = if identification_document_id == "6" {
        explicit_dv.or_else(|| nit_check_digit(&identification).map(|d| d.to_string()))
    } else {
        None
    };

    let (company, names) = if is_legal {
        (Some(sale.nombre_cliente.clone()), None)
    } else {
        let names = match customer.map(|c| &c.detalle) {
            Some(CustomerDetail::Natural {
                primer_nombre,
                otros_nombres,
                primer_apellido,
                segundo_apellido,
                ..
            }) => [
                Some(primer_nombre),
                otros_nombres.as_ref(),
                Some(primer_apellido),
                segundo_apellido.as_ref(),
            ]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" "),
            _ => sale.nombre_cliente.clone(),
        };
        (None, Some(names))
    };

    let contact = |snapshot: &Option<String>, live: Option<&Option<String>>| {
        snapshot
            .clone()
            .or_else(|| live.cloned().flatten())
            .unwrap_or_default()
    };

    InvoiceCustomer {
        identification,
        dv,
        company,
        names,
        address: contact(&sale.direccion_cliente, customer.map(|c| &c.direccion)),
        email: contact(&sale.correo_cliente, customer.map(|c| &c.correo)),
        phone: contact(&sale.telefono_cliente, customer.map(|c| &c.telefono)),
        legal_organization_id: if is_legal { "1" } else { "2" }.to_string(),
        tribute_id: if is_legal { "18" } else { "21" }.to_string(),
        identification_document_id: identification_document_id.to_string(),
    }
}

fn build_item(line: &SaleDetail) -> InvoiceItem {
    InvoiceItem {
        code_reference: line
            .codigo_producto
            .clone()
            .unwrap_or_else(|| line.nombre_producto.clone()),
        name: line.nombre_producto.clone(),
        quantity: line.cantidad,
        discount_rate: 0.0,
        price: (line.precio_unitario + line.iva_unitario).to_decimal_string(),
        tax_rate: implied_tax_rate(line.precio_unitario, line.iva_unitario),
        unit_measure_id: UNIT_MEASURE_UNIT,
        standard_code_id: STANDARD_CODE_OWN,
        is_excluded: u8::from(line.iva_unitario.is_zero()),
        tribute_id: ITEM_TRIBUTE_IVA,
        withholding_taxes: Vec::new(),
    }
}

/// Builds the gateway payload for a committed sale.
///
/// `customer` is the live customer record when it still exists; the sale's
/// own snapshot covers everything else.
pub fn build_invoice(sale: &Sale, lines: &[SaleDetail], customer: Option<&Customer>) -> InvoicePayload {
    InvoicePayload {
        document: DOCUMENT_SALES_INVOICE.to_string(),
        reference_code: sale.codigo.clone(),
        observation: format!("Venta {} del {}", sale.codigo, sale.fecha.format("%Y-%m-%d")),
        payment_form: PAYMENT_FORM_CASH.to_string(),
        payment_method_code: PAYMENT_METHOD_CASH.to_string(),
        customer: build_customer(sale, customer),
        items: lines
            .iter()
            .filter(|line| line.cantidad > 0)
            .map(build_item)
            .collect(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn sale(tipo: CustomerKind, identificacion: &str, nombre: &str) -> Sale {
        Sale {
            codigo: "V000000007".into(),
            numero: 7,
            fecha: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            hora: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            subtotal: Money::from_units(3000),
            total: Money::from_units(3570),
            identificacion_cliente: identificacion.into(),
            tipo_cliente: tipo,
            nombre_cliente: nombre.into(),
            direccion_cliente: Some("Calle 10 # 5-20".into()),
            ciudad_cliente: Some("Bogotá".into()),
            telefono_cliente: None,
            correo_cliente: Some("compras@cliente.co".into()),
            nit_vendedor: "900111222".into(),
            nombre_vendedor: "Mostrador".into(),
            direccion_vendedor: String::new(),
            telefono_vendedor: String::new(),
            municipio_vendedor: String::new(),
            responsabilidad_fiscal_vendedor: String::new(),
        }
    }

    fn detail(precio: i64, iva: i64, cantidad: i64) -> SaleDetail {
        SaleDetail {
            id: 1,
            codigo_venta: "V000000007".into(),
            codigo_producto: Some("P001".into()),
            nombre_producto: "Cuaderno".into(),
            cantidad,
            precio_unitario: Money::from_units(precio),
            costo_unitario: Money::from_units(1000),
            iva_unitario: Money::from_units(iva),
            subtotal: Money::from_units(precio * cantidad),
            total: Money::from_units((precio + iva) * cantidad),
        }
    }

    #[test]
    fn test_header_codes() {
        let payload = build_invoice(
            &sale(CustomerKind::Natural, "1020304050", "Ana Gómez"),
            &[detail(1500, 285, 2)],
            None,
        );
        assert_eq!(payload.document, "01");
        assert_eq!(payload.reference_code, "V000000007");
        assert_eq!(payload.payment_form, "1");
        assert_eq!(payload.payment_method_code, "10");
    }

    #[test]
    fn test_item_mapping() {
        let payload = build_invoice(
            &sale(CustomerKind::Natural, "1020304050", "Ana Gómez"),
            &[detail(1500, 285, 2), detail(800, 0, 1), detail(10, 0, 0)],
            None,
        );
        assert_eq!(payload.items.len(), 2);

        let taxed = &payload.items[0];
        assert_eq!(taxed.code_reference, "P001");
        assert_eq!(taxed.quantity, 2);
        assert_eq!(taxed.price, "1785.00");
        assert_eq!(taxed.tax_rate, "19.00");
        assert_eq!(taxed.is_excluded, 0);
        assert_eq!(taxed.unit_measure_id, 70);

        let exempt = &payload.items[1];
        assert_eq!(exempt.tax_rate, "0.00");
        assert_eq!(exempt.is_excluded, 1);
    }

    #[test]
    fn test_natural_customer_block() {
        let customer = Customer {
            identificacion: "1020304050".into(),
            direccion: None,
            ciudad: None,
            telefono: Some("3001234567".into()),
            correo: None,
            detalle: CustomerDetail::Natural {
                primer_nombre: "Ana".into(),
                otros_nombres: Some("María".into()),
                primer_apellido: "Gómez".into(),
                segundo_apellido: None,
                tipo_documento: "CE".into(),
            },
        };
        let payload = build_invoice(
            &sale(CustomerKind::Natural, "1020304050", "Ana Gómez"),
            &[],
            Some(&customer),
        );
        let block = payload.customer;
        assert_eq!(block.names.as_deref(), Some("Ana María Gómez"));
        assert_eq!(block.company, None);
        assert_eq!(block.legal_organization_id, "2");
        assert_eq!(block.tribute_id, "21");
        assert_eq!(block.identification_document_id, "5");
        assert_eq!(block.dv, None);
        // Sale snapshot has no phone, live record fills it
        assert_eq!(block.phone, "3001234567");
        assert_eq!(block.email, "compras@cliente.co");
    }

    #[test]
    fn test_legal_customer_block() {
        let payload = build_invoice(
            &sale(CustomerKind::Juridico, "900373115", "Papelería El Sol S.A.S."),
            &[],
            None,
        );
        let block = payload.customer;
        assert_eq!(block.company.as_deref(), Some("Papelería El Sol S.A.S."));
        assert_eq!(block.names, None);
        assert_eq!(block.legal_organization_id, "1");
        assert_eq!(block.tribute_id, "18");
        assert_eq!(block.identification_document_id, "6");
        assert_eq!(block.dv.as_deref(), Some("3"));
    }

    #[test]
    fn test_explicit_check_digit_is_kept() {
        let payload = build_invoice(
            &sale(CustomerKind::Juridico, "800197268-4", "DIAN"),
            &[],
            None,
        );
        assert_eq!(payload.customer.identification, "800197268");
        assert_eq!(payload.customer.dv.as_deref(), Some("4"));
    }

    #[test]
    fn test_document_type_ids() {
        assert_eq!(document_type_id("cc"), "3");
        assert_eq!(document_type_id("NIT"), "6");
        assert_eq!(document_type_id("PA"), "7");
        assert_eq!(document_type_id("???"), "3");
    }
}
