//! # Sale Repository
//!
//! Creates, reads and deletes sales. Creation and deletion are each a single
//! SQLite transaction.
//!
//! ## Sale Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    SaleRepository::create(draft)                        │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    1. UPDATE SECUENCIA ... RETURNING valor   (takes the write lock)    │
//! │         └─► codigo = V000000042                                         │
//! │    2. fetch customer ──────────────► missing: NotFound, ROLLBACK        │
//! │    3. find sale movement type ─────► missing: ConfigurationMissing      │
//! │    4. resolve each line's product ─► unknown code: NotFound             │
//! │    5. merge stored seller + request overrides                           │
//! │    6. INSERT VENTA (customer + seller snapshot)                         │
//! │    7. INSERT DETALLE_PRODUCTO_VENDIDO per line                          │
//! │    8. INSERT MOVIMIENTO_INVENTARIO per linked line, codigo_venta set    │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Because step 1 is the first statement, two concurrent sales serialize on
//! SQLite's write lock and can never draw the same number. A failed sale
//! rolls the counter back with everything else.
//!
//! ## Sale Deletion
//! Movements are matched by `codigo_venta`, then lines and header go. A
//! deleted sale's number is never handed out again.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{entity, DbError, DbResult};
use crate::repository::{customer, inventory, movement_type, product, seller};
use mostrador_core::invoice::{build_invoice, InvoicePayload};
use mostrador_core::{
    CoreError, Page, Product, Sale, SaleCode, SaleDetail, SaleDraft, SaleLineItem, SaleReceipt,
    SellerSnapshot,
};

/// Repository for sale database operations.
///
/// ## Usage
/// ```rust,ignore
/// let draft = SaleDraft::from_request(request, Local::now().naive_local())?;
/// let sale = db.sales().create(draft).await?;
///
/// let receipt = db.sales().get(&sale.codigo).await?;
/// println!("{}", receipt.total_formateado); // $3.570,00
/// ```
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Writes a sale with its lines and inventory movements atomically.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown customer or product code
    /// - `Domain(SaleMovementTypeMissing)` when no outbound "venta" type exists
    /// - store errors; in every case nothing is written
    pub async fn create(&self, draft: SaleDraft) -> DbResult<Sale> {
        debug!(
            cliente = %draft.identificacion_cliente,
            lineas = draft.lineas.len(),
            total = %draft.totales.total,
            "Creating sale"
        );

        let mut tx = self.pool.begin().await?;

        let numero = next_sale_number(&mut tx).await?;
        let codigo = SaleCode::from_number(numero);

        let cliente = customer::fetch_customer(&mut tx, &draft.identificacion_cliente)
            .await?
            .ok_or_else(|| DbError::not_found(entity::CLIENTE, &draft.identificacion_cliente))?
            .resolve();

        let tipo_venta = movement_type::find_sale_type(&mut tx)
            .await?
            .ok_or(CoreError::SaleMovementTypeMissing)?;

        let mut productos = Vec::with_capacity(draft.lineas.len());
        for linea in &draft.lineas {
            productos.push(resolve_line_product(&mut tx, linea).await?);
        }

        let stored_seller = seller::fetch(&mut tx).await?;
        let vendedor = SellerSnapshot::merge(stored_seller.as_ref(), &draft.vendedor);

        let sale = Sale {
            codigo: codigo.as_str().to_string(),
            numero,
            fecha: draft.fecha,
            hora: draft.hora,
            subtotal: draft.totales.subtotal,
            total: draft.totales.total,
            identificacion_cliente: cliente.identificacion,
            tipo_cliente: cliente.tipo,
            nombre_cliente: cliente.nombre,
            direccion_cliente: cliente.direccion,
            ciudad_cliente: cliente.ciudad,
            telefono_cliente: cliente.telefono,
            correo_cliente: cliente.correo,
            nit_vendedor: vendedor.nit,
            nombre_vendedor: vendedor.nombre,
            direccion_vendedor: vendedor.direccion,
            telefono_vendedor: vendedor.telefono,
            municipio_vendedor: vendedor.municipio,
            responsabilidad_fiscal_vendedor: vendedor.responsabilidad_fiscal,
        };

        insert_header(&mut tx, &sale).await?;

        for (linea, producto) in draft.lineas.iter().zip(&productos) {
            insert_detail(&mut tx, &sale.codigo, linea, producto.as_ref()).await?;
        }

        let observacion = format!("Venta {}", sale.codigo);
        let mut movimientos = 0usize;
        for (linea, producto) in draft.lineas.iter().zip(&productos) {
            match producto {
                Some(p) if linea.cantidad > 0 => {
                    inventory::insert_movement(
                        &mut tx,
                        sale.fecha,
                        linea.cantidad,
                        tipo_venta.codigo,
                        &p.codigo,
                        Some(&sale.codigo),
                        Some(&observacion),
                    )
                    .await?;
                    movimientos += 1;
                }
                Some(_) => {
                    debug!(codigo_venta = %sale.codigo, nombre = %linea.nombre, "Zero quantity line, no movement");
                }
                None => {
                    warn!(
                        codigo_venta = %sale.codigo,
                        nombre = %linea.nombre,
                        "Sale line has no product link; inventory not updated"
                    );
                }
            }
        }

        tx.commit().await?;

        info!(
            codigo = %sale.codigo,
            cliente = %sale.identificacion_cliente,
            total = %sale.total,
            movimientos,
            "Sale committed"
        );
        Ok(sale)
    }

    /// Reads a sale header with its lines.
    pub async fn get(&self, codigo: &str) -> DbResult<SaleReceipt> {
        debug!(codigo = %codigo, "Getting sale");

        let venta = sqlx::query_as::<_, Sale>(
            r#"
            SELECT codigo, numero, fecha, hora, subtotal, total,
                   identificacion_cliente, tipo_cliente, nombre_cliente,
                   direccion_cliente, ciudad_cliente, telefono_cliente, correo_cliente,
                   nit_vendedor, nombre_vendedor, direccion_vendedor, telefono_vendedor,
                   municipio_vendedor, responsabilidad_fiscal_vendedor
            FROM VENTA
            WHERE codigo = ?1
            "#,
        )
        .bind(codigo)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(entity::VENTA, codigo))?;

        let detalles = self.lines(codigo).await?;
        Ok(SaleReceipt::new(venta, detalles))
    }

    /// Lines of a sale in insertion order.
    pub async fn lines(&self, codigo: &str) -> DbResult<Vec<SaleDetail>> {
        let detalles = sqlx::query_as::<_, SaleDetail>(
            r#"
            SELECT id, codigo_venta, codigo_producto, nombre_producto, cantidad,
                   precio_unitario, costo_unitario, iva_unitario, subtotal, total
            FROM DETALLE_PRODUCTO_VENDIDO
            WHERE codigo_venta = ?1
            ORDER BY id
            "#,
        )
        .bind(codigo)
        .fetch_all(&self.pool)
        .await?;

        Ok(detalles)
    }

    /// Lists sale headers, newest first.
    pub async fn list(&self, page: Page) -> DbResult<Vec<Sale>> {
        debug!(pagina = page.number, por_pagina = page.size, "Listing sales");

        let ventas = sqlx::query_as::<_, Sale>(
            r#"
            SELECT codigo, numero, fecha, hora, subtotal, total,
                   identificacion_cliente, tipo_cliente, nombre_cliente,
                   direccion_cliente, ciudad_cliente, telefono_cliente, correo_cliente,
                   nit_vendedor, nombre_vendedor, direccion_vendedor, telefono_vendedor,
                   municipio_vendedor, responsabilidad_fiscal_vendedor
            FROM VENTA
            ORDER BY numero DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(ventas)
    }

    /// Deletes a sale, its lines and the movements it posted.
    pub async fn delete(&self, codigo: &str) -> DbResult<()> {
        debug!(codigo = %codigo, "Deleting sale");

        let mut tx = self.pool.begin().await?;

        let movimientos = sqlx::query("DELETE FROM MOVIMIENTO_INVENTARIO WHERE codigo_venta = ?1")
            .bind(codigo)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let lineas = sqlx::query("DELETE FROM DETALLE_PRODUCTO_VENDIDO WHERE codigo_venta = ?1")
            .bind(codigo)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let header = sqlx::query("DELETE FROM VENTA WHERE codigo = ?1")
            .bind(codigo)
            .execute(&mut *tx)
            .await?;

        if header.rows_affected() == 0 {
            return Err(DbError::not_found(entity::VENTA, codigo));
        }

        tx.commit().await?;

        info!(codigo = %codigo, lineas, movimientos, "Sale deleted");
        Ok(())
    }

    /// Builds the electronic-invoice payload for a committed sale.
    ///
    /// The live customer record fills contact fields the sale snapshot
    /// lacks; a customer deleted since the sale is tolerated.
    pub async fn invoice(&self, codigo: &str) -> DbResult<InvoicePayload> {
        let receipt = self.get(codigo).await?;

        let mut conn = self.pool.acquire().await?;
        let cliente =
            customer::fetch_customer(&mut conn, &receipt.venta.identificacion_cliente).await?;

        Ok(build_invoice(&receipt.venta, &receipt.detalles, cliente.as_ref()))
    }
}

// =============================================================================
// Transaction steps
// =============================================================================

async fn next_sale_number(conn: &mut SqliteConnection) -> DbResult<i64> {
    sqlx::query_scalar("UPDATE SECUENCIA SET valor = valor + 1 WHERE nombre = 'venta' RETURNING valor")
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::Internal("secuencia 'venta' no inicializada".to_string()))
}

/// Product behind a sale line: by code when given, else by exact name.
async fn resolve_line_product(
    conn: &mut SqliteConnection,
    linea: &SaleLineItem,
) -> DbResult<Option<Product>> {
    match linea.codigo_producto.as_deref() {
        Some(codigo) => product::find_by_code(conn, codigo)
            .await?
            .map(Some)
            .ok_or_else(|| DbError::not_found(entity::PRODUCTO, codigo)),
        None => product::find_by_name(conn, &linea.nombre).await,
    }
}

async fn insert_header(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO VENTA (
            codigo, numero, fecha, hora, subtotal, total,
            identificacion_cliente, tipo_cliente, nombre_cliente,
            direccion_cliente, ciudad_cliente, telefono_cliente, correo_cliente,
            nit_vendedor, nombre_vendedor, direccion_vendedor, telefono_vendedor,
            municipio_vendedor, responsabilidad_fiscal_vendedor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
        "#,
    )
    .bind(&sale.codigo)
    .bind(sale.numero)
    .bind(sale.fecha)
    .bind(sale.hora)
    .bind(sale.subtotal)
    .bind(sale.total)
    .bind(&sale.identificacion_cliente)
    .bind(sale.tipo_cliente)
    .bind(&sale.nombre_cliente)
    .bind(&sale.direccion_cliente)
    .bind(&sale.ciudad_cliente)
    .bind(&sale.telefono_cliente)
    .bind(&sale.correo_cliente)
    .bind(&sale.nit_vendedor)
    .bind(&sale.nombre_vendedor)
    .bind(&sale.direccion_vendedor)
    .bind(&sale.telefono_vendedor)
    .bind(&sale.municipio_vendedor)
    .bind(&sale.responsabilidad_fiscal_vendedor)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_detail(
    conn: &mut SqliteConnection,
    codigo_venta: &str,
    linea: &SaleLineItem,
    producto: Option<&Product>,
) -> DbResult<()> {
    let nombre = match producto {
        Some(p) if linea.nombre.is_empty() => p.nombre.as_str(),
        _ => linea.nombre.as_str(),
    };
    let costo = producto.map(|p| p.costo).unwrap_or_default();

    sqlx::query(
        r#"
        INSERT INTO DETALLE_PRODUCTO_VENDIDO (
            codigo_venta, codigo_producto, nombre_producto, cantidad,
            precio_unitario, costo_unitario, iva_unitario, subtotal, total
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(codigo_venta)
    .bind(producto.map(|p| p.codigo.as_str()))
    .bind(nombre)
    .bind(linea.cantidad)
    .bind(linea.precio_unitario)
    .bind(costo)
    .bind(linea.iva_unitario)
    .bind(linea.subtotal)
    .bind(linea.total)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db, natural_customer, p001_draft, product};
    use mostrador_core::{CustomerKind, Money, SaleRequest, Seller};
    use serde_json::json;

    async fn store_with_p001() -> crate::Database {
        let db = db().await;
        db.products().create(&product("P001", "Cuaderno", 1000, 1500)).await.unwrap();
        natural_customer(&db, "1001").await;
        db
    }

    async fn count(db: &crate::Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_p001_sale() {
        let db = store_with_p001().await;

        let sale = db.sales().create(p001_draft("1001")).await.unwrap();
        assert_eq!(sale.codigo, "V000000001");
        assert_eq!(sale.subtotal.to_decimal_string(), "3000.00");
        assert_eq!(sale.total.to_decimal_string(), "3570.00");

        let lines = db.sales().lines(&sale.codigo).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].costo_unitario, Money::from_units(1000));
        assert_eq!(lines[0].codigo_producto.as_deref(), Some("P001"));

        assert_eq!(db.inventory().current_stock("P001").await.unwrap(), -2);
        let feed = db.inventory().product_feed("P001").await.unwrap();
        assert_eq!(feed[0].codigo_venta.as_deref(), Some("V000000001"));
        assert_eq!(feed[0].codigo_tipo_movimiento, 2);
    }

    #[tokio::test]
    async fn test_unknown_customer_writes_nothing() {
        let db = store_with_p001().await;

        let err = db.sales().create(p001_draft("9999")).await.unwrap_err();
        assert_eq!(err.to_string(), "Cliente no encontrado");

        assert_eq!(count(&db, "VENTA").await, 0);
        assert_eq!(count(&db, "DETALLE_PRODUCTO_VENDIDO").await, 0);
        assert_eq!(count(&db, "MOVIMIENTO_INVENTARIO").await, 0);

        // The failed attempt did not consume a number
        let sale = db.sales().create(p001_draft("1001")).await.unwrap();
        assert_eq!(sale.numero, 1);
    }

    #[tokio::test]
    async fn test_unknown_product_code_aborts() {
        let db = store_with_p001().await;
        let request: SaleRequest = serde_json::from_value(json!({
            "identificacion_cliente": "1001",
            "productos": [
                {"codigo_producto": "P001", "nombre": "Cuaderno", "cantidad": 1, "precio_unitario": 1500},
                {"codigo_producto": "P404", "nombre": "Fantasma", "cantidad": 1, "precio_unitario": 10}
            ]
        }))
        .unwrap();
        let draft = SaleDraft::from_request(request, chrono::Local::now().naive_local()).unwrap();

        assert!(matches!(
            db.sales().create(draft).await,
            Err(DbError::NotFound { .. })
        ));
        assert_eq!(count(&db, "VENTA").await, 0);
    }

    #[tokio::test]
    async fn test_name_only_line_links_by_name_or_skips() {
        let db = store_with_p001().await;
        let request: SaleRequest = serde_json::from_value(json!({
            "identificacion_cliente": "1001",
            "productos": [
                {"nombre": "Cuaderno", "cantidad": 1, "precio_unitario": 1500},
                {"nombre": "Servicio de empaque", "cantidad": 1, "precio_unitario": 500}
            ]
        }))
        .unwrap();
        let draft = SaleDraft::from_request(request, chrono::Local::now().naive_local()).unwrap();

        let sale = db.sales().create(draft).await.unwrap();
        let lines = db.sales().lines(&sale.codigo).await.unwrap();
        assert_eq!(lines[0].codigo_producto.as_deref(), Some("P001"));
        assert_eq!(lines[1].codigo_producto, None);
        assert_eq!(lines[1].costo_unitario, Money::zero());
        assert_eq!(count(&db, "MOVIMIENTO_INVENTARIO").await, 1);
    }

    #[tokio::test]
    async fn test_missing_sale_type_is_configuration_error() {
        let db = store_with_p001().await;
        sqlx::query("UPDATE TIPO_MOVIMIENTO_INVENTARIO SET nombre = 'Salida genérica' WHERE codigo = 2")
            .execute(db.pool())
            .await
            .unwrap();

        let err = db.sales().create(p001_draft("1001")).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::SaleMovementTypeMissing)));
        assert_eq!(count(&db, "VENTA").await, 0);
    }

    #[tokio::test]
    async fn test_round_trip_carries_snapshots() {
        let db = store_with_p001().await;
        db.seller()
            .upsert(&Seller {
                nit: "900123456".into(),
                nombre_o_razon_social: "Tienda La Esquina".into(),
                municipio: "Medellín".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let mut draft = p001_draft("1001");
        draft.vendedor.municipio_vendedor = Some("Envigado".into());
        let sale = db.sales().create(draft).await.unwrap();

        let receipt = db.sales().get(&sale.codigo).await.unwrap();
        assert_eq!(receipt.venta.nombre_cliente, "Ana Gómez");
        assert_eq!(receipt.venta.tipo_cliente, CustomerKind::Natural);
        assert_eq!(receipt.total_formateado, "$3.570,00");
        assert_eq!(receipt.venta.nit_vendedor, "900123456");
        assert_eq!(receipt.venta.municipio_vendedor, "Envigado");
        assert_eq!(receipt.venta.fecha.to_string(), "2024-05-10");
        assert_eq!(receipt.detalles.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_lines_and_movements() {
        let db = store_with_p001().await;
        let sale = db.sales().create(p001_draft("1001")).await.unwrap();

        db.sales().delete(&sale.codigo).await.unwrap();

        assert_eq!(count(&db, "DETALLE_PRODUCTO_VENDIDO").await, 0);
        assert_eq!(count(&db, "MOVIMIENTO_INVENTARIO").await, 0);
        assert_eq!(db.inventory().current_stock("P001").await.unwrap(), 0);
        assert!(matches!(
            db.sales().get(&sale.codigo).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            db.sales().delete(&sale.codigo).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_numbers_never_reused() {
        let db = store_with_p001().await;
        let first = db.sales().create(p001_draft("1001")).await.unwrap();
        let second = db.sales().create(p001_draft("1001")).await.unwrap();
        db.sales().delete(&second.codigo).await.unwrap();

        let third = db.sales().create(p001_draft("1001")).await.unwrap();
        assert_eq!(first.codigo, "V000000001");
        assert_eq!(third.codigo, "V000000003");

        let listed = db.sales().list(Page::new(None, None)).await.unwrap();
        let codes: Vec<_> = listed.iter().map(|s| s.codigo.as_str()).collect();
        assert_eq!(codes, vec!["V000000003", "V000000001"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_get_distinct_numbers() {
        use std::collections::HashSet;

        // in-memory stores have a single connection, so use a file
        let dir = tempfile::tempdir().unwrap();
        let config = crate::DbConfig::new(dir.path().join("mostrador.db")).max_connections(5);
        let db = crate::Database::new(config).await.unwrap();
        db.products().create(&product("P001", "Cuaderno", 1000, 1500)).await.unwrap();
        natural_customer(&db, "1001").await;

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let db = db.clone();
                tokio::spawn(async move { db.sales().create(p001_draft("1001")).await })
            })
            .collect();

        let mut codes = HashSet::new();
        for task in tasks {
            let sale = task.await.unwrap().unwrap();
            codes.insert(sale.codigo);
        }

        assert_eq!(codes.len(), 20);
        assert!(codes.contains("V000000001"));
        assert!(codes.contains("V000000020"));
        assert_eq!(count(&db, "VENTA").await, 20);
        assert_eq!(db.inventory().current_stock("P001").await.unwrap(), -40);

        db.close().await;
    }

    #[tokio::test]
    async fn test_invoice_payload() {
        let db = store_with_p001().await;
        let sale = db.sales().create(p001_draft("1001")).await.unwrap();

        let payload = db.sales().invoice(&sale.codigo).await.unwrap();
        assert_eq!(payload.reference_code, "V000000001");
        assert_eq!(payload.items.len(), 1);
        assert_eq!(payload.items[0].price, "1785.00");
    }
}
