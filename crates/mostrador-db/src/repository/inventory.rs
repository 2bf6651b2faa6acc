//! # Inventory Repository
//!
//! Stock is derived, never stored: every query here folds
//! `MOVIMIENTO_INVENTARIO` through the flow of its movement type.
//!
//! ## Signed Quantity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MOVIMIENTO_INVENTARIO ⋈ TIPO_MOVIMIENTO_INVENTARIO                    │
//! │                                                                         │
//! │   fecha       tipo      flujo     cantidad   cantidad_con_signo         │
//! │   2024-05-01  Compra    Entrada   10         +10                        │
//! │   2024-05-02  Venta     Salida     3          -3                        │
//! │                                             ─────                       │
//! │   current_stock                                7                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes happen in two places: [`InventoryRepository::post_batch`] for
//! manual movements, and [`insert_movement`] called from the sale
//! transaction.

use chrono::{Local, NaiveDate};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{entity, DbError, DbResult};
use crate::repository::{movement_type, product};
use mostrador_core::validation::validate_movement_quantity;
use mostrador_core::{MovementEntry, MovementFilter, MovementPage, NewMovement, ValidationError};

const SIGNED_QUANTITY: &str =
    "CASE t.flujo WHEN 'Entrada' THEN m.cantidad WHEN 'Salida' THEN -m.cantidad ELSE 0 END";

/// Repository for inventory movement operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Current stock of a product: the signed sum of its movements.
    ///
    /// Returns 0 for a product with no movements (or no such product).
    pub async fn current_stock(&self, codigo_producto: &str) -> DbResult<i64> {
        let sql = format!(
            r#"
            SELECT COALESCE(SUM({SIGNED_QUANTITY}), 0)
            FROM MOVIMIENTO_INVENTARIO m
            LEFT JOIN TIPO_MOVIMIENTO_INVENTARIO t ON t.codigo = m.codigo_tipo_movimiento
            WHERE m.codigo_producto = ?1
            "#
        );

        let stock: i64 = sqlx::query_scalar(&sql)
            .bind(codigo_producto)
            .fetch_one(&self.pool)
            .await?;

        debug!(codigo_producto = %codigo_producto, stock, "Computed stock");
        Ok(stock)
    }

    /// Filtered, paginated movement history, newest first.
    pub async fn history(&self, filter: &MovementFilter) -> DbResult<MovementPage> {
        let page = filter.page();
        debug!(?filter, pagina = page.number, por_pagina = page.size, "Listing movements");

        let mut count = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT COUNT(*)
            FROM MOVIMIENTO_INVENTARIO m
            JOIN TIPO_MOVIMIENTO_INVENTARIO t ON t.codigo = m.codigo_tipo_movimiento
            "#,
        );
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(entry_select());
        push_filters(&mut select, filter);
        select
            .push(" ORDER BY m.fecha DESC, m.id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let movimientos = select
            .build_query_as::<MovementEntry>()
            .fetch_all(&self.pool)
            .await?;

        Ok(MovementPage {
            movimientos,
            total,
            pagina: page.number,
            por_pagina: page.size,
        })
    }

    /// Every movement of one product, newest first.
    pub async fn product_feed(&self, codigo_producto: &str) -> DbResult<Vec<MovementEntry>> {
        let sql = format!(
            "{} WHERE m.codigo_producto = ?1 ORDER BY m.fecha DESC, m.id DESC",
            entry_select()
        );

        let entries = sqlx::query_as::<_, MovementEntry>(&sql)
            .bind(codigo_producto)
            .fetch_all(&self.pool)
            .await?;

        debug!(codigo_producto = %codigo_producto, count = entries.len(), "Product feed");
        Ok(entries)
    }

    /// Posts a batch of manual movements atomically.
    ///
    /// Every entry is checked before it is written: quantity must be a
    /// positive whole number, product and movement type must exist. The
    /// first bad entry aborts the whole batch.
    ///
    /// Returns the number of movements inserted.
    pub async fn post_batch(&self, movimientos: Vec<NewMovement>) -> DbResult<u64> {
        if movimientos.is_empty() {
            return Err(ValidationError::required("movimientos").into());
        }

        let hoy = Local::now().date_naive();
        let mut tx = self.pool.begin().await?;

        for (index, mov) in movimientos.iter().enumerate() {
            let cantidad = validate_movement_quantity(&mov.cantidad)?;

            let codigo_producto = mov.codigo_producto.trim();
            if codigo_producto.is_empty() {
                let field = format!("movimientos[{index}].codigo_producto");
                return Err(ValidationError::required(field).into());
            }
            if product::find_by_code(&mut tx, codigo_producto).await?.is_none() {
                return Err(DbError::not_found(entity::PRODUCTO, codigo_producto));
            }
            if movement_type::find_by_code(&mut tx, mov.codigo_tipo_movimiento)
                .await?
                .is_none()
            {
                return Err(DbError::not_found(
                    entity::TIPO_MOVIMIENTO,
                    mov.codigo_tipo_movimiento.to_string(),
                ));
            }

            insert_movement(
                &mut tx,
                mov.fecha.unwrap_or(hoy),
                cantidad,
                mov.codigo_tipo_movimiento,
                codigo_producto,
                None,
                mov.observacion.as_deref(),
            )
            .await?;
        }

        tx.commit().await?;

        let inserted = movimientos.len() as u64;
        info!(inserted, "Movement batch posted");
        Ok(inserted)
    }
}

fn entry_select() -> String {
    format!(
        r#"
        SELECT m.id, m.fecha, m.cantidad,
               {SIGNED_QUANTITY} AS cantidad_con_signo,
               m.codigo_tipo_movimiento,
               t.nombre AS nombre_tipo_movimiento,
               t.flujo,
               m.codigo_producto,
               p.nombre AS nombre_producto,
               m.codigo_venta,
               m.observacion
        FROM MOVIMIENTO_INVENTARIO m
        JOIN TIPO_MOVIMIENTO_INVENTARIO t ON t.codigo = m.codigo_tipo_movimiento
        LEFT JOIN PRODUCTO p ON p.codigo = m.codigo_producto
        "#
    )
}

/// Appends the optional `WHERE` clauses of a history filter.
fn push_filters<'a>(query: &mut QueryBuilder<'a, Sqlite>, filter: &'a MovementFilter) {
    let mut sep = " WHERE ";

    if let Some(codigo) = filter.codigo_producto.as_deref().filter(|c| !c.is_empty()) {
        query.push(sep).push("m.codigo_producto = ").push_bind(codigo);
        sep = " AND ";
    }
    if let Some(tipo) = filter.codigo_tipo_movimiento {
        query.push(sep).push("m.codigo_tipo_movimiento = ").push_bind(tipo);
        sep = " AND ";
    }
    if let Some(flujo) = filter.flujo {
        query.push(sep).push("t.flujo = ").push_bind(flujo);
        sep = " AND ";
    }
    if let Some(desde) = filter.desde {
        query.push(sep).push("m.fecha >= ").push_bind(desde);
        sep = " AND ";
    }
    if let Some(hasta) = filter.hasta {
        query.push(sep).push("m.fecha <= ").push_bind(hasta);
    }
}

/// Inserts one movement on an existing connection.
pub(crate) async fn insert_movement(
    conn: &mut SqliteConnection,
    fecha: NaiveDate,
    cantidad: i64,
    codigo_tipo_movimiento: i64,
    codigo_producto: &str,
    codigo_venta: Option<&str>,
    observacion: Option<&str>,
) -> DbResult<i64> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO MOVIMIENTO_INVENTARIO
            (fecha, cantidad, codigo_tipo_movimiento, codigo_producto, codigo_venta, observacion)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        RETURNING id
        "#,
    )
    .bind(fecha)
    .bind(cantidad)
    .bind(codigo_tipo_movimiento)
    .bind(codigo_producto)
    .bind(codigo_venta)
    .bind(observacion)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db, product};
    use mostrador_core::{ledger, Flow};
    use serde_json::json;

    fn movement(producto: &str, tipo: i64, cantidad: serde_json::Value, fecha: &str) -> NewMovement {
        serde_json::from_value(json!({
            "fecha": fecha,
            "cantidad": cantidad,
            "codigo_tipo_movimiento": tipo,
            "codigo_producto": producto,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_stock_is_signed_sum() {
        let db = db().await;
        db.products().create(&product("X", "Producto X", 100, 200)).await.unwrap();

        let inserted = db
            .inventory()
            .post_batch(vec![
                movement("X", 1, json!(10), "2024-05-01"),
                movement("X", 4, json!("3"), "2024-05-02"),
            ])
            .await
            .unwrap();
        assert_eq!(inserted, 2);

        assert_eq!(db.inventory().current_stock("X").await.unwrap(), 7);
        assert_eq!(db.inventory().current_stock("nada").await.unwrap(), 0);

        let feed = db.inventory().product_feed("X").await.unwrap();
        assert_eq!(ledger::stock_of("X", &feed), 7);
        assert_eq!(feed[0].cantidad_con_signo, -3);
        assert_eq!(feed[0].flujo, Flow::Salida);
        assert_eq!(feed[1].nombre_producto.as_deref(), Some("Producto X"));
    }

    #[tokio::test]
    async fn test_bad_entry_rolls_back_batch() {
        let db = db().await;
        db.products().create(&product("X", "Producto X", 100, 200)).await.unwrap();

        let err = db
            .inventory()
            .post_batch(vec![
                movement("X", 1, json!(10), "2024-05-01"),
                movement("X", 1, json!(-2), "2024-05-01"),
            ])
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(db.inventory().current_stock("X").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_rejects_unknown_references() {
        let db = db().await;
        db.products().create(&product("X", "Producto X", 100, 200)).await.unwrap();

        let unknown_product = db
            .inventory()
            .post_batch(vec![movement("Y", 1, json!(1), "2024-05-01")])
            .await;
        assert!(matches!(unknown_product, Err(DbError::NotFound { .. })));

        let unknown_type = db
            .inventory()
            .post_batch(vec![movement("X", 99, json!(1), "2024-05-01")])
            .await;
        assert!(matches!(unknown_type, Err(DbError::NotFound { .. })));

        assert!(db.inventory().post_batch(vec![]).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_history_filters_and_pages() {
        let db = db().await;
        db.products().create(&product("X", "Producto X", 100, 200)).await.unwrap();
        db.products().create(&product("Z", "Producto Z", 100, 200)).await.unwrap();

        db.inventory()
            .post_batch(vec![
                movement("X", 1, json!(10), "2024-05-01"),
                movement("X", 4, json!(3), "2024-05-02"),
                movement("Z", 1, json!(5), "2024-05-03"),
            ])
            .await
            .unwrap();

        let all = db.inventory().history(&MovementFilter::default()).await.unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.movimientos[0].codigo_producto, "Z");

        let salidas = db
            .inventory()
            .history(&MovementFilter {
                flujo: Some(Flow::Salida),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(salidas.total, 1);
        assert_eq!(salidas.movimientos[0].cantidad, 3);

        let range = db
            .inventory()
            .history(&MovementFilter {
                codigo_producto: Some("X".into()),
                desde: NaiveDate::from_ymd_opt(2024, 5, 2),
                hasta: NaiveDate::from_ymd_opt(2024, 5, 2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(range.total, 1);

        let second_page = db
            .inventory()
            .history(&MovementFilter {
                pagina: Some(2),
                por_pagina: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(second_page.total, 3);
        assert_eq!(second_page.movimientos.len(), 1);
        assert_eq!(second_page.movimientos[0].fecha, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }
}
