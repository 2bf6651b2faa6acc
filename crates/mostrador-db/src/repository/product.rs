//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - CRUD by business code
//! - Products with inventory movements cannot be deleted, only deactivated
//! - Lookups used inside the sale transaction (by code, by exact name)
//!
//! ## Lookup Order for Sale Lines
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line.codigo_producto present?                                         │
//! │       │                                                                 │
//! │       ├── yes ─► find_by_code ─► found ───────────► link + cost        │
//! │       │                     └─► missing ──────────► NotFound (abort)   │
//! │       │                                                                 │
//! │       └── no ──► find_by_name (exact) ─► found ───► link + cost        │
//! │                                      └─► missing ─► cost 0, no link    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{entity, DbError, DbResult};
use mostrador_core::{CoreError, Product};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.get("P001").await?;
/// let active = repo.list(true).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products ordered by name.
    ///
    /// ## Arguments
    /// * `solo_activos` - Only products with `estado = 'activo'`
    pub async fn list(&self, solo_activos: bool) -> DbResult<Vec<Product>> {
        debug!(solo_activos, "Listing products");

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT codigo, nombre, costo, precio, descripcion, estado, tasa_iva
            FROM PRODUCTO
            WHERE (?1 = 0 OR estado = 'activo')
            ORDER BY nombre, codigo
            "#,
        )
        .bind(solo_activos)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Products listed");
        Ok(products)
    }

    /// Gets a product by code.
    ///
    /// ## Errors
    /// `NotFound` when no product has that code.
    pub async fn get(&self, codigo: &str) -> DbResult<Product> {
        debug!(codigo = %codigo, "Getting product");

        let mut conn = self.pool.acquire().await?;
        find_by_code(&mut conn, codigo)
            .await?
            .ok_or_else(|| DbError::not_found(entity::PRODUCTO, codigo))
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// `UniqueViolation` when the code is taken.
    pub async fn create(&self, product: &Product) -> DbResult<Product> {
        debug!(codigo = %product.codigo, "Creating product");

        let mut conn = self.pool.acquire().await?;
        if find_by_code(&mut conn, &product.codigo).await?.is_some() {
            return Err(DbError::duplicate("codigo", &product.codigo));
        }

        sqlx::query(
            r#"
            INSERT INTO PRODUCTO (codigo, nombre, costo, precio, descripcion, estado, tasa_iva)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.codigo)
        .bind(&product.nombre)
        .bind(product.costo)
        .bind(product.precio)
        .bind(&product.descripcion)
        .bind(product.estado)
        .bind(product.tasa_iva)
        .execute(&mut *conn)
        .await?;

        info!(codigo = %product.codigo, "Product created");
        Ok(product.clone())
    }

    /// Updates a product in place.
    ///
    /// ## Errors
    /// `NotFound` when no product has that code.
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        debug!(codigo = %product.codigo, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE PRODUCTO
            SET nombre = ?2, costo = ?3, precio = ?4, descripcion = ?5, estado = ?6, tasa_iva = ?7
            WHERE codigo = ?1
            "#,
        )
        .bind(&product.codigo)
        .bind(&product.nombre)
        .bind(product.costo)
        .bind(product.precio)
        .bind(&product.descripcion)
        .bind(product.estado)
        .bind(product.tasa_iva)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(entity::PRODUCTO, &product.codigo));
        }

        info!(codigo = %product.codigo, "Product updated");
        Ok(product.clone())
    }

    /// Deletes a product by code.
    ///
    /// Sale lines keep their own copy of the product name, so deleting a
    /// sold product only unlinks those lines. Stock movements do not: the
    /// product must stay for the ledger to add up.
    ///
    /// ## Errors
    /// - `NotFound` when no product has that code
    /// - `Domain(ProductHasMovements)` when inventory movements reference it
    pub async fn delete(&self, codigo: &str) -> DbResult<()> {
        debug!(codigo = %codigo, "Deleting product");

        let mut tx = self.pool.begin().await?;

        let movimientos: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM MOVIMIENTO_INVENTARIO WHERE codigo_producto = ?1",
        )
        .bind(codigo)
        .fetch_one(&mut *tx)
        .await?;

        if movimientos > 0 {
            debug!(codigo = %codigo, movimientos, "Product has inventory history");
            return Err(CoreError::ProductHasMovements(codigo.to_string()).into());
        }

        let result = sqlx::query("DELETE FROM PRODUCTO WHERE codigo = ?1")
            .bind(codigo)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(entity::PRODUCTO, codigo));
        }

        tx.commit().await?;
        info!(codigo = %codigo, "Product deleted");
        Ok(())
    }
}

// =============================================================================
// Connection-level helpers (usable inside a transaction)
// =============================================================================

/// Looks up a product by its code.
pub(crate) async fn find_by_code(
    conn: &mut SqliteConnection,
    codigo: &str,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT codigo, nombre, costo, precio, descripcion, estado, tasa_iva
        FROM PRODUCTO
        WHERE codigo = ?1
        "#,
    )
    .bind(codigo)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

/// Looks up a product by exact name, for sale lines that carry no code.
///
/// When several products share the name, the lowest code wins.
pub(crate) async fn find_by_name(
    conn: &mut SqliteConnection,
    nombre: &str,
) -> DbResult<Option<Product>> {
    if nombre.is_empty() {
        return Ok(None);
    }

    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT codigo, nombre, costo, precio, descripcion, estado, tasa_iva
        FROM PRODUCTO
        WHERE nombre = ?1
        ORDER BY codigo
        LIMIT 1
        "#,
    )
    .bind(nombre)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db, product};
    use mostrador_core::{Money, ProductStatus, TaxRate};

    #[tokio::test]
    async fn test_create_and_get() {
        let db = db().await;
        db.products().create(&product("P001", "Cuaderno", 1000, 1500)).await.unwrap();

        let fetched = db.products().get("P001").await.unwrap();
        assert_eq!(fetched.nombre, "Cuaderno");
        assert_eq!(fetched.costo, Money::from_units(1000));
        assert_eq!(fetched.precio, Money::from_units(1500));
        assert_eq!(fetched.tasa_iva, TaxRate::DEFAULT_IVA);
        assert_eq!(fetched.estado, ProductStatus::Activo);
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = db().await;
        let p = product("P001", "Cuaderno", 1000, 1500);
        db.products().create(&p).await.unwrap();

        let err = db.products().create(&p).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_and_missing() {
        let db = db().await;
        let mut p = product("P001", "Cuaderno", 1000, 1500);
        db.products().create(&p).await.unwrap();

        p.precio = Money::from_units(1800);
        p.estado = ProductStatus::Inactivo;
        db.products().update(&p).await.unwrap();
        let fetched = db.products().get("P001").await.unwrap();
        assert_eq!(fetched.precio, Money::from_units(1800));

        let ghost = product("P404", "Nada", 1, 1);
        assert!(matches!(
            db.products().update(&ghost).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_only_active() {
        let db = db().await;
        let mut inactive = product("P002", "Borrador", 100, 200);
        inactive.estado = ProductStatus::Inactivo;
        db.products().create(&product("P001", "Cuaderno", 1000, 1500)).await.unwrap();
        db.products().create(&inactive).await.unwrap();

        assert_eq!(db.products().list(false).await.unwrap().len(), 2);
        let active = db.products().list(true).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].codigo, "P001");
    }

    #[tokio::test]
    async fn test_delete() {
        let db = db().await;
        db.products().create(&product("P001", "Cuaderno", 1000, 1500)).await.unwrap();

        db.products().delete("P001").await.unwrap();
        assert!(matches!(
            db.products().delete("P001").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_refused_once_stock_moved() {
        use crate::repository::test_support::{natural_customer, p001_draft};

        let db = db().await;
        db.products().create(&product("P001", "Cuaderno", 1000, 1500)).await.unwrap();
        natural_customer(&db, "1001").await;
        db.sales().create(p001_draft("1001")).await.unwrap();

        let err = db.products().delete("P001").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::ProductHasMovements(ref codigo)) if codigo == "P001"
        ));
        assert!(err.is_validation());
        assert!(db.products().get("P001").await.is_ok());

        // deactivating is the way out
        let mut p = db.products().get("P001").await.unwrap();
        p.estado = ProductStatus::Inactivo;
        db.products().update(&p).await.unwrap();
        assert!(db.products().list(true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_name_is_exact() {
        let db = db().await;
        db.products().create(&product("P001", "Cuaderno", 1000, 1500)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(find_by_name(&mut conn, "Cuaderno").await.unwrap().is_some());
        assert!(find_by_name(&mut conn, "cuaderno").await.unwrap().is_none());
        assert!(find_by_name(&mut conn, "").await.unwrap().is_none());
    }
}
