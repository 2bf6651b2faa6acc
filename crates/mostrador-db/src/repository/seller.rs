//! # Seller Repository
//!
//! The store's own fiscal identity. There is at most one row (`id = 1`);
//! sales copy it into their header at creation time.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use mostrador_core::Seller;

/// Repository for the seller singleton.
#[derive(Debug, Clone)]
pub struct SellerRepository {
    pool: SqlitePool,
}

impl SellerRepository {
    /// Creates a new SellerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SellerRepository { pool }
    }

    /// Gets the configured seller, if any.
    pub async fn get(&self) -> DbResult<Option<Seller>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn).await
    }

    /// Creates or replaces the seller row.
    pub async fn upsert(&self, seller: &Seller) -> DbResult<Seller> {
        debug!(nit = %seller.nit, "Saving seller");

        sqlx::query(
            r#"
            INSERT INTO VENDEDOR
                (id, nit, nombre_o_razon_social, direccion, telefono, municipio, responsabilidad_fiscal)
            VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                nit = excluded.nit,
                nombre_o_razon_social = excluded.nombre_o_razon_social,
                direccion = excluded.direccion,
                telefono = excluded.telefono,
                municipio = excluded.municipio,
                responsabilidad_fiscal = excluded.responsabilidad_fiscal
            "#,
        )
        .bind(&seller.nit)
        .bind(&seller.nombre_o_razon_social)
        .bind(&seller.direccion)
        .bind(&seller.telefono)
        .bind(&seller.municipio)
        .bind(&seller.responsabilidad_fiscal)
        .execute(&self.pool)
        .await?;

        info!(nit = %seller.nit, "Seller saved");
        Ok(seller.clone())
    }
}

/// Reads the seller row on an existing connection.
pub(crate) async fn fetch(conn: &mut SqliteConnection) -> DbResult<Option<Seller>> {
    let seller = sqlx::query_as::<_, Seller>(
        r#"
        SELECT nit, nombre_o_razon_social, direccion, telefono, municipio, responsabilidad_fiscal
        FROM VENDEDOR
        WHERE id = 1
        "#,
    )
    .fetch_optional(&mut *conn)
    .await?;

    Ok(seller)
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::db;
    use mostrador_core::Seller;

    fn tienda() -> Seller {
        Seller {
            nit: "900123456".into(),
            nombre_o_razon_social: "Tienda La Esquina".into(),
            direccion: "Calle 10 # 5-20".into(),
            telefono: "6041234567".into(),
            municipio: "Medellín".into(),
            responsabilidad_fiscal: "R-99-PN".into(),
        }
    }

    #[tokio::test]
    async fn test_empty_until_configured() {
        let db = db().await;
        assert!(db.seller().get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_single_row() {
        let db = db().await;
        db.seller().upsert(&tienda()).await.unwrap();

        let mut changed = tienda();
        changed.telefono = "3001112233".into();
        db.seller().upsert(&changed).await.unwrap();

        assert_eq!(db.seller().get().await.unwrap(), Some(changed));
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM VENDEDOR")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }
}
