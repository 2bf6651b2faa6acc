//! # Customer Repository
//!
//! Customers are stored as a base row in `CLIENTE` plus at most one subtype
//! row in `CLIENTE_NATURAL` or `CLIENTE_JURIDICO`. Reads join all three and
//! fold the result into a single [`CustomerDetail`] value, so nothing above
//! this module ever sees parallel nullable columns.
//!
//! ```text
//! CLIENTE ──┬── CLIENTE_NATURAL   → CustomerDetail::Natural
//!           ├── CLIENTE_JURIDICO  → CustomerDetail::Juridico
//!           └── (neither)         → CustomerDetail::Desconocido
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{entity, DbError, DbResult};
use mostrador_core::{Customer, CustomerDetail, ResolvedCustomer};

/// Flat row from the three-way join.
#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    identificacion: String,
    direccion: Option<String>,
    ciudad: Option<String>,
    telefono: Option<String>,
    correo: Option<String>,
    es_natural: bool,
    primer_nombre: Option<String>,
    otros_nombres: Option<String>,
    primer_apellido: Option<String>,
    segundo_apellido: Option<String>,
    tipo_documento: Option<String>,
    es_juridico: bool,
    razon_social: Option<String>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        let detalle = if row.es_natural {
            CustomerDetail::Natural {
                primer_nombre: row.primer_nombre.unwrap_or_default(),
                otros_nombres: row.otros_nombres,
                primer_apellido: row.primer_apellido.unwrap_or_default(),
                segundo_apellido: row.segundo_apellido,
                tipo_documento: row.tipo_documento.unwrap_or_else(|| "CC".to_string()),
            }
        } else if row.es_juridico {
            CustomerDetail::Juridico {
                razon_social: row.razon_social.unwrap_or_default(),
            }
        } else {
            CustomerDetail::Desconocido
        };

        Customer {
            identificacion: row.identificacion,
            direccion: row.direccion,
            ciudad: row.ciudad,
            telefono: row.telefono,
            correo: row.correo,
            detalle,
        }
    }
}

const SELECT_CUSTOMER: &str = r#"
    SELECT c.identificacion, c.direccion, c.ciudad, c.telefono, c.correo,
           n.identificacion IS NOT NULL AS es_natural,
           n.primer_nombre, n.otros_nombres, n.primer_apellido, n.segundo_apellido,
           n.tipo_documento,
           j.identificacion IS NOT NULL AS es_juridico,
           j.razon_social
    FROM CLIENTE c
    LEFT JOIN CLIENTE_NATURAL n ON n.identificacion = c.identificacion
    LEFT JOIN CLIENTE_JURIDICO j ON j.identificacion = c.identificacion
"#;

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Lists all customers ordered by identification.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let sql = format!("{SELECT_CUSTOMER} ORDER BY c.identificacion");
        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Customers listed");
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    /// Gets the full customer record.
    pub async fn get(&self, identificacion: &str) -> DbResult<Customer> {
        debug!(identificacion = %identificacion, "Getting customer");

        let mut conn = self.pool.acquire().await?;
        fetch_customer(&mut conn, identificacion)
            .await?
            .ok_or_else(|| DbError::not_found(entity::CLIENTE, identificacion))
    }

    /// Gets the merged view: subtype tag, display name and contact fields.
    pub async fn resolve(&self, identificacion: &str) -> DbResult<ResolvedCustomer> {
        Ok(self.get(identificacion).await?.resolve())
    }

    /// Creates or replaces a customer.
    ///
    /// The base row is upserted, the detail row of the other subtype is
    /// removed, and the detail row of this subtype is upserted. All in one
    /// transaction, so a customer never ends up with two subtypes.
    ///
    /// Returns `true` when the customer did not exist before.
    pub async fn upsert(&self, customer: &Customer) -> DbResult<bool> {
        let id = customer.identificacion.as_str();
        debug!(identificacion = %id, tipo = %customer.kind().as_str(), "Upserting customer");

        let mut tx = self.pool.begin().await?;

        let existed: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM CLIENTE WHERE identificacion = ?1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query(
            r#"
            INSERT INTO CLIENTE (identificacion, direccion, ciudad, telefono, correo)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(identificacion) DO UPDATE SET
                direccion = excluded.direccion,
                ciudad = excluded.ciudad,
                telefono = excluded.telefono,
                correo = excluded.correo
            "#,
        )
        .bind(id)
        .bind(&customer.direccion)
        .bind(&customer.ciudad)
        .bind(&customer.telefono)
        .bind(&customer.correo)
        .execute(&mut *tx)
        .await?;

        match &customer.detalle {
            CustomerDetail::Natural {
                primer_nombre,
                otros_nombres,
                primer_apellido,
                segundo_apellido,
                tipo_documento,
            } => {
                sqlx::query("DELETE FROM CLIENTE_JURIDICO WHERE identificacion = ?1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;

                sqlx::query(
                    r#"
                    INSERT INTO CLIENTE_NATURAL
                        (identificacion, primer_nombre, otros_nombres, primer_apellido,
                         segundo_apellido, tipo_documento)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ON CONFLICT(identificacion) DO UPDATE SET
                        primer_nombre = excluded.primer_nombre,
                        otros_nombres = excluded.otros_nombres,
                        primer_apellido = excluded.primer_apellido,
                        segundo_apellido = excluded.segundo_apellido,
                        tipo_documento = excluded.tipo_documento
                    "#,
                )
                .bind(id)
                .bind(primer_nombre)
                .bind(otros_nombres)
                .bind(primer_apellido)
                .bind(segundo_apellido)
                .bind(tipo_documento)
                .execute(&mut *tx)
                .await?;
            }
            CustomerDetail::Juridico { razon_social } => {
                sqlx::query("DELETE FROM CLIENTE_NATURAL WHERE identificacion = ?1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;

                sqlx::query(
                    r#"
                    INSERT INTO CLIENTE_JURIDICO (identificacion, razon_social)
                    VALUES (?1, ?2)
                    ON CONFLICT(identificacion) DO UPDATE SET
                        razon_social = excluded.razon_social
                    "#,
                )
                .bind(id)
                .bind(razon_social)
                .execute(&mut *tx)
                .await?;
            }
            CustomerDetail::Desconocido => {
                delete_details(&mut tx, id).await?;
            }
        }

        tx.commit().await?;

        info!(identificacion = %id, created = !existed, "Customer saved");
        Ok(!existed)
    }

    /// Deletes a customer and its detail rows.
    ///
    /// Sales keep their frozen customer snapshot, so past receipts still
    /// render after the customer is gone.
    pub async fn delete(&self, identificacion: &str) -> DbResult<()> {
        debug!(identificacion = %identificacion, "Deleting customer");

        let mut tx = self.pool.begin().await?;
        delete_details(&mut tx, identificacion).await?;

        let result = sqlx::query("DELETE FROM CLIENTE WHERE identificacion = ?1")
            .bind(identificacion)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(entity::CLIENTE, identificacion));
        }

        tx.commit().await?;
        info!(identificacion = %identificacion, "Customer deleted");
        Ok(())
    }
}

async fn delete_details(conn: &mut SqliteConnection, identificacion: &str) -> DbResult<()> {
    sqlx::query("DELETE FROM CLIENTE_NATURAL WHERE identificacion = ?1")
        .bind(identificacion)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM CLIENTE_JURIDICO WHERE identificacion = ?1")
        .bind(identificacion)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Loads a customer on an existing connection (used by the sale transaction).
pub(crate) async fn fetch_customer(
    conn: &mut SqliteConnection,
    identificacion: &str,
) -> DbResult<Option<Customer>> {
    let sql = format!("{SELECT_CUSTOMER} WHERE c.identificacion = ?1");
    let row = sqlx::query_as::<_, CustomerRow>(&sql)
        .bind(identificacion)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(Customer::from))
}
