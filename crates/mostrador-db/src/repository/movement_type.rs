//! # Movement Type Repository
//!
//! Movement types classify inventory movements as inbound (`Entrada`) or
//! outbound (`Salida`). Codes 1-4 are seeded by the initial migration and
//! flagged `es_sistema`; those rows can be renamed but never deleted or
//! re-flowed. The repository rejects such changes up front with
//! [`CoreError::SystemMovementType`]; triggers in the schema back it up.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{entity, DbError, DbResult};
use mostrador_core::{CoreError, Flow, MovementType};

/// Repository for movement type database operations.
#[derive(Debug, Clone)]
pub struct MovementTypeRepository {
    pool: SqlitePool,
}

impl MovementTypeRepository {
    /// Creates a new MovementTypeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementTypeRepository { pool }
    }

    /// Lists all movement types ordered by code.
    pub async fn list(&self) -> DbResult<Vec<MovementType>> {
        let types = sqlx::query_as::<_, MovementType>(
            "SELECT codigo, nombre, flujo, es_sistema FROM TIPO_MOVIMIENTO_INVENTARIO ORDER BY codigo",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(types)
    }

    /// Gets a movement type by code.
    pub async fn get(&self, codigo: i64) -> DbResult<MovementType> {
        let mut conn = self.pool.acquire().await?;
        find_by_code(&mut conn, codigo)
            .await?
            .ok_or_else(|| DbError::not_found(entity::TIPO_MOVIMIENTO, codigo.to_string()))
    }

    /// Creates a user-defined movement type.
    pub async fn create(&self, nombre: &str, flujo: Flow) -> DbResult<MovementType> {
        debug!(nombre = %nombre, flujo = %flujo, "Creating movement type");

        let codigo: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO TIPO_MOVIMIENTO_INVENTARIO (nombre, flujo, es_sistema)
            VALUES (?1, ?2, 0)
            RETURNING codigo
            "#,
        )
        .bind(nombre)
        .bind(flujo)
        .fetch_one(&self.pool)
        .await?;

        info!(codigo, nombre = %nombre, "Movement type created");
        Ok(MovementType {
            codigo,
            nombre: nombre.to_string(),
            flujo,
            es_sistema: false,
        })
    }

    /// Renames a movement type and/or changes its flow.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown code
    /// - `SystemMovementType` when the flow of a system type would change
    pub async fn update(&self, codigo: i64, nombre: &str, flujo: Flow) -> DbResult<MovementType> {
        let current = self.get(codigo).await?;
        if current.es_sistema && current.flujo != flujo {
            warn!(codigo, "Rejected flow change on system movement type");
            return Err(CoreError::SystemMovementType(codigo).into());
        }

        sqlx::query("UPDATE TIPO_MOVIMIENTO_INVENTARIO SET nombre = ?2, flujo = ?3 WHERE codigo = ?1")
            .bind(codigo)
            .bind(nombre)
            .bind(flujo)
            .execute(&self.pool)
            .await?;

        info!(codigo, nombre = %nombre, "Movement type updated");
        Ok(MovementType {
            codigo,
            nombre: nombre.to_string(),
            flujo,
            es_sistema: current.es_sistema,
        })
    }

    /// Deletes a user-defined movement type.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown code
    /// - `SystemMovementType` for codes seeded by the system
    /// - `ForeignKeyViolation` while movements still use the type
    pub async fn delete(&self, codigo: i64) -> DbResult<()> {
        let current = self.get(codigo).await?;
        if current.es_sistema {
            warn!(codigo, "Rejected delete of system movement type");
            return Err(CoreError::SystemMovementType(codigo).into());
        }

        sqlx::query("DELETE FROM TIPO_MOVIMIENTO_INVENTARIO WHERE codigo = ?1")
            .bind(codigo)
            .execute(&self.pool)
            .await?;

        info!(codigo, "Movement type deleted");
        Ok(())
    }
}

pub(crate) async fn find_by_code(
    conn: &mut SqliteConnection,
    codigo: i64,
) -> DbResult<Option<MovementType>> {
    let found = sqlx::query_as::<_, MovementType>(
        "SELECT codigo, nombre, flujo, es_sistema FROM TIPO_MOVIMIENTO_INVENTARIO WHERE codigo = ?1",
    )
    .bind(codigo)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(found)
}

/// Picks the type used to post sale movements: the lowest-coded outbound
/// type whose name mentions a sale.
pub(crate) async fn find_sale_type(conn: &mut SqliteConnection) -> DbResult<Option<MovementType>> {
    let outbound = sqlx::query_as::<_, MovementType>(
        r#"
        SELECT codigo, nombre, flujo, es_sistema
        FROM TIPO_MOVIMIENTO_INVENTARIO
        WHERE flujo = 'Salida'
        ORDER BY codigo
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(outbound.into_iter().find(MovementType::is_sale_type))
}
