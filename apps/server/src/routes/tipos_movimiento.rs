//! Movement type routes.
//!
//! System types (codes 1-4) can be renamed; deleting them or changing
//! their flow answers 400.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use mostrador_core::{MovementType, MovementTypeInput};

use crate::error::ApiResult;
use crate::routes::Ack;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tipos-movimiento", get(list).post(create))
        .route(
            "/api/tipos-movimiento/{codigo}",
            get(fetch).put(update).delete(remove),
        )
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<MovementType>>> {
    Ok(Json(state.db.movement_types().list().await?))
}

async fn fetch(
    State(state): State<AppState>,
    codigo: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MovementType>> {
    let Path(codigo) = codigo?;
    Ok(Json(state.db.movement_types().get(codigo).await?))
}

async fn create(
    State(state): State<AppState>,
    body: Result<Json<MovementTypeInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MovementType>)> {
    let Json(input) = body?;
    let (nombre, flujo) = input.validate()?;
    let created = state.db.movement_types().create(&nombre, flujo).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update(
    State(state): State<AppState>,
    codigo: Result<Path<i64>, PathRejection>,
    body: Result<Json<MovementTypeInput>, JsonRejection>,
) -> ApiResult<Json<MovementType>> {
    let Path(codigo) = codigo?;
    let Json(input) = body?;
    let (nombre, flujo) = input.validate()?;
    Ok(Json(
        state.db.movement_types().update(codigo, &nombre, flujo).await?,
    ))
}

async fn remove(
    State(state): State<AppState>,
    codigo: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Ack>> {
    let Path(codigo) = codigo?;
    state.db.movement_types().delete(codigo).await?;
    Ok(Json(Ack::ok()))
}
