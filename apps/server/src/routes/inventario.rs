//! Inventory routes: movement history, batch posting, stock.
//!
//! Query strings from the front end often carry empty values
//! (`?flujo=&desde=`), so filters are read as text and blank means unset.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use mostrador_core::{Flow, MovementEntry, MovementFilter, MovementPage, NewMovement, ValidationError};

use crate::error::ApiResult;
use crate::routes::{non_empty, parse_param};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/movimientos-inventario", get(history).post(post_batch))
        .route("/api/movimientos-inventario/producto/{codigo}", get(product_feed))
        .route("/api/existencias/{codigo}", get(stock))
}

/// Raw history query; every field optional and possibly blank.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    codigo_producto: Option<String>,
    codigo_tipo_movimiento: Option<String>,
    flujo: Option<String>,
    desde: Option<String>,
    hasta: Option<String>,
    pagina: Option<String>,
    por_pagina: Option<String>,
}

impl TryFrom<HistoryQuery> for MovementFilter {
    type Error = ValidationError;

    fn try_from(q: HistoryQuery) -> Result<Self, Self::Error> {
        Ok(MovementFilter {
            codigo_producto: non_empty(q.codigo_producto),
            codigo_tipo_movimiento: parse_param("codigo_tipo_movimiento", q.codigo_tipo_movimiento)?,
            flujo: parse_param::<Flow>("flujo", q.flujo)?,
            desde: parse_param("desde", q.desde)?,
            hasta: parse_param("hasta", q.hasta)?,
            pagina: parse_param("pagina", q.pagina)?,
            por_pagina: parse_param("por_pagina", q.por_pagina)?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct BatchPosted {
    ok: bool,
    insertados: u64,
}

#[derive(Debug, Serialize)]
pub struct Stock {
    codigo_producto: String,
    existencias: i64,
}

async fn history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<Json<MovementPage>> {
    let Query(query) = query?;
    let filter = MovementFilter::try_from(query)?;
    Ok(Json(state.db.inventory().history(&filter).await?))
}

async fn post_batch(
    State(state): State<AppState>,
    body: Result<Json<Vec<NewMovement>>, JsonRejection>,
) -> ApiResult<Json<BatchPosted>> {
    let Json(movimientos) = body?;
    let insertados = state.db.inventory().post_batch(movimientos).await?;
    Ok(Json(BatchPosted {
        ok: true,
        insertados,
    }))
}

async fn product_feed(
    State(state): State<AppState>,
    Path(codigo): Path<String>,
) -> ApiResult<Json<Vec<MovementEntry>>> {
    Ok(Json(state.db.inventory().product_feed(&codigo).await?))
}

async fn stock(State(state): State<AppState>, Path(codigo): Path<String>) -> ApiResult<Json<Stock>> {
    let existencias = state.db.inventory().current_stock(&codigo).await?;
    Ok(Json(Stock {
        codigo_producto: codigo,
        existencias,
    }))
}
