//! Sale routes.
//!
//! ```text
//! POST   /api/venta                 SaleRequest ─► SaleDraft ─► SaleRepository::create
//! GET    /api/ventas                newest first, paginated
//! GET    /api/venta/{codigo}        header + lines + total_formateado
//! DELETE /api/venta/{codigo}        lines and movements go with it
//! GET    /api/venta/{codigo}/factura  invoice payload (not sent anywhere)
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Local;
use serde::{Deserialize, Serialize};

use mostrador_core::invoice::InvoicePayload;
use mostrador_core::{Page, Sale, SaleCode, SaleDraft, SaleReceipt, SaleRequest};

use crate::error::ApiResult;
use crate::routes::{parse_param, Ack};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/venta", post(create))
        .route("/api/ventas", get(list))
        .route("/api/venta/{codigo}", get(fetch).delete(remove))
        .route("/api/venta/{codigo}/factura", get(invoice))
}

#[derive(Debug, Serialize)]
pub struct CreatedSale {
    ok: bool,
    codigo: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pagina: Option<String>,
    por_pagina: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    body: Result<Json<SaleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedSale>)> {
    let Json(request) = body?;
    let draft = SaleDraft::from_request(request, Local::now().naive_local())?;
    let sale = state.db.sales().create(draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedSale {
            ok: true,
            codigo: sale.codigo,
        }),
    ))
}

async fn list(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Sale>>> {
    let Query(query) = query?;
    let page = Page::new(
        parse_param("pagina", query.pagina)?,
        parse_param("por_pagina", query.por_pagina)?,
    );
    Ok(Json(state.db.sales().list(page).await?))
}

async fn fetch(
    State(state): State<AppState>,
    Path(codigo): Path<String>,
) -> ApiResult<Json<SaleReceipt>> {
    let codigo: SaleCode = codigo.parse()?;
    Ok(Json(state.db.sales().get(codigo.as_str()).await?))
}

async fn remove(State(state): State<AppState>, Path(codigo): Path<String>) -> ApiResult<Json<Ack>> {
    let codigo: SaleCode = codigo.parse()?;
    state.db.sales().delete(codigo.as_str()).await?;
    Ok(Json(Ack::ok()))
}

async fn invoice(
    State(state): State<AppState>,
    Path(codigo): Path<String>,
) -> ApiResult<Json<InvoicePayload>> {
    let codigo: SaleCode = codigo.parse()?;
    Ok(Json(state.db.sales().invoice(codigo.as_str()).await?))
}
