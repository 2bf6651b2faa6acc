//! Product routes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use mostrador_core::{Product, ProductInput};

use crate::error::ApiResult;
use crate::routes::{non_empty, Ack};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/productos", get(list))
        .route("/api/producto", post(create))
        .route("/api/producto/{codigo}", get(fetch).put(update).delete(remove))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    solo_activos: Option<String>,
}

impl ListQuery {
    /// `true`, `1`, `si` and `sí` all count as yes.
    fn solo_activos(self) -> bool {
        non_empty(self.solo_activos)
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "si" | "sí"))
            .unwrap_or(false)
    }
}

async fn list(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Product>>> {
    let Query(query) = query?;
    Ok(Json(state.db.products().list(query.solo_activos()).await?))
}

async fn fetch(
    State(state): State<AppState>,
    Path(codigo): Path<String>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().get(&codigo).await?))
}

async fn create(
    State(state): State<AppState>,
    body: Result<Json<ProductInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let Json(input) = body?;
    let product = input.into_product(None)?;
    let created = state.db.products().create(&product).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update(
    State(state): State<AppState>,
    Path(codigo): Path<String>,
    body: Result<Json<ProductInput>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let Json(input) = body?;
    let product = input.into_product(Some(&codigo))?;
    Ok(Json(state.db.products().update(&product).await?))
}

async fn remove(State(state): State<AppState>, Path(codigo): Path<String>) -> ApiResult<Json<Ack>> {
    state.db.products().delete(&codigo).await?;
    Ok(Json(Ack::ok()))
}
