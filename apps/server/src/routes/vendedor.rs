//! Seller routes: the single fiscal identity of the store.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use mostrador_core::Seller;
use mostrador_db::error::entity;
use mostrador_db::DbError;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/vendedor", get(fetch).post(save).put(save))
}

async fn fetch(State(state): State<AppState>) -> ApiResult<Json<Seller>> {
    let seller = state
        .db
        .seller()
        .get()
        .await?
        .ok_or_else(|| DbError::not_found(entity::VENDEDOR, "1"))?;
    Ok(Json(seller))
}

async fn save(
    State(state): State<AppState>,
    body: Result<Json<Seller>, JsonRejection>,
) -> ApiResult<Json<Seller>> {
    let Json(seller) = body?;
    Ok(Json(state.db.seller().upsert(&seller).await?))
}
