//! Customer routes.
//!
//! | Path | Method | Result |
//! |------|--------|--------|
//! | /api/clientes | GET | resolved customers |
//! | /api/cliente/{id} | GET | full customer |
//! | /api/cliente | POST | create or replace (201) |
//! | /api/cliente/{id} | PUT | create or replace |
//! | /api/cliente/{id} | DELETE | `{ok}` |

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use mostrador_core::{Customer, CustomerInput, ResolvedCustomer};

use crate::error::ApiResult;
use crate::routes::Ack;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/clientes", get(list))
        .route("/api/cliente", post(create))
        .route("/api/cliente/{id}", get(fetch).put(replace).delete(remove))
}

#[derive(Debug, Serialize)]
pub struct SavedCustomer {
    ok: bool,
    identificacion: String,
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<ResolvedCustomer>>> {
    let customers = state.db.customers().list().await?;
    Ok(Json(customers.iter().map(Customer::resolve).collect()))
}

async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Customer>> {
    Ok(Json(state.db.customers().get(&id).await?))
}

async fn create(
    State(state): State<AppState>,
    body: Result<Json<CustomerInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SavedCustomer>)> {
    let Json(input) = body?;
    let customer = input.into_customer(None)?;
    state.db.customers().upsert(&customer).await?;

    Ok((
        StatusCode::CREATED,
        Json(SavedCustomer {
            ok: true,
            identificacion: customer.identificacion,
        }),
    ))
}

async fn replace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<CustomerInput>, JsonRejection>,
) -> ApiResult<Json<SavedCustomer>> {
    let Json(input) = body?;
    let customer = input.into_customer(Some(&id))?;
    state.db.customers().upsert(&customer).await?;

    Ok(Json(SavedCustomer {
        ok: true,
        identificacion: customer.identificacion,
    }))
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Ack>> {
    state.db.customers().delete(&id).await?;
    Ok(Json(Ack::ok()))
}
