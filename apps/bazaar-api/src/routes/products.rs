//! `/products` handlers. Reads are public.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use bazaar_core::catalog::{NewProduct, ProductPatch};
use bazaar_core::Product;

use crate::auth::RequireAuth;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product: Product,
}

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<Product>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct RemovedProduct {
    pub msg: &'static str,
    pub product: Product,
}

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<ProductList>, ApiError> {
    let products = state.catalog.list_products().await?;
    Ok(Json(ProductList {
        count: products.len(),
        products,
    }))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.catalog.get_product(&id).await?;
    Ok(Json(ProductResponse { product }))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let Json(input) = payload?;
    let product = state.catalog.create_product(&caller, input).await?;

    Ok((StatusCode::CREATED, Json(ProductResponse { product })))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<String>,
    payload: Result<Json<ProductPatch>, JsonRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let Json(patch) = payload?;
    let product = state.catalog.update_product(&caller, &id, patch).await?;

    Ok(Json(ProductResponse { product }))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<RemovedProduct>, ApiError> {
    let product = state.catalog.delete_product(&caller, &id).await?;

    Ok(Json(RemovedProduct {
        msg: "Success! Product removed.",
        product,
    }))
}
