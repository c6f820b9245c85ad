//! `/cart` handlers. Every route acts on the caller's own cart.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use bazaar_core::Cart;

use crate::auth::RequireAuth;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: Option<String>,
    pub amount: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub cart: Cart,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<&'static str>,
}

impl CartResponse {
    fn new(cart: Cart) -> Self {
        CartResponse { cart, msg: None }
    }
}

pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.get_cart(&caller.user_id).await?;
    let msg = cart.is_empty().then_some("Cart is empty");

    Ok(Json(CartResponse { cart, msg }))
}

pub async fn add_item(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
    payload: Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CartResponse>), ApiError> {
    let Json(request) = payload?;

    let (Some(product_id), Some(amount)) = (request.product_id, request.amount) else {
        return Err(bazaar_core::CoreError::invalid("Please provide productId and amount").into());
    };

    let update = state
        .carts
        .add_or_update_item(&caller.user_id, &product_id, amount)
        .await?;

    let status = if update.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(CartResponse::new(update.cart))))
}

pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
    Path(item_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.remove_item(&caller.user_id, &item_id).await?;

    Ok(Json(CartResponse {
        cart,
        msg: Some("Item removed from cart"),
    }))
}

pub async fn clear_cart(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.clear_cart(&caller.user_id).await?;

    Ok(Json(CartResponse {
        cart,
        msg: Some("Cart cleared successfully"),
    }))
}
