//! `/orders` handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use bazaar_core::Order;

use crate::auth::RequireAuth;
use crate::engine::CreateOrderRequest;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order: Order,
    pub client_secret: String,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order: Order,
}

#[derive(Debug, Serialize)]
pub struct OrderList {
    pub orders: Vec<Order>,
    pub count: usize,
}

impl From<Vec<Order>> for OrderList {
    fn from(orders: Vec<Order>) -> Self {
        OrderList {
            count: orders.len(),
            orders,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub payment_intent_id: String,
}

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedOrder>), ApiError> {
    let Json(request) = payload?;
    let order = state.orders.create_order(&caller, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedOrder {
            client_secret: order.client_secret.clone(),
            order,
        }),
    ))
}

pub async fn list_all(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<OrderList>, ApiError> {
    Ok(Json(state.orders.list_all(&caller).await?.into()))
}

pub async fn list_mine(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<OrderList>, ApiError> {
    Ok(Json(state.orders.list_for_user(&caller).await?.into()))
}

pub async fn get_order(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.get_order(&caller, &id).await?;
    Ok(Json(OrderResponse { order }))
}

pub async fn update_order(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<String>,
    payload: Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let Json(request) = payload?;
    let order = state
        .orders
        .update_order(&caller, &id, &request.payment_intent_id)
        .await?;

    Ok(Json(OrderResponse { order }))
}
