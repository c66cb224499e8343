//! Order placement and query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use clients::{CustomerClient, ProductClient};
use common::{CustomerId, OrderId};
use currency::{RateCache, RateSource};
use domain::Order;
use order_store::OrderStore;
use placement::{OrderLine, PlacementCoordinator, PlacementRequest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S, C, P, R>
where
    S: OrderStore,
    C: CustomerClient,
    P: ProductClient,
    R: RateSource,
{
    pub coordinator: PlacementCoordinator<S, C, P>,
    pub rates: RateCache<R>,
    pub base_currency: String,
}

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_id: String,
    pub items: Vec<OrderLineRequest>,
}

#[derive(Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct TotalQuery {
    pub currency: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub created_at: String,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub fulfillment: String,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Serialize)]
pub struct PlacedOrderResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub customer_name: String,
    pub customer_email: String,
}

#[derive(Serialize)]
pub struct ConvertedTotalResponse {
    pub order_id: String,
    pub base_currency: String,
    pub total_cents: i64,
    pub currency: String,
    pub rate: Decimal,
    pub converted_total: Decimal,
}

fn order_to_response(order: &Order) -> OrderResponse {
    let items = order
        .items()
        .iter()
        .map(|item| OrderItemResponse {
            product_id: item.product_id.to_string(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
        })
        .collect();

    OrderResponse {
        id: order.id().to_string(),
        customer_id: order.customer_id().to_string(),
        created_at: order.created_at().to_rfc3339(),
        items,
        total_cents: order.total().cents(),
        fulfillment: order.fulfillment().as_str().to_string(),
    }
}

// -- Handlers --

/// POST /orders — run the placement workflow for a new order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S, C, P, R>(
    State(state): State<Arc<AppState<S, C, P, R>>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<PlacedOrderResponse>), ApiError>
where
    S: OrderStore + 'static,
    C: CustomerClient + 'static,
    P: ProductClient + 'static,
    R: RateSource + 'static,
{
    let customer_id = parse_customer_id(&req.customer_id)?;
    let lines = req
        .items
        .iter()
        .map(|item| OrderLine::new(item.product_id.as_str(), item.quantity))
        .collect();

    let receipt = state
        .coordinator
        .place_order(PlacementRequest::new(customer_id, lines))
        .await?;

    let response = PlacedOrderResponse {
        order: order_to_response(&receipt.order),
        customer_name: receipt.customer_name,
        customer_email: receipt.customer_email,
    };

    Ok((axum::http::StatusCode::CREATED, Json(response)))
}

/// GET /orders/:id — load a persisted order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S, C, P, R>(
    State(state): State<Arc<AppState<S, C, P, R>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: OrderStore + 'static,
    C: CustomerClient + 'static,
    P: ProductClient + 'static,
    R: RateSource + 'static,
{
    let order_id = parse_order_id(&id)?;
    let order = state
        .coordinator
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    Ok(Json(order_to_response(&order)))
}

/// GET /orders — list persisted orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S, C, P, R>(
    State(state): State<Arc<AppState<S, C, P, R>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError>
where
    S: OrderStore + 'static,
    C: CustomerClient + 'static,
    P: ProductClient + 'static,
    R: RateSource + 'static,
{
    let orders = state.coordinator.list_orders().await?;
    Ok(Json(orders.iter().map(order_to_response).collect()))
}

/// GET /orders/:id/total?currency=XXX — the order total converted to
/// another currency at the cached exchange rate.
#[tracing::instrument(skip(state))]
pub async fn total<S, C, P, R>(
    State(state): State<Arc<AppState<S, C, P, R>>>,
    Path(id): Path<String>,
    Query(query): Query<TotalQuery>,
) -> Result<Json<ConvertedTotalResponse>, ApiError>
where
    S: OrderStore + 'static,
    C: CustomerClient + 'static,
    P: ProductClient + 'static,
    R: RateSource + 'static,
{
    let order_id = parse_order_id(&id)?;
    let order = state
        .coordinator
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    let rate = state
        .rates
        .get_rate(&state.base_currency, &query.currency)
        .await?;

    let total_cents = order.total().cents();
    let converted = (Decimal::new(total_cents, 2) * rate).round_dp(2);

    Ok(Json(ConvertedTotalResponse {
        order_id: order.id().to_string(),
        base_currency: state.base_currency.clone(),
        total_cents,
        currency: query.currency.to_uppercase(),
        rate,
        converted_total: converted,
    }))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}

fn parse_customer_id(id: &str) -> Result<CustomerId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid customer_id: {e}")))?;
    Ok(CustomerId::from_uuid(uuid))
}
