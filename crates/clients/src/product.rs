//! Product service client.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::{Money, ProductId};
use serde::Deserialize;

use crate::error::ClientError;

/// A product as reported by the product service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// The product ID (SKU).
    pub id: ProductId,
    /// Current product name.
    pub name: String,
    /// Current unit price.
    pub price: Money,
    /// Units currently in stock.
    pub stock: u32,
}

/// Wire representation of a product.
#[derive(Debug, Deserialize)]
struct ProductDto {
    id: ProductId,
    name: String,
    price_cents: i64,
    stock: u32,
}

impl From<ProductDto> for Product {
    fn from(dto: ProductDto) -> Self {
        Product {
            id: dto.id,
            name: dto.name,
            price: Money::from_cents(dto.price_cents),
            stock: dto.stock,
        }
    }
}

/// Trait for product lookups and stock decrements.
#[async_trait]
pub trait ProductClient: Send + Sync {
    /// Fetches a product by ID.
    async fn get_product(&self, id: &ProductId) -> Result<Product, ClientError>;

    /// Decrements the product's stock on the owning service.
    ///
    /// The product service rejects decrements below zero with
    /// [`ClientError::InsufficientStock`].
    async fn decrement_stock(&self, id: &ProductId, quantity: u32) -> Result<(), ClientError>;
}

/// HTTP client for the product service.
#[derive(Clone)]
pub struct HttpProductClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProductClient {
    /// Creates a new client for the given base URL (e.g.
    /// `http://products:8080/api/products`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProductClient for HttpProductClient {
    async fn get_product(&self, id: &ProductId) -> Result<Product, ClientError> {
        let url = format!("{}/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Unavailable(format!(
                "product service returned {status}: {body}"
            )));
        }

        response
            .json::<ProductDto>()
            .await
            .map(Product::from)
            .map_err(|e| ClientError::Unavailable(e.to_string()))
    }

    async fn decrement_stock(&self, id: &ProductId, quantity: u32) -> Result<(), ClientError> {
        let url = format!("{}/{}/decrement-stock", self.base_url, id);
        let response = self
            .client
            .post(&url)
            .query(&[("quantity", quantity)])
            .send()
            .await
            .map_err(|e| ClientError::Unavailable(e.to_string()))?;

        let status = response.status();
        match status {
            reqwest::StatusCode::NOT_FOUND => Err(ClientError::NotFound),
            reqwest::StatusCode::CONFLICT => {
                let body = response.text().await.unwrap_or_default();
                Err(ClientError::InsufficientStock(body))
            }
            s if s.is_success() => Ok(()),
            s => {
                let body = response.text().await.unwrap_or_default();
                Err(ClientError::Unavailable(format!(
                    "product service returned {s}: {body}"
                )))
            }
        }
    }
}

#[derive(Debug, Default)]
struct InMemoryProductState {
    products: HashMap<ProductId, Product>,
    fail_on_get: bool,
    fail_on_decrement: bool,
    get_calls: u32,
    decrement_calls: u32,
}

/// In-memory product client for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductClient {
    state: Arc<RwLock<InMemoryProductState>>,
}

impl InMemoryProductClient {
    /// Creates a new empty in-memory client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a product in the catalog.
    pub fn add_product(&self, product: Product) {
        self.state
            .write()
            .unwrap()
            .products
            .insert(product.id.clone(), product);
    }

    /// Replaces a product's name and price, leaving stock untouched.
    ///
    /// Used by tests to verify that persisted snapshots do not follow
    /// later catalog changes.
    pub fn update_listing(&self, id: &ProductId, name: impl Into<String>, price: Money) {
        let mut state = self.state.write().unwrap();
        if let Some(product) = state.products.get_mut(id) {
            product.name = name.into();
            product.price = price;
        }
    }

    /// Configures lookups to fail with a transport error.
    pub fn set_fail_on_get(&self, fail: bool) {
        self.state.write().unwrap().fail_on_get = fail;
    }

    /// Configures decrements to fail with a transport error.
    pub fn set_fail_on_decrement(&self, fail: bool) {
        self.state.write().unwrap().fail_on_decrement = fail;
    }

    /// Returns the current stock of a product, if known.
    pub fn stock_of(&self, id: &ProductId) -> Option<u32> {
        self.state.read().unwrap().products.get(id).map(|p| p.stock)
    }

    /// Returns how many lookups were attempted.
    pub fn get_call_count(&self) -> u32 {
        self.state.read().unwrap().get_calls
    }

    /// Returns how many decrements were attempted.
    pub fn decrement_call_count(&self) -> u32 {
        self.state.read().unwrap().decrement_calls
    }
}

#[async_trait]
impl ProductClient for InMemoryProductClient {
    async fn get_product(&self, id: &ProductId) -> Result<Product, ClientError> {
        let mut state = self.state.write().unwrap();
        state.get_calls += 1;

        if state.fail_on_get {
            return Err(ClientError::Unavailable("product service down".to_string()));
        }

        state.products.get(id).cloned().ok_or(ClientError::NotFound)
    }

    async fn decrement_stock(&self, id: &ProductId, quantity: u32) -> Result<(), ClientError> {
        let mut state = self.state.write().unwrap();
        state.decrement_calls += 1;

        if state.fail_on_decrement {
            return Err(ClientError::Unavailable("product service down".to_string()));
        }

        let product = state.products.get_mut(id).ok_or(ClientError::NotFound)?;
        if product.stock < quantity {
            return Err(ClientError::InsufficientStock(format!(
                "product {id}: requested {quantity}, available {}",
                product.stock
            )));
        }
        product.stock -= quantity;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(stock: u32) -> Product {
        Product {
            id: ProductId::new("SKU-001"),
            name: "Widget".to_string(),
            price: Money::from_cents(1000),
            stock,
        }
    }

    #[tokio::test]
    async fn test_get_and_decrement() {
        let client = InMemoryProductClient::new();
        client.add_product(widget(5));
        let id = ProductId::new("SKU-001");

        let product = client.get_product(&id).await.unwrap();
        assert_eq!(product.stock, 5);

        client.decrement_stock(&id, 3).await.unwrap();
        assert_eq!(client.stock_of(&id), Some(2));
    }

    #[tokio::test]
    async fn test_decrement_below_zero_is_rejected() {
        let client = InMemoryProductClient::new();
        client.add_product(widget(5));
        let id = ProductId::new("SKU-001");

        let result = client.decrement_stock(&id, 6).await;
        assert!(matches!(result, Err(ClientError::InsufficientStock(_))));
        // Stock is left untouched on rejection.
        assert_eq!(client.stock_of(&id), Some(5));
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let client = InMemoryProductClient::new();
        let result = client.get_product(&ProductId::new("SKU-404")).await;
        assert_eq!(result, Err(ClientError::NotFound));
    }

    #[tokio::test]
    async fn test_fail_switches() {
        let client = InMemoryProductClient::new();
        client.add_product(widget(5));
        let id = ProductId::new("SKU-001");

        client.set_fail_on_decrement(true);
        let result = client.decrement_stock(&id, 1).await;
        assert!(matches!(result, Err(ClientError::Unavailable(_))));
        assert_eq!(client.stock_of(&id), Some(5));
    }

    #[test]
    fn test_product_wire_format() {
        let json = r#"{"id":"SKU-001","name":"Widget","price_cents":1000,"stock":5}"#;
        let dto: ProductDto = serde_json::from_str(json).unwrap();
        let product = Product::from(dto);
        assert_eq!(product.price, Money::from_cents(1000));
        assert_eq!(product.stock, 5);
    }
}
