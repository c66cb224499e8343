//! Customer service client.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::CustomerId;
use serde::Deserialize;

use crate::error::ClientError;

/// A customer as reported by the customer service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Customer {
    /// The customer ID.
    pub id: CustomerId,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
}

/// Trait for customer lookups.
#[async_trait]
pub trait CustomerClient: Send + Sync {
    /// Fetches a customer by ID.
    async fn get_customer(&self, id: CustomerId) -> Result<Customer, ClientError>;
}

/// HTTP client for the customer service.
///
/// Carries explicit connect and response timeouts; exceeding either is
/// reported as [`ClientError::Unavailable`], same as any transport failure.
#[derive(Clone)]
pub struct HttpCustomerClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCustomerClient {
    /// Creates a new client for the given base URL (e.g.
    /// `http://customers:8080/api/customers`).
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
impl CustomerClient for HttpCustomerClient {
    async fn get_customer(&self, id: CustomerId) -> Result<Customer, ClientError> {
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
                "customer service returned {status}: {body}"
            )));
        }

        response
            .json::<Customer>()
            .await
            .map_err(|e| ClientError::Unavailable(e.to_string()))
    }
}

#[derive(Debug, Default)]
struct InMemoryCustomerState {
    customers: HashMap<CustomerId, Customer>,
    fail_on_get: bool,
    get_calls: u32,
}

/// In-memory customer client for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerClient {
    state: Arc<RwLock<InMemoryCustomerState>>,
}

impl InMemoryCustomerClient {
    /// Creates a new empty in-memory client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a customer to be returned by lookups.
    pub fn add_customer(&self, customer: Customer) {
        self.state
            .write()
            .unwrap()
            .customers
            .insert(customer.id, customer);
    }

    /// Configures the client to fail lookups with a transport error.
    pub fn set_fail_on_get(&self, fail: bool) {
        self.state.write().unwrap().fail_on_get = fail;
    }

    /// Returns how many lookups were attempted.
    pub fn get_call_count(&self) -> u32 {
        self.state.read().unwrap().get_calls
    }
}

#[async_trait]
impl CustomerClient for InMemoryCustomerClient {
    async fn get_customer(&self, id: CustomerId) -> Result<Customer, ClientError> {
        let mut state = self.state.write().unwrap();
        state.get_calls += 1;

        if state.fail_on_get {
            return Err(ClientError::Unavailable(
                "customer service down".to_string(),
            ));
        }

        state.customers.get(&id).cloned().ok_or(ClientError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> Customer {
        Customer {
            id: CustomerId::new(),
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_lookup_known_customer() {
        let client = InMemoryCustomerClient::new();
        let c = customer();
        client.add_customer(c.clone());

        let found = client.get_customer(c.id).await.unwrap();
        assert_eq!(found, c);
        assert_eq!(client.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_lookup_unknown_customer() {
        let client = InMemoryCustomerClient::new();
        let result = client.get_customer(CustomerId::new()).await;
        assert_eq!(result, Err(ClientError::NotFound));
    }

    #[tokio::test]
    async fn test_fail_on_get() {
        let client = InMemoryCustomerClient::new();
        let c = customer();
        client.add_customer(c.clone());
        client.set_fail_on_get(true);

        let result = client.get_customer(c.id).await;
        assert!(matches!(result, Err(ClientError::Unavailable(_))));
    }

    #[test]
    fn test_customer_wire_format() {
        let id = CustomerId::new();
        let json = format!(
            r#"{{"id":"{id}","name":"Ada Lovelace","email":"ada@example.com"}}"#
        );
        let parsed: Customer = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, id);
        assert_eq!(parsed.name, "Ada Lovelace");
    }
}
