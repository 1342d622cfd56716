//! Integration tests for Verdant.
//!
//! These tests drive a running storefront over HTTP. They are `#[ignore]`d
//! by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database, migrate and seed it
//! cargo run -p verdant-cli -- migrate
//! cargo run -p verdant-cli -- seed products
//!
//! # Start the storefront (rate limiting off so tests are not throttled)
//! STOREFRONT_RATE_LIMIT=off cargo run -p verdant-storefront
//!
//! # Run the ignored tests
//! cargo test -p verdant-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - Storefront under test (default `http://localhost:8000`)

#![allow(clippy::missing_panics_doc)]

use reqwest::{Client, Response};
use serde_json::{Value, json};
use uuid::Uuid;

use verdant_core::Category;

/// Base URL for the storefront API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// A cookie-keeping client bound to one storefront.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: base_url(),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("DELETE request failed")
    }

    /// Register a fresh account; the session cookie stays in the client.
    ///
    /// Returns the generated email address.
    pub async fn sign_up(&self, category: Category) -> String {
        let email = format!("it-{}@example.com", Uuid::new_v4().simple());
        let resp = self
            .post(
                "/auth/sign-up",
                &json!({
                    "name": "Integration Tester",
                    "email": email,
                    "password": "integration-pw",
                    "category": category.as_str(),
                }),
            )
            .await;
        assert!(resp.status().is_success(), "sign-up failed: {}", resp.status());
        email
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a response body as JSON.
pub async fn json_body(resp: Response) -> Value {
    resp.json().await.expect("Response was not JSON")
}
