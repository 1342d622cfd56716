//! Shared fixtures for storefront tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr};

use rust_decimal::Decimal;
use secrecy::SecretString;
use url::Url;

use verdant_core::{Category, Email, Price};
use verdant_storefront::config::{RateLimiting, SentryConfig, StorefrontConfig};
use verdant_storefront::db::{CatalogStore, InMemoryStore, UserStore};
use verdant_storefront::models::{NewUser, Product, ProductInput, User};

/// 64+ byte signing secret for test sessions.
pub const SESSION_SECRET: &str =
    "tT4q9vXz2mLp8sRw6yBn3cKj7hGf5dQa1eUo0iPx-Verdant-Storefront-Test-Key";

pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/verdant_test".to_owned()),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 8000,
        base_url: Url::parse("http://localhost:8000").unwrap(),
        session_secret: SecretString::from(SESSION_SECRET.to_owned()),
        rate_limiting: RateLimiting::Disabled,
        homepage_size: 8,
        sentry: SentryConfig::default(),
    }
}

/// Price from a cent amount.
pub fn price(cents: i64) -> Price {
    Price::new(Decimal::new(cents, 2)).unwrap()
}

pub async fn add_product(
    store: &InMemoryStore,
    name: &str,
    cents: i64,
    category: Category,
) -> Product {
    store
        .create_product(&ProductInput {
            name: name.to_owned(),
            description: format!("{name}, made to last and easy to recycle"),
            price: price(cents),
            category,
            image_url: format!("https://img.example/{}.jpg", name.replace(' ', "-")),
        })
        .await
        .unwrap()
}

/// A user inserted straight into the store. The password hash is a dummy,
/// so this account cannot sign in.
pub async fn add_user(store: &InMemoryStore, email: &str) -> User {
    store
        .create_user(NewUser {
            name: "Shopper".to_owned(),
            email: Email::parse(email).unwrap(),
            category: Category::SaveWater,
            password_hash: "not-a-hash".to_owned(),
        })
        .await
        .unwrap()
}
