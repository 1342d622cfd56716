//! Seed the catalog from a YAML file.
//!
//! The whole file is validated before anything is written. Products whose
//! name is already in the catalog are skipped, so seeding is repeatable.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use verdant_storefront::db::{self, CatalogStore, PgStore, RepositoryError};
use verdant_storefront::models::ProductInput;
use verdant_storefront::services::ProductForm;

use super::{MissingDatabaseUrl, database_url};

/// One product entry in the seed file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SeedProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub image_url: String,
}

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingDatabaseUrl),

    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Entry {index} ({name}): {message}")]
    Invalid {
        index: usize,
        name: String,
        message: String,
    },

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// What a seeding run did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Parse and validate a seed file's contents.
///
/// # Errors
///
/// Returns `SeedError::Yaml` for malformed YAML and `SeedError::Invalid`
/// for the first entry that fails product validation.
pub fn parse_catalog(content: &str) -> Result<Vec<ProductInput>, SeedError> {
    let entries: Vec<SeedProduct> = serde_yaml::from_str(content)?;

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let name = entry.name.clone();
            ProductForm {
                name: entry.name,
                description: entry.description,
                price: entry.price,
                category: entry.category,
                image_url: entry.image_url,
            }
            .validate()
            .map_err(|e| SeedError::Invalid {
                index,
                name,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Seed products from `file`.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, or a database
/// write fails. Entries written before a failure stay written.
pub async fn products(file: &Path) -> Result<SeedSummary, SeedError> {
    let content = tokio::fs::read_to_string(file)
        .await
        .map_err(|source| SeedError::Io {
            path: file.display().to_string(),
            source,
        })?;

    let catalog = parse_catalog(&content)?;
    info!(path = %file.display(), products = catalog.len(), "Parsed seed file");

    let database_url = database_url()?;
    let store = PgStore::new(db::create_pool(&database_url).await?);
    info!("Connected to database");

    let mut existing: HashSet<String> = store
        .list_products()
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();

    let mut summary = SeedSummary::default();
    for product in catalog {
        if !existing.insert(product.name.clone()) {
            summary.skipped += 1;
            continue;
        }
        store.create_product(&product).await?;
        summary.inserted += 1;
    }

    info!(
        inserted = summary.inserted,
        skipped = summary.skipped,
        "Seeding complete!"
    );
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use verdant_core::Category;

    use super::*;

    const BUNDLED: &str = include_str!("../../seed/products.yaml");

    #[test]
    fn test_bundled_catalog_is_valid() {
        let catalog = parse_catalog(BUNDLED).unwrap();
        assert_eq!(catalog.len(), 26);

        for category in Category::ALL {
            assert!(
                catalog.iter().filter(|p| p.category == category).count() >= 5,
                "{category:?} is under-stocked"
            );
        }
    }

    #[test]
    fn test_invalid_entry_is_reported_with_its_index() {
        let yaml = r#"
- name: "Good Product"
  description: "Long enough description"
  price: "4.50"
  category: "Save Water"
  imageUrl: "/uploads/good.jpg"
- name: "Bad Product"
  description: "Long enough description"
  price: "-1"
  category: "Save Water"
  imageUrl: "/uploads/bad.jpg"
"#;
        let err = parse_catalog(yaml).unwrap_err();
        assert!(matches!(err, SeedError::Invalid { index: 1, .. }));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let yaml = r#"
- name: "Typo"
  description: "Long enough description"
  price: "4.50"
  category: "Save Water"
  image_url: "/uploads/typo.jpg"
"#;
        assert!(matches!(parse_catalog(yaml), Err(SeedError::Yaml(_))));
    }
}
