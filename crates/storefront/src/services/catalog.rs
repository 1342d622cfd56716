//! Catalog queries and admin product management.
//!
//! Product detail lookups go through a short-lived `moka` cache that admin
//! writes invalidate. Listings are always read from the store.

use std::time::Duration;

use moka::future::Cache;
use rand::Rng;
use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, instrument};

use verdant_core::{Category, PageRequest, Pagination, Price, ProductId};

use crate::db::{RepositoryError, Store};
use crate::models::{Product, ProductFilter, ProductInput, SampleScope};

/// Longest accepted search term, in characters.
pub const MAX_SEARCH_LENGTH: usize = 100;

/// Share of the homepage reserved for the shopper's category, in tenths.
const PREFERRED_SHARE_TENTHS: u32 = 7;

/// Product detail cache keyed by id.
pub type ProductCache = Cache<ProductId, Product>;

/// Build the product detail cache (60 second TTL).
#[must_use]
pub fn product_cache() -> ProductCache {
    Cache::builder()
        .max_capacity(1000)
        .time_to_live(Duration::from_secs(60))
        .build()
}

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),

    #[error("Product not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Raw admin form fields for a product, before validation.
#[derive(Debug, Clone)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub image_url: String,
}

impl ProductForm {
    /// Validate the form into a storable product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` naming the first bad field.
    pub fn validate(self) -> Result<ProductInput, CatalogError> {
        let name = self.name.trim();
        if name.chars().count() < 2 {
            return Err(CatalogError::Validation(
                "name must be at least 2 characters".to_owned(),
            ));
        }

        let description = self.description.trim();
        if description.chars().count() < 10 {
            return Err(CatalogError::Validation(
                "description must be at least 10 characters".to_owned(),
            ));
        }

        let price = Price::new(self.price).map_err(|e| CatalogError::Validation(e.to_string()))?;

        let category = self
            .category
            .parse::<Category>()
            .map_err(|e| CatalogError::Validation(e.to_string()))?;

        let image_url = self.image_url.trim();
        if image_url.is_empty() {
            return Err(CatalogError::Validation("imageUrl is required".to_owned()));
        }

        Ok(ProductInput {
            name: name.to_owned(),
            description: description.to_owned(),
            price,
            category,
            image_url: image_url.to_owned(),
        })
    }
}

/// How many homepage slots go to the shopper's own category.
#[must_use]
pub const fn preferred_count(max: u32) -> u32 {
    max.saturating_mul(PREFERRED_SHARE_TENTHS).div_ceil(10)
}

/// Shuffle each group independently, preferred products first.
pub fn arrange_homepage<R: Rng + ?Sized>(
    mut preferred: Vec<Product>,
    mut others: Vec<Product>,
    rng: &mut R,
) -> Vec<Product> {
    preferred.shuffle(rng);
    others.shuffle(rng);
    preferred.append(&mut others);
    preferred
}

/// Catalog reads and admin writes.
pub struct CatalogService<'a> {
    store: &'a dyn Store,
    cache: &'a ProductCache,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store, cache: &'a ProductCache) -> Self {
        Self { store, cache }
    }

    /// One filtered page of the catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` on storage failure.
    #[instrument(skip(self))]
    pub async fn filter_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<Product>, Pagination), CatalogError> {
        let (products, total) = self.store.filter_products(filter, page).await?;
        Ok((products, page.paginate(total)))
    }

    /// Free-text search over names and descriptions.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for an empty or overlong term.
    #[instrument(skip(self))]
    pub async fn search_products(
        &self,
        term: &str,
        page: PageRequest,
    ) -> Result<(Vec<Product>, Pagination), CatalogError> {
        let term = term.trim();
        let len = term.chars().count();
        if len == 0 || len > MAX_SEARCH_LENGTH {
            return Err(CatalogError::Validation(format!(
                "q must be between 1 and {MAX_SEARCH_LENGTH} characters"
            )));
        }

        let (products, total) = self.store.search_products(term, page).await?;
        Ok((products, page.paginate(total)))
    }

    /// Homepage sample of up to `max` products.
    ///
    /// With a category, about 70% of the slots come from it and the rest
    /// from other categories; a short category leaves more room for others.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` on storage failure.
    #[instrument(skip(self))]
    pub async fn homepage(
        &self,
        category: Option<Category>,
        max: u32,
    ) -> Result<Vec<Product>, CatalogError> {
        let Some(category) = category else {
            let sample = self.store.sample_products(SampleScope::Any, max).await?;
            return Ok(arrange_homepage(sample, Vec::new(), &mut rand::rng()));
        };

        let preferred = self
            .store
            .sample_products(SampleScope::In(category), preferred_count(max))
            .await?;

        let taken = u32::try_from(preferred.len()).unwrap_or(u32::MAX);
        let remaining = max.saturating_sub(taken);
        let others = if remaining > 0 {
            self.store
                .sample_products(SampleScope::NotIn(category), remaining)
                .await?
        } else {
            Vec::new()
        };

        Ok(arrange_homepage(preferred, others, &mut rand::rng()))
    }

    /// Product detail.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        if let Some(product) = self.cache.get(&id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let product = self
            .store
            .get_product(id)
            .await?
            .ok_or(CatalogError::NotFound)?;

        self.cache.insert(id, product.clone()).await;
        Ok(product)
    }

    /// Every product, for the admin table.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` on storage failure.
    pub async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.store.list_products().await?)
    }

    /// Add a product to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for invalid fields.
    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn create_product(&self, form: ProductForm) -> Result<Product, CatalogError> {
        let input = form.validate()?;
        let product = self.store.create_product(&input).await?;
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for invalid fields and
    /// `CatalogError::NotFound` for an unknown id.
    #[instrument(skip(self, form))]
    pub async fn update_product(
        &self,
        id: ProductId,
        form: ProductForm,
    ) -> Result<Product, CatalogError> {
        let input = form.validate()?;
        let product = self
            .store
            .update_product(id, &input)
            .await
            .map_err(map_write_error)?;

        self.cache.invalidate(&id).await;
        Ok(product)
    }

    /// Remove a product that has never been ordered or reviewed.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id and
    /// `CatalogError::Conflict` if orders or reviews reference it.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        self.store
            .delete_product(id)
            .await
            .map_err(map_write_error)?;

        self.cache.invalidate(&id).await;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }
}

fn map_write_error(e: RepositoryError) -> CatalogError {
    match e {
        RepositoryError::NotFound => CatalogError::NotFound,
        RepositoryError::Conflict(msg) => CatalogError::Conflict(msg),
        other => CatalogError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn product(id: i32, category: Category) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: "A reusable everyday essential".to_owned(),
            price: Price::ZERO,
            category,
            image_url: format!("https://img.example/{id}.jpg"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn form() -> ProductForm {
        ProductForm {
            name: "Bamboo Brush".to_owned(),
            description: "Compostable toothbrush handle".to_owned(),
            price: Decimal::new(499, 2),
            category: "Reducing Plastic Use".to_owned(),
            image_url: "https://img.example/brush.jpg".to_owned(),
        }
    }

    #[test]
    fn test_preferred_count_rounds_up() {
        assert_eq!(preferred_count(8), 6);
        assert_eq!(preferred_count(10), 7);
        assert_eq!(preferred_count(1), 1);
        assert_eq!(preferred_count(0), 0);
    }

    #[test]
    fn test_arrange_keeps_preferred_group_first() {
        let preferred: Vec<Product> = (1..=6).map(|i| product(i, Category::SaveWater)).collect();
        let others: Vec<Product> = (7..=8)
            .map(|i| product(i, Category::ReducingPlasticUse))
            .collect();

        let mut rng = StdRng::seed_from_u64(7);
        let arranged = arrange_homepage(preferred, others, &mut rng);

        assert_eq!(arranged.len(), 8);
        assert!(
            arranged[..6]
                .iter()
                .all(|p| p.category == Category::SaveWater)
        );
        assert!(
            arranged[6..]
                .iter()
                .all(|p| p.category == Category::ReducingPlasticUse)
        );

        let mut ids: Vec<i32> = arranged.iter().map(|p| p.id.as_i32()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn test_arrange_is_a_permutation_for_seeded_rng() {
        let all: Vec<Product> = (1..=20).map(|i| product(i, Category::SaveWater)).collect();
        let a = arrange_homepage(all.clone(), Vec::new(), &mut StdRng::seed_from_u64(1));
        let b = arrange_homepage(all.clone(), Vec::new(), &mut StdRng::seed_from_u64(1));

        assert_eq!(a, b);
        assert_ne!(a, all);
    }

    #[test]
    fn test_form_validation() {
        assert!(form().validate().is_ok());

        let short = ProductForm {
            name: "B".to_owned(),
            ..form()
        };
        assert!(matches!(short.validate(), Err(CatalogError::Validation(_))));

        let negative = ProductForm {
            price: Decimal::new(-1, 0),
            ..form()
        };
        assert!(matches!(
            negative.validate(),
            Err(CatalogError::Validation(_))
        ));

        let unknown = ProductForm {
            category: "Gardening".to_owned(),
            ..form()
        };
        assert!(matches!(unknown.validate(), Err(CatalogError::Validation(_))));

        let no_image = ProductForm {
            image_url: " ".to_owned(),
            ..form()
        };
        assert!(matches!(
            no_image.validate(),
            Err(CatalogError::Validation(_))
        ));
    }
}
