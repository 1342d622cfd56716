//! Catalog route handlers.
//!
//! Homepage sampling, the filtered product browser, free-text search and
//! product detail. All of these are public.

use std::str::FromStr;

use axum::{
    Json,
    extract::rejection::{PathRejection, QueryRejection},
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use verdant_core::{
    Category, CategoryFilter, PageRequest, Price, PriceRange, ProductId, ProductSort,
};

use crate::error::{AppError, Result};
use crate::models::ProductFilter;
use crate::services::CatalogService;
use crate::state::AppState;

/// Default page size for the product browser.
const FILTER_PAGE_SIZE: u32 = 9;

/// Default page size for search results.
const SEARCH_PAGE_SIZE: u32 = 10;

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for the homepage sample.
#[derive(Debug, Default, Deserialize)]
pub struct HomepageQuery {
    pub category: Option<String>,
}

/// Query parameters for the product browser.
///
/// Bracketed names match what the shop frontend sends, e.g.
/// `?category[name]=Save%20Water&category[selected]=true&price[0]=5`.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    #[serde(rename = "category[name]")]
    pub category_name: Option<String>,
    #[serde(rename = "category[selected]")]
    pub category_selected: Option<bool>,
    #[serde(rename = "price[0]")]
    pub min_price: Option<String>,
    #[serde(rename = "price[1]")]
    pub max_price: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
}

/// Query parameters for search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
}

impl FilterQuery {
    /// Turn raw query parameters into typed listing options.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for an unknown category or sort, an
    /// unparseable or negative price, inverted bounds, or bad paging.
    pub fn parse(&self) -> Result<(ProductFilter, PageRequest)> {
        let category = CategoryFilter::parse(self.category_name.as_deref(), self.category_selected)
            .map_err(bad_request)?;

        let price = PriceRange::new(
            parse_price(self.min_price.as_deref())?,
            parse_price(self.max_price.as_deref())?,
        )
        .map_err(bad_request)?;

        let sort = self
            .sort
            .as_deref()
            .map(ProductSort::from_str)
            .transpose()
            .map_err(bad_request)?
            .unwrap_or_default();

        let page = page_request(self.page, self.page_size, FILTER_PAGE_SIZE)?;

        Ok((
            ProductFilter {
                category,
                price,
                sort,
            },
            page,
        ))
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Homepage sample, weighted towards `?category=` when given.
#[instrument(skip(state, query))]
pub async fn homepage(
    State(state): State<AppState>,
    query: std::result::Result<Query<HomepageQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query?;
    let category = match query.category.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(name) => Some(name.parse::<Category>().map_err(bad_request)?),
    };

    let products = CatalogService::new(state.store(), state.product_cache())
        .homepage(category, state.config().homepage_size)
        .await?;

    Ok(Json(json!({ "success": true, "products": products })))
}

/// Filtered, sorted and paginated product listing.
#[instrument(skip(state, query))]
pub async fn filter(
    State(state): State<AppState>,
    query: std::result::Result<Query<FilterQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query?;
    let (filter, page) = query.parse()?;

    let (products, pagination) = CatalogService::new(state.store(), state.product_cache())
        .filter_products(&filter, page)
        .await?;

    Ok(Json(json!({ "products": products, "pagination": pagination })))
}

/// Case-insensitive search over product names and descriptions.
#[instrument(skip(state, query))]
pub async fn search(
    State(state): State<AppState>,
    query: std::result::Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query?;
    let page = page_request(query.page, query.page_size, SEARCH_PAGE_SIZE)?;

    let (products, pagination) = CatalogService::new(state.store(), state.product_cache())
        .search_products(&query.q, page)
        .await?;

    Ok(Json(json!({ "products": products, "pagination": pagination })))
}

/// Product detail.
#[instrument(skip(state, id))]
pub async fn show(
    State(state): State<AppState>,
    id: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Value>> {
    let Path(id) = id?;

    let product = CatalogService::new(state.store(), state.product_cache())
        .get_product(id)
        .await?;

    Ok(Json(json!({ "success": true, "product": product })))
}

// =============================================================================
// Helpers
// =============================================================================

fn bad_request(e: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(e.to_string())
}

/// Parse an optional price bound. Blank means unbounded.
fn parse_price(raw: Option<&str>) -> Result<Option<Price>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let amount = Decimal::from_str(raw)
        .map_err(|_| AppError::BadRequest(format!("invalid price: {raw}")))?;
    Price::new(amount).map(Some).map_err(bad_request)
}

/// Build a page request from optional query values.
pub(crate) fn page_request(
    page: Option<u32>,
    page_size: Option<u32>,
    default_size: u32,
) -> Result<PageRequest> {
    PageRequest::new(page.unwrap_or(1), page_size.unwrap_or(default_size)).map_err(bad_request)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(pairs: &str) -> FilterQuery {
        Query::<FilterQuery>::try_from_uri(&format!("/filters?{pairs}").parse().unwrap())
            .unwrap()
            .0
    }

    #[test]
    fn test_defaults_to_everything() {
        let (filter, page) = FilterQuery::default().parse().unwrap();
        assert_eq!(filter, ProductFilter::default());
        assert_eq!(page.page(), 1);
        assert_eq!(page.page_size(), FILTER_PAGE_SIZE);
    }

    #[test]
    fn test_bracketed_parameters() {
        let q = query(
            "category%5Bname%5D=Save%20Water&category%5Bselected%5D=true\
             &price%5B0%5D=5&price%5B1%5D=20.50&sort=price-desc&page=2&pageSize=3",
        );
        let (filter, page) = q.parse().unwrap();

        assert_eq!(filter.category, CategoryFilter::Named(Category::SaveWater));
        assert_eq!(filter.sort, ProductSort::PriceDesc);
        assert_eq!(
            filter.price.min(),
            Some(Price::new(Decimal::new(5, 0)).unwrap())
        );
        assert_eq!(
            filter.price.max(),
            Some(Price::new(Decimal::new(2050, 2)).unwrap())
        );
        assert_eq!(page.page(), 2);
        assert_eq!(page.page_size(), 3);
    }

    #[test]
    fn test_unselected_category_is_ignored() {
        let q = query("category%5Bname%5D=Save%20Water&category%5Bselected%5D=false");
        assert_eq!(q.parse().unwrap().0.category, CategoryFilter::All);
    }

    #[test]
    fn test_blank_price_is_unbounded() {
        let q = query("price%5B0%5D=&price%5B1%5D=");
        assert_eq!(q.parse().unwrap().0.price, PriceRange::default());
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        for pairs in [
            "price%5B0%5D=-1",
            "price%5B0%5D=cheap",
            "sort=random",
            "category%5Bname%5D=Gardening&category%5Bselected%5D=true",
            "pageSize=0",
        ] {
            assert!(
                matches!(query(pairs).parse(), Err(AppError::BadRequest(_))),
                "{pairs} should be rejected"
            );
        }
    }
}
