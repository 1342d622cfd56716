//! Catalog vocabulary: product categories, filters, and sort orders.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::price::Price;

/// Errors raised while parsing catalog query parameters.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogParseError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("unknown sort order: {0}")]
    UnknownSort(String),
    #[error("minimum price cannot exceed maximum price")]
    InvertedPriceRange,
}

/// The four sustainable-living themes every product belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Reducing Plastic Use")]
    ReducingPlasticUse,
    #[serde(rename = "Reducing Energy Consumption")]
    ReducingEnergyConsumption,
    #[serde(rename = "Save Water")]
    SaveWater,
    #[serde(rename = "Minimalizing Food Waste")]
    MinimalizingFoodWaste,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 4] = [
        Self::ReducingPlasticUse,
        Self::ReducingEnergyConsumption,
        Self::SaveWater,
        Self::MinimalizingFoodWaste,
    ];

    /// Display name, also used as the stored value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReducingPlasticUse => "Reducing Plastic Use",
            Self::ReducingEnergyConsumption => "Reducing Energy Consumption",
            Self::SaveWater => "Save Water",
            Self::MinimalizingFoodWaste => "Minimalizing Food Waste",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CatalogParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CatalogParseError::UnknownCategory(s.to_owned()))
    }
}

/// Category restriction applied to a product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(Category),
}

impl CategoryFilter {
    /// Interpret the `category[name]` / `category[selected]` query pair.
    ///
    /// The filter only applies when a concrete name is given and `selected`
    /// is `true`; anything else (including the literal `"All"`) means no
    /// restriction.
    ///
    /// # Errors
    ///
    /// Returns `CatalogParseError::UnknownCategory` if a selected name does
    /// not match any category.
    pub fn parse(name: Option<&str>, selected: Option<bool>) -> Result<Self, CatalogParseError> {
        match (name.map(str::trim), selected) {
            (Some(name), Some(true)) if !name.is_empty() && name != "All" => {
                name.parse().map(Self::Named)
            }
            _ => Ok(Self::All),
        }
    }

    /// The selected category, if any.
    #[must_use]
    pub const fn category(self) -> Option<Category> {
        match self {
            Self::All => None,
            Self::Named(c) => Some(c),
        }
    }
}

/// Price ordering for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Storage order (by id).
    #[default]
    None,
    PriceAsc,
    PriceDesc,
}

impl FromStr for ProductSort {
    type Err = CatalogParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Self::None),
            "price-asc" => Ok(Self::PriceAsc),
            "price-desc" => Ok(Self::PriceDesc),
            other => Err(CatalogParseError::UnknownSort(other.to_owned())),
        }
    }
}

/// Inclusive price bounds. Either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceRange {
    min: Option<Price>,
    max: Option<Price>,
}

impl PriceRange {
    /// Build a range.
    ///
    /// # Errors
    ///
    /// Returns `CatalogParseError::InvertedPriceRange` if both bounds are
    /// present and `min > max`.
    pub fn new(min: Option<Price>, max: Option<Price>) -> Result<Self, CatalogParseError> {
        if let (Some(lo), Some(hi)) = (min, max)
            && lo > hi
        {
            return Err(CatalogParseError::InvertedPriceRange);
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub const fn min(&self) -> Option<Price> {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> Option<Price> {
        self.max
    }

    /// Whether `price` falls inside the range.
    #[must_use]
    pub fn contains(&self, price: Price) -> bool {
        self.min.is_none_or(|lo| price >= lo) && self.max.is_none_or(|hi| price <= hi)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn price(whole: i64) -> Price {
        Price::new(Decimal::from(whole)).unwrap()
    }

    #[test]
    fn test_category_round_trips_through_name() {
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
            assert_eq!(
                serde_json::to_string(&c).unwrap(),
                format!("\"{}\"", c.as_str())
            );
        }
        assert!("Gardening".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_filter_parse() {
        assert_eq!(CategoryFilter::parse(None, None).unwrap(), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::parse(Some("All"), Some(true)).unwrap(),
            CategoryFilter::All
        );
        assert_eq!(
            CategoryFilter::parse(Some("Save Water"), Some(false)).unwrap(),
            CategoryFilter::All
        );
        assert_eq!(
            CategoryFilter::parse(Some("Save Water"), None).unwrap(),
            CategoryFilter::All
        );
        assert_eq!(
            CategoryFilter::parse(Some("Save Water"), Some(true)).unwrap(),
            CategoryFilter::Named(Category::SaveWater)
        );
        assert!(CategoryFilter::parse(Some("Nope"), Some(true)).is_err());
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!("none".parse::<ProductSort>().unwrap(), ProductSort::None);
        assert_eq!(
            "price-asc".parse::<ProductSort>().unwrap(),
            ProductSort::PriceAsc
        );
        assert_eq!(
            "price-desc".parse::<ProductSort>().unwrap(),
            ProductSort::PriceDesc
        );
        assert!("name".parse::<ProductSort>().is_err());
    }

    #[test]
    fn test_price_range() {
        assert_eq!(
            PriceRange::new(Some(price(10)), Some(price(5))),
            Err(CatalogParseError::InvertedPriceRange)
        );

        let range = PriceRange::new(Some(price(5)), Some(price(10))).unwrap();
        assert!(range.contains(price(5)));
        assert!(range.contains(price(10)));
        assert!(!range.contains(price(11)));

        let open = PriceRange::new(None, Some(price(3))).unwrap();
        assert!(open.contains(Price::ZERO));
        assert!(!open.contains(price(4)));
    }
}
