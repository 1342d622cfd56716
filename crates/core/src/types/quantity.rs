//! Positive item quantity.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The value is zero or negative.
    #[error("quantity must be at least 1")]
    NotPositive,
    /// The value does not fit in the storage type.
    #[error("quantity is too large")]
    TooLarge,
}

/// A strictly positive number of units of a product.
///
/// ```
/// use verdant_core::Quantity;
///
/// let q = Quantity::new(2).unwrap();
/// assert_eq!(q.checked_add(Quantity::new(3).unwrap()).unwrap().get(), 5);
/// assert!(Quantity::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(1);

    /// Most units a single cart or order line may hold.
    pub const MAX_PER_LINE: i32 = 10_000;

    /// Create a quantity from an `i32`.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::NotPositive` for values below 1.
    pub const fn new(value: i32) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::NotPositive);
        }
        Ok(Self(value))
    }

    /// Get the raw value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Add two quantities, or `None` if the sum exceeds
    /// [`Self::MAX_PER_LINE`].
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) if sum <= Self::MAX_PER_LINE => Some(Self(sum)),
            _ => None,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < 1 {
            return Err(QuantityError::NotPositive);
        }
        let value = i32::try_from(value).map_err(|_| QuantityError::TooLarge)?;
        Self::new(value)
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Quantity {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Quantity {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(raw)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Quantity {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive() {
        assert_eq!(Quantity::new(0), Err(QuantityError::NotPositive));
        assert_eq!(Quantity::new(-4), Err(QuantityError::NotPositive));
        assert_eq!(Quantity::try_from(0_i64), Err(QuantityError::NotPositive));
    }

    #[test]
    fn test_rejects_overflow() {
        assert_eq!(
            Quantity::try_from(i64::from(i32::MAX) + 1),
            Err(QuantityError::TooLarge)
        );
    }

    #[test]
    fn test_checked_add_stops_at_line_limit() {
        let almost = Quantity::new(Quantity::MAX_PER_LINE - 1).unwrap();
        assert_eq!(
            almost.checked_add(Quantity::ONE).unwrap().get(),
            Quantity::MAX_PER_LINE
        );
        assert_eq!(almost.checked_add(Quantity::new(2).unwrap()), None);

        let big = Quantity::new(i32::MAX).unwrap();
        assert_eq!(big.checked_add(Quantity::ONE), None);
    }

    #[test]
    fn test_serde() {
        let q: Quantity = serde_json::from_str("3").unwrap();
        assert_eq!(q.get(), 3);
        assert_eq!(serde_json::to_string(&q).unwrap(), "3");
        assert!(serde_json::from_str::<Quantity>("0").is_err());
    }
}
