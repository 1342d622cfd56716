//! Kinds of user actions recorded in the activity log.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A user action worth recording.
///
/// The label returned by [`ActivityType::as_str`] is what gets stored and
/// shown to users and administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    #[serde(rename = "Sign Up")]
    SignUp,
    #[serde(rename = "Sign In")]
    SignIn,
    #[serde(rename = "Sign Out")]
    SignOut,
    #[serde(rename = "Update Profile")]
    UpdateProfile,
    #[serde(rename = "Add to Cart")]
    AddToCart,
    #[serde(rename = "Remove from Cart")]
    RemoveFromCart,
    #[serde(rename = "Clear Cart")]
    ClearCart,
    #[serde(rename = "Place Order")]
    PlaceOrder,
    #[serde(rename = "Create Review")]
    CreateReview,
}

impl ActivityType {
    /// Human-readable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SignUp => "Sign Up",
            Self::SignIn => "Sign In",
            Self::SignOut => "Sign Out",
            Self::UpdateProfile => "Update Profile",
            Self::AddToCart => "Add to Cart",
            Self::RemoveFromCart => "Remove from Cart",
            Self::ClearCart => "Clear Cart",
            Self::PlaceOrder => "Place Order",
            Self::CreateReview => "Create Review",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
