//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from database row types.

pub mod activity;
pub mod cart;
pub mod order;
pub mod product;
pub mod review;
pub mod session;
pub mod user;

pub use activity::{Activity, ActivityWithUser};
pub use cart::CartItem;
pub use order::{Order, OrderDraft, OrderItem, OrderLine};
pub use product::{Product, ProductFilter, ProductInput, SampleScope};
pub use review::{NewReview, Review, ReviewQuery, ReviewWithAuthor, Reviewer};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{NewUser, User, UserChanges, UserProfile};
