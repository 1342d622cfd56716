//! In-memory store for tests and local demos.
//!
//! All state sits behind one async mutex, so every operation is atomic and
//! cart mutations are serialized exactly like the row-locked `PostgreSQL`
//! implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use verdant_core::{
    ActivityId, ActivityType, CartId, CartItemId, Email, OrderId, OrderItemId, PageRequest, Price,
    ProductId, ProductSort, Quantity, ReviewId, UserId,
};

use super::{
    ActivityStore, CartStore, CatalogStore, OrderStore, RepositoryError, ReviewStore, Store,
    UserStore, line_limit_exceeded,
};
use crate::models::{
    Activity, ActivityWithUser, CartItem, NewReview, NewUser, Order, OrderDraft, OrderItem,
    Product, ProductFilter, ProductInput, Review, ReviewQuery, ReviewWithAuthor, Reviewer,
    SampleScope, User, UserChanges, UserProfile,
};

struct StoredUser {
    user: User,
    password_hash: String,
}

struct StoredCartItem {
    cart_id: CartId,
    product_id: ProductId,
    quantity: Quantity,
}

struct StoredOrder {
    user_id: UserId,
    total: Price,
    created_at: chrono::DateTime<Utc>,
    lines: Vec<(OrderItemId, ProductId, Quantity)>,
}

#[derive(Default)]
struct State {
    next_id: i32,
    users: BTreeMap<UserId, StoredUser>,
    products: BTreeMap<ProductId, Product>,
    carts: HashMap<UserId, CartId>,
    cart_items: BTreeMap<CartItemId, StoredCartItem>,
    orders: BTreeMap<OrderId, StoredOrder>,
    reviews: BTreeMap<ReviewId, Review>,
    activities: Vec<Activity>,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn email_taken(&self, email: &Email, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| &u.user.email == email && Some(u.user.id) != except)
    }

    fn cart_items(&self, cart_id: CartId) -> Vec<CartItem> {
        self.cart_items
            .iter()
            .filter(|(_, item)| item.cart_id == cart_id)
            .filter_map(|(id, item)| {
                let product = self.products.get(&item.product_id)?;
                Some(CartItem {
                    id: *id,
                    cart_id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    product: product.clone(),
                })
            })
            .collect()
    }

    fn order(&self, id: OrderId, stored: &StoredOrder) -> Order {
        let items = stored
            .lines
            .iter()
            .filter_map(|&(item_id, product_id, quantity)| {
                let product = self.products.get(&product_id)?;
                Some(OrderItem {
                    id: item_id,
                    order_id: id,
                    product_id,
                    quantity,
                    product: product.clone(),
                })
            })
            .collect();

        Order {
            id,
            user_id: stored.user_id,
            total: stored.total,
            created_at: stored.created_at,
            items,
        }
    }
}

fn page_slice<T>(items: Vec<T>, page: PageRequest) -> Vec<T> {
    let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let take = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    items.into_iter().skip(skip).take(take).collect()
}

fn count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// Store that keeps everything in process memory.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `ping` fail, to exercise readiness checks.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.email_taken(&user.email, None) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let id = UserId::new(state.next_id());
        let now = Utc::now();
        let created = User {
            id,
            name: user.name,
            email: user.email,
            category: user.category,
            is_admin: false,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(
            id,
            StoredUser {
                user: created.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(created)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).map(|u| u.user.clone()))
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| &u.user.email == email)
            .map(|u| u.user.clone()))
    }

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| &u.user.email == email)
            .map(|u| (u.user.clone(), u.password_hash.clone())))
    }

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).map(|u| u.password_hash.clone()))
    }

    async fn update_user(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;
        if let Some(email) = &changes.email
            && state.email_taken(email, Some(id))
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let stored = state.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if let Some(name) = changes.name {
            stored.user.name = name;
        }
        if let Some(email) = changes.email {
            stored.user.email = email;
        }
        if let Some(category) = changes.category {
            stored.user.category = category;
        }
        if let Some(hash) = changes.password_hash {
            stored.password_hash = hash;
        }
        stored.user.updated_at = Utc::now();
        Ok(stored.user.clone())
    }

    async fn set_admin(&self, email: &Email, is_admin: bool) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;
        let stored = state
            .users
            .values_mut()
            .find(|u| &u.user.email == email)
            .ok_or(RepositoryError::NotFound)?;
        stored.user.is_admin = is_admin;
        stored.user.updated_at = Utc::now();
        Ok(stored.user.clone())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn filter_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<Product>, u64), RepositoryError> {
        let state = self.state.lock().await;
        let mut matches: Vec<Product> = state
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();

        match filter.sort {
            ProductSort::None => {}
            ProductSort::PriceAsc => matches.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id))),
            ProductSort::PriceDesc => matches.sort_by(|a, b| b.price.cmp(&a.price).then(a.id.cmp(&b.id))),
        }

        let total = count(matches.len());
        Ok((page_slice(matches, page), total))
    }

    async fn search_products(
        &self,
        term: &str,
        page: PageRequest,
    ) -> Result<(Vec<Product>, u64), RepositoryError> {
        let needle = term.to_lowercase();
        let state = self.state.lock().await;
        let mut matches: Vec<Product> = state
            .products
            .values()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        let total = count(matches.len());
        Ok((page_slice(matches, page), total))
    }

    async fn sample_products(
        &self,
        scope: SampleScope,
        limit: u32,
    ) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.lock().await;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(state
            .products
            .values()
            .filter(|p| scope.includes(p))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.products.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.products.values().cloned().collect())
    }

    async fn create_product(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let mut state = self.state.lock().await;
        let id = ProductId::new(state.next_id());
        let now = Utc::now();
        let product = Product {
            id,
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            category: input.category,
            image_url: input.image_url.clone(),
            created_at: now,
            updated_at: now,
        };
        state.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let mut state = self.state.lock().await;
        let product = state.products.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        product.name.clone_from(&input.name);
        product.description.clone_from(&input.description);
        product.price = input.price;
        product.category = input.category;
        product.image_url.clone_from(&input.image_url);
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.products.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }

        let ordered = state
            .orders
            .values()
            .any(|o| o.lines.iter().any(|&(_, product_id, _)| product_id == id));
        let reviewed = state.reviews.values().any(|r| r.product_id == id);
        if ordered || reviewed {
            return Err(RepositoryError::Conflict(
                "product has order or review history".to_owned(),
            ));
        }

        state.cart_items.retain(|_, item| item.product_id != id);
        state.products.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn get_cart(&self, user_id: UserId) -> Result<Option<Vec<CartItem>>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .carts
            .get(&user_id)
            .map(|&cart_id| state.cart_items(cart_id)))
    }

    async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Vec<CartItem>, RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.products.contains_key(&product_id) {
            return Err(RepositoryError::NotFound);
        }

        let cart_id = match state.carts.get(&user_id) {
            Some(&id) => id,
            None => {
                let id = CartId::new(state.next_id());
                state.carts.insert(user_id, id);
                id
            }
        };

        let existing = state
            .cart_items
            .values_mut()
            .find(|item| item.cart_id == cart_id && item.product_id == product_id);
        if let Some(item) = existing {
            item.quantity = item
                .quantity
                .checked_add(quantity)
                .ok_or_else(line_limit_exceeded)?;
        } else {
            let item_id = CartItemId::new(state.next_id());
            state.cart_items.insert(
                item_id,
                StoredCartItem {
                    cart_id,
                    product_id,
                    quantity,
                },
            );
        }

        Ok(state.cart_items(cart_id))
    }

    async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Vec<CartItem>, RepositoryError> {
        let mut state = self.state.lock().await;
        let cart_id = *state.carts.get(&user_id).ok_or(RepositoryError::NotFound)?;
        state
            .cart_items
            .retain(|_, item| !(item.cart_id == cart_id && item.product_id == product_id));
        Ok(state.cart_items(cart_id))
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let cart_id = *state.carts.get(&user_id).ok_or(RepositoryError::NotFound)?;
        state.cart_items.retain(|_, item| item.cart_id != cart_id);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn place_order(&self, user_id: UserId) -> Result<Option<Order>, RepositoryError> {
        let mut state = self.state.lock().await;
        let Some(&cart_id) = state.carts.get(&user_id) else {
            return Ok(None);
        };

        let cart = state.cart_items(cart_id);
        if cart.is_empty() {
            return Ok(None);
        }

        let draft = OrderDraft::from_cart(&cart);
        let order_id = OrderId::new(state.next_id());
        let mut lines = Vec::with_capacity(draft.lines.len());
        for line in &draft.lines {
            let item_id = OrderItemId::new(state.next_id());
            lines.push((item_id, line.product_id, line.quantity));
        }

        let stored = StoredOrder {
            user_id,
            total: draft.total,
            created_at: Utc::now(),
            lines,
        };
        let order = state.order(order_id, &stored);
        state.orders.insert(order_id, stored);
        state.cart_items.retain(|_, item| item.cart_id != cart_id);

        Ok(Some(order))
    }

    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|(_, o)| o.user_id == user_id)
            .map(|(&id, o)| state.order(id, o))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn order_contains(
        &self,
        user_id: UserId,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.orders.get(&order_id).is_some_and(|o| {
            o.user_id == user_id && o.lines.iter().any(|&(_, p, _)| p == product_id)
        }))
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn find_review(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<Review>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .reviews
            .values()
            .find(|r| r.user_id == user_id && r.product_id == product_id)
            .cloned())
    }

    async fn create_review(&self, review: NewReview) -> Result<Review, RepositoryError> {
        let mut state = self.state.lock().await;
        let duplicate = state
            .reviews
            .values()
            .any(|r| r.user_id == review.user_id && r.product_id == review.product_id);
        if duplicate {
            return Err(RepositoryError::Conflict("review already exists".to_owned()));
        }

        let id = ReviewId::new(state.next_id());
        let now = Utc::now();
        let stored = Review {
            id,
            user_id: review.user_id,
            order_id: review.order_id,
            product_id: review.product_id,
            rating: review.rating,
            comment: review.comment,
            created_at: now,
            updated_at: now,
        };
        state.reviews.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_reviews(
        &self,
        query: ReviewQuery,
    ) -> Result<Vec<ReviewWithAuthor>, RepositoryError> {
        let state = self.state.lock().await;
        let mut reviews: Vec<ReviewWithAuthor> = state
            .reviews
            .values()
            .filter(|r| query.product_id.is_none_or(|p| r.product_id == p))
            .filter_map(|r| {
                let author = &state.users.get(&r.user_id)?.user;
                Some(ReviewWithAuthor {
                    review: r.clone(),
                    user: Reviewer {
                        id: author.id,
                        name: author.name.clone(),
                        category: author.category,
                    },
                })
            })
            .collect();
        reviews.sort_by(|a, b| {
            b.review
                .created_at
                .cmp(&a.review.created_at)
                .then(b.review.id.cmp(&a.review.id))
        });

        Ok(match query.page {
            Some(page) => page_slice(reviews, page),
            None => reviews,
        })
    }
}

#[async_trait]
impl ActivityStore for InMemoryStore {
    async fn record_activity(
        &self,
        user_id: UserId,
        kind: ActivityType,
    ) -> Result<Activity, RepositoryError> {
        let mut state = self.state.lock().await;
        let activity = Activity {
            id: ActivityId::new(state.next_id()),
            user_id,
            kind: kind.as_str().to_owned(),
            created_at: Utc::now(),
        };
        state.activities.push(activity.clone());
        Ok(activity)
    }

    async fn list_activities(&self, user_id: UserId) -> Result<Vec<Activity>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .activities
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all_activities(&self) -> Result<Vec<ActivityWithUser>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .activities
            .iter()
            .rev()
            .filter_map(|a| {
                let user = &state.users.get(&a.user_id)?.user;
                Some(ActivityWithUser {
                    activity: a.clone(),
                    user: UserProfile::from(user),
                })
            })
            .collect())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}
