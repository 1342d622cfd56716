//! Service-level tests against the in-memory store.
//!
//! These exercise cart merging, checkout and the review ledger end to end
//! through the public services, without HTTP.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use rust_decimal::Decimal;

use verdant_core::{Category, CategoryFilter, OrderId, PageRequest, PriceRange, ProductSort, Quantity};
use verdant_storefront::db::InMemoryStore;
use verdant_storefront::models::{ProductFilter, ReviewQuery};
use verdant_storefront::services::{
    CartError, CartService, CatalogService, OrderError, OrderService, ReviewError, ReviewService,
    catalog::product_cache,
};

use common::{add_product, add_user, price};

fn qty(n: i32) -> Quantity {
    Quantity::new(n).unwrap()
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_repeated_adds_merge_into_one_line() {
    let store = InMemoryStore::new();
    let user = add_user(&store, "merge@example.com").await;
    let product = add_product(&store, "Steel Straw", 350, Category::ReducingPlasticUse).await;
    let carts = CartService::new(&store);

    for n in [1, 4, 2] {
        carts.add_item(user.id, product.id, qty(n)).await.unwrap();
    }

    let items = carts.get_cart(user.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity.get(), 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_never_duplicate_lines() {
    let store = Arc::new(InMemoryStore::new());
    let user = add_user(&store, "race@example.com").await;
    let product = add_product(&store, "Beeswax Wrap", 1200, Category::MinimalizingFoodWaste).await;

    let tasks: Vec<_> = (1..=20)
        .map(|n| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                CartService::new(store.as_ref())
                    .add_item(user.id, product.id, qty(n))
                    .await
                    .unwrap();
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let items = CartService::new(store.as_ref()).get_cart(user.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity.get(), (1..=20).sum::<i32>());
}

#[tokio::test]
async fn test_removed_product_leaves_the_cart() {
    let store = InMemoryStore::new();
    let user = add_user(&store, "remove@example.com").await;
    let keep = add_product(&store, "Shower Timer", 800, Category::SaveWater).await;
    let drop = add_product(&store, "Rain Barrel", 9900, Category::SaveWater).await;
    let carts = CartService::new(&store);

    carts.add_item(user.id, keep.id, qty(1)).await.unwrap();
    carts.add_item(user.id, drop.id, qty(3)).await.unwrap();
    carts.remove_item(user.id, drop.id).await.unwrap();

    let items = carts.get_cart(user.id).await.unwrap();
    assert!(items.iter().all(|item| item.product_id != drop.id));
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn test_cart_errors() {
    let store = InMemoryStore::new();
    let user = add_user(&store, "errors@example.com").await;
    let product = add_product(&store, "LED Bulb", 450, Category::ReducingEnergyConsumption).await;
    let carts = CartService::new(&store);

    assert!(carts.get_cart(user.id).await.unwrap().is_empty());
    assert!(matches!(
        carts.remove_item(user.id, product.id).await,
        Err(CartError::CartNotFound)
    ));
    assert!(matches!(
        carts.clear_cart(user.id).await,
        Err(CartError::CartNotFound)
    ));

    let missing = verdant_core::ProductId::new(9999);
    assert!(matches!(
        carts.add_item(user.id, missing, qty(1)).await,
        Err(CartError::ProductNotFound)
    ));
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_checkout_totals_and_empties_cart() {
    let store = InMemoryStore::new();
    let user = add_user(&store, "checkout@example.com").await;
    let a = add_product(&store, "Compost Bin", 1000, Category::MinimalizingFoodWaste).await;
    let b = add_product(&store, "Produce Bags", 500, Category::ReducingPlasticUse).await;

    let carts = CartService::new(&store);
    carts.add_item(user.id, a.id, qty(2)).await.unwrap();
    carts.add_item(user.id, b.id, qty(1)).await.unwrap();

    let orders = OrderService::new(&store);
    let order = orders.place_order(user.id).await.unwrap();

    assert_eq!(order.total, price(2500));
    assert_eq!(order.items.len(), 2);
    assert!(carts.get_cart(user.id).await.unwrap().is_empty());

    let history = orders.list_orders(user.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, order.id);
    assert_eq!(history[0].items.len(), 2);
}

#[tokio::test]
async fn test_empty_cart_cannot_be_ordered() {
    let store = InMemoryStore::new();
    let user = add_user(&store, "empty@example.com").await;
    let product = add_product(&store, "Solar Charger", 3999, Category::ReducingEnergyConsumption).await;
    let orders = OrderService::new(&store);

    // No cart at all
    assert!(matches!(
        orders.place_order(user.id).await,
        Err(OrderError::EmptyCart)
    ));

    // A cart that was emptied
    let carts = CartService::new(&store);
    carts.add_item(user.id, product.id, qty(1)).await.unwrap();
    carts.clear_cart(user.id).await.unwrap();
    assert!(matches!(
        orders.place_order(user.id).await,
        Err(OrderError::EmptyCart)
    ));

    assert!(orders.list_orders(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_order_uses_price_at_checkout() {
    use verdant_storefront::db::CatalogStore;
    use verdant_storefront::models::ProductInput;

    let store = InMemoryStore::new();
    let user = add_user(&store, "reprice@example.com").await;
    let product = add_product(&store, "Tote Bag", 1500, Category::ReducingPlasticUse).await;

    CartService::new(&store)
        .add_item(user.id, product.id, qty(2))
        .await
        .unwrap();

    store
        .update_product(
            product.id,
            &ProductInput {
                name: product.name.clone(),
                description: product.description.clone(),
                price: price(1250),
                category: product.category,
                image_url: product.image_url.clone(),
            },
        )
        .await
        .unwrap();

    let order = OrderService::new(&store).place_order(user.id).await.unwrap();
    assert_eq!(order.total, price(2500));
}

// =============================================================================
// Reviews
// =============================================================================

#[tokio::test]
async fn test_second_review_is_a_duplicate() {
    let store = InMemoryStore::new();
    let user = add_user(&store, "reviewer@example.com").await;
    let product = add_product(&store, "Bamboo Brush", 499, Category::ReducingPlasticUse).await;

    CartService::new(&store)
        .add_item(user.id, product.id, qty(1))
        .await
        .unwrap();
    let order = OrderService::new(&store).place_order(user.id).await.unwrap();

    let reviews = ReviewService::new(&store);
    reviews
        .create_review(user.id, order.id, product.id, 5, "Lasts longer than plastic.")
        .await
        .unwrap();

    let second = reviews
        .create_review(user.id, order.id, product.id, 1, "Changed my mind about it.")
        .await;
    assert!(matches!(second, Err(ReviewError::DuplicateReview)));

    let all = reviews.list_reviews(ReviewQuery::default()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].review.rating.get(), 5);
}

#[tokio::test]
async fn test_review_requires_a_matching_order() {
    let store = InMemoryStore::new();
    let buyer = add_user(&store, "buyer@example.com").await;
    let other = add_user(&store, "other@example.com").await;
    let bought = add_product(&store, "Water Filter", 2500, Category::SaveWater).await;
    let not_bought = add_product(&store, "Drip Hose", 1800, Category::SaveWater).await;

    CartService::new(&store)
        .add_item(buyer.id, bought.id, qty(1))
        .await
        .unwrap();
    let order = OrderService::new(&store).place_order(buyer.id).await.unwrap();
    let reviews = ReviewService::new(&store);

    let comment = "Works exactly as described.";
    assert!(matches!(
        reviews
            .create_review(buyer.id, order.id, not_bought.id, 4, comment)
            .await,
        Err(ReviewError::NotPurchased)
    ));
    assert!(matches!(
        reviews
            .create_review(other.id, order.id, bought.id, 4, comment)
            .await,
        Err(ReviewError::NotPurchased)
    ));
    assert!(matches!(
        reviews
            .create_review(buyer.id, OrderId::new(424_242), bought.id, 4, comment)
            .await,
        Err(ReviewError::NotPurchased)
    ));
}

#[tokio::test]
async fn test_review_validation() {
    let store = InMemoryStore::new();
    let user = add_user(&store, "strict@example.com").await;
    let product = add_product(&store, "Rain Gauge", 700, Category::SaveWater).await;
    let reviews = ReviewService::new(&store);
    let order = OrderId::new(1);

    for rating in [0, 6, -1] {
        assert!(matches!(
            reviews
                .create_review(user.id, order, product.id, rating, "Long enough comment.")
                .await,
            Err(ReviewError::Validation(_))
        ));
    }
    assert!(matches!(
        reviews
            .create_review(user.id, order, product.id, 3, "  too short  ")
            .await,
        Err(ReviewError::Validation(_))
    ));
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_filter_by_category_and_price_ascending() {
    let store = InMemoryStore::new();
    for (name, cents) in [("Aerator", 900), ("Timer", 300), ("Barrel", 6000)] {
        add_product(&store, name, cents, Category::SaveWater).await;
    }
    add_product(&store, "Cheap Bag", 100, Category::ReducingPlasticUse).await;

    let cache = product_cache();
    let filter = ProductFilter {
        category: CategoryFilter::Named(Category::SaveWater),
        price: PriceRange::new(Some(price(0)), Some(price(100_000))).unwrap(),
        sort: ProductSort::PriceAsc,
    };
    let (products, pagination) = CatalogService::new(&store, &cache)
        .filter_products(&filter, PageRequest::new(1, 10).unwrap())
        .await
        .unwrap();

    assert!(products.iter().all(|p| p.category == Category::SaveWater));
    let prices: Vec<Decimal> = products.iter().map(|p| p.price.amount()).collect();
    assert_eq!(
        prices,
        [Decimal::new(300, 2), Decimal::new(900, 2), Decimal::new(6000, 2)]
    );
    assert_eq!(pagination.current_page, 1);
    assert_eq!(pagination.total_count, 3);
    assert_eq!(pagination.total_pages, 1);
}

#[tokio::test]
async fn test_homepage_favours_the_shoppers_category() {
    let store = InMemoryStore::new();
    for i in 0..7 {
        add_product(&store, &format!("Plastic-free {i}"), 500, Category::ReducingPlasticUse).await;
    }
    for i in 0..3 {
        add_product(&store, &format!("Water saver {i}"), 500, Category::SaveWater).await;
    }

    let cache = product_cache();
    let sample = CatalogService::new(&store, &cache)
        .homepage(Some(Category::ReducingPlasticUse), 8)
        .await
        .unwrap();

    assert_eq!(sample.len(), 8);
    let preferred = sample
        .iter()
        .filter(|p| p.category == Category::ReducingPlasticUse)
        .count();
    assert!(preferred >= 6);
    assert!(
        sample
            .iter()
            .take(6)
            .all(|p| p.category == Category::ReducingPlasticUse)
    );
}

#[tokio::test]
async fn test_homepage_backfills_a_small_category() {
    let store = InMemoryStore::new();
    add_product(&store, "Only One", 500, Category::SaveWater).await;
    for i in 0..10 {
        add_product(&store, &format!("Other {i}"), 500, Category::ReducingEnergyConsumption).await;
    }

    let cache = product_cache();
    let sample = CatalogService::new(&store, &cache)
        .homepage(Some(Category::SaveWater), 8)
        .await
        .unwrap();

    assert_eq!(sample.len(), 8);
    assert_eq!(sample[0].category, Category::SaveWater);
}
