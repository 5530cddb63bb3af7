//! Integration tests for the cart ledger and the wishlist.

mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use common::{decimal, response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use storefront_api::{
    errors::ServiceError,
    services::{
        cart::{AddToCartInput, UpdateCartItemInput},
        catalog::UpdateProductInput,
    },
};
use uuid::Uuid;

#[tokio::test]
async fn adding_the_same_product_twice_overwrites_quantity() {
    let app = TestApp::new().await;
    let category = app.seed_category("Kantha Stitch").await;
    let stole = app.seed_product(category.id, "Kantha Stole", 1200, 10).await;
    let cart = &app.state.services.cart;

    cart.upsert_item(
        app.customer_id,
        AddToCartInput {
            product_id: stole.id,
            quantity: 2,
        },
    )
    .await
    .expect("first add");
    cart.upsert_item(
        app.customer_id,
        AddToCartInput {
            product_id: stole.id,
            quantity: 5,
        },
    )
    .await
    .expect("second add");

    let view = cart.get_cart(app.customer_id).await.expect("cart");
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].quantity, 5);
    assert_eq!(view.total_quantity, 5);
    assert_eq!(view.subtotal, dec!(6000));
}

#[tokio::test]
async fn quantity_above_stock_is_rejected_without_changes() {
    let app = TestApp::new().await;
    let category = app.seed_category("Leather Craft").await;
    let tote = app.seed_product(category.id, "Tooled Tote", 2200, 3).await;
    let cart = &app.state.services.cart;

    let result = cart
        .upsert_item(
            app.customer_id,
            AddToCartInput {
                product_id: tote.id,
                quantity: 4,
            },
        )
        .await;
    assert_matches!(result, Err(ServiceError::InsufficientStock(_)));

    let line = cart
        .upsert_item(
            app.customer_id,
            AddToCartInput {
                product_id: tote.id,
                quantity: 3,
            },
        )
        .await
        .expect("exact stock is allowed");

    let result = cart
        .update_item(app.customer_id, line.id, UpdateCartItemInput { quantity: 9 })
        .await;
    assert_matches!(result, Err(ServiceError::InsufficientStock(_)));

    let view = cart.get_cart(app.customer_id).await.expect("cart");
    assert_eq!(view.items[0].quantity, 3);
    assert_eq!(app.product(tote.id).await.stock, 3);
}

#[tokio::test]
async fn inactive_products_cannot_be_added() {
    let app = TestApp::new().await;
    let category = app.seed_category("Home Decor").await;
    let lamp = app.seed_product(category.id, "Bamboo Lamp", 950, 5).await;
    app.state
        .services
        .catalog
        .update_product(
            lamp.id,
            UpdateProductInput {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .expect("deactivate");

    let result = app
        .state
        .services
        .cart
        .upsert_item(
            app.customer_id,
            AddToCartInput {
                product_id: lamp.id,
                quantity: 1,
            },
        )
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn cart_lines_are_scoped_to_their_owner() {
    let app = TestApp::new().await;
    let category = app.seed_category("Sarees").await;
    let saree = app.seed_product(category.id, "Tant Saree", 1800, 5).await;

    let line = app
        .state
        .services
        .cart
        .upsert_item(
            app.customer_id,
            AddToCartInput {
                product_id: saree.id,
                quantity: 1,
            },
        )
        .await
        .expect("add");

    let stranger = app.token_for(Uuid::new_v4());
    let uri = format!("/api/v1/cart/{}", line.id);

    let response = app
        .request(Method::PUT, &uri, Some(json!({ "quantity": 2 })), Some(&stranger))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.request(Method::DELETE, &uri, None, Some(&stranger)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.customer_request(Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let view = app.state.services.cart.get_cart(app.customer_id).await.unwrap();
    assert!(view.items.is_empty());
}

#[tokio::test]
async fn cart_endpoints_round_trip() {
    let app = TestApp::new().await;
    let category = app.seed_category("Batik").await;
    let scarf = app.seed_product(category.id, "Batik Scarf", 300, 10).await;
    let wallet = app.seed_product(category.id, "Card Wallet", 450, 10).await;

    for (product_id, quantity) in [(scarf.id, 2), (wallet.id, 1)] {
        let response = app
            .customer_request(
                Method::POST,
                "/api/v1/cart",
                Some(json!({ "product_id": product_id, "quantity": quantity })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app.customer_request(Method::GET, "/api/v1/cart", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["item_count"], 2);
    assert_eq!(decimal(&body["data"]["subtotal"]), dec!(1050));
    let scarf_line = body["data"]["items"]
        .as_array()
        .expect("items")
        .iter()
        .find(|line| line["product_id"] == scarf.id.to_string().as_str())
        .expect("scarf line");
    assert_eq!(scarf_line["quantity"], 2);
    assert_eq!(decimal(&scarf_line["line_total"]), dec!(600));

    let response = app.customer_request(Method::DELETE, "/api/v1/cart", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let view = app.state.services.cart.get_cart(app.customer_id).await.unwrap();
    assert!(view.items.is_empty());
}

#[tokio::test]
async fn zero_quantity_is_rejected_at_the_boundary() {
    let app = TestApp::new().await;
    let category = app.seed_category("Batik").await;
    let scarf = app.seed_product(category.id, "Batik Scarf", 300, 10).await;

    let response = app
        .customer_request(
            Method::POST,
            "/api/v1/cart",
            Some(json!({ "product_id": scarf.id, "quantity": 0 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wishlist_toggle_flips_membership() {
    let app = TestApp::new().await;
    let category = app.seed_category("Dokra").await;
    let horse = app.seed_product(category.id, "Dokra Horse", 1500, 5).await;
    let uri = format!("/api/v1/wishlist/toggle/{}", horse.id);

    let response = app.customer_request(Method::POST, &uri, None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["in_wishlist"], true);

    let product = app
        .customer_request(Method::GET, &format!("/api/v1/products/{}", horse.id), None)
        .await;
    let body = response_json(product).await;
    assert_eq!(body["data"]["in_wishlist"], true);

    let anonymous = app
        .request(Method::GET, &format!("/api/v1/products/{}", horse.id), None, None)
        .await;
    let body = response_json(anonymous).await;
    assert_eq!(body["data"]["in_wishlist"], false);

    let response = app.customer_request(Method::POST, &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["in_wishlist"], false);

    let list = app
        .state
        .services
        .wishlist
        .list(app.customer_id)
        .await
        .expect("wishlist");
    assert!(list.is_empty());
}

#[tokio::test]
async fn wishlist_add_is_idempotent() {
    let app = TestApp::new().await;
    let category = app.seed_category("Sarees").await;
    let saree = app.seed_product(category.id, "Tant Saree", 1800, 5).await;
    let wishlist = &app.state.services.wishlist;

    wishlist.add(app.customer_id, saree.id).await.expect("add");
    wishlist.add(app.customer_id, saree.id).await.expect("add again");

    let list = wishlist.list(app.customer_id).await.expect("list");
    assert_eq!(list.len(), 1);
    assert!(list[0].in_wishlist);

    wishlist.remove(app.customer_id, saree.id).await.expect("remove");
    assert_matches!(
        wishlist.remove(app.customer_id, saree.id).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn wishlist_lists_most_recent_first() {
    let app = TestApp::new().await;
    let category = app.seed_category("Dokra").await;
    let horse = app.seed_product(category.id, "Dokra Horse", 1500, 5).await;
    let owl = app.seed_product(category.id, "Dokra Owl", 900, 5).await;
    let lamp = app.seed_product(category.id, "Dokra Lamp", 2100, 5).await;
    let wishlist = &app.state.services.wishlist;

    for id in [horse.id, owl.id, lamp.id] {
        wishlist.add(app.customer_id, id).await.expect("add");
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let list = wishlist.list(app.customer_id).await.expect("list");
    let ids: Vec<Uuid> = list.iter().map(|view| view.id).collect();
    assert_eq!(ids, vec![lamp.id, owl.id, horse.id]);
}

#[tokio::test]
async fn wishlist_rejects_unknown_products() {
    let app = TestApp::new().await;

    let response = app
        .customer_request(
            Method::POST,
            "/api/v1/wishlist",
            Some(json!({ "product_id": Uuid::new_v4() })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
