//! Integration tests for checkout: the order transaction, its stock and cart
//! side effects, and the `/orders` endpoints.

mod common;

use std::collections::HashSet;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use chrono::{DateTime, Utc};
use common::{decimal, response_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use serde_json::json;
use storefront_api::{
    entities::{order, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus},
    errors::ServiceError,
    services::{
        cart::AddToCartInput,
        catalog::{CreateProductInput, UpdateProductInput},
        orders::{is_order_number_clash, OrderService, PlaceOrderCommand, ShippingDetails},
    },
};
use uuid::Uuid;

fn command(user_id: Uuid, payment_method: PaymentMethod) -> PlaceOrderCommand {
    PlaceOrderCommand {
        user_id,
        payment_method,
        shipping: ShippingDetails {
            name: "Mitali Sen".into(),
            email: "mitali@example.com".into(),
            mobile: "9830012345".into(),
            address: "12 Purva Palli".into(),
            city: "Bolpur".into(),
            state: "West Bengal".into(),
            postal_code: "731204".into(),
            country: "India".into(),
        },
        notes: None,
    }
}

async fn add_to_cart(app: &TestApp, user_id: Uuid, product_id: Uuid, quantity: i32) {
    app.state
        .services
        .cart
        .upsert_item(
            user_id,
            AddToCartInput {
                product_id,
                quantity,
            },
        )
        .await
        .expect("add to cart");
}

fn fixed_order_number(prefix: &str, _at: DateTime<Utc>) -> String {
    format!("{}-000000-FIXED001", prefix)
}

fn checkout_payload() -> serde_json::Value {
    json!({
        "payment_method": "cash-on-delivery",
        "shipping_name": "Mitali Sen",
        "shipping_email": "mitali@example.com",
        "shipping_mobile": "9830012345",
        "shipping_address": "12 Purva Palli",
        "shipping_city": "Bolpur",
        "shipping_state": "West Bengal",
        "shipping_pincode": "731204"
    })
}

#[tokio::test]
async fn placing_an_order_snapshots_cart_and_decrements_stock() {
    let app = TestApp::new().await;
    let category = app.seed_category("Kantha Stitch").await;
    let stole = app
        .seed_product_with(CreateProductInput {
            category_id: category.id,
            name: "Kantha Stole".into(),
            slug: None,
            description: "Silk stole".into(),
            handmade_description: None,
            price: dec!(100),
            discount_price: Some(dec!(80)),
            stock: 10,
            sku: None,
            is_santiniketan: true,
            is_featured: false,
            is_active: true,
            meta_title: None,
            meta_description: None,
            image_urls: vec!["/img/stole-front.jpg".into(), "/img/stole-back.jpg".into()],
        })
        .await;
    let cushion = app.seed_product(category.id, "Cushion Cover", 50, 5).await;

    let user = app.customer_id;
    add_to_cart(&app, user, stole.id, 2).await;
    add_to_cart(&app, user, cushion.id, 1).await;

    let order = app
        .state
        .services
        .orders
        .place_order(command(user, PaymentMethod::Online))
        .await
        .expect("order placed");

    assert_eq!(order.subtotal, dec!(210));
    assert_eq!(order.discount, Decimal::ZERO);
    assert_eq!(order.shipping, Decimal::ZERO);
    assert_eq!(order.total, dec!(210));
    assert_eq!(order.total, order.subtotal - order.discount + order.shipping);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items.len(), 2);

    let stole_line = order
        .items
        .iter()
        .find(|item| item.product_id == stole.id)
        .expect("stole line");
    assert_eq!(stole_line.product_name, "Kantha Stole");
    assert_eq!(stole_line.price, dec!(80));
    assert_eq!(stole_line.quantity, 2);
    assert_eq!(stole_line.total, dec!(160));
    assert_eq!(
        stole_line.product_image.as_deref(),
        Some("/img/stole-front.jpg")
    );
    for item in &order.items {
        assert_eq!(item.total, item.price * Decimal::from(item.quantity));
    }

    assert_eq!(app.product(stole.id).await.stock, 8);
    assert_eq!(app.product(cushion.id).await.stock, 4);

    let cart = app.state.services.cart.get_cart(user).await.expect("cart");
    assert!(cart.items.is_empty());

    let orders = Order::find().count(&*app.state.db).await.expect("count");
    assert_eq!(orders, 1);
}

#[tokio::test]
async fn failed_decrement_rolls_back_the_whole_order() {
    let app = TestApp::new().await;
    let category = app.seed_category("Leather Craft").await;
    let wallet = app.seed_product(category.id, "Card Wallet", 450, 10).await;
    let tote = app.seed_product(category.id, "Tooled Tote", 2200, 3).await;

    let user = app.customer_id;
    add_to_cart(&app, user, wallet.id, 2).await;
    add_to_cart(&app, user, tote.id, 3).await;

    // Someone else bought totes after the cart check
    app.set_stock(tote.id, 1).await;

    let result = app
        .state
        .services
        .orders
        .place_order(command(user, PaymentMethod::Online))
        .await;
    assert_matches!(result, Err(ServiceError::InsufficientStock(_)));

    assert_eq!(app.product(wallet.id).await.stock, 10);
    assert_eq!(app.product(tote.id).await.stock, 1);
    assert_eq!(Order::find().count(&*app.state.db).await.unwrap(), 0);
    assert_eq!(OrderItem::find().count(&*app.state.db).await.unwrap(), 0);

    let cart = app.state.services.cart.get_cart(user).await.expect("cart");
    assert_eq!(cart.items.len(), 2);
}

#[tokio::test]
async fn empty_cart_is_a_validation_error() {
    let app = TestApp::new().await;

    let result = app
        .state
        .services
        .orders
        .place_order(command(app.customer_id, PaymentMethod::Online))
        .await;

    assert_matches!(result, Err(ServiceError::ValidationError { .. }));
    assert_eq!(Order::find().count(&*app.state.db).await.unwrap(), 0);
}

#[tokio::test]
async fn checkout_leaves_other_users_carts_alone() {
    let app = TestApp::new().await;
    let category = app.seed_category("Home Decor").await;
    let lamp = app.seed_product(category.id, "Bamboo Lamp", 950, 10).await;

    let other = Uuid::new_v4();
    add_to_cart(&app, app.customer_id, lamp.id, 1).await;
    add_to_cart(&app, other, lamp.id, 4).await;

    app.state
        .services
        .orders
        .place_order(command(app.customer_id, PaymentMethod::Online))
        .await
        .expect("order placed");

    let mine = app.state.services.cart.get_cart(app.customer_id).await.unwrap();
    assert!(mine.items.is_empty());

    let theirs = app.state.services.cart.get_cart(other).await.unwrap();
    assert_eq!(theirs.items.len(), 1);
    assert_eq!(theirs.items[0].quantity, 4);
}

#[tokio::test]
async fn sequential_orders_get_distinct_numbers() {
    let app = TestApp::new().await;
    let category = app.seed_category("Sarees").await;
    let saree = app.seed_product(category.id, "Tant Saree", 1800, 50).await;

    let mut numbers = HashSet::new();
    for _ in 0..5 {
        add_to_cart(&app, app.customer_id, saree.id, 1).await;
        let order = app
            .state
            .services
            .orders
            .place_order(command(app.customer_id, PaymentMethod::Online))
            .await
            .expect("order placed");
        assert!(order.order_number.starts_with("SBUC-"));
        numbers.insert(order.order_number);
    }

    assert_eq!(numbers.len(), 5);
    assert_eq!(app.product(saree.id).await.stock, 45);
}

#[tokio::test]
async fn order_number_clash_exhausts_retries_and_rolls_back() {
    let app = TestApp::new().await;
    let category = app.seed_category("Sarees").await;
    let saree = app.seed_product(category.id, "Tant Saree", 1800, 10).await;
    let db = &*app.state.db;

    let orders = OrderService::new(
        app.state.db.clone(),
        app.state.event_sender.clone(),
        app.state.config.clone(),
    )
    .with_order_number_generator(fixed_order_number);

    add_to_cart(&app, app.customer_id, saree.id, 1).await;
    let first = orders
        .place_order(command(app.customer_id, PaymentMethod::Online))
        .await
        .expect("first order placed");
    assert_eq!(first.order_number, "SBUC-000000-FIXED001");

    // A second row under the same number hits the unique index
    let existing = Order::find_by_id(first.id)
        .one(db)
        .await
        .unwrap()
        .expect("first order stored");
    let mut duplicate: order::ActiveModel = existing.into();
    duplicate.id = Set(Uuid::new_v4());
    let err = duplicate.insert(db).await.expect_err("duplicate order number");
    assert!(is_order_number_clash(&ServiceError::from(err)));

    let other = Uuid::new_v4();
    add_to_cart(&app, other, saree.id, 2).await;

    let result = orders.place_order(command(other, PaymentMethod::Online)).await;
    assert_matches!(result, Err(ServiceError::TransactionFailed(_)));

    assert_eq!(Order::find().count(db).await.unwrap(), 1);
    assert_eq!(OrderItem::find().count(db).await.unwrap(), 1);
    assert_eq!(app.product(saree.id).await.stock, 9);

    let cart = app.state.services.cart.get_cart(other).await.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);
}

#[tokio::test]
async fn later_catalog_edits_do_not_touch_order_items() {
    let app = TestApp::new().await;
    let category = app.seed_category("Dokra").await;
    let horse = app.seed_product(category.id, "Dokra Horse", 1500, 6).await;

    add_to_cart(&app, app.customer_id, horse.id, 2).await;
    let order = app
        .state
        .services
        .orders
        .place_order(command(app.customer_id, PaymentMethod::Online))
        .await
        .expect("order placed");

    app.state
        .services
        .catalog
        .update_product(
            horse.id,
            UpdateProductInput {
                name: Some("Dokra Horse Pair".into()),
                price: Some(dec!(2000)),
                discount_price: Some(Some(dec!(1700))),
                ..Default::default()
            },
        )
        .await
        .expect("update product");

    let reloaded = app
        .state
        .services
        .orders
        .get_order(app.customer_id, order.id)
        .await
        .expect("order");
    let item = &reloaded.items[0];
    assert_eq!(item.product_name, "Dokra Horse");
    assert_eq!(item.price, dec!(1500));
    assert_eq!(item.total, dec!(3000));
    assert_eq!(reloaded.total, dec!(3000));
}

#[tokio::test]
async fn cash_on_delivery_orders_start_pending() {
    let app = TestApp::new().await;
    let category = app.seed_category("Terracotta").await;
    let plate = app.seed_product(category.id, "Wall Plate", 800, 2).await;
    add_to_cart(&app, app.customer_id, plate.id, 1).await;

    let order = app
        .state
        .services
        .orders
        .place_order(command(app.customer_id, PaymentMethod::CashOnDelivery))
        .await
        .expect("order placed");

    assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn create_order_endpoint_returns_created_order() {
    let app = TestApp::new().await;
    let category = app.seed_category("Batik").await;
    let saree = app.seed_product(category.id, "Batik Saree", 2400, 3).await;

    let response = app
        .customer_request(
            Method::POST,
            "/api/v1/cart",
            Some(json!({ "product_id": saree.id, "quantity": 2 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .customer_request(Method::POST, "/api/v1/orders", Some(checkout_payload()))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    let order = &body["data"];
    assert_eq!(order["payment_method"], "cash-on-delivery");
    assert_eq!(order["payment_status"], "pending");
    assert_eq!(order["shipping_address"]["postal_code"], "731204");
    assert_eq!(order["shipping_address"]["country"], "India");
    assert_eq!(decimal(&order["total"]), dec!(4800));
    assert_eq!(order["items"].as_array().map(Vec::len), Some(1));

    let order_id = order["id"].as_str().expect("order id").to_string();

    let response = app
        .customer_request(Method::GET, "/api/v1/orders", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], order_id.as_str());

    let response = app
        .customer_request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_order_rejects_invalid_shipping_details() {
    let app = TestApp::new().await;

    let mut payload = checkout_payload();
    payload["shipping_email"] = json!("not-an-email");
    payload["shipping_pincode"] = json!("12345678901");

    let response = app
        .customer_request(Method::POST, "/api/v1/orders", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn orders_of_other_users_are_not_found() {
    let app = TestApp::new().await;
    let category = app.seed_category("Sarees").await;
    let saree = app.seed_product(category.id, "Baluchari", 8500, 2).await;
    add_to_cart(&app, app.customer_id, saree.id, 1).await;
    let order = app
        .state
        .services
        .orders
        .place_order(command(app.customer_id, PaymentMethod::Online))
        .await
        .expect("order placed");

    let stranger = app.token_for(Uuid::new_v4());
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/{}", order.id),
            None,
            Some(&stranger),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn orders_require_authentication() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api/v1/orders", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
