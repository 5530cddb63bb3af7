//! HTTP tests for the public catalog, admin product management, payments
//! and the service endpoints around them.

mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::{decimal, response_json, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use storefront_api::{
    entities::banner,
    services::{cart::AddToCartInput, catalog::CreateProductInput},
};
use uuid::Uuid;

fn names(page: &Value) -> Vec<String> {
    page.as_array()
        .expect("array of products")
        .iter()
        .map(|p| p["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

fn product_input(category_id: Uuid, name: &str) -> CreateProductInput {
    CreateProductInput {
        category_id,
        name: name.to_string(),
        slug: None,
        description: format!("{} from the village haat", name),
        handmade_description: None,
        price: dec!(500),
        discount_price: None,
        stock: 5,
        sku: None,
        is_santiniketan: false,
        is_featured: false,
        is_active: true,
        meta_title: None,
        meta_description: None,
        image_urls: vec![],
    }
}

#[tokio::test]
async fn health_reports_database_status() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = response_json(response).await;
    assert_eq!(body["data"]["database"], "healthy");
}

#[tokio::test]
async fn product_list_filters_and_hides_inactive_products() {
    let app = TestApp::new().await;
    let sarees = app.seed_category("Sarees").await;
    let decor = app.seed_category("Home Decor").await;

    app.seed_product(sarees.id, "Tant Saree", 1800, 5).await;
    app.seed_product(sarees.id, "Batik Saree", 2400, 5).await;
    app.seed_product(decor.id, "Bamboo Lamp", 950, 5).await;
    app.seed_product_with(CreateProductInput {
        is_active: false,
        ..product_input(sarees.id, "Retired Saree")
    })
    .await;

    let response = app.request(Method::GET, "/api/v1/products", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 3);
    assert!(!names(&body["data"]["items"]).contains(&"Retired Saree".to_string()));

    let uri = format!("/api/v1/products?category_id={}", sarees.id);
    let body = response_json(app.request(Method::GET, &uri, None, None).await).await;
    assert_eq!(body["data"]["total"], 2);

    let body = response_json(
        app.request(Method::GET, "/api/v1/products?search=LAMP", None, None)
            .await,
    )
    .await;
    assert_eq!(names(&body["data"]["items"]), vec!["Bamboo Lamp".to_string()]);

    let body = response_json(
        app.request(
            Method::GET,
            "/api/v1/products?sort_by=name&sort_order=asc",
            None,
            None,
        )
        .await,
    )
    .await;
    assert_eq!(
        names(&body["data"]["items"]),
        vec!["Bamboo Lamp", "Batik Saree", "Tant Saree"]
    );

    let body = response_json(
        app.request(Method::GET, "/api/v1/products?per_page=2&page=2", None, None)
            .await,
    )
    .await;
    assert_eq!(body["data"]["per_page"], 2);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn product_detail_exposes_pricing_and_images() {
    let app = TestApp::new().await;
    let category = app.seed_category("Kantha Stitch").await;
    let product = app
        .seed_product_with(CreateProductInput {
            price: dec!(1000),
            discount_price: Some(dec!(750)),
            image_urls: vec!["/img/a.jpg".into(), " ".into(), "/img/b.jpg".into()],
            ..product_input(category.id, "Kantha Quilt")
        })
        .await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/products/{}", product.id),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = response_json(response).await["data"].clone();

    assert_eq!(data["slug"], "kantha-quilt");
    assert_eq!(decimal(&data["effective_price"]), dec!(750));
    assert_eq!(data["discount_percentage"], 25);
    assert_eq!(data["primary_image"], "/img/a.jpg");
    assert_eq!(data["images"].as_array().map(Vec::len), Some(2));
    assert_eq!(data["images"][0]["is_primary"], true);
    assert_eq!(data["category"]["name"], "Kantha Stitch");

    let missing = app
        .request(
            Method::GET,
            &format!("/api/v1/products/{}", Uuid::new_v4()),
            None,
            None,
        )
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn featured_and_related_products() {
    let app = TestApp::new().await;
    let sarees = app.seed_category("Sarees").await;
    let decor = app.seed_category("Home Decor").await;

    let tant = app.seed_product(sarees.id, "Tant Saree", 1800, 5).await;
    app.seed_product_with(CreateProductInput {
        is_featured: true,
        ..product_input(sarees.id, "Baluchari Saree")
    })
    .await;
    app.seed_product(decor.id, "Bamboo Lamp", 950, 5).await;

    let body = response_json(
        app.request(Method::GET, "/api/v1/products/featured", None, None)
            .await,
    )
    .await;
    assert_eq!(names(&body["data"]), vec!["Baluchari Saree".to_string()]);

    let body = response_json(
        app.request(
            Method::GET,
            &format!("/api/v1/products/{}/related", tant.id),
            None,
            None,
        )
        .await,
    )
    .await;
    assert_eq!(names(&body["data"]), vec!["Baluchari Saree".to_string()]);
}

#[tokio::test]
async fn categories_and_banners() {
    let app = TestApp::new().await;
    let sarees = app.seed_category("Sarees").await;
    app.seed_product(sarees.id, "Tant Saree", 1800, 5).await;
    app.seed_product(sarees.id, "Batik Saree", 2400, 5).await;

    let now = Utc::now();
    for (title, sort_order, is_active) in [("Second", 2, true), ("First", 1, true), ("Hidden", 0, false)] {
        banner::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            description: Set(None),
            image: Set(format!("/img/{}.jpg", title)),
            link: Set(None),
            is_active: Set(is_active),
            sort_order: Set(sort_order),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*app.state.db)
        .await
        .expect("insert banner");
    }

    let body = response_json(app.request(Method::GET, "/api/v1/categories", None, None).await).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let body = response_json(
        app.request(
            Method::GET,
            &format!("/api/v1/categories/{}", sarees.id),
            None,
            None,
        )
        .await,
    )
    .await;
    assert_eq!(body["data"]["products_count"], 2);

    let body = response_json(app.request(Method::GET, "/api/v1/banners", None, None).await).await;
    let titles: Vec<&str> = body["data"]
        .as_array()
        .expect("banners")
        .iter()
        .filter_map(|b| b["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["First", "Second"]);
}

#[tokio::test]
async fn admin_routes_require_the_admin_role() {
    let app = TestApp::new().await;

    let anonymous = app.request(Method::GET, "/api/v1/admin/products", None, None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let customer = app
        .customer_request(Method::GET, "/api/v1/admin/products", None)
        .await;
    assert_eq!(customer.status(), StatusCode::FORBIDDEN);

    let admin = app.admin_request(Method::GET, "/api/v1/admin/products", None).await;
    assert_eq!(admin.status(), StatusCode::OK);

    let forged = app
        .request(Method::GET, "/api/v1/admin/products", None, Some("not-a-jwt"))
        .await;
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_product_lifecycle() {
    let app = TestApp::new().await;
    let category = app.seed_category("Leather Craft").await;

    let response = app
        .admin_request(
            Method::POST,
            "/api/v1/admin/products",
            Some(json!({
                "category_id": category.id,
                "name": "Tooled Leather Tote",
                "description": "Hand tooled",
                "price": 2200,
                "discount_price": 1980,
                "stock": 4,
                "image_urls": ["/img/tote-1.jpg", "/img/tote-2.jpg"]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await["data"].clone();
    assert_eq!(created["slug"], "tooled-leather-tote");
    assert_eq!(created["is_active"], true);
    let id = created["id"].as_str().expect("id").to_string();
    let uri = format!("/api/v1/admin/products/{}", id);

    let duplicate = app
        .admin_request(
            Method::POST,
            "/api/v1/admin/products",
            Some(json!({
                "category_id": category.id,
                "name": "Tooled Leather Tote",
                "description": "Copy",
                "price": 100
            })),
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let response = app
        .admin_request(
            Method::PUT,
            &uri,
            Some(json!({
                "name": "Tooled Tote Bag",
                "discount_price": null,
                "is_active": false,
                "image_urls": ["/img/tote-new.jpg"]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response_json(response).await["data"].clone();
    assert_eq!(updated["slug"], "tooled-tote-bag");
    assert_eq!(updated["discount_price"], Value::Null);
    assert_eq!(decimal(&updated["effective_price"]), dec!(2200));
    assert_eq!(updated["primary_image"], "/img/tote-new.jpg");
    assert_eq!(updated["images"].as_array().map(Vec::len), Some(1));

    // Inactive products disappear from the storefront but not from admin
    let public = app
        .request(Method::GET, &format!("/api/v1/products/{}", id), None, None)
        .await;
    assert_eq!(public.status(), StatusCode::NOT_FOUND);
    let admin = app.admin_request(Method::GET, &uri, None).await;
    assert_eq!(admin.status(), StatusCode::OK);

    let response = app.admin_request(Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.admin_request(Method::GET, &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_create_validates_input() {
    let app = TestApp::new().await;
    let category = app.seed_category("Sarees").await;

    let negative = app
        .admin_request(
            Method::POST,
            "/api/v1/admin/products",
            Some(json!({
                "category_id": category.id,
                "name": "Broken",
                "description": "Negative price",
                "price": -1
            })),
        )
        .await;
    assert_eq!(negative.status(), StatusCode::BAD_REQUEST);

    let unknown_category = app
        .admin_request(
            Method::POST,
            "/api/v1/admin/products",
            Some(json!({
                "category_id": Uuid::new_v4(),
                "name": "Orphan",
                "description": "No category",
                "price": 10
            })),
        )
        .await;
    assert_eq!(unknown_category.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_a_product_clears_carts_but_keeps_order_history() {
    let app = TestApp::new().await;
    let category = app.seed_category("Dokra").await;
    let horse = app.seed_product(category.id, "Dokra Horse", 1500, 5).await;

    app.state
        .services
        .cart
        .upsert_item(
            app.customer_id,
            AddToCartInput {
                product_id: horse.id,
                quantity: 1,
            },
        )
        .await
        .expect("add to cart");
    let response = app
        .customer_request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "payment_method": "online",
                "shipping_name": "Mitali Sen",
                "shipping_email": "mitali@example.com",
                "shipping_mobile": "9830012345",
                "shipping_address": "12 Purva Palli",
                "shipping_city": "Bolpur",
                "shipping_state": "West Bengal",
                "shipping_postal_code": "731204"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order_id = response_json(response).await["data"]["id"]
        .as_str()
        .expect("order id")
        .to_string();

    let other = Uuid::new_v4();
    app.state
        .services
        .cart
        .upsert_item(
            other,
            AddToCartInput {
                product_id: horse.id,
                quantity: 2,
            },
        )
        .await
        .expect("other cart");
    app.state
        .services
        .wishlist
        .add(other, horse.id)
        .await
        .expect("wishlist");

    let response = app
        .admin_request(
            Method::DELETE,
            &format!("/api/v1/admin/products/{}", horse.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(app.state.services.cart.get_cart(other).await.unwrap().items.is_empty());
    assert!(app.state.services.wishlist.list(other).await.unwrap().is_empty());

    let response = app
        .customer_request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["items"][0]["product_name"], "Dokra Horse");
}

#[tokio::test]
async fn payment_flow_marks_order_paid_once() {
    let app = TestApp::new().await;
    let category = app.seed_category("Sarees").await;
    let saree = app.seed_product(category.id, "Tant Saree", 1800, 5).await;

    let response = app
        .customer_request(
            Method::POST,
            "/api/v1/payments/create-order",
            Some(json!({ "amount": "1800.50" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let gateway = response_json(response).await["data"].clone();
    assert_eq!(gateway["amount"], 180050);
    assert_eq!(gateway["currency"], "INR");
    let gateway_order_id = gateway["gateway_order_id"].as_str().expect("id").to_string();
    assert!(gateway_order_id.starts_with("order_"));

    app.state
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
        .expect("add to cart");
    let response = app
        .customer_request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "payment_method": "razorpay",
                "shipping_name": "Mitali Sen",
                "shipping_email": "mitali@example.com",
                "shipping_mobile": "9830012345",
                "shipping_address": "12 Purva Palli",
                "shipping_city": "Bolpur",
                "shipping_state": "West Bengal",
                "shipping_postal_code": "731204"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = response_json(response).await["data"].clone();
    assert_eq!(order["payment_method"], "online");

    let verify = json!({
        "order_id": order["id"],
        "razorpay_order_id": gateway_order_id,
        "razorpay_payment_id": "pay_29QQoUBi66xm2f",
        "razorpay_signature": "sig"
    });

    let stranger = app.token_for(Uuid::new_v4());
    let response = app
        .request(
            Method::POST,
            "/api/v1/payments/verify",
            Some(verify.clone()),
            Some(&stranger),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .customer_request(Method::POST, "/api/v1/payments/verify", Some(verify.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let paid = response_json(response).await["data"].clone();
    assert_eq!(paid["payment_status"], "paid");
    assert_eq!(paid["status"], "confirmed");
    assert_eq!(paid["gateway_payment_id"], "pay_29QQoUBi66xm2f");

    let response = app
        .customer_request(Method::POST, "/api/v1/payments/verify", Some(verify))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn oversized_gateway_amounts_are_rejected() {
    let app = TestApp::new().await;

    // Decimal::MAX overflows when scaled; 10^17 scales but exceeds i64 minor units
    for amount in ["79228162514264337593543950335", "100000000000000000"] {
        let response = app
            .customer_request(
                Method::POST,
                "/api/v1/payments/create-order",
                Some(json!({ "amount": amount })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "amount {}", amount);
    }
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["paths"]["/api/v1/orders"].is_object());
}
