#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::Value;
use storefront_api::{
    auth::{issue_token, TokenSubject},
    config::AppConfig,
    db,
    entities::{category, product, Product, ProductModel},
    events::{self, EventSender},
    services::catalog::{CreateProductInput, ProductView},
    AppState,
};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "storefront-test-secret-9f2c4e1a7b3d5f60";

/// Application state and router backed by a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub customer_id: Uuid,
    customer_token: String,
    admin_token: String,
    _event_task: tokio::task::JoinHandle<()>,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db_path = dir.path().join("storefront_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single connection keeps SQLite writers serialized
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_sender, event_rx) = EventSender::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let config = Arc::new(cfg);
        let state = AppState::new(Arc::new(pool), config.clone(), Arc::new(event_sender));
        let router = storefront_api::build_router(state.clone());

        let customer_id = Uuid::new_v4();
        let customer_token = issue_token(&config, &TokenSubject::customer(customer_id))
            .expect("issue customer token");
        let admin_token =
            issue_token(&config, &TokenSubject::admin(Uuid::new_v4())).expect("issue admin token");

        Self {
            router,
            state,
            customer_id,
            customer_token,
            admin_token,
            _event_task: event_task,
            _dir: dir,
        }
    }

    pub fn customer_token(&self) -> &str {
        &self.customer_token
    }

    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    /// Token for an arbitrary customer.
    pub fn token_for(&self, user_id: Uuid) -> String {
        issue_token(&self.state.config, &TokenSubject::customer(user_id)).expect("issue token")
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Request as the default customer.
    pub async fn customer_request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request(method, uri, body, Some(self.customer_token())).await
    }

    pub async fn admin_request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request(method, uri, body, Some(self.admin_token())).await
    }

    pub async fn seed_category(&self, name: &str) -> category::Model {
        let now = Utc::now();
        category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            slug: Set(storefront_api::services::catalog::slugify(name)),
            description: Set(None),
            image: Set(None),
            is_active: Set(true),
            sort_order: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed category")
    }

    /// Active product with one image and no discount.
    pub async fn seed_product(
        &self,
        category_id: Uuid,
        name: &str,
        price: i64,
        stock: i32,
    ) -> ProductView {
        self.seed_product_with(CreateProductInput {
            category_id,
            name: name.to_string(),
            slug: None,
            description: format!("{} for tests", name),
            handmade_description: None,
            price: Decimal::from(price),
            discount_price: None,
            stock,
            sku: None,
            is_santiniketan: false,
            is_featured: false,
            is_active: true,
            meta_title: None,
            meta_description: None,
            image_urls: vec![format!("/img/{}.jpg", storefront_api::services::catalog::slugify(name))],
        })
        .await
    }

    pub async fn seed_product_with(&self, input: CreateProductInput) -> ProductView {
        self.state
            .services
            .catalog
            .create_product(input)
            .await
            .expect("seed product")
    }

    pub async fn product(&self, id: Uuid) -> ProductModel {
        Product::find_by_id(id)
            .one(&*self.state.db)
            .await
            .expect("load product")
            .expect("product exists")
    }

    /// Overwrites stock behind the cart's back.
    pub async fn set_stock(&self, id: Uuid, stock: i32) {
        let mut active: product::ActiveModel = self.product(id).await.into();
        active.stock = Set(stock);
        active.update(&*self.state.db).await.expect("update stock");
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Parses a decimal serialized as a JSON string or number.
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("expected decimal, got {}", other),
    }
}
