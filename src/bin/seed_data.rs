//! Seed data script - populates the storefront with demo catalog data
//!
//! Run with: cargo run --bin seed-data -- --database-url sqlite://storefront.db?mode=rwc
//!
//! This creates:
//! - 4 categories
//! - 3 homepage banners
//! - 10 products with images, some discounted and some featured
//!
//! Pass `--token-for <uuid>` (plus `--admin`) to print a bearer token for local testing.

use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use tracing::info;
use uuid::Uuid;

use storefront_api::{
    auth::{issue_token, TokenSubject},
    config::{init_tracing, AppConfig},
    db,
    entities::{banner, category, Category},
    events::{process_events, EventSender},
    services::catalog::{slugify, CatalogService, CreateProductInput},
};

#[derive(Debug, Parser)]
#[command(name = "seed-data", about = "Populate the storefront database with demo data")]
struct Args {
    /// Database to seed; falls back to APP__DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    /// Seed even when categories already exist
    #[arg(long)]
    force: bool,

    /// Print a bearer token for this user id after seeding
    #[arg(long)]
    token_for: Option<Uuid>,

    /// Make the printed token an admin token
    #[arg(long, requires = "token_for")]
    admin: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info", false);
    let args = Args::parse();

    let database_url = args
        .database_url
        .or_else(|| std::env::var("APP__DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://storefront.db?mode=rwc".to_string());
    let jwt_secret = std::env::var("APP__JWT_SECRET")
        .unwrap_or_else(|_| "local-seed-secret-0123456789abcdefghijklmnop".to_string());

    let config = Arc::new(AppConfig::new(
        database_url.clone(),
        jwt_secret,
        "127.0.0.1".to_string(),
        8080,
        "development".to_string(),
    ));

    info!("=== Storefront Seed Data ===");
    info!("Connecting to database: {}", database_url);
    let pool = db::establish_connection_from_app_config(&config).await?;
    db::run_migrations(&pool).await?;
    let pool = Arc::new(pool);

    let existing = Category::find().count(&*pool).await?;
    if existing > 0 && !args.force {
        info!(
            "Database already has {} categories; skipping (use --force to seed anyway)",
            existing
        );
    } else {
        let (event_sender, event_rx) = EventSender::channel(config.event_channel_capacity);
        let events = tokio::spawn(process_events(event_rx));
        let catalog = CatalogService::new(pool.clone(), Arc::new(event_sender), config.clone());

        info!("Creating categories...");
        let categories = create_categories(&pool).await?;
        info!("  Created {} categories", categories.len());

        info!("Creating banners...");
        let banners = create_banners(&pool).await?;
        info!("  Created {} banners", banners);

        info!("Creating products...");
        let products = create_products(&catalog, &categories).await?;
        info!("  Created {} products", products);

        // Closing the channel lets the event processor drain and exit
        drop(catalog);
        let _ = events.await;
    }

    if let Some(user_id) = args.token_for {
        let subject = if args.admin {
            TokenSubject::admin(user_id)
        } else {
            TokenSubject::customer(user_id)
        };
        let token = issue_token(&config, &subject)?;
        println!("{}", token);
    }

    info!("");
    info!("Try these API calls:");
    info!("  curl http://localhost:8080/api/v1/products");
    info!("  curl http://localhost:8080/api/v1/products/featured");
    info!("  curl http://localhost:8080/api/v1/categories");
    info!("Or explore interactively at: http://localhost:8080/swagger-ui");

    Ok(())
}

async fn create_categories(
    db: &sea_orm::DatabaseConnection,
) -> anyhow::Result<Vec<category::Model>> {
    let categories_data = [
        ("Sarees", "Hand-woven and block printed sarees"),
        ("Leather Craft", "Santiniketan tooled leather bags and wallets"),
        ("Kantha Stitch", "Running-stitch embroidery on cotton and silk"),
        ("Home Decor", "Terracotta, dokra and bamboo pieces"),
    ];

    let now = Utc::now();
    let mut created = Vec::new();

    for (position, (name, description)) in categories_data.into_iter().enumerate() {
        let slug = slugify(name);
        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            slug: Set(slug.clone()),
            description: Set(Some(description.to_string())),
            image: Set(Some(format!("/images/categories/{}.jpg", slug))),
            is_active: Set(true),
            sort_order: Set(position as i32),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
        created.push(model);
    }

    Ok(created)
}

async fn create_banners(db: &sea_orm::DatabaseConnection) -> anyhow::Result<usize> {
    let banners_data = [
        ("Poush Mela Collection", Some("/products?is_santiniketan=true")),
        ("Festive Sarees", Some("/categories/sarees")),
        ("Free shipping above 1000", None),
    ];

    let now = Utc::now();
    for (position, (title, link)) in banners_data.iter().enumerate() {
        banner::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            description: Set(None),
            image: Set(format!("/images/banners/{}.jpg", slugify(title))),
            link: Set(link.map(str::to_string)),
            is_active: Set(true),
            sort_order: Set(position as i32),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
    }

    Ok(banners_data.len())
}

async fn create_products(
    catalog: &CatalogService,
    categories: &[category::Model],
) -> anyhow::Result<usize> {
    // (category index, name, price, discount price, stock, featured)
    let products_data: [(usize, &str, Decimal, Option<Decimal>, i32, bool); 10] = [
        (0, "Baluchari Silk Saree", dec!(8500), Some(dec!(7650)), 4, true),
        (0, "Tant Cotton Saree", dec!(1800), None, 12, false),
        (0, "Batik Print Saree", dec!(2400), Some(dec!(2100)), 7, false),
        (1, "Tooled Leather Tote", dec!(2200), None, 9, true),
        (1, "Leather Card Wallet", dec!(450), Some(dec!(399)), 25, false),
        (2, "Kantha Stole", dec!(1200), None, 15, true),
        (2, "Kantha Cushion Cover", dec!(650), None, 20, false),
        (3, "Dokra Horse Pair", dec!(1500), Some(dec!(1350)), 6, true),
        (3, "Terracotta Wall Plate", dec!(800), None, 10, false),
        (3, "Bamboo Lamp Shade", dec!(950), None, 0, false),
    ];

    let mut count = 0;
    for (category_index, name, price, discount_price, stock, is_featured) in products_data {
        let category = &categories[category_index % categories.len()];
        let slug = slugify(name);
        catalog
            .create_product(CreateProductInput {
                category_id: category.id,
                name: name.to_string(),
                slug: None,
                description: format!("{} made by artisans around Santiniketan.", name),
                handmade_description: Some("Every piece is made by hand and varies slightly.".into()),
                price,
                discount_price,
                stock,
                sku: Some(format!("SB-{}", slug.to_uppercase())),
                is_santiniketan: true,
                is_featured,
                is_active: true,
                meta_title: Some(name.to_string()),
                meta_description: None,
                image_urls: vec![
                    format!("/images/products/{}-1.jpg", slug),
                    format!("/images/products/{}-2.jpg", slug),
                ],
            })
            .await?;
        count += 1;
    }

    Ok(count)
}
