pub mod admin_products;
pub mod banners;
pub mod cart;
pub mod categories;
pub mod common;
pub mod orders;
pub mod payments;
pub mod products;
pub mod wishlist;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    cart::CartService, catalog::CatalogService, orders::OrderService, payments::PaymentService,
    wishlist::WishlistService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub cart: Arc<CartService>,
    pub wishlist: Arc<WishlistService>,
    pub orders: Arc<OrderService>,
    pub payments: Arc<PaymentService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(
                db_pool.clone(),
                event_sender.clone(),
                config.clone(),
            )),
            cart: Arc::new(CartService::new(db_pool.clone(), event_sender.clone())),
            wishlist: Arc::new(WishlistService::new(db_pool.clone(), event_sender.clone())),
            orders: Arc::new(OrderService::new(
                db_pool.clone(),
                event_sender.clone(),
                config.clone(),
            )),
            payments: Arc::new(PaymentService::new(db_pool, event_sender, config)),
        }
    }
}
