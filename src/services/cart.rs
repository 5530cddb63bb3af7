use crate::{
    entities::{cart_item, product, CartItem, CartItemModel, Product, ProductModel},
    errors::ServiceError,
    events::{Event, EventSender},
    services::catalog::{product_views, ProductView},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct AddToCartInput {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateCartItemInput {
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// quantity × effective price
    pub line_total: Decimal,
    pub product: ProductView,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartLine {
    fn new(item: CartItemModel, product: ProductView) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            line_total: product.effective_price * Decimal::from(item.quantity),
            product,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal: Decimal,
}

impl CartView {
    fn from_lines(items: Vec<CartLine>) -> Self {
        Self {
            item_count: items.len(),
            total_quantity: items.iter().map(|line| i64::from(line.quantity)).sum(),
            subtotal: items.iter().map(|line| line.line_total).sum(),
            items,
        }
    }
}

/// Per-user cart ledger. Quantities are overwritten, never accumulated, and
/// every write is checked against the product's current stock.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Point-in-time stock check; checkout re-verifies when it decrements.
    fn ensure_stock(product: &ProductModel, quantity: i32) -> Result<(), ServiceError> {
        if quantity > product.stock {
            metrics::counter!("storefront.cart.rejected_insufficient_stock", 1);
            warn!(
                product_id = %product.id,
                requested = quantity,
                available = product.stock,
                "Rejected cart quantity above stock"
            );
            return Err(ServiceError::InsufficientStock(format!(
                "only {} of '{}' available",
                product.stock.max(0),
                product.name
            )));
        }
        Ok(())
    }

    async fn find_active_product(&self, product_id: Uuid) -> Result<ProductModel, ServiceError> {
        Product::find_by_id(product_id)
            .filter(product::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    async fn find_owned_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Result<CartItemModel, ServiceError> {
        CartItem::find_by_id(item_id)
            .filter(cart_item::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))
    }

    async fn line(
        &self,
        user_id: Uuid,
        item: CartItemModel,
        product: ProductModel,
    ) -> Result<CartLine, ServiceError> {
        let view = product_views(&*self.db, vec![product], Some(user_id))
            .await?
            .pop()
            .ok_or_else(|| ServiceError::InternalError("product view was not built".to_string()))?;
        Ok(CartLine::new(item, view))
    }

    /// The user's cart lines in insertion order with the running subtotal.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: Uuid) -> Result<CartView, ServiceError> {
        let items = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .order_by_asc(cart_item::Column::Id)
            .all(&*self.db)
            .await?;

        if items.is_empty() {
            return Ok(CartView::from_lines(Vec::new()));
        }

        let products = Product::find()
            .filter(product::Column::Id.is_in(items.iter().map(|i| i.product_id)))
            .all(&*self.db)
            .await?;
        let mut views: HashMap<Uuid, ProductView> =
            product_views(&*self.db, products, Some(user_id))
                .await?
                .into_iter()
                .map(|view| (view.id, view))
                .collect();

        let lines = items
            .into_iter()
            .filter_map(|item| {
                let view = views.remove(&item.product_id)?;
                Some(CartLine::new(item, view))
            })
            .collect();

        Ok(CartView::from_lines(lines))
    }

    /// Adds a product or overwrites the quantity of the existing line.
    #[instrument(skip(self))]
    pub async fn upsert_item(
        &self,
        user_id: Uuid,
        input: AddToCartInput,
    ) -> Result<CartLine, ServiceError> {
        input.validate()?;
        let product = self.find_active_product(input.product_id).await?;
        Self::ensure_stock(&product, input.quantity)?;

        let now = Utc::now();
        let line = cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            product_id: Set(product.id),
            quantity: Set(input.quantity),
            created_at: Set(now),
            updated_at: Set(now),
        };

        CartItem::insert(line)
            .on_conflict(
                OnConflict::columns([cart_item::Column::UserId, cart_item::Column::ProductId])
                    .update_columns([cart_item::Column::Quantity, cart_item::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;

        let item = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(product.id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::InternalError("cart line missing after upsert".into()))?;

        self.event_sender
            .send_or_log(Event::CartItemUpserted {
                user_id,
                product_id: product.id,
                quantity: item.quantity,
            })
            .await;

        info!(%user_id, product_id = %product.id, quantity = item.quantity, "Cart line saved");
        self.line(user_id, item, product).await
    }

    /// Sets the quantity of a line owned by `user_id`.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        input: UpdateCartItemInput,
    ) -> Result<CartLine, ServiceError> {
        input.validate()?;
        let item = self.find_owned_item(user_id, item_id).await?;
        let product = self.find_active_product(item.product_id).await?;
        Self::ensure_stock(&product, input.quantity)?;

        let mut active: cart_item::ActiveModel = item.into();
        active.quantity = Set(input.quantity);
        active.updated_at = Set(Utc::now());
        let item = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartItemUpserted {
                user_id,
                product_id: product.id,
                quantity: item.quantity,
            })
            .await;

        self.line(user_id, item, product).await
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<(), ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::Id.eq(item_id))
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Cart item {} not found",
                item_id
            )));
        }

        self.event_sender
            .send_or_log(Event::CartItemRemoved {
                user_id,
                cart_item_id: item_id,
            })
            .await;
        Ok(())
    }

    /// Empties the cart, returning how many lines were removed.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;

        self.event_sender
            .send_or_log(Event::CartCleared {
                user_id,
                removed: result.rows_affected,
            })
            .await;

        info!(%user_id, removed = result.rows_affected, "Cart cleared");
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn product(stock: i32) -> ProductModel {
        let now = Utc::now();
        ProductModel {
            id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            name: "Kantha Dupatta".into(),
            slug: "kantha-dupatta".into(),
            description: "Hand embroidered".into(),
            handmade_description: None,
            price: Decimal::from(100),
            discount_price: None,
            stock,
            sku: None,
            is_santiniketan: true,
            is_featured: false,
            is_active: true,
            meta_title: None,
            meta_description: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn stock_guard_allows_exact_quantity() {
        assert!(CartService::ensure_stock(&product(3), 3).is_ok());
    }

    #[test]
    fn stock_guard_rejects_excess_quantity() {
        assert_matches!(
            CartService::ensure_stock(&product(2), 3),
            Err(ServiceError::InsufficientStock(_))
        );
    }

    #[test]
    fn zero_quantity_fails_validation() {
        let input = AddToCartInput {
            product_id: Uuid::new_v4(),
            quantity: 0,
        };
        assert!(input.validate().is_err());
    }
}
