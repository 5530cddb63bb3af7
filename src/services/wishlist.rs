use crate::{
    entities::{product, wishlist_item, Product, WishlistItem},
    errors::ServiceError,
    events::{Event, EventSender},
    services::catalog::{product_views, ProductView},
};
use chrono::Utc;
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AddToWishlistInput {
    pub product_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WishlistStatus {
    pub product_id: Uuid,
    pub in_wishlist: bool,
}

/// Per-user set of saved products.
#[derive(Clone)]
pub struct WishlistService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl WishlistService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn ensure_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        if Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }
        Ok(())
    }

    /// Inserts the pair unless it exists; returns whether a row was written.
    async fn insert_entry(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, ServiceError> {
        let entry = wishlist_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            product_id: Set(product_id),
            created_at: Set(Utc::now()),
        };

        let inserted = WishlistItem::insert(entry)
            .on_conflict(
                OnConflict::columns([
                    wishlist_item::Column::UserId,
                    wishlist_item::Column::ProductId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;

        Ok(inserted > 0)
    }

    async fn delete_entry(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, ServiceError> {
        let result = WishlistItem::delete_many()
            .filter(wishlist_item::Column::UserId.eq(user_id))
            .filter(wishlist_item::Column::ProductId.eq(product_id))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Saved products, most recently added first.
    #[instrument(skip(self))]
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<ProductView>, ServiceError> {
        let entries = WishlistItem::find()
            .filter(wishlist_item::Column::UserId.eq(user_id))
            .order_by_desc(wishlist_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let products = Product::find()
            .filter(product::Column::Id.is_in(entries.iter().map(|e| e.product_id)))
            .all(&*self.db)
            .await?;
        let mut views: HashMap<Uuid, ProductView> =
            product_views(&*self.db, products, Some(user_id))
                .await?
                .into_iter()
                .map(|view| (view.id, view))
                .collect();

        Ok(entries
            .iter()
            .filter_map(|entry| views.remove(&entry.product_id))
            .collect())
    }

    /// Idempotent add.
    #[instrument(skip(self))]
    pub async fn add(&self, user_id: Uuid, product_id: Uuid) -> Result<WishlistStatus, ServiceError> {
        self.ensure_product(product_id).await?;
        if self.insert_entry(user_id, product_id).await? {
            info!(%user_id, %product_id, "Added to wishlist");
        }
        Ok(WishlistStatus {
            product_id,
            in_wishlist: true,
        })
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<(), ServiceError> {
        if !self.delete_entry(user_id, product_id).await? {
            return Err(ServiceError::NotFound(format!(
                "Product {} is not in the wishlist",
                product_id
            )));
        }
        Ok(())
    }

    /// Removes the entry when present, otherwise adds it.
    ///
    /// The delete decides: a concurrent toggle that loses the race lands on the
    /// unique (user, product) index and leaves the product in the wishlist.
    #[instrument(skip(self))]
    pub async fn toggle(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<WishlistStatus, ServiceError> {
        let in_wishlist = if self.delete_entry(user_id, product_id).await? {
            false
        } else {
            self.ensure_product(product_id).await?;
            self.insert_entry(user_id, product_id).await?;
            true
        };

        self.event_sender
            .send_or_log(Event::WishlistToggled {
                user_id,
                product_id,
                in_wishlist,
            })
            .await;

        info!(%user_id, %product_id, in_wishlist, "Wishlist toggled");
        Ok(WishlistStatus {
            product_id,
            in_wishlist,
        })
    }
}
