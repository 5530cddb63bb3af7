use crate::{
    config::AppConfig,
    entities::{
        category, product, product_image, wishlist_item, BannerModel, CartItem, Category,
        CategoryModel, Product, ProductImage, ProductImageModel, ProductModel, WishlistItem,
    },
    entities::{banner, cart_item, Banner},
    errors::ServiceError,
    events::{Event, EventSender},
    PaginatedResponse,
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

static NON_SLUG_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new("[^a-z0-9]+").expect("slug pattern is valid"));

/// Lowercases `value` and joins its alphanumeric runs with single hyphens.
pub fn slugify(value: &str) -> String {
    NON_SLUG_CHARS
        .replace_all(&value.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Keeps `Some(None)` for an explicit JSON null so updates can clear a field.
fn explicit_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<&CategoryModel> for CategorySummary {
    fn from(category: &CategoryModel) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductImageView {
    pub id: Uuid,
    pub url: String,
    pub position: i32,
    pub is_primary: bool,
}

/// Product as rendered to storefront and admin clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductView {
    pub id: Uuid,
    pub category_id: Uuid,
    pub category: Option<CategorySummary>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub handmade_description: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub effective_price: Decimal,
    pub discount_percentage: i32,
    pub stock: i32,
    pub sku: Option<String>,
    pub is_santiniketan: bool,
    pub is_featured: bool,
    pub is_active: bool,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub images: Vec<ProductImageView>,
    pub primary_image: Option<String>,
    pub in_wishlist: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductView {
    /// `images` must already be in display order; the first one is primary.
    pub fn build(
        product: &ProductModel,
        category: Option<&CategoryModel>,
        images: &[ProductImageModel],
        in_wishlist: bool,
    ) -> Self {
        let images: Vec<ProductImageView> = images
            .iter()
            .enumerate()
            .map(|(idx, image)| ProductImageView {
                id: image.id,
                url: image.image_url.clone(),
                position: image.position,
                is_primary: idx == 0,
            })
            .collect();

        Self {
            id: product.id,
            category_id: product.category_id,
            category: category.map(CategorySummary::from),
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            handmade_description: product.handmade_description.clone(),
            price: product.price,
            discount_price: product.discount_price,
            effective_price: product.effective_price(),
            discount_percentage: product.discount_percentage(),
            stock: product.stock,
            sku: product.sku.clone(),
            is_santiniketan: product.is_santiniketan,
            is_featured: product.is_featured,
            is_active: product.is_active,
            meta_title: product.meta_title.clone(),
            meta_description: product.meta_description.clone(),
            primary_image: images.first().map(|image| image.url.clone()),
            images,
            in_wishlist,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Loads categories, ordered images and wishlist flags for a batch of products,
/// preserving the order of `products`.
pub(crate) async fn product_views<C: ConnectionTrait>(
    conn: &C,
    products: Vec<ProductModel>,
    viewer: Option<Uuid>,
) -> Result<Vec<ProductView>, ServiceError> {
    if products.is_empty() {
        return Ok(Vec::new());
    }

    let product_ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let category_ids: Vec<Uuid> = products
        .iter()
        .map(|p| p.category_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let categories: HashMap<Uuid, CategoryModel> = Category::find()
        .filter(category::Column::Id.is_in(category_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let mut images: HashMap<Uuid, Vec<ProductImageModel>> = HashMap::new();
    for image in ProductImage::find()
        .filter(product_image::Column::ProductId.is_in(product_ids.clone()))
        .order_by_asc(product_image::Column::Position)
        .order_by_asc(product_image::Column::CreatedAt)
        .all(conn)
        .await?
    {
        images.entry(image.product_id).or_default().push(image);
    }

    let wishlisted: HashSet<Uuid> = match viewer {
        Some(user_id) => WishlistItem::find()
            .filter(wishlist_item::Column::UserId.eq(user_id))
            .filter(wishlist_item::Column::ProductId.is_in(product_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|w| w.product_id)
            .collect(),
        None => HashSet::new(),
    };

    Ok(products
        .iter()
        .map(|p| {
            ProductView::build(
                p,
                categories.get(&p.category_id),
                images.get(&p.id).map(Vec::as_slice).unwrap_or_default(),
                wishlisted.contains(&p.id),
            )
        })
        .collect())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    #[default]
    CreatedAt,
    Price,
    Name,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl From<SortOrder> for sea_orm::Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => sea_orm::Order::Asc,
            SortOrder::Desc => sea_orm::Order::Desc,
        }
    }
}

/// Storefront product listing query.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub is_santiniketan: Option<bool>,
    pub is_featured: Option<bool>,
    /// Lower bound on list price
    #[param(value_type = Option<f64>)]
    pub min_price: Option<Decimal>,
    /// Upper bound on list price
    #[param(value_type = Option<f64>)]
    pub max_price: Option<Decimal>,
    /// Case-insensitive match on name or description
    pub search: Option<String>,
    #[param(inline)]
    pub sort_by: Option<ProductSortBy>,
    #[param(inline)]
    pub sort_order: Option<SortOrder>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl ProductFilter {
    fn condition(&self) -> Condition {
        let mut condition = Condition::all().add(product::Column::IsActive.eq(true));

        if let Some(category_id) = self.category_id {
            condition = condition.add(product::Column::CategoryId.eq(category_id));
        }
        if let Some(flag) = self.is_santiniketan {
            condition = condition.add(product::Column::IsSantiniketan.eq(flag));
        }
        if let Some(flag) = self.is_featured {
            condition = condition.add(product::Column::IsFeatured.eq(flag));
        }
        if let Some(min) = self.min_price {
            condition = condition.add(product::Column::Price.gte(min));
        }
        if let Some(max) = self.max_price {
            condition = condition.add(product::Column::Price.lte(max));
        }
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", term.to_lowercase());
            condition = condition.add(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            product::Entity,
                            product::Column::Name,
                        ))))
                        .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            product::Entity,
                            product::Column::Description,
                        ))))
                        .like(pattern),
                    ),
            );
        }

        condition
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub sort_order: i32,
    /// Active products in the category; only set on the detail endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products_count: Option<u64>,
}

impl From<CategoryModel> for CategoryView {
    fn from(category: CategoryModel) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            image: category.image,
            sort_order: category.sort_order,
            products_count: None,
        }
    }
}

/// Admin product creation payload. `image_urls` are stored in order; the first is primary.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateProductInput {
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub slug: Option<String>,
    #[validate(length(min = 1))]
    pub description: String,
    pub handmade_description: Option<String>,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = Option<f64>)]
    pub discount_price: Option<Decimal>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: i32,
    #[validate(length(max = 100))]
    pub sku: Option<String>,
    #[serde(default)]
    pub is_santiniketan: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[validate(length(max = 255))]
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// Partial admin update. Nullable columns accept an explicit `null` to clear them.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductInput {
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub slug: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    #[schema(value_type = Option<String>)]
    pub handmade_description: Option<Option<String>>,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "explicit_null")]
    #[schema(value_type = Option<f64>)]
    pub discount_price: Option<Option<Decimal>>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    #[serde(default, deserialize_with = "explicit_null")]
    #[schema(value_type = Option<String>)]
    pub sku: Option<Option<String>>,
    pub is_santiniketan: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "explicit_null")]
    #[schema(value_type = Option<String>)]
    pub meta_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    #[schema(value_type = Option<String>)]
    pub meta_description: Option<Option<String>>,
    pub image_urls: Option<Vec<String>>,
}

impl UpdateProductInput {
    /// Checks the clearable fields the derive cannot reach.
    fn validate_nullable(&self) -> Result<(), ServiceError> {
        if let Some(Some(discount)) = self.discount_price {
            if discount.is_sign_negative() && !discount.is_zero() {
                return Err(ServiceError::field("discount_price", "must not be negative"));
            }
        }
        if let Some(Some(sku)) = &self.sku {
            if sku.chars().count() > 100 {
                return Err(ServiceError::field("sku", "must be at most 100 characters"));
            }
        }
        if let Some(Some(title)) = &self.meta_title {
            if title.chars().count() > 255 {
                return Err(ServiceError::field("meta_title", "must be at most 255 characters"));
            }
        }
        Ok(())
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn clean_image_urls(urls: Vec<String>) -> Vec<String> {
    urls.into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect()
}

fn resolve_slug(explicit: Option<&str>, name: &str) -> Result<String, ServiceError> {
    let slug = slugify(explicit.unwrap_or(name));
    if slug.is_empty() {
        return Err(ServiceError::field(
            "slug",
            "must contain at least one letter or digit",
        ));
    }
    Ok(slug)
}

async fn insert_images<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    urls: &[String],
) -> Result<(), ServiceError> {
    let now = Utc::now();
    for (position, url) in urls.iter().enumerate() {
        product_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            image_url: Set(url.clone()),
            position: Set(position as i32),
            created_at: Set(now),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

/// Catalog reads for the storefront and product management for admins.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

impl CatalogService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            event_sender,
            config,
        }
    }

    /// Active products matching `filter`, paginated.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
        viewer: Option<Uuid>,
    ) -> Result<PaginatedResponse<ProductView>, ServiceError> {
        let page = filter.page.unwrap_or(1).max(1);
        let per_page = self
            .config
            .page_size(filter.per_page, self.config.catalog_page_size);
        let order: sea_orm::Order = filter.sort_order.unwrap_or_default().into();

        let mut query = Product::find().filter(filter.condition());
        query = match filter.sort_by.unwrap_or_default() {
            ProductSortBy::CreatedAt => query.order_by(product::Column::CreatedAt, order),
            ProductSortBy::Price => query.order_by(product::Column::Price, order),
            ProductSortBy::Name => query.order_by(product::Column::Name, order),
        };
        let query = query.order_by_asc(product::Column::Id);

        let paginator = query.paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;
        let items = product_views(&*self.db, products, viewer).await?;

        Ok(PaginatedResponse::new(items, total, page, per_page))
    }

    /// Newest active featured products.
    #[instrument(skip(self))]
    pub async fn featured_products(
        &self,
        viewer: Option<Uuid>,
    ) -> Result<Vec<ProductView>, ServiceError> {
        let products = Product::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::IsFeatured.eq(true))
            .order_by_desc(product::Column::CreatedAt)
            .limit(self.config.featured_limit)
            .all(&*self.db)
            .await?;

        product_views(&*self.db, products, viewer).await
    }

    async fn find_active(&self, product_id: Uuid) -> Result<ProductModel, ServiceError> {
        Product::find_by_id(product_id)
            .filter(product::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    async fn view_one<C: ConnectionTrait>(
        conn: &C,
        product: ProductModel,
        viewer: Option<Uuid>,
    ) -> Result<ProductView, ServiceError> {
        product_views(conn, vec![product], viewer)
            .await?
            .pop()
            .ok_or_else(|| ServiceError::InternalError("product view was not built".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn get_product(
        &self,
        product_id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<ProductView, ServiceError> {
        let product = self.find_active(product_id).await?;
        Self::view_one(&*self.db, product, viewer).await
    }

    /// Other active products in the same category.
    #[instrument(skip(self))]
    pub async fn related_products(
        &self,
        product_id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<Vec<ProductView>, ServiceError> {
        let product = self.find_active(product_id).await?;

        let related = Product::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::CategoryId.eq(product.category_id))
            .filter(product::Column::Id.ne(product.id))
            .order_by_desc(product::Column::CreatedAt)
            .limit(self.config.related_limit)
            .all(&*self.db)
            .await?;

        product_views(&*self.db, related, viewer).await
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CategoryView>, ServiceError> {
        let categories = Category::find()
            .filter(category::Column::IsActive.eq(true))
            .order_by_asc(category::Column::SortOrder)
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;

        Ok(categories.into_iter().map(CategoryView::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, category_id: Uuid) -> Result<CategoryView, ServiceError> {
        let category = Category::find_by_id(category_id)
            .filter(category::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))?;

        let count = Product::find()
            .filter(product::Column::CategoryId.eq(category.id))
            .filter(product::Column::IsActive.eq(true))
            .count(&*self.db)
            .await?;

        let mut view = CategoryView::from(category);
        view.products_count = Some(count);
        Ok(view)
    }

    #[instrument(skip(self))]
    pub async fn list_banners(&self) -> Result<Vec<BannerModel>, ServiceError> {
        Ok(Banner::find()
            .filter(banner::Column::IsActive.eq(true))
            .order_by_asc(banner::Column::SortOrder)
            .all(&*self.db)
            .await?)
    }

    /// Every product regardless of status, newest first.
    #[instrument(skip(self))]
    pub async fn admin_list_products(
        &self,
        page: Option<u64>,
        per_page: Option<u64>,
    ) -> Result<PaginatedResponse<ProductView>, ServiceError> {
        let page = page.unwrap_or(1).max(1);
        let per_page = self.config.page_size(per_page, self.config.admin_page_size);

        let paginator = Product::find()
            .order_by_desc(product::Column::CreatedAt)
            .order_by_asc(product::Column::Id)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;
        let items = product_views(&*self.db, products, None).await?;

        Ok(PaginatedResponse::new(items, total, page, per_page))
    }

    #[instrument(skip(self))]
    pub async fn admin_get_product(&self, product_id: Uuid) -> Result<ProductView, ServiceError> {
        let product = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;
        Self::view_one(&*self.db, product, None).await
    }

    async fn ensure_category<C: ConnectionTrait>(
        conn: &C,
        category_id: Uuid,
    ) -> Result<(), ServiceError> {
        if Category::find_by_id(category_id).one(conn).await?.is_none() {
            return Err(ServiceError::field("category_id", "category does not exist"));
        }
        Ok(())
    }

    async fn ensure_unique_slug<C: ConnectionTrait>(
        conn: &C,
        slug: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = Product::find().filter(product::Column::Slug.eq(slug));
        if let Some(id) = exclude {
            query = query.filter(product::Column::Id.ne(id));
        }
        if query.one(conn).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Product slug '{}' is already taken",
                slug
            )));
        }
        Ok(())
    }

    /// Creates a product and its image sequence in one transaction.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductView, ServiceError> {
        input.validate()?;
        let slug = resolve_slug(input.slug.as_deref(), &input.name)?;
        let image_urls = clean_image_urls(input.image_urls);

        let txn = self.db.begin().await?;
        Self::ensure_category(&txn, input.category_id).await?;
        Self::ensure_unique_slug(&txn, &slug, None).await?;

        let now = Utc::now();
        let product_id = Uuid::new_v4();
        let created = product::ActiveModel {
            id: Set(product_id),
            category_id: Set(input.category_id),
            name: Set(input.name),
            slug: Set(slug.clone()),
            description: Set(input.description),
            handmade_description: Set(input.handmade_description),
            price: Set(input.price),
            discount_price: Set(input.discount_price),
            stock: Set(input.stock),
            sku: Set(input.sku),
            is_santiniketan: Set(input.is_santiniketan),
            is_featured: Set(input.is_featured),
            is_active: Set(input.is_active),
            meta_title: Set(input.meta_title),
            meta_description: Set(input.meta_description),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict(format!("Product slug '{}' is already taken", slug))
            } else {
                ServiceError::from(e)
            }
        })?;

        insert_images(&txn, product_id, &image_urls).await?;
        let view = Self::view_one(&txn, created, None).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product_id))
            .await;

        info!(%product_id, slug = %view.slug, images = view.images.len(), "Created product");
        Ok(view)
    }

    /// Applies a partial update. Supplying `image_urls` replaces the whole image sequence.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<ProductView, ServiceError> {
        input.validate()?;
        input.validate_nullable()?;

        let txn = self.db.begin().await?;
        let existing = Product::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let new_slug = match (&input.slug, &input.name) {
            (Some(slug), _) => Some(resolve_slug(Some(slug.as_str()), slug)?),
            (None, Some(name)) if *name != existing.name => Some(resolve_slug(None, name)?),
            _ => None,
        };
        if let Some(slug) = &new_slug {
            Self::ensure_unique_slug(&txn, slug, Some(product_id)).await?;
        }
        if let Some(category_id) = input.category_id {
            Self::ensure_category(&txn, category_id).await?;
        }

        let mut active: product::ActiveModel = existing.into();
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(slug) = new_slug {
            active.slug = Set(slug);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(handmade) = input.handmade_description {
            active.handmade_description = Set(handmade);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(discount) = input.discount_price {
            active.discount_price = Set(discount);
        }
        if let Some(stock) = input.stock {
            active.stock = Set(stock);
        }
        if let Some(sku) = input.sku {
            active.sku = Set(sku);
        }
        if let Some(flag) = input.is_santiniketan {
            active.is_santiniketan = Set(flag);
        }
        if let Some(flag) = input.is_featured {
            active.is_featured = Set(flag);
        }
        if let Some(flag) = input.is_active {
            active.is_active = Set(flag);
        }
        if let Some(title) = input.meta_title {
            active.meta_title = Set(title);
        }
        if let Some(description) = input.meta_description {
            active.meta_description = Set(description);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict("Product slug is already taken".to_string())
            } else {
                ServiceError::from(e)
            }
        })?;

        if let Some(urls) = input.image_urls {
            ProductImage::delete_many()
                .filter(product_image::Column::ProductId.eq(product_id))
                .exec(&txn)
                .await?;
            insert_images(&txn, product_id, &clean_image_urls(urls)).await?;
        }

        let view = Self::view_one(&txn, updated, None).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;

        info!(%product_id, "Updated product");
        Ok(view)
    }

    /// Removes a product with its images, cart lines and wishlist entries.
    /// Order items keep their snapshot and are not touched.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        if Product::find_by_id(product_id).one(&txn).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }

        let carts = CartItem::delete_many()
            .filter(cart_item::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
        let wishlists = WishlistItem::delete_many()
            .filter(wishlist_item::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
        ProductImage::delete_many()
            .filter(product_image::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
        Product::delete_by_id(product_id).exec(&txn).await?;

        txn.commit().await?;

        if carts.rows_affected > 0 {
            warn!(
                %product_id,
                cart_lines = carts.rows_affected,
                "Deleted product was still in customer carts"
            );
        }

        self.event_sender
            .send_or_log(Event::ProductDeleted(product_id))
            .await;

        info!(
            %product_id,
            wishlist_entries = wishlists.rows_affected,
            "Deleted product"
        );
        Ok(())
    }
}
