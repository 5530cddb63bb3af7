/*!
 * # Order placement
 *
 * Converts a user's cart into an order in one database transaction:
 *
 * 1. Read the cart lines and their products inside the transaction.
 * 2. Price every line at the product's effective price and total the order
 *    (discount and shipping are fixed at zero).
 * 3. Insert the order under a fresh order number, then one snapshot item per
 *    line, decrementing stock with a conditional `stock >= qty` update.
 * 4. Delete the user's cart lines and commit.
 *
 * Any failure drops the transaction, which rolls everything back. A clash on
 * the unique order number retries the whole unit a bounded number of times.
 */

use crate::{
    config::AppConfig,
    entities::{
        cart_item, order, order_item, product, product_image, CartItem, Order, OrderItem,
        OrderItemModel, OrderModel, OrderStatus, PaymentMethod, PaymentStatus, Product,
        ProductImage, ProductModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    middleware_helpers::retry::{with_retry, RetryConfig},
    PaginatedResponse,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

const ORDER_NUMBER_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ORDER_NUMBER_TOKEN_LEN: usize = 8;

/// `{prefix}-{YYMMDD}-{8 random uppercase alphanumerics}`
pub fn generate_order_number(prefix: &str, at: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let token: String = (0..ORDER_NUMBER_TOKEN_LEN)
        .map(|_| ORDER_NUMBER_ALPHABET[rng.gen_range(0..ORDER_NUMBER_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}-{}", prefix, at.format("%y%m%d"), token)
}

/// Monetary summary of an order. `total` is always `subtotal - discount + shipping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    pub fn compute(subtotal: Decimal, discount: Decimal, shipping: Decimal) -> Self {
        Self {
            subtotal,
            discount,
            shipping,
            total: subtotal - discount + shipping,
        }
    }

    /// Sums `(unit price, quantity)` lines. No coupon or shipping rules exist yet.
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = (Decimal, i32)>,
    {
        let subtotal = lines
            .into_iter()
            .map(|(price, quantity)| line_total(price, quantity))
            .sum();
        Self::compute(subtotal, Decimal::ZERO, Decimal::ZERO)
    }
}

pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Shipping address captured on the order, independent of any profile data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingDetails {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Validated checkout request, ready for the order transaction.
#[derive(Debug, Clone)]
pub struct PlaceOrderCommand {
    pub user_id: Uuid,
    pub payment_method: PaymentMethod,
    pub shipping: ShippingDetails,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_image: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub total: Decimal,
}

impl From<OrderItemModel> for OrderItemView {
    fn from(item: OrderItemModel) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            product_image: item.product_image,
            price: item.price,
            quantity: item.quantity,
            total: item.total,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShippingAddressView {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderView {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddressView,
    pub notes: Option<String>,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub items: Vec<OrderItemView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderView {
    pub fn new(order: OrderModel, items: Vec<OrderItemModel>) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            user_id: order.user_id,
            subtotal: order.subtotal,
            discount: order.discount,
            shipping: order.shipping,
            total: order.total,
            payment_method: order.payment_method,
            payment_status: order.payment_status,
            status: order.status,
            shipping_address: ShippingAddressView {
                name: order.shipping_name,
                email: order.shipping_email,
                mobile: order.shipping_mobile,
                address: order.shipping_address,
                city: order.shipping_city,
                state: order.shipping_state,
                postal_code: order.shipping_postal_code,
                country: order.shipping_country,
            },
            notes: order.notes,
            gateway_order_id: order.gateway_order_id,
            gateway_payment_id: order.gateway_payment_id,
            items: items.into_iter().map(OrderItemView::from).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Attaches items to each order, preserving the order of `orders`.
pub(crate) async fn order_views<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
) -> Result<Vec<OrderView>, ServiceError> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let mut items: HashMap<Uuid, Vec<OrderItemModel>> = HashMap::new();
    for item in OrderItem::find()
        .filter(order_item::Column::OrderId.is_in(orders.iter().map(|o| o.id)))
        .order_by_asc(order_item::Column::CreatedAt)
        .order_by_asc(order_item::Column::Id)
        .all(conn)
        .await?
    {
        items.entry(item.order_id).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let lines = items.remove(&order.id).unwrap_or_default();
            OrderView::new(order, lines)
        })
        .collect())
}

/// True when `err` is a unique violation, which during placement can only be
/// the order number.
pub fn is_order_number_clash(err: &ServiceError) -> bool {
    match err {
        ServiceError::DatabaseError(db) => {
            matches!(db.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        }
        _ => false,
    }
}

/// Errors unless the cart delete removed exactly the lines that were priced.
///
/// A shortfall means a concurrent checkout consumed the same cart.
fn ensure_cart_consumed(expected: usize, deleted: u64) -> Result<(), ServiceError> {
    if deleted == expected as u64 {
        Ok(())
    } else {
        Err(ServiceError::Conflict(format!(
            "cart changed during checkout: expected {} lines, removed {}",
            expected, deleted
        )))
    }
}

/// Builds an order number from the configured prefix and the placement time.
pub type OrderNumberGenerator = fn(&str, DateTime<Utc>) -> String;

/// A priced cart line, read inside the transaction.
struct PricedLine {
    product: ProductModel,
    image: Option<String>,
    unit_price: Decimal,
    quantity: i32,
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
    order_numbers: OrderNumberGenerator,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            event_sender,
            config,
            order_numbers: generate_order_number,
        }
    }

    /// Replaces the order-number generator.
    pub fn with_order_number_generator(mut self, generator: OrderNumberGenerator) -> Self {
        self.order_numbers = generator;
        self
    }

    /// Places an order from the user's cart.
    ///
    /// Fails with `ValidationError` for an empty cart and `InsufficientStock` when
    /// a line can no longer be covered; neither leaves anything behind. A cart
    /// consumed by a concurrent checkout gives `Conflict`. Storage failures
    /// surface as `TransactionFailed`.
    #[instrument(skip(self, command), fields(user_id = %command.user_id))]
    pub async fn place_order(&self, command: PlaceOrderCommand) -> Result<OrderView, ServiceError> {
        let started = Instant::now();

        let result = with_retry(&RetryConfig::default(), is_order_number_clash, || {
            self.place_order_once(&command)
        })
        .await;

        match result {
            Ok(view) => {
                metrics::counter!("storefront.orders.placed", 1);
                metrics::histogram!(
                    "storefront.orders.place_duration",
                    started.elapsed().as_secs_f64()
                );

                self.event_sender
                    .send_or_log(Event::OrderPlaced {
                        order_id: view.id,
                        order_number: view.order_number.clone(),
                        user_id: view.user_id,
                        total: view.total,
                        item_count: view.items.len(),
                    })
                    .await;

                info!(
                    order_id = %view.id,
                    order_number = %view.order_number,
                    total = %view.total,
                    "Order placed"
                );
                Ok(view)
            }
            Err(err) => {
                metrics::counter!("storefront.orders.failed", 1);
                match err {
                    ServiceError::DatabaseError(db) => {
                        error!(error = %db, "Order transaction rolled back");
                        Err(ServiceError::TransactionFailed(db.to_string()))
                    }
                    other => {
                        warn!(error = %other, "Order rejected");
                        Err(other)
                    }
                }
            }
        }
    }

    async fn place_order_once(
        &self,
        command: &PlaceOrderCommand,
    ) -> Result<OrderView, ServiceError> {
        let txn = self.db.begin().await?;

        let cart = CartItem::find()
            .filter(cart_item::Column::UserId.eq(command.user_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .order_by_asc(cart_item::Column::Id)
            .lock_exclusive()
            .all(&txn)
            .await?;

        if cart.is_empty() {
            return Err(ServiceError::field("cart", "cart is empty"));
        }

        let product_ids: Vec<Uuid> = cart.iter().map(|line| line.product_id).collect();
        let mut products: HashMap<Uuid, ProductModel> = Product::find()
            .filter(product::Column::Id.is_in(product_ids.clone()))
            .all(&txn)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut primary_images: HashMap<Uuid, String> = HashMap::new();
        for image in ProductImage::find()
            .filter(product_image::Column::ProductId.is_in(product_ids))
            .order_by_asc(product_image::Column::Position)
            .order_by_asc(product_image::Column::CreatedAt)
            .all(&txn)
            .await?
        {
            primary_images
                .entry(image.product_id)
                .or_insert(image.image_url);
        }

        let mut lines = Vec::with_capacity(cart.len());
        for entry in &cart {
            let product = products.remove(&entry.product_id).ok_or_else(|| {
                ServiceError::validation(format!(
                    "Product {} is no longer available",
                    entry.product_id
                ))
            })?;
            lines.push(PricedLine {
                unit_price: product.effective_price(),
                image: primary_images.remove(&product.id),
                quantity: entry.quantity,
                product,
            });
        }

        let totals = OrderTotals::from_lines(lines.iter().map(|l| (l.unit_price, l.quantity)));
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let shipping = &command.shipping;

        let order = order::ActiveModel {
            id: Set(order_id),
            order_number: Set((self.order_numbers)(&self.config.order_number_prefix, now)),
            user_id: Set(command.user_id),
            subtotal: Set(totals.subtotal),
            discount: Set(totals.discount),
            shipping: Set(totals.shipping),
            total: Set(totals.total),
            payment_method: Set(command.payment_method),
            payment_status: Set(PaymentStatus::Pending),
            status: Set(OrderStatus::Pending),
            shipping_name: Set(shipping.name.clone()),
            shipping_email: Set(shipping.email.clone()),
            shipping_mobile: Set(shipping.mobile.clone()),
            shipping_address: Set(shipping.address.clone()),
            shipping_city: Set(shipping.city.clone()),
            shipping_state: Set(shipping.state.clone()),
            shipping_postal_code: Set(shipping.postal_code.clone()),
            shipping_country: Set(shipping.country.clone()),
            notes: Set(command.notes.clone()),
            gateway_order_id: Set(None),
            gateway_payment_id: Set(None),
            gateway_signature: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(line.product.id),
                product_name: Set(line.product.name.clone()),
                product_image: Set(line.image.clone()),
                price: Set(line.unit_price),
                quantity: Set(line.quantity),
                total: Set(line_total(line.unit_price, line.quantity)),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
            items.push(item);

            let decremented = Product::update_many()
                .col_expr(
                    product::Column::Stock,
                    Expr::col(product::Column::Stock).sub(line.quantity),
                )
                .col_expr(product::Column::UpdatedAt, Expr::value(now))
                .filter(product::Column::Id.eq(line.product.id))
                .filter(product::Column::Stock.gte(line.quantity))
                .exec(&txn)
                .await?;

            if decremented.rows_affected == 0 {
                return Err(ServiceError::InsufficientStock(format!(
                    "'{}' no longer has {} in stock",
                    line.product.name, line.quantity
                )));
            }
        }

        let deleted = CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(command.user_id))
            .exec(&txn)
            .await?;
        ensure_cart_consumed(cart.len(), deleted.rows_affected)?;

        txn.commit().await?;

        Ok(OrderView::new(order, items))
    }

    /// The user's orders, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        user_id: Uuid,
        page: Option<u64>,
        per_page: Option<u64>,
    ) -> Result<PaginatedResponse<OrderView>, ServiceError> {
        let page = page.unwrap_or(1).max(1);
        let per_page = self.config.page_size(per_page, self.config.order_page_size);

        let paginator = Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;
        let items = order_views(&*self.db, orders).await?;

        Ok(PaginatedResponse::new(items, total, page, per_page))
    }

    /// One order owned by `user_id`; other users' orders are reported as missing.
    #[instrument(skip(self))]
    pub async fn get_order(&self, user_id: Uuid, order_id: Uuid) -> Result<OrderView, ServiceError> {
        let order = Order::find_by_id(order_id)
            .filter(order::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        order_views(&*self.db, vec![order])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::InternalError("order view was not built".to_string()))
    }
}
