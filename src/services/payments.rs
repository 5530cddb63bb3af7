use crate::{
    config::AppConfig,
    entities::{order, Order, OrderStatus, PaymentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::orders::{order_views, OrderView},
};
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_min_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ONE {
        let mut err = ValidationError::new("min_amount");
        err.message = Some("must be at least 1".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateGatewayOrderInput {
    /// Amount in major currency units
    #[validate(custom = "validate_min_amount")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct GatewayOrder {
    pub gateway_order_id: String,
    /// Amount in minor units (paise for INR)
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct VerifyPaymentInput {
    pub order_id: Uuid,
    #[serde(alias = "razorpay_order_id")]
    #[validate(length(min = 1))]
    pub gateway_order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    #[validate(length(min = 1))]
    pub gateway_payment_id: String,
    #[serde(alias = "razorpay_signature")]
    #[validate(length(min = 1))]
    pub gateway_signature: String,
}

/// Stand-in for the payment gateway. No network calls and no signature checks.
#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

impl PaymentService {
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

    /// Returns a mock gateway order for `amount`, expressed in minor units.
    #[instrument(skip(self))]
    pub fn create_gateway_order(
        &self,
        input: CreateGatewayOrderInput,
    ) -> Result<GatewayOrder, ServiceError> {
        input.validate()?;

        let minor_units = input
            .amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or_else(|| ServiceError::field("amount", "amount is too large"))?
            .round()
            .to_i64()
            .ok_or_else(|| ServiceError::field("amount", "amount is too large"))?;

        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(14)
            .map(char::from)
            .collect();

        Ok(GatewayOrder {
            gateway_order_id: format!("order_{}", token),
            amount: minor_units,
            currency: self.config.payment_currency.clone(),
        })
    }

    /// Records gateway references and marks the order paid and confirmed.
    #[instrument(skip(self, input), fields(order_id = %input.order_id))]
    pub async fn verify_payment(
        &self,
        user_id: Uuid,
        input: VerifyPaymentInput,
    ) -> Result<OrderView, ServiceError> {
        input.validate()?;

        let existing = Order::find_by_id(input.order_id)
            .filter(order::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", input.order_id)))?;

        if existing.payment_status == PaymentStatus::Paid {
            return Err(ServiceError::Conflict(format!(
                "Order {} is already paid",
                existing.order_number
            )));
        }

        let mut active: order::ActiveModel = existing.into();
        active.gateway_order_id = Set(Some(input.gateway_order_id));
        active.gateway_payment_id = Set(Some(input.gateway_payment_id.clone()));
        active.gateway_signature = Set(Some(input.gateway_signature));
        active.payment_status = Set(PaymentStatus::Paid);
        active.status = Set(OrderStatus::Confirmed);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderPaymentVerified {
                order_id: updated.id,
                gateway_payment_id: input.gateway_payment_id,
            })
            .await;

        info!(order_number = %updated.order_number, "Payment recorded");

        order_views(&*self.db, vec![updated])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::InternalError("order view was not built".to_string()))
    }
}
