/*!
 * Order Service
 *
 * The checkout transaction plus status-transition and tracking lookups. This is the most
 * involved piece of business logic in the service layer: pricing is always
 * computed server-side from the cart snapshot, never trusted from the
 * client.
 */

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::crypto::EncryptedString;
use crate::models::{
    CartItem, CartOwner, Customer, OnlineOrder, OnlineOrderItem, OrderStatus,
    OrderStatusHistory, OrderTrackingSummary, OrderType, Product, QrType, QRCode,
};
use crate::utils::{AppError, Result};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckoutRequest {
    pub order_type: OrderType,
    pub guest_name: Option<String>,
    #[validate(email)]
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub delivery_address: Option<String>,
    pub prescription_number: Option<String>,
    /// Self-declared by a guest with no `Customer` row to read the flag from;
    /// unlocks the senior-citizen/PWD discount and waives the email/phone
    /// requirement below.
    #[serde(default)]
    pub guest_senior_or_pwd: bool,
}

#[derive(Clone)]
pub struct OrderService {
    pool: PgPool,
    tax_rate: f64,
    delivery_fee: f64,
}

impl OrderService {
    pub fn new(pool: PgPool, tax_rate: f64, delivery_fee: f64) -> Self {
        Self { pool, tax_rate, delivery_fee }
    }

    pub async fn get(&self, id: &Uuid) -> Result<(OnlineOrder, Vec<OnlineOrderItem>)> {
        let order = OnlineOrder::find_by_id(&self.pool, id).await?;
        let items = OnlineOrder::items(&self.pool, id).await?;
        Ok((order, items))
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<OnlineOrder>> {
        OnlineOrder::list(&self.pool, limit, offset).await
    }

    pub async fn get_by_number(&self, order_number: &str) -> Result<(OnlineOrder, Vec<OnlineOrderItem>)> {
        let order = OnlineOrder::find_by_order_number(&self.pool, order_number).await?;
        let items = OnlineOrder::items(&self.pool, &order.id).await?;
        Ok((order, items))
    }

    /// Public tracking lookup by order number: no
    /// guest PII or delivery address surfaces in the summary.
    pub async fn track(&self, order_number: &str) -> Result<OrderTrackingSummary> {
        let order = OnlineOrder::find_by_order_number(&self.pool, order_number).await?;
        let status_history = OnlineOrder::status_history(&self.pool, &order.id).await?;
        Ok(OrderTrackingSummary {
            order_number: order.order_number,
            status: order.status,
            order_type: order.order_type,
            created_at: order.created_at,
            expected_delivery: order.expected_delivery,
            actual_delivery: order.actual_delivery,
            tracking_number: order.tracking_number,
            status_history,
        })
    }

    pub async fn status_history(&self, order_id: &Uuid) -> Result<Vec<OrderStatusHistory>> {
        OnlineOrder::status_history(&self.pool, order_id).await
    }

    /// Validates and applies a status transition, appending the history row
    ///.
    pub async fn transition(
        &self,
        id: &Uuid,
        new_status: OrderStatus,
        actor: Option<Uuid>,
        reason: Option<String>,
    ) -> Result<OnlineOrder> {
        OnlineOrder::apply_transition(&self.pool, id, new_status, actor, reason).await
    }

    /// Runs the full checkout transaction.
    pub async fn checkout(
        &self,
        owner: &CartOwner,
        req: CheckoutRequest,
    ) -> Result<(OnlineOrder, Vec<OnlineOrderItem>)> {
        // Step 1: load cart items for owner.
        let cart_items = CartItem::find_by_owner(&self.pool, owner).await?;
        if cart_items.is_empty() {
            return Err(AppError::EmptyCart);
        }

        let customer = match owner.customer_id() {
            Some(id) => Some(Customer::find_by_id(&self.pool, &id).await?),
            None => None,
        };

        if customer.is_none() {
            if req.guest_name.as_deref().unwrap_or("").is_empty() {
                return Err(AppError::Validation("guest_name is required for guest checkout".to_string()));
            }
            if !req.guest_senior_or_pwd && (req.guest_email.is_none() || req.guest_phone.is_none()) {
                return Err(AppError::Validation(
                    "guest_email and guest_phone are required for guest checkout".to_string(),
                ));
            }
        }

        if req.order_type == OrderType::Delivery && req.delivery_address.as_deref().unwrap_or("").is_empty() {
            return Err(AppError::Validation("delivery_address is required for delivery orders".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        // Step 2: re-check stock for each item; step 7 decrements stock.
        let mut subtotal = 0.0f64;
        let mut prescription_required = false;
        let mut locked_items: Vec<(Uuid, i32, f64)> = Vec::with_capacity(cart_items.len());

        for item in &cart_items {
            let product = Product::find_by_id_for_update(&mut tx, &item.product_id).await?;
            if item.quantity > product.stock {
                return Err(AppError::InsufficientStock);
            }
            subtotal += item.line_total();
            prescription_required = prescription_required || product.prescription_required;
            locked_items.push((product.id, item.quantity, item.unit_price));
        }

        // Step 3: pricing.
        let discount_rate = match customer.as_ref() {
            Some(customer) => customer.discount_rate(),
            None if req.guest_senior_or_pwd => 0.20,
            None => 0.0,
        };
        let discount = subtotal * discount_rate;
        let tax = subtotal * self.tax_rate;
        let delivery_fee = if req.order_type == OrderType::Delivery { self.delivery_fee } else { 0.0 };
        let total = subtotal + tax + delivery_fee - discount;

        // Step 4/5: prescription gate decides initial status.
        let status = if prescription_required && req.prescription_number.is_none() {
            OrderStatus::PrescriptionNeeded
        } else {
            OrderStatus::Pending
        };

        let order = OnlineOrder::insert(
            &mut tx,
            req.order_type,
            owner.customer_id(),
            req.guest_name,
            req.guest_email,
            req.guest_phone,
            req.delivery_address.map(EncryptedString::new),
            subtotal,
            tax,
            delivery_fee,
            discount,
            total,
            prescription_required,
            status,
            None,
        )
        .await?;

        // Step 6: line items.
        let mut items = Vec::with_capacity(locked_items.len());
        for (product_id, quantity, unit_price) in &locked_items {
            items.push(OnlineOrder::insert_item(&mut tx, order.id, *product_id, *quantity, *unit_price).await?);
        }

        // Step 7: decrement stock.
        for (product_id, quantity, _) in &locked_items {
            Product::decrement_stock(&mut tx, product_id, *quantity).await?;
        }

        // Step 8: initial history row.
        OnlineOrder::insert_status_history(&mut tx, order.id, status, None, owner.customer_id()).await?;

        // Step 9: consume the cart, inside the same transaction as the order
        // and stock writes so a failed commit leaves the cart untouched.
        for item in &cart_items {
            CartItem::remove_tx(&mut tx, &item.id).await?;
        }

        tx.commit().await?;

        // Tracking QR, issued after commit since it references the final order id
        // and is not required for the order to exist.
        if let Ok(qr) = QRCode::create(
            &self.pool,
            QrType::Order,
            "ORDER".to_string(),
            order.id,
            serde_json::json!({ "order_number": order.order_number, "tracking_number": order.tracking_number }),
            None,
            None,
        )
        .await
        {
            let mut tag_tx = self.pool.begin().await?;
            OnlineOrder::set_qr_code(&mut tag_tx, &order.id, &qr.code).await?;
            tag_tx.commit().await?;
        }

        let order = OnlineOrder::find_by_id(&self.pool, &order.id).await?;
        Ok((order, items))
    }
}
