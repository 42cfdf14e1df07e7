/*!
 * Sale Service
 *
 * In-store point-of-sale transactions. A sale is written atomically with its line items and the stock
 * decrements it triggers; no cart or OnlineOrder is involved.
 */

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    DiscountType, PaymentMethod, Product, Sale, SaleItem,
};
use crate::utils::{AppError, Result};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaleLineRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSaleRequest {
    pub customer_id: Option<Uuid>,
    #[validate(length(min = 1))]
    pub items: Vec<SaleLineRequest>,
    pub payment_method: PaymentMethod,
    pub prescription_number: Option<String>,
    /// Discount applied when the customer is a walk-in not on file; for a
    /// known `customer_id` the service derives this from the Customer
    /// record instead and this field is ignored.
    #[serde(default)]
    pub walk_in_senior_or_pwd: bool,
}

#[derive(Clone)]
pub struct SaleService {
    pool: PgPool,
    tax_rate: f64,
}

impl SaleService {
    pub fn new(pool: PgPool, tax_rate: f64) -> Self {
        Self { pool, tax_rate }
    }

    pub async fn get(&self, id: &Uuid) -> Result<(Sale, Vec<SaleItem>)> {
        let sale = Sale::find_by_id(&self.pool, id).await?;
        let items = Sale::items(&self.pool, id).await?;
        Ok((sale, items))
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Sale>> {
        Sale::list(&self.pool, limit, offset).await
    }

    /// Registers an in-store sale: loads and locks each product row,
    /// re-checks stock, decrements it, and writes the Sale + SaleItem rows
    /// in one transaction.
    pub async fn create(&self, req: CreateSaleRequest, user_id: Uuid) -> Result<(Sale, Vec<SaleItem>)> {
        if req.items.is_empty() {
            return Err(AppError::EmptyCart);
        }

        let mut tx = self.pool.begin().await?;

        let (discount_rate, discount_type) = if let Some(customer_id) = req.customer_id {
            let customer = crate::models::Customer::find_by_id(&self.pool, &customer_id).await?;
            let discount_type = if customer.is_senior_citizen {
                DiscountType::SeniorCitizen
            } else if customer.is_pwd {
                DiscountType::Pwd
            } else {
                DiscountType::None
            };
            (customer.discount_rate(), discount_type)
        } else if req.walk_in_senior_or_pwd {
            (0.20, DiscountType::SeniorCitizen)
        } else {
            (0.0, DiscountType::None)
        };

        let mut subtotal = 0.0f64;
        let mut locked_lines: Vec<(Uuid, i32, f64)> = Vec::with_capacity(req.items.len());

        for line in &req.items {
            let product = Product::find_by_id_for_update(&mut tx, &line.product_id).await?;
            if line.quantity > product.stock {
                return Err(AppError::InsufficientStock);
            }
            subtotal += product.price * line.quantity as f64;
            locked_lines.push((product.id, line.quantity, product.price));
        }

        let discount_amount = subtotal * discount_rate;
        let tax_amount = (subtotal - discount_amount) * self.tax_rate;
        let total = subtotal - discount_amount + tax_amount;

        let sale = Sale::insert(
            &mut tx,
            req.customer_id,
            user_id,
            subtotal,
            discount_amount,
            discount_type,
            tax_amount,
            total,
            req.payment_method,
            req.prescription_number,
        )
        .await?;

        let mut items = Vec::with_capacity(locked_lines.len());
        for (product_id, quantity, unit_price) in locked_lines {
            Product::decrement_stock(&mut tx, &product_id, quantity).await?;
            items.push(Sale::insert_item(&mut tx, sale.id, product_id, quantity, unit_price).await?);
        }

        tx.commit().await?;
        Ok((sale, items))
    }

    /// Admin-only, idempotent refund.
    pub async fn refund(&self, id: &Uuid, actor: Uuid, reason: String) -> Result<Sale> {
        Sale::refund(&self.pool, id, actor, reason).await
    }
}
