/*!
 * Cart Service
 *
 * Wraps `models::CartItem`/`CartOwner` with the live-product checks
 * required at the service boundary (add/update re-validate against
 * current stock; the model layer itself only persists rows).
 */

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::models::{CartItem, CartItemView, CartOwner, CartSummary, Product};
use crate::utils::{AppError, Result};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub dosage: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCartItemRequest {
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Clone)]
pub struct CartService {
    pool: PgPool,
    cart_ttl_hours: i64,
}

impl CartService {
    pub fn new(pool: PgPool, cart_ttl_hours: i64) -> Self {
        Self { pool, cart_ttl_hours }
    }

    pub async fn add(&self, owner: &CartOwner, req: AddCartItemRequest) -> Result<CartItem> {
        let product = Product::find_by_id(&self.pool, &req.product_id).await?;
        if !product.is_active {
            return Err(AppError::Validation("product is not active".to_string()));
        }
        if req.quantity > product.stock {
            return Err(AppError::InsufficientStock);
        }

        if let Some(existing) =
            CartItem::find_existing_for_product(&self.pool, owner, &req.product_id).await?
        {
            let new_quantity = existing.quantity + req.quantity;
            if new_quantity > product.stock {
                return Err(AppError::InsufficientStock);
            }
            return CartItem::increment_quantity(&self.pool, &existing.id, req.quantity).await;
        }

        CartItem::insert(
            &self.pool,
            owner,
            req.product_id,
            req.quantity,
            product.price,
            req.dosage,
            req.instructions,
            self.cart_ttl_hours,
        )
        .await
    }

    pub async fn update_quantity(&self, id: &Uuid, req: UpdateCartItemRequest) -> Result<CartItem> {
        let item = CartItem::find_by_id(&self.pool, id).await?;
        let product = Product::find_by_id(&self.pool, &item.product_id).await?;
        if req.quantity > product.stock {
            return Err(AppError::InsufficientStock);
        }
        CartItem::set_quantity(&self.pool, id, req.quantity).await
    }

    pub async fn remove(&self, id: &Uuid) -> Result<()> {
        CartItem::remove(&self.pool, id).await
    }

    pub async fn clear(&self, owner: &CartOwner) -> Result<u64> {
        CartItem::clear(&self.pool, owner).await
    }

    /// Non-expired items for the owner with live product data joined, plus
    /// the `{total_items, total_amount, item_count}` summary.
    pub async fn get(&self, owner: &CartOwner) -> Result<CartSummary> {
        let items = CartItem::find_by_owner(&self.pool, owner).await?;

        let mut views = Vec::with_capacity(items.len());
        let mut total_amount = 0.0f64;
        let mut item_count = 0i32;

        for item in &items {
            let product = Product::find_by_id(&self.pool, &item.product_id).await?;
            total_amount += item.line_total();
            item_count += item.quantity;
            views.push(CartItemView {
                id: item.id,
                product_id: item.product_id,
                product_name: product.name,
                quantity: item.quantity,
                unit_price: item.unit_price,
                line_total: item.line_total(),
                dosage: item.dosage.clone(),
                instructions: item.instructions.clone(),
            });
        }

        Ok(CartSummary {
            total_items: views.len() as i64,
            item_count,
            total_amount,
            items: views,
        })
    }
}
