/*!
 * Product Service
 *
 * Thin orchestration over `models::Product`. Stock mutation outside the
 * checkout path (manual restock/correction) goes through `adjust_stock`,
 * which re-checks the non-negative floor at the SQL level the same way
 * `decrement_stock` does.
 */

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateProductRequest, Product, UpdateProductRequest};
use crate::utils::Result;

#[derive(Clone)]
pub struct ProductService {
    pool: PgPool,
}

impl ProductService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &Uuid) -> Result<Product> {
        Product::find_by_id(&self.pool, id).await
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<Product>, i64)> {
        let products = Product::list(&self.pool, limit, offset).await?;
        let total = Product::count(&self.pool).await?;
        Ok((products, total))
    }

    /// Public catalog browsing.
    pub async fn browse(&self, limit: i64, offset: i64) -> Result<Vec<Product>> {
        Product::browse(&self.pool, limit, offset).await
    }

    pub async fn expiring_within(&self, days: i64) -> Result<Vec<Product>> {
        Product::expiring_within(&self.pool, days).await
    }

    pub async fn create(&self, req: CreateProductRequest) -> Result<Product> {
        Product::create(&self.pool, req).await
    }

    pub async fn update(&self, id: &Uuid, req: UpdateProductRequest) -> Result<Product> {
        Product::update(&self.pool, id, req).await
    }

    pub async fn adjust_stock(&self, id: &Uuid, delta: i32) -> Result<Product> {
        Product::adjust_stock(&self.pool, id, delta).await
    }

    pub async fn delete(&self, id: &Uuid) -> Result<()> {
        Product::soft_delete(&self.pool, id).await
    }
}
