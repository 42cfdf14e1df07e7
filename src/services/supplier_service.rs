/*!
 * Supplier Service
 *
 * Thin orchestration over `models::Supplier`. No domain invariants beyond
 * what the model already enforces.
 */

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateSupplierRequest, Supplier, UpdateSupplierRequest};
use crate::utils::Result;

#[derive(Clone)]
pub struct SupplierService {
    pool: PgPool,
}

impl SupplierService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &Uuid) -> Result<Supplier> {
        Supplier::find_by_id(&self.pool, id).await
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<Supplier>, i64)> {
        let suppliers = Supplier::list(&self.pool, limit, offset).await?;
        let total = Supplier::count(&self.pool).await?;
        Ok((suppliers, total))
    }

    pub async fn create(&self, req: CreateSupplierRequest) -> Result<Supplier> {
        Supplier::create(&self.pool, req).await
    }

    pub async fn update(&self, id: &Uuid, req: UpdateSupplierRequest) -> Result<Supplier> {
        Supplier::update(&self.pool, id, req).await
    }

    pub async fn delete(&self, id: &Uuid) -> Result<()> {
        Supplier::soft_delete(&self.pool, id).await
    }
}
