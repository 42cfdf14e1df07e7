/*!
 * Customer Service
 *
 * Thin orchestration over `models::Customer`: permission checks already
 * happen in the handler layer, so this just wraps the model CRUD and adds
 * the audit-relevant actor stamping.
 */

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Customer, CreateCustomerRequest, UpdateCustomerRequest};
use crate::utils::Result;

#[derive(Clone)]
pub struct CustomerService {
    pool: PgPool,
}

impl CustomerService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &Uuid) -> Result<Customer> {
        Customer::find_by_id(&self.pool, id).await
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<Customer>, i64)> {
        let customers = Customer::list(&self.pool, limit, offset).await?;
        let total = Customer::count(&self.pool).await?;
        Ok((customers, total))
    }

    pub async fn create(&self, req: CreateCustomerRequest, actor: Uuid) -> Result<Customer> {
        Customer::create(&self.pool, req, actor).await
    }

    pub async fn update(&self, id: &Uuid, req: UpdateCustomerRequest, actor: Uuid) -> Result<Customer> {
        Customer::update(&self.pool, id, req, actor).await
    }

    pub async fn delete(&self, id: &Uuid, actor: Uuid) -> Result<()> {
        Customer::soft_delete(&self.pool, id, actor).await
    }
}
