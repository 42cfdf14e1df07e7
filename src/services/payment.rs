/*!
 * Payment Processor Interface
 *
 * Payment processor integration is explicitly mocked behind an interface.
 * `PaymentProcessor` is the seam a real gateway would implement;
 * `MockPaymentProcessor` always approves and is the only implementation
 * wired up in this repository.
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::PaymentMethod;
use crate::utils::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub reference: Uuid,
    pub amount: f64,
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub approved: bool,
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn charge(&self, request: PaymentRequest) -> Result<PaymentReceipt>;
}

/// Always approves, stamping a deterministic-looking transaction id. No
/// external network call is made; there is nothing to configure.
#[derive(Debug, Clone, Default)]
pub struct MockPaymentProcessor;

#[async_trait]
impl PaymentProcessor for MockPaymentProcessor {
    async fn charge(&self, request: PaymentRequest) -> Result<PaymentReceipt> {
        Ok(PaymentReceipt {
            transaction_id: format!("mock-{}", request.reference),
            approved: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_processor_always_approves() {
        let processor = MockPaymentProcessor;
        let receipt = processor
            .charge(PaymentRequest { reference: Uuid::new_v4(), amount: 42.0, method: PaymentMethod::Cash })
            .await
            .unwrap();
        assert!(receipt.approved);
    }
}
