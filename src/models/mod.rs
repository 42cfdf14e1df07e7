/*!
 * Data Models Module
 *
 * Contains database models and their associated operations.
 */

pub mod audit_log;
pub mod cart_item;
pub mod customer;
pub mod online_order;
pub mod product;
pub mod qr_code;
pub mod request_context;
pub mod sale;
pub mod supplier;
pub mod user;

pub use audit_log::{
    ActionCount, AuditAction, AuditLog, AuditLogStatistics, AuditLogsFilter, CreateAuditLog,
    EntityType, EntityTypeCount, ExportAuditLogsRequest, ExportFormat, ListAuditLogsResponse,
    UserActivityCount, UserActivitySummary,
};
pub use cart_item::{CartItem, CartItemView, CartOwner, CartSummary};
pub use customer::{
    Customer, CustomerSummary, CreateCustomerRequest, UpdateCustomerRequest,
};
pub use online_order::{
    OnlineOrder, OnlineOrderItem, OrderStatus, OrderStatusHistory,
    OrderTrackingSummary, OrderType, PrescriptionUpload, UpdateOrderStatusRequest,
};
pub use product::{CreateProductRequest, Product, UpdateProductRequest};
pub use qr_code::{QRCode, QRScanLog, QrType, ScanMethod, ScanQrRequest};
pub use request_context::RequestContext;
pub use sale::{DiscountType, PaymentMethod, RefundSaleRequest, Sale, SaleItem};
pub use supplier::{CreateSupplierRequest, Supplier, UpdateSupplierRequest};
pub use user::{User, UserDto, UserRole};

/// Authenticated user information extracted from JWT token.
/// Added as a request extension by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: uuid::Uuid,
    pub role: UserRole,
}
