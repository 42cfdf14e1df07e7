/*!
 * Services Module
 *
 * Contains business logic and service layer implementations.
 */

pub mod audit_log_service;
pub mod auth_service;
pub mod authorization;
pub mod cart_service;
pub mod jwt_service;
pub mod order_service;
pub mod payment;
pub mod product_service;
pub mod qr_service;
pub mod customer_service;
pub mod sale_service;
pub mod supplier_service;

pub use audit_log_service::AuditLogService;
pub use auth_service::{AuthService, ChangePasswordRequest, LoginRequest, LoginResponse};
pub use authorization::{ensure_admin, ensure_permission, has_permission, is_admin, Action, Resource};
pub use cart_service::{AddCartItemRequest, CartService, UpdateCartItemRequest};
pub use customer_service::CustomerService;
pub use jwt_service::{Claims, JwtService, TokenPair};
pub use order_service::{CheckoutRequest, OrderService};
pub use payment::{MockPaymentProcessor, PaymentProcessor, PaymentReceipt, PaymentRequest};
pub use product_service::ProductService;
pub use qr_service::{QrService, ScanContext, ScanProjection, ScanResult};
pub use sale_service::{CreateSaleRequest, SaleLineRequest, SaleService};
pub use supplier_service::SupplierService;
