/*!
 * Shared Application State
 *
 * The single `Clone`-able handle threaded through every handler and
 * middleware layer via axum's `State` extractor. `Config` is wrapped in
 * an `Arc` since it is read-only after bootstrap; the pool, JWT service,
 * and session blacklist are each already cheaply cloneable.
 */

use std::sync::Arc;
use std::time::Instant;

use sqlx::PgPool;

use crate::config::Config;
use crate::middleware::rate_limit::RateLimiter;
use crate::middleware::session_blacklist::SessionBlacklist;
use crate::services::auth_service::AuthService;
use crate::services::audit_log_service::AuditLogService;
use crate::services::cart_service::CartService;
use crate::services::customer_service::CustomerService;
use crate::services::jwt_service::JwtService;
use crate::services::order_service::OrderService;
use crate::services::product_service::ProductService;
use crate::services::qr_service::QrService;
use crate::services::sale_service::SaleService;
use crate::services::supplier_service::SupplierService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt_service: JwtService,
    pub auth_service: AuthService,
    pub audit_log_service: AuditLogService,
    pub customer_service: CustomerService,
    pub product_service: ProductService,
    pub supplier_service: SupplierService,
    pub cart_service: CartService,
    pub order_service: OrderService,
    pub sale_service: SaleService,
    pub qr_service: QrService,
    pub session_blacklist: SessionBlacklist,
    pub rate_limiter: RateLimiter,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let config = Arc::new(config);
        let jwt_service = JwtService::new(config.jwt.clone());
        let auth_service = AuthService::new(jwt_service.clone(), config.security.clone());
        let rate_limiter = RateLimiter::new(&config.rate_limit);

        Self {
            audit_log_service: AuditLogService::new(pool.clone()),
            customer_service: CustomerService::new(pool.clone()),
            product_service: ProductService::new(pool.clone()),
            supplier_service: SupplierService::new(pool.clone()),
            cart_service: CartService::new(pool.clone(), config.business.cart_ttl_hours),
            order_service: OrderService::new(
                pool.clone(),
                config.business.tax_rate,
                config.business.delivery_fee,
            ),
            sale_service: SaleService::new(pool.clone(), config.business.tax_rate),
            qr_service: QrService::new(pool.clone()),
            pool,
            config,
            jwt_service,
            auth_service,
            session_blacklist: SessionBlacklist::new(),
            rate_limiter,
            start_time: Instant::now(),
        }
    }
}
