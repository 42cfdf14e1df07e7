/*!
 * HTTP Request Handlers Module
 *
 * Contains all HTTP request handlers for the API endpoints.
 */

pub mod analytics;
pub mod audit_logs;
pub mod auth;
pub mod cart;
pub mod customers;
pub mod orders;
pub mod products;
pub mod qr;
pub mod sales;
pub mod suppliers;
pub mod users;

pub use analytics::dashboard;
pub use audit_logs::{
    export_audit_logs, get_audit_log, get_filter_options, get_statistics as get_audit_statistics,
    get_user_activity, list_audit_logs,
};
pub use auth::{change_password, login, logout, refresh};
pub use cart::{add_to_cart, clear_cart, get_cart, remove_cart_item, update_cart_item};
pub use customers::{create_customer, delete_customer, get_customer, list_customers, update_customer};
pub use orders::{
    checkout, get_order, get_order_by_number, list_orders, track_order, update_order_status,
};
pub use products::{
    adjust_stock, browse_products, create_product, delete_product, expiring_products, get_product,
    list_products, update_product,
};
pub use qr::{generate_customer_qr, generate_product_qr, scan_history, scan_qr};
pub use sales::{create_sale, get_sale, list_sales, refund_sale};
pub use suppliers::{create_supplier, delete_supplier, get_supplier, list_suppliers, update_supplier};
pub use users::{activate_user, create_user, deactivate_user, get_user, list_users};
