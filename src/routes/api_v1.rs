/*!
 * API v1 Routes
 *
 * Defines all version 1 API routes and their handlers. Auth is a
 * route-level middleware layer (`require_auth`); per-route permission
 * checks live inline at the top of each handler via
 * `services::authorization`. Groups with a public endpoint alongside
 * protected ones (e.g. `/qr/scan` vs `/qr/*/generate`) are built as two
 * sub-routers merged under the same prefix rather than layered as a whole.
 */

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::handlers::{
    activate_user, add_to_cart, adjust_stock, browse_products, change_password, checkout,
    clear_cart, create_customer, create_product, create_sale, create_supplier, create_user,
    dashboard, deactivate_user, delete_customer, delete_product, delete_supplier,
    expiring_products, export_audit_logs, generate_customer_qr, generate_product_qr,
    get_audit_log, get_audit_statistics, get_cart, get_customer, get_filter_options, get_order,
    get_order_by_number, get_product, get_sale, get_supplier, get_user, get_user_activity,
    list_audit_logs, list_customers, list_orders, list_products, list_sales, list_suppliers,
    list_users, login, logout, refresh, refund_sale, remove_cart_item, scan_history, scan_qr,
    track_order, update_cart_item, update_customer, update_order_status, update_product,
    update_supplier,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn create_api_v1_routes(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .merge(
            Router::new()
                .route("/logout", post(logout))
                .route("/change-password", post(change_password))
                .route_layer(middleware::from_fn_with_state(state.clone(), require_auth)),
        );

    let qr_routes = Router::new().route("/scan", post(scan_qr)).merge(
        Router::new()
            .route("/products/{id}/generate", post(generate_product_qr))
            .route("/customers/{id}/generate", post(generate_customer_qr))
            .route("/scan-history", get(scan_history))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_auth)),
    );

    // Cart identity resolves from a query param/header, never the bearer
    // token — no auth layer here at all.
    let cart_routes = Router::new()
        .route("/add", post(add_to_cart))
        .route("/", get(get_cart).delete(clear_cart))
        .route("/{id}", put(update_cart_item).delete(remove_cart_item));

    let order_routes = Router::new()
        .route("/", post(checkout))
        .route("/track/{number}", get(track_order))
        .route("/number/{number}", get(get_order_by_number))
        .merge(
            Router::new()
                .route("/", get(list_orders))
                .route("/{id}", get(get_order))
                .route("/{id}/status", put(update_order_status))
                .route_layer(middleware::from_fn_with_state(state.clone(), require_auth)),
        );

    let customer_routes = Router::new()
        .route("/", post(create_customer).get(list_customers))
        .route("/{id}", get(get_customer).put(update_customer).delete(delete_customer))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let product_routes = Router::new().route("/browse", get(browse_products)).merge(
        Router::new()
            .route("/", post(create_product).get(list_products))
            .route("/expiring", get(expiring_products))
            .route("/{id}", get(get_product).put(update_product).delete(delete_product))
            .route("/{id}/stock", put(adjust_stock))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_auth)),
    );

    let supplier_routes = Router::new()
        .route("/", post(create_supplier).get(list_suppliers))
        .route("/{id}", get(get_supplier).put(update_supplier).delete(delete_supplier))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let sale_routes = Router::new()
        .route("/", post(create_sale).get(list_sales))
        .route("/{id}", get(get_sale))
        .route("/{id}/refund", post(refund_sale))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let analytics_routes = Router::new()
        .route("/dashboard", get(dashboard))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let audit_routes = Router::new()
        .route("/", get(list_audit_logs))
        .route("/statistics", get(get_audit_statistics))
        .route("/export", get(export_audit_logs))
        .route("/filter-options", get(get_filter_options))
        .route("/user/{user_id}/activity", get(get_user_activity))
        .route("/{id}", get(get_audit_log))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let user_routes = Router::new()
        .route("/", post(create_user).get(list_users))
        .route("/{id}", get(get_user))
        .route("/{id}/deactivate", post(deactivate_user))
        .route("/{id}/activate", post(activate_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest("/auth", auth_routes)
        .nest("/qr", qr_routes)
        .nest("/cart", cart_routes)
        .nest("/orders", order_routes)
        .nest("/customers", customer_routes)
        .nest("/products", product_routes)
        .nest("/suppliers", supplier_routes)
        .nest("/sales", sale_routes)
        .nest("/analytics", analytics_routes)
        .nest("/audit", audit_routes)
        .nest("/users", user_routes)
        .with_state(state)
}
