/*!
 * Middleware Module
 *
 * The request chain, applied in this module's declaration
 * order when wired up in `main.rs`: request id → structured log → panic
 * recovery → security headers → CORS → rate limit → JSON validate →
 * audit → auth → permission.
 */

pub mod audit;
pub mod auth;
pub mod cors;
pub mod error_redaction;
pub mod rate_limit;
pub mod request_context;
pub mod request_validation;
pub mod security_headers;
pub mod session_blacklist;

pub use session_blacklist::SessionBlacklist;
