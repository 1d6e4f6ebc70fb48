//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (propagate or create `x-request-id`)
//! 4. CORS (storefront origin only)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Rate limiting on auth and checkout routes (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{RequireAuth, clear_current_user, set_current_user};
pub use rate_limit::{auth_rate_limiter, checkout_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::{create_session_layer, create_session_store};
