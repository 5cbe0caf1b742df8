//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, one transaction per request)
//! 2. `TraceLayer` (request span with a `request_id` field)
//! 3. Request ID (reuse upstream `x-request-id` or mint one)
//! 4. Security headers
//! 5. CORS for the configured frontend origin
//! 6. Request timeout
//!
//! Protected route groups add, innermost:
//!
//! 7. Session resolver (verify the `token` cookie into an `AuthContext`)
//! 8. Role gate (coarse or strict tier), where the group requires one

pub mod cookies;
pub mod request_id;
pub mod roles;
pub mod security_headers;
pub mod session;

pub use cookies::{SESSION_COOKIE, clear_session_cookie, session_cookie};
pub use request_id::request_id_middleware;
pub use roles::{RoleGate, enforce_role};
pub use security_headers::security_headers_middleware;
pub use session::resolve_session;
