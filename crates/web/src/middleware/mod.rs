//! HTTP middleware stack for Cat Collector.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions)
//! 4. Security headers (CSP, frame options, etc.)

pub mod auth;
pub mod security_headers;
pub mod session;

pub use auth::{
    LOGIN_PATH, OptionalAuth, RequireAuth, Scoped, clear_current_user, set_current_user,
};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
