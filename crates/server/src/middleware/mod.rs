//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added by the binary)
//! 2. Session layer (tower-sessions)
//! 3. `TraceLayer` (`http_request` span)
//! 4. Request ID
//! 5. Security headers

pub mod auth;
pub mod client_ip;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
pub use client_ip::ClientKey;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_layer};
