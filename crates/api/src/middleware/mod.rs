//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Rate limiting on `/api` (governor)
//!
//! Caller identity is an extractor ([`RequireUser`]) rather than a layer, so
//! only handlers that need a user ask for one.

pub mod rate_limit;
pub mod request_id;
pub mod user;

pub use rate_limit::api_rate_limiter;
pub use request_id::{http_request_span, request_id_middleware};
pub use user::{RequireUser, USER_ID_HEADER, UserRejection};
