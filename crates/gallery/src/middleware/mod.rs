//! HTTP middleware stack for the gallery.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (add unique ID to each request)
//! 4. CSP nonce (generate per-request nonce for inline scripts)
//! 5. Security headers (CSP built from the nonce, isolation headers)
//! 6. Rate limiting on review submission (governor)

pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use csp::{CspNonce, csp_nonce_middleware};
pub use rate_limit::review_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
