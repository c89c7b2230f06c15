//! Middleware components for HTTP request processing: client identification,
//! rate limiting and security headers, layered via Axum's routing system.

pub mod ip;
pub mod rate_limit;
pub mod security_headers;

pub use rate_limit::EndpointRateLimiter;
