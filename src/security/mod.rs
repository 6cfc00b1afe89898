//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request under the guarded prefix:
//!     → governor.rs (fixed order, first failure wins)
//!         → cors.rs (preflight / origin allow-list)
//!         → rate_limit.rs (sliding window per client + path)
//!     → Pass to handlers, response decorated with CORS + rate limit headers
//!
//! Slack webhook handler:
//!     → signature.rs (HMAC + timestamp freshness) before any parsing
//! ```
//!
//! # Design Decisions
//! - Policy checks return values; only the HTTP layer builds responses
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod cors;
pub mod governor;
pub mod rate_limit;
pub mod signature;

use std::time::{SystemTime, UNIX_EPOCH};

pub use cors::{OriginPolicy, Preflight};
pub use governor::{Decision, RequestGovernor};
pub use rate_limit::{RateLimitConfig, RateLimitResult, RouteLimits, SlidingWindowLimiter};
pub use signature::SignatureVerifier;

pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub(crate) fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
