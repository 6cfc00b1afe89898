//! Sliding-window rate limiting.
//!
//! Each `(identifier, path)` pair owns a window of request timestamps.
//! A check prunes timestamps older than the window, admits the request if
//! fewer than `max_requests` remain and records it. Denied requests are
//! never recorded, so hammering a limited key does not push its reset time
//! forward.
//!
//! The store is a `DashMap`; the prune/compare/append sequence for a key
//! runs under that key's shard lock so concurrent checks cannot admit more
//! than `max_requests`.

use std::borrow::Borrow;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

use dashmap::DashMap;
use thiserror::Error;

use crate::config::RateLimitSettings;
use crate::observability::metrics;
use crate::security::unix_millis;

/// Store size above which stale entries are swept on the next check.
pub const MAX_STORE_SIZE: usize = 10_000;

/// Entries untouched for this many windows are eligible for eviction.
const CLEANUP_MULTIPLIER: u64 = 2;

/// Rejected rate limit parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitError {
    #[error("max_requests must be greater than zero")]
    ZeroMaxRequests,

    #[error("window_secs must be greater than zero")]
    ZeroWindow,
}

/// Requests allowed per window. Both values are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    max_requests: u32,
    window_secs: u64,
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Result<Self, LimitError> {
        if max_requests == 0 {
            return Err(LimitError::ZeroMaxRequests);
        }
        if window_secs == 0 {
            return Err(LimitError::ZeroWindow);
        }
        Ok(Self {
            max_requests,
            window_secs,
        })
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window_secs(&self) -> u64 {
        self.window_secs
    }

    fn window_ms(&self) -> u64 {
        self.window_secs.saturating_mul(1000)
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Requests left in the current window, never negative.
    pub remaining: u32,
    /// Epoch millis at which the oldest request in the window expires.
    pub reset_at: u64,
    pub limit: u32,
}

impl RateLimitResult {
    /// Whole seconds until `reset_at`, rounded up.
    pub fn retry_after_secs(&self, now_ms: u64) -> u64 {
        self.reset_at.saturating_sub(now_ms).div_ceil(1000)
    }

    /// `reset_at` as epoch seconds, rounded up.
    pub fn reset_epoch_secs(&self) -> u64 {
        self.reset_at.div_ceil(1000)
    }
}

/// Prefix → limit table. Sorted once, longest prefix first.
#[derive(Debug, Clone)]
pub struct RouteLimits {
    routes: Vec<(String, RateLimitConfig)>,
    default: RateLimitConfig,
}

impl RouteLimits {
    pub fn new<I>(default: RateLimitConfig, routes: I) -> Self
    where
        I: IntoIterator<Item = (String, RateLimitConfig)>,
    {
        let mut routes: Vec<_> = routes.into_iter().collect();
        routes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { routes, default }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Result<Self, LimitError> {
        let default = RateLimitConfig::new(
            settings.default.max_requests,
            settings.default.window_secs,
        )?;
        let routes = settings
            .routes
            .iter()
            .map(|r| Ok((r.prefix.clone(), RateLimitConfig::new(r.max_requests, r.window_secs)?)))
            .collect::<Result<Vec<_>, LimitError>>()?;
        Ok(Self::new(default, routes))
    }

    /// Config for `path`: the longest matching prefix, else the default.
    pub fn resolve(&self, path: &str) -> RateLimitConfig {
        self.routes
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix.as_str()))
            .map(|(_, config)| *config)
            .unwrap_or(self.default)
    }

    /// The prefix that `path` resolves to, for labelling.
    pub fn matched_prefix(&self, path: &str) -> Option<&str> {
        self.routes
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix.as_str()))
            .map(|(prefix, _)| prefix.as_str())
    }
}

impl Default for RouteLimits {
    fn default() -> Self {
        let per_minute = |max_requests| RateLimitConfig {
            max_requests,
            window_secs: 60,
        };
        Self::new(
            per_minute(100),
            vec![
                ("/api/slack/".to_string(), per_minute(30)),
                ("/api/".to_string(), per_minute(60)),
            ],
        )
    }
}

/// Owned `(identifier, path)` key. Kept as two fields so an identifier
/// containing `:` cannot collide with a path.
#[derive(Debug, PartialEq, Eq)]
struct LimitKey {
    identifier: String,
    path: String,
}

/// Borrowed view of a key, so lookups need no allocation.
trait KeyParts {
    fn parts(&self) -> (&str, &str);
}

impl KeyParts for LimitKey {
    fn parts(&self) -> (&str, &str) {
        (&self.identifier, &self.path)
    }
}

impl KeyParts for (&str, &str) {
    fn parts(&self) -> (&str, &str) {
        (self.0, self.1)
    }
}

impl<'a> Borrow<dyn KeyParts + 'a> for LimitKey {
    fn borrow(&self) -> &(dyn KeyParts + 'a) {
        self
    }
}

// `LimitKey` and `dyn KeyParts` must hash identically.
impl Hash for LimitKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts().hash(state);
    }
}

impl Hash for dyn KeyParts + '_ {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts().hash(state);
    }
}

impl PartialEq for dyn KeyParts + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.parts() == other.parts()
    }
}

impl Eq for dyn KeyParts + '_ {}

#[derive(Debug)]
struct WindowEntry {
    /// Ascending; always appended at the current time.
    timestamps: VecDeque<u64>,
    last_pruned: u64,
    /// Window of the most recent check. Staleness is judged against this,
    /// not against whichever request triggers a sweep.
    window_ms: u64,
}

impl WindowEntry {
    fn new(window_ms: u64, now: u64) -> Self {
        Self {
            timestamps: VecDeque::new(),
            last_pruned: now,
            window_ms,
        }
    }

    /// Prune, then admit and record the request if under quota.
    fn record(&mut self, config: RateLimitConfig, now: u64) -> RateLimitResult {
        let window_ms = config.window_ms();
        self.window_ms = window_ms;
        self.prune(now.checked_sub(window_ms), now);

        let allowed = self.timestamps.len() < config.max_requests as usize;
        if allowed {
            self.timestamps.push_back(now);
        }

        let reset_at = self
            .timestamps
            .front()
            .map_or(now + window_ms, |oldest| oldest + window_ms);
        let count = u32::try_from(self.timestamps.len()).unwrap_or(u32::MAX);

        RateLimitResult {
            allowed,
            remaining: config.max_requests.saturating_sub(count),
            reset_at,
            limit: config.max_requests,
        }
    }

    /// Drop timestamps at or before `window_start`.
    fn prune(&mut self, window_start: Option<u64>, now: u64) {
        if let Some(start) = window_start {
            while self.timestamps.front().is_some_and(|&ts| ts <= start) {
                self.timestamps.pop_front();
            }
        }
        self.last_pruned = now;
    }

    fn has_live(&self, now: u64) -> bool {
        match (self.timestamps.back(), now.checked_sub(self.window_ms)) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(&newest), Some(start)) => newest > start,
        }
    }

    /// No live timestamps under its own window, and untouched for
    /// `CLEANUP_MULTIPLIER` of those windows.
    fn is_stale(&self, now: u64) -> bool {
        let cutoff = now.saturating_sub(self.window_ms.saturating_mul(CLEANUP_MULTIPLIER));
        self.last_pruned < cutoff && !self.has_live(now)
    }
}

/// In-process sliding-window limiter.
///
/// Construct one per process and share it behind an `Arc`.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    entries: DashMap<LimitKey, WindowEntry>,
    limits: RouteLimits,
}

impl SlidingWindowLimiter {
    pub fn new(limits: RouteLimits) -> Self {
        Self {
            entries: DashMap::new(),
            limits,
        }
    }

    pub fn limits(&self) -> &RouteLimits {
        &self.limits
    }

    /// Check and record a request for `(identifier, path)` at the current time.
    ///
    /// `config` overrides the prefix lookup on `path`.
    pub fn check(
        &self,
        identifier: &str,
        path: &str,
        config: Option<RateLimitConfig>,
    ) -> RateLimitResult {
        self.check_at(identifier, path, config, unix_millis())
    }

    /// Same as [`check`](Self::check) with an explicit clock, in epoch millis.
    pub fn check_at(
        &self,
        identifier: &str,
        path: &str,
        config: Option<RateLimitConfig>,
        now: u64,
    ) -> RateLimitResult {
        let config = config.unwrap_or_else(|| self.limits.resolve(path));

        // Existing keys are checked in place; owned key strings are only
        // built on first sight.
        let lookup = (identifier, path);
        if let Some(mut entry) = self.entries.get_mut(&lookup as &dyn KeyParts) {
            return entry.record(config, now);
        }

        let mut created = false;
        let result = {
            let key = LimitKey {
                identifier: identifier.to_string(),
                path: path.to_string(),
            };
            let mut entry = self.entries.entry(key).or_insert_with(|| {
                created = true;
                WindowEntry::new(config.window_ms(), now)
            });
            entry.record(config, now)
        };

        if created {
            let size = self.entries.len();
            if size > MAX_STORE_SIZE {
                self.evict_stale(now);
            } else {
                metrics::record_limiter_keys(size);
            }
        }

        result
    }

    /// Remove entries that are stale under their own window.
    fn evict_stale(&self, now: u64) {
        let before = self.entries.len();

        self.entries.retain(|_, entry| !entry.is_stale(now));

        let after = self.entries.len();
        tracing::debug!(evicted = before - after, remaining = after, "Evicted stale rate limit entries");
        metrics::record_limiter_keys(after);
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all windows. Returns how many keys were removed.
    pub fn flush(&self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        metrics::record_limiter_keys(0);
        removed
    }
}
