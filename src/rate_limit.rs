/// Rate limiting for login, API and upload traffic.
///
/// Implements fixed window counting using in-memory storage (DashMap). Each
/// `(bucket, identifier)` pair owns a counter and a reset instant; the first
/// request after the reset instant opens a new window.
///
/// This is suitable for single-instance deployments only. Several instances
/// behind a load balancer each keep their own counters.
///
/// # Example Usage
///
/// ```rust,ignore
/// use cairn::rate_limit::RateLimits;
///
/// let limits = RateLimits::default();
/// limits.check_login("192.168.1.1")?;
/// ```
use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::app_config::RateLimitSettings;

/// Bucket names, also used as key prefixes.
pub const LOGIN_BUCKET: &str = "login";
pub const API_BUCKET: &str = "api";
pub const UPLOAD_BUCKET: &str = "upload";

/// Limit for one bucket.
#[derive(Debug, Clone)]
pub struct RateLimitRule {
    pub max_requests: usize,
    pub window: Duration,
    /// Message returned to clients when the limit is hit.
    pub message: String,
}

impl RateLimitRule {
    pub fn new(max_requests: usize, window: Duration, message: impl Into<String>) -> Self {
        Self {
            max_requests,
            window,
            message: message.into(),
        }
    }
}

/// Rules for every bucket the API uses.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub login: RateLimitRule,
    pub api: RateLimitRule,
    pub upload: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login: RateLimitRule::new(
                5,
                Duration::from_secs(15 * 60), // 15 minutes
                "Too many login attempts. Please try again later.",
            ),
            api: RateLimitRule::new(
                100,
                Duration::from_secs(60), // 1 minute
                "Too many requests. Please slow down.",
            ),
            upload: RateLimitRule::new(
                20,
                Duration::from_secs(3600), // 1 hour
                "Upload limit exceeded. Please try again later.",
            ),
        }
    }
}

impl RateLimitConfig {
    /// Build rules from application settings, keeping the default messages.
    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        let defaults = Self::default();
        Self {
            login: RateLimitRule {
                max_requests: settings.login_max,
                window: Duration::from_secs(settings.login_window_seconds),
                ..defaults.login
            },
            api: RateLimitRule {
                max_requests: settings.api_max,
                window: Duration::from_secs(settings.api_window_seconds),
                ..defaults.api
            },
            upload: RateLimitRule {
                max_requests: settings.upload_max,
                window: Duration::from_secs(settings.upload_window_seconds),
                ..defaults.upload
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: usize,
    reset_at: Instant,
}

/// Error returned when rate limit is exceeded
#[derive(Debug, Clone)]
pub struct RateLimitError {
    /// Number of seconds until the window resets
    pub retry_after_seconds: u64,
    /// Maximum requests per window
    pub limit: usize,
    pub message: String,
}

/// Snapshot of a key's window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: usize,
    pub remaining: usize,
    /// Time until the window resets. Zero when no window is open.
    pub reset_after: Duration,
}

/// Rate limiter using in-memory storage
#[derive(Default)]
pub struct RateLimiter {
    /// Map of (bucket:identifier) -> window
    entries: DashMap<String, WindowEntry>,
}

fn key(bucket: &str, identifier: &str) -> String {
    format!("{}:{}", bucket, identifier)
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Count a request and reject it once the window's count exceeds the rule.
    pub fn check_limit(
        &self,
        bucket: &str,
        identifier: &str,
        rule: &RateLimitRule,
    ) -> Result<(), RateLimitError> {
        self.check_limit_at(bucket, identifier, rule, Instant::now())
    }

    /// [`check_limit`](Self::check_limit) against an explicit clock.
    pub fn check_limit_at(
        &self,
        bucket: &str,
        identifier: &str,
        rule: &RateLimitRule,
        now: Instant,
    ) -> Result<(), RateLimitError> {
        let mut entry = self.entries.entry(key(bucket, identifier)).or_insert(WindowEntry {
            count: 0,
            reset_at: now + rule.window,
        });

        if entry.reset_at <= now {
            entry.count = 0;
            entry.reset_at = now + rule.window;
        }
        entry.count += 1;

        if entry.count > rule.max_requests {
            let remaining = entry.reset_at.saturating_duration_since(now);
            // Round up to whole seconds
            let mut retry_after_seconds = remaining.as_secs();
            if remaining.subsec_nanos() > 0 {
                retry_after_seconds += 1;
            }
            return Err(RateLimitError {
                retry_after_seconds,
                limit: rule.max_requests,
                message: rule.message.clone(),
            });
        }

        Ok(())
    }

    /// Current window state for a key without counting a request.
    pub fn info(&self, bucket: &str, identifier: &str, rule: &RateLimitRule) -> RateLimitInfo {
        let now = Instant::now();
        match self.entries.get(&key(bucket, identifier)) {
            Some(entry) if entry.reset_at > now => RateLimitInfo {
                limit: rule.max_requests,
                remaining: rule.max_requests.saturating_sub(entry.count),
                reset_after: entry.reset_at - now,
            },
            _ => RateLimitInfo {
                limit: rule.max_requests,
                remaining: rule.max_requests,
                reset_after: Duration::ZERO,
            },
        }
    }

    /// Forget a key, e.g. after a successful login.
    pub fn reset_limit(&self, bucket: &str, identifier: &str) {
        self.entries.remove(&key(bucket, identifier));
    }

    /// Drop windows that have already closed.
    ///
    /// Called every 5 minutes by the server binary.
    pub fn cleanup_old_entries(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.reset_at > now);
    }

    /// Get the number of tracked keys (for monitoring/debugging)
    pub fn tracked_keys_count(&self) -> usize {
        self.entries.len()
    }
}

/// Limiter plus the rules for each bucket, owned by the application state.
#[derive(Default)]
pub struct RateLimits {
    pub limiter: RateLimiter,
    pub config: RateLimitConfig,
}

impl RateLimits {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            limiter: RateLimiter::new(),
            config,
        }
    }

    /// Check rate limit for login attempts, keyed by client address.
    pub fn check_login(&self, client: &str) -> Result<(), RateLimitError> {
        self.limiter.check_limit(LOGIN_BUCKET, client, &self.config.login)
    }

    /// Successful logins clear the address's failed attempts.
    pub fn reset_login(&self, client: &str) {
        self.limiter.reset_limit(LOGIN_BUCKET, client);
    }

    /// Check rate limit for general API requests.
    pub fn check_api(&self, client: &str) -> Result<(), RateLimitError> {
        self.limiter.check_limit(API_BUCKET, client, &self.config.api)
    }

    /// Check rate limit for media uploads.
    pub fn check_upload(&self, client: &str) -> Result<(), RateLimitError> {
        self.limiter.check_limit(UPLOAD_BUCKET, client, &self.config.upload)
    }

    pub fn cleanup(&self) {
        self.limiter.cleanup_old_entries();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(max: usize, secs: u64) -> RateLimitRule {
        RateLimitRule::new(max, Duration::from_secs(secs), "slow down")
    }

    #[test]
    fn test_rate_limit_allows_requests_within_limit() {
        let limiter = RateLimiter::new();
        let rule = rule(3, 10);

        for i in 0..3 {
            assert!(
                limiter.check_limit("test", "user1", &rule).is_ok(),
                "Request {} should be allowed",
                i
            );
        }
    }

    #[test]
    fn test_rate_limit_blocks_requests_over_limit() {
        let limiter = RateLimiter::new();
        let rule = rule(3, 10);

        for _ in 0..3 {
            limiter.check_limit("test", "user1", &rule).unwrap();
        }

        let err = limiter.check_limit("test", "user1", &rule).unwrap_err();
        assert!(err.retry_after_seconds > 0 && err.retry_after_seconds <= 10);
        assert_eq!(err.limit, 3);
        assert_eq!(err.message, "slow down");
    }

    #[test]
    fn test_rate_limit_different_identifiers_independent() {
        let limiter = RateLimiter::new();
        let rule = rule(1, 10);

        limiter.check_limit("test", "user1", &rule).unwrap();
        assert!(limiter.check_limit("test", "user1", &rule).is_err());
        assert!(limiter.check_limit("test", "user2", &rule).is_ok());
        assert!(limiter.check_limit("other", "user1", &rule).is_ok());
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let limiter = RateLimiter::new();
        let rule = rule(5, 60);
        let start = Instant::now();

        for _ in 0..5 {
            limiter.check_limit_at("login", "10.0.0.1", &rule, start).unwrap();
        }
        assert!(limiter
            .check_limit_at("login", "10.0.0.1", &rule, start + Duration::from_secs(30))
            .is_err());

        // The window opened at `start` closes at start + 60s.
        let later = start + Duration::from_secs(61);
        assert!(limiter.check_limit_at("login", "10.0.0.1", &rule, later).is_ok());
    }

    #[test]
    fn test_retry_after_counts_down() {
        let limiter = RateLimiter::new();
        let rule = rule(1, 60);
        let start = Instant::now();

        limiter.check_limit_at("api", "a", &rule, start).unwrap();
        let err = limiter
            .check_limit_at("api", "a", &rule, start + Duration::from_secs(45))
            .unwrap_err();
        assert_eq!(err.retry_after_seconds, 15);
    }

    #[test]
    fn test_reset_limit() {
        let limiter = RateLimiter::new();
        let rule = rule(1, 60);

        limiter.check_limit("login", "ip", &rule).unwrap();
        assert!(limiter.check_limit("login", "ip", &rule).is_err());
        limiter.reset_limit("login", "ip");
        assert!(limiter.check_limit("login", "ip", &rule).is_ok());
    }

    #[test]
    fn test_info_reports_remaining() {
        let limiter = RateLimiter::new();
        let rule = rule(5, 60);

        assert_eq!(limiter.info("api", "x", &rule).remaining, 5);
        limiter.check_limit("api", "x", &rule).unwrap();
        limiter.check_limit("api", "x", &rule).unwrap();

        let info = limiter.info("api", "x", &rule);
        assert_eq!(info.limit, 5);
        assert_eq!(info.remaining, 3);
        assert!(info.reset_after > Duration::ZERO);
    }

    #[test]
    fn test_cleanup_removes_only_closed_windows() {
        let limiter = RateLimiter::new();

        // A zero-length window is already closed when cleanup runs.
        limiter.check_limit("api", "old", &rule(10, 0)).unwrap();
        limiter.check_limit("api", "fresh", &rule(10, 60)).unwrap();
        assert_eq!(limiter.tracked_keys_count(), 2);

        limiter.cleanup_old_entries();
        assert_eq!(limiter.tracked_keys_count(), 1);
    }

    #[test]
    fn test_default_rate_limit_config() {
        let config = RateLimitConfig::default();

        assert_eq!(config.login.max_requests, 5);
        assert_eq!(config.login.window, Duration::from_secs(900));
        assert_eq!(config.api.max_requests, 100);
        assert_eq!(config.api.window, Duration::from_secs(60));
        assert_eq!(config.upload.max_requests, 20);
        assert_eq!(config.upload.window, Duration::from_secs(3600));
    }
}
