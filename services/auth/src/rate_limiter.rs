//! Rate limiter for preventing brute force attacks on login

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of attempts allowed per window
    pub max_attempts: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 300,        // 5 minutes
            ban_duration_seconds: 3600, // 1 hour
        }
    }
}

/// Rate limiter entry
#[derive(Debug)]
struct RateLimiterEntry {
    /// Attempts in the current window
    attempts: u32,
    /// Start of the current window
    window_start: Instant,
    /// Ban expiration time
    ban_expires: Option<Instant>,
}

impl RateLimiterEntry {
    /// Neither banned nor inside a window that still counts
    fn is_expired(&self, now: Instant, window: Duration) -> bool {
        let ban_over = self.ban_expires.is_none_or(|expires| now >= expires);
        ban_over && now.duration_since(self.window_start) >= window
    }
}

#[derive(Debug)]
struct LimiterState {
    entries: HashMap<String, RateLimiterEntry>,
    last_sweep: Instant,
}

/// Per-key attempt counter with temporary bans
///
/// Entries whose window and ban are both over are dropped by a sweep that
/// runs at most once per window, so keys that are tried once and never again
/// do not accumulate.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    state: Arc<Mutex<LimiterState>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(LimiterState {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
            })),
        }
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.config.window_seconds)
    }

    /// Record an attempt for `key`
    ///
    /// Returns the remaining ban when the key is banned, which happens on the
    /// first attempt beyond `max_attempts` inside one window.
    pub async fn check(&self, key: &str) -> Result<(), Duration> {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let mut state = self.state.lock().await;
        let window = self.window();

        if now.duration_since(state.last_sweep) >= window {
            let before = state.entries.len();
            state.entries.retain(|_, entry| !entry.is_expired(now, window));
            state.last_sweep = now;
            debug!(
                "Rate limiter sweep dropped {} expired keys",
                before - state.entries.len()
            );
        }

        let entry = state.entries.entry(key.to_string()).or_insert(RateLimiterEntry {
            attempts: 0,
            window_start: now,
            ban_expires: None,
        });

        if let Some(ban_expires) = entry.ban_expires {
            if now < ban_expires {
                return Err(ban_expires - now);
            }
            entry.ban_expires = None;
            entry.attempts = 0;
            entry.window_start = now;
        }

        if now.duration_since(entry.window_start) >= window {
            entry.attempts = 0;
            entry.window_start = now;
        }

        if entry.attempts >= self.config.max_attempts {
            let ban = Duration::from_secs(self.config.ban_duration_seconds);
            entry.ban_expires = Some(now + ban);
            warn!(
                "Banned key {} for {} seconds",
                key, self.config.ban_duration_seconds
            );
            return Err(ban);
        }

        entry.attempts += 1;
        Ok(())
    }

    /// Forget all state for `key`
    pub async fn reset(&self, key: &str) {
        if self.state.lock().await.entries.remove(key).is_some() {
            info!("Cleared rate limit for key {}", key);
        }
    }
}
