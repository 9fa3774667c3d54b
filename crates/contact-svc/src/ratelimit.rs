//! Call-rate limiting for the protocol operations.
//!
//! The budget is global per operation name, shared by every client. This is
//! a blunt throttle on the signing primitives, not a per-client quota.

use contact_common::ContactError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Guards a named operation with a call budget
pub trait RateLimiter: Send + Sync {
    /// Count one call to `operation`, failing with `TooManyRequests` when the
    /// budget for the current period is spent. A rejected call is not counted.
    fn check(&self, operation: &str) -> Result<(), ContactError>;
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window limiter: `limit` calls per `period` for each operation
#[derive(Debug)]
pub struct GlobalRateLimiter {
    limit: u32,
    period: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl GlobalRateLimiter {
    pub fn new(limit: u32, period: Duration) -> Self {
        Self {
            limit,
            period,
            windows: Mutex::new(HashMap::new()),
        }
    }
}

impl RateLimiter for GlobalRateLimiter {
    fn check(&self, operation: &str) -> Result<(), ContactError> {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        let window = windows.entry(operation.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= self.period {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.limit {
            let remaining = self.period.saturating_sub(now.duration_since(window.started));
            let retry_after_secs =
                (remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)).max(1);
            tracing::warn!(
                operation = %operation,
                limit = self.limit,
                period_secs = self.period.as_secs(),
                "Rate limit exceeded"
            );
            return Err(ContactError::TooManyRequests {
                operation: operation.to_string(),
                retry_after_secs,
            });
        }

        window.count += 1;
        Ok(())
    }
}
