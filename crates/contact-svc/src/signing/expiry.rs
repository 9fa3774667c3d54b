//! Expiry deadlines carried as decimal Unix seconds.

use std::sync::Arc;

/// Source of wall-clock time in Unix seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// The server's wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Issues and checks token deadlines
#[derive(Clone)]
pub struct ExpiryCodec {
    clock: Arc<dyn Clock>,
}

impl ExpiryCodec {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Deadline `window_secs` from now, as a decimal string
    pub fn issue(&self, window_secs: u64) -> String {
        let window = i64::try_from(window_secs).unwrap_or(i64::MAX);
        self.now().saturating_add(window).to_string()
    }

    /// True iff `expiry` parses and is not before `now`.
    ///
    /// Malformed input is never live.
    pub fn is_live(expiry: &str, now: i64) -> bool {
        match expiry.parse::<i64>() {
            Ok(deadline) => deadline >= now,
            Err(_) => false,
        }
    }

    /// `is_live` against the current clock
    pub fn check(&self, expiry: &str) -> bool {
        Self::is_live(expiry, self.now())
    }
}

/// Settable clock for tests
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock(std::sync::atomic::AtomicI64);

#[cfg(test)]
impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self(std::sync::atomic::AtomicI64::new(now))
    }

    pub fn advance(&self, secs: i64) {
        self.0.fetch_add(secs, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}
