use std::collections::HashMap;
use std::sync::Mutex;
use chrono::{DateTime, Duration, Utc};

pub const WINDOW_SECS: i64 = 60;
pub const MAX_REQUESTS: u32 = 10;

/// Once the map holds this many keys, expired records are swept before the
/// next admit check. Keeps a long-lived process from accumulating one entry
/// per client forever.
const SWEEP_THRESHOLD: usize = 1024;

struct RateLimitRecord {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Fixed-window admission control keyed by client address. The
/// check-then-increment runs under one lock, so concurrent requests for the
/// same key cannot race past the ceiling.
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    records: Mutex<HashMap<String, RateLimitRecord>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::seconds(WINDOW_SECS), MAX_REQUESTS)
    }
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        RateLimiter {
            window,
            max_requests,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if the request is admitted. A rejected request does not
    /// mutate the record.
    pub fn admit(&self, key: &str) -> bool {
        let now = Utc::now();
        let mut records = self.records.lock().unwrap();

        if records.len() >= SWEEP_THRESHOLD {
            records.retain(|_, record| now <= record.reset_at);
        }

        match records.get_mut(key) {
            Some(record) if now <= record.reset_at => {
                if record.count >= self.max_requests {
                    return false;
                }
                record.count += 1;
                true
            }
            _ => {
                records.insert(
                    key.to_string(),
                    RateLimitRecord { count: 1, reset_at: now + self.window },
                );
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_ceiling_then_rejects() {
        let limiter = RateLimiter::default();
        for _ in 0..MAX_REQUESTS {
            assert!(limiter.admit("10.0.0.1"));
        }
        assert!(!limiter.admit("10.0.0.1"));
        // Rejection leaves the record untouched; still rejected.
        assert!(!limiter.admit("10.0.0.1"));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::default();
        for _ in 0..MAX_REQUESTS {
            assert!(limiter.admit("10.0.0.1"));
        }
        assert!(!limiter.admit("10.0.0.1"));
        assert!(limiter.admit("10.0.0.2"));
    }

    #[test]
    fn window_expiry_resets_the_count() {
        let limiter = RateLimiter::new(Duration::milliseconds(30), 2);
        assert!(limiter.admit("k"));
        assert!(limiter.admit("k"));
        assert!(!limiter.admit("k"));

        std::thread::sleep(std::time::Duration::from_millis(50));

        // New window: count restarts at 1, leaving room for one more.
        assert!(limiter.admit("k"));
        assert!(limiter.admit("k"));
        assert!(!limiter.admit("k"));
    }

    #[test]
    fn sweep_drops_expired_records() {
        let limiter = RateLimiter::new(Duration::milliseconds(10), 2);
        for i in 0..SWEEP_THRESHOLD {
            assert!(limiter.admit(&format!("client-{}", i)));
        }
        assert_eq!(limiter.records.lock().unwrap().len(), SWEEP_THRESHOLD);

        std::thread::sleep(std::time::Duration::from_millis(30));

        assert!(limiter.admit("fresh"));
        assert_eq!(limiter.records.lock().unwrap().len(), 1);
    }
}
