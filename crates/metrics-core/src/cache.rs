use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Time source injected into anything TTL-sensitive so tests can advance time
/// without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used everywhere outside tests
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

/// In-process cache with per-cache TTL.
///
/// Expired entries are dropped on access; there is no background sweeper, so
/// memory is bounded by the working set of keys between recompute runs.
pub struct TtlCache<T> {
    entries: DashMap<String, CacheEntry<T>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl_secs: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::seconds(ttl_secs),
            clock,
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                if self.clock.now() - entry.cached_at < self.ttl {
                    return Some(entry.data.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    pub fn set(&self, key: &str, value: T) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                data: value,
                cached_at: self.clock.now(),
            },
        );
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn new(start: DateTime<Utc>) -> Self {
            Self {
                now: Mutex::new(start),
            }
        }

        fn advance(&self, secs: i64) {
            let mut now = self.now.lock().unwrap();
            *now = *now + Duration::seconds(secs);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    #[test]
    fn test_entry_survives_within_ttl() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache: TtlCache<i32> = TtlCache::new(60, clock.clone());

        cache.set("AAPL", 42);
        clock.advance(59);
        assert_eq!(cache.get("AAPL"), Some(42));
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache: TtlCache<i32> = TtlCache::new(60, clock.clone());

        cache.set("AAPL", 42);
        clock.advance(61);
        assert_eq!(cache.get("AAPL"), None);
    }

    #[test]
    fn test_set_refreshes_expiry() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache: TtlCache<i32> = TtlCache::new(60, clock.clone());

        cache.set("AAPL", 1);
        clock.advance(50);
        cache.set("AAPL", 2);
        clock.advance(50);
        assert_eq!(cache.get("AAPL"), Some(2));
    }
}
