use crate::domain::clock::clock::SystemClock;

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Manually driven clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct MockClock {
    time: Arc<AtomicI64>,
}

impl MockClock {
    pub fn new(time_ms: i64) -> MockClock {
        MockClock { time: Arc::new(AtomicI64::new(time_ms)) }
    }

    pub fn set_current_time(&self, time_ms: i64) {
        self.time.store(time_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.time.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl SystemClock for MockClock {
    fn get_current_time_in_ms(&self) -> i64 {
        self.time.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_time() {
        let clock = MockClock::new(1_000);
        let shared = clock.clone();

        clock.advance(500);
        assert_eq!(shared.get_current_time_in_ms(), 1_500);

        shared.set_current_time(42_000);
        assert_eq!(clock.get_current_time_in_s(), 42);
    }
}
