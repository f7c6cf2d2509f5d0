use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Time source for heartbeats. Injected so tests can pin the current time.
pub trait SystemClock: std::fmt::Debug + Send + Sync {
    fn get_current_time_in_ms(&self) -> i64;

    fn get_current_time_in_s(&self) -> i64 {
        self.get_current_time_in_ms() / 1000
    }
}

/// Wall clock backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl SystemClock for WallClock {
    fn get_current_time_in_ms(&self) -> i64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_millis() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_clock_is_monotonic_enough() {
        let clock = WallClock;
        let first = clock.get_current_time_in_ms();
        let second = clock.get_current_time_in_ms();
        assert!(second >= first);
        assert_eq!(clock.get_current_time_in_s(), clock.get_current_time_in_ms() / 1000);
    }
}
