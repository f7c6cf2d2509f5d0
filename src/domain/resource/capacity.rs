use serde::{Deserialize, Serialize};

/// Resource vector of a node. Used for static capacity, live utilization and fleet totals.
///
/// Components are abstract integer units, so incremental accounting never drifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capacity {
    pub cpu: u64,
    pub memory: u64,
    pub storage: u64,
    pub network_mbps: u64,
}

impl Capacity {
    pub fn new(cpu: u64, memory: u64, storage: u64, network_mbps: u64) -> Self {
        Self { cpu, memory, storage, network_mbps }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns true if every component of `self` is at least the one of `other`.
    pub fn covers(&self, other: &Capacity) -> bool {
        self.cpu >= other.cpu && self.memory >= other.memory && self.storage >= other.storage && self.network_mbps >= other.network_mbps
    }

    /// Componentwise subtraction clamped at zero.
    pub fn saturating_sub(&self, other: &Capacity) -> Capacity {
        Capacity {
            cpu: self.cpu.saturating_sub(other.cpu),
            memory: self.memory.saturating_sub(other.memory),
            storage: self.storage.saturating_sub(other.storage),
            network_mbps: self.network_mbps.saturating_sub(other.network_mbps),
        }
    }

    /// Componentwise subtraction, `None` if any component would go negative.
    pub fn checked_sub(&self, other: &Capacity) -> Option<Capacity> {
        Some(Capacity {
            cpu: self.cpu.checked_sub(other.cpu)?,
            memory: self.memory.checked_sub(other.memory)?,
            storage: self.storage.checked_sub(other.storage)?,
            network_mbps: self.network_mbps.checked_sub(other.network_mbps)?,
        })
    }

    pub fn saturating_add(&self, other: &Capacity) -> Capacity {
        Capacity {
            cpu: self.cpu.saturating_add(other.cpu),
            memory: self.memory.saturating_add(other.memory),
            storage: self.storage.saturating_add(other.storage),
            network_mbps: self.network_mbps.saturating_add(other.network_mbps),
        }
    }
}

/// What a single replica of a service needs from its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    pub cpu: u64,
    pub memory: u64,
    pub storage: u64,
    #[serde(default)]
    pub network_mbps: u64,
    pub max_latency_ms: u64,
}

impl Requirements {
    pub fn new(cpu: u64, memory: u64, storage: u64, max_latency_ms: u64) -> Self {
        Self { cpu, memory, storage, network_mbps: 0, max_latency_ms }
    }

    pub fn with_network_mbps(mut self, network_mbps: u64) -> Self {
        self.network_mbps = network_mbps;
        self
    }

    /// The resource vector a replica reserves on its host.
    pub fn demand(&self) -> Capacity {
        Capacity { cpu: self.cpu, memory: self.memory, storage: self.storage, network_mbps: self.network_mbps }
    }
}

/// Fraction of `used` in `total`. A zero total yields 0.
pub fn ratio(used: u64, total: u64) -> f64 {
    if total == 0 { 0.0 } else { used as f64 / total as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covers_is_componentwise() {
        let big = Capacity::new(4, 8, 100, 1000);
        assert!(big.covers(&Capacity::new(4, 8, 100, 1000)));
        assert!(!big.covers(&Capacity::new(5, 1, 1, 1)));
        assert!(!big.covers(&Capacity::new(1, 1, 1, 1001)));
    }

    #[test]
    fn test_checked_sub_rejects_underflow() {
        let cap = Capacity::new(2, 2, 2, 2);
        assert_eq!(cap.checked_sub(&Capacity::new(1, 1, 1, 1)), Some(Capacity::new(1, 1, 1, 1)));
        assert_eq!(cap.checked_sub(&Capacity::new(3, 0, 0, 0)), None);
        assert_eq!(cap.saturating_sub(&Capacity::new(3, 0, 0, 0)), Capacity::new(0, 2, 2, 2));
    }

    #[test]
    fn test_requirements_network_defaults_to_zero() {
        let req: Requirements = serde_json::from_str(r#"{"cpu":1,"memory":2,"storage":3,"maxLatencyMs":50}"#).unwrap();
        assert_eq!(req.network_mbps, 0);
        assert_eq!(req.demand(), Capacity::new(1, 2, 3, 0));
    }

    #[test]
    fn test_ratio_handles_zero_total() {
        assert_eq!(ratio(5, 0), 0.0);
        assert_eq!(ratio(1, 4), 0.25);
    }
}
