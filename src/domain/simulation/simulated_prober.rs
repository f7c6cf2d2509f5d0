use async_trait::async_trait;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Mutex;

use crate::domain::health::prober::NodeProber;
use crate::domain::utils::id::NodeId;
use crate::error::ConversionError;

/// Prober that flips nodes down and up at random. Used by the demo binary in place of real
/// network probes.
#[derive(Debug)]
pub struct SimulatedProber {
    failure_probability: f64,
    recovery_probability: f64,
    down: Mutex<HashSet<NodeId>>,
}

impl SimulatedProber {
    pub fn new(failure_probability: f64, recovery_probability: f64) -> Result<Self, ConversionError> {
        for p in [failure_probability, recovery_probability] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConversionError::InvalidProbability(p));
            }
        }
        Ok(Self { failure_probability, recovery_probability, down: Mutex::new(HashSet::new()) })
    }

    fn roll(&self, node_id: &NodeId) -> bool {
        let mut rng = rand::rng();
        let mut down = self.down.lock().expect("prober state lock poisoned");

        if down.contains(node_id) {
            if rng.random_bool(self.recovery_probability) {
                down.remove(node_id);
            }
        } else if rng.random_bool(self.failure_probability) {
            down.insert(node_id.clone());
        }

        !down.contains(node_id)
    }
}

#[async_trait]
impl NodeProber for SimulatedProber {
    async fn probe(&self, node_id: &NodeId) -> bool {
        self.roll(node_id)
    }
}
