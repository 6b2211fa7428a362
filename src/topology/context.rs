use std::sync::Arc;
use std::sync::RwLock;

use tracing::debug;

use super::types::Topology;

/// Read access to the current topology snapshot.
pub trait TopologySource: Send + Sync {
  fn snapshot(&self) -> Arc<Topology>;
}

/// Holds the latest complete topology received from the platform.
///
/// Readers get an immutable `Arc` snapshot and never observe a partial update.
#[derive(Debug, Default)]
pub struct TopologyContext {
  current: RwLock<Arc<Topology>>,
}

impl TopologyContext {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn replace(&self, topology: Topology) {
    debug!(
      services = topology.services.len(),
      initialized = topology.initialized,
      "Replacing topology snapshot"
    );
    let topology = Arc::new(topology);
    match self.current.write() {
      Ok(mut guard) => *guard = topology,
      Err(poisoned) => *poisoned.into_inner() = topology,
    }
  }
}

impl TopologySource for TopologyContext {
  fn snapshot(&self) -> Arc<Topology> {
    match self.current.read() {
      Ok(guard) => guard.clone(),
      Err(poisoned) => poisoned.into_inner().clone(),
    }
  }
}
