use std::sync::Arc;

use crate::artifact::ArtifactSyncOrchestrator;
use crate::artifact::CredentialDecryptor;
use crate::artifact::RepositoryClient;
use crate::config::AgentConfig;
use crate::error::Result;
use crate::event::EventDispatcher;
use crate::event::EventPublisher;
use crate::extension::ExtensionRunner;
use crate::node::Agent;
use crate::topology::TopologySource;

const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1024;

/// External systems the agent talks to.
pub struct Collaborators {
  pub topology: Arc<dyn TopologySource>,
  pub repository: Arc<dyn RepositoryClient>,
  pub decryptor: Arc<dyn CredentialDecryptor>,
  pub extensions: Arc<dyn ExtensionRunner>,
  pub publisher: Arc<dyn EventPublisher>,
}

pub struct AgentBuilder {
  config: AgentConfig,
  channel_capacity: usize,
}

impl AgentBuilder {
  pub fn new(config: AgentConfig) -> Self {
    Self {
      config,
      channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
    }
  }

  pub fn channel_capacity(mut self, capacity: usize) -> Self {
    self.channel_capacity = capacity.max(1);
    self
  }

  /// Validate the configuration and start the agent. Must be called from
  /// within a tokio runtime.
  pub fn build(self, collaborators: Collaborators) -> Result<Agent> {
    self.config.validate()?;

    let config = Arc::new(self.config);
    let orchestrator = ArtifactSyncOrchestrator::new(
      collaborators.repository,
      collaborators.extensions.clone(),
    );
    let dispatcher = EventDispatcher::new(
      config.clone(),
      collaborators.topology,
      orchestrator,
      collaborators.decryptor,
      collaborators.extensions,
      collaborators.publisher,
    );

    Ok(Agent::start(config, dispatcher, self.channel_capacity))
  }
}
