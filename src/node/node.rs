use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::error;
use tracing::info;

use crate::artifact::ArtifactSyncOrchestrator;
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::error::Result;
use crate::event::AgentEvent;
use crate::event::EventDispatcher;

/// A running agent: one dispatch task fed by a bounded event channel.
pub struct Agent {
  config: Arc<AgentConfig>,
  events: mpsc::Sender<AgentEvent>,
  orchestrator: ArtifactSyncOrchestrator,
  shutdown_tx: oneshot::Sender<()>,
  dispatch: JoinHandle<()>,
}

impl Agent {
  pub(crate) fn start(
    config: Arc<AgentConfig>,
    dispatcher: EventDispatcher,
    channel_capacity: usize,
  ) -> Self {
    let (events, events_rx) = mpsc::channel(channel_capacity);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let orchestrator = dispatcher.orchestrator().clone();

    let dispatch = tokio::spawn(run_dispatch_loop(dispatcher, events_rx, shutdown_rx));

    info!(
      service_name = %config.service_name,
      cluster_id = %config.cluster_id,
      member_id = %config.member_id,
      "Agent started"
    );

    Self {
      config,
      events,
      orchestrator,
      shutdown_tx,
      dispatch,
    }
  }

  pub fn config(&self) -> &AgentConfig {
    &self.config
  }

  pub fn orchestrator(&self) -> &ArtifactSyncOrchestrator {
    &self.orchestrator
  }

  /// A sender for feeding events from another task.
  pub fn sender(&self) -> mpsc::Sender<AgentEvent> {
    self.events.clone()
  }

  pub async fn submit(&self, event: AgentEvent) -> Result<()> {
    self
      .events
      .send(event)
      .await
      .map_err(|e| AgentError::ShuttingDown(format!("{} event rejected", e.0.name())))
  }

  /// Stop accepting events, handle those already queued, wait for artifact
  /// checkouts in flight and cancel every recurring sync.
  pub async fn shutdown(self) {
    info!(member_id = %self.config.member_id, "Agent shutting down");

    let _ = self.shutdown_tx.send(());
    drop(self.events);

    if let Err(e) = self.dispatch.await {
      error!(error = %e, "Dispatch task failed");
    }
    self.orchestrator.shutdown().await;

    info!("Agent stopped");
  }
}

async fn run_dispatch_loop(
  mut dispatcher: EventDispatcher,
  mut events: mpsc::Receiver<AgentEvent>,
  mut shutdown_rx: oneshot::Receiver<()>,
) {
  let mut closing = false;

  loop {
    tokio::select! {
      _ = &mut shutdown_rx, if !closing => {
        events.close();
        closing = true;
      }
      event = events.recv() => match event {
        Some(event) => dispatcher.dispatch(event).await,
        None => break,
      }
    }
  }

  dispatcher.drain().await;
}
