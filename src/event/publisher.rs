use anyerror::AnyError;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::AgentConfig;
use crate::error::PublishError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
  InstanceActivated,
  MaintenanceMode,
  ReadyToShutdown,
}

impl StatusKind {
  pub fn name(&self) -> &'static str {
    match self {
      StatusKind::InstanceActivated => "instance_activated",
      StatusKind::MaintenanceMode => "maintenance_mode",
      StatusKind::ReadyToShutdown => "ready_to_shutdown",
    }
  }
}

/// Status change of this node, addressed by its identity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
  pub kind: StatusKind,
  pub service_name: String,
  pub cluster_id: String,
  pub member_id: String,
  pub network_partition_id: String,
}

impl StatusEvent {
  pub fn for_node(kind: StatusKind, config: &AgentConfig) -> Self {
    Self {
      kind,
      service_name: config.service_name.clone(),
      cluster_id: config.cluster_id.clone(),
      member_id: config.member_id.clone(),
      network_partition_id: config.network_partition_id.clone(),
    }
  }
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
  async fn publish(&self, event: StatusEvent) -> Result<(), PublishError>;
}

/// Writes each status event as one line of JSON.
pub struct JsonLinePublisher<W> {
  out: Mutex<W>,
}

pub type StdoutPublisher = JsonLinePublisher<tokio::io::Stdout>;

impl JsonLinePublisher<tokio::io::Stdout> {
  pub fn stdout() -> Self {
    Self::new(tokio::io::stdout())
  }
}

impl<W> JsonLinePublisher<W> {
  pub fn new(out: W) -> Self {
    Self {
      out: Mutex::new(out),
    }
  }

  pub fn into_inner(self) -> W {
    self.out.into_inner()
  }
}

#[async_trait]
impl<W> EventPublisher for JsonLinePublisher<W>
where
  W: AsyncWrite + Unpin + Send,
{
  async fn publish(&self, event: StatusEvent) -> Result<(), PublishError> {
    let name = event.kind.name();
    let mut line = serde_json::to_vec(&event).map_err(|e| PublishError::Encode {
      event: name.to_string(),
      source: AnyError::new(&e),
    })?;
    line.push(b'\n');

    let deliver = |e: std::io::Error| PublishError::Deliver {
      event: name.to_string(),
      source: AnyError::new(&e),
    };

    let mut out = self.out.lock().await;
    out.write_all(&line).await.map_err(deliver)?;
    out.flush().await.map_err(deliver)?;

    info!(event = name, member_id = %event.member_id, "Published status event");
    Ok(())
  }
}
