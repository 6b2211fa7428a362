use serde::Deserialize;
use serde::Serialize;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::types::AgentEvent;
use crate::topology::Topology;
use crate::topology::TopologyContext;

/// One line of the inbound feed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum InboundMessage {
  CompleteTopology(Topology),
  Event(AgentEvent),
}

/// Consume newline-delimited JSON messages until end of input or until the
/// event channel closes. Returns how many messages were accepted.
pub async fn read_feed<R>(
  reader: R,
  topology: &TopologyContext,
  events: &mpsc::Sender<AgentEvent>,
) -> std::io::Result<usize>
where
  R: AsyncBufRead + Unpin,
{
  let mut lines = reader.lines();
  let mut accepted = 0;

  while let Some(line) = lines.next_line().await? {
    let line = line.trim();
    if line.is_empty() {
      continue;
    }

    let message = match serde_json::from_str::<InboundMessage>(line) {
      Ok(message) => message,
      Err(e) => {
        warn!(error = %e, "Skipping malformed inbound message");
        continue;
      }
    };

    match message {
      InboundMessage::CompleteTopology(snapshot) => {
        topology.replace(snapshot);
      }
      InboundMessage::Event(event) => {
        debug!(event = event.name(), "Inbound event");
        if events.send(event).await.is_err() {
          info!("Event channel closed, stopping inbound feed");
          break;
        }
      }
    }
    accepted += 1;
  }

  Ok(accepted)
}
