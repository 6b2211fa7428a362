use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::topology::Port;

/// Platform events the agent reacts to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
  InstanceStarted,
  InstanceActivated,
  ArtifactsUpdated(ArtifactsUpdatedEvent),
  MemberActivated(MemberActivatedEvent),
  InstanceCleanupCluster(InstanceCleanupClusterEvent),
  InstanceCleanupMember(InstanceCleanupMemberEvent),
  VolumeMount(VolumeMountEvent),
  /// Forget every well-known member counted so far.
  TopologyResync,
  CompleteTopology,
  MemberStarted(MemberLifecycleEvent),
  MemberSuspended(MemberLifecycleEvent),
  MemberTerminated(MemberLifecycleEvent),
}

impl AgentEvent {
  pub fn name(&self) -> &'static str {
    match self {
      AgentEvent::InstanceStarted => "instance_started",
      AgentEvent::InstanceActivated => "instance_activated",
      AgentEvent::ArtifactsUpdated(_) => "artifacts_updated",
      AgentEvent::MemberActivated(_) => "member_activated",
      AgentEvent::InstanceCleanupCluster(_) => "instance_cleanup_cluster",
      AgentEvent::InstanceCleanupMember(_) => "instance_cleanup_member",
      AgentEvent::VolumeMount(_) => "volume_mount",
      AgentEvent::TopologyResync => "topology_resync",
      AgentEvent::CompleteTopology => "complete_topology",
      AgentEvent::MemberStarted(_) => "member_started",
      AgentEvent::MemberSuspended(_) => "member_suspended",
      AgentEvent::MemberTerminated(_) => "member_terminated",
    }
  }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactsUpdatedEvent {
  #[serde(default)]
  pub tenant_id: String,

  pub cluster_id: String,

  #[serde(default)]
  pub repo_url: String,

  #[serde(default)]
  pub repo_username: String,

  /// Still encrypted with the node's cartridge key.
  #[serde(default)]
  pub repo_password: String,

  #[serde(default)]
  pub commit_enabled: bool,

  #[serde(default)]
  pub status: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberActivatedEvent {
  pub service_name: String,
  pub cluster_id: String,
  pub member_id: String,

  #[serde(default)]
  pub member_ip: String,

  #[serde(default)]
  pub network_partition_id: String,

  #[serde(default)]
  pub port_map: BTreeMap<String, Port>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceCleanupClusterEvent {
  pub cluster_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceCleanupMemberEvent {
  pub member_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeMountEvent {
  #[serde(default)]
  pub persistence_mappings: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberLifecycleEvent {
  pub service_name: String,
  pub cluster_id: String,
  pub member_id: String,
}
