use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::deployment::DeploymentDescriptor;
use super::deployment::ServiceGroup;
use super::quorum::flat_quorum;
use super::quorum::separated_quorum;
use super::well_known::WellKnownMemberSet;
use crate::extension::EnvParams;
use crate::extension::env;
use crate::topology::Member;
use crate::topology::Topology;

const APISTORE_SERVICE: &str = "apistore";
const PUBLISHER_SERVICE: &str = "publisher";
const GATEWAY_MANAGER_SERVICE: &str = "gatewaymgt";
const GATEWAY_SERVICE: &str = "gateway";
const KEY_MANAGER_SERVICE: &str = "keymanager";

/// Outcome of one readiness resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Readiness {
  pub ready: bool,
  /// Parameters for the extension scripts. Partial results are kept even
  /// when not ready.
  pub env: EnvParams,
}

/// Decides whether enough well-known members are up to bootstrap clustering.
///
/// Missing services, clusters or names never raise; they resolve to not
/// ready.
#[derive(Debug)]
pub struct ReadinessResolver {
  descriptor: DeploymentDescriptor,
  well_known: WellKnownMemberSet,
}

impl ReadinessResolver {
  pub fn new(descriptor: DeploymentDescriptor, max_well_known_members: usize) -> Self {
    Self {
      descriptor,
      well_known: WellKnownMemberSet::with_capacity(max_well_known_members),
    }
  }

  pub fn descriptor(&self) -> &DeploymentDescriptor {
    &self.descriptor
  }

  pub fn well_known(&self) -> &WellKnownMemberSet {
    &self.well_known
  }

  pub fn reset_well_known(&mut self) {
    self.well_known.reset();
  }

  /// Resolve readiness against `topology`, with `min_count` as the
  /// threshold for a single-cluster deployment.
  pub fn resolve(&mut self, topology: &Topology, min_count: u32) -> Readiness {
    let mut env = EnvParams::new();

    if !topology.initialized {
      debug!("Topology is not initialized, well-known members are not ready");
      return Readiness { ready: false, env };
    }

    if let Some(group) = &self.descriptor.service_group {
      env.insert(env::SERVICE_GROUP.to_string(), group.clone());
    }

    let (ready, selected) = match self.descriptor.service_group() {
      Some(ServiceGroup::ApiManager) => self.resolve_api_manager(topology, &mut env),
      _ => self.resolve_generic(topology, min_count, &mut env),
    };

    if ready {
      for member in selected {
        self.well_known.insert(member);
      }
    }

    debug!(
      ready,
      well_known = self.well_known.len(),
      "Well-known member group resolved"
    );
    Readiness { ready, env }
  }

  fn resolve_generic<'t>(
    &self,
    topology: &'t Topology,
    min_count: u32,
    env: &mut EnvParams,
  ) -> (bool, Vec<&'t Member>) {
    if self.descriptor.role().is_some() {
      return self.resolve_separated(topology, env);
    }
    self.resolve_flat(topology, min_count, env)
  }

  fn resolve_flat<'t>(
    &self,
    topology: &'t Topology,
    min_count: u32,
    env: &mut EnvParams,
  ) -> (bool, Vec<&'t Member>) {
    let service_name = &self.descriptor.service_name;
    let cluster_id = &self.descriptor.cluster_id;

    let Some(service) = topology.service(service_name) else {
      warn!(service = %service_name, "Service is not found");
      return (false, Vec::new());
    };
    let Some(cluster) = service.cluster(cluster_id) else {
      warn!(service = %service_name, cluster_id = %cluster_id, "Cluster is not found");
      return (false, Vec::new());
    };

    let outcome = flat_quorum(cluster.members(), min_count);
    for member in &outcome.selected {
      debug!(member_id = %member.member_id, member_ip = %member.member_ip, "Found WKA member");
    }

    if !outcome.ready {
      debug!(
        found = outcome.selected.len(),
        min_count = outcome.min_count,
        "Not enough WKA members"
      );
      return (false, Vec::new());
    }

    for (idx, member) in outcome.selected.iter().enumerate() {
      env.insert(env::wk_member_ip(idx), member.member_ip.clone());
    }
    (true, outcome.selected)
  }

  fn resolve_separated<'t>(
    &self,
    topology: &'t Topology,
    env: &mut EnvParams,
  ) -> (bool, Vec<&'t Member>) {
    if let Some(deployment) = &self.descriptor.deployment {
      info!(deployment = %deployment, "Deployment pattern for the node");
      env.insert(env::DEPLOYMENT.to_string(), deployment.clone());
    }

    let manager_service_name = self.descriptor.manager_service_name.as_deref().unwrap_or("");
    let worker_service_name = self.descriptor.worker_service_name.as_deref().unwrap_or("");

    if manager_service_name.trim().is_empty() {
      error!(name = %manager_service_name, "Manager service name is invalid");
      return (false, Vec::new());
    }
    if worker_service_name.trim().is_empty() {
      error!(name = %worker_service_name, "Worker service name is invalid");
      return (false, Vec::new());
    }

    let Some(manager_service) = topology.service(manager_service_name) else {
      warn!(service = %manager_service_name, "Service is not found");
      return (false, Vec::new());
    };
    let Some(worker_service) = topology.service(worker_service_name) else {
      warn!(service = %worker_service_name, "Service is not found");
      return (false, Vec::new());
    };

    if manager_service.clusters().is_empty() {
      warn!(service = %manager_service_name, "No clusters found for service");
      return (false, Vec::new());
    }
    if worker_service.clusters().is_empty() {
      warn!(service = %worker_service_name, "No clusters found for service");
      return (false, Vec::new());
    }

    let Some(outcome) = separated_quorum(manager_service.clusters(), worker_service.clusters())
    else {
      return (false, Vec::new());
    };

    if outcome.manager.ready {
      for (idx, member) in outcome.manager.selected.iter().enumerate() {
        env.insert(env::wk_manager_member_ip(idx), member.member_ip.clone());
      }
      env.insert(
        env::WK_MANAGER_MEMBER_COUNT.to_string(),
        outcome.manager.min_count.to_string(),
      );
    }

    if outcome.worker.ready {
      for (idx, member) in outcome.worker.selected.iter().enumerate() {
        env.insert(env::wk_worker_member_ip(idx), member.member_ip.clone());
      }
      env.insert(
        env::WK_WORKER_MEMBER_COUNT.to_string(),
        outcome.worker.min_count.to_string(),
      );
    }

    debug!(
      manager_ready = outcome.manager_ready(),
      worker_ready = outcome.worker.ready,
      "Manager/worker WKA groups evaluated"
    );

    let ready = outcome.ready();
    let mut selected = outcome.manager.selected;
    selected.extend(outcome.worker.selected);
    (ready, selected)
  }

  fn resolve_api_manager<'t>(
    &self,
    topology: &'t Topology,
    env: &mut EnvParams,
  ) -> (bool, Vec<&'t Member>) {
    match self.descriptor.service_name.as_str() {
      APISTORE_SERVICE | PUBLISHER_SERVICE => self.resolve_api_store_and_publisher(topology, env),
      GATEWAY_MANAGER_SERVICE | GATEWAY_SERVICE => {
        if self.descriptor.role().is_some() {
          self.resolve_separated(topology, env)
        } else {
          (false, Vec::new())
        }
      }
      KEY_MANAGER_SERVICE => (true, Vec::new()),
      other => {
        debug!(service = %other, "Service is not clustered within the API manager group");
        (false, Vec::new())
      }
    }
  }

  /// Store and publisher members count as soon as they are live; no
  /// `PRIMARY` flag is needed.
  fn resolve_api_store_and_publisher<'t>(
    &self,
    topology: &'t Topology,
    env: &mut EnvParams,
  ) -> (bool, Vec<&'t Member>) {
    let Some(store_members) = live_members_of_first_cluster(topology, APISTORE_SERVICE) else {
      return (false, Vec::new());
    };
    let Some(store_member) = store_members.first() else {
      debug!("API Store members not yet created");
      return (false, Vec::new());
    };
    env.insert(
      env::WK_APISTORE_MEMBER_IP.to_string(),
      store_member.member_ip.clone(),
    );

    let Some(publisher_members) = live_members_of_first_cluster(topology, PUBLISHER_SERVICE) else {
      return (false, Vec::new());
    };
    let Some(publisher_member) = publisher_members.first() else {
      debug!("API Publisher members not yet created");
      return (false, Vec::new());
    };
    env.insert(
      env::WK_PUBLISHER_MEMBER_IP.to_string(),
      publisher_member.member_ip.clone(),
    );

    let mut selected = store_members;
    selected.extend(publisher_members);
    (true, selected)
  }
}

fn live_members_of_first_cluster<'t>(
  topology: &'t Topology,
  service_name: &str,
) -> Option<Vec<&'t Member>> {
  let Some(service) = topology.service(service_name) else {
    warn!(service = %service_name, "Service is not found");
    return None;
  };
  let Some(cluster) = service.first_cluster() else {
    warn!(service = %service_name, "No clusters found for service");
    return None;
  };
  Some(
    cluster
      .members()
      .iter()
      .filter(|member| member.status.is_live())
      .collect(),
  )
}
