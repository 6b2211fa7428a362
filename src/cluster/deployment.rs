use std::fmt;

use crate::config::AgentConfig;

pub const API_MANAGER_GROUP: &str = "apim";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentRole {
  Manager,
  Worker,
}

impl DeploymentRole {
  /// Case-insensitive; anything else means a non-separated deployment.
  pub fn parse(raw: &str) -> Option<Self> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("manager") {
      Some(DeploymentRole::Manager)
    } else if raw.eq_ignore_ascii_case("worker") {
      Some(DeploymentRole::Worker)
    } else {
      None
    }
  }
}

impl fmt::Display for DeploymentRole {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      DeploymentRole::Manager => write!(f, "manager"),
      DeploymentRole::Worker => write!(f, "worker"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceGroup {
  /// Co-deployed API manager components (store, publisher, gateway, key manager).
  ApiManager,
  Other(String),
}

impl ServiceGroup {
  pub fn parse(raw: &str) -> Self {
    if raw == API_MANAGER_GROUP {
      ServiceGroup::ApiManager
    } else {
      ServiceGroup::Other(raw.to_string())
    }
  }
}

/// The deployment shape of this node, as far as readiness resolution cares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentDescriptor {
  pub service_group: Option<String>,
  pub service_name: String,
  pub cluster_id: String,
  /// Raw deployment pattern as configured; exported verbatim as `DEPLOYMENT`.
  pub deployment: Option<String>,
  pub manager_service_name: Option<String>,
  pub worker_service_name: Option<String>,
  pub min_count: u32,
}

impl DeploymentDescriptor {
  pub fn from_config(config: &AgentConfig) -> Self {
    Self {
      service_group: config.service_group.clone(),
      service_name: config.service_name.clone(),
      cluster_id: config.cluster_id.clone(),
      deployment: config.deployment.clone(),
      manager_service_name: config.manager_service_name.clone(),
      worker_service_name: config.worker_service_name.clone(),
      min_count: config.min_count,
    }
  }

  pub fn service_group(&self) -> Option<ServiceGroup> {
    self.service_group.as_deref().map(ServiceGroup::parse)
  }

  pub fn role(&self) -> Option<DeploymentRole> {
    self.deployment.as_deref().and_then(DeploymentRole::parse)
  }
}
