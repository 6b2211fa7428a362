use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Member property flagging a well-known-address member.
pub const PRIMARY_PROPERTY: &str = "PRIMARY";

/// Member property overriding the readiness threshold of its group.
pub const MIN_COUNT_PROPERTY: &str = "MIN_COUNT";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberStatus {
  Created,
  Starting,
  Activated,
  #[serde(alias = "In_Maintenance", alias = "InMaintenance")]
  InMaintenance,
  Terminated,
}

impl MemberStatus {
  /// Whether the member counts towards a readiness threshold.
  pub fn is_live(&self) -> bool {
    matches!(self, MemberStatus::Starting | MemberStatus::Activated)
  }
}

impl fmt::Display for MemberStatus {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let s = match self {
      MemberStatus::Created => "Created",
      MemberStatus::Starting => "Starting",
      MemberStatus::Activated => "Activated",
      MemberStatus::InMaintenance => "In_Maintenance",
      MemberStatus::Terminated => "Terminated",
    };
    write!(f, "{}", s)
  }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Port {
  pub protocol: String,
  pub value: u32,
  pub proxy: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Member {
  pub member_id: String,

  #[serde(default)]
  pub member_ip: String,

  #[serde(default)]
  pub public_ip: String,

  pub status: MemberStatus,

  #[serde(default)]
  pub properties: BTreeMap<String, String>,

  /// Owning cluster, by id only.
  pub cluster_id: String,

  #[serde(default)]
  pub lb_cluster_id: Option<String>,

  #[serde(default)]
  pub network_partition_id: String,
}

impl Member {
  pub fn property(&self, key: &str) -> Option<&str> {
    self.properties.get(key).map(String::as_str)
  }

  /// `PRIMARY` is present and case-insensitively equals `true`.
  pub fn is_primary(&self) -> bool {
    self
      .property(PRIMARY_PROPERTY)
      .is_some_and(|v| v.eq_ignore_ascii_case("true"))
  }

  /// A primary member that is starting or activated.
  pub fn is_well_known_candidate(&self) -> bool {
    self.is_primary() && self.status.is_live()
  }
}

impl fmt::Display for Member {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}@{}({})", self.member_id, self.member_ip, self.status)
  }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Cluster {
  pub cluster_id: String,

  pub service_name: String,

  #[serde(default)]
  pub members: Vec<Member>,

  #[serde(default)]
  pub properties: BTreeMap<String, String>,
}

impl Cluster {
  pub fn members(&self) -> &[Member] {
    &self.members
  }

  pub fn member(&self, member_id: &str) -> Option<&Member> {
    self.members.iter().find(|m| m.member_id == member_id)
  }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Service {
  pub service_name: String,

  /// Kept in topology order; "first cluster" lookups depend on it.
  #[serde(default)]
  pub clusters: Vec<Cluster>,

  #[serde(default)]
  pub properties: BTreeMap<String, String>,
}

impl Service {
  pub fn clusters(&self) -> &[Cluster] {
    &self.clusters
  }

  pub fn cluster(&self, cluster_id: &str) -> Option<&Cluster> {
    self.clusters.iter().find(|c| c.cluster_id == cluster_id)
  }

  pub fn first_cluster(&self) -> Option<&Cluster> {
    self.clusters.first()
  }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
  #[serde(default)]
  pub services: BTreeMap<String, Service>,

  /// Nothing in the snapshot may be trusted until this is set.
  #[serde(default)]
  pub initialized: bool,
}

impl Topology {
  pub fn service(&self, service_name: &str) -> Option<&Service> {
    self.services.get(service_name)
  }

  /// Find a cluster by id in any service.
  pub fn find_cluster(&self, cluster_id: &str) -> Option<&Cluster> {
    self
      .services
      .values()
      .find_map(|service| service.cluster(cluster_id))
  }

  pub fn add_service(&mut self, service: Service) {
    self.services.insert(service.service_name.clone(), service);
  }
}
