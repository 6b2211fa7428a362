//! Environment keys handed to extension scripts. The scripts match on these
//! names, so they must not change.

use std::collections::BTreeMap;

/// Flat string-to-string map passed to every extension hook.
pub type EnvParams = BTreeMap<String, String>;

pub const ARTIFACT_UPDATED_CLUSTER_ID: &str = "STRATOS_ARTIFACT_UPDATED_CLUSTER_ID";
pub const ARTIFACT_UPDATED_TENANT_ID: &str = "STRATOS_ARTIFACT_UPDATED_TENANT_ID";
pub const ARTIFACT_UPDATED_REPO_URL: &str = "STRATOS_ARTIFACT_UPDATED_REPO_URL";
pub const ARTIFACT_UPDATED_REPO_PASSWORD: &str = "STRATOS_ARTIFACT_UPDATED_REPO_PASSWORD";
pub const ARTIFACT_UPDATED_REPO_USERNAME: &str = "STRATOS_ARTIFACT_UPDATED_REPO_USERNAME";
pub const ARTIFACT_UPDATED_STATUS: &str = "STRATOS_ARTIFACT_UPDATED_STATUS";
pub const ARTIFACT_UPDATED_SCHEDULER: &str = "STRATOS_ARTIFACT_UPDATED_SCHEDULER";

pub const MEMBER_ACTIVATED_MEMBER_IP: &str = "STRATOS_MEMBER_ACTIVATED_MEMBER_IP";
pub const MEMBER_ACTIVATED_MEMBER_ID: &str = "STRATOS_MEMBER_ACTIVATED_MEMBER_ID";
pub const MEMBER_ACTIVATED_CLUSTER_ID: &str = "STRATOS_MEMBER_ACTIVATED_CLUSTER_ID";
pub const MEMBER_ACTIVATED_LB_CLUSTER_ID: &str = "STRATOS_MEMBER_ACTIVATED_LB_CLUSTER_ID";
pub const MEMBER_ACTIVATED_NETWORK_PARTITION_ID: &str =
  "STRATOS_MEMBER_ACTIVATED_NETWORK_PARTITION_ID";
pub const MEMBER_ACTIVATED_SERVICE_NAME: &str = "STRATOS_MEMBER_ACTIVATED_SERVICE_NAME";
pub const MEMBER_ACTIVATED_PORTS: &str = "STRATOS_MEMBER_ACTIVATED_PORTS";
pub const MEMBER_ACTIVATED_MEMBER_LIST_JSON: &str = "STRATOS_MEMBER_ACTIVATED_MEMBER_LIST_JSON";
pub const MEMBER_ACTIVATED_LB_IP: &str = "STRATOS_MEMBER_ACTIVATED_LB_IP";
pub const MEMBER_ACTIVATED_LB_PUBLIC_IP: &str = "STRATOS_MEMBER_ACTIVATED_LB_PUBLIC_IP";
pub const MEMBER_ACTIVATED_SERVICE_PROPERTY: &str = "MEMBER_ACTIVATED_SERVICE_PROPERTY";
pub const MEMBER_ACTIVATED_CLUSTER_PROPERTY: &str = "MEMBER_ACTIVATED_CLUSTER_PROPERTY";
pub const MEMBER_ACTIVATED_MEMBER_PROPERTY: &str = "MEMBER_ACTIVATED_MEMBER_PROPERTY";
pub const TOPOLOGY_JSON: &str = "STRATOS_TOPOLOGY_JSON";

pub const UPDATE_WK_IP: &str = "STRATOS_UPDATE_WK_IP";
pub const CLUSTERING: &str = "STRATOS_CLUSTERING";
pub const WK_MEMBER_COUNT: &str = "STRATOS_WK_MEMBER_COUNT";
pub const WK_MANAGER_MEMBER_COUNT: &str = "STRATOS_WK_MANAGER_MEMBER_COUNT";
pub const WK_WORKER_MEMBER_COUNT: &str = "STRATOS_WK_WORKER_MEMBER_COUNT";
pub const WK_APISTORE_MEMBER_IP: &str = "STRATOS_WK_APISTORE_MEMBER_IP";
pub const WK_PUBLISHER_MEMBER_IP: &str = "STRATOS_WK_PUBLISHER_MEMBER_IP";
pub const SERVICE_GROUP: &str = "STRATOS_SERVICE_GROUP";
pub const DEPLOYMENT: &str = "DEPLOYMENT";

pub const PERSISTENCE_MAPPINGS: &str = "STRATOS_PERSISTENCE_MAPPINGS";

pub const COPY_ARTIFACTS_SOURCE: &str = "STRATOS_COPY_ARTIFACTS_SOURCE";
pub const COPY_ARTIFACTS_DESTINATION: &str = "STRATOS_COPY_ARTIFACTS_DESTINATION";

/// `STRATOS_WK_MEMBER_<n>_IP`
pub fn wk_member_ip(index: usize) -> String {
  format!("STRATOS_WK_MEMBER_{}_IP", index)
}

/// `STRATOS_WK_MANAGER_MEMBER_<n>_IP`
pub fn wk_manager_member_ip(index: usize) -> String {
  format!("STRATOS_WK_MANAGER_MEMBER_{}_IP", index)
}

/// `STRATOS_WK_WORKER_MEMBER_<n>_IP`
pub fn wk_worker_member_ip(index: usize) -> String {
  format!("STRATOS_WK_WORKER_MEMBER_{}_IP", index)
}

/// Copy `properties` into `env` as `STRATOS_<prefix>_<key>`.
pub fn add_properties<'a>(
  env: &mut EnvParams,
  prefix: &str,
  properties: impl IntoIterator<Item = (&'a String, &'a String)>,
) {
  for (key, value) in properties {
    env.insert(format!("STRATOS_{}_{}", prefix, key), value.clone());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_indexed_keys() {
    assert_eq!("STRATOS_WK_MEMBER_0_IP", wk_member_ip(0));
    assert_eq!("STRATOS_WK_MANAGER_MEMBER_2_IP", wk_manager_member_ip(2));
    assert_eq!("STRATOS_WK_WORKER_MEMBER_11_IP", wk_worker_member_ip(11));
  }

  #[test]
  fn test_add_properties() {
    let mut properties = BTreeMap::new();
    properties.insert("PRIMARY".to_string(), "true".to_string());

    let mut env = EnvParams::new();
    add_properties(&mut env, MEMBER_ACTIVATED_MEMBER_PROPERTY, &properties);

    assert_eq!(
      Some("true"),
      env
        .get("STRATOS_MEMBER_ACTIVATED_MEMBER_PROPERTY_PRIMARY")
        .map(String::as_str)
    );
  }
}
