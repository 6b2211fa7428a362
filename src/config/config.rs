use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use super::default::DEFAULT_ARTIFACT_UPDATE_INTERVAL_SECS;
use super::default::MAX_ARTIFACT_UPDATE_INTERVAL_SECS;
use super::default::default_auto_checkout;
use super::default::default_extensions_dir;
use super::default::default_max_well_known_members;
use super::default::default_min_count;
use super::default::default_supertenant_temp_path;
use super::param::ParamValue;
use crate::error::StartupError;

/// Node-wide agent settings, loaded once and shared read-only.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AgentConfig {
  pub service_name: String,

  pub cluster_id: String,

  pub member_id: String,

  #[serde(default)]
  pub network_partition_id: String,

  /// Grouped multi-service deployment tag, e.g. `apim`.
  #[serde(default)]
  pub service_group: Option<String>,

  /// Raw deployment pattern, `manager` or `worker` for separated deployments.
  #[serde(default)]
  pub deployment: Option<String>,

  #[serde(default)]
  pub manager_service_name: Option<String>,

  #[serde(default)]
  pub worker_service_name: Option<String>,

  #[serde(default = "default_min_count")]
  pub min_count: u32,

  #[serde(default)]
  pub clustered: bool,

  #[serde(default)]
  pub multitenant: bool,

  pub app_path: PathBuf,

  /// Secret used to decrypt repository passwords.
  #[serde(default)]
  pub cartridge_key: String,

  #[serde(default)]
  pub enable_artifact_update: bool,

  #[serde(default)]
  pub auto_commit: bool,

  #[serde(default = "default_auto_checkout")]
  pub auto_checkout: bool,

  /// Kept as text; see [`AgentConfig::artifact_update_interval`].
  #[serde(default)]
  pub artifact_update_interval: Option<String>,

  #[serde(default = "default_extensions_dir")]
  pub extensions_dir: PathBuf,

  #[serde(default = "default_max_well_known_members")]
  pub max_well_known_members: usize,

  /// Where a multitenant node stages the super tenant's deployed artifacts
  /// on instance start.
  #[serde(default = "default_supertenant_temp_path")]
  pub supertenant_temp_path: PathBuf,
}

impl AgentConfig {
  /// Read and parse a TOML configuration file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, StartupError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
      .map_err(|e| StartupError::load_error(path.display().to_string(), &e))?;
    toml::from_str(&content).map_err(|e| StartupError::load_error(path.display().to_string(), &e))
  }

  pub fn validate(&self) -> Result<(), StartupError> {
    let required = [
      ("service_name", self.service_name.as_str()),
      ("cluster_id", self.cluster_id.as_str()),
      ("member_id", self.member_id.as_str()),
    ];
    for (name, value) in required {
      if value.trim().is_empty() {
        return Err(StartupError::invalid_config(format!("`{}` must not be empty", name)));
      }
    }

    if self.app_path.as_os_str().is_empty() {
      return Err(StartupError::invalid_config("`app_path` must not be empty"));
    }

    if self.max_well_known_members == 0 {
      return Err(StartupError::invalid_config(
        "`max_well_known_members` must be greater than zero",
      ));
    }

    Ok(())
  }

  /// Recurring artifact sync interval. Anything other than a number of
  /// seconds between 1 and one day falls back to the 10 second default.
  pub fn artifact_update_interval(&self) -> Duration {
    let secs = match ParamValue::<u64>::parse(self.artifact_update_interval.as_deref())
      .require(|secs| (1..=MAX_ARTIFACT_UPDATE_INTERVAL_SECS).contains(secs))
    {
      ParamValue::Valid(secs) => secs,
      ParamValue::Absent => DEFAULT_ARTIFACT_UPDATE_INTERVAL_SECS,
      ParamValue::Invalid(raw) => {
        warn!(
          value = %raw,
          default_secs = DEFAULT_ARTIFACT_UPDATE_INTERVAL_SECS,
          "Invalid artifact sync interval specified, using default"
        );
        DEFAULT_ARTIFACT_UPDATE_INTERVAL_SECS
      }
    };
    Duration::from_secs(secs)
  }

  /// Server artifacts copied aside on a multitenant instance start.
  pub fn deployed_artifacts_path(&self) -> PathBuf {
    self.app_path.join("repository").join("deployment").join("server")
  }

  /// Local working copy for a tenant's artifacts.
  pub fn artifact_path(&self, tenant_id: &str) -> PathBuf {
    if self.multitenant && !tenant_id.is_empty() {
      self.app_path.join(tenant_id)
    } else {
      self.app_path.clone()
    }
  }
}
