use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::publisher::EventPublisher;
use super::publisher::StatusEvent;
use super::publisher::StatusKind;
use super::types::AgentEvent;
use super::types::ArtifactsUpdatedEvent;
use super::types::MemberActivatedEvent;
use crate::artifact::ArtifactSyncOrchestrator;
use crate::artifact::CredentialDecryptor;
use crate::artifact::RepositoryCredentials;
use crate::artifact::RepositoryInfo;
use crate::cluster::DeploymentDescriptor;
use crate::cluster::ReadinessResolver;
use crate::config::AgentConfig;
use crate::extension::EnvParams;
use crate::extension::ExtensionHook;
use crate::extension::ExtensionRunner;
use crate::extension::env;
use crate::topology::TopologySource;

/// State shared with spawned artifact tasks.
struct Shared {
  config: Arc<AgentConfig>,
  orchestrator: ArtifactSyncOrchestrator,
  decryptor: Arc<dyn CredentialDecryptor>,
  extensions: Arc<dyn ExtensionRunner>,
  publisher: Arc<dyn EventPublisher>,
}

impl Shared {
  async fn run_extension(&self, hook: ExtensionHook, env: &EnvParams) {
    if let Err(e) = self.extensions.run_extension(hook, env).await {
      error!(hook = %hook, error = %e, "Extension failed");
    }
  }

  async fn publish(&self, kind: StatusKind) {
    let event = StatusEvent::for_node(kind, &self.config);
    if let Err(e) = self.publisher.publish(event).await {
      error!(error = %e, "Can not publish status event");
    }
  }
}

/// Routes platform events to the resolver, the orchestrator and the
/// extension hooks. Events are handled one at a time; artifact checkouts
/// run on their own tasks.
pub struct EventDispatcher {
  shared: Arc<Shared>,
  topology: Arc<dyn TopologySource>,
  resolver: ReadinessResolver,
  artifact_tasks: JoinSet<()>,
}

impl EventDispatcher {
  pub fn new(
    config: Arc<AgentConfig>,
    topology: Arc<dyn TopologySource>,
    orchestrator: ArtifactSyncOrchestrator,
    decryptor: Arc<dyn CredentialDecryptor>,
    extensions: Arc<dyn ExtensionRunner>,
    publisher: Arc<dyn EventPublisher>,
  ) -> Self {
    let resolver = ReadinessResolver::new(
      DeploymentDescriptor::from_config(&config),
      config.max_well_known_members,
    );
    Self {
      shared: Arc::new(Shared {
        config,
        orchestrator,
        decryptor,
        extensions,
        publisher,
      }),
      topology,
      resolver,
      artifact_tasks: JoinSet::new(),
    }
  }

  pub fn resolver(&self) -> &ReadinessResolver {
    &self.resolver
  }

  pub fn orchestrator(&self) -> &ArtifactSyncOrchestrator {
    &self.shared.orchestrator
  }

  pub async fn dispatch(&mut self, event: AgentEvent) {
    self.reap_finished();
    debug!(event = event.name(), "Dispatching event");

    match event {
      AgentEvent::InstanceStarted => {
        let config = &self.shared.config;
        if config.multitenant {
          let mut env = EnvParams::new();
          env.insert(
            env::COPY_ARTIFACTS_SOURCE.to_string(),
            format!("{}/", config.deployed_artifacts_path().display()),
          );
          env.insert(
            env::COPY_ARTIFACTS_DESTINATION.to_string(),
            config.supertenant_temp_path.display().to_string(),
          );
          self
            .shared
            .run_extension(ExtensionHook::CopyArtifacts, &env)
            .await;
        }
        self
          .shared
          .run_extension(ExtensionHook::InstanceStarted, &EnvParams::new())
          .await;
      }
      AgentEvent::InstanceActivated => {
        self
          .shared
          .run_extension(ExtensionHook::InstanceActivated, &EnvParams::new())
          .await;
      }
      AgentEvent::ArtifactsUpdated(event) => self.on_artifacts_updated(event),
      AgentEvent::MemberActivated(event) => self.on_member_activated(event).await,
      AgentEvent::InstanceCleanupCluster(event) => {
        if event.cluster_id == self.shared.config.cluster_id {
          self.cleanup().await;
        }
      }
      AgentEvent::InstanceCleanupMember(event) => {
        if event.member_id == self.shared.config.member_id {
          self.cleanup().await;
        }
      }
      AgentEvent::VolumeMount(event) => {
        let mut env = EnvParams::new();
        env.insert(
          env::PERSISTENCE_MAPPINGS.to_string(),
          event.persistence_mappings,
        );
        self
          .shared
          .run_extension(ExtensionHook::VolumeMount, &env)
          .await;
      }
      AgentEvent::TopologyResync => {
        info!(
          forgotten = self.resolver.well_known().len(),
          "Topology re-synchronized, resetting well-known members"
        );
        self.resolver.reset_well_known();
      }
      AgentEvent::CompleteTopology
      | AgentEvent::MemberStarted(_)
      | AgentEvent::MemberSuspended(_)
      | AgentEvent::MemberTerminated(_) => {}
    }
  }

  /// Wait for every artifact task started so far.
  pub async fn drain(&mut self) {
    while let Some(joined) = self.artifact_tasks.join_next().await {
      if let Err(e) = joined {
        error!(error = %e, "Artifact task aborted");
      }
    }
  }

  fn reap_finished(&mut self) {
    while let Some(joined) = self.artifact_tasks.try_join_next() {
      if let Err(e) = joined {
        error!(error = %e, "Artifact task aborted");
      }
    }
  }

  async fn cleanup(&self) {
    info!(member_id = %self.shared.config.member_id, "Instance cleanup requested");
    self.shared.publish(StatusKind::MaintenanceMode).await;
    self
      .shared
      .run_extension(ExtensionHook::Cleanup, &EnvParams::new())
      .await;
    self.shared.publish(StatusKind::ReadyToShutdown).await;
  }

  fn on_artifacts_updated(&mut self, event: ArtifactsUpdatedEvent) {
    let config = &self.shared.config;
    let cluster_id = event.cluster_id.trim();
    if cluster_id != config.cluster_id {
      debug!(
        event_cluster_id = cluster_id,
        cluster_id = %config.cluster_id,
        "Artifacts updated event is for another cluster"
      );
      return;
    }
    if event.repo_url.trim().is_empty() {
      warn!(cluster_id, "Artifacts updated event carries no repository url");
      return;
    }

    let shared = self.shared.clone();
    self.artifact_tasks.spawn(async move {
      shared.update_artifacts(event).await;
    });
  }

  async fn on_member_activated(&mut self, event: MemberActivatedEvent) {
    info!(
      service_name = %event.service_name,
      cluster_id = %event.cluster_id,
      member_id = %event.member_id,
      "Member activated event received"
    );

    let config = &self.shared.config;
    let topology = self.topology.snapshot();

    let Some(service) = topology.service(&event.service_name) else {
      error!(service_name = %event.service_name, "Topology is inconsistent, service not found");
      return;
    };
    let Some(cluster) = service.cluster(&event.cluster_id) else {
      error!(cluster_id = %event.cluster_id, "Topology is inconsistent, cluster not found");
      return;
    };
    let Some(member) = cluster.member(&event.member_id) else {
      error!(member_id = %event.member_id, "Topology is inconsistent, member not found");
      return;
    };

    let lb_cluster_id = member.lb_cluster_id.clone().unwrap_or_default();
    let relevant = event.cluster_id == config.cluster_id || lb_cluster_id == config.cluster_id;
    if !relevant {
      debug!(cluster_id = %event.cluster_id, "Member activated event is not relevant");
      return;
    }

    let mut env = EnvParams::new();
    env.insert(env::MEMBER_ACTIVATED_MEMBER_IP.to_string(), event.member_ip.clone());
    env.insert(env::MEMBER_ACTIVATED_MEMBER_ID.to_string(), event.member_id.clone());
    env.insert(env::MEMBER_ACTIVATED_CLUSTER_ID.to_string(), event.cluster_id.clone());
    env.insert(env::MEMBER_ACTIVATED_LB_CLUSTER_ID.to_string(), lb_cluster_id.clone());
    env.insert(
      env::MEMBER_ACTIVATED_NETWORK_PARTITION_ID.to_string(),
      event.network_partition_id.clone(),
    );
    env.insert(env::MEMBER_ACTIVATED_SERVICE_NAME.to_string(), event.service_name.clone());

    let ports: String = event
      .port_map
      .values()
      .map(|port| format!("{},{},{}|", port.protocol, port.value, port.proxy))
      .collect();
    env.insert(env::MEMBER_ACTIVATED_PORTS.to_string(), ports);

    let member_list = cluster
      .members()
      .iter()
      .map(to_json)
      .collect::<Vec<_>>()
      .join(",");
    env.insert(env::MEMBER_ACTIVATED_MEMBER_LIST_JSON.to_string(), member_list);

    if let Some(lb_member) = topology
      .find_cluster(&lb_cluster_id)
      .and_then(|lb_cluster| lb_cluster.members().first())
    {
      env.insert(env::MEMBER_ACTIVATED_LB_IP.to_string(), lb_member.member_ip.clone());
      env.insert(
        env::MEMBER_ACTIVATED_LB_PUBLIC_IP.to_string(),
        lb_member.public_ip.clone(),
      );
    }

    env.insert(env::TOPOLOGY_JSON.to_string(), to_json(&*topology));

    env::add_properties(&mut env, env::MEMBER_ACTIVATED_SERVICE_PROPERTY, &service.properties);
    env::add_properties(&mut env, env::MEMBER_ACTIVATED_CLUSTER_PROPERTY, &cluster.properties);
    env::add_properties(&mut env, env::MEMBER_ACTIVATED_MEMBER_PROPERTY, &member.properties);

    if member.is_primary() && config.clustered {
      // Must be decided before resolving, which records the member.
      let has_wk_ip_changed = !self.resolver.well_known().contains_ip(&event.member_ip);
      let readiness = self.resolver.resolve(&topology, config.min_count);
      debug!(
        has_wk_ip_changed,
        ready = readiness.ready,
        min_count = config.min_count,
        "Well-known member group evaluated"
      );
      env.extend(readiness.env);
      if has_wk_ip_changed && readiness.ready {
        env.insert(env::UPDATE_WK_IP.to_string(), "true".to_string());
      }
    }

    env.insert(env::CLUSTERING.to_string(), config.clustered.to_string());
    env.insert(env::WK_MEMBER_COUNT.to_string(), config.min_count.to_string());

    self
      .shared
      .run_extension(ExtensionHook::MemberActivated, &env)
      .await;
  }
}

impl Shared {
  async fn update_artifacts(&self, event: ArtifactsUpdatedEvent) {
    let config = &self.config;

    let password = match self
      .decryptor
      .decrypt(&event.repo_password, &config.cartridge_key)
    {
      Ok(password) => password,
      Err(e) => {
        error!(repo = %event.repo_url, error = %e, "Can not decrypt repository password");
        return;
      }
    };

    let info = RepositoryInfo {
      repo_url: event.repo_url.clone(),
      local_repo_path: config.artifact_path(&event.tenant_id),
      credentials: RepositoryCredentials::new(event.repo_username.clone(), password),
      tenant_id: event.tenant_id.clone(),
      is_multitenant: config.multitenant,
      commit_enabled: event.commit_enabled,
    };

    let checkout = match self.orchestrator.checkout(info.clone()).await {
      Ok(checkout) => checkout,
      Err(e) => {
        error!(repo = %info, error = %e, "Artifact checkout failed");
        return;
      }
    };

    let mut env = EnvParams::new();
    env.insert(env::ARTIFACT_UPDATED_CLUSTER_ID.to_string(), event.cluster_id.trim().to_string());
    env.insert(env::ARTIFACT_UPDATED_TENANT_ID.to_string(), event.tenant_id.clone());
    env.insert(env::ARTIFACT_UPDATED_REPO_URL.to_string(), event.repo_url.clone());
    env.insert(env::ARTIFACT_UPDATED_REPO_PASSWORD.to_string(), event.repo_password.clone());
    env.insert(env::ARTIFACT_UPDATED_REPO_USERNAME.to_string(), event.repo_username.clone());
    env.insert(env::ARTIFACT_UPDATED_STATUS.to_string(), event.status.clone());
    self.run_extension(ExtensionHook::ArtifactsUpdated, &env).await;

    if checkout.activated_trigger {
      self.publish(StatusKind::InstanceActivated).await;
    }

    if config.enable_artifact_update {
      let auto_commit = config.auto_commit && info.commit_enabled;
      let interval = config.artifact_update_interval();
      if let Err(e) =
        self
          .orchestrator
          .schedule_recurring(info, config.auto_checkout, auto_commit, interval)
      {
        warn!(error = %e, "Can not schedule artifact updates");
      }
    } else {
      debug!("Periodic artifact updates are disabled");
    }
  }
}

fn to_json<T: Serialize>(value: &T) -> String {
  match serde_json::to_string(value) {
    Ok(json) => json,
    Err(e) => {
      warn!(error = %e, "Can not encode value as JSON");
      String::new()
    }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;
  use std::path::Path;
  use std::path::PathBuf;
  use std::sync::atomic::Ordering;
  use std::time::Duration;

  use super::*;
  use crate::event::InstanceCleanupClusterEvent;
  use crate::event::InstanceCleanupMemberEvent;
  use crate::event::VolumeMountEvent;
  use crate::testing::MockExtensions;
  use crate::testing::MockPublisher;
  use crate::testing::MockRepository;
  use crate::testing::ReversingDecryptor;
  use crate::topology::Cluster;
  use crate::topology::Member;
  use crate::topology::MemberStatus;
  use crate::topology::Port;
  use crate::topology::Service;
  use crate::topology::Topology;
  use crate::topology::TopologyContext;

  struct Fixture {
    dispatcher: EventDispatcher,
    topology: Arc<TopologyContext>,
    repository: Arc<MockRepository>,
    extensions: Arc<MockExtensions>,
    publisher: Arc<MockPublisher>,
  }

  fn config() -> AgentConfig {
    AgentConfig {
      service_name: "php".to_string(),
      cluster_id: "php.cluster".to_string(),
      member_id: "php.member.1".to_string(),
      min_count: 1,
      app_path: PathBuf::from("/var/www"),
      cartridge_key: "key".to_string(),
      auto_checkout: true,
      max_well_known_members: 16,
      supertenant_temp_path: PathBuf::from("/tmp/-1234/"),
      ..Default::default()
    }
  }

  fn fixture(config: AgentConfig) -> Fixture {
    let topology = Arc::new(TopologyContext::new());
    let repository = Arc::new(MockRepository::default());
    let extensions = Arc::new(MockExtensions::default());
    let publisher = Arc::new(MockPublisher::default());
    let orchestrator = ArtifactSyncOrchestrator::new(repository.clone(), extensions.clone());
    let dispatcher = EventDispatcher::new(
      Arc::new(config),
      topology.clone(),
      orchestrator,
      Arc::new(ReversingDecryptor),
      extensions.clone(),
      publisher.clone(),
    );
    Fixture {
      dispatcher,
      topology,
      repository,
      extensions,
      publisher,
    }
  }

  fn member(id: &str, ip: &str, primary: bool) -> Member {
    let mut properties = BTreeMap::new();
    properties.insert("PRIMARY".to_string(), primary.to_string());
    Member {
      member_id: id.to_string(),
      member_ip: ip.to_string(),
      public_ip: String::new(),
      status: MemberStatus::Activated,
      properties,
      cluster_id: "php.cluster".to_string(),
      lb_cluster_id: None,
      network_partition_id: "np1".to_string(),
    }
  }

  fn php_topology(members: Vec<Member>) -> Topology {
    let mut topology = Topology {
      initialized: true,
      ..Default::default()
    };
    topology.add_service(Service {
      service_name: "php".to_string(),
      clusters: vec![Cluster {
        cluster_id: "php.cluster".to_string(),
        service_name: "php".to_string(),
        members,
        properties: BTreeMap::from([("tier".to_string(), "web".to_string())]),
      }],
      properties: BTreeMap::new(),
    });
    topology
  }

  fn artifacts_updated(cluster_id: &str) -> AgentEvent {
    AgentEvent::ArtifactsUpdated(ArtifactsUpdatedEvent {
      tenant_id: "-1234".to_string(),
      cluster_id: cluster_id.to_string(),
      repo_url: "https://git.example.com/php.git".to_string(),
      repo_username: "admin".to_string(),
      repo_password: "terces".to_string(),
      commit_enabled: true,
      status: "updated".to_string(),
    })
  }

  fn member_activated(member_id: &str, ip: &str) -> AgentEvent {
    AgentEvent::MemberActivated(MemberActivatedEvent {
      service_name: "php".to_string(),
      cluster_id: "php.cluster".to_string(),
      member_id: member_id.to_string(),
      member_ip: ip.to_string(),
      network_partition_id: "np1".to_string(),
      port_map: BTreeMap::from([
        ("http".to_string(), Port {
          protocol: "http".to_string(),
          value: 80,
          proxy: 8280,
        }),
        ("https".to_string(), Port {
          protocol: "https".to_string(),
          value: 443,
          proxy: 8243,
        }),
      ]),
    })
  }

  #[tokio::test]
  async fn test_artifacts_updated_for_other_cluster_is_ignored() {
    let mut f = fixture(config());

    f.dispatcher.dispatch(artifacts_updated("python.cluster")).await;
    f.dispatcher.drain().await;

    assert_eq!(0, f.repository.checkouts.load(Ordering::SeqCst));
    assert!(f.extensions.calls().is_empty());
    assert!(f.publisher.events().is_empty());
  }

  #[tokio::test]
  async fn test_artifacts_updated_checks_out_and_activates_once() {
    let mut f = fixture(config());

    f.dispatcher.dispatch(artifacts_updated(" php.cluster ")).await;
    f.dispatcher.drain().await;
    f.dispatcher.dispatch(artifacts_updated("php.cluster")).await;
    f.dispatcher.drain().await;

    assert_eq!(2, f.repository.checkouts.load(Ordering::SeqCst));
    let seen = f.repository.seen();
    assert_eq!(Path::new("/var/www"), seen[0].local_repo_path);
    assert_eq!("secret", seen[0].credentials.password());

    let activated: Vec<_> = f
      .publisher
      .events()
      .into_iter()
      .filter(|e| e.kind == StatusKind::InstanceActivated)
      .collect();
    assert_eq!(1, activated.len());
    assert_eq!("php.member.1", activated[0].member_id);

    let runs = f.extensions.calls_for(ExtensionHook::ArtifactsUpdated);
    assert_eq!(2, runs.len());
    assert_eq!("php.cluster", runs[0][env::ARTIFACT_UPDATED_CLUSTER_ID]);
    assert_eq!("terces", runs[0][env::ARTIFACT_UPDATED_REPO_PASSWORD]);
    assert_eq!("-1234", runs[0][env::ARTIFACT_UPDATED_TENANT_ID]);

    assert!(f.dispatcher.orchestrator().scheduled_task(Path::new("/var/www")).is_none());
  }

  #[tokio::test]
  async fn test_multitenant_artifacts_use_tenant_path() {
    let mut f = fixture(AgentConfig {
      multitenant: true,
      ..config()
    });

    f.dispatcher.dispatch(artifacts_updated("php.cluster")).await;
    f.dispatcher.drain().await;

    assert_eq!(Path::new("/var/www/-1234"), f.repository.seen()[0].local_repo_path);
  }

  #[tokio::test]
  async fn test_decrypt_failure_skips_checkout() {
    let mut f = fixture(config());
    let AgentEvent::ArtifactsUpdated(mut event) = artifacts_updated("php.cluster") else {
      unreachable!()
    };
    event.repo_password = "bad".to_string();

    f.dispatcher.dispatch(AgentEvent::ArtifactsUpdated(event)).await;
    f.dispatcher.drain().await;

    assert_eq!(0, f.repository.checkouts.load(Ordering::SeqCst));
    assert!(f.publisher.events().is_empty());
  }

  #[tokio::test]
  async fn test_invalid_interval_schedules_default() {
    let mut f = fixture(AgentConfig {
      enable_artifact_update: true,
      auto_commit: true,
      artifact_update_interval: Some("ten".to_string()),
      ..config()
    });

    f.dispatcher.dispatch(artifacts_updated("php.cluster")).await;
    f.dispatcher.drain().await;

    let task = f.dispatcher.orchestrator().scheduled_task(Path::new("/var/www"));
    assert_eq!(Some(Duration::from_secs(10)), task.map(|t| t.interval()));
    f.dispatcher.orchestrator().shutdown().await;
  }

  #[tokio::test]
  async fn test_member_activated_sets_wk_env_once() {
    let mut f = fixture(AgentConfig {
      clustered: true,
      min_count: 2,
      ..config()
    });
    f.topology.replace(php_topology(vec![
      member("php.member.1", "10.0.0.1", true),
      member("php.member.2", "10.0.0.2", true),
      member("php.member.3", "10.0.0.3", false),
    ]));

    f.dispatcher.dispatch(member_activated("php.member.2", "10.0.0.2")).await;
    f.dispatcher.dispatch(member_activated("php.member.2", "10.0.0.2")).await;

    let runs = f.extensions.calls_for(ExtensionHook::MemberActivated);
    assert_eq!(2, runs.len());

    let first = &runs[0];
    assert_eq!("10.0.0.2", first[env::MEMBER_ACTIVATED_MEMBER_IP]);
    assert_eq!("http,80,8280|https,443,8243|", first[env::MEMBER_ACTIVATED_PORTS]);
    assert_eq!("10.0.0.1", first["STRATOS_WK_MEMBER_0_IP"]);
    assert_eq!("10.0.0.2", first["STRATOS_WK_MEMBER_1_IP"]);
    assert_eq!("true", first[env::UPDATE_WK_IP]);
    assert_eq!("true", first[env::CLUSTERING]);
    assert_eq!("2", first[env::WK_MEMBER_COUNT]);
    assert_eq!("web", first["STRATOS_MEMBER_ACTIVATED_CLUSTER_PROPERTY_tier"]);
    assert_eq!("true", first["STRATOS_MEMBER_ACTIVATED_MEMBER_PROPERTY_PRIMARY"]);
    assert!(first[env::TOPOLOGY_JSON].contains("php.member.3"));
    assert_eq!(3, first[env::MEMBER_ACTIVATED_MEMBER_LIST_JSON].matches("member_id").count());

    assert!(!runs[1].contains_key(env::UPDATE_WK_IP));
    assert_eq!(2, f.dispatcher.resolver().well_known().len());
  }

  #[tokio::test]
  async fn test_non_primary_member_skips_resolution() {
    let mut f = fixture(AgentConfig {
      clustered: true,
      ..config()
    });
    f.topology.replace(php_topology(vec![member("php.member.3", "10.0.0.3", false)]));

    f.dispatcher.dispatch(member_activated("php.member.3", "10.0.0.3")).await;

    let runs = f.extensions.calls_for(ExtensionHook::MemberActivated);
    assert_eq!(1, runs.len());
    assert!(!runs[0].contains_key("STRATOS_WK_MEMBER_0_IP"));
    assert_eq!("true", runs[0][env::CLUSTERING]);
    assert!(f.dispatcher.resolver().well_known().is_empty());
  }

  #[tokio::test]
  async fn test_member_activated_requires_consistent_relevant_topology() {
    let mut f = fixture(AgentConfig {
      cluster_id: "other.cluster".to_string(),
      ..config()
    });

    f.dispatcher.dispatch(member_activated("php.member.1", "10.0.0.1")).await;
    f.topology.replace(php_topology(vec![member("php.member.1", "10.0.0.1", true)]));
    f.dispatcher.dispatch(member_activated("php.member.1", "10.0.0.1")).await;

    assert!(f.extensions.calls().is_empty());
  }

  #[tokio::test]
  async fn test_member_activated_relevant_through_lb_cluster() {
    let mut f = fixture(AgentConfig {
      cluster_id: "lb.cluster".to_string(),
      ..config()
    });
    let mut php_member = member("php.member.1", "10.0.0.1", false);
    php_member.lb_cluster_id = Some("lb.cluster".to_string());
    let mut topology = php_topology(vec![php_member]);
    let mut lb_member = member("lb.member.1", "10.0.1.1", false);
    lb_member.public_ip = "52.0.0.1".to_string();
    topology.add_service(Service {
      service_name: "lb".to_string(),
      clusters: vec![Cluster {
        cluster_id: "lb.cluster".to_string(),
        service_name: "lb".to_string(),
        members: vec![lb_member],
        properties: BTreeMap::new(),
      }],
      properties: BTreeMap::new(),
    });
    f.topology.replace(topology);

    f.dispatcher.dispatch(member_activated("php.member.1", "10.0.0.1")).await;

    let runs = f.extensions.calls_for(ExtensionHook::MemberActivated);
    assert_eq!(1, runs.len());
    assert_eq!("lb.cluster", runs[0][env::MEMBER_ACTIVATED_LB_CLUSTER_ID]);
    assert_eq!("10.0.1.1", runs[0][env::MEMBER_ACTIVATED_LB_IP]);
    assert_eq!("52.0.0.1", runs[0][env::MEMBER_ACTIVATED_LB_PUBLIC_IP]);
  }

  #[tokio::test]
  async fn test_cleanup_sequence_for_this_node() {
    let mut f = fixture(config());

    f.dispatcher
      .dispatch(AgentEvent::InstanceCleanupMember(InstanceCleanupMemberEvent {
        member_id: "php.member.9".to_string(),
      }))
      .await;
    assert!(f.publisher.events().is_empty());

    f.dispatcher
      .dispatch(AgentEvent::InstanceCleanupCluster(InstanceCleanupClusterEvent {
        cluster_id: "php.cluster".to_string(),
      }))
      .await;

    let kinds: Vec<StatusKind> = f.publisher.events().iter().map(|e| e.kind).collect();
    assert_eq!(vec![StatusKind::MaintenanceMode, StatusKind::ReadyToShutdown], kinds);
    assert_eq!(1, f.extensions.calls_for(ExtensionHook::Cleanup).len());
  }

  #[tokio::test]
  async fn test_topology_resync_resets_well_known_members() {
    let mut f = fixture(AgentConfig {
      clustered: true,
      ..config()
    });
    f.topology.replace(php_topology(vec![member("php.member.1", "10.0.0.1", true)]));

    f.dispatcher.dispatch(member_activated("php.member.1", "10.0.0.1")).await;
    assert_eq!(1, f.dispatcher.resolver().well_known().len());

    f.dispatcher.dispatch(AgentEvent::TopologyResync).await;
    assert!(f.dispatcher.resolver().well_known().is_empty());

    f.dispatcher.dispatch(member_activated("php.member.1", "10.0.0.1")).await;
    let runs = f.extensions.calls_for(ExtensionHook::MemberActivated);
    assert_eq!("true", runs[1][env::UPDATE_WK_IP]);
  }

  #[tokio::test]
  async fn test_multitenant_start_copies_artifacts_first() {
    let mut f = fixture(AgentConfig {
      multitenant: true,
      ..config()
    });

    f.dispatcher.dispatch(AgentEvent::InstanceStarted).await;

    let calls = f.extensions.calls();
    assert_eq!(2, calls.len());
    assert_eq!(ExtensionHook::CopyArtifacts, calls[0].0);
    assert_eq!(
      "/var/www/repository/deployment/server/",
      calls[0].1[env::COPY_ARTIFACTS_SOURCE]
    );
    assert_eq!("/tmp/-1234/", calls[0].1[env::COPY_ARTIFACTS_DESTINATION]);
    assert_eq!(ExtensionHook::InstanceStarted, calls[1].0);
  }

  #[tokio::test]
  async fn test_simple_hooks() {
    let mut f = fixture(config());

    f.dispatcher.dispatch(AgentEvent::InstanceStarted).await;
    f.dispatcher
      .dispatch(AgentEvent::VolumeMount(VolumeMountEvent {
        persistence_mappings: "/dev/sdc|/mnt/data".to_string(),
      }))
      .await;
    f.dispatcher.dispatch(AgentEvent::CompleteTopology).await;

    let calls = f.extensions.calls();
    assert_eq!(2, calls.len());
    assert_eq!(ExtensionHook::InstanceStarted, calls[0].0);
    assert_eq!("/dev/sdc|/mnt/data", calls[1].1[env::PERSISTENCE_MAPPINGS]);
  }
}
