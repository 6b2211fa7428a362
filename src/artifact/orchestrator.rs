use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use dashmap::DashMap;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::repository::RepositoryClient;
use super::repository::RepositoryInfo;
use super::schedule::TaskHandle;
use crate::error::AgentError;
use crate::error::Result;
use crate::extension::EnvParams;
use crate::extension::ExtensionHook;
use crate::extension::ExtensionRunner;
use crate::extension::env;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckoutResult {
  pub cloned: bool,
  /// First successful checkout of this repository.
  pub activated_trigger: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
  /// Another checkout or sync held the repository.
  pub skipped: bool,
  pub pushed: bool,
  pub pulled_changes: bool,
}

/// Per-repository record owned by the orchestrator.
#[derive(Debug, Clone)]
pub struct RepositorySyncState {
  pub info: RepositoryInfo,
  checked_out: bool,
  scheduled_task: Option<TaskHandle>,
}

impl RepositorySyncState {
  fn new(info: RepositoryInfo) -> Self {
    Self {
      info,
      checked_out: false,
      scheduled_task: None,
    }
  }

  pub fn is_checked_out(&self) -> bool {
    self.checked_out
  }

  pub fn scheduled_task(&self) -> Option<&TaskHandle> {
    self.scheduled_task.as_ref()
  }
}

struct RepositorySlot {
  /// Held for the whole of a checkout or sync on this working copy.
  sync_lock: tokio::sync::Mutex<()>,
  state: Mutex<RepositorySyncState>,
}

impl RepositorySlot {
  fn state(&self) -> MutexGuard<'_, RepositorySyncState> {
    match self.state.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }
}

struct OrchestratorInner {
  repository: Arc<dyn RepositoryClient>,
  extensions: Arc<dyn ExtensionRunner>,
  repositories: DashMap<PathBuf, Arc<RepositorySlot>>,
  shut_down: AtomicBool,
}

/// Keeps local working copies in sync with their remote repositories.
///
/// Checkouts and syncs on one local path never overlap. A checkout waits for
/// the path to be free; a scheduled sync that finds it busy is skipped.
#[derive(Clone)]
pub struct ArtifactSyncOrchestrator {
  inner: Arc<OrchestratorInner>,
}

impl ArtifactSyncOrchestrator {
  pub fn new(repository: Arc<dyn RepositoryClient>, extensions: Arc<dyn ExtensionRunner>) -> Self {
    Self {
      inner: Arc::new(OrchestratorInner {
        repository,
        extensions,
        repositories: DashMap::new(),
        shut_down: AtomicBool::new(false),
      }),
    }
  }

  /// Get or create the slot for `info.local_repo_path`, refreshing its info.
  fn slot(&self, info: &RepositoryInfo) -> Arc<RepositorySlot> {
    let slot = self
      .inner
      .repositories
      .entry(info.local_repo_path.clone())
      .or_insert_with(|| {
        Arc::new(RepositorySlot {
          sync_lock: tokio::sync::Mutex::new(()),
          state: Mutex::new(RepositorySyncState::new(info.clone())),
        })
      })
      .clone();
    slot.state().info = info.clone();
    slot
  }

  fn existing_slot(&self, local_repo_path: &Path) -> Option<Arc<RepositorySlot>> {
    self
      .inner
      .repositories
      .get(local_repo_path)
      .map(|slot| slot.clone())
  }

  fn ensure_running(&self) -> Result<()> {
    if self.inner.shut_down.load(Ordering::SeqCst) {
      return Err(AgentError::ShuttingDown(
        "artifact synchronization is stopped".to_string(),
      ));
    }
    Ok(())
  }

  /// Clone the repository if the working copy is absent, otherwise pull.
  pub async fn checkout(&self, info: RepositoryInfo) -> Result<CheckoutResult> {
    self.ensure_running()?;
    let slot = self.slot(&info);

    let _guard = slot.sync_lock.lock().await;
    debug!(repo = %info, "Executing checkout");

    let fetched = self.inner.repository.clone_or_pull(&info).await?;

    let activated_trigger = {
      let mut state = slot.state();
      let first = !state.checked_out;
      state.checked_out = true;
      first
    };

    info!(
      repo = %info.repo_url,
      path = %info.local_repo_path.display(),
      cloned = fetched.cloned,
      changed = fetched.changed,
      multitenant = info.is_multitenant,
      activated_trigger,
      "Checkout finished"
    );
    Ok(CheckoutResult {
      cloned: fetched.cloned,
      activated_trigger,
    })
  }

  /// Run [`ArtifactSyncOrchestrator::sync_once`] every `interval`. Any task
  /// previously scheduled for the same repository is cancelled.
  pub fn schedule_recurring(
    &self,
    info: RepositoryInfo,
    auto_checkout: bool,
    auto_commit: bool,
    interval: Duration,
  ) -> Result<TaskHandle> {
    self.ensure_running()?;
    let slot = self.slot(&info);

    let orchestrator = self.clone();
    let task_slot = slot.clone();
    let handle = TaskHandle::spawn_recurring(interval, move || {
      let orchestrator = orchestrator.clone();
      let slot = task_slot.clone();
      async move {
        orchestrator
          .sync_slot(&slot, auto_checkout, auto_commit)
          .await;
      }
    });

    let previous = slot.state().scheduled_task.replace(handle.clone());
    if let Some(previous) = previous {
      previous.cancel();
      debug!(path = %info.local_repo_path.display(), "Cancelled previous artifact update task");
    }

    // A concurrent shutdown may have collected the tasks before this one
    // was installed.
    if let Err(e) = self.ensure_running() {
      handle.cancel();
      return Err(e);
    }

    info!(
      path = %info.local_repo_path.display(),
      interval_secs = interval.as_secs(),
      auto_checkout,
      auto_commit,
      "Artifact update task scheduled"
    );
    Ok(handle)
  }

  /// One synchronization pass: push local changes if `auto_commit`, then
  /// pull remote changes if `auto_checkout`. Failures are logged only.
  pub async fn sync_once(
    &self,
    local_repo_path: &Path,
    auto_checkout: bool,
    auto_commit: bool,
  ) -> SyncOutcome {
    match self.existing_slot(local_repo_path) {
      Some(slot) => self.sync_slot(&slot, auto_checkout, auto_commit).await,
      None => {
        warn!(path = %local_repo_path.display(), "No repository registered for path");
        SyncOutcome {
          skipped: true,
          ..Default::default()
        }
      }
    }
  }

  async fn sync_slot(
    &self,
    slot: &RepositorySlot,
    auto_checkout: bool,
    auto_commit: bool,
  ) -> SyncOutcome {
    let info = slot.state().info.clone();

    let Ok(guard) = slot.sync_lock.try_lock() else {
      info!(
        path = %info.local_repo_path.display(),
        "Repository is busy, skipping artifact sync"
      );
      return SyncOutcome {
        skipped: true,
        ..Default::default()
      };
    };

    let mut outcome = SyncOutcome::default();

    if auto_commit {
      match self.inner.repository.commit_and_push(&info).await {
        Ok(pushed) => outcome.pushed = pushed,
        Err(e) => error!(path = %info.local_repo_path.display(), error = %e, "Artifact push failed"),
      }
    }

    if auto_checkout {
      match self.inner.repository.pull(&info).await {
        Ok(changed) => outcome.pulled_changes = changed,
        Err(e) => error!(path = %info.local_repo_path.display(), error = %e, "Artifact pull failed"),
      }
    }

    drop(guard);

    if outcome.pulled_changes {
      let mut env = EnvParams::new();
      env.insert(env::ARTIFACT_UPDATED_TENANT_ID.to_string(), info.tenant_id.clone());
      env.insert(env::ARTIFACT_UPDATED_SCHEDULER.to_string(), "true".to_string());
      if let Err(e) = self
        .inner
        .extensions
        .run_extension(ExtensionHook::ArtifactsUpdated, &env)
        .await
      {
        warn!(error = %e, "Scheduled artifacts updated extension failed");
      }
    }

    outcome
  }

  /// Copy of the record kept for `local_repo_path`.
  pub fn repository_state(&self, local_repo_path: &Path) -> Option<RepositorySyncState> {
    self.existing_slot(local_repo_path).map(|slot| {
      let state = slot.state();
      state.clone()
    })
  }

  pub fn scheduled_task(&self, local_repo_path: &Path) -> Option<TaskHandle> {
    self
      .existing_slot(local_repo_path)
      .and_then(|slot| {
        let state = slot.state();
        state.scheduled_task.clone()
      })
  }

  pub fn is_checked_out(&self, local_repo_path: &Path) -> bool {
    self
      .existing_slot(local_repo_path)
      .is_some_and(|slot| {
        let state = slot.state();
        state.is_checked_out()
      })
  }

  /// Cancel every recurring task and wait for running syncs to finish.
  pub async fn shutdown(&self) {
    self.inner.shut_down.store(true, Ordering::SeqCst);

    let tasks: Vec<TaskHandle> = self
      .inner
      .repositories
      .iter()
      .filter_map(|slot| {
        let state = slot.state();
        state.scheduled_task.clone()
      })
      .collect();

    for task in &tasks {
      task.cancel();
    }
    for task in &tasks {
      task.join().await;
    }
    info!(tasks = tasks.len(), "Artifact synchronization stopped");
  }
}
