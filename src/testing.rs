//! In-memory collaborators shared by unit tests.

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyerror::AnyError;
use async_trait::async_trait;

use crate::artifact::CredentialDecryptor;
use crate::artifact::FetchOutcome;
use crate::artifact::RepositoryClient;
use crate::artifact::RepositoryInfo;
use crate::error::DecryptError;
use crate::error::ExtensionError;
use crate::error::PublishError;
use crate::error::RepositoryError;
use crate::event::EventPublisher;
use crate::event::StatusEvent;
use crate::extension::EnvParams;
use crate::extension::ExtensionHook;
use crate::extension::ExtensionRunner;

/// Repository that tracks how many operations overlap.
#[derive(Default)]
pub struct MockRepository {
  pub delay: Duration,
  pub fail: AtomicBool,
  pub remote_changes: AtomicBool,
  pub checkouts: AtomicUsize,
  pub pulls: AtomicUsize,
  pub pushes: AtomicUsize,
  pub active: AtomicUsize,
  pub max_active: AtomicUsize,
  checked_out: Mutex<HashSet<PathBuf>>,
  active_per_path: Mutex<HashMap<PathBuf, (usize, usize)>>,
  seen: Mutex<Vec<RepositoryInfo>>,
}

impl MockRepository {
  pub fn with_delay(delay: Duration) -> Self {
    Self {
      delay,
      ..Default::default()
    }
  }

  pub fn max_active_for(&self, path: &Path) -> usize {
    self
      .active_per_path
      .lock()
      .unwrap()
      .get(path)
      .map(|(_, max)| *max)
      .unwrap_or(0)
  }

  pub fn seen(&self) -> Vec<RepositoryInfo> {
    self.seen.lock().unwrap().clone()
  }

  async fn enter(&self, info: &RepositoryInfo) -> Result<(), RepositoryError> {
    self.seen.lock().unwrap().push(info.clone());

    let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_active.fetch_max(now, Ordering::SeqCst);
    {
      let mut per_path = self.active_per_path.lock().unwrap();
      let entry = per_path.entry(info.local_repo_path.clone()).or_default();
      entry.0 += 1;
      entry.1 = entry.1.max(entry.0);
    }

    if !self.delay.is_zero() {
      tokio::time::sleep(self.delay).await;
    }

    self.active.fetch_sub(1, Ordering::SeqCst);
    if let Some(entry) = self
      .active_per_path
      .lock()
      .unwrap()
      .get_mut(&info.local_repo_path)
    {
      entry.0 -= 1;
    }

    if self.fail.load(Ordering::SeqCst) {
      return Err(RepositoryError::CommandFailed {
        action: "mock".to_string(),
        path: info.local_repo_path.display().to_string(),
        code: Some(1),
        stderr: "mock failure".to_string(),
      });
    }
    Ok(())
  }
}

#[async_trait]
impl RepositoryClient for MockRepository {
  async fn clone_or_pull(&self, info: &RepositoryInfo) -> Result<FetchOutcome, RepositoryError> {
    self.checkouts.fetch_add(1, Ordering::SeqCst);
    self.enter(info).await?;
    let cloned = self
      .checked_out
      .lock()
      .unwrap()
      .insert(info.local_repo_path.clone());
    Ok(FetchOutcome {
      cloned,
      changed: cloned,
    })
  }

  async fn pull(&self, info: &RepositoryInfo) -> Result<bool, RepositoryError> {
    self.pulls.fetch_add(1, Ordering::SeqCst);
    self.enter(info).await?;
    Ok(self.remote_changes.load(Ordering::SeqCst))
  }

  async fn commit_and_push(&self, info: &RepositoryInfo) -> Result<bool, RepositoryError> {
    self.pushes.fetch_add(1, Ordering::SeqCst);
    self.enter(info).await?;
    Ok(true)
  }
}

/// Records every hook invocation.
#[derive(Default)]
pub struct MockExtensions {
  calls: Mutex<Vec<(ExtensionHook, EnvParams)>>,
}

impl MockExtensions {
  pub fn calls(&self) -> Vec<(ExtensionHook, EnvParams)> {
    self.calls.lock().unwrap().clone()
  }

  pub fn calls_for(&self, hook: ExtensionHook) -> Vec<EnvParams> {
    self
      .calls()
      .into_iter()
      .filter(|(h, _)| *h == hook)
      .map(|(_, env)| env)
      .collect()
  }
}

#[async_trait]
impl ExtensionRunner for MockExtensions {
  async fn run_extension(&self, hook: ExtensionHook, env: &EnvParams) -> Result<(), ExtensionError> {
    self.calls.lock().unwrap().push((hook, env.clone()));
    Ok(())
  }
}

/// Collects published status events.
#[derive(Default)]
pub struct MockPublisher {
  events: Mutex<Vec<StatusEvent>>,
}

impl MockPublisher {
  pub fn events(&self) -> Vec<StatusEvent> {
    self.events.lock().unwrap().clone()
  }
}

#[async_trait]
impl EventPublisher for MockPublisher {
  async fn publish(&self, event: StatusEvent) -> Result<(), PublishError> {
    self.events.lock().unwrap().push(event);
    Ok(())
  }
}

/// Reverses the ciphertext, or fails when it is `"bad"`.
pub struct ReversingDecryptor;

impl CredentialDecryptor for ReversingDecryptor {
  fn decrypt(&self, ciphertext: &str, _secret: &str) -> Result<String, DecryptError> {
    if ciphertext == "bad" {
      return Err(DecryptError::Failed(AnyError::error("bad ciphertext")));
    }
    Ok(ciphertext.chars().rev().collect())
  }
}
