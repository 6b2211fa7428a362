use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::RepositoryError;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct RepositoryCredentials {
  pub username: String,
  password: String,
}

impl RepositoryCredentials {
  /// `password` must already be decrypted.
  pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
    Self {
      username: username.into(),
      password: password.into(),
    }
  }

  pub fn password(&self) -> &str {
    &self.password
  }

  pub fn is_empty(&self) -> bool {
    self.username.is_empty() && self.password.is_empty()
  }
}

impl fmt::Debug for RepositoryCredentials {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("RepositoryCredentials")
      .field("username", &self.username)
      .field("password", &"<redacted>")
      .finish()
  }
}

/// Everything needed to synchronize one working copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryInfo {
  pub repo_url: String,
  pub local_repo_path: PathBuf,
  pub credentials: RepositoryCredentials,
  pub tenant_id: String,
  pub is_multitenant: bool,
  pub commit_enabled: bool,
}

impl fmt::Display for RepositoryInfo {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(
      f,
      "{} -> {} (tenant {})",
      self.repo_url,
      self.local_repo_path.display(),
      self.tenant_id
    )
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOutcome {
  /// A fresh clone was made rather than a pull.
  pub cloned: bool,
  /// The working copy content changed.
  pub changed: bool,
}

/// Remote repository operations against a local working copy.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
  /// Clone if the working copy is absent, otherwise pull.
  async fn clone_or_pull(&self, info: &RepositoryInfo) -> Result<FetchOutcome, RepositoryError>;

  /// Pull remote changes. Returns whether anything changed.
  async fn pull(&self, info: &RepositoryInfo) -> Result<bool, RepositoryError>;

  /// Commit local changes and push them. Returns whether a commit was pushed.
  async fn commit_and_push(&self, info: &RepositoryInfo) -> Result<bool, RepositoryError>;
}
