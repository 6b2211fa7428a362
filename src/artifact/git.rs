use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;
use tracing::info;

use super::repository::FetchOutcome;
use super::repository::RepositoryClient;
use super::repository::RepositoryCredentials;
use super::repository::RepositoryInfo;
use crate::error::RepositoryError;

const DEFAULT_COMMIT_MESSAGE: &str = "tenant artifacts updated by cartridge agent";
const DEFAULT_AUTHOR_NAME: &str = "cartridge-agent";
const DEFAULT_AUTHOR_EMAIL: &str = "cartridge-agent@localhost";

const REMOTE: &str = "origin";
const USERNAME_ENV: &str = "CARTRIDGE_AGENT_GIT_USERNAME";
const PASSWORD_ENV: &str = "CARTRIDGE_AGENT_GIT_PASSWORD";

/// Answers git's credential `get` request from the environment, so the
/// secret never lands on the command line or in `.git/config`.
const CREDENTIAL_HELPER: &str = concat!(
  "!f() { test \"$1\" = get || return 0; ",
  "echo \"username=${CARTRIDGE_AGENT_GIT_USERNAME}\"; ",
  "echo \"password=${CARTRIDGE_AGENT_GIT_PASSWORD}\"; }; f"
);

/// [`RepositoryClient`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCommandRepository {
  git_binary: PathBuf,
  commit_message: String,
  author_name: String,
  author_email: String,
}

impl Default for GitCommandRepository {
  fn default() -> Self {
    Self {
      git_binary: PathBuf::from("git"),
      commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
      author_name: DEFAULT_AUTHOR_NAME.to_string(),
      author_email: DEFAULT_AUTHOR_EMAIL.to_string(),
    }
  }
}

impl GitCommandRepository {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_git_binary(mut self, git_binary: impl Into<PathBuf>) -> Self {
    self.git_binary = git_binary.into();
    self
  }

  /// Run a local git command in `cwd` and return its trimmed stdout.
  async fn git(&self, cwd: &Path, args: &[&str]) -> Result<String, RepositoryError> {
    self.run(cwd, args, None).await
  }

  /// Run a git command that talks to the remote of `info`.
  async fn remote_git(
    &self,
    info: &RepositoryInfo,
    cwd: &Path,
    args: &[&str],
  ) -> Result<String, RepositoryError> {
    self.run(cwd, args, Some(&info.credentials)).await
  }

  async fn run(
    &self,
    cwd: &Path,
    args: &[&str],
    credentials: Option<&RepositoryCredentials>,
  ) -> Result<String, RepositoryError> {
    let action = args.first().copied().unwrap_or_default();

    let mut command = Command::new(&self.git_binary);
    command
      .arg("-c")
      .arg(format!("user.name={}", self.author_name))
      .arg("-c")
      .arg(format!("user.email={}", self.author_email));
    if let Some(credentials) = credentials.filter(|c| !c.is_empty()) {
      // The empty helper clears any helper configured on the host.
      command
        .arg("-c")
        .arg("credential.helper=")
        .arg("-c")
        .arg(format!("credential.helper={}", CREDENTIAL_HELPER))
        .env(USERNAME_ENV, &credentials.username)
        .env(PASSWORD_ENV, credentials.password());
    }

    let output = command
      .args(args)
      .current_dir(cwd)
      .env("GIT_TERMINAL_PROMPT", "0")
      .output()
      .await
      .map_err(|e| RepositoryError::cannot_launch(action, cwd.display(), &e))?;

    if !output.status.success() {
      return Err(RepositoryError::CommandFailed {
        action: action.to_string(),
        path: cwd.display().to_string(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  async fn head(&self, path: &Path) -> Option<String> {
    self.git(path, &["rev-parse", "HEAD"]).await.ok()
  }

  /// Clone into a missing or empty directory.
  async fn clone_into(&self, info: &RepositoryInfo, url: &str) -> Result<(), RepositoryError> {
    let path = &info.local_repo_path;
    let parent = path
      .parent()
      .filter(|p| !p.as_os_str().is_empty())
      .unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(parent)
      .await
      .map_err(|e| RepositoryError::cannot_launch("clone", parent.display(), &e))?;

    let target = path
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| path.display().to_string());
    self
      .remote_git(info, parent, &["clone", url, target.as_str()])
      .await?;
    Ok(())
  }

  /// Turn a populated directory into a working copy of the remote's default
  /// branch. Files the remote also tracks are overwritten; others are kept.
  async fn init_in_place(&self, info: &RepositoryInfo, url: &str) -> Result<(), RepositoryError> {
    let path = &info.local_repo_path;
    self.git(path, &["init"]).await?;
    self.git(path, &["remote", "add", REMOTE, url]).await?;
    self.remote_git(info, path, &["fetch", REMOTE]).await?;
    self
      .remote_git(info, path, &["remote", "set-head", REMOTE, "--auto"])
      .await?;

    let remote_head = self
      .git(path, &["rev-parse", "--abbrev-ref", "origin/HEAD"])
      .await?;
    let branch = remote_head
      .strip_prefix("origin/")
      .unwrap_or(remote_head.as_str())
      .to_string();

    self
      .git(path, &["checkout", "-f", "-B", branch.as_str(), "--track", remote_head.as_str()])
      .await?;
    debug!(path = %path.display(), branch = %branch, "Initialized working copy in place");
    Ok(())
  }
}

#[async_trait]
impl RepositoryClient for GitCommandRepository {
  async fn clone_or_pull(&self, info: &RepositoryInfo) -> Result<FetchOutcome, RepositoryError> {
    if is_working_copy(&info.local_repo_path) {
      let changed = self.pull(info).await?;
      return Ok(FetchOutcome {
        cloned: false,
        changed,
      });
    }

    let url = remote_url(info)?;
    info!(repo = %url, path = %info.local_repo_path.display(), "Cloning repository");
    if is_populated_dir(&info.local_repo_path).await {
      self.init_in_place(info, url).await?;
    } else {
      self.clone_into(info, url).await?;
    }
    Ok(FetchOutcome {
      cloned: true,
      changed: true,
    })
  }

  async fn pull(&self, info: &RepositoryInfo) -> Result<bool, RepositoryError> {
    let path = &info.local_repo_path;
    let before = self.head(path).await;
    self.remote_git(info, path, &["pull"]).await?;
    let after = self.head(path).await;

    let changed = before != after;
    debug!(path = %path.display(), changed, "Pulled repository");
    Ok(changed)
  }

  async fn commit_and_push(&self, info: &RepositoryInfo) -> Result<bool, RepositoryError> {
    let path = &info.local_repo_path;
    let status = self.git(path, &["status", "--porcelain"]).await?;
    if status.is_empty() {
      debug!(path = %path.display(), "No local changes to commit");
      return Ok(false);
    }

    self.git(path, &["add", "--all"]).await?;
    self
      .git(path, &["commit", "-m", self.commit_message.as_str()])
      .await?;
    self.remote_git(info, path, &["push"]).await?;
    info!(path = %path.display(), "Pushed local artifact changes");
    Ok(true)
  }
}

fn is_working_copy(path: &Path) -> bool {
  path.join(".git").exists()
}

async fn is_populated_dir(path: &Path) -> bool {
  match tokio::fs::read_dir(path).await {
    Ok(mut entries) => matches!(entries.next_entry().await, Ok(Some(_))),
    Err(_) => false,
  }
}

fn remote_url(info: &RepositoryInfo) -> Result<&str, RepositoryError> {
  let url = info.repo_url.trim();
  if url.is_empty() {
    return Err(RepositoryError::InvalidUrl {
      url: info.repo_url.clone(),
    });
  }
  Ok(url)
}
