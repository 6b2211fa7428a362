use std::path::PathBuf;

use anyerror::AnyError;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;
use tracing::info;

use super::env::EnvParams;
use super::hook::ExtensionHook;
use crate::error::ExtensionError;

/// Runs the user-supplied script bound to a hook.
#[async_trait]
pub trait ExtensionRunner: Send + Sync {
  async fn run_extension(&self, hook: ExtensionHook, env: &EnvParams) -> Result<(), ExtensionError>;
}

/// Executes `<extensions_dir>/<hook>.sh` with the env map as its environment.
#[derive(Debug, Clone)]
pub struct ScriptExtensionRunner {
  extensions_dir: PathBuf,
}

impl ScriptExtensionRunner {
  /// A relative `extensions_dir` is resolved against the current directory
  /// now, since scripts run with `extensions_dir` as their working directory.
  pub fn new(extensions_dir: impl Into<PathBuf>) -> Self {
    let extensions_dir = extensions_dir.into();
    let extensions_dir = std::path::absolute(&extensions_dir).unwrap_or(extensions_dir);
    Self { extensions_dir }
  }

  pub fn script_path(&self, hook: ExtensionHook) -> PathBuf {
    self.extensions_dir.join(hook.script_name())
  }
}

#[async_trait]
impl ExtensionRunner for ScriptExtensionRunner {
  async fn run_extension(&self, hook: ExtensionHook, env: &EnvParams) -> Result<(), ExtensionError> {
    let script = self.script_path(hook);
    if !script.is_file() {
      debug!(hook = %hook, script = %script.display(), "Extension script not found, skipping");
      return Ok(());
    }

    info!(hook = %hook, params = env.len(), "Executing extension");
    let output = Command::new(&script)
      .envs(env)
      .current_dir(&self.extensions_dir)
      .output()
      .await
      .map_err(|e| ExtensionError::CannotLaunch {
        script: script.display().to_string(),
        source: AnyError::new(&e),
      })?;

    if !output.status.success() {
      return Err(ExtensionError::NonZeroExit {
        script: script.display().to_string(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }

    debug!(
      hook = %hook,
      stdout = %String::from_utf8_lossy(&output.stdout).trim(),
      "Extension finished"
    );
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_missing_script_is_skipped() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let runner = ScriptExtensionRunner::new(dir.path());
    runner
      .run_extension(ExtensionHook::Cleanup, &EnvParams::new())
      .await?;
    Ok(())
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn test_relative_extensions_dir() -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir_in(".")?;
    let relative = PathBuf::from(".").join(dir.path().file_name().unwrap());
    let script = relative.join(ExtensionHook::Cleanup.script_name());
    std::fs::write(&script, "#!/bin/sh\nexit 0\n")?;
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;

    let runner = ScriptExtensionRunner::new(&relative);
    assert!(runner.script_path(ExtensionHook::Cleanup).is_absolute());
    runner
      .run_extension(ExtensionHook::Cleanup, &EnvParams::new())
      .await?;
    Ok(())
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn test_script_receives_env() -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir()?;
    let runner = ScriptExtensionRunner::new(dir.path());
    let script = runner.script_path(ExtensionHook::MemberActivated);
    std::fs::write(
      &script,
      "#!/bin/sh\n[ \"$STRATOS_CLUSTERING\" = \"true\" ] || exit 3\n",
    )?;
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;

    let mut env = EnvParams::new();
    env.insert("STRATOS_CLUSTERING".to_string(), "true".to_string());
    runner
      .run_extension(ExtensionHook::MemberActivated, &env)
      .await?;

    env.insert("STRATOS_CLUSTERING".to_string(), "false".to_string());
    let err = runner
      .run_extension(ExtensionHook::MemberActivated, &env)
      .await
      .err();
    assert!(matches!(err, Some(ExtensionError::NonZeroExit { code: Some(3), .. })));
    Ok(())
  }
}
