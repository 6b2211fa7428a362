use anyerror::AnyError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtensionError {
  #[error("can not launch extension {script}, error: {source}")]
  CannotLaunch {
    script: String,
    #[source]
    source: AnyError,
  },

  #[error("extension {script} exited with code {code:?}: {stderr}")]
  NonZeroExit {
    script: String,
    code: Option<i32>,
    stderr: String,
  },
}
