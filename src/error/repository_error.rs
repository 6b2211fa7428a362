use anyerror::AnyError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
  #[error("can not launch `git {action}` in {path}, error: {source}")]
  CannotLaunch {
    action: String,
    path: String,
    #[source]
    source: AnyError,
  },

  #[error("`git {action}` failed in {path} (exit code {code:?}): {stderr}")]
  CommandFailed {
    action: String,
    path: String,
    code: Option<i32>,
    stderr: String,
  },

  #[error("invalid repository url: {url}")]
  InvalidUrl { url: String },
}

impl RepositoryError {
  pub fn cannot_launch(action: impl ToString, path: impl ToString, source: &std::io::Error) -> Self {
    Self::CannotLaunch {
      action: action.to_string(),
      path: path.to_string(),
      source: AnyError::new(source),
    }
  }
}
