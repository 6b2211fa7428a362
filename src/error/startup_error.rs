use anyerror::AnyError;
use thiserror::Error;

/// Errors that can occur while loading configuration and starting the agent
#[derive(Error, Debug)]
pub enum StartupError {
  /// The configuration file could not be read or parsed
  #[error("Failed to load configuration from {path}: {source}")]
  LoadError { path: String, source: AnyError },

  /// Invalid configuration provided
  #[error("Invalid configuration: {0}")]
  InvalidConfig(String),
}

impl StartupError {
  /// Create a new LoadError for the given file and source error
  pub fn load_error<E>(path: impl Into<String>, source: &E) -> Self
  where
    E: std::error::Error + 'static,
  {
    Self::LoadError {
      path: path.into(),
      source: AnyError::new(source),
    }
  }

  /// Create a new InvalidConfig error with the given message
  pub fn invalid_config(message: impl Into<String>) -> Self {
    Self::InvalidConfig(message.into())
  }
}
