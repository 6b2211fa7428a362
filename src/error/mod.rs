mod decrypt_error;
mod extension_error;
mod publish_error;
mod repository_error;
mod startup_error;

pub use decrypt_error::DecryptError;
pub use extension_error::ExtensionError;
pub use publish_error::PublishError;
pub use repository_error::RepositoryError;
pub use startup_error::StartupError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
  #[error(transparent)]
  Startup(#[from] StartupError),

  #[error(transparent)]
  Repository(#[from] RepositoryError),

  #[error(transparent)]
  Decrypt(#[from] DecryptError),

  #[error(transparent)]
  Extension(#[from] ExtensionError),

  #[error(transparent)]
  Publish(#[from] PublishError),

  #[error("Agent is shutting down: {0}")]
  ShuttingDown(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;
