mod credentials;
mod git;
mod orchestrator;
mod repository;
mod schedule;

pub use credentials::CredentialDecryptor;
pub use credentials::PlainTextDecryptor;
pub use git::GitCommandRepository;
pub use orchestrator::ArtifactSyncOrchestrator;
pub use orchestrator::CheckoutResult;
pub use orchestrator::RepositorySyncState;
pub use orchestrator::SyncOutcome;
pub use repository::FetchOutcome;
pub use repository::RepositoryClient;
pub use repository::RepositoryCredentials;
pub use repository::RepositoryInfo;
pub use schedule::TaskHandle;
