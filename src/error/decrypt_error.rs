use anyerror::AnyError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecryptError {
  #[error("can not decrypt repository password: {0}")]
  Failed(AnyError),
}
