use anyerror::AnyError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
  #[error("can not encode {event} event: {source}")]
  Encode { event: String, source: AnyError },

  #[error("can not deliver {event} event: {source}")]
  Deliver { event: String, source: AnyError },
}
