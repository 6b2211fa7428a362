use crate::error::DecryptError;

/// Turns an encrypted repository password into plain text.
pub trait CredentialDecryptor: Send + Sync {
  fn decrypt(&self, ciphertext: &str, secret: &str) -> Result<String, DecryptError>;
}

/// For platforms that deliver repository passwords unencrypted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextDecryptor;

impl CredentialDecryptor for PlainTextDecryptor {
  fn decrypt(&self, ciphertext: &str, _secret: &str) -> Result<String, DecryptError> {
    Ok(ciphertext.to_string())
  }
}
