//! Cookie payload encryption.
//!
//! `Cryptor` is the capability the resolver needs; hosts with their own
//! encryption service implement it. `SealedCryptor` is the bundled
//! implementation, sealing values with the `cookie` crate's private jar
//! (AES-256-GCM, authenticated, base64 encoded so the result can be stored
//! directly in a cookie value).

use cookie::{Cookie, CookieJar, Key};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Name the sealed value is bound to. The private jar authenticates the
/// cookie name along with the value.
const SEALED_NAME: &str = "sealed";

/// Failure to open a sealed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecryptError {
    #[error("payload is empty")]
    Empty,
    #[error("payload failed authentication or decoding")]
    Rejected,
}

/// Symmetric encryption of short text payloads.
pub trait Cryptor: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> String;

    fn decrypt(&self, ciphertext: &str) -> Result<String, DecryptError>;
}

/// Authenticated encryption keyed from the application secret.
pub struct SealedCryptor {
    key: Key,
}

impl SealedCryptor {
    /// Derive the private jar key from an application secret of any length.
    pub fn new(secret: &str) -> Self {
        let master = Sha256::digest(secret.as_bytes());
        Self {
            key: Key::derive_from(master.as_slice()),
        }
    }
}

impl Cryptor for SealedCryptor {
    fn encrypt(&self, plaintext: &str) -> String {
        let mut jar = CookieJar::new();
        jar.private_mut(&self.key)
            .add(Cookie::new(SEALED_NAME, plaintext.to_string()));
        jar.get(SEALED_NAME)
            .map(|cookie| cookie.value().to_string())
            .unwrap_or_default()
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, DecryptError> {
        let ciphertext = ciphertext.trim();
        if ciphertext.is_empty() {
            return Err(DecryptError::Empty);
        }

        let jar = CookieJar::new();
        jar.private(&self.key)
            .decrypt(Cookie::new(SEALED_NAME, ciphertext.to_string()))
            .map(|cookie| cookie.value().to_string())
            .ok_or(DecryptError::Rejected)
    }
}

/// Constant-time string comparison, used for cookie version tokens.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
