//! # Launch Token Codec
//!
//! Encodes the `(client, course)` pair carried by a client's wrapper package
//! into an opaque token and reverses it when the learner launches the course.
//!
//! Tokens are AES-256-GCM ciphertexts under a key supplied by configuration,
//! so they are neither readable nor forgeable without that key, and they
//! survive restarts. The nonce is derived from the key and the plaintext,
//! which makes encoding deterministic: regenerating a package for the same
//! assignment bakes in the same token.
//!
//! Wire layout, URL-safe base64 without padding:
//! `version (1) || nonce (12) || ciphertext || tag (16)`.
//!
//! The plaintext is `"{client_id}-{course_id}"`. The client part is a plain
//! decimal and decoding splits on the first `-`, so course ids may contain `-`.

use crate::error::{DecodeError, PackagingError};
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD};
use base64::Engine;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

const TOKEN_VERSION: u8 = 1;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const SEPARATOR: char = '-';
pub const KEY_LEN: usize = 32;

/// The pair a launch token stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LaunchIdentity {
    pub client_id: u64,
    /// LMS course identifier. Integers are carried in their decimal form.
    pub course_id: String,
}

impl LaunchIdentity {
    pub fn new(client_id: u64, course_id: impl Into<String>) -> Self {
        Self {
            client_id,
            course_id: course_id.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("token key is not valid base64")]
    NotBase64,

    #[error("token key must be {KEY_LEN} bytes, got {0}")]
    WrongLength(usize),
}

#[derive(Clone)]
pub struct TokenCodec {
    cipher: Aes256Gcm,
    key: [u8; KEY_LEN],
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)),
            key,
        }
    }

    /// Loads the key from its standard base64 form, as printed by `scormhub keygen`.
    pub fn from_base64_key(encoded: &str) -> Result<Self, KeyError> {
        let raw = BASE64
            .decode(encoded.trim())
            .map_err(|_| KeyError::NotBase64)?;
        let key: [u8; KEY_LEN] = raw
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::WrongLength(raw.len()))?;
        Ok(Self::new(key))
    }

    /// Fresh random key in standard base64.
    pub fn generate_key() -> String {
        BASE64.encode(Aes256Gcm::generate_key(OsRng))
    }

    pub fn encode(&self, identity: &LaunchIdentity) -> Result<String, PackagingError> {
        if identity.course_id.is_empty() {
            return Err(PackagingError::InvalidIdentity(
                "course id must not be empty".into(),
            ));
        }
        let plaintext = format!("{}{}{}", identity.client_id, SEPARATOR, identity.course_id);
        let nonce = self.derive_nonce(plaintext.as_bytes());
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| PackagingError::InvalidIdentity("identity could not be sealed".into()))?;

        let mut raw = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
        raw.push(TOKEN_VERSION);
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(raw))
    }

    pub fn decode(&self, token: &str) -> Result<LaunchIdentity, DecodeError> {
        let raw = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|_| DecodeError::NotBase64)?;
        if raw.len() < 1 + NONCE_LEN + TAG_LEN {
            return Err(DecodeError::Truncated);
        }
        if raw[0] != TOKEN_VERSION {
            return Err(DecodeError::UnsupportedVersion(raw[0]));
        }
        let (nonce, ciphertext) = raw[1..].split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| DecodeError::Tampered)?;
        let plaintext =
            String::from_utf8(plaintext).map_err(|_| DecodeError::Malformed("not utf-8"))?;

        let (client, course) = plaintext
            .split_once(SEPARATOR)
            .ok_or(DecodeError::Malformed("missing separator"))?;
        if client.is_empty() || !client.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DecodeError::Malformed("client id is not a number"));
        }
        let client_id = client
            .parse::<u64>()
            .map_err(|_| DecodeError::Malformed("client id out of range"))?;
        if course.is_empty() {
            return Err(DecodeError::Malformed("empty course id"));
        }
        Ok(LaunchIdentity::new(client_id, course))
    }

    fn derive_nonce(&self, plaintext: &[u8]) -> [u8; NONCE_LEN] {
        let digest = Sha256::new()
            .chain_update(b"scormhub-token-nonce")
            .chain_update(self.key)
            .chain_update(plaintext)
            .finalize();
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&digest[..NONCE_LEN]);
        nonce
    }
}
