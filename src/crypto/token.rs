//! Authenticated-encryption session tokens.
//!
//! A token is the URL-safe base64 (no padding) encoding of
//! `nonce || AES-256-GCM(payload) || MAC`, where the payload is a JSON object
//! of string pairs encrypted with the block key and the token name as
//! associated data, and the MAC is a BLAKE3 keyed hash over
//! `name || 0x00 || nonce || ciphertext` under the hash key.
//!
//! Both keys are generated once per process. Restarting the process
//! invalidates every outstanding token.

use std::collections::HashMap;

use base64::{Engine as _, engine::general_purpose};
use subtle::ConstantTimeEq;

use crate::crypto::aes::{self, NONCE_SIZE, SecureKey, TAG_SIZE};
use crate::error::{AppError, Result};

/// The size of the BLAKE3 MAC in bytes.
pub const MAC_SIZE: usize = 32;
/// Tokens longer than this are rejected before decoding.
pub const MAX_TOKEN_LEN: usize = 4096;

/// A string-to-string token payload.
pub type Claims = HashMap<String, String>;

/// The per-process key pair used by [`TokenCodec`].
pub struct SessionKeys {
    hash_key: SecureKey,
    block_key: SecureKey,
}

impl SessionKeys {
    /// Generates a fresh hash key and block key from the OS RNG.
    pub fn generate() -> Self {
        Self {
            hash_key: SecureKey::random(),
            block_key: SecureKey::random(),
        }
    }

    /// Builds a key pair from existing key material.
    pub fn from_keys(hash_key: SecureKey, block_key: SecureKey) -> Self {
        Self { hash_key, block_key }
    }
}

/// Encodes and decodes named, encrypted, authenticated payloads.
pub struct TokenCodec {
    keys: SessionKeys,
}

impl TokenCodec {
    /// Creates a new `TokenCodec` owning `keys`.
    pub fn new(keys: SessionKeys) -> Self {
        Self { keys }
    }

    /// Serializes, encrypts and authenticates `payload` under `name`.
    ///
    /// # Returns
    ///
    /// The opaque token string.
    pub fn encode(&self, name: &str, payload: &Claims) -> Result<String> {
        let plaintext = sonic_rs::to_vec(payload)
            .map_err(|e| AppError::Encoding(format!("Payload serialization failed: {}", e)))?;

        let sealed = aes::seal(&self.keys.block_key, &plaintext, name.as_bytes())
            .map_err(|e| AppError::Encoding(e.to_string()))?;

        let mut body = Vec::with_capacity(NONCE_SIZE + sealed.ciphertext.len() + MAC_SIZE);
        body.extend_from_slice(&sealed.nonce);
        body.extend_from_slice(&sealed.ciphertext);

        let mac = self.mac(name, &body);
        body.extend_from_slice(&mac);

        Ok(general_purpose::URL_SAFE_NO_PAD.encode(body))
    }

    /// Verifies and decrypts a token produced by [`TokenCodec::encode`] under `name`.
    ///
    /// Every failure collapses to [`AppError::InvalidToken`].
    pub fn decode(&self, name: &str, token: &str) -> Result<Claims> {
        if token.is_empty() || token.len() > MAX_TOKEN_LEN {
            return Err(AppError::InvalidToken);
        }

        let raw = general_purpose::URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| AppError::InvalidToken)?;

        if raw.len() < NONCE_SIZE + TAG_SIZE + MAC_SIZE {
            return Err(AppError::InvalidToken);
        }

        let (body, mac) = raw.split_at(raw.len() - MAC_SIZE);
        let expected = self.mac(name, body);
        if !bool::from(expected.as_slice().ct_eq(mac)) {
            tracing::debug!("Token MAC mismatch");
            return Err(AppError::InvalidToken);
        }

        let (nonce, ciphertext) = body.split_at(NONCE_SIZE);
        let nonce: [u8; NONCE_SIZE] = nonce.try_into().map_err(|_| AppError::InvalidToken)?;

        let plaintext = aes::open(&self.keys.block_key, &nonce, ciphertext, name.as_bytes())
            .map_err(|_| AppError::InvalidToken)?;

        sonic_rs::from_slice(&plaintext).map_err(|_| AppError::InvalidToken)
    }

    fn mac(&self, name: &str, body: &[u8]) -> [u8; MAC_SIZE] {
        let mut hasher = blake3::Hasher::new_keyed(self.keys.hash_key.as_bytes());
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
        hasher.update(body);
        *hasher.finalize().as_bytes()
    }
}
