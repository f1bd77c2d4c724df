//! AES-256-GCM sealing for token bodies.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use rand::{RngCore, rngs::OsRng};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{AppError, Result};

pub const KEY_SIZE: usize = 32;
pub const NONCE_SIZE: usize = 12;
/// GCM appends a tag of this many bytes to every ciphertext.
pub const TAG_SIZE: usize = 16;

/// 256 bits of key material, wiped when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecureKey([u8; KEY_SIZE]);

impl SecureKey {
    pub fn new(material: [u8; KEY_SIZE]) -> Self {
        Self(material)
    }

    /// Draws fresh key material from the OS RNG.
    pub fn random() -> Self {
        let mut material = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut material);
        Self(material)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

/// A sealed message: a fresh random nonce and the ciphertext with its tag.
pub struct Sealed {
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

/// Encrypts `plaintext` under `key` with a fresh nonce, binding `aad` into the tag.
pub fn seal(key: &SecureKey, plaintext: &[u8], aad: &[u8]) -> Result<Sealed> {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = Aes256Gcm::new(key.as_bytes().into())
        .encrypt(&Nonce::from(nonce), Payload { msg: plaintext, aad })
        .map_err(|e| AppError::Encryption(format!("Sealing failed: {}", e)))?;

    Ok(Sealed { nonce, ciphertext })
}

/// Reverses [`seal`]. Any mismatch in key, nonce, `aad` or ciphertext fails.
pub fn open(key: &SecureKey, nonce: &[u8; NONCE_SIZE], ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    Aes256Gcm::new(key.as_bytes().into())
        .decrypt(&Nonce::from(*nonce), Payload { msg: ciphertext, aad })
        .map_err(|e| AppError::Encryption(format!("Opening failed: {}", e)))
}
