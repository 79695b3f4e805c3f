//! AES-256-GCM codec for document payloads.

use std::fmt;

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce, Tag};
use quill_core::document::SealedContent;
use rand::RngCore;

use super::error::CodecError;
use super::key::EncryptionKey;

/// IV length in bytes. Every encryption draws a fresh random IV.
pub const IV_LEN: usize = 16;

/// Authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

const ASSOCIATED_DATA: &[u8] = b"quill.document.v1";

type Aes256Gcm128 = AesGcm<Aes256, U16>;

/// Authenticated encryption over a key derived at startup.
///
/// Each call is independent; the codec holds no per-call state and can be
/// shared across tasks.
#[derive(Clone)]
pub struct EncryptionCodec {
    cipher: Aes256Gcm128,
}

impl EncryptionCodec {
    pub fn new(key: &EncryptionKey) -> Result<Self, CodecError> {
        let cipher = Aes256Gcm128::new_from_slice(key.as_bytes())
            .map_err(|e| CodecError::KeyDerivation(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Encrypts a payload under a fresh random IV.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<SealedContent, CodecError> {
        let mut iv = [0u8; IV_LEN];
        rand::rng().fill_bytes(&mut iv);

        let mut buffer = plaintext.to_vec();
        let tag = self
            .cipher
            .encrypt_in_place_detached(Nonce::<U16>::from_slice(&iv), ASSOCIATED_DATA, &mut buffer)
            .map_err(|_| CodecError::Encryption)?;

        Ok(SealedContent {
            cipher_content: buffer,
            iv: iv.to_vec(),
            auth_tag: tag.to_vec(),
        })
    }

    /// Verifies the tag and decrypts.
    ///
    /// Fails closed: on any mismatch, including malformed IV or tag lengths,
    /// the working buffer is dropped and only [`CodecError::Integrity`] is
    /// returned.
    pub fn decrypt(&self, sealed: &SealedContent) -> Result<Vec<u8>, CodecError> {
        if sealed.iv.len() != IV_LEN || sealed.auth_tag.len() != TAG_LEN {
            return Err(CodecError::Integrity);
        }

        let mut buffer = sealed.cipher_content.clone();
        self.cipher
            .decrypt_in_place_detached(
                Nonce::<U16>::from_slice(&sealed.iv),
                ASSOCIATED_DATA,
                &mut buffer,
                Tag::from_slice(&sealed.auth_tag),
            )
            .map_err(|_| CodecError::Integrity)?;

        Ok(buffer)
    }
}

impl fmt::Debug for EncryptionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionCodec").finish_non_exhaustive()
    }
}
