//! Key derivation from the deployment secret.

use std::fmt;

use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::error::CodecError;

/// Length of the derived AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// Shortest salt Argon2 accepts.
pub const MIN_SALT_LEN: usize = 8;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// A 256-bit key held only in memory for the life of the process.
///
/// Not `Clone`; the bytes are wiped when the key is dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Derives the key from a secret and salt with Argon2id.
    ///
    /// This is deliberately slow; call it once at startup.
    pub fn derive(secret: &[u8], salt: &[u8], params: KdfParams) -> Result<Self, CodecError> {
        let params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| CodecError::KeyDerivation(e.to_string()))?;

        // Written in place so no unwiped copy of the output is left behind.
        let mut key = Self([0u8; KEY_LEN]);
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password_into(secret, salt, &mut key.0)
            .map_err(|e| CodecError::KeyDerivation(e.to_string()))?;

        Ok(key)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_default_params_follow_argon2_defaults() {
        let params = KdfParams::default();
        assert_eq!(params.memory_kib, 19 * 1024);
        assert_eq!(params.iterations, 2);
        assert_eq!(params.parallelism, 1);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = EncryptionKey::derive(b"secret", b"quill-salt", fast()).unwrap();
        let b = EncryptionKey::derive(b"secret", b"quill-salt", fast()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_salt_and_secret_change_the_key() {
        let base = EncryptionKey::derive(b"secret", b"quill-salt", fast()).unwrap();
        let other_salt = EncryptionKey::derive(b"secret", b"other-salt", fast()).unwrap();
        let other_secret = EncryptionKey::derive(b"secret2", b"quill-salt", fast()).unwrap();

        assert_ne!(base.as_bytes(), other_salt.as_bytes());
        assert_ne!(base.as_bytes(), other_secret.as_bytes());
    }

    #[test]
    fn test_short_salt_is_rejected() {
        let result = EncryptionKey::derive(b"secret", b"salt", fast());
        assert!(matches!(result, Err(CodecError::KeyDerivation(_))));
    }

    #[test]
    fn test_invalid_cost_is_rejected() {
        let params = KdfParams {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
        };
        let result = EncryptionKey::derive(b"secret", b"quill-salt", params);
        assert!(matches!(result, Err(CodecError::KeyDerivation(_))));
    }

    fn assert_wiped_on_drop<T: ZeroizeOnDrop>() {}

    #[test]
    fn test_key_bytes_are_wiped() {
        assert_wiped_on_drop::<EncryptionKey>();

        let mut key = EncryptionKey::derive(b"secret", b"quill-salt", fast()).unwrap();
        assert_ne!(key.as_bytes(), &[0u8; KEY_LEN]);
        key.zeroize();
        assert_eq!(key.as_bytes(), &[0u8; KEY_LEN]);
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = EncryptionKey::derive(b"secret", b"quill-salt", fast()).unwrap();
        assert_eq!(format!("{key:?}"), "EncryptionKey(<redacted>)");
    }
}
