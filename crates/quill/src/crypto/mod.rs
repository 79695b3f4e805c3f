//! Authenticated encryption for document payloads.
//!
//! The key is derived once from the deployment secret with Argon2id and
//! never leaves process memory. Payloads are sealed with AES-256-GCM under a
//! fresh 128-bit IV per call.

mod codec;
mod error;
mod key;

pub use codec::{EncryptionCodec, IV_LEN, TAG_LEN};
pub use error::{map_codec_error, CodecError};
pub use key::{EncryptionKey, KdfParams, KEY_LEN, MIN_SALT_LEN};

/// Codec with cheap KDF parameters for unit tests.
#[cfg(test)]
pub(crate) fn test_codec() -> EncryptionCodec {
    let params = KdfParams {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    };
    let key = EncryptionKey::derive(b"test-secret", b"quill-test-salt", params)
        .expect("test key derivation");
    EncryptionCodec::new(&key).expect("test codec")
}
