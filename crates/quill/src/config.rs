use std::{env, fmt, path::PathBuf, str::FromStr, time::Duration};

use quill_core::storage::ReadRetryPolicy;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{KdfParams, MIN_SALT_LEN};

const DEFAULT_SQLITE_PATH: &str = "quill.db";
const DEFAULT_KEY_SALT: &str = "quill-document-store";
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_READ_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_READ_RETRY_BACKOFF_MS: u64 = 100;

/// Errors raised while loading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Which storage backend to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite { path: PathBuf },
    InMemory,
}

impl StoreBackend {
    /// Parses a backend name, using `path` when the backend is SQLite.
    pub fn parse(name: &str, path: PathBuf) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite { path }),
            "memory" | "inmemory" => Ok(StoreBackend::InMemory),
            other => Err(ConfigError::Invalid {
                name: "QUILL_STORE",
                value: other.to_string(),
                reason: "expected `sqlite` or `memory`".to_string(),
            }),
        }
    }
}

/// The deployment secret the encryption key is derived from.
///
/// Every copy is wiped when dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage backend (default: SQLite at "quill.db")
    pub store: StoreBackend,
    /// Bound on the connection liveness check (default: 5s)
    pub connect_timeout: Duration,
    /// Retry policy for point reads (default: 3 attempts, 100ms step)
    pub read_retry: ReadRetryPolicy,
    /// Deployment secret the encryption key is derived from
    pub secret: Secret,
    /// KDF salt (default: "quill-document-store")
    pub key_salt: String,
    /// Argon2id cost parameters
    pub kdf: KdfParams,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `QUILL_STORE` - `sqlite` or `memory` (default: sqlite)
    /// - `QUILL_SQLITE_PATH` - SQLite database path (default: "quill.db")
    /// - `QUILL_CONNECT_TIMEOUT_MS` - Liveness check bound (default: 5000)
    /// - `QUILL_READ_RETRY_ATTEMPTS` - Point read attempts (default: 3)
    /// - `QUILL_READ_RETRY_BACKOFF_MS` - Linear backoff step (default: 100)
    /// - `QUILL_READ_DEADLINE_MS` - Overall point read deadline (default: unset)
    /// - `QUILL_ENCRYPTION_KEY` - Deployment secret (required)
    /// - `QUILL_KEY_SALT` - KDF salt, at least 8 bytes (default: "quill-document-store")
    /// - `QUILL_KDF_MEMORY_KIB`, `QUILL_KDF_ITERATIONS`, `QUILL_KDF_PARALLELISM` - Argon2id cost
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sqlite_path = lookup("QUILL_SQLITE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH));
        let store = match lookup("QUILL_STORE") {
            Some(name) => StoreBackend::parse(&name, sqlite_path)?,
            None => StoreBackend::Sqlite { path: sqlite_path },
        };

        let connect_timeout = Duration::from_millis(parse_or(
            &lookup,
            "QUILL_CONNECT_TIMEOUT_MS",
            DEFAULT_CONNECT_TIMEOUT_MS,
        )?);

        let attempts = parse_or(&lookup, "QUILL_READ_RETRY_ATTEMPTS", DEFAULT_READ_RETRY_ATTEMPTS)?;
        if attempts == 0 {
            return Err(ConfigError::Invalid {
                name: "QUILL_READ_RETRY_ATTEMPTS",
                value: attempts.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        let backoff = parse_or(
            &lookup,
            "QUILL_READ_RETRY_BACKOFF_MS",
            DEFAULT_READ_RETRY_BACKOFF_MS,
        )?;
        let mut read_retry = ReadRetryPolicy::new(attempts, Duration::from_millis(backoff));
        if let Some(deadline) = parse_opt::<u64, _>(&lookup, "QUILL_READ_DEADLINE_MS")? {
            read_retry = read_retry.with_deadline(Duration::from_millis(deadline));
        }

        let secret = lookup("QUILL_ENCRYPTION_KEY")
            .filter(|value| !value.is_empty())
            .map(Secret::new)
            .ok_or(ConfigError::Missing("QUILL_ENCRYPTION_KEY"))?;

        let key_salt = lookup("QUILL_KEY_SALT").unwrap_or_else(|| DEFAULT_KEY_SALT.to_string());
        if key_salt.len() < MIN_SALT_LEN {
            return Err(ConfigError::Invalid {
                name: "QUILL_KEY_SALT",
                value: key_salt,
                reason: format!("must be at least {MIN_SALT_LEN} bytes"),
            });
        }

        let defaults = KdfParams::default();
        let kdf = KdfParams {
            memory_kib: parse_or(&lookup, "QUILL_KDF_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&lookup, "QUILL_KDF_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(&lookup, "QUILL_KDF_PARALLELISM", defaults.parallelism)?,
        };

        Ok(Self {
            store,
            connect_timeout,
            read_retry,
            secret,
            key_salt,
            kdf,
        })
    }
}

fn parse_opt<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                name,
                value,
                reason: e.to_string(),
            }),
    }
}

fn parse_or<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(lookup, name)?.unwrap_or(default))
}
