//! Error types for wallet generation and secure storage

use thiserror::Error;

/// Errors surfaced by the wallet lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// The key engine failed to produce a mnemonic or derive keys
    #[error("key engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The encrypted store could not be read or written
    #[error("secure store unavailable: {0}")]
    StoreUnavailable(String),

    /// A loaded record has some, but not all, fields populated.
    ///
    /// Advisory only: `load` never returns this, callers use it to decide
    /// what to display.
    #[error(
        "inconsistent wallet record (public key: {}, private key: {}, recovery phrase: {})",
        presence(.public_key),
        presence(.private_key),
        presence(.mnemonic_phrase)
    )]
    InconsistentRecord {
        public_key: bool,
        private_key: bool,
        mnemonic_phrase: bool,
    },
}

fn presence(set: &bool) -> &'static str {
    if *set {
        "present"
    } else {
        "missing"
    }
}

impl WalletError {
    pub(crate) fn engine(err: impl std::fmt::Display) -> Self {
        Self::EngineUnavailable(err.to_string())
    }

    pub(crate) fn store(err: impl std::fmt::Display) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl From<sqlx::Error> for WalletError {
    fn from(err: sqlx::Error) -> Self {
        Self::StoreUnavailable(format!("database error: {err}"))
    }
}

/// Result alias for library operations.
pub type Result<T> = std::result::Result<T, WalletError>;
