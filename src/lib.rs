//! HD Vault Library
//!
//! Generates a hierarchical-deterministic wallet, keeps its public key,
//! private key and recovery phrase in an encrypted SQLite store, and reloads
//! them on the next session.
//!
//! 1. **Generation**: a [`KeyEngine`] produces a BIP39 mnemonic and derives
//!    key encodings under one [`EncodingScheme`] (extended keys or raw
//!    secp256k1 hex).
//! 2. **Persistence**: [`WalletManager`] writes the three fields through a
//!    [`SecureStore`] transaction, so a reader never sees a mixed record.

pub mod config;
pub mod error;
pub mod session;
pub mod store;
pub mod types;
pub mod wallet;

pub use config::Config;
pub use error::{Result, WalletError};
pub use session::WalletSession;
pub use store::{SecureStore, StoreEditor, DEFAULT_NAMESPACE};
pub use types::{CoinType, EncodingScheme, EntropyStrength, ParsePolicyError, Purpose, RevealState, WalletPolicy, WalletRecord};
pub use wallet::{Bip32Engine, KeyEngine, MnemonicHandle, WalletManager, PRIVATE_KEY, PUBLIC_KEY, RECOVERY_PHRASE};
