//! Wallet management module
//!
//! Provides the HD key engine, wallet generation and the encrypted
//! persistence protocol.

mod encryption;
mod engine;
mod manager;

pub use encryption::{MasterKey, SealedValue, SALT_LEN};
pub use engine::{Bip32Engine, KeyEngine, MnemonicHandle};
pub use manager::{WalletManager, PRIVATE_KEY, PUBLIC_KEY, RECOVERY_PHRASE};
