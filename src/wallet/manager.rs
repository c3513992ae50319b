//! Wallet generation and the load/save protocol against the secure store

use super::engine::{Bip32Engine, KeyEngine};
use crate::error::{Result, WalletError};
use crate::store::SecureStore;
use crate::types::{CoinType, EncodingScheme, EntropyStrength, WalletPolicy, WalletRecord};
use tokio::sync::RwLock;
use tracing::{debug, info};

pub const PUBLIC_KEY: &str = "PUBLIC_KEY";
pub const PRIVATE_KEY: &str = "PRIVATE_KEY";
pub const RECOVERY_PHRASE: &str = "RECOVERY_PHRASE";

/// Owns wallet generation and persistence of the single wallet record.
///
/// Reads share the store; a save holds it exclusively, so a reader never
/// sees a half-written record.
pub struct WalletManager<E = Bip32Engine> {
    engine: E,
    store: RwLock<SecureStore>,
    policy: WalletPolicy,
}

impl WalletManager<Bip32Engine> {
    pub fn with_default_engine(store: SecureStore, policy: WalletPolicy) -> Self {
        Self::new(Bip32Engine::new(), store, policy)
    }
}

impl<E: KeyEngine> WalletManager<E> {
    pub fn new(engine: E, store: SecureStore, policy: WalletPolicy) -> Self {
        Self {
            engine,
            store: RwLock::new(store),
            policy,
        }
    }

    pub fn policy(&self) -> &WalletPolicy {
        &self.policy
    }

    /// Generate a fresh wallet. Does not persist it.
    ///
    /// Both key encodings come from the same mnemonic, coin and scheme. Any
    /// engine failure is reported as `EngineUnavailable` and nothing changes.
    pub fn generate(
        &self,
        strength: EntropyStrength,
        coin: CoinType,
        scheme: EncodingScheme,
    ) -> Result<WalletRecord> {
        let mnemonic = self
            .engine
            .generate_mnemonic(strength, &self.policy.passphrase)
            .map_err(as_engine_error)?;

        let public_key = self
            .engine
            .derive_public_key_encoding(&mnemonic, coin, scheme)
            .map_err(as_engine_error)?;
        let private_key = self
            .engine
            .derive_private_key_encoding(&mnemonic, coin, scheme)
            .map_err(as_engine_error)?;
        let phrase = self.engine.mnemonic_text(&mnemonic);

        let record = WalletRecord::new(public_key, private_key, phrase);
        if !record.is_complete() {
            return Err(WalletError::EngineUnavailable(
                "engine returned an empty key or phrase".to_string(),
            ));
        }

        info!(
            "[WalletManager] Generated {}-word wallet for {} using {}",
            record.word_count(),
            coin,
            scheme
        );
        Ok(record)
    }

    /// Generate with the configured policy
    pub fn generate_default(&self) -> Result<WalletRecord> {
        self.generate(self.policy.strength, self.policy.coin_type, self.policy.scheme)
    }

    /// Read the persisted record in one read transaction. Missing fields
    /// come back empty; partial records are returned as-is.
    pub async fn load(&self) -> Result<WalletRecord> {
        let store = self.store.read().await;

        let [public_key, private_key, phrase] = store
            .get_all([PUBLIC_KEY, PRIVATE_KEY, RECOVERY_PHRASE], "")
            .await?;
        let record = WalletRecord::new(public_key, private_key, phrase);

        debug!(
            "[WalletManager] Loaded record from {} (present: {})",
            store.namespace(),
            !record.is_empty()
        );
        Ok(record)
    }

    /// Persist all three fields in one transaction
    pub async fn save(&self, record: &WalletRecord) -> Result<()> {
        let store = self.store.write().await;

        store
            .edit()
            .put(PUBLIC_KEY, record.public_key.as_str())
            .put(PRIVATE_KEY, record.private_key.as_str())
            .put(RECOVERY_PHRASE, record.mnemonic_phrase.as_str())
            .commit()
            .await?;

        debug!("[WalletManager] Saved record to {}", store.namespace());
        Ok(())
    }

    /// Give back the store so it can be closed
    pub fn into_store(self) -> SecureStore {
        self.store.into_inner()
    }
}

fn as_engine_error(err: WalletError) -> WalletError {
    match err {
        WalletError::EngineUnavailable(_) => err,
        other => WalletError::EngineUnavailable(other.to_string()),
    }
}
