//! Session boundary: open loads the persisted wallet, close saves it and
//! releases the store.

use crate::config::Config;
use crate::error::Result;
use crate::store::SecureStore;
use crate::types::{RevealState, WalletRecord};
use crate::wallet::{Bip32Engine, KeyEngine, WalletManager};
use tracing::{info, warn};

/// One interactive session over the wallet record
pub struct WalletSession<E = Bip32Engine> {
    manager: WalletManager<E>,
    record: WalletRecord,
    reveal: RevealState,
}

impl WalletSession<Bip32Engine> {
    /// Open the store described by `config` and load the wallet
    pub async fn open_with_config(config: &Config) -> Result<Self> {
        let store = SecureStore::open(
            &config.database_path,
            &config.namespace,
            config.master_password.as_deref(),
        )
        .await?;

        let manager = WalletManager::with_default_engine(store, config.policy.clone());
        Self::open(manager).await
    }
}

impl<E: KeyEngine> WalletSession<E> {
    /// Start a session by loading the last persisted record
    pub async fn open(manager: WalletManager<E>) -> Result<Self> {
        let record = manager.load().await?;

        if let Err(e) = record.check_consistency() {
            warn!("[Session] {}", e);
        }
        info!(
            "[Session] Opened ({})",
            if record.is_empty() { "no wallet" } else { "wallet present" }
        );

        Ok(Self {
            manager,
            record,
            reveal: RevealState::default(),
        })
    }

    pub fn record(&self) -> &WalletRecord {
        &self.record
    }

    /// A displayable wallet is present (all three fields set)
    pub fn has_wallet(&self) -> bool {
        self.record.is_complete()
    }

    /// Any field is stored, even when the record is incomplete. A stored
    /// recovery phrase alone is enough to restore the wallet.
    pub fn has_key_material(&self) -> bool {
        !self.record.is_empty()
    }

    pub fn manager(&self) -> &WalletManager<E> {
        &self.manager
    }

    /// Generate a new wallet with the configured policy and persist it.
    ///
    /// On failure the session keeps its previous record and the store keeps
    /// its previous contents.
    pub async fn regenerate(&mut self) -> Result<&WalletRecord> {
        let record = self.manager.generate_default()?;
        self.manager.save(&record).await?;
        self.record = record;
        Ok(&self.record)
    }

    pub fn reveal_state(&self) -> RevealState {
        self.reveal
    }

    /// Flip recovery phrase visibility, returning the new state
    pub fn toggle_recovery(&mut self) -> bool {
        self.reveal.toggle();
        self.reveal.show_recovery
    }

    /// The phrase, only while revealed
    pub fn visible_phrase(&self) -> Option<&str> {
        (self.reveal.show_recovery && !self.record.mnemonic_phrase.is_empty())
            .then_some(self.record.mnemonic_phrase.as_str())
    }

    /// End the session: save the current record and release the store.
    ///
    /// The store is released even when the save fails.
    pub async fn close(self) -> Result<()> {
        let result = if self.record.is_empty() {
            Ok(())
        } else {
            self.manager.save(&self.record).await
        };

        self.manager.into_store().close().await;
        info!("[Session] Closed");
        result
    }
}
