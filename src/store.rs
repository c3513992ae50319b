//! Encrypted key-value store on SQLite
//!
//! One store instance is scoped to a single namespace. Values are sealed with
//! the namespace master key (see [`crate::wallet::MasterKey`]); writes go
//! through a [`StoreEditor`] and land in one transaction on `commit`.

use crate::error::{Result, WalletError};
use crate::wallet::{MasterKey, SealedValue};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Namespace used when none is configured
pub const DEFAULT_NAMESPACE: &str = "wallet_pref";

const CHECK_KEY_ID: &str = "__keyset_check__";
const CHECK_PLAINTEXT: &str = "hd-vault keyset v1";

/// Encrypted string preferences for one namespace
pub struct SecureStore {
    pool: SqlitePool,
    namespace: String,
    password: Option<Zeroizing<String>>,
    master_key: Mutex<Option<Arc<MasterKey>>>,
}

impl SecureStore {
    /// Open (or create) the store backed by the SQLite file at `path`
    pub async fn open(path: &str, namespace: &str, password: Option<&str>) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(path)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::with_pool(pool, namespace, password).await
    }

    /// Open a private in-memory store, mostly useful for tests
    pub async fn open_in_memory(namespace: &str, password: Option<&str>) -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // Every in-memory connection is its own database, so keep exactly one
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool, namespace, password).await
    }

    async fn with_pool(pool: SqlitePool, namespace: &str, password: Option<&str>) -> Result<Self> {
        let store = Self {
            pool,
            namespace: namespace.to_string(),
            password: password.filter(|p| !p.is_empty()).map(|p| Zeroizing::new(p.to_string())),
            master_key: Mutex::new(None),
        };
        store.initialize().await?;

        debug!("[SecureStore] Opened namespace {}", store.namespace);
        Ok(store)
    }

    /// Initialize database schema
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS keysets (
                namespace TEXT PRIMARY KEY,
                salt BLOB NOT NULL,
                check_nonce BLOB NOT NULL,
                check_ciphertext BLOB NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS secure_prefs (
                namespace TEXT NOT NULL,
                key_id TEXT NOT NULL,
                nonce BLOB NOT NULL,
                ciphertext BLOB NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (namespace, key_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Read a value, or `default` when the key is absent or the namespace
    /// has no key material yet.
    ///
    /// Fails with `StoreUnavailable` on database errors, a missing or wrong
    /// master password, or a corrupted entry.
    pub async fn get(&self, key: &str, default: &str) -> Result<String> {
        let [value] = self.get_all([key], default).await?;
        Ok(value)
    }

    /// Read several values from one read transaction, so they all come from
    /// the same committed state even with other writers on the file.
    ///
    /// Absent keys fall back to `default`, as in [`SecureStore::get`].
    pub async fn get_all<const N: usize>(&self, keys: [&str; N], default: &str) -> Result<[String; N]> {
        let mut values: [String; N] = std::array::from_fn(|_| default.to_string());

        let mut cache = self.master_key.lock().await;
        let mut tx = self.pool.begin().await?;

        let master_key = match cache.clone() {
            Some(k) => k,
            None => match self.load_keyset(&mut tx).await? {
                Some(k) => {
                    *cache = Some(k.clone());
                    k
                }
                None => return Ok(values),
            },
        };
        drop(cache);

        for (slot, key) in values.iter_mut().zip(keys) {
            let key_id = master_key.key_id(key);
            let row = sqlx::query("SELECT nonce, ciphertext FROM secure_prefs WHERE namespace = ? AND key_id = ?")
                .bind(&self.namespace)
                .bind(&key_id)
                .fetch_optional(&mut *tx)
                .await?;

            if let Some(r) = row {
                let sealed = SealedValue {
                    nonce: r.try_get("nonce")?,
                    ciphertext: r.try_get("ciphertext")?,
                };
                *slot = master_key.open(&key_id, &sealed)?;
            }
        }

        tx.commit().await?;
        Ok(values)
    }

    /// Begin a batch of writes
    pub fn edit(&self) -> StoreEditor<'_> {
        StoreEditor {
            store: self,
            pending: Vec::new(),
        }
    }

    /// Release the underlying connection pool
    pub async fn close(self) {
        self.pool.close().await;
        debug!("[SecureStore] Closed namespace {}", self.namespace);
    }

    fn password(&self) -> Result<&str> {
        self.password
            .as_ref()
            .map(|p| p.as_str())
            .ok_or_else(|| WalletError::store("master password not configured"))
    }

    /// Derive and verify the namespace key if the namespace is provisioned
    async fn load_keyset(&self, conn: &mut SqliteConnection) -> Result<Option<Arc<MasterKey>>> {
        let row = sqlx::query("SELECT salt, check_nonce, check_ciphertext FROM keysets WHERE namespace = ?")
            .bind(&self.namespace)
            .fetch_optional(&mut *conn)
            .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        let salt: Vec<u8> = r.try_get("salt")?;
        let check = SealedValue {
            nonce: r.try_get("check_nonce")?,
            ciphertext: r.try_get("check_ciphertext")?,
        };

        let master_key = MasterKey::derive(self.password()?, &salt)?;
        match master_key.open(CHECK_KEY_ID, &check) {
            Ok(text) if text == CHECK_PLAINTEXT => Ok(Some(Arc::new(master_key))),
            _ => Err(WalletError::store(format!(
                "key material for namespace '{}' cannot be unlocked",
                self.namespace
            ))),
        }
    }

    /// Load the namespace key, creating the keyset on first use
    async fn load_or_provision_keyset(&self, conn: &mut SqliteConnection) -> Result<Arc<MasterKey>> {
        if let Some(k) = self.load_keyset(conn).await? {
            return Ok(k);
        }

        let salt = MasterKey::generate_salt();
        let master_key = MasterKey::derive(self.password()?, &salt)?;
        let check = master_key.seal(CHECK_KEY_ID, CHECK_PLAINTEXT)?;

        sqlx::query(
            r#"
            INSERT INTO keysets (namespace, salt, check_nonce, check_ciphertext, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.namespace)
        .bind(&salt[..])
        .bind(&check.nonce)
        .bind(&check.ciphertext)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await?;

        info!("[SecureStore] Provisioned key material for namespace {}", self.namespace);
        Ok(Arc::new(master_key))
    }
}

/// Pending writes against a [`SecureStore`].
///
/// Nothing is visible to readers until [`StoreEditor::commit`]; dropping an
/// editor discards its writes.
pub struct StoreEditor<'a> {
    store: &'a SecureStore,
    pending: Vec<(String, Zeroizing<String>)>,
}

impl StoreEditor<'_> {
    /// Stage a value; a later put for the same key wins
    pub fn put(mut self, key: &str, value: impl Into<String>) -> Self {
        self.pending.retain(|(k, _)| k != key);
        self.pending.push((key.to_string(), Zeroizing::new(value.into())));
        self
    }

    /// Write all staged values in one transaction
    pub async fn commit(self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let store = self.store;
        let mut cache = store.master_key.lock().await;
        let mut tx = store.pool.begin().await?;

        let master_key = match cache.clone() {
            Some(k) => k,
            None => store.load_or_provision_keyset(&mut tx).await?,
        };

        let now = Utc::now().to_rfc3339();
        for (key, value) in &self.pending {
            let key_id = master_key.key_id(key);
            let sealed = master_key.seal(&key_id, value)?;

            sqlx::query(
                r#"
                INSERT INTO secure_prefs (namespace, key_id, nonce, ciphertext, updated_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(namespace, key_id) DO UPDATE SET
                    nonce = excluded.nonce,
                    ciphertext = excluded.ciphertext,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&store.namespace)
            .bind(&key_id)
            .bind(&sealed.nonce)
            .bind(&sealed.ciphertext)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        *cache = Some(master_key);

        debug!(
            "[SecureStore] Committed {} entries to namespace {}",
            self.pending.len(),
            store.namespace
        );
        Ok(())
    }
}
