//! Configuration management for the wallet vault

use crate::store::DEFAULT_NAMESPACE;
use crate::types::{CoinType, EncodingScheme, EntropyStrength, Purpose, WalletPolicy};
use anyhow::{Context, Result};
use std::env;
use std::fmt;

/// Vault configuration loaded from environment
#[derive(Clone)]
pub struct Config {
    /// Path to SQLite database
    pub database_path: String,

    /// Store namespace holding the wallet record
    pub namespace: String,

    /// Password the namespace master key is derived from
    pub master_password: Option<String>,

    /// Generation policy (strength, coin, encoding, BIP39 passphrase)
    pub policy: WalletPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "hd_vault.db".to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            master_password: None,
            policy: WalletPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|s| !s.trim().is_empty());
        let defaults = Self::default();

        let database_path = var("DATABASE_PATH").unwrap_or(defaults.database_path);
        let namespace = var("WALLET_NAMESPACE").unwrap_or(defaults.namespace);
        let master_password = lookup("WALLET_MASTER_PASSWORD").filter(|s| !s.is_empty());

        let strength = match var("WALLET_ENTROPY_BITS") {
            Some(v) => v.parse::<EntropyStrength>().context("Invalid WALLET_ENTROPY_BITS")?,
            None => defaults.policy.strength,
        };

        let coin_type = match var("WALLET_COIN_TYPE") {
            Some(v) => v.parse::<CoinType>().context("Invalid WALLET_COIN_TYPE")?,
            None => defaults.policy.coin_type,
        };

        let purpose = match var("WALLET_PURPOSE") {
            Some(v) => v.parse::<Purpose>().context("Invalid WALLET_PURPOSE")?,
            None => defaults.policy.scheme.purpose(),
        };

        let scheme = match var("WALLET_ENCODING") {
            Some(v) => EncodingScheme::parse_with_purpose(&v, purpose).context("Invalid WALLET_ENCODING")?,
            None => EncodingScheme::ExtendedKey { purpose },
        };

        let passphrase = lookup("WALLET_BIP39_PASSPHRASE").unwrap_or_default();

        Ok(Self {
            database_path,
            namespace,
            master_password,
            policy: WalletPolicy {
                strength,
                coin_type,
                scheme,
                passphrase,
            },
        })
    }

    /// Check if a master password is configured
    pub fn has_master_password(&self) -> bool {
        self.master_password.is_some()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("namespace", &self.namespace)
            .field("master_password", &self.master_password.as_ref().map(|_| "<redacted>"))
            .field("strength", &self.policy.strength)
            .field("coin_type", &self.policy.coin_type)
            .field("scheme", &self.policy.scheme)
            .field("has_passphrase", &!self.policy.passphrase.is_empty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database_path, "hd_vault.db");
        assert_eq!(config.namespace, "wallet_pref");
        assert!(!config.has_master_password());
        assert_eq!(config.policy, WalletPolicy::default());
    }

    #[test]
    fn test_raw_bitcoin_policy() {
        let config = config_from(&[
            ("WALLET_ENTROPY_BITS", "256"),
            ("WALLET_COIN_TYPE", "bitcoin"),
            ("WALLET_ENCODING", "raw"),
            ("WALLET_PURPOSE", "84"),
            ("WALLET_MASTER_PASSWORD", "hunter2"),
        ])
        .unwrap();

        assert_eq!(config.policy.strength, EntropyStrength::Bits256);
        assert_eq!(config.policy.coin_type, CoinType::Bitcoin);
        assert_eq!(config.policy.scheme, EncodingScheme::RawSecp256k1 { purpose: Purpose::Bip84 });
        assert_eq!(config.master_password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(config_from(&[("WALLET_ENTROPY_BITS", "192")]).is_err());
        assert!(config_from(&[("WALLET_COIN_TYPE", "solana")]).is_err());
        assert!(config_from(&[("WALLET_ENCODING", "wif")]).is_err());
    }

    #[test]
    fn test_debug_hides_password() {
        let config = config_from(&[("WALLET_MASTER_PASSWORD", "hunter2")]).unwrap();
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
