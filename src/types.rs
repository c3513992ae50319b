//! Core types for wallet records and generation policy

use crate::error::WalletError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The persisted wallet: two derived key encodings and the recovery phrase.
///
/// Either all three fields are empty (no wallet) or all three are set.
/// The phrase is the source of truth; the keys are cached encodings of it.
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct WalletRecord {
    pub public_key: String,
    pub private_key: String,
    pub mnemonic_phrase: String,
}

impl WalletRecord {
    pub fn new(
        public_key: impl Into<String>,
        private_key: impl Into<String>,
        mnemonic_phrase: impl Into<String>,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
            mnemonic_phrase: mnemonic_phrase.into(),
        }
    }

    /// No wallet present
    pub fn is_empty(&self) -> bool {
        self.public_key.is_empty() && self.private_key.is_empty() && self.mnemonic_phrase.is_empty()
    }

    /// All three fields populated
    pub fn is_complete(&self) -> bool {
        !self.public_key.is_empty() && !self.private_key.is_empty() && !self.mnemonic_phrase.is_empty()
    }

    /// Check the all-or-nothing invariant.
    ///
    /// Returns `InconsistentRecord` listing which fields are populated when
    /// the record is neither empty nor complete.
    pub fn check_consistency(&self) -> Result<(), WalletError> {
        if self.is_empty() || self.is_complete() {
            return Ok(());
        }
        Err(WalletError::InconsistentRecord {
            public_key: !self.public_key.is_empty(),
            private_key: !self.private_key.is_empty(),
            mnemonic_phrase: !self.mnemonic_phrase.is_empty(),
        })
    }

    /// Number of words in the recovery phrase
    pub fn word_count(&self) -> usize {
        self.mnemonic_phrase.split_whitespace().count()
    }
}

impl fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletRecord")
            .field("public_key", &self.public_key)
            .field("private_key", &redacted(&self.private_key))
            .field("mnemonic_phrase", &redacted(&self.mnemonic_phrase))
            .finish()
    }
}

fn redacted(value: &str) -> &'static str {
    if value.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

/// Whether the recovery phrase is currently shown. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevealState {
    pub show_recovery: bool,
}

impl RevealState {
    pub fn toggle(&mut self) {
        self.show_recovery = !self.show_recovery;
    }
}

/// Error returned when a policy value cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ParsePolicyError(pub(crate) String);

/// Mnemonic entropy strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntropyStrength {
    /// 128 bits, 12 words
    #[default]
    Bits128,
    /// 256 bits, 24 words
    Bits256,
}

impl EntropyStrength {
    pub const fn bits(self) -> usize {
        match self {
            Self::Bits128 => 128,
            Self::Bits256 => 256,
        }
    }

    pub const fn byte_len(self) -> usize {
        self.bits() / 8
    }

    /// Words in a BIP39 phrase of this strength (one checksum bit per 32 entropy bits)
    pub const fn word_count(self) -> usize {
        (self.bits() + self.bits() / 32) / 11
    }

    pub fn from_bits(bits: usize) -> Option<Self> {
        match bits {
            128 => Some(Self::Bits128),
            256 => Some(Self::Bits256),
            _ => None,
        }
    }
}

impl FromStr for EntropyStrength {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<usize>()
            .ok()
            .and_then(Self::from_bits)
            .ok_or_else(|| {
                ParsePolicyError(format!(
                    "unsupported entropy strength '{s}', expected 128 or 256"
                ))
            })
    }
}

/// SLIP-44 coin types supported by the secp256k1 engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CoinType {
    Bitcoin,
    Litecoin,
    Dogecoin,
    #[default]
    Ethereum,
}

impl CoinType {
    /// SLIP-44 registered index
    pub const fn slip44(self) -> u32 {
        match self {
            Self::Bitcoin => 0,
            Self::Litecoin => 2,
            Self::Dogecoin => 3,
            Self::Ethereum => 60,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bitcoin => "Bitcoin",
            Self::Litecoin => "Litecoin",
            Self::Dogecoin => "Dogecoin",
            Self::Ethereum => "Ethereum",
        }
    }

    pub const fn all() -> &'static [Self] {
        &[Self::Bitcoin, Self::Litecoin, Self::Dogecoin, Self::Ethereum]
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CoinType {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if let Ok(index) = lower.parse::<u32>() {
            return Self::all()
                .iter()
                .copied()
                .find(|c| c.slip44() == index)
                .ok_or_else(|| ParsePolicyError(format!("unsupported coin type {index}")));
        }
        match lower.as_str() {
            "bitcoin" | "btc" => Ok(Self::Bitcoin),
            "litecoin" | "ltc" => Ok(Self::Litecoin),
            "dogecoin" | "doge" => Ok(Self::Dogecoin),
            "ethereum" | "eth" => Ok(Self::Ethereum),
            _ => Err(ParsePolicyError(format!("unsupported coin type '{s}'"))),
        }
    }
}

/// BIP43 purpose level; also selects extended-key version bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Purpose {
    /// Legacy, xpub/xprv
    #[default]
    Bip44,
    /// Nested segwit, ypub/yprv
    Bip49,
    /// Native segwit, zpub/zprv
    Bip84,
}

impl Purpose {
    pub const fn index(self) -> u32 {
        match self {
            Self::Bip44 => 44,
            Self::Bip49 => 49,
            Self::Bip84 => 84,
        }
    }
}

impl FromStr for Purpose {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().trim_start_matches("bip") {
            "44" => Ok(Self::Bip44),
            "49" => Ok(Self::Bip49),
            "84" => Ok(Self::Bip84),
            _ => Err(ParsePolicyError(format!(
                "unsupported purpose '{s}', expected 44, 49 or 84"
            ))),
        }
    }
}

/// How derived keys are rendered into the record. One scheme per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncodingScheme {
    /// Account-level BIP32 extended keys at `m/purpose'/coin'/0'`
    ExtendedKey { purpose: Purpose },
    /// First receive key at `m/purpose'/coin'/0'/0/0`: hex scalar and
    /// compressed public point
    RawSecp256k1 { purpose: Purpose },
}

impl Default for EncodingScheme {
    fn default() -> Self {
        Self::ExtendedKey {
            purpose: Purpose::Bip44,
        }
    }
}

impl EncodingScheme {
    pub const fn purpose(self) -> Purpose {
        match self {
            Self::ExtendedKey { purpose } | Self::RawSecp256k1 { purpose } => purpose,
        }
    }

    /// BIP32 path of the key this scheme encodes
    pub fn derivation_path(self, coin: CoinType) -> String {
        let purpose = self.purpose().index();
        let coin = coin.slip44();
        match self {
            Self::ExtendedKey { .. } => format!("m/{purpose}'/{coin}'/0'"),
            Self::RawSecp256k1 { .. } => format!("m/{purpose}'/{coin}'/0'/0/0"),
        }
    }

    /// Parse a scheme name (`extended` or `raw`) with the given purpose
    pub fn parse_with_purpose(name: &str, purpose: Purpose) -> Result<Self, ParsePolicyError> {
        match name.trim().to_lowercase().as_str() {
            "extended" | "xpub" | "extended-key" => Ok(Self::ExtendedKey { purpose }),
            "raw" | "secp256k1" | "raw-secp256k1" => Ok(Self::RawSecp256k1 { purpose }),
            _ => Err(ParsePolicyError(format!(
                "unsupported encoding scheme '{name}', expected 'extended' or 'raw'"
            ))),
        }
    }
}

impl fmt::Display for EncodingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExtendedKey { purpose } => write!(f, "extended key (BIP{})", purpose.index()),
            Self::RawSecp256k1 { purpose } => write!(f, "raw secp256k1 (BIP{})", purpose.index()),
        }
    }
}

/// The fixed generation policy of a deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletPolicy {
    pub strength: EntropyStrength,
    pub coin_type: CoinType,
    pub scheme: EncodingScheme,
    /// Optional BIP39 passphrase ("25th word"), empty by default
    pub passphrase: String,
}
