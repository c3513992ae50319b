//! HD key engine: BIP39 mnemonics and BIP32 derivation over secp256k1

use crate::error::{Result, WalletError};
use crate::types::{CoinType, EncodingScheme, EntropyStrength, Purpose};
use bip32::{DerivationPath, Prefix, XPrv};
use bip39::{Language, Mnemonic};
use rand::RngCore;
use std::fmt;
use zeroize::{Zeroize, Zeroizing};

/// A generated or restored mnemonic together with its BIP39 seed.
pub struct MnemonicHandle {
    phrase: Zeroizing<String>,
    seed: Zeroizing<[u8; 64]>,
}

impl MnemonicHandle {
    /// Wrap a phrase and its seed produced by any engine
    pub fn new(phrase: Zeroizing<String>, seed: Zeroizing<[u8; 64]>) -> Self {
        Self { phrase, seed }
    }

    fn from_mnemonic(mnemonic: &Mnemonic, passphrase: &str) -> Self {
        Self::new(
            Zeroizing::new(mnemonic.to_string()),
            Zeroizing::new(mnemonic.to_seed(passphrase)),
        )
    }

    pub fn seed(&self) -> &[u8; 64] {
        &self.seed
    }

    pub fn word_count(&self) -> usize {
        self.phrase.split_whitespace().count()
    }
}

impl fmt::Debug for MnemonicHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MnemonicHandle")
            .field("words", &self.word_count())
            .finish_non_exhaustive()
    }
}

/// Capabilities the wallet manager needs from a cryptographic engine.
///
/// Derivation must be deterministic: the same handle, coin and scheme
/// always produce the same encoding.
pub trait KeyEngine: Send + Sync {
    /// Produce a fresh mnemonic of the given strength
    fn generate_mnemonic(&self, strength: EntropyStrength, passphrase: &str) -> Result<MnemonicHandle>;

    fn derive_public_key_encoding(
        &self,
        mnemonic: &MnemonicHandle,
        coin: CoinType,
        scheme: EncodingScheme,
    ) -> Result<String>;

    fn derive_private_key_encoding(
        &self,
        mnemonic: &MnemonicHandle,
        coin: CoinType,
        scheme: EncodingScheme,
    ) -> Result<String>;

    /// Space-separated recovery words
    fn mnemonic_text(&self, mnemonic: &MnemonicHandle) -> String {
        mnemonic.phrase.as_str().to_owned()
    }
}

/// Default engine backed by the `bip39` and `bip32` crates (English wordlist).
#[derive(Debug, Clone, Copy, Default)]
pub struct Bip32Engine;

impl Bip32Engine {
    pub fn new() -> Self {
        Self
    }

    /// Rebuild a handle from an existing phrase
    pub fn restore_mnemonic(&self, phrase: &str, passphrase: &str) -> Result<MnemonicHandle> {
        let mnemonic = Mnemonic::parse_in(Language::English, phrase)
            .map_err(|e| WalletError::engine(format!("invalid mnemonic: {e}")))?;
        Ok(MnemonicHandle::from_mnemonic(&mnemonic, passphrase))
    }

    fn derive(&self, mnemonic: &MnemonicHandle, coin: CoinType, scheme: EncodingScheme) -> Result<XPrv> {
        let path: DerivationPath = scheme
            .derivation_path(coin)
            .parse()
            .map_err(|e| WalletError::engine(format!("invalid derivation path: {e}")))?;
        XPrv::derive_from_path(mnemonic.seed(), &path)
            .map_err(|e| WalletError::engine(format!("key derivation failed: {e}")))
    }
}

fn extended_prefixes(purpose: Purpose) -> (Prefix, Prefix) {
    match purpose {
        Purpose::Bip44 => (Prefix::XPUB, Prefix::XPRV),
        Purpose::Bip49 => (Prefix::YPUB, Prefix::YPRV),
        Purpose::Bip84 => (Prefix::ZPUB, Prefix::ZPRV),
    }
}

impl KeyEngine for Bip32Engine {
    fn generate_mnemonic(&self, strength: EntropyStrength, passphrase: &str) -> Result<MnemonicHandle> {
        let mut entropy = vec![0u8; strength.byte_len()];
        rand::thread_rng()
            .try_fill_bytes(&mut entropy)
            .map_err(|e| WalletError::engine(format!("entropy source failed: {e}")))?;

        let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy);
        entropy.zeroize();
        let mnemonic = mnemonic.map_err(|e| WalletError::engine(format!("mnemonic generation failed: {e}")))?;

        Ok(MnemonicHandle::from_mnemonic(&mnemonic, passphrase))
    }

    fn derive_public_key_encoding(
        &self,
        mnemonic: &MnemonicHandle,
        coin: CoinType,
        scheme: EncodingScheme,
    ) -> Result<String> {
        let xprv = self.derive(mnemonic, coin, scheme)?;
        let xpub = xprv.public_key();
        Ok(match scheme {
            EncodingScheme::ExtendedKey { purpose } => xpub.to_string(extended_prefixes(purpose).0),
            EncodingScheme::RawSecp256k1 { .. } => hex::encode(xpub.to_bytes()),
        })
    }

    fn derive_private_key_encoding(
        &self,
        mnemonic: &MnemonicHandle,
        coin: CoinType,
        scheme: EncodingScheme,
    ) -> Result<String> {
        let xprv = self.derive(mnemonic, coin, scheme)?;
        Ok(match scheme {
            EncodingScheme::ExtendedKey { purpose } => xprv.to_string(extended_prefixes(purpose).1).as_str().to_owned(),
            EncodingScheme::RawSecp256k1 { .. } => hex::encode(xprv.to_bytes()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PHRASE: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_generate_word_counts() {
        let engine = Bip32Engine::new();

        let short = engine.generate_mnemonic(EntropyStrength::Bits128, "").unwrap();
        assert_eq!(short.word_count(), 12);

        let long = engine.generate_mnemonic(EntropyStrength::Bits256, "").unwrap();
        assert_eq!(long.word_count(), 24);
    }

    #[test]
    fn test_generated_words_are_english_bip39() {
        let engine = Bip32Engine::new();
        let handle = engine.generate_mnemonic(EntropyStrength::Bits256, "").unwrap();
        let text = engine.mnemonic_text(&handle);

        for word in text.split(' ') {
            assert_eq!(word, word.to_lowercase());
            assert!(Language::English.find_word(word).is_some(), "unknown word {word}");
        }
    }

    #[test]
    fn test_known_seed_vector() {
        // BIP39 reference vector with passphrase "TREZOR"
        let engine = Bip32Engine::new();
        let handle = engine.restore_mnemonic(TEST_PHRASE, "TREZOR").unwrap();
        assert_eq!(
            hex::encode(handle.seed()),
            "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04"
        );

        let root = XPrv::new(handle.seed()).unwrap();
        assert_eq!(
            root.to_string(Prefix::XPRV).as_str(),
            "xprv9s21ZrQH143K3h3fDYiay8mocZ3afhfULfb5GX8kCBdno77K4HiA15Tg23wpbeF1pLfs1c5SPmYHrEpTuuRhxMwvKDwqdKiGJS9XFKzUsAF"
        );
    }

    #[test]
    fn test_known_ethereum_key() {
        let engine = Bip32Engine::new();
        let handle = engine.restore_mnemonic(TEST_PHRASE, "").unwrap();
        let scheme = EncodingScheme::RawSecp256k1 { purpose: Purpose::Bip44 };

        let private_key = engine
            .derive_private_key_encoding(&handle, CoinType::Ethereum, scheme)
            .unwrap();
        assert_eq!(private_key, "1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727");
    }

    #[test]
    fn test_extended_key_prefixes() {
        let engine = Bip32Engine::new();
        let handle = engine.restore_mnemonic(TEST_PHRASE, "").unwrap();

        let scheme = EncodingScheme::ExtendedKey { purpose: Purpose::Bip44 };
        let xpub = engine.derive_public_key_encoding(&handle, CoinType::Ethereum, scheme).unwrap();
        let xprv = engine.derive_private_key_encoding(&handle, CoinType::Ethereum, scheme).unwrap();
        assert!(xpub.starts_with("xpub"));
        assert!(xprv.starts_with("xprv"));

        let scheme = EncodingScheme::ExtendedKey { purpose: Purpose::Bip84 };
        let zpub = engine.derive_public_key_encoding(&handle, CoinType::Bitcoin, scheme).unwrap();
        assert!(zpub.starts_with("zpub"));
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let engine = Bip32Engine::new();
        let handle = engine.generate_mnemonic(EntropyStrength::Bits128, "").unwrap();

        for scheme in [
            EncodingScheme::ExtendedKey { purpose: Purpose::Bip44 },
            EncodingScheme::RawSecp256k1 { purpose: Purpose::Bip44 },
        ] {
            let first = engine.derive_public_key_encoding(&handle, CoinType::Ethereum, scheme).unwrap();
            let second = engine.derive_public_key_encoding(&handle, CoinType::Ethereum, scheme).unwrap();
            assert_eq!(first, second);

            let first = engine.derive_private_key_encoding(&handle, CoinType::Ethereum, scheme).unwrap();
            let second = engine.derive_private_key_encoding(&handle, CoinType::Ethereum, scheme).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_passphrase_changes_keys() {
        let engine = Bip32Engine::new();
        let plain = engine.restore_mnemonic(TEST_PHRASE, "").unwrap();
        let salted = engine.restore_mnemonic(TEST_PHRASE, "extra").unwrap();
        let scheme = EncodingScheme::default();

        assert_ne!(
            engine.derive_public_key_encoding(&plain, CoinType::Ethereum, scheme).unwrap(),
            engine.derive_public_key_encoding(&salted, CoinType::Ethereum, scheme).unwrap()
        );
    }

    #[test]
    fn test_restore_rejects_bad_checksum() {
        let engine = Bip32Engine::new();
        let bad = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon";
        assert!(matches!(
            engine.restore_mnemonic(bad, ""),
            Err(WalletError::EngineUnavailable(_))
        ));
    }
}
