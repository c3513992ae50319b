//! `hd-vault` binary against an on-disk store

use hd_vault::{SecureStore, WalletManager, WalletPolicy, DEFAULT_NAMESPACE, RECOVERY_PHRASE};
use std::process::{Command, Output};
use tempfile::TempDir;

const PASSWORD: &str = "cli-password";
const PHRASE: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn db_path(dir: &TempDir) -> String {
    dir.path().join("vault.db").to_string_lossy().into_owned()
}

fn run(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hd-vault"))
        .args(args)
        .current_dir(dir.path())
        .env_clear()
        .env("DATABASE_PATH", db_path(dir))
        .env("WALLET_MASTER_PASSWORD", PASSWORD)
        .output()
        .unwrap()
}

async fn stored_phrase(dir: &TempDir) -> String {
    let store = SecureStore::open(&db_path(dir), DEFAULT_NAMESPACE, Some(PASSWORD)).await.unwrap();
    let phrase = store.get(RECOVERY_PHRASE, "").await.unwrap();
    store.close().await;
    phrase
}

async fn seed_phrase_only(dir: &TempDir) {
    let store = SecureStore::open(&db_path(dir), DEFAULT_NAMESPACE, Some(PASSWORD)).await.unwrap();
    store.edit().put(RECOVERY_PHRASE, PHRASE).commit().await.unwrap();
    store.close().await;
}

#[tokio::test]
async fn test_generate_refuses_to_replace_stored_phrase() {
    let dir = tempfile::tempdir().unwrap();
    seed_phrase_only(&dir).await;

    let output = run(&dir, &["generate"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--force"));
    assert_eq!(stored_phrase(&dir).await, PHRASE);
}

#[tokio::test]
async fn test_generate_force_replaces_stored_phrase() {
    let dir = tempfile::tempdir().unwrap();
    seed_phrase_only(&dir).await;

    let output = run(&dir, &["generate", "--force"]);
    assert!(output.status.success());

    let store = SecureStore::open(&db_path(&dir), DEFAULT_NAMESPACE, Some(PASSWORD)).await.unwrap();
    let manager = WalletManager::with_default_engine(store, WalletPolicy::default());
    let record = manager.load().await.unwrap();
    assert!(record.is_complete());
    assert_ne!(record.mnemonic_phrase, PHRASE);
    manager.into_store().close().await;
}

#[tokio::test]
async fn test_generate_on_empty_store_then_refuse() {
    let dir = tempfile::tempdir().unwrap();

    assert!(run(&dir, &["generate"]).status.success());
    let first = stored_phrase(&dir).await;
    assert_eq!(first.split(' ').count(), 12);

    assert!(!run(&dir, &["generate"]).status.success());
    assert_eq!(stored_phrase(&dir).await, first);
}

#[tokio::test]
async fn test_show_json_hides_phrase_unless_revealed() {
    let dir = tempfile::tempdir().unwrap();
    assert!(run(&dir, &["generate"]).status.success());

    let hidden: serde_json::Value = serde_json::from_slice(&run(&dir, &["show", "--json"]).stdout).unwrap();
    assert!(hidden["public_key"].as_str().unwrap().starts_with("xpub"));
    assert!(hidden["recovery_phrase"].is_null());

    let shown: serde_json::Value =
        serde_json::from_slice(&run(&dir, &["show", "--json", "--reveal"]).stdout).unwrap();
    assert_eq!(shown["recovery_phrase"].as_str().unwrap(), stored_phrase(&dir).await);
}
