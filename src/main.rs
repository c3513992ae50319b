//! HD Vault CLI
//!
//! Generates an HD wallet and keeps its keys in an encrypted local store.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use hd_vault::{Config, WalletRecord, WalletSession};
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hd-vault")]
#[command(about = "Generate an HD wallet and keep its keys in encrypted local storage")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new wallet and store it
    Generate {
        /// Overwrite the wallet that is already stored
        #[arg(long)]
        force: bool,
    },

    /// Show the stored wallet
    Show {
        /// Also print the recovery phrase
        #[arg(short, long)]
        reveal: bool,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show whether a wallet is stored and the active policy
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose; logs go to stderr so stdout stays parseable
    let default_filter = if cli.verbose { "warn,hd_vault=debug" } else { "warn,hd_vault=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = Config::from_env()?;
    if !config.has_master_password() {
        warn!("WALLET_MASTER_PASSWORD is not set; stored wallets cannot be read or written");
    }

    let session = WalletSession::open_with_config(&config)
        .await
        .with_context(|| format!("Failed to open wallet store at {}", config.database_path))?;

    match cli.command {
        Commands::Generate { force } => generate(session, force).await,
        Commands::Show { reveal, json } => show(session, reveal, json).await,
        Commands::Status => status(session, &config).await,
    }
}

/// JSON shape of `show --json`; the phrase is null unless revealed
#[derive(Serialize)]
struct WalletView<'a> {
    public_key: &'a str,
    private_key: &'a str,
    recovery_phrase: Option<&'a str>,
}

async fn generate(mut session: WalletSession, force: bool) -> Result<()> {
    if session.has_key_material() && !force {
        if let Err(e) = session.record().check_consistency() {
            warn!("Stored wallet is incomplete: {}", e);
        }
        session.close().await?;
        anyhow::bail!("A wallet is already stored; pass --force to replace it (the old recovery phrase is lost)");
    }

    let generated = session.regenerate().await.map(|_| ());
    if let Err(e) = generated {
        session.close().await?;
        return Err(e).context("Wallet generation failed");
    }

    print_header("NEW WALLET");
    print_keys(session.record());
    println!(
        "\n  {}",
        "Run `hd-vault show --reveal` to view the recovery phrase and write it down.".yellow()
    );

    session.close().await?;
    Ok(())
}

async fn show(mut session: WalletSession, reveal: bool, as_json: bool) -> Result<()> {
    if reveal {
        session.toggle_recovery();
    }

    let record = session.record();
    if let Err(e) = record.check_consistency() {
        eprintln!("{} {}", "warning:".yellow().bold(), e);
    }

    if as_json {
        let view = WalletView {
            public_key: &record.public_key,
            private_key: &record.private_key,
            recovery_phrase: session.visible_phrase(),
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else if record.is_empty() {
        println!("No wallet stored. Run `hd-vault generate` to create one.");
    } else {
        print_header("WALLET");
        print_keys(record);
        match session.visible_phrase() {
            Some(phrase) => {
                println!("\n  Recovery Phrase:");
                for (i, word) in phrase.split_whitespace().enumerate() {
                    println!("    {:>2}. {}", i + 1, word);
                }
            }
            None => println!("\n  Recovery Phrase: {}", "hidden (use --reveal)".dimmed()),
        }
    }

    session.close().await?;
    Ok(())
}

async fn status(session: WalletSession, config: &Config) -> Result<()> {
    let policy = &config.policy;

    print_header("STATUS");
    println!("  Database:   {}", config.database_path);
    println!("  Namespace:  {}", config.namespace);
    println!(
        "  Wallet:     {}",
        if session.has_wallet() {
            "STORED".green()
        } else if session.has_key_material() {
            "INCOMPLETE".yellow()
        } else {
            "NONE".red()
        }
    );
    println!("  Coin:       {} ({})", policy.coin_type, policy.coin_type.slip44());
    println!("  Encoding:   {}", policy.scheme);
    println!("  Path:       {}", policy.scheme.derivation_path(policy.coin_type));
    println!(
        "  Entropy:    {} bits ({} words)",
        policy.strength.bits(),
        policy.strength.word_count()
    );

    session.close().await?;
    Ok(())
}

fn print_header(title: &str) {
    println!("\n{}", "=".repeat(70));
    println!("  {}", title.bold());
    println!("{}\n", "=".repeat(70));
}

fn print_keys(record: &WalletRecord) {
    println!("  Public Key:  {}", record.public_key);
    println!("  Private Key: {}", record.private_key.red());
}
