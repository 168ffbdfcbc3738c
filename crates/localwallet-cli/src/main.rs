//! localwallet - offline BIP-39 wallet vault for the terminal
//!
//! Every command is one vault operation: unlock, act, save, exit.
//!
//! # Usage
//!
//! ```bash
//! localwallet init
//! localwallet create savings --passphrase
//! localwallet list
//! localwallet export 1
//! ```

mod args;
mod commands;
mod config;
mod prompt;
mod render;

use anyhow::{Context, Result};
use args::Invocation;
use config::LocalWalletConfig;

fn main() {
    if let Err(e) = run() {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let (command, config_path, vault_path) = match args::parse(&argv)? {
        Invocation::Help => {
            print_help();
            return Ok(());
        }
        Invocation::Version => {
            println!("localwallet {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Invocation::Run {
            command,
            config_path,
            vault_path,
        } => (command, config_path, vault_path),
    };

    // Load config
    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let mut config = LocalWalletConfig::load(config_path.as_deref(), &cwd)
        .context("Failed to load configuration")?;
    config.apply_overrides(vault_path);
    config
        .validate()
        .context("Configuration validation failed")?;

    // Init logger
    env_logger::Builder::new()
        .parse_filters(&config.log.level)
        .init();
    for warning in config.warnings() {
        log::warn!("{}", warning);
    }

    // Keep decrypted mnemonics out of core files
    localwallet_core::hardening::disable_core_dumps();

    let settings = commands::Settings {
        file: localwallet_core::VaultFile::new(&config.vault.path),
        kdf: config.kdf_params(),
    };
    log::debug!("Using vault {}", settings.file.path().display());

    commands::run(&settings, command)
}

fn print_help() {
    println!(
        r#"localwallet - offline BIP-39 wallet vault

USAGE:
    localwallet [OPTIONS] <COMMAND>

COMMANDS:
    init                          Create a new vault and set the master password
    create <name> [--passphrase]  Generate a 12-word wallet
    import <name> [--passphrase]  Import an existing 12 or 24-word mnemonic
    list                          List wallets with their receive addresses
    delete <1,3,...|all>          Delete wallets by position
    export <position>             Show the private key (WIF) as a QR code
    passwd                        Change the master password

OPTIONS:
    -c, --config <PATH>   Config file (default: ./localwallet.toml if present)
    --vault <PATH>        Vault file (default: ./local_wallet)
    --passphrase          Set a BIP-39 passphrase without asking first
    -h, --help            Show this help message
    -V, --version         Show version

EXAMPLES:
    # First run
    localwallet init

    # Vault on a removable drive
    localwallet --vault /media/usb/local_wallet list
"#
    );
}
