//! One handler per subcommand
//!
//! Each handler unlocks the vault itself, so a process touches the vault
//! file for exactly one operation.

use anyhow::{anyhow, bail, Context, Result};
use localwallet_core::mnemonic;
use localwallet_core::{
    KdfParams, MasterPassword, Session, SessionError, StoreError, VaultError, VaultFile,
};
use zeroize::Zeroizing;

use crate::args::{Command, DeleteTarget};
use crate::prompt;
use crate::render;

/// Shown for every wrong-password or damaged-file outcome
pub const UNLOCK_FAILED: &str = "Wrong master password or corrupted vault file.";

/// Resolved settings shared by all commands
#[derive(Debug, Clone)]
pub struct Settings {
    pub file: VaultFile,
    pub kdf: KdfParams,
}

pub fn run(ctx: &Settings, command: Command) -> Result<()> {
    match command {
        Command::Init => init(ctx),
        Command::Create { name, passphrase } => create(ctx, &name, passphrase),
        Command::Import { name, passphrase } => import(ctx, &name, passphrase),
        Command::List => list(ctx),
        Command::Delete(target) => delete(ctx, target),
        Command::Export(position) => export(ctx, position),
        Command::Passwd => passwd(ctx),
    }
}

/// User-facing text for a failed unlock
pub fn describe_unlock_error(error: &SessionError) -> String {
    match error {
        SessionError::Vault(VaultError::NotFound(path)) => format!(
            "No vault found at {}. Run `localwallet init` to create one.",
            path.display()
        ),
        SessionError::Vault(VaultError::UnsupportedVersion(version)) => format!(
            "Vault format version {} is newer than this build supports.",
            version
        ),
        SessionError::Vault(VaultError::Auth | VaultError::CorruptContainer(_)) => {
            UNLOCK_FAILED.to_string()
        }
        other => other.to_string(),
    }
}

fn unlock(ctx: &Settings) -> Result<Session> {
    if !ctx.file.exists() {
        bail!(describe_unlock_error(&SessionError::Vault(
            VaultError::NotFound(ctx.file.path().to_path_buf())
        )));
    }
    let password = prompt::read_secret("Enter your master password: ")?;
    Session::unlock(
        ctx.file.clone(),
        MasterPassword::new(password.as_str()),
        ctx.kdf,
    )
    .map_err(|e| anyhow!(describe_unlock_error(&e)))
}

fn wallet_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Wallet name must not be empty");
    }
    Ok(name)
}

/// Optional BIP-39 passphrase; `None` means the entries did not match
fn ask_passphrase(requested: bool) -> Result<Option<Zeroizing<String>>> {
    if !requested && !prompt::ask_yes_no("Add a BIP39 passphrase?")? {
        return Ok(Some(Zeroizing::new(String::new())));
    }
    match prompt::read_secret_twice("Passphrase: ", "Confirm passphrase: ") {
        Ok(passphrase) => Ok(Some(passphrase)),
        Err(e) if e.downcast_ref::<localwallet_core::PasswordError>().is_some() => Ok(None),
        Err(e) => Err(e),
    }
}

fn init(ctx: &Settings) -> Result<()> {
    if ctx.file.exists() {
        bail!("A vault already exists at {}", ctx.file.path().display());
    }
    println!("First use detected. Set a master password.");
    let password = prompt::new_master_password()?;
    Session::create(ctx.file.clone(), password, ctx.kdf)
        .with_context(|| format!("Failed to create vault at {}", ctx.file.path().display()))?;
    println!("Vault created successfully!");
    Ok(())
}

fn create(ctx: &Settings, name: &str, passphrase: bool) -> Result<()> {
    let name = wallet_name(name)?;
    let mut session = unlock(ctx)?;

    let words = Zeroizing::new(mnemonic::generate()?.to_string());
    println!("\nWrite down your mnemonic (keep it offline and secure):");
    println!("{}\n", words.as_str());

    let Some(passphrase) = ask_passphrase(passphrase)? else {
        bail!("Passphrases do not match. Cancelling creation.");
    };

    let address = session
        .update(|store| store.add(name, &words, &passphrase))
        .context("Failed to save wallet")?;
    println!("\nWallet created!\n{}: {}", name, address);
    Ok(())
}

fn import(ctx: &Settings, name: &str, passphrase: bool) -> Result<()> {
    let name = wallet_name(name)?;
    let mut session = unlock(ctx)?;

    let words = prompt::read_line("Enter the 12 or 24 words: ")?;
    mnemonic::validate(&words)?;

    let Some(passphrase) = ask_passphrase(passphrase)? else {
        bail!("Passphrases do not match. Cancelling import.");
    };

    let address = session
        .update(|store| store.add(name, &words, &passphrase))
        .context("Failed to save wallet")?;
    println!("\nWallet imported!\n{}: {}", name, address);
    Ok(())
}

fn list(ctx: &Settings) -> Result<()> {
    let session = unlock(ctx)?;
    let wallets = session.store().list();
    if wallets.is_empty() {
        println!("No wallets found.");
        return Ok(());
    }
    for wallet in wallets {
        println!("[{}] {}  {}", wallet.position, wallet.name, wallet.address);
    }
    Ok(())
}

fn delete(ctx: &Settings, target: DeleteTarget) -> Result<()> {
    let mut session = unlock(ctx)?;
    if session.store().is_empty() {
        println!("No wallets found.");
        return Ok(());
    }

    match target {
        DeleteTarget::All => {
            if !prompt::ask_yes_no("Are you sure you want to delete ALL wallets?")? {
                println!("Action canceled.");
                return Ok(());
            }
            session.update(|store| Ok(store.clear()))?;
            println!("All wallets removed.");
        }
        DeleteTarget::Positions(positions) => {
            match session.update(|store| store.remove(&positions)) {
                Ok(removed) => println!("{} wallet(s) removed.", removed),
                Err(SessionError::Store(e @ StoreError::PositionOutOfRange { .. })) => {
                    bail!("{}. No wallet removed.", e)
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(())
}

fn export(ctx: &Settings, position: usize) -> Result<()> {
    let session = unlock(ctx)?;
    let record = session.store().get(position)?;
    let exported = session.store().export_private_key(position)?;

    println!("\nPrivate WIF key of wallet '{}':\n", record.name);
    println!("{}", render::qr_unicode(&exported.private_key_wif)?.as_str());
    println!("\nWarning: whoever has access to this key controls your funds!");
    Ok(())
}

fn passwd(ctx: &Settings) -> Result<()> {
    let mut session = unlock(ctx)?;
    let password = prompt::new_master_password()?;
    session
        .change_password(password)
        .context("Failed to re-encrypt vault")?;
    println!("Master password changed.");
    Ok(())
}
