//! Terminal input
//!
//! Secrets are read with echo disabled and held in `Zeroizing` buffers.

use anyhow::{bail, Context, Result};
use localwallet_core::password::{self, PasswordError};
use localwallet_core::MasterPassword;
use std::io::{self, BufRead, Write};
use zeroize::Zeroizing;

/// Read one visible line, without the trailing newline
pub fn read_line(prompt: &str) -> Result<Zeroizing<String>> {
    print!("{}", prompt);
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = Zeroizing::new(String::new());
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    if read == 0 {
        bail!("Input closed");
    }
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(line)
}

/// Read one secret with terminal echo disabled
pub fn read_secret(prompt: &str) -> Result<Zeroizing<String>> {
    let secret = rpassword::prompt_password(prompt).context("Failed to read password")?;
    Ok(Zeroizing::new(secret))
}

/// `y`/`yes` (any case) is true, everything else false
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

pub fn ask_yes_no(question: &str) -> Result<bool> {
    let answer = read_line(&format!("{} (y/n): ", question))?;
    Ok(is_yes(&answer))
}

/// Ask for a secret twice; mismatch is returned to the caller
pub fn read_secret_twice(prompt: &str, confirm_prompt: &str) -> Result<Zeroizing<String>> {
    let entry = read_secret(prompt)?;
    let confirmation = read_secret(confirm_prompt)?;
    Ok(password::confirm(&entry, &confirmation)?)
}

/// Loop until a new master password is entered twice and long enough
pub fn new_master_password() -> Result<MasterPassword> {
    loop {
        let entry = read_secret_twice("Create a master password: ", "Confirm master password: ");
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.downcast_ref::<PasswordError>() == Some(&PasswordError::Mismatch) => {
                println!("Passwords do not match. Try again.");
                continue;
            }
            Err(e) => return Err(e),
        };

        match password::check_master_password(&entry) {
            Ok(warnings) => {
                for warning in warnings {
                    println!("Warning: {}", warning);
                }
                return Ok(MasterPassword::new(entry.as_str()));
            }
            Err(e) => println!("{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes("YES"));
        assert!(is_yes(" yes "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }
}
