//! The `cachet generate-key-pair` subcommand.
//!
//! Generates an Ed25519 key pair and writes the password-protected
//! private half next to the plain public half.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::Result;
use zeroize::Zeroizing;

use cachet_keys::KeyError;

/// Environment variable consulted before prompting for a password.
const PASSWORD_ENV: &str = "CACHET_PASSWORD";

/// Arguments for `cachet generate-key-pair`.
#[derive(Args)]
pub struct GenerateKeyPairArgs {
    /// File name prefix for the generated key pair.
    #[arg(long, value_name = "PREFIX", default_value = "cachet")]
    pub output_key_prefix: PathBuf,
}

/// Execute the generate-key-pair command.
pub fn execute(args: &GenerateKeyPairArgs) -> Result<()> {
    let keys = cachet_keys::generate(prompt_password)?;

    let key_path = args.output_key_prefix.with_extension("key");
    let pub_path = args.output_key_prefix.with_extension("pub");

    write_private(&key_path, &keys.private_bytes)?;
    std::fs::write(&pub_path, &keys.public_bytes)?;

    println!("Private key written to {}", key_path.display());
    println!("Public key written to {}", pub_path.display());
    Ok(())
}

/// Obtain the encryption password, preferring the environment so the
/// command can run unattended. Interactive entry asks twice when
/// `confirm` is set and requires both entries to match.
fn prompt_password(confirm: bool) -> Result<Zeroizing<Vec<u8>>, KeyError> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(Zeroizing::new(password.into_bytes()));
    }

    let first = read_password("Enter password for private key: ")?;
    if confirm {
        let second = read_password("Enter password for private key again: ")?;
        if first != second {
            return Err(KeyError::Prompt("passwords do not match".to_owned()));
        }
    }
    Ok(first)
}

fn read_password(prompt: &str) -> Result<Zeroizing<Vec<u8>>, KeyError> {
    let mut stderr = std::io::stderr();
    stderr
        .write_all(prompt.as_bytes())
        .and_then(|()| stderr.flush())
        .map_err(|e| KeyError::Prompt(e.to_string()))?;

    let mut line = Zeroizing::new(String::new());
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| KeyError::Prompt(e.to_string()))?;
    let trimmed = line.trim_end_matches(['\r', '\n']);
    Ok(Zeroizing::new(trimmed.as_bytes().to_vec()))
}

/// Write the encrypted private key with owner-only permissions.
fn write_private(path: &std::path::Path, bytes: &[u8]) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        file.write_all(bytes)
    }
    #[cfg(not(unix))]
    {
        std::fs::write(path, bytes)
    }
}
