use crate::crypto::{PrivateKey, PublicKey};
use crate::error::CliError;
use clap::Subcommand;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug, Clone)]
pub enum KeysCommands {
    /// Generate a new signing key pair
    Generate {
        /// Base name of the key files (writes NAME.pem and NAME_pub.pem)
        #[clap(long)]
        name: String,

        /// Directory to write into
        #[clap(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Print the public key of a private key file
    Inspect {
        #[clap(long)]
        key: PathBuf,
    },
}

pub fn handle_keys_command(cmd: KeysCommands) -> Result<(), CliError> {
    match cmd {
        KeysCommands::Generate { name, dir } => {
            let (private_path, public_path) = generate_key_files(&dir, &name)?;
            println!("Private key written to '{}'", private_path.display());
            println!("Public key written to '{}'", public_path.display());
            println!("Register it by sending `add-public-key` followed by the contents of the public key file.");
        }
        KeysCommands::Inspect { key } => {
            let public = load_private_key(&key)?.public_key();
            println!("Public Key: {}", public.to_hex());
            print!("{}", public.to_pem()?);
        }
    }
    Ok(())
}

/// Write a fresh key pair as `NAME.pem` and `NAME_pub.pem` under `dir`.
///
/// Existing files are never overwritten.
pub fn generate_key_files(dir: &Path, name: &str) -> Result<(PathBuf, PathBuf), CliError> {
    let private_path = dir.join(format!("{}.pem", name));
    let public_path = dir.join(format!("{}_pub.pem", name));
    for path in [&private_path, &public_path] {
        if path.exists() {
            return Err(CliError::FileExists(path.display().to_string()));
        }
    }

    let key = PrivateKey::generate();
    std::fs::write(&private_path, key.to_pem()?)?;
    std::fs::write(&public_path, key.public_key().to_pem()?)?;
    Ok((private_path, public_path))
}

pub fn load_private_key(path: &Path) -> Result<PrivateKey, CliError> {
    Ok(PrivateKey::from_pem(&std::fs::read_to_string(path)?)?)
}

pub fn load_public_key(path: &Path) -> Result<PublicKey, CliError> {
    Ok(PublicKey::from_pem(&std::fs::read_to_string(path)?)?)
}
