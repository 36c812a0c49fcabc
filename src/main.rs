use anyhow::Result;
use clap::{Parser, Subcommand};
mod auth;
use fieldseal::{
    FieldCipher, MasterSecret, ScryptParams, SecretFile, default_secret_file, hash_pin, verify_pin,
};
use std::path::PathBuf;

#[derive(Debug, clap::Args)]
struct ScryptArgs {
    /// scrypt cost exponent, N = 2^log_n (default: 14)
    #[arg(long = "scrypt-log-n")]
    log_n: Option<u8>,

    /// scrypt block size (default: 8)
    #[arg(long = "scrypt-r")]
    r: Option<u32>,

    /// scrypt parallelism (default: 1)
    #[arg(long = "scrypt-p")]
    p: Option<u32>,
}

impl ScryptArgs {
    fn to_kdf_params(&self) -> anyhow::Result<ScryptParams> {
        let default = ScryptParams::default();

        ScryptParams::new(
            self.log_n.unwrap_or(default.log_n()),
            self.r.unwrap_or(default.r()),
            self.p.unwrap_or(default.p()),
        )
    }
}

fn resolve_secret_file(path: Option<PathBuf>) -> Result<SecretFile> {
    match path {
        Some(p) => Ok(SecretFile::new(p)),
        None => default_secret_file(),
    }
}

/// The secret comes from `FIELDSEAL_SECRET` (hex) when set, otherwise from
/// the secret file, generating one on first use.
fn resolve_secret(path: Option<PathBuf>) -> Result<MasterSecret> {
    if let Ok(encoded) = std::env::var("FIELDSEAL_SECRET") {
        if !encoded.is_empty() {
            return MasterSecret::from_hex(&encoded);
        }
    }

    resolve_secret_file(path)?.load_or_generate()
}

#[derive(Debug, Parser)]
#[command(name = "fieldseal")]
#[command(
    version,
    about = "Field-level encryption and PIN hashing for data at rest."
)]
struct Cli {
    ///Path to the master secret file
    #[arg(long, global = true, value_name = "PATH", env = "FIELDSEAL_SECRET_FILE")]
    secret_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generates and persists a master secret
    Keygen,

    /// Encrypts a value into its hex storage record
    #[command(arg_required_else_help = true)]
    Encrypt {
        plaintext: String,

        #[command(flatten)]
        scrypt: ScryptArgs,
    },

    /// Decrypts a hex storage record
    #[command(arg_required_else_help = true)]
    Decrypt {
        record: String,

        #[command(flatten)]
        scrypt: ScryptArgs,
    },

    /// Hashes a PIN into a storable verifier
    HashPin,

    /// Checks a PIN against a stored verifier
    #[command(arg_required_else_help = true)]
    VerifyPin { verifier: String },
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    match args.command {
        Commands::Keygen => {
            let file = resolve_secret_file(args.secret_file.clone())?;
            if file.exists() {
                return Err(anyhow::anyhow!(
                    "secret file already exists: {}",
                    file.path().display()
                ));
            }
            file.save(&MasterSecret::generate()?)?;
            println!("master secret written to {}", file.path().display());
        }
        Commands::Encrypt { plaintext, scrypt } => {
            let secret = resolve_secret(args.secret_file.clone())?;
            let cipher = FieldCipher::with_kdf(secret, scrypt.to_kdf_params()?);
            // empty plaintext encrypts to nothing; print nothing
            if let Some(record) = cipher.encrypt(&plaintext)? {
                println!("{record}");
            }
        }
        Commands::Decrypt { record, scrypt } => {
            let secret = resolve_secret(args.secret_file.clone())?;
            let cipher = FieldCipher::with_kdf(secret, scrypt.to_kdf_params()?);
            let plaintext = cipher.decrypt(&record)?;
            println!("{plaintext}");
        }
        Commands::HashPin => {
            let pin = auth::read_new_pin_with_confirmation()?;
            println!("{}", hash_pin(&pin)?);
        }
        Commands::VerifyPin { verifier } => {
            let pin = auth::read_pin()?;
            if verify_pin(&pin, &verifier) {
                println!("match");
            } else {
                println!("no match");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
