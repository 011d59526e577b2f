//! The `cachet verify` subcommand.
//!
//! Verifies each image's signatures against the configured trust policy
//! and renders the results as text or structured JSON.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::Args;
use color_eyre::eyre::{Result, bail};

use cachet_keys::PublicKey;
use cachet_verify::local::{LocalStore, OfflineLog};
use cachet_verify::{OutputFormat, PolicyConfig, VerificationError, Verifier, cert, render};

/// Arguments for `cachet verify`.
#[derive(Args)]
pub struct VerifyArgs {
    /// Image references to verify.
    #[arg(required = true, value_name = "IMAGE")]
    pub images: Vec<String>,

    /// Path to an armored public key to verify signatures against.
    #[arg(long, value_name = "PATH")]
    pub key: Option<PathBuf>,

    /// KMS key reference (requires an external key resolver).
    #[arg(long, value_name = "URI")]
    pub kms: Option<String>,

    /// Required annotation, KEY=VALUE (repeatable).
    #[arg(short = 'a', long = "annotations", value_name = "KEY=VALUE")]
    pub annotations: Vec<String>,

    /// Check that the payload digest matches the resolved image digest.
    #[arg(long, value_name = "BOOL", default_value_t = true, action = clap::ArgAction::Set)]
    pub check_claims: bool,

    /// Require a transparency log inclusion proof for each signature.
    #[arg(long)]
    pub check_tlog: bool,

    /// Transparency log snapshot (JSON array of entries).
    #[arg(long, value_name = "PATH")]
    pub tlog_entries: Option<PathBuf>,

    /// PEM bundle of trusted root certificates.
    #[arg(long, value_name = "PATH")]
    pub cert_roots: Option<PathBuf>,

    /// Path to the local signature store index.
    #[arg(long, value_name = "PATH")]
    pub store: PathBuf,

    /// Output format for verified signatures.
    #[arg(long, value_enum, default_value = "structured")]
    pub output: OutputArg,

    /// Write output to a file instead of stdout.
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,
}

/// Output format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputArg {
    /// JSON array of verified claim payloads.
    Structured,
    /// Common names and raw payloads.
    Text,
}

impl From<OutputArg> for OutputFormat {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Structured => Self::Structured,
            OutputArg::Text => Self::Text,
        }
    }
}

/// Execute the verify command.
pub fn execute(args: VerifyArgs) -> Result<()> {
    let config = build_config(&args)?;
    config.validate()?;
    if config.kms_key_ref.is_some() {
        bail!("KMS key references require an external key resolver; none is configured");
    }

    let registry = LocalStore::open(&args.store)?;
    let log = match &args.tlog_entries {
        Some(path) => OfflineLog::open(path)?,
        None => OfflineLog::empty(),
    };
    let verifier = Verifier::new(&registry, &log);

    let mut records = Vec::new();
    let mut failed = false;
    for image in &args.images {
        match verifier.verify(image, &config) {
            Ok(record) => records.push(record),
            Err(VerificationError::NoValidSignature { image, record }) => {
                tracing::warn!(image = %image, "no signature satisfied the policy");
                eprintln!("Error: no matching signatures for {image}");
                records.push(record);
                failed = true;
            }
            Err(e) => {
                eprintln!("Error: {e}");
                failed = true;
            }
        }
    }

    let format = OutputFormat::from(args.output);
    match &args.output_file {
        Some(path) => {
            let mut file = std::fs::File::create(path)?;
            render::render(&records, format, &mut file)?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            render::render(&records, format, &mut lock)?;
            lock.flush()?;
        }
    }

    if failed {
        process::exit(1);
    }
    Ok(())
}

fn build_config(args: &VerifyArgs) -> Result<PolicyConfig> {
    let public_key = match &args.key {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Some(PublicKey::from_armored(&text)?)
        }
        None => None,
    };

    let mut required_annotations = BTreeMap::new();
    for pair in &args.annotations {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("annotation `{pair}` is not KEY=VALUE");
        };
        required_annotations.insert(key.to_owned(), value.to_owned());
    }

    let trusted_roots = match &args.cert_roots {
        Some(path) => cert::load_pem_chain(&std::fs::read_to_string(path)?)?,
        None => Vec::new(),
    };

    Ok(PolicyConfig {
        required_annotations,
        check_claims: args.check_claims,
        check_tlog: args.check_tlog,
        public_key,
        kms_key_ref: args.kms.clone().filter(|r| !r.is_empty()),
        trusted_roots,
    })
}
