//! Cachet CLI — container image signature verification.
//!
//! Generate password-protected signing keys and verify image signatures
//! against a trust policy.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

/// Cachet — container image signature verification.
///
/// Generate password-protected signing keys and verify image signatures
/// against a trust policy.
#[derive(Parser)]
#[command(name = "cachet", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (repeat for more detail: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output logs as JSON (for machine consumption).
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Generate an encrypted signing key pair.
    GenerateKeyPair(commands::generate_key_pair::GenerateKeyPairArgs),
    /// Verify the signatures of one or more container images.
    Verify(commands::verify::VerifyArgs),
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::GenerateKeyPair(args) => commands::generate_key_pair::execute(&args),
        Commands::Verify(args) => commands::verify::execute(args),
    }
}
