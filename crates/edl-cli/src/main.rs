//! # edl CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use edl_cli::certificate::{run_certificate, CertificateArgs};
use edl_cli::consent::{run_consent, ConsentArgs};
use edl_cli::hash::{run_hash, HashArgs};
use edl_cli::Session;
use edl_contract::{CallerIdentity, ContractConfig};

/// edu-ledger CLI
///
/// Issues, verifies and revokes academic certificates and manages the
/// consents under which verifiers see them, against a local ledger file.
#[derive(Parser, Debug)]
#[command(name = "edl", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Ledger snapshot file.
    #[arg(long, global = true, env = "EDL_LEDGER", default_value = "edl-ledger.json")]
    ledger: PathBuf,

    /// Caller membership organization.
    #[arg(long, global = true, env = "EDL_ORG", default_value = "")]
    org: String,

    /// Caller principal (DID or certificate subject).
    #[arg(long, global = true, env = "EDL_PRINCIPAL", default_value = "")]
    principal: String,

    /// Organization allowed to issue and revoke certificates.
    #[arg(long, global = true, env = "EDL_ISSUER_ORG", default_value = edl_contract::config::DEFAULT_ISSUER_ORG)]
    issuer_org: String,

    /// Require consent grants and revocations to come from the subject.
    #[arg(long, global = true, env = "EDL_ENFORCE_SUBJECT_IDENTITY")]
    enforce_subject_identity: bool,

    /// Longest consent a subject may grant, in days.
    #[arg(long, global = true, env = "EDL_MAX_CONSENT_DAYS", default_value_t = edl_contract::config::DEFAULT_MAX_CONSENT_DAYS)]
    max_consent_days: i64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Content hash of a certificate document.
    Hash(HashArgs),

    /// Certificate issuance, verification, revocation and history.
    #[command(alias = "cert")]
    Certificate(CertificateArgs),

    /// Consent grant, access, disclosure, revocation and history.
    Consent(ConsentArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let session = Session::new(
        cli.ledger,
        CallerIdentity::new(cli.org, cli.principal),
        ContractConfig {
            issuer_org: cli.issuer_org,
            enforce_subject_identity: cli.enforce_subject_identity,
            max_consent_days: cli.max_consent_days,
        },
    );
    tracing::debug!(ledger = %session.ledger_path.display(), "edl CLI starting");

    let result = match &cli.command {
        Commands::Hash(args) => run_hash(args),
        Commands::Certificate(args) => run_certificate(args, &session),
        Commands::Consent(args) => run_consent(args, &session),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
