//! # Hash Subcommand
//!
//! Computes the content hash issuers record and verifiers present.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use edl_core::ContentHash;

/// Arguments for the `edl hash` subcommand.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Certificate document to fingerprint.
    pub path: PathBuf,
}

pub fn run_hash(args: &HashArgs) -> Result<u8> {
    println!("{}", hash_document(&args.path)?);
    Ok(0)
}

/// SHA-256 content hash of the file at `path`.
pub fn hash_document(path: &Path) -> Result<ContentHash> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(ContentHash::of_document(&bytes))
}

/// Resolve a hash given either literally or as a document to fingerprint.
pub fn resolve_hash(literal: Option<&str>, document: Option<&Path>) -> Result<ContentHash> {
    match (literal, document) {
        (Some(hash), None) => Ok(ContentHash::new(hash)?),
        (None, Some(path)) => hash_document(path),
        (Some(_), Some(_)) => bail!("give either --hash or --document, not both"),
        (None, None) => bail!("one of --hash or --document is required"),
    }
}
