//! Command-line interface for sequin-qc.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **discover**: Classify called variants against the sequin reference
//! - **reference**: Show the validated sequin registry
//!
//! ## Usage
//!
//! ```text
//! # Evaluate a VCF of called variants
//! sequin-qc discover calls.vcf --annotation sequins.bed --reference sequins.vcf --mixture mixture.tsv
//!
//! # Also write the per-sequin and per-call tables
//! sequin-qc discover calls.vcf --annotation sequins.bed --reference sequins.vcf \
//!     --sequins sequins.tsv --detected detected.tsv
//!
//! # JSON summary for scripting
//! sequin-qc discover calls.vcf --annotation sequins.bed --reference sequins.vcf --format json
//!
//! # Inspect the merged reference
//! sequin-qc reference --annotation sequins.bed --mixture mixture.tsv
//! ```

use clap::{Parser, Subcommand};

use crate::core::types::Mixture;

pub mod discover;
pub mod reference;

#[derive(Parser)]
#[command(name = "sequin-qc")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Evaluate variant calls against sequin spike-in controls")]
#[command(
    long_about = "sequin-qc reconciles the variants called on a sequin-spiked sample against the sequin reference.\n\nIt merges the sequin mixture and annotation into a validated registry and reports:\n- True/false positives and false negatives per mutation class\n- Sensitivity, precision, F1 and FDR\n- The limit of detection and a log2 regression of observed on expected allele frequency"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify called variants against the sequin reference
    Discover(discover::DiscoverArgs),

    /// Show the validated sequin registry
    Reference(reference::ReferenceArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Parse a mixture name given on the command line (`A`, `MixA`, `Mix A`)
pub(crate) fn parse_mixture(s: &str) -> Result<Mixture, String> {
    Mixture::parse(s).ok_or_else(|| format!("Unknown mixture '{s}' (expected A, B, F or G)"))
}
