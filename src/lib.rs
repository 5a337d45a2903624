//! # sequin-qc
//!
//! A library for evaluating variant calls against sequin spike-in controls.
//!
//! Sequins are synthetic DNA standards spiked into a sample at known
//! concentrations. Because their sequence, coordinates and mixture are known,
//! the variants called on them can be scored exactly: every catalogued sequin
//! variant is either detected (true positive) or missed (false negative), and
//! every other call on the sequin chromosomes is a false positive.
//!
//! `sequin-qc` merges the sequin mixture and annotation into a validated
//! registry, streams the called variants through a classifier and reports:
//!
//! - **Confusion counts**: TP/FP/FN per chromosome and mutation class
//! - **Accuracy**: sensitivity, precision, F1 and FDR
//! - **Limit of detection**: the lowest expected allele frequency detected
//! - **Quantification**: log2 regression of observed on expected allele frequency
//!
//! ## Example
//!
//! ```rust,no_run
//! use sequin_qc::{AnalysisConfig, Classifier, DiscoverySummary, ReferenceContext, RegistryBuilder};
//! use sequin_qc::parsing::{bed, mixture, vcf};
//! use sequin_qc::{SequinKind, VariantStore};
//! use std::path::Path;
//!
//! let mut builder = RegistryBuilder::new(SequinKind::Variant);
//! for record in mixture::parse_mixture_file(Path::new("mixture.tsv")).unwrap() {
//!     builder.add_mixture_record(record);
//! }
//! for record in bed::parse_bed_file(Path::new("sequins.bed")).unwrap() {
//!     builder.add_annotation(record);
//! }
//! let registry = builder.build().unwrap();
//!
//! let catalogue: VariantStore = vcf::read_vcf_file(Path::new("sequins.vcf"))
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! let context = ReferenceContext::new(registry, catalogue, vec!["chrev".to_string()]);
//!
//! let mut classifier = Classifier::new(&context, AnalysisConfig::default());
//! classifier.run(vcf::read_vcf_file(Path::new("calls.vcf")).unwrap()).unwrap();
//! let stats = classifier.finish();
//!
//! let summary = DiscoverySummary::new(&stats, &context);
//! println!("{}", summary.to_json().unwrap());
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Reference registry, interval index and variant store
//! - [`core`]: Core data types for sequins, loci and variants
//! - [`matching`]: Classifier, confusion statistics, regression and reports
//! - [`parsing`]: Parsers for mixture tables, BED, VCF and tabular calls
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod core;
pub mod matching;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::index::IntervalIndex;
pub use catalog::registry::{ReferenceRegistry, RegistryBuilder};
pub use catalog::store::VariantStore;
pub use catalog::ReferenceContext;
pub use core::types::*;
pub use matching::engine::{AnalysisConfig, Classifier};
pub use matching::summary::DiscoverySummary;
