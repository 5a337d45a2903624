//! Classification of called variants and the statistics derived from it.
//!
//! - [`Classifier`]: streams query records against a [`ReferenceContext`]
//! - [`Confusion`]: tp/fp/fn/nr counts with sensitivity, precision, F1 and FDR
//! - [`LinearAccumulator`]: log2 regression of observed on expected allele frequency
//! - [`DiscoverySummary`]: the aggregate payload for report writers
//!
//! ## Classification
//!
//! Every record goes through the same steps:
//!
//! 1. **Region**: synthetic, genomic, or untracked (dropped, only counted)
//! 2. **Position**: look up the catalogue at the record's start
//! 3. **Alleles**: a position match is accepted only if REF and ALT both agree
//! 4. **Bookkeeping**: accepted matches feed the true positives, the regression
//!    and the detection limit; everything else is a false positive, attributed
//!    to the overlapping sequin when there is one
//!
//! False negatives are derived once the stream ends: `fn = nr - tp` per
//! chromosome and mutation class.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sequin_qc::catalog::ReferenceContext;
//! use sequin_qc::matching::engine::{AnalysisConfig, Classifier};
//! use sequin_qc::matching::summary::DiscoverySummary;
//! use sequin_qc::parsing::vcf::read_vcf_file;
//! use std::path::Path;
//!
//! # fn context() -> ReferenceContext { unimplemented!() }
//! let context = context();
//! let mut classifier = Classifier::new(&context, AnalysisConfig::default());
//! classifier.run(read_vcf_file(Path::new("calls.vcf")).unwrap()).unwrap();
//!
//! let stats = classifier.finish();
//! let summary = DiscoverySummary::new(&stats, &context);
//! println!("Sensitivity: {:.4}", summary.synthetic.total.metrics.sensitivity);
//! ```
//!
//! [`Classifier`]: engine::Classifier
//! [`ReferenceContext`]: crate::catalog::ReferenceContext
//! [`Confusion`]: scoring::Confusion
//! [`LinearAccumulator`]: regression::LinearAccumulator
//! [`DiscoverySummary`]: summary::DiscoverySummary

pub mod detection;
pub mod engine;
pub mod regression;
pub mod scoring;
pub mod summary;
