//! Core data types for sequin quality control.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`Locus`]: A closed coordinate interval on a chromosome
//! - [`SequinData`]: A validated sequin merged from mixture and annotation
//! - [`Variant`]: A normalized observed or catalogued variant record
//! - [`VariantKey`], [`VariantMatch`]: Identity and match outcome for variants
//! - [`SequinId`], [`Mixture`], [`MutationClass`], [`SequinKind`]: Metadata types
//!
//! ## Coordinates
//!
//! All loci are 1-based and closed on both ends, the way VCF positions are
//! written. Parsers for 0-based formats (BED) convert on the way in.
//!
//! [`Locus`]: locus::Locus
//! [`SequinData`]: sequin::SequinData
//! [`Variant`]: variant::Variant
//! [`VariantKey`]: variant::VariantKey
//! [`VariantMatch`]: variant::VariantMatch
//! [`SequinId`]: types::SequinId
//! [`Mixture`]: types::Mixture
//! [`MutationClass`]: types::MutationClass
//! [`SequinKind`]: types::SequinKind

pub mod locus;
pub mod sequin;
pub mod types;
pub mod variant;
