//! Reference-side state for one analysis run.
//!
//! - [`ReferenceRegistry`]: validated sequins merged from a mixture table and
//!   a coordinate annotation
//! - [`IntervalIndex`]: per-chromosome containment/overlap queries over the
//!   registry loci
//! - [`VariantStore`]: catalogued (or observed) variants partitioned by
//!   mutation class
//! - [`ReferenceContext`]: all of the above plus the region space, built once
//!   per run and passed by reference to the classifier
//!
//! ## Example
//!
//! ```rust
//! use sequin_qc::catalog::registry::{AnnotationRecord, RegistryBuilder};
//! use sequin_qc::catalog::store::VariantStore;
//! use sequin_qc::catalog::ReferenceContext;
//! use sequin_qc::core::locus::Locus;
//! use sequin_qc::core::types::{Mixture, Region, SequinKind};
//! use sequin_qc::core::variant::Variant;
//!
//! let mut builder = RegistryBuilder::new(SequinKind::Variant);
//! builder.add("D_1_1_R", 1000, 10.0, Mixture::MixA);
//! builder.add("D_1_1_V", 1000, 10.0, Mixture::MixA);
//! builder.add_annotation(AnnotationRecord {
//!     id: "D_1_1".into(),
//!     chrom: "chrev1".to_string(),
//!     locus: Locus::new(1, 1000),
//! });
//! let registry = builder.build().unwrap();
//!
//! let catalogue: VariantStore = vec![Variant::new("chrev1", 500, "A", "G").with_id("D_1_1")]
//!     .into_iter()
//!     .collect();
//!
//! let context = ReferenceContext::new(registry, catalogue, vec!["chrev".to_string()]);
//! assert_eq!(context.region("chrev1"), Region::Synthetic);
//! assert_eq!(context.region("chrUn"), Region::Untracked);
//! ```

pub mod index;
pub mod registry;
pub mod store;

use std::collections::BTreeSet;

use crate::core::sequin::SequinData;
use crate::core::types::Region;
use crate::core::variant::Variant;
use registry::ReferenceRegistry;
use store::VariantStore;

/// Explicit per-run reference context: registry, catalogue and region space
#[derive(Debug, Clone)]
pub struct ReferenceContext {
    pub registry: ReferenceRegistry,

    /// Catalogued reference variants
    pub catalogue: VariantStore,

    synthetic_prefixes: Vec<String>,

    /// Recognized background chromosomes
    genomic: BTreeSet<String>,
}

impl ReferenceContext {
    pub fn new(
        registry: ReferenceRegistry,
        catalogue: VariantStore,
        synthetic_prefixes: Vec<String>,
    ) -> Self {
        let is_synthetic =
            |chrom: &str| synthetic_prefixes.iter().any(|p| chrom.starts_with(p.as_str()));

        let genomic = registry
            .index()
            .chromosomes()
            .chain(catalogue.chromosomes())
            .filter(|chrom| !is_synthetic(*chrom))
            .map(str::to_string)
            .collect();

        Self {
            registry,
            catalogue,
            synthetic_prefixes,
            genomic,
        }
    }

    pub fn is_synthetic(&self, chrom: &str) -> bool {
        self.synthetic_prefixes
            .iter()
            .any(|p| chrom.starts_with(p.as_str()))
    }

    pub fn is_genomic(&self, chrom: &str) -> bool {
        self.genomic.contains(chrom)
    }

    /// Which part of the genome a chromosome belongs to
    pub fn region(&self, chrom: &str) -> Region {
        if self.is_synthetic(chrom) {
            Region::Synthetic
        } else if self.is_genomic(chrom) {
            Region::Genomic
        } else {
            Region::Untracked
        }
    }

    /// The validated sequin a variant belongs to: by id, else the one sequin
    /// whose region contains it
    pub fn sequin_of(&self, variant: &Variant) -> Option<&SequinData> {
        self.registry
            .lookup_by_id(&variant.id)
            .or_else(|| self.registry.lookup_containing(&variant.chrom, &variant.locus))
    }

    pub fn genomic_chromosomes(&self) -> impl Iterator<Item = &str> {
        self.genomic.iter().map(String::as_str)
    }

    pub fn synthetic_prefixes(&self) -> &[String] {
        &self.synthetic_prefixes
    }
}
