use serde::{Deserialize, Serialize};

use crate::core::locus::{Base, Locus};
use crate::core::types::{MutationClass, SequinId};
use crate::utils::validation::compute_variant_key;

/// Placeholder id for variants without a sequin or region name
pub const MISSING_ID: &str = ".";

/// Stable identity of a catalogued variant across independent runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantKey(pub u64);

impl VariantKey {
    #[must_use]
    pub fn new(id: &str, class: MutationClass, start: Base) -> Self {
        Self(compute_variant_key(id, class, start))
    }
}

impl std::fmt::Display for VariantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A normalized variant record, observed or catalogued.
///
/// Parsers for VCF and caller-specific formats produce this shape; nothing
/// downstream looks at raw text. Quality and p-value fields are NaN when the
/// caller did not report them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub chrom: String,

    /// Sequin or region id (VCF ID column), `.` when absent
    pub id: String,

    pub locus: Locus,

    #[serde(rename = "ref")]
    pub reference: String,

    #[serde(rename = "alt")]
    pub alternate: String,

    pub class: MutationClass,

    pub read_depth_ref: u64,
    pub read_depth_alt: u64,

    pub quality: f64,
    pub quality_ref: f64,
    pub quality_alt: f64,
    pub p_value: f64,
}

impl Variant {
    /// Create a variant at a 1-based position; the mutation class is derived
    /// from the alleles and the locus spans the reference allele.
    pub fn new(
        chrom: impl Into<String>,
        position: Base,
        reference: impl Into<String>,
        alternate: impl Into<String>,
    ) -> Self {
        let reference = reference.into();
        let alternate = alternate.into();
        let span = (reference.len() as Base).max(1);

        Self {
            chrom: chrom.into(),
            id: MISSING_ID.to_string(),
            locus: Locus::new(position, position + span - 1),
            class: MutationClass::from_alleles(&reference, &alternate),
            reference,
            alternate,
            read_depth_ref: 0,
            read_depth_alt: 0,
            quality: f64::NAN,
            quality_ref: f64::NAN,
            quality_alt: f64::NAN,
            p_value: f64::NAN,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_depths(mut self, reference: u64, alternate: u64) -> Self {
        self.read_depth_ref = reference;
        self.read_depth_alt = alternate;
        self
    }

    /// Stable identity key (sequin id, class, start)
    pub fn key(&self) -> VariantKey {
        VariantKey::new(&self.id, self.class, self.locus.start)
    }

    /// Total read depth at the site
    pub fn depth(&self) -> u64 {
        self.read_depth_ref + self.read_depth_alt
    }

    /// Observed allele frequency `alt / (ref + alt)`, NaN without coverage
    pub fn allele_frequency(&self) -> f64 {
        let depth = self.depth();
        if depth == 0 {
            return f64::NAN;
        }
        #[allow(clippy::cast_precision_loss)]
        let frequency = self.read_depth_alt as f64 / depth as f64;
        frequency
    }

    /// Id used for reporting: `{id}_{start}_{class}`
    pub fn display_id(&self) -> String {
        format!("{}_{}_{}", self.id, self.locus.start, self.class)
    }
}

/// The outcome of resolving one query record against the catalogue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantMatch {
    pub query: Variant,

    /// Catalogued variant at the same position, if any
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub matched: Option<Variant>,

    pub ref_alleles_agree: bool,
    pub alt_alleles_agree: bool,

    /// Reference region an unmatched record falls into, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<SequinId>,
}

impl VariantMatch {
    /// Compare a query with the catalogued variant found at its position
    pub fn new(query: Variant, matched: Option<&Variant>) -> Self {
        let (ref_alleles_agree, alt_alleles_agree) = matched.map_or((false, false), |m| {
            (m.reference == query.reference, m.alternate == query.alternate)
        });

        Self {
            query,
            matched: matched.cloned(),
            ref_alleles_agree,
            alt_alleles_agree,
            region: None,
        }
    }

    /// Position and both alleles agree with a catalogued variant
    pub fn is_accepted(&self) -> bool {
        self.matched.is_some() && self.ref_alleles_agree && self.alt_alleles_agree
    }
}
