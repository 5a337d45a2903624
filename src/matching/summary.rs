use serde::Serialize;

use crate::catalog::ReferenceContext;
use crate::core::types::Region;
use crate::matching::engine::{Counters, DiscoveryStats};
use crate::matching::regression::{DetectionLimit, LinearFit};
use crate::matching::scoring::{ClassConfusion, Confusion, Metrics};

/// Which report layout a registry calls for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Design {
    /// Heterozygous/homozygous sequins only (allele frequencies 0.5 and 1.0)
    Germline,
    /// A dilution series of allele frequencies
    Somatic,
}

/// Column an external ROC plot should score variants by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RocScore {
    PValue,
    Depth,
}

impl RocScore {
    /// Prefer p-values unless fewer records report one than report coverage
    pub fn choose(counters: &Counters) -> Self {
        if counters.with_p_value >= counters.with_depth {
            Self::PValue
        } else {
            Self::Depth
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VariantCounts {
    pub snps: usize,
    pub indels: usize,
    pub total: usize,
}

impl VariantCounts {
    pub fn new(snps: usize, indels: usize) -> Self {
        Self {
            snps,
            indels,
            total: snps + indels,
        }
    }
}

/// Confusion counts with their derived ratios
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Accuracy {
    #[serde(flatten)]
    pub confusion: Confusion,
    #[serde(flatten)]
    pub metrics: Metrics,
}

impl From<Confusion> for Accuracy {
    fn from(confusion: Confusion) -> Self {
        Self {
            confusion,
            metrics: confusion.metrics(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassAccuracy {
    pub total: Accuracy,
    pub snp: Accuracy,
    pub indel: Accuracy,
}

impl From<ClassConfusion> for ClassAccuracy {
    fn from(c: ClassConfusion) -> Self {
        Self {
            total: c.total.into(),
            snp: c.snp.into(),
            indel: c.indel.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionSummary {
    pub total: LinearFit,
    pub snp: LinearFit,
    pub indel: LinearFit,
}

/// Files an analysis was run on, for the report header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sources {
    pub reference: Option<String>,
    pub annotation: Option<String>,
    pub mixture: Option<String>,
    pub query: Option<String>,
}

/// Fixed-shape payload handed to report and plot writers
#[derive(Debug, Clone, Serialize)]
pub struct DiscoverySummary {
    pub version: String,
    pub created_at: String,
    pub sources: Sources,

    pub design: Design,

    /// Catalogued variants per region
    pub reference_synthetic: VariantCounts,
    pub reference_genomic: VariantCounts,

    /// Tracked query records per region
    pub query_synthetic: VariantCounts,
    pub query_genomic: VariantCounts,

    pub synthetic: ClassAccuracy,
    pub genomic: ClassAccuracy,

    pub limit: DetectionLimit,
    pub regression: RegressionSummary,

    pub roc_score: RocScore,
    pub counters: Counters,
}

impl DiscoverySummary {
    pub fn new(stats: &DiscoveryStats, context: &ReferenceContext) -> Self {
        let reference = |region: Region| {
            let (snps, indels) = context.catalogue.count_where(|c| context.region(c) == region);
            VariantCounts::new(snps, indels)
        };

        let query = |region: Region| {
            let (snps, indels) = stats
                .chromosomes_in(region)
                .flat_map(|(_, c)| c.accepted.iter().chain(&c.repeated).chain(&c.rejected))
                .fold((0, 0), |(snps, indels), m| {
                    if m.query.class.is_indel() {
                        (snps, indels + 1)
                    } else {
                        (snps + 1, indels)
                    }
                });
            VariantCounts::new(snps, indels)
        };

        let design = if context.registry.is_germline_design() {
            Design::Germline
        } else {
            Design::Somatic
        };

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            sources: Sources::default(),
            design,
            reference_synthetic: reference(Region::Synthetic),
            reference_genomic: reference(Region::Genomic),
            query_synthetic: query(Region::Synthetic),
            query_genomic: query(Region::Genomic),
            synthetic: stats.synthetic.into(),
            genomic: stats.genomic.into(),
            limit: stats.limit.clone(),
            regression: RegressionSummary {
                total: stats.regression.total.fit_log2(),
                snp: stats.regression.snp.fit_log2(),
                indel: stats.regression.indel.fit_log2(),
            },
            roc_score: RocScore::choose(&stats.counters),
            counters: stats.counters,
        }
    }

    #[must_use]
    pub fn with_sources(mut self, sources: Sources) -> Self {
        self.sources = sources;
        self
    }

    /// Export the summary to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
