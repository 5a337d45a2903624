use serde::Serialize;
use std::io::Write;

use crate::catalog::ReferenceContext;
use crate::core::locus::Base;
use crate::core::types::{Label, MutationClass, Region, SequinId};
use crate::core::variant::{Variant, VariantMatch, MISSING_ID};
use crate::matching::engine::DiscoveryStats;
use crate::utils::validation::format_na;

/// Id used for a rejected record outside every known region
pub const UNKNOWN_ID: &str = "-";

/// Column headers of the detection tables
pub const COLUMNS: [&str; 16] = [
    "ID", "ChrID", "Position", "Label", "ReadR", "ReadV", "Depth", "ExpRef", "ExpVar", "ExpFreq",
    "ObsFreq", "Pval", "Qual", "QualR", "QualV", "Type",
];

/// One row of the sequin or detected table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionRecord {
    pub id: String,
    pub chrom: String,
    pub position: Base,
    pub label: Label,

    /// Read depths; None for undetected variants
    pub read_depth_ref: Option<u64>,
    pub read_depth_alt: Option<u64>,

    pub expected_ref: f64,
    pub expected_alt: f64,
    pub expected_freq: f64,
    pub observed_freq: f64,

    pub p_value: f64,
    pub quality: f64,
    pub quality_ref: f64,
    pub quality_alt: f64,

    pub class: MutationClass,
}

impl DetectionRecord {
    fn observed(
        id: String,
        label: Label,
        m: &VariantMatch,
        expected: (f64, f64, f64),
    ) -> Self {
        let q = &m.query;
        Self {
            id,
            chrom: q.chrom.clone(),
            position: q.locus.start,
            label,
            read_depth_ref: Some(q.read_depth_ref),
            read_depth_alt: Some(q.read_depth_alt),
            expected_ref: expected.0,
            expected_alt: expected.1,
            expected_freq: expected.2,
            observed_freq: q.allele_frequency(),
            p_value: q.p_value,
            quality: q.quality,
            quality_ref: q.quality_ref,
            quality_alt: q.quality_alt,
            class: q.class,
        }
    }

    pub fn depth(&self) -> Option<u64> {
        Some(self.read_depth_ref? + self.read_depth_alt?)
    }

    /// Tab-separated row in [`COLUMNS`] order; missing values render as `NA`
    pub fn to_row(&self) -> String {
        let count = |n: Option<u64>| n.map_or_else(|| "NA".to_string(), |n| n.to_string());

        [
            self.id.clone(),
            self.chrom.clone(),
            self.position.to_string(),
            self.label.to_string(),
            count(self.read_depth_ref),
            count(self.read_depth_alt),
            count(self.depth()),
            format_na(self.expected_ref),
            format_na(self.expected_alt),
            format_na(self.expected_freq),
            format_na(self.observed_freq),
            format_na(self.p_value),
            format_na(self.quality),
            format_na(self.quality_ref),
            format_na(self.quality_alt),
            self.class.to_string(),
        ]
        .join("\t")
    }
}

/// (reference, variant, allele frequency) expected for a sequin, NaN if unknown
fn expected(context: &ReferenceContext, id: Option<&str>) -> (f64, f64, f64) {
    let registry = &context.registry;
    id.map_or((f64::NAN, f64::NAN, f64::NAN), |id| {
        (
            registry.find_ref_concentration(id).unwrap_or(f64::NAN),
            registry.find_alt_concentration(id).unwrap_or(f64::NAN),
            registry.find_allele_frequency(id).unwrap_or(f64::NAN),
        )
    })
}

/// One row per catalogued variant on the synthetic chromosomes: TP if it was
/// detected, FN otherwise. Rows follow the catalogue order, SNPs first.
pub fn sequin_records(stats: &DiscoveryStats, context: &ReferenceContext) -> Vec<DetectionRecord> {
    let mut records = Vec::new();

    for (chrom, chrom_stats) in stats.chromosomes_in(Region::Synthetic) {
        let mut catalogued: Vec<(&Variant, u64)> = chrom_stats
            .histogram
            .iter()
            .filter_map(|(key, count)| {
                context
                    .catalogue
                    .find_by_key(chrom, *key)
                    .map(|v| (v, *count))
            })
            .collect();
        catalogued.sort_by_key(|(v, _)| (v.class.is_indel(), v.locus.start));

        for (variant, count) in catalogued {
            let sequin = context.sequin_of(variant).map(|s| s.id.as_str());
            let expected = expected(context, sequin);
            let accepted = if count > 0 {
                chrom_stats.find_accepted(variant.key())
            } else {
                None
            };

            let record = match accepted {
                Some(m) => {
                    let mut record = DetectionRecord::observed(
                        variant.display_id(),
                        Label::TruePositive,
                        m,
                        expected,
                    );
                    record.position = variant.locus.start;
                    record
                }
                None => DetectionRecord {
                    id: variant.display_id(),
                    chrom: variant.chrom.clone(),
                    position: variant.locus.start,
                    label: Label::FalseNegative,
                    read_depth_ref: None,
                    read_depth_alt: None,
                    expected_ref: expected.0,
                    expected_alt: expected.1,
                    expected_freq: expected.2,
                    observed_freq: f64::NAN,
                    p_value: f64::NAN,
                    quality: f64::NAN,
                    quality_ref: f64::NAN,
                    quality_alt: f64::NAN,
                    class: variant.class,
                },
            };
            records.push(record);
        }
    }

    records
}

/// Id a query row is reported under: the overlapping sequin, else the
/// catalogued variant it hit, else [`UNKNOWN_ID`]
fn reported_id(m: &VariantMatch) -> Option<&str> {
    m.region.as_ref().map(SequinId::as_str).or_else(|| {
        m.matched
            .as_ref()
            .map(|v| v.id.as_str())
            .filter(|id| *id != MISSING_ID)
    })
}

/// One row per tracked query record: TP for accepted (and repeated) matches,
/// FP for everything else
pub fn detected_records(stats: &DiscoveryStats, context: &ReferenceContext) -> Vec<DetectionRecord> {
    let mut records = Vec::new();

    for chrom_stats in stats.chroms.values() {
        let tps = chrom_stats
            .accepted
            .iter()
            .chain(&chrom_stats.repeated)
            .map(|m| (Label::TruePositive, m));
        let fps = chrom_stats
            .rejected
            .iter()
            .map(|m| (Label::FalsePositive, m));

        for (label, m) in tps.chain(fps) {
            let id = reported_id(m);
            records.push(DetectionRecord::observed(
                id.unwrap_or(UNKNOWN_ID).to_string(),
                label,
                m,
                expected(context, id),
            ));
        }
    }

    records
}

/// Write a header and one row per record
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_records<W: Write>(writer: &mut W, records: &[DetectionRecord]) -> std::io::Result<()> {
    writeln!(writer, "{}", COLUMNS.join("\t"))?;
    for record in records {
        writeln!(writer, "{}", record.to_row())?;
    }
    Ok(())
}
