use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::catalog::ReferenceContext;
use crate::core::sequin::SequinData;
use crate::core::types::{Label, Mixture, Region, SequinId};
use crate::core::variant::{Variant, VariantKey, VariantMatch};
use crate::matching::regression::{DetectionLimit, LinearAccumulator};
use crate::matching::scoring::ClassConfusion;
use crate::parsing::ParseError;

/// Default prefix of the synthetic chromosome(s)
pub const DEFAULT_SYNTHETIC_PREFIX: &str = "chrev";

/// Default number of records between progress reports
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100_000;

/// Configuration for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// A chromosome starting with any of these belongs to the synthetic space
    pub synthetic_prefixes: Vec<String>,

    /// Mixture used for expected allele frequencies
    pub primary_mixture: Mixture,

    /// Records between progress reports (0 disables reporting)
    pub progress_interval: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            synthetic_prefixes: vec![DEFAULT_SYNTHETIC_PREFIX.to_string()],
            primary_mixture: Mixture::MixA,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl AnalysisConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Record counters for progress and reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    /// Every record read, tracked or not
    pub processed: u64,
    pub synthetic: u64,
    pub genomic: u64,
    pub untracked: u64,

    /// Malformed records skipped
    pub skipped: u64,

    /// Accepted records repeating an already detected catalogue variant
    pub repeated: u64,

    /// Tracked records reporting a p-value
    pub with_p_value: u64,

    /// Tracked records with read coverage
    pub with_depth: u64,
}

/// Regression accumulators for all variants and each class
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegressionSet {
    pub total: LinearAccumulator,
    pub snp: LinearAccumulator,
    pub indel: LinearAccumulator,
}

/// Per-chromosome classification bookkeeping
#[derive(Debug, Clone, Serialize)]
pub struct ChromStats {
    pub region: Region,

    /// First detection of each catalogued variant
    pub accepted: Vec<VariantMatch>,

    /// Later detections of an already accepted catalogued variant
    pub repeated: Vec<VariantMatch>,

    /// Records that did not match a catalogued variant on position and alleles
    pub rejected: Vec<VariantMatch>,

    /// Detections per catalogued variant key
    #[serde(skip)]
    pub histogram: BTreeMap<VariantKey, u64>,

    pub confusion: ClassConfusion,
}

impl ChromStats {
    fn new(region: Region, histogram: BTreeMap<VariantKey, u64>) -> Self {
        Self {
            region,
            accepted: Vec::new(),
            repeated: Vec::new(),
            rejected: Vec::new(),
            histogram,
            confusion: ClassConfusion::default(),
        }
    }

    /// Number of distinct catalogued variants detected at least once
    pub fn detected(&self) -> usize {
        self.histogram.values().filter(|&&n| n > 0).count()
    }

    /// Accepted match of a catalogued variant key
    pub fn find_accepted(&self, key: VariantKey) -> Option<&VariantMatch> {
        self.accepted
            .iter()
            .find(|m| m.matched.as_ref().is_some_and(|v| v.key() == key))
    }
}

/// Final statistics of one analysis run
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryStats {
    pub chroms: BTreeMap<String, ChromStats>,

    /// Confusion summed over synthetic chromosomes
    pub synthetic: ClassConfusion,

    /// Confusion summed over genomic chromosomes
    pub genomic: ClassConfusion,

    pub regression: RegressionSet,

    /// Lowest expected allele frequency detected
    pub limit: DetectionLimit,

    pub counters: Counters,
}

impl DiscoveryStats {
    pub fn chromosomes_in(&self, region: Region) -> impl Iterator<Item = (&String, &ChromStats)> {
        self.chroms.iter().filter(move |(_, c)| c.region == region)
    }
}

type ProgressCallback<'a> = Box<dyn FnMut(u64) + 'a>;

/// Streaming classifier of query variants against a reference context.
///
/// Each record passes through region classification, a positional lookup in
/// the catalogue and the allele check; accepted matches feed the regression
/// and the detection limit. Call [`Classifier::finish`] once the input is
/// exhausted to derive the confusion counts.
pub struct Classifier<'a> {
    context: &'a ReferenceContext,
    config: AnalysisConfig,
    chroms: BTreeMap<String, ChromStats>,
    regression: RegressionSet,
    limit: DetectionLimit,
    counters: Counters,
    progress: Option<ProgressCallback<'a>>,
}

impl<'a> Classifier<'a> {
    pub fn new(context: &'a ReferenceContext, config: AnalysisConfig) -> Self {
        Self {
            context,
            config,
            chroms: BTreeMap::new(),
            regression: RegressionSet::default(),
            limit: DetectionLimit::default(),
            counters: Counters::default(),
            progress: None,
        }
    }

    /// Replace the default progress log line with a callback receiving the
    /// number of records processed so far
    #[must_use]
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(u64) + 'a,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    fn report_progress(&mut self) {
        let interval = self.config.progress_interval;
        if interval == 0 || self.counters.processed % interval != 0 {
            return;
        }
        let processed = self.counters.processed;
        match self.progress.as_mut() {
            Some(callback) => callback(processed),
            None => info!(processed, "Processed records"),
        }
    }

    fn chrom_stats(&mut self, chrom: &str, region: Region) -> &mut ChromStats {
        let context = self.context;
        self.chroms
            .entry(chrom.to_string())
            .or_insert_with(|| ChromStats::new(region, context.catalogue.histogram(chrom)))
    }

    /// Classify one record. Returns None for records outside the tracked
    /// region space.
    ///
    /// # Panics
    ///
    /// Panics if an accepted match has no detection histogram entry, which
    /// means the catalogue changed during the run.
    pub fn classify(&mut self, variant: Variant) -> Option<Label> {
        self.counters.processed += 1;
        self.report_progress();

        let region = self.context.region(&variant.chrom);
        match region {
            Region::Synthetic => self.counters.synthetic += 1,
            Region::Genomic => self.counters.genomic += 1,
            Region::Untracked => {
                self.counters.untracked += 1;
                return None;
            }
        }

        if !variant.p_value.is_nan() {
            self.counters.with_p_value += 1;
        }
        if variant.depth() > 0 {
            self.counters.with_depth += 1;
        }

        let context: &'a ReferenceContext = self.context;
        let catalogued = context
            .catalogue
            .find_by_locus(&variant.chrom, &variant.locus);
        let mut outcome = VariantMatch::new(variant, catalogued);
        let chrom = outcome.query.chrom.clone();

        if let (true, Some(matched)) = (outcome.is_accepted(), catalogued) {
            let key = matched.key();
            let sequin = context.sequin_of(matched);
            let observed = outcome.query.allele_frequency();
            outcome.region = sequin.map(|s| s.id.clone());

            let stats = self.chrom_stats(&chrom, region);
            let Some(count) = stats.histogram.get_mut(&key) else {
                unreachable!("catalogued variant {key} missing from the detection histogram");
            };
            *count += 1;

            if *count > 1 {
                debug!(chrom = %chrom, start = matched.locus.start, "Repeated detection");
                stats.repeated.push(outcome);
                self.counters.repeated += 1;
                return Some(Label::TruePositive);
            }
            stats.accepted.push(outcome);

            self.feed_regression(sequin, matched, observed);
            Some(Label::TruePositive)
        } else {
            outcome.region = context
                .registry
                .lookup_by_locus(&chrom, &outcome.query.locus)
                .map(|s| s.id.clone());
            self.chrom_stats(&chrom, region).rejected.push(outcome);
            Some(Label::FalsePositive)
        }
    }

    fn feed_regression(&mut self, sequin: Option<&SequinData>, matched: &Variant, observed: f64) {
        let Some(sequin) = sequin else {
            debug!(id = %matched.id, "Accepted match outside any validated sequin");
            return;
        };

        let expected = match self.context.registry.find_allele_frequency(sequin.id.as_str()) {
            Ok(expected) => expected,
            Err(e) => {
                debug!(error = %e, "No expected allele frequency");
                return;
            }
        };

        self.limit.observe(&sequin.id, expected);

        let id: SequinId = sequin.id.clone();
        self.regression.total.add(id.clone(), expected, observed);
        if matched.class.is_indel() {
            self.regression.indel.add(id, expected, observed);
        } else {
            self.regression.snp.add(id, expected, observed);
        }
    }

    /// Classify a stream of records.
    ///
    /// Malformed records are logged, counted and skipped.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error; the run cannot continue past it.
    pub fn run<I>(&mut self, records: I) -> Result<(), ParseError>
    where
        I: IntoIterator<Item = Result<Variant, ParseError>>,
    {
        for record in records {
            match record {
                Ok(variant) => {
                    self.classify(variant);
                }
                Err(ParseError::Io(e)) => return Err(ParseError::Io(e)),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed record");
                    self.counters.skipped += 1;
                }
            }
        }
        Ok(())
    }

    /// Derive per-class confusion counts and close the run
    pub fn finish(mut self) -> DiscoveryStats {
        let context = self.context;

        // Catalogued chromosomes without a single query still count their
        // reference variants as false negatives
        let catalogued: BTreeSet<&str> = context.catalogue.chromosomes().collect();
        for chrom in catalogued {
            let region = context.region(chrom);
            if region != Region::Untracked {
                self.chrom_stats(chrom, region);
            }
        }

        let mut synthetic = ClassConfusion::default();
        let mut genomic = ClassConfusion::default();

        for (chrom, stats) in &mut self.chroms {
            let tp_snps = stats
                .accepted
                .iter()
                .filter(|m| !m.query.class.is_indel())
                .count();
            let tp_indels = stats.accepted.len() - tp_snps;
            let fp_snps = stats
                .rejected
                .iter()
                .filter(|m| !m.query.class.is_indel())
                .count();
            let fp_indels = stats.rejected.len() - fp_snps;

            stats.confusion = ClassConfusion::from_counts(
                (tp_snps, fp_snps, context.catalogue.count_snps(chrom)),
                (tp_indels, fp_indels, context.catalogue.count_indels(chrom)),
            );

            match stats.region {
                Region::Synthetic => synthetic += stats.confusion,
                Region::Genomic => genomic += stats.confusion,
                Region::Untracked => {}
            }
        }

        info!(
            processed = self.counters.processed,
            skipped = self.counters.skipped,
            tp = synthetic.total.tp,
            fp = synthetic.total.fp,
            fn_ = synthetic.total.fn_,
            "Classification complete"
        );

        DiscoveryStats {
            chroms: self.chroms,
            synthetic,
            genomic,
            regression: self.regression,
            limit: self.limit,
            counters: self.counters,
        }
    }
}

/// Classify a whole stream with a fresh classifier
///
/// # Errors
///
/// Returns the first I/O error encountered while reading records.
pub fn classify_all<I>(
    context: &ReferenceContext,
    config: AnalysisConfig,
    records: I,
) -> Result<DiscoveryStats, ParseError>
where
    I: IntoIterator<Item = Result<Variant, ParseError>>,
{
    let mut classifier = Classifier::new(context, config);
    classifier.run(records)?;
    Ok(classifier.finish())
}
