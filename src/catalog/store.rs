use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::core::locus::{Base, Locus};
use crate::core::variant::{Variant, VariantKey};

/// Variants of one chromosome, partitioned by mutation class
#[derive(Debug, Clone, Default)]
struct ChromVariants {
    snps: BTreeMap<Base, Variant>,
    indels: BTreeMap<Base, Variant>,

    /// Index: variant key -> (is_indel, start)
    keys: HashMap<VariantKey, (bool, Base)>,
}

impl ChromVariants {
    fn partition(&self, is_indel: bool) -> &BTreeMap<Base, Variant> {
        if is_indel {
            &self.indels
        } else {
            &self.snps
        }
    }
}

/// Chromosome-indexed store of normalized variants.
///
/// Each chromosome holds an SNP map and an indel map keyed by locus start,
/// plus an index from [`VariantKey`] to the stored record. A chromosome that
/// was never ingested behaves like one with no variants.
#[derive(Debug, Clone, Default)]
pub struct VariantStore {
    chroms: BTreeMap<String, ChromVariants>,
}

impl VariantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variant. A second variant of the same class at the same start
    /// replaces the first.
    pub fn insert(&mut self, variant: Variant) {
        let chrom = self.chroms.entry(variant.chrom.clone()).or_default();
        let is_indel = variant.class.is_indel();
        let start = variant.locus.start;
        let key = variant.key();

        let partition = if is_indel {
            &mut chrom.indels
        } else {
            &mut chrom.snps
        };

        if let Some(old) = partition.insert(start, variant) {
            debug!(
                chrom = %old.chrom,
                start,
                class = %old.class,
                "Duplicate catalogue record replaced"
            );
            chrom.keys.remove(&old.key());
        }
        chrom.keys.insert(key, (is_indel, start));
    }

    /// Populate the store from a stream of variants, returning how many were read
    pub fn ingest<I>(&mut self, variants: I) -> usize
    where
        I: IntoIterator<Item = Variant>,
    {
        let mut n = 0;
        for variant in variants {
            self.insert(variant);
            n += 1;
        }
        n
    }

    /// Exact positional lookup on the locus start; SNPs are checked before indels
    pub fn find_by_locus(&self, chrom: &str, locus: &Locus) -> Option<&Variant> {
        let chrom = self.chroms.get(chrom)?;
        chrom
            .snps
            .get(&locus.start)
            .or_else(|| chrom.indels.get(&locus.start))
    }

    pub fn find_by_key(&self, chrom: &str, key: VariantKey) -> Option<&Variant> {
        let chrom = self.chroms.get(chrom)?;
        let (is_indel, start) = chrom.keys.get(&key)?;
        chrom.partition(*is_indel).get(start)
    }

    /// Every stored key of a chromosome with a zero count
    pub fn histogram(&self, chrom: &str) -> BTreeMap<VariantKey, u64> {
        self.chroms
            .get(chrom)
            .map(|c| c.keys.keys().map(|k| (*k, 0)).collect())
            .unwrap_or_default()
    }

    /// Variants of a chromosome, SNPs first, each class in start order
    pub fn variants(&self, chrom: &str) -> impl Iterator<Item = &Variant> {
        self.chroms
            .get(chrom)
            .into_iter()
            .flat_map(|c| c.snps.values().chain(c.indels.values()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variant> {
        self.chroms
            .values()
            .flat_map(|c| c.snps.values().chain(c.indels.values()))
    }

    pub fn count_snps(&self, chrom: &str) -> usize {
        self.chroms.get(chrom).map_or(0, |c| c.snps.len())
    }

    pub fn count_indels(&self, chrom: &str) -> usize {
        self.chroms.get(chrom).map_or(0, |c| c.indels.len())
    }

    pub fn count(&self, chrom: &str) -> usize {
        self.count_snps(chrom) + self.count_indels(chrom)
    }

    /// (SNPs, indels) summed over the chromosomes accepted by `filter`
    pub fn count_where<F>(&self, filter: F) -> (usize, usize)
    where
        F: Fn(&str) -> bool,
    {
        self.chroms
            .iter()
            .filter(|(name, _)| filter(name.as_str()))
            .fold((0, 0), |(snps, indels), (_, c)| {
                (snps + c.snps.len(), indels + c.indels.len())
            })
    }

    pub fn count_all(&self) -> usize {
        self.chroms
            .values()
            .map(|c| c.snps.len() + c.indels.len())
            .sum()
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.chroms.keys().map(String::as_str)
    }

    pub fn has_chromosome(&self, chrom: &str) -> bool {
        self.chroms.contains_key(chrom)
    }

    pub fn len(&self) -> usize {
        self.count_all()
    }

    pub fn is_empty(&self) -> bool {
        self.chroms.is_empty()
    }
}

impl FromIterator<Variant> for VariantStore {
    fn from_iter<I: IntoIterator<Item = Variant>>(iter: I) -> Self {
        let mut store = Self::new();
        store.ingest(iter);
        store
    }
}
