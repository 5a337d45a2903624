use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::index::{Interval, IntervalIndex};
use crate::core::locus::{Base, Locus};
use crate::core::sequin::{AllelePair, SequinData};
use crate::core::types::{
    Concentration, Mixture, SequinId, SequinKind, REFERENCE_SUFFIX, VARIANT_SUFFIX,
};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error(
        "No sequin found in the reference ({mixture} ids in the mixture, {annotation} ids in the annotation)"
    )]
    Empty { mixture: usize, annotation: usize },

    #[error("Sequin not found: {0}")]
    NotFound(String),

    #[error("Sequin {id} has no reference/variant concentration pair in {mixture}")]
    MissingAllele { id: String, mixture: Mixture },
}

/// One row of a mixture table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixtureRecord {
    pub id: SequinId,
    pub length: Base,
    pub concentration: Concentration,
    pub mixture: Mixture,
}

/// One region of a coordinate annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationRecord {
    pub id: SequinId,
    pub chrom: String,
    pub locus: Locus,
}

/// Resolve the validated id set from mixture ids `m` and annotation ids `a`.
///
/// 1. `m` empty: the annotation defines the sequins.
/// 2. both non-empty: only ids defined in both survive.
/// 3. `a` empty: the mixture defines the sequins.
///
/// # Errors
///
/// Returns `RegistryError::Empty` if no id survives.
pub fn merge(
    m: &BTreeSet<SequinId>,
    a: &BTreeSet<SequinId>,
) -> Result<BTreeSet<SequinId>, RegistryError> {
    let validated: BTreeSet<SequinId> = if m.is_empty() {
        a.clone()
    } else if !a.is_empty() {
        m.intersection(a).cloned().collect()
    } else {
        m.clone()
    };

    if validated.is_empty() {
        return Err(RegistryError::Empty {
            mixture: m.len(),
            annotation: a.len(),
        });
    }

    Ok(validated)
}

/// Collects raw mixture and annotation records before validation
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    kind: SequinKind,
    primary: Mixture,
    mixes: BTreeMap<Mixture, BTreeMap<SequinId, MixtureRecord>>,
    annotations: BTreeMap<SequinId, AnnotationRecord>,
}

impl RegistryBuilder {
    pub fn new(kind: SequinKind) -> Self {
        Self {
            kind,
            primary: Mixture::MixA,
            mixes: BTreeMap::new(),
            annotations: BTreeMap::new(),
        }
    }

    /// Mixture used for allele frequencies and the germline check (default `MixA`)
    #[must_use]
    pub fn with_primary_mixture(mut self, mixture: Mixture) -> Self {
        self.primary = mixture;
        self
    }

    /// Add (or replace) one mixture record; nothing is validated yet
    pub fn add(
        &mut self,
        id: impl Into<SequinId>,
        length: Base,
        concentration: Concentration,
        mixture: Mixture,
    ) {
        let id = id.into();
        self.mixes.entry(mixture).or_default().insert(
            id.clone(),
            MixtureRecord {
                id,
                length,
                concentration,
                mixture,
            },
        );
    }

    pub fn add_mixture_record(&mut self, record: MixtureRecord) {
        self.add(
            record.id,
            record.length,
            record.concentration,
            record.mixture,
        );
    }

    /// Add an annotated region. A second region with the same id extends the
    /// first when it lies on the same chromosome and is ignored otherwise.
    pub fn add_annotation(&mut self, record: AnnotationRecord) {
        match self.annotations.get_mut(&record.id) {
            Some(existing) if existing.chrom == record.chrom => {
                existing.locus.merge(&record.locus);
            }
            Some(existing) => {
                debug!(
                    id = %record.id,
                    kept = %existing.chrom,
                    ignored = %record.chrom,
                    "Sequin annotated on more than one chromosome"
                );
            }
            None => {
                self.annotations.insert(record.id.clone(), record);
            }
        }
    }

    /// Base ids of every sequin named in any mixture
    fn mixture_ids(&self) -> BTreeSet<SequinId> {
        self.mixes
            .values()
            .flat_map(|m| m.keys())
            .map(|id| SequinId::new(self.kind.base_id(id.as_str())))
            .collect()
    }

    /// Validate and merge the collected records.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Empty` if no sequin survives the merge.
    pub fn build(self) -> Result<ReferenceRegistry, RegistryError> {
        let mixture_ids = self.mixture_ids();
        let annotation_ids: BTreeSet<SequinId> = self.annotations.keys().cloned().collect();
        let validated = merge(&mixture_ids, &annotation_ids)?;

        let dropped = mixture_ids.union(&annotation_ids).count() - validated.len();
        if dropped > 0 {
            debug!(dropped, "Sequins defined in only one source were dropped");
        }

        // Mixture records grouped by base id
        let mut grouped: HashMap<&str, Vec<&MixtureRecord>> = HashMap::new();
        for record in self.mixes.values().flat_map(BTreeMap::values) {
            grouped
                .entry(self.kind.base_id(record.id.as_str()))
                .or_default()
                .push(record);
        }

        let mut sequins = Vec::with_capacity(validated.len());
        for id in validated {
            let records = grouped.get(id.as_str()).map_or(&[][..], Vec::as_slice);

            let mut data = match self.annotations.get(&id) {
                Some(annotation) => {
                    SequinData::new(id.clone(), annotation.chrom.clone(), annotation.locus)
                }
                None => {
                    // Mixture only: the sequin is its own chromosome
                    let length = records.iter().map(|r| r.length).max().unwrap_or(1).max(1);
                    SequinData::new(id.clone(), id.as_str(), Locus::new(1, length))
                }
            };

            for record in records {
                *data.mixes.entry(record.mixture).or_default() += record.concentration;
            }

            if self.kind == SequinKind::Variant {
                for (mixture, records) in &self.mixes {
                    let reference = records.get(&SequinId::new(format!("{id}{REFERENCE_SUFFIX}")));
                    let variant = records.get(&SequinId::new(format!("{id}{VARIANT_SUFFIX}")));
                    if let (Some(r), Some(v)) = (reference, variant) {
                        data.alleles.insert(
                            *mixture,
                            AllelePair {
                                reference: r.concentration,
                                variant: v.concentration,
                            },
                        );
                    }
                }
            }

            sequins.push(data);
        }

        let index = IntervalIndex::build(
            sequins
                .iter()
                .map(|s| (s.chrom.clone(), Interval::new(s.id.clone(), s.locus))),
        );

        let id_to_index = sequins
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();

        info!(
            sequins = sequins.len(),
            kind = ?self.kind,
            "Validated reference registry"
        );

        Ok(ReferenceRegistry {
            kind: self.kind,
            primary: self.primary,
            sequins,
            id_to_index,
            index,
        })
    }
}

/// The validated, immutable set of sequins for one analysis run
#[derive(Debug, Clone)]
pub struct ReferenceRegistry {
    kind: SequinKind,
    primary: Mixture,

    /// Validated sequins, sorted by id
    sequins: Vec<SequinData>,

    /// Index: sequin ID -> index in sequins vec
    id_to_index: HashMap<SequinId, usize>,

    /// Per-chromosome intervals of the sequin loci
    index: IntervalIndex,
}

impl ReferenceRegistry {
    /// Look up a sequin by id; allele-suffixed ids resolve to their base id
    pub fn lookup_by_id(&self, id: &str) -> Option<&SequinData> {
        let idx = self
            .id_to_index
            .get(&SequinId::new(id))
            .or_else(|| self.id_to_index.get(&SequinId::new(self.kind.base_id(id))))?;
        Some(&self.sequins[*idx])
    }

    /// The sequin whose locus overlaps `locus` (leftmost start first)
    pub fn lookup_by_locus(&self, chrom: &str, locus: &Locus) -> Option<&SequinData> {
        let interval = self.index.overlap(chrom, locus)?;
        self.lookup_by_id(interval.id.as_str())
    }

    /// The single sequin whose locus fully contains `locus`
    pub fn lookup_containing(&self, chrom: &str, locus: &Locus) -> Option<&SequinData> {
        let interval = self.index.contains(chrom, locus)?;
        self.lookup_by_id(interval.id.as_str())
    }

    /// Does the primary mixture only hold heterozygous (0.5) and homozygous
    /// (1.0) allele frequencies, each at least once?
    pub fn is_germline_design(&self) -> bool {
        let freqs: HashSet<u64> = self
            .sequins
            .iter()
            .filter_map(|s| s.alleles.get(&self.primary))
            .map(|p| p.allele_frequency().to_bits())
            .collect();

        freqs.len() == 2 && freqs.contains(&0.5f64.to_bits()) && freqs.contains(&1.0f64.to_bits())
    }

    fn allele_pair(&self, id: &str) -> Result<&AllelePair, RegistryError> {
        let sequin = self
            .lookup_by_id(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        sequin
            .alleles
            .get(&self.primary)
            .ok_or_else(|| RegistryError::MissingAllele {
                id: sequin.id.to_string(),
                mixture: self.primary,
            })
    }

    /// Concentration of the reference molecule in the primary mixture
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if the id was never validated, or
    /// `RegistryError::MissingAllele` if the mixture lacks the `_R`/`_V` pair.
    pub fn find_ref_concentration(&self, id: &str) -> Result<Concentration, RegistryError> {
        Ok(self.allele_pair(id)?.reference)
    }

    /// Concentration of the variant molecule in the primary mixture
    ///
    /// # Errors
    ///
    /// Same as [`ReferenceRegistry::find_ref_concentration`].
    pub fn find_alt_concentration(&self, id: &str) -> Result<Concentration, RegistryError> {
        Ok(self.allele_pair(id)?.variant)
    }

    /// Expected allele frequency `alt / (ref + alt)` in the primary mixture
    ///
    /// # Errors
    ///
    /// Same as [`ReferenceRegistry::find_ref_concentration`].
    pub fn find_allele_frequency(&self, id: &str) -> Result<f64, RegistryError> {
        Ok(self.allele_pair(id)?.allele_frequency())
    }

    /// Every validated sequin with a zero count, for detection histograms
    pub fn histogram(&self) -> BTreeMap<SequinId, u64> {
        self.sequins.iter().map(|s| (s.id.clone(), 0)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SequinData> {
        self.sequins.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &SequinId> {
        self.sequins.iter().map(|s| &s.id)
    }

    pub fn index(&self) -> &IntervalIndex {
        &self.index
    }

    pub fn kind(&self) -> SequinKind {
        self.kind
    }

    pub fn primary_mixture(&self) -> Mixture {
        self.primary
    }

    pub fn len(&self) -> usize {
        self.sequins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> BTreeSet<SequinId> {
        list.iter().map(|s| SequinId::new(*s)).collect()
    }

    fn annotation(id: &str, chrom: &str, start: Base, end: Base) -> AnnotationRecord {
        AnnotationRecord {
            id: SequinId::new(id),
            chrom: chrom.to_string(),
            locus: Locus::new(start, end),
        }
    }

    #[test]
    fn test_merge_rules() {
        let m = ids(&["A", "B", "C"]);
        let a = ids(&["B", "C", "D"]);

        assert_eq!(merge(&m, &a).unwrap(), ids(&["B", "C"]));
        assert_eq!(merge(&BTreeSet::new(), &a).unwrap(), a);
        assert_eq!(merge(&m, &BTreeSet::new()).unwrap(), m);
    }

    #[test]
    fn test_merge_empty_is_fatal() {
        let result = merge(&ids(&["A"]), &ids(&["B"]));
        assert!(matches!(
            result,
            Err(RegistryError::Empty {
                mixture: 1,
                annotation: 1
            })
        ));
        assert!(merge(&BTreeSet::new(), &BTreeSet::new()).is_err());
    }

    #[test]
    fn test_add_is_idempotent_upsert() {
        let mut builder = RegistryBuilder::new(SequinKind::Ladder);
        builder.add("L1", 100, 1.0, Mixture::MixA);
        builder.add("L1", 100, 4.0, Mixture::MixA);
        builder.add("L1", 100, 2.0, Mixture::MixB);

        let registry = builder.build().unwrap();
        let l1 = registry.lookup_by_id("L1").unwrap();
        assert_eq!(l1.concentration(Mixture::MixA), Some(4.0));
        assert_eq!(l1.concentration(Mixture::MixB), Some(2.0));
    }

    #[test]
    fn test_build_intersection_takes_locus_from_annotation() {
        let mut builder = RegistryBuilder::new(SequinKind::Metagenome);
        builder.add("M1", 500, 10.0, Mixture::MixA);
        builder.add("M2", 500, 20.0, Mixture::MixA);
        builder.add_annotation(annotation("M1", "chrev1", 1001, 1400));
        builder.add_annotation(annotation("M3", "chrev1", 2001, 2400));

        let registry = builder.build().unwrap();
        assert_eq!(registry.len(), 1);

        let m1 = registry.lookup_by_id("M1").unwrap();
        assert_eq!(m1.chrom, "chrev1");
        assert_eq!(m1.locus, Locus::new(1001, 1400));
        assert_eq!(m1.length, 400);
        assert_eq!(m1.concentration(Mixture::MixA), Some(10.0));

        assert!(registry.lookup_by_id("M2").is_none());
        assert!(registry.lookup_by_id("M3").is_none());
    }

    #[test]
    fn test_build_mixture_only_uses_placeholder_coordinates() {
        let mut builder = RegistryBuilder::new(SequinKind::Ladder);
        builder.add("L1", 250, 1.0, Mixture::MixA);

        let registry = builder.build().unwrap();
        let l1 = registry.lookup_by_id("L1").unwrap();
        assert_eq!(l1.chrom, "L1");
        assert_eq!(l1.locus, Locus::new(1, 250));
        assert!(registry.lookup_by_locus("L1", &Locus::point(10)).is_some());
    }

    #[test]
    fn test_build_annotation_only_has_no_abundance() {
        let mut builder = RegistryBuilder::new(SequinKind::Variant);
        builder.add_annotation(annotation("D_1_1", "chrev1", 1, 100));

        let registry = builder.build().unwrap();
        let d = registry.lookup_by_id("D_1_1").unwrap();
        assert!(d.mixes.is_empty());
        assert!(matches!(
            registry.find_allele_frequency("D_1_1"),
            Err(RegistryError::MissingAllele { .. })
        ));
    }

    #[test]
    fn test_build_fails_on_disjoint_sources() {
        let mut builder = RegistryBuilder::new(SequinKind::Ladder);
        builder.add("L1", 100, 1.0, Mixture::MixA);
        builder.add_annotation(annotation("L2", "chrev1", 1, 100));

        assert!(matches!(builder.build(), Err(RegistryError::Empty { .. })));
    }

    fn variant_registry() -> ReferenceRegistry {
        let mut builder = RegistryBuilder::new(SequinKind::Variant);
        builder.add("D_1_1_R", 1000, 30.0, Mixture::MixA);
        builder.add("D_1_1_V", 1000, 10.0, Mixture::MixA);
        builder.add("D_1_2_R", 1000, 0.0, Mixture::MixA);
        builder.add("D_1_2_V", 1000, 8.0, Mixture::MixA);
        builder.add_annotation(annotation("D_1_1", "chrev1", 1, 1000));
        builder.add_annotation(annotation("D_1_2", "chrev1", 2001, 3000));
        builder.build().unwrap()
    }

    #[test]
    fn test_variant_sequins_merge_on_base_id() {
        let registry = variant_registry();
        assert_eq!(registry.len(), 2);

        let d = registry.lookup_by_id("D_1_1").unwrap();
        assert_eq!(d.concentration(Mixture::MixA), Some(40.0));
        assert!(registry.lookup_by_id("D_1_1_V").is_some());
    }

    #[test]
    fn test_allele_concentrations() {
        let registry = variant_registry();

        assert_eq!(registry.find_ref_concentration("D_1_1").unwrap(), 30.0);
        assert_eq!(registry.find_alt_concentration("D_1_1_R").unwrap(), 10.0);
        assert!((registry.find_allele_frequency("D_1_1").unwrap() - 0.25).abs() < 1e-12);
        assert!((registry.find_allele_frequency("D_1_2").unwrap() - 1.0).abs() < 1e-12);

        assert!(matches!(
            registry.find_allele_frequency("D_9_9"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_lookup_by_locus() {
        let registry = variant_registry();

        let hit = registry.lookup_by_locus("chrev1", &Locus::point(2500)).unwrap();
        assert_eq!(hit.id.as_str(), "D_1_2");
        assert!(registry.lookup_by_locus("chrev1", &Locus::point(1500)).is_none());
        assert!(registry.lookup_by_locus("chr1", &Locus::point(10)).is_none());
    }

    #[test]
    fn test_lookup_containing() {
        let registry = variant_registry();

        let hit = registry
            .lookup_containing("chrev1", &Locus::new(2990, 3000))
            .unwrap();
        assert_eq!(hit.id.as_str(), "D_1_2");
        // Overlaps D_1_2 but runs past its end
        assert!(registry
            .lookup_containing("chrev1", &Locus::new(2990, 3010))
            .is_none());
        assert!(registry
            .lookup_by_locus("chrev1", &Locus::new(2990, 3010))
            .is_some());
    }

    #[test]
    fn test_germline_design() {
        let mut builder = RegistryBuilder::new(SequinKind::Variant);
        builder.add("G_1_R", 100, 5.0, Mixture::MixA);
        builder.add("G_1_V", 100, 5.0, Mixture::MixA);
        builder.add("G_2_R", 100, 0.0, Mixture::MixA);
        builder.add("G_2_V", 100, 5.0, Mixture::MixA);
        assert!(builder.clone().build().unwrap().is_germline_design());

        // A third frequency breaks the germline pattern
        builder.add("G_3_R", 100, 3.0, Mixture::MixA);
        builder.add("G_3_V", 100, 1.0, Mixture::MixA);
        assert!(!builder.build().unwrap().is_germline_design());

        // Somatic dilution series
        assert!(!variant_registry().is_germline_design());
    }

    #[test]
    fn test_germline_design_uses_primary_mixture() {
        let mut builder = RegistryBuilder::new(SequinKind::Variant).with_primary_mixture(Mixture::MixB);
        builder.add("G_1_R", 100, 5.0, Mixture::MixA);
        builder.add("G_1_V", 100, 5.0, Mixture::MixA);
        builder.add("G_2_R", 100, 0.0, Mixture::MixA);
        builder.add("G_2_V", 100, 5.0, Mixture::MixA);

        let registry = builder.build().unwrap();
        assert!(!registry.is_germline_design());
    }

    #[test]
    fn test_histogram_starts_at_zero() {
        let hist = variant_registry().histogram();
        assert_eq!(hist.len(), 2);
        assert!(hist.values().all(|&n| n == 0));
    }
}
