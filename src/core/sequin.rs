use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::locus::{Base, Locus};
use crate::core::types::{Concentration, Mixture, SequinId};

/// Concentrations of the two molecules making up a variant sequin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllelePair {
    /// Concentration of the reference (`_R`) molecule
    pub reference: Concentration,
    /// Concentration of the variant (`_V`) molecule
    pub variant: Concentration,
}

impl AllelePair {
    /// Expected allele frequency: `variant / (reference + variant)`
    pub fn allele_frequency(&self) -> f64 {
        self.variant / (self.reference + self.variant)
    }
}

/// A validated sequin, merged from the mixture table and the annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequinData {
    pub id: SequinId,

    /// Length of the sequin in bases
    pub length: Base,

    /// Chromosome the sequin is annotated on
    pub chrom: String,

    pub locus: Locus,

    /// Spiked-in concentration per mixture (sum of all molecules of the sequin)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mixes: BTreeMap<Mixture, Concentration>,

    /// Reference/variant molecule concentrations per mixture (variant sequins only)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub alleles: BTreeMap<Mixture, AllelePair>,
}

impl SequinData {
    pub fn new(id: SequinId, chrom: impl Into<String>, locus: Locus) -> Self {
        Self {
            id,
            length: locus.length(),
            chrom: chrom.into(),
            locus,
            mixes: BTreeMap::new(),
            alleles: BTreeMap::new(),
        }
    }

    /// Concentration normalized by sequin length
    pub fn abundance(&self, mixture: Mixture) -> Option<Concentration> {
        #[allow(clippy::cast_precision_loss)]
        let length = self.length.max(1) as f64;
        self.mixes.get(&mixture).map(|c| c / length)
    }

    pub fn concentration(&self, mixture: Mixture) -> Option<Concentration> {
        self.mixes.get(&mixture).copied()
    }
}
