use serde::{Deserialize, Serialize};

/// Unique identifier for a sequin in the registry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequinId(pub String);

impl SequinId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SequinId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SequinId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SequinId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Floating abundance of a sequin in a mixture (e.g. attomol/ul)
pub type Concentration = f64;

/// A named formulation assigning a concentration to every sequin
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mixture {
    MixA,
    MixB,
    MixF,
    MixG,
}

impl Mixture {
    /// Parse a mixture label from a table header.
    ///
    /// Accepts `MixA`, `Mix A`, `Mix_A`, `mix-a` and the bare letter `A`.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        let letter = normalized.strip_prefix("mix").unwrap_or(&normalized);

        match letter {
            "a" => Some(Self::MixA),
            "b" => Some(Self::MixB),
            "f" => Some(Self::MixF),
            "g" => Some(Self::MixG),
            _ => None,
        }
    }
}

impl std::fmt::Display for Mixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MixA => write!(f, "MixA"),
            Self::MixB => write!(f, "MixB"),
            Self::MixF => write!(f, "MixF"),
            Self::MixG => write!(f, "MixG"),
        }
    }
}

/// Mutation class of a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationClass {
    Snp,
    Insertion,
    Deletion,
}

impl MutationClass {
    /// Classify a variant from its reference and alternate alleles
    #[must_use]
    pub fn from_alleles(reference: &str, alternate: &str) -> Self {
        match reference.len().cmp(&alternate.len()) {
            std::cmp::Ordering::Equal => Self::Snp,
            std::cmp::Ordering::Less => Self::Insertion,
            std::cmp::Ordering::Greater => Self::Deletion,
        }
    }

    #[must_use]
    pub fn is_indel(self) -> bool {
        !matches!(self, Self::Snp)
    }
}

impl std::fmt::Display for MutationClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Snp => write!(f, "SNP"),
            Self::Insertion => write!(f, "Insertion"),
            Self::Deletion => write!(f, "Deletion"),
        }
    }
}

/// The domain a registry describes.
///
/// The kind decides how raw mixture ids relate to annotation ids; it does not
/// change how the registry is merged or queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SequinKind {
    /// Germline/somatic variant sequins, one `_R` and one `_V` molecule per sequin
    #[default]
    Variant,
    Transcript,
    Metagenome,
    Fusion,
    Ladder,
}

/// Allele suffix for the reference molecule of a variant sequin
pub const REFERENCE_SUFFIX: &str = "_R";

/// Allele suffix for the variant molecule of a variant sequin
pub const VARIANT_SUFFIX: &str = "_V";

impl SequinKind {
    /// Strip the allele suffix from a variant sequin id (`D_1_3_R` -> `D_1_3`).
    /// Other kinds use the id as-is.
    pub fn base_id<'a>(&self, id: &'a str) -> &'a str {
        match self {
            Self::Variant => id
                .strip_suffix(REFERENCE_SUFFIX)
                .or_else(|| id.strip_suffix(VARIANT_SUFFIX))
                .unwrap_or(id),
            _ => id,
        }
    }
}

/// Classification label for a reported variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "TP")]
    TruePositive,
    #[serde(rename = "FP")]
    FalsePositive,
    #[serde(rename = "FN")]
    FalseNegative,
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TruePositive => write!(f, "TP"),
            Self::FalsePositive => write!(f, "FP"),
            Self::FalseNegative => write!(f, "FN"),
        }
    }
}

/// Which part of the genome a chromosome belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// The in-silico chromosome(s) carrying the sequins
    Synthetic,
    /// A recognized background chromosome of the sample genome
    Genomic,
    /// Neither; not tracked for accuracy
    Untracked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixture_parse() {
        assert_eq!(Mixture::parse("Mix A"), Some(Mixture::MixA));
        assert_eq!(Mixture::parse("MixB"), Some(Mixture::MixB));
        assert_eq!(Mixture::parse("mix_f"), Some(Mixture::MixF));
        assert_eq!(Mixture::parse("G"), Some(Mixture::MixG));
        assert_eq!(Mixture::parse("Length"), None);
    }

    #[test]
    fn test_mutation_class_from_alleles() {
        assert_eq!(MutationClass::from_alleles("A", "T"), MutationClass::Snp);
        assert_eq!(MutationClass::from_alleles("A", "AT"), MutationClass::Insertion);
        assert_eq!(MutationClass::from_alleles("AT", "A"), MutationClass::Deletion);
        assert!(MutationClass::Deletion.is_indel());
        assert!(!MutationClass::Snp.is_indel());
    }

    #[test]
    fn test_base_id() {
        assert_eq!(SequinKind::Variant.base_id("D_1_3_R"), "D_1_3");
        assert_eq!(SequinKind::Variant.base_id("D_1_3_V"), "D_1_3");
        assert_eq!(SequinKind::Variant.base_id("D_1_3"), "D_1_3");
        assert_eq!(SequinKind::Metagenome.base_id("M_1_R"), "M_1_R");
    }

    #[test]
    fn test_label_display() {
        assert_eq!(Label::TruePositive.to_string(), "TP");
        assert_eq!(Label::FalseNegative.to_string(), "FN");
    }
}
