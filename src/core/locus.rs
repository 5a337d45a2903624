use serde::{Deserialize, Serialize};

/// 1-based genomic position
pub type Base = u64;

/// A closed coordinate interval `[start, end]` on a chromosome
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Locus {
    pub start: Base,
    pub end: Base,
}

impl Locus {
    /// Create a locus; `start` and `end` are swapped if given in reverse
    pub fn new(start: Base, end: Base) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// A single-base locus
    pub fn point(position: Base) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Number of bases covered, both ends inclusive
    pub fn length(&self) -> Base {
        self.end - self.start + 1
    }

    /// Does this locus fully contain `other`?
    pub fn contains(&self, other: &Locus) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Do the two loci share at least one base?
    pub fn overlaps(&self, other: &Locus) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Number of shared bases (0 when disjoint)
    pub fn overlap(&self, other: &Locus) -> Base {
        if self.overlaps(other) {
            self.end.min(other.end) - self.start.max(other.start) + 1
        } else {
            0
        }
    }

    /// Extend this locus to cover `other`
    pub fn merge(&mut self, other: &Locus) {
        self.start = self.start.min(other.start);
        self.end = self.end.max(other.end);
    }
}

impl std::fmt::Display for Locus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
