use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

use crate::core::types::MutationClass;

/// Safely convert usize to f64 for ratio calculations
///
/// This function explicitly handles the precision loss that occurs when converting
/// usize to f64 on 64-bit platforms. Variant counts are well within the safe
/// range of f64 mantissa precision.
#[inline]
pub(crate) fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// `numerator / denominator`, NaN when the denominator is zero
#[inline]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        f64::NAN
    } else {
        count_to_f64(numerator) / count_to_f64(denominator)
    }
}

/// Confusion counts for one class of variants.
///
/// `nr` is the number of catalogued reference variants, whether detected or
/// not. `nr == tp + fn` always holds; constructing a confusion with more true
/// positives than reference variants is a bug and panics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confusion {
    pub tp: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub nr: usize,
}

impl Confusion {
    /// Build from true positives, false positives and the reference count;
    /// false negatives are derived.
    ///
    /// # Panics
    ///
    /// Panics if `tp > nr`.
    pub fn from_counts(tp: usize, fp: usize, nr: usize) -> Self {
        assert!(
            tp <= nr,
            "{tp} true positives exceed {nr} reference variants"
        );
        let confusion = Self {
            tp,
            fp,
            fn_: nr - tp,
            nr,
        };
        confusion.check();
        confusion
    }

    /// Assert `nr == tp + fn` and `nr >= fn`.
    ///
    /// # Panics
    ///
    /// Panics when the counts are inconsistent.
    pub fn check(&self) {
        assert_eq!(
            self.nr,
            self.tp + self.fn_,
            "nr must equal tp + fn ({self:?})"
        );
        assert!(self.nr >= self.fn_, "nr must be at least fn ({self:?})");
    }

    /// `tp / nr`
    pub fn sensitivity(&self) -> f64 {
        ratio(self.tp, self.nr)
    }

    /// `tp / (tp + fp)`
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// Harmonic mean of sensitivity and precision
    pub fn f1(&self) -> f64 {
        let sn = self.sensitivity();
        let pc = self.precision();
        let sum = sn + pc;
        if sum == 0.0 || sum.is_nan() {
            f64::NAN
        } else {
            2.0 * sn * pc / sum
        }
    }

    /// `1 - precision`
    pub fn fdr(&self) -> f64 {
        1.0 - self.precision()
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            sensitivity: self.sensitivity(),
            precision: self.precision(),
            f1: self.f1(),
            fdr: self.fdr(),
        }
    }
}

impl AddAssign for Confusion {
    fn add_assign(&mut self, other: Self) {
        self.tp += other.tp;
        self.fp += other.fp;
        self.fn_ += other.fn_;
        self.nr += other.nr;
        self.check();
    }
}

/// Ratios derived from a [`Confusion`]; NaN when undefined
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub sensitivity: f64,
    pub precision: f64,
    pub f1: f64,
    pub fdr: f64,
}

/// Confusion counts split by mutation class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassConfusion {
    pub total: Confusion,
    pub snp: Confusion,
    pub indel: Confusion,
}

impl ClassConfusion {
    /// Build from per-class (tp, fp, nr); the total is their sum
    pub fn from_counts(snp: (usize, usize, usize), indel: (usize, usize, usize)) -> Self {
        let snp = Confusion::from_counts(snp.0, snp.1, snp.2);
        let indel = Confusion::from_counts(indel.0, indel.1, indel.2);
        let mut total = snp;
        total += indel;
        Self { total, snp, indel }
    }

    pub fn get(&self, class: MutationClass) -> &Confusion {
        if class.is_indel() {
            &self.indel
        } else {
            &self.snp
        }
    }
}

impl AddAssign for ClassConfusion {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.snp += other.snp;
        self.indel += other.indel;
    }
}
