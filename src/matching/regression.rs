//! Log-scale linear regression between expected and observed abundance.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

use crate::core::types::SequinId;
use crate::matching::scoring::count_to_f64;

/// One (expected, observed) pair contributed by an accepted match
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub id: SequinId,
    pub expected: f64,
    pub observed: f64,
}

/// Running collection of (expected, observed) pairs
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinearAccumulator {
    pub points: Vec<Point>,
}

impl LinearAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: SequinId, expected: f64, observed: f64) {
        self.points.push(Point {
            id,
            expected,
            observed,
        });
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Ordinary least squares of `log2(observed)` on `log2(expected)`.
    ///
    /// Pairs where either value is non-finite or not strictly positive are
    /// left out of the fit.
    pub fn fit_log2(&self) -> LinearFit {
        let (x, y): (Vec<f64>, Vec<f64>) = self
            .points
            .iter()
            .filter(|p| usable(p.expected) && usable(p.observed))
            .map(|p| (p.expected.log2(), p.observed.log2()))
            .unzip();

        LinearFit::fit(&x, &y)
    }
}

fn usable(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Coefficients and ANOVA decomposition of a simple linear fit.
///
/// Every statistic is NaN when it is undefined for the data: fewer than two
/// points or no spread in x. A flat response leaves r, F and p undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    /// Number of pairs used
    pub n: usize,

    pub slope: f64,
    pub intercept: f64,

    /// Pearson correlation
    pub r: f64,
    pub r2: f64,

    /// F statistic and its upper-tail p-value
    pub f: f64,
    pub p: f64,

    pub ssm: f64,
    pub ssm_df: usize,
    pub sse: f64,
    pub sse_df: usize,
    pub sst: f64,
    pub sst_df: usize,
}

impl LinearFit {
    fn undefined(n: usize) -> Self {
        Self {
            n,
            slope: f64::NAN,
            intercept: f64::NAN,
            r: f64::NAN,
            r2: f64::NAN,
            f: f64::NAN,
            p: f64::NAN,
            ssm: f64::NAN,
            ssm_df: 1,
            sse: f64::NAN,
            sse_df: n.saturating_sub(2),
            sst: f64::NAN,
            sst_df: n.saturating_sub(1),
        }
    }

    /// Fit `y = intercept + slope * x`
    pub fn fit(x: &[f64], y: &[f64]) -> Self {
        let n = x.len().min(y.len());
        if n < 2 {
            return Self::undefined(n);
        }

        let nf = count_to_f64(n);
        let mean_x = x[..n].iter().sum::<f64>() / nf;
        let mean_y = y[..n].iter().sum::<f64>() / nf;

        let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
        for (xi, yi) in x.iter().zip(y) {
            let dx = xi - mean_x;
            let dy = yi - mean_y;
            sxx += dx * dx;
            syy += dy * dy;
            sxy += dx * dy;
        }

        if sxx == 0.0 {
            return Self::undefined(n);
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        let r = if syy == 0.0 {
            f64::NAN
        } else {
            sxy / (sxx * syy).sqrt()
        };

        let sst = syy;
        let ssm = slope * sxy;
        let sse = (sst - ssm).max(0.0);
        let sse_df = n - 2;

        // A flat response leaves nothing to explain: F is 0/0
        let (f, p) = if sse_df == 0 || sst == 0.0 {
            (f64::NAN, f64::NAN)
        } else if sse == 0.0 {
            (f64::INFINITY, 0.0)
        } else {
            let f = ssm / (sse / count_to_f64(sse_df));
            let p = FisherSnedecor::new(1.0, count_to_f64(sse_df))
                .map_or(f64::NAN, |dist| dist.sf(f));
            (f, p)
        };

        Self {
            n,
            slope,
            intercept,
            r,
            r2: r * r,
            f,
            p,
            ssm,
            ssm_df: 1,
            sse,
            sse_df,
            sst,
            sst_df: n - 1,
        }
    }
}

/// Lowest expected abundance among accepted matches
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionLimit {
    pub id: Option<SequinId>,
    pub abundance: Option<f64>,
}

impl DetectionLimit {
    /// Record a detection; the first of several equal minima is kept.
    /// Non-finite abundances are ignored.
    pub fn observe(&mut self, id: &SequinId, abundance: f64) {
        if !abundance.is_finite() {
            return;
        }
        if self.abundance.map_or(true, |current| abundance < current) {
            self.id = Some(id.clone());
            self.abundance = Some(abundance);
        }
    }
}
