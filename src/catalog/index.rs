use std::collections::BTreeMap;

use crate::core::locus::{Base, Locus};
use crate::core::types::SequinId;

/// A reference region attributed to a sequin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub locus: Locus,
    pub id: SequinId,
}

impl Interval {
    pub fn new(id: SequinId, locus: Locus) -> Self {
        Self { locus, id }
    }
}

/// Intervals of one chromosome, sorted by (start, end, id)
#[derive(Debug, Clone, Default)]
struct ChromIntervals {
    intervals: Vec<Interval>,
    /// The max end position seen up to this index
    max_ends: Vec<Base>,
    /// Ordered, non-overlapping union of all intervals
    merged: Vec<Locus>,
}

impl ChromIntervals {
    fn build(mut intervals: Vec<Interval>) -> Self {
        intervals.sort_by(|a, b| {
            a.locus
                .start
                .cmp(&b.locus.start)
                .then(a.locus.end.cmp(&b.locus.end))
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut max_ends = Vec::with_capacity(intervals.len());
        let mut running = 0;
        for interval in &intervals {
            running = running.max(interval.locus.end);
            max_ends.push(running);
        }

        let mut merged: Vec<Locus> = Vec::new();
        for interval in &intervals {
            match merged.last_mut() {
                Some(last) if last.overlaps(&interval.locus) => last.merge(&interval.locus),
                _ => merged.push(interval.locus),
            }
        }

        Self {
            intervals,
            max_ends,
            merged,
        }
    }

    /// First index whose interval could end at or after `position`.
    /// `max_ends` is non-decreasing, so everything before it ends too early.
    fn first_candidate(&self, position: Base) -> usize {
        self.max_ends.partition_point(|&end| end < position)
    }

    fn overlap(&self, locus: &Locus) -> Option<&Interval> {
        let from = self.first_candidate(locus.start);
        self.intervals[from..]
            .iter()
            .take_while(|i| i.locus.start <= locus.end)
            .find(|i| i.locus.overlaps(locus))
    }

    fn contains(&self, locus: &Locus) -> Option<&Interval> {
        let from = self.first_candidate(locus.end);
        let mut hits = self.intervals[from..]
            .iter()
            .take_while(|i| i.locus.start <= locus.start)
            .filter(|i| i.locus.contains(locus));

        let first = hits.next()?;
        if hits.next().is_some() {
            // Ambiguous: more than one region contains the query
            None
        } else {
            Some(first)
        }
    }
}

/// Per-chromosome interval index over reference regions.
///
/// Queries never fail: a chromosome missing from the index behaves like one
/// without intervals.
///
/// When several intervals overlap a query, [`IntervalIndex::overlap`] returns
/// the one with the leftmost start; remaining ties go to the smallest end, then
/// the smallest sequin id.
#[derive(Debug, Clone, Default)]
pub struct IntervalIndex {
    chroms: BTreeMap<String, ChromIntervals>,
}

impl IntervalIndex {
    /// Build the index from `(chromosome, interval)` pairs
    pub fn build<I>(intervals: I) -> Self
    where
        I: IntoIterator<Item = (String, Interval)>,
    {
        let mut by_chrom: BTreeMap<String, Vec<Interval>> = BTreeMap::new();
        for (chrom, interval) in intervals {
            by_chrom.entry(chrom).or_default().push(interval);
        }

        let chroms = by_chrom
            .into_iter()
            .map(|(chrom, intervals)| (chrom, ChromIntervals::build(intervals)))
            .collect();

        Self { chroms }
    }

    /// Ordered non-overlapping intervals for a chromosome (empty if unknown)
    pub fn merged(&self, chrom: &str) -> &[Locus] {
        self.chroms
            .get(chrom)
            .map(|c| c.merged.as_slice())
            .unwrap_or(&[])
    }

    /// Number of distinct bases covered on a chromosome
    pub fn covered_bases(&self, chrom: &str) -> Base {
        self.merged(chrom).iter().map(Locus::length).sum()
    }

    /// The single interval that fully contains `locus`.
    ///
    /// Returns None when no interval or more than one interval contains it.
    pub fn contains(&self, chrom: &str, locus: &Locus) -> Option<&Interval> {
        self.chroms.get(chrom)?.contains(locus)
    }

    /// The first interval sharing at least one base with `locus`
    pub fn overlap(&self, chrom: &str, locus: &Locus) -> Option<&Interval> {
        self.chroms.get(chrom)?.overlap(locus)
    }

    pub fn has_chromosome(&self, chrom: &str) -> bool {
        self.chroms.contains_key(chrom)
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.chroms.keys().map(String::as_str)
    }

    /// Total number of intervals across all chromosomes
    pub fn len(&self) -> usize {
        self.chroms.values().map(|c| c.intervals.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
