//! Parser for VCF data lines.
//!
//! Each data line yields one [`Variant`] per ALT allele. Fields read:
//!
//! | Source          | Variant field                         |
//! |-----------------|---------------------------------------|
//! | `CHROM`, `POS`  | chromosome, locus start (1-based)     |
//! | `ID`            | sequin id (`.` when absent)           |
//! | `QUAL`          | quality                               |
//! | `FORMAT`/sample `AD` (or INFO `AD`) | ref/alt read depths |
//! | INFO `PVAL`     | p-value                               |
//! | INFO `QR`, `QA` | reference/alternate allele quality    |
//!
//! Missing values (`.`) become NaN. Header lines are skipped.

use std::collections::VecDeque;
use std::io::BufRead;
use std::path::Path;

use crate::core::locus::Base;
use crate::core::variant::Variant;
use crate::parsing::{open_reader, DataLines, ParseError};
use crate::utils::validation::{normalize_allele, parse_optional_f64};

const MIN_FIELDS: usize = 8;

/// Streaming VCF reader
pub struct VcfReader<R> {
    lines: DataLines<R>,
    pending: VecDeque<Variant>,
}

impl<R: BufRead> VcfReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: DataLines::new(reader),
            pending: VecDeque::new(),
        }
    }
}

impl<R: BufRead> Iterator for VcfReader<R> {
    type Item = Result<Variant, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(variant) = self.pending.pop_front() {
                return Some(Ok(variant));
            }

            let (line_num, line) = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };

            match parse_vcf_line(&line, line_num) {
                Ok(variants) => self.pending.extend(variants),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Open a VCF file (plain or `.gz`) for streaming
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened.
pub fn read_vcf_file(path: &Path) -> Result<VcfReader<Box<dyn BufRead>>, ParseError> {
    Ok(VcfReader::new(open_reader(path)?))
}

/// Parse a whole VCF text, failing on the first malformed line
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` with the 1-based line number of the
/// first malformed record.
pub fn parse_vcf_text(text: &str) -> Result<Vec<Variant>, ParseError> {
    VcfReader::new(text.as_bytes()).collect()
}

/// Parse one VCF data line into one variant per ALT allele
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if the line has too few columns, a
/// position that is not a positive integer, or an invalid allele.
pub fn parse_vcf_line(line: &str, line_num: usize) -> Result<Vec<Variant>, ParseError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < MIN_FIELDS {
        return Err(ParseError::InvalidFormat(format!(
            "Line {line_num} has {} fields, expected at least {MIN_FIELDS}",
            fields.len()
        )));
    }

    let chrom = fields[0];
    let position: Base = fields[1]
        .trim()
        .parse()
        .ok()
        .filter(|&p| p > 0)
        .ok_or_else(|| {
            ParseError::InvalidFormat(format!(
                "Invalid position on line {line_num}: '{}'",
                fields[1]
            ))
        })?;

    let reference = normalize_allele(fields[3]).ok_or_else(|| {
        ParseError::InvalidFormat(format!(
            "Invalid REF allele on line {line_num}: '{}'",
            fields[3]
        ))
    })?;

    let quality = parse_optional_f64(fields[5]).ok_or_else(|| {
        ParseError::InvalidFormat(format!(
            "Invalid QUAL on line {line_num}: '{}'",
            fields[5]
        ))
    })?;

    let info = Info::parse(fields[7]);
    let depths = sample_depths(&fields).or_else(|| info.get("AD").map(parse_depths));

    let mut variants = Vec::new();
    for (i, alt) in fields[4].split(',').enumerate() {
        let alternate = normalize_allele(alt).ok_or_else(|| {
            ParseError::InvalidFormat(format!("Invalid ALT allele on line {line_num}: '{alt}'"))
        })?;

        let mut variant =
            Variant::new(chrom, position, reference.clone(), alternate).with_id(fields[2].trim());
        variant.quality = quality;
        variant.p_value = info.number("PVAL", line_num)?;
        variant.quality_ref = info.number("QR", line_num)?;
        variant.quality_alt = info.number("QA", line_num)?;

        if let Some(depths) = &depths {
            let ref_depth = depths.first().copied().unwrap_or(0);
            let alt_depth = depths.get(i + 1).copied().unwrap_or(0);
            variant = variant.with_depths(ref_depth, alt_depth);
        }

        variants.push(variant);
    }

    Ok(variants)
}

/// `key=value` pairs of the INFO column
struct Info<'a> {
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> Info<'a> {
    fn parse(column: &'a str) -> Self {
        let pairs = column
            .split(';')
            .filter_map(|entry| entry.split_once('='))
            .collect();
        Self { pairs }
    }

    fn get(&self, key: &str) -> Option<&'a str> {
        self.pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    /// Numeric value of a key; NaN when absent or missing
    fn number(&self, key: &str, line_num: usize) -> Result<f64, ParseError> {
        match self.get(key) {
            None => Ok(f64::NAN),
            Some(value) => parse_optional_f64(value).ok_or_else(|| {
                ParseError::InvalidFormat(format!(
                    "Invalid INFO {key} on line {line_num}: '{value}'"
                ))
            }),
        }
    }
}

/// `AD` of the first sample, if the line has one
fn sample_depths(fields: &[&str]) -> Option<Vec<u64>> {
    let format = fields.get(8)?;
    let sample = fields.get(9)?;
    let index = format.split(':').position(|key| key == "AD")?;
    sample.split(':').nth(index).map(parse_depths)
}

/// Comma-separated depths; unreadable entries count as zero
fn parse_depths(value: &str) -> Vec<u64> {
    value
        .split(',')
        .map(|d| d.trim().parse().unwrap_or(0))
        .collect()
}
