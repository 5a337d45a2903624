//! Parser for the canonical tab-separated variant format.
//!
//! ```text
//! Chrom   Position  Ref  Allele  ReadsR  ReadsV  QualR  QualV  Pvalue
//! chrev1  1001      A    G       120     40      35.1   33.0   0.0001
//! ```
//!
//! The header row is optional; without it the columns are read in the order
//! above. With it, columns are found by name and may come in any order. Only
//! `Chrom`, `Position`, `Ref` and `Allele` are required.

use std::io::BufRead;

use crate::core::locus::Base;
use crate::core::variant::Variant;
use crate::parsing::{DataLines, ParseError};
use crate::utils::validation::{normalize_allele, parse_optional_f64};

/// Column names in their default order
const COLUMNS: [&str; 9] = [
    "Chrom", "Position", "Ref", "Allele", "ReadsR", "ReadsV", "QualR", "QualV", "Pvalue",
];

const REQUIRED: usize = 4;

/// Column index per field in [`COLUMNS`] order
#[derive(Debug, Clone, PartialEq, Eq)]
struct Layout([Option<usize>; 9]);

impl Default for Layout {
    fn default() -> Self {
        Self(std::array::from_fn(Some))
    }
}

impl Layout {
    /// Layout of a header row, None if the row is not a header
    fn from_header(fields: &[&str]) -> Option<Self> {
        if !fields
            .first()
            .is_some_and(|f| f.trim().eq_ignore_ascii_case(COLUMNS[0]))
        {
            return None;
        }

        let columns = std::array::from_fn(|i| {
            fields
                .iter()
                .position(|f| f.trim().eq_ignore_ascii_case(COLUMNS[i]))
        });
        Some(Self(columns))
    }

    fn get<'a>(&self, fields: &[&'a str], column: usize) -> Option<&'a str> {
        self.0[column].and_then(|i| fields.get(i).copied())
    }
}

/// Streaming reader for the tabular format
pub struct TabularReader<R> {
    lines: DataLines<R>,
    layout: Option<Layout>,
}

impl<R: BufRead> TabularReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: DataLines::new(reader),
            layout: None,
        }
    }
}

impl<R: BufRead> Iterator for TabularReader<R> {
    type Item = Result<Variant, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (line_num, line) = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            let fields: Vec<&str> = line.split('\t').collect();

            if self.layout.is_none() {
                if let Some(header) = Layout::from_header(&fields) {
                    if let Some(missing) = (0..REQUIRED).find(|&i| header.0[i].is_none()) {
                        return Some(Err(ParseError::InvalidFormat(format!(
                            "Header on line {line_num} lacks the {} column",
                            COLUMNS[missing]
                        ))));
                    }
                    self.layout = Some(header);
                    continue;
                }
            }

            let layout = self.layout.get_or_insert_with(Layout::default);
            return Some(parse_fields(&fields, layout, line_num));
        }
    }
}

/// Parse tabular text, failing on the first malformed line
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` with the 1-based line number of the
/// first malformed record.
pub fn parse_tabular_text(text: &str) -> Result<Vec<Variant>, ParseError> {
    TabularReader::new(text.as_bytes()).collect()
}

fn parse_fields(fields: &[&str], layout: &Layout, line_num: usize) -> Result<Variant, ParseError> {
    let invalid = |column: usize, value: &str| {
        ParseError::InvalidFormat(format!(
            "Invalid {} on line {line_num}: '{value}'",
            COLUMNS[column]
        ))
    };
    let required = |column: usize| {
        layout
            .get(fields, column)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ParseError::InvalidFormat(format!(
                    "Line {line_num} has no {} value",
                    COLUMNS[column]
                ))
            })
    };

    let chrom = required(0)?;
    let position = required(1)?;
    let position: Base = position
        .parse()
        .ok()
        .filter(|&p| p > 0)
        .ok_or_else(|| invalid(1, position))?;
    let reference = required(2)?;
    let reference = normalize_allele(reference).ok_or_else(|| invalid(2, reference))?;
    let alternate = required(3)?;
    let alternate = normalize_allele(alternate).ok_or_else(|| invalid(3, alternate))?;

    let depth = |column: usize| -> Result<u64, ParseError> {
        match layout.get(fields, column).map(str::trim) {
            None => Ok(0),
            Some(value) => match parse_optional_f64(value) {
                Some(v) if v.is_nan() => Ok(0),
                _ => value.parse().map_err(|_| invalid(column, value)),
            },
        }
    };
    let number = |column: usize| -> Result<f64, ParseError> {
        match layout.get(fields, column) {
            None => Ok(f64::NAN),
            Some(value) => parse_optional_f64(value).ok_or_else(|| invalid(column, value)),
        }
    };

    let mut variant =
        Variant::new(chrom, position, reference, alternate).with_depths(depth(4)?, depth(5)?);
    variant.quality_ref = number(6)?;
    variant.quality_alt = number(7)?;
    variant.p_value = number(8)?;

    Ok(variant)
}
