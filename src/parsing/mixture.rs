//! Parser for sequin mixture tables.
//!
//! The first row names the columns: a sequin id, its length, then one column
//! per mixture. Columns may be separated by tabs or commas.
//!
//! ```text
//! ID        Length  Mix A    Mix B
//! D_1_1_R   1031    100.0    50.0
//! D_1_1_V   1031    3.125    1.5625
//! ```
//!
//! Every cell of a mixture column yields one [`MixtureRecord`]; missing cells
//! (`NA`, `.`) are left out.

use std::io::Read;
use std::path::Path;

use crate::catalog::registry::MixtureRecord;
use crate::core::locus::Base;
use crate::core::types::{Mixture, SequinId};
use crate::parsing::{open_reader, ParseError};
use crate::utils::validation::parse_optional_f64;

/// Parse a mixture table file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::InvalidFormat` if the table is malformed.
pub fn parse_mixture_file(path: &Path) -> Result<Vec<MixtureRecord>, ParseError> {
    let mut content = String::new();
    open_reader(path)?.read_to_string(&mut content)?;
    parse_mixture_text(&content)
}

fn split_row(line: &str) -> Vec<&str> {
    let delimiter = if line.contains('\t') { '\t' } else { ',' };
    line.split(delimiter).map(str::trim).collect()
}

/// Parse mixture table text
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if the header names no mixture column,
/// a row is short, or a length/concentration is not a number.
pub fn parse_mixture_text(text: &str) -> Result<Vec<MixtureRecord>, ParseError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

    let (header_num, header) = lines
        .next()
        .ok_or_else(|| ParseError::InvalidFormat("Mixture table is empty".to_string()))?;
    let columns = split_row(header);

    if columns.len() < 3 {
        return Err(ParseError::InvalidFormat(format!(
            "Mixture header on line {header_num} needs an id, a length and at least one mixture column"
        )));
    }

    let mixtures = columns[2..]
        .iter()
        .map(|name| {
            Mixture::parse(name).ok_or_else(|| {
                ParseError::InvalidFormat(format!(
                    "Unknown mixture column '{name}' on line {header_num}"
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut records = Vec::new();
    for (line_num, line) in lines {
        let fields = split_row(line);
        if fields.len() < columns.len() {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has {} fields, expected {}",
                fields.len(),
                columns.len()
            )));
        }

        let id = SequinId::new(fields[0]);
        let length: Base = fields[1].parse().map_err(|_| {
            ParseError::InvalidFormat(format!(
                "Invalid length on line {line_num}: '{}'",
                fields[1]
            ))
        })?;

        for (mixture, value) in mixtures.iter().zip(&fields[2..]) {
            let concentration = parse_optional_f64(value).ok_or_else(|| {
                ParseError::InvalidFormat(format!(
                    "Invalid concentration on line {line_num}: '{value}'"
                ))
            })?;
            if concentration.is_nan() {
                continue;
            }
            records.push(MixtureRecord {
                id: id.clone(),
                length,
                concentration,
                mixture: *mixture,
            });
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixture_table() {
        let text = "ID\tLength\tMix A\tMix B\n\
                    D_1_1_R\t1031\t100.0\t50.0\n\
                    D_1_1_V\t1031\t3.125\tNA\n";

        let records = parse_mixture_text(text).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id.as_str(), "D_1_1_R");
        assert_eq!(records[0].mixture, Mixture::MixA);
        assert_eq!(records[1].mixture, Mixture::MixB);
        assert!((records[2].concentration - 3.125).abs() < f64::EPSILON);
        assert_eq!(records[2].length, 1031);
    }

    #[test]
    fn test_parse_comma_separated() {
        let text = "ID,Length,MixA\nL1,500,2.5\n";
        let records = parse_mixture_text(text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mixture, Mixture::MixA);
    }

    #[test]
    fn test_unknown_mixture_column() {
        let text = "ID\tLength\tDilution\nL1\t500\t2.5\n";
        let err = parse_mixture_text(text).unwrap_err();
        assert!(err.to_string().contains("Dilution"));
    }

    #[test]
    fn test_malformed_rows() {
        assert!(parse_mixture_text("").is_err());
        assert!(parse_mixture_text("ID\tLength\n").is_err());
        assert!(parse_mixture_text("ID\tLength\tMixA\nL1\tlong\t1.0\n").is_err());
        assert!(parse_mixture_text("ID\tLength\tMixA\nL1\t500\n").is_err());
        assert!(parse_mixture_text("ID\tLength\tMixA\nL1\t500\tlots\n").is_err());
    }
}
