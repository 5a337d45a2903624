//! Parser for BED coordinate annotations.
//!
//! Only the first four columns are read: `chrom`, `start`, `end`, `name`.
//! BED intervals are 0-based and half-open; they are converted to the
//! 1-based closed [`Locus`] used everywhere else (`chrev1 99 200` becomes
//! `100-200`). `track` and `browser` lines are skipped.

use std::io::Read;
use std::path::Path;

use crate::catalog::registry::AnnotationRecord;
use crate::core::locus::{Base, Locus};
use crate::core::types::SequinId;
use crate::parsing::{open_reader, ParseError};

/// Parse a BED file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::InvalidFormat` for a malformed line.
pub fn parse_bed_file(path: &Path) -> Result<Vec<AnnotationRecord>, ParseError> {
    let mut content = String::new();
    open_reader(path)?.read_to_string(&mut content)?;
    parse_bed_text(&content)
}

/// Parse BED text
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a line has fewer than four columns,
/// unreadable coordinates, or an empty interval.
pub fn parse_bed_text(text: &str) -> Result<Vec<AnnotationRecord>, ParseError> {
    let mut records = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.trim().is_empty()
            || line.starts_with('#')
            || line.starts_with("track")
            || line.starts_with("browser")
        {
            continue;
        }

        // Line numbers in errors are 1-based for user friendliness
        let line_num = i + 1;
        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        if fields.len() < 4 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has fewer than 4 fields"
            )));
        }

        let coordinate = |value: &str| -> Result<Base, ParseError> {
            value.parse().map_err(|_| {
                ParseError::InvalidFormat(format!(
                    "Invalid coordinate on line {line_num}: '{value}'"
                ))
            })
        };
        let start = coordinate(fields[1])?;
        let end = coordinate(fields[2])?;

        if end <= start {
            return Err(ParseError::InvalidFormat(format!(
                "Empty interval on line {line_num}: {start}-{end}"
            )));
        }

        records.push(AnnotationRecord {
            id: SequinId::new(fields[3]),
            chrom: fields[0].to_string(),
            locus: Locus::new(start + 1, end),
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bed_converts_coordinates() {
        let text = "track name=sequins\n\
                    chrev1\t99\t200\tD_1_1\t0\t+\n\
                    chr21\t0\t1\tGS_1\n";

        let records = parse_bed_text(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.as_str(), "D_1_1");
        assert_eq!(records[0].locus, Locus::new(100, 200));
        assert_eq!(records[1].chrom, "chr21");
        assert_eq!(records[1].locus, Locus::point(1));
    }

    #[test]
    fn test_parse_bed_errors() {
        assert!(parse_bed_text("chrev1\t1\t10\n").is_err());
        assert!(parse_bed_text("chrev1\tx\t10\tS\n").is_err());

        let err = parse_bed_text("# comment\nchrev1\t10\t10\tS\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
