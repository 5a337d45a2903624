//! Thin adapters turning on-disk formats into normalized records.
//!
//! This module provides parsers for:
//!
//! - **Mixture tables**: sequin concentrations per mixture
//! - **BED annotations**: sequin coordinates on the synthetic (and genomic) chromosomes
//! - **VCF files**: catalogued and called variants, plain or gzip-compressed
//! - **Tabular calls**: the canonical `Chrom Position Ref Allele ...` format
//!
//! Variant parsers stream records lazily as `Result<Variant, ParseError>`; a
//! malformed line is an error for that line only, so callers can skip it and
//! keep reading.
//!
//! ## Example
//!
//! ```rust
//! use sequin_qc::parsing::vcf::parse_vcf_text;
//!
//! let vcf = "##fileformat=VCFv4.2\n\
//!            #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
//!            chrev1\t100\tD_1_1\tA\tG,T\t50\tPASS\t.\n";
//! let variants = parse_vcf_text(vcf).unwrap();
//! assert_eq!(variants.len(), 2);
//! ```

pub mod bed;
pub mod mixture;
pub mod tabular;
pub mod vcf;

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

use crate::core::variant::Variant;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

/// Formats accepted for called variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InputFormat {
    Vcf,
    Tabular,
}

impl InputFormat {
    /// Guess the format from the file name
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        let name = name.strip_suffix(".gz").unwrap_or(&name);

        if name.ends_with(".vcf") {
            Some(Self::Vcf)
        } else if name.ends_with(".txt") || name.ends_with(".tsv") || name.ends_with(".tab") {
            Some(Self::Tabular)
        } else {
            None
        }
    }
}

/// Open a text file for buffered reading, decompressing `.gz` files
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened.
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead>, ParseError> {
    let file = File::open(path)?;
    let is_gzip = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));

    if is_gzip {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// A lazily parsed stream of variants
pub type VariantStream = Box<dyn Iterator<Item = Result<Variant, ParseError>>>;

/// Stream called variants from a file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened, or
/// `ParseError::UnsupportedFormat` if no format was given and none can be
/// guessed from the file name.
pub fn read_variants(path: &Path, format: Option<InputFormat>) -> Result<VariantStream, ParseError> {
    let format = format
        .or_else(|| InputFormat::detect(path))
        .ok_or_else(|| ParseError::UnsupportedFormat(path.display().to_string()))?;

    let reader = open_reader(path)?;
    Ok(match format {
        InputFormat::Vcf => Box::new(vcf::VcfReader::new(reader)),
        InputFormat::Tabular => Box::new(tabular::TabularReader::new(reader)),
    })
}

/// Data lines of a text stream with 1-based line numbers; blank lines and
/// `#` comments are skipped
pub(crate) struct DataLines<R> {
    lines: std::io::Lines<R>,
    line_num: usize,
}

impl<R: BufRead> DataLines<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
        }
    }
}

impl<R: BufRead> Iterator for DataLines<R> {
    type Item = Result<(usize, String), ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_num += 1;

            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed.trim().is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Some(Ok((self.line_num, trimmed.to_string())));
        }
    }
}
