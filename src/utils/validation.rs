//! Centralized validation and helper functions.

use crate::core::locus::Base;
use crate::core::types::MutationClass;

/// Values treated as "not reported" in numeric input columns
const MISSING_VALUES: [&str; 4] = [".", "NA", "nan", ""];

/// Validate that a string is a non-empty allele made only of IUPAC nucleotide
/// letters or `*`.
///
/// # Examples
///
/// ```
/// use sequin_qc::utils::validation::is_valid_allele;
///
/// assert!(is_valid_allele("ACGT"));
/// assert!(is_valid_allele("n"));
/// assert!(!is_valid_allele(""));
/// assert!(!is_valid_allele("<DEL>"));
/// ```
#[must_use]
pub fn is_valid_allele(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| {
            matches!(
                c.to_ascii_uppercase(),
                'A' | 'C' | 'G' | 'T' | 'N' | 'R' | 'Y' | 'S' | 'W' | 'K' | 'M' | 'B' | 'D'
                    | 'H' | 'V' | '*'
            )
        })
}

/// Normalize an allele to uppercase.
/// Returns None if the input is not a valid allele.
#[must_use]
pub fn normalize_allele(s: &str) -> Option<String> {
    let s = s.trim();
    if is_valid_allele(s) {
        Some(s.to_ascii_uppercase())
    } else {
        None
    }
}

/// Parse an optional numeric column; missing markers (`.`, `NA`) become NaN.
/// Returns None only when the value is present but not a number.
#[must_use]
pub fn parse_optional_f64(s: &str) -> Option<f64> {
    let s = s.trim();
    if MISSING_VALUES.contains(&s) {
        return Some(f64::NAN);
    }
    s.parse().ok()
}

/// Render a number for tabular output, `NA` when not a finite value.
#[must_use]
pub fn format_na(value: f64) -> String {
    if value.is_finite() {
        format!("{value}")
    } else {
        "NA".to_string()
    }
}

/// Compute a stable key for a catalogued variant.
///
/// The key is the first eight bytes (big-endian) of the MD5 digest of
/// `"{id}\t{class}\t{start}"`, so it is identical across runs, replicates and
/// platforms.
#[must_use]
pub fn compute_variant_key(id: &str, class: MutationClass, start: Base) -> u64 {
    let digest = md5::compute(format!("{id}\t{class}\t{start}").as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.0[..8]);
    u64::from_be_bytes(bytes)
}
