//! Input normalization and format checks for registry numbers and postal codes.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref POSTAL_CODE: Regex = Regex::new(r"^\d{5}-\d{4}$").unwrap();
    static ref REGISTRY_NUMBER: Regex = Regex::new(r"^\d{10}$").unwrap();
}

const REGISTRY_DIGITS: usize = 10;
const POSTAL_DIGITS: usize = 9;
const POSTAL_PREFIX_DIGITS: usize = 5;

/// Keep digits only, capped at 10.
pub fn normalize_registry_number(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(REGISTRY_DIGITS)
        .collect()
}

/// Keep digits only (at most 9) and insert the hyphen after the fifth digit
/// once there is something to put after it.
///
/// # Example
/// ```
/// use onboarding_core::common::normalize_postal_code;
///
/// assert_eq!(normalize_postal_code("123456789"), "12345-6789");
/// assert_eq!(normalize_postal_code("12345"), "12345");
/// ```
pub fn normalize_postal_code(input: &str) -> String {
    let digits: String = input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(POSTAL_DIGITS)
        .collect();

    if digits.len() > POSTAL_PREFIX_DIGITS {
        format!(
            "{}-{}",
            &digits[..POSTAL_PREFIX_DIGITS],
            &digits[POSTAL_PREFIX_DIGITS..]
        )
    } else {
        digits
    }
}

/// First five digits of a postal code, if it has that many.
pub fn postal_prefix(input: &str) -> Option<String> {
    let prefix: String = input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(POSTAL_PREFIX_DIGITS)
        .collect();
    (prefix.len() == POSTAL_PREFIX_DIGITS).then_some(prefix)
}

/// `NNNNN-NNNN`
pub fn is_valid_postal_code(value: &str) -> bool {
    POSTAL_CODE.is_match(value)
}

pub fn is_valid_registry_number(value: &str) -> bool {
    REGISTRY_NUMBER.is_match(value)
}
