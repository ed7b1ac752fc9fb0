//! Conversion between base units and display amounts.
//!
//! 1,000,000 base units make one display unit. Display values are rounded
//! to two decimal places.

use derive_more::{Display, Error};
use tracing::instrument;

/// Base units per display unit.
pub const BASE_UNITS_PER_TOKEN: u64 = 1_000_000;

/// Base units per displayed hundredth.
const BASE_UNITS_PER_CENT: u64 = BASE_UNITS_PER_TOKEN / 100;

/// Invalid display amount, with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Stake error: {} at {}:{}", message, file, line)]
pub struct StakeError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StakeError {
    /// Creates a new stake error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Formats base units as a display string with trailing zeros trimmed.
///
/// `1_500_000` formats as `"1.5"`, `2_000_000` as `"2"`.
pub fn format_display(amount: u64) -> String {
    let cents = rounded_cents(amount);
    let whole = cents / 100;
    match cents % 100 {
        0 => whole.to_string(),
        frac if frac % 10 == 0 => format!("{}.{}", whole, frac / 10),
        frac => format!("{}.{:02}", whole, frac),
    }
}

/// Converts a display amount to base units.
///
/// # Errors
///
/// Returns [`StakeError`] for negative, non-finite, or unrepresentable amounts.
#[instrument]
pub fn from_display(amount: f64) -> Result<u64, StakeError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(StakeError::new(format!("Invalid stake amount: {}", amount)));
    }
    let base = (amount * BASE_UNITS_PER_TOKEN as f64).round();
    base_units(base).ok_or_else(|| StakeError::new(format!("Stake amount too large: {}", amount)))
}

/// Rounded, non-negative base units as an integer; `None` from 2^64 up.
fn base_units(base: f64) -> Option<u64> {
    // `u64::MAX as f64` is exactly 2^64, one past the largest u64.
    if base >= u64::MAX as f64 {
        None
    } else {
        Some(base as u64)
    }
}

/// Parses a display amount typed by a user.
///
/// # Errors
///
/// Returns [`StakeError`] if the text is not a number or fails [`from_display`].
#[instrument]
pub fn parse_display(text: &str) -> Result<u64, StakeError> {
    let amount: f64 = text
        .trim()
        .parse()
        .map_err(|e| StakeError::new(format!("Invalid stake '{}': {}", text, e)))?;
    from_display(amount)
}

fn rounded_cents(amount: u64) -> u64 {
    let cents = amount / BASE_UNITS_PER_CENT;
    if amount % BASE_UNITS_PER_CENT >= BASE_UNITS_PER_CENT / 2 {
        cents + 1
    } else {
        cents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rounds_to_two_places() {
        assert_eq!(format_display(1_234_567), "1.23");
        assert_eq!(format_display(1_235_000), "1.24");
        assert_eq!(format_display(1_500_000), "1.5");
        assert_eq!(format_display(2_000_000), "2");
        assert_eq!(format_display(100), "0");
    }

    #[test]
    fn test_base_units_boundary() {
        assert_eq!(base_units(2f64.powi(64)), None);
        assert_eq!(base_units(2f64.powi(63)), Some(1 << 63));
        assert!(from_display(2f64.powi(64)).is_err());
    }

    #[test]
    fn test_parse_multiplies_by_one_million() {
        assert_eq!(from_display(1.5).unwrap(), 1_500_000);
        assert_eq!(parse_display(" 0.000001 ").unwrap(), 1);
        assert_eq!(parse_display("10").unwrap(), 10_000_000);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(from_display(-1.0).is_err());
        assert!(from_display(f64::NAN).is_err());
        assert!(parse_display("ten").is_err());
    }
}
