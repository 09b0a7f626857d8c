//! VIN entry.
//!
//! A VIN arrives either typed by hand or decoded from a barcode scan. Both
//! paths go through [`normalize`], which only insists that something was
//! entered; a VIN that does not look like a 17-character VIN is kept but
//! logged.

use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::error::{Error, Result};

/// 17 characters from the VIN alphabet (no I, O or Q).
const VIN_PATTERN: &str = r"^[A-HJ-NPR-Z0-9]{17}$";

fn vin_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VIN_PATTERN).expect("VIN pattern is valid"))
}

/// Clean up an entered VIN.
///
/// Strips all whitespace and upper-cases the rest.
///
/// # Errors
///
/// Returns [`Error::MissingField`] if nothing but whitespace was entered.
pub fn normalize(raw: &str) -> Result<String> {
    let vin: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if vin.is_empty() {
        return Err(Error::MissingField { field: "VIN" });
    }

    if !looks_valid(&vin) {
        warn!("VIN {} does not look like a 17-character VIN", vin);
    }

    Ok(vin)
}

/// Check whether a normalized VIN has the standard shape.
#[must_use]
pub fn looks_valid(vin: &str) -> bool {
    vin_regex().is_match(vin)
}
