use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Measuring conventions differ by country; an Australian cup is 250 ml.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    #[default]
    US,
    AU,
}

/// Convert `amount` of `unit` to grams. Units without a known factor return
/// the amount unchanged; results beyond the decimal range are capped.
pub fn to_grams(amount: Decimal, unit: &str, region: Region) -> Decimal {
    match grams_per_unit(unit, region) {
        Some(factor) => amount.saturating_mul(Decimal::from(factor)),
        None => amount,
    }
}

fn grams_per_unit(unit: &str, region: Region) -> Option<u32> {
    match (region, unit.trim().to_lowercase().as_str()) {
        (Region::US, "cup") => Some(240),
        (Region::US, "tablespoon") => Some(15),
        (Region::AU, "cup") => Some(250),
        (Region::AU, "tablespoon") => Some(20),
        _ => None,
    }
}
