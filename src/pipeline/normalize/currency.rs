use std::collections::HashMap;

use once_cell::sync::Lazy;
use rust_decimal::Decimal;

/// ISO-4217 codes with their minor-unit exponents. Curated to the active
/// codes a receipt service realistically emits; unknown codes are rejected
/// by normalization rather than defaulted.
static MINOR_UNITS: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    let mut table = HashMap::new();

    const TWO_DECIMAL: [&str; 48] = [
        "USD", "EUR", "GBP", "CAD", "AUD", "NZD", "CHF", "SEK", "NOK", "DKK", "PLN", "CZK",
        "HUF", "RON", "BGN", "TRY", "RUB", "UAH", "ILS", "AED", "SAR", "QAR", "ZAR", "EGP",
        "NGN", "KES", "GHS", "MXN", "BRL", "ARS", "COP", "PEN", "UYU", "INR", "PKR", "BDT",
        "LKR", "NPR", "CNY", "HKD", "TWD", "SGD", "MYR", "THB", "PHP", "IDR", "MAD", "BWP",
    ];
    const ZERO_DECIMAL: [&str; 15] = [
        "JPY", "KRW", "VND", "CLP", "ISK", "PYG", "UGX", "RWF", "GNF", "KMF", "DJF", "BIF",
        "XOF", "XAF", "XPF",
    ];
    const THREE_DECIMAL: [&str; 7] = ["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];

    for code in TWO_DECIMAL {
        table.insert(code, 2);
    }
    for code in ZERO_DECIMAL {
        table.insert(code, 0);
    }
    for code in THREE_DECIMAL {
        table.insert(code, 3);
    }
    table
});

pub fn is_known(code: &str) -> bool {
    MINOR_UNITS.contains_key(code)
}

pub fn minor_units(code: &str) -> Option<u32> {
    MINOR_UNITS.get(code).copied()
}

/// Smallest representable amount in the currency, used as the tolerance for
/// totals cross-checks: 0.01 for two-decimal codes, exactly zero for
/// zero-decimal codes.
pub fn tolerance(code: &str) -> Option<Decimal> {
    minor_units(code).map(|units| {
        if units == 0 {
            Decimal::ZERO
        } else {
            Decimal::new(1, units)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert!(is_known("USD"));
        assert!(is_known("JPY"));
        assert!(is_known("KWD"));
        assert!(!is_known("ZZZ"));
        assert!(!is_known("usd")); // lookups are uppercase-only
    }

    #[test]
    fn test_tolerance_follows_minor_units() {
        assert_eq!(tolerance("USD"), Some(Decimal::new(1, 2)));
        assert_eq!(tolerance("JPY"), Some(Decimal::ZERO));
        assert_eq!(tolerance("BHD"), Some(Decimal::new(1, 3)));
        assert_eq!(tolerance("ZZZ"), None);
    }
}
