use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

/// Digits plus the separator characters a locale may use inside a number.
static NUMERIC_CORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9.,'\s]+$").unwrap());

/// Adornment allowed around the numeric core: letters (currency codes),
/// currency symbols, whitespace, a sign, accounting parentheses.
static ADORNMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{L}\p{Sc}\s()+-]*$").unwrap());

/// Parses a raw monetary or quantity string into an exact decimal, honoring
/// whichever locale separators the string uses. Returns `None` for anything
/// it cannot read unambiguously as a single number; it never panics.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let text = raw.trim();
    let first = text.find(|c: char| c.is_ascii_digit())?;
    let last = text.rfind(|c: char| c.is_ascii_digit())?;

    // Keep a separator directly before the first digit (".50") in the core
    let mut start = first;
    if start > 0 {
        let prev = text.as_bytes()[start - 1];
        if prev == b'.' || prev == b',' {
            start -= 1;
        }
    }
    let prefix = &text[..start];
    let core = &text[start..=last];
    let suffix = &text[last + 1..];

    if !ADORNMENT.is_match(prefix) || !ADORNMENT.is_match(suffix) {
        return None;
    }
    if !NUMERIC_CORE.is_match(core) {
        return None;
    }
    // A currency code sits apart from the number; letters glued onto the
    // digits are an OCR garble, not a unit
    if suffix.chars().any(char::is_alphabetic) && !suffix.starts_with(char::is_whitespace) {
        return None;
    }
    if prefix.chars().any(char::is_alphabetic) && !prefix.ends_with(char::is_whitespace) {
        return None;
    }

    let negative = prefix.contains('-') || (prefix.contains('(') && suffix.contains(')'));

    // Spaces and apostrophes only ever group digits
    let core: String = core
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\'')
        .collect();

    let digits = resolve_separators(&core)?;
    let amount: Decimal = digits.parse().ok()?;
    Some(if negative { -amount } else { amount })
}

fn resolve_separators(core: &str) -> Option<String> {
    let dots = core.matches('.').count();
    let commas = core.matches(',').count();

    match (dots, commas) {
        (0, 0) => Some(core.to_string()),
        (d, c) if d > 0 && c > 0 => {
            // Both present: whichever occurs last is the decimal separator
            let (decimal_sep, group_sep, decimal_count) = if core.rfind('.') > core.rfind(',') {
                ('.', ',', d)
            } else {
                (',', '.', c)
            };
            if decimal_count > 1 {
                return None;
            }
            Some(core.replace(group_sep, "").replace(decimal_sep, "."))
        }
        (1, 0) => Some(single_separator(core, '.')),
        (0, 1) => Some(single_separator(core, ',')),
        (_, 0) => grouped(core, '.'),
        (0, _) => grouped(core, ','),
        _ => None,
    }
}

/// One occurrence of one separator: decimal unless it reads as a thousands
/// group ("1,500"), which needs exactly three trailing digits and a short
/// non-zero leading group.
fn single_separator(core: &str, sep: char) -> String {
    let (before, after) = core.split_once(sep).expect("separator counted above");
    let grouping = after.len() == 3 && !before.is_empty() && before != "0" && before.len() <= 3;
    if grouping {
        format!("{before}{after}")
    } else if before.is_empty() {
        format!("0.{after}")
    } else {
        format!("{before}.{after}")
    }
}

/// A repeated single separator can only be grouping; every group after the
/// first must be exactly three digits, otherwise the string holds multiple
/// decimal separators and is rejected.
fn grouped(core: &str, sep: char) -> Option<String> {
    let mut groups = core.split(sep);
    let head = groups.next()?;
    if head.is_empty() || head.len() > 3 {
        return None;
    }
    let mut digits = String::from(head);
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        digits.push_str(group);
    }
    Some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_plain_decimal() {
        assert_eq!(parse_amount("125.00"), Some(dec("125.00")));
        assert_eq!(parse_amount("1.5"), Some(dec("1.5")));
        assert_eq!(parse_amount("42"), Some(dec("42")));
    }

    #[test]
    fn test_us_grouping() {
        assert_eq!(parse_amount("1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("12,345,678.90"), Some(dec("12345678.90")));
    }

    #[test]
    fn test_european_grouping() {
        assert_eq!(parse_amount("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("1 234,56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("1'234.50"), Some(dec("1234.50")));
        assert_eq!(parse_amount("2,50"), Some(dec("2.50")));
    }

    #[test]
    fn test_currency_adornment() {
        assert_eq!(parse_amount("$1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("12.00 EUR"), Some(dec("12.00")));
        assert_eq!(parse_amount("€ 9,99"), Some(dec("9.99")));
        assert_eq!(parse_amount("-5.00"), Some(dec("-5.00")));
        assert_eq!(parse_amount("(5.00)"), Some(dec("-5.00")));
    }

    #[test]
    fn test_bare_thousands_group() {
        assert_eq!(parse_amount("1,500"), Some(dec("1500")));
        assert_eq!(parse_amount("1.500"), Some(dec("1500")));
        // Three decimals, not a group, when the lead is long or zero
        assert_eq!(parse_amount("1234,567"), Some(dec("1234.567")));
        assert_eq!(parse_amount("0.500"), Some(dec("0.500")));
    }

    #[test]
    fn test_leading_separator() {
        assert_eq!(parse_amount(".50"), Some(dec("0.50")));
        assert_eq!(parse_amount("$.99"), Some(dec("0.99")));
    }

    #[test]
    fn test_rejects_multiple_decimal_separators() {
        assert_eq!(parse_amount("12.34.56"), None);
        assert_eq!(parse_amount("1,23,4"), None);
        assert_eq!(parse_amount("12.34,56.78"), None);
    }

    #[test]
    fn test_rejects_non_numeric_tokens() {
        assert_eq!(parse_amount("12a3"), None);
        assert_eq!(parse_amount("1oo.oo"), None);
        assert_eq!(parse_amount("1oo"), None);
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("total"), None);
        assert_eq!(parse_amount("12%"), None);
    }
}
