use chrono::NaiveDate;

/// Outcome of date normalization before it is wrapped in a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub value: NaiveDate,
    /// Set when the string reads validly under both day-first and
    /// month-first permutations and nothing external settles it.
    pub ambiguous: bool,
}

const ISO_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DAY_FIRST_FORMATS: [&str; 3] = ["%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y"];
const MONTH_FIRST_FORMAT: &str = "%m/%d/%Y";

/// Parses a raw date string against the closed set of formats the service
/// emits: ISO-8601 plus its day/month/year permutations. The service
/// documents day-first for slash dates, so an ambiguous read resolves
/// day-first; it is flagged only when the prediction carried no locale
/// hint, since a detected locale means the convention was applied
/// consistently.
pub fn parse_date(raw: &str, locale_known: bool) -> Option<ParsedDate> {
    let text = raw.trim();
    // Tolerate a time suffix on ISO-ish strings
    let text = text.split(['T', ' ']).next().unwrap_or(text);

    for format in ISO_FORMATS {
        if let Ok(value) = NaiveDate::parse_from_str(text, format) {
            return Some(ParsedDate {
                value,
                ambiguous: false,
            });
        }
    }

    for format in DAY_FIRST_FORMATS {
        if let Ok(value) = NaiveDate::parse_from_str(text, format) {
            let month_first_reads_differently = format == "%d/%m/%Y"
                && NaiveDate::parse_from_str(text, MONTH_FIRST_FORMAT)
                    .map(|alt| alt != value)
                    .unwrap_or(false);
            return Some(ParsedDate {
                value,
                ambiguous: month_first_reads_differently && !locale_known,
            });
        }
    }

    NaiveDate::parse_from_str(text, MONTH_FIRST_FORMAT)
        .ok()
        .map(|value| ParsedDate {
            value,
            ambiguous: false,
        })
}
