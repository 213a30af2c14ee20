use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::constants;
use crate::pipeline::prediction::{RawField, RawLocale, RawPrediction};

pub mod currency;
pub mod date;
pub mod money;

/// Declared semantic kind of an inbound field, selecting the normalization
/// path applied to its raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Money,
    Quantity,
    Date,
    Text,
    CurrencyCode,
}

/// A raw field converted into a canonical typed value. `value` is `None`
/// when normalization failed; the original field travels along as `source`
/// so lineage back to the prediction is never lost.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedField<T> {
    pub value: Option<T>,
    pub confidence: f64,
    pub flag: Option<NormalizeFlag>,
    pub source: RawField,
}

impl<T> NormalizedField<T> {
    /// Confidence as seen by downstream aggregation: a field that failed
    /// normalization carries no trust regardless of the model's raw score.
    pub fn effective_confidence(&self) -> f64 {
        if self.value.is_some() {
            self.confidence
        } else {
            0.0
        }
    }
}

/// Warning-eligible conditions noticed during normalization and carried
/// forward for the validator to classify.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizeFlag {
    AmbiguousDate(String),
    InvalidDate(String),
    InvalidCurrency(String),
    MalformedNumber(String),
}

/// Converts heterogeneous raw field representations into canonical typed
/// values. Never fails: malformed input yields a null value with the
/// original confidence attached, and later stages decide materiality.
pub struct FieldNormalizer {
    locale_known: bool,
}

impl FieldNormalizer {
    pub fn new(locale: Option<&RawLocale>) -> Self {
        Self {
            locale_known: locale.is_some(),
        }
    }

    pub fn text(&self, raw: &RawField) -> NormalizedField<String> {
        let value = raw
            .raw_value
            .as_deref()
            .map(collapse_whitespace)
            .filter(|s| !s.is_empty());
        NormalizedField {
            value,
            confidence: raw.confidence,
            flag: None,
            source: raw.clone(),
        }
    }

    pub fn decimal(&self, raw: &RawField, kind: FieldKind) -> NormalizedField<Decimal> {
        let (value, flag) = match raw.raw_value.as_deref() {
            None => (None, None),
            Some(text) => match money::parse_amount(text) {
                Some(amount) => (Some(amount), None),
                None => {
                    debug!(?kind, raw = text, "numeric normalization failed");
                    (None, Some(NormalizeFlag::MalformedNumber(text.to_string())))
                }
            },
        };
        NormalizedField {
            value,
            confidence: raw.confidence,
            flag,
            source: raw.clone(),
        }
    }

    pub fn date(&self, raw: &RawField) -> NormalizedField<NaiveDate> {
        let (value, flag) = match raw.raw_value.as_deref() {
            None => (None, None),
            Some(text) => match date::parse_date(text, self.locale_known) {
                Some(parsed) if parsed.ambiguous => (
                    Some(parsed.value),
                    Some(NormalizeFlag::AmbiguousDate(text.to_string())),
                ),
                Some(parsed) => (Some(parsed.value), None),
                None => {
                    debug!(raw = text, "date normalization failed");
                    (None, Some(NormalizeFlag::InvalidDate(text.to_string())))
                }
            },
        };
        NormalizedField {
            value,
            confidence: raw.confidence,
            flag,
            source: raw.clone(),
        }
    }

    pub fn currency(&self, raw: &RawField) -> NormalizedField<String> {
        let (value, flag) = match raw.raw_value.as_deref() {
            None => (None, None),
            Some(text) => {
                let code = text.trim().to_uppercase();
                if currency::is_known(&code) {
                    (Some(code), None)
                } else {
                    debug!(raw = text, "unknown currency code");
                    (None, Some(NormalizeFlag::InvalidCurrency(text.to_string())))
                }
            }
        };
        NormalizedField {
            value,
            confidence: raw.confidence,
            flag,
            source: raw.clone(),
        }
    }
}

/// The document's scalar fields after normalization.
#[derive(Debug, Clone)]
pub struct NormalizedFields {
    pub vendor_name: NormalizedField<String>,
    pub document_date: NormalizedField<NaiveDate>,
    pub currency_code: NormalizedField<String>,
    pub subtotal: NormalizedField<Decimal>,
    pub tax: NormalizedField<Decimal>,
    pub total: NormalizedField<Decimal>,
}

impl NormalizedFields {
    pub fn from_prediction(prediction: &RawPrediction, normalizer: &FieldNormalizer) -> Self {
        let mut currency_raw = prediction.field(constants::CURRENCY_CODE);
        // The service often reports the currency inside the locale block
        // rather than as its own field
        if currency_raw.raw_value.is_none() {
            if let Some(code) = prediction.locale.as_ref().and_then(|l| l.currency.as_ref()) {
                currency_raw = RawField {
                    raw_value: Some(code.clone()),
                    confidence: prediction.locale.as_ref().map(|l| l.confidence).unwrap_or(0.0),
                    bounding_region: None,
                };
            }
        }

        Self {
            vendor_name: normalizer.text(&prediction.field(constants::VENDOR_NAME)),
            document_date: normalizer.date(&prediction.field(constants::DOCUMENT_DATE)),
            currency_code: normalizer.currency(&currency_raw),
            subtotal: normalizer.decimal(&prediction.field(constants::SUBTOTAL), FieldKind::Money),
            tax: normalizer.decimal(&prediction.field(constants::TAX), FieldKind::Money),
            total: normalizer.decimal(&prediction.field(constants::TOTAL), FieldKind::Money),
        }
    }
}

/// One line item after normalization, component fields kept separate so the
/// validator can derive missing amounts and score the weakest attribute.
#[derive(Debug, Clone)]
pub struct NormalizedLineItem {
    pub description: NormalizedField<String>,
    pub quantity: NormalizedField<Decimal>,
    pub unit_price: NormalizedField<Decimal>,
    pub line_total: NormalizedField<Decimal>,
}

pub fn normalize_line_items(
    prediction: &RawPrediction,
    normalizer: &FieldNormalizer,
) -> Vec<NormalizedLineItem> {
    prediction
        .line_items
        .iter()
        .map(|item| NormalizedLineItem {
            description: normalizer.text(&item.description),
            quantity: normalizer.decimal(&item.quantity, FieldKind::Quantity),
            unit_price: normalizer.decimal(&item.unit_price, FieldKind::Money),
            line_total: normalizer.decimal(&item.line_total, FieldKind::Money),
        })
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: &str, confidence: f64) -> RawField {
        RawField {
            raw_value: Some(value.to_string()),
            confidence,
            bounding_region: None,
        }
    }

    #[test]
    fn test_malformed_money_keeps_confidence_but_no_value() {
        let normalizer = FieldNormalizer::new(None);
        let field = normalizer.decimal(&raw("not a number", 0.83), FieldKind::Money);
        assert_eq!(field.value, None);
        assert_eq!(field.confidence, 0.83);
        assert_eq!(field.effective_confidence(), 0.0);
        assert!(matches!(field.flag, Some(NormalizeFlag::MalformedNumber(_))));
    }

    #[test]
    fn test_text_is_trimmed_and_collapsed() {
        let normalizer = FieldNormalizer::new(None);
        let field = normalizer.text(&raw("  Acme   Ltd \n", 0.9));
        assert_eq!(field.value.as_deref(), Some("Acme Ltd"));

        let blank = normalizer.text(&raw("   ", 0.9));
        assert_eq!(blank.value, None);
    }

    #[test]
    fn test_unknown_currency_is_flagged() {
        let normalizer = FieldNormalizer::new(None);
        let field = normalizer.currency(&raw("ZZZ", 0.95));
        assert_eq!(field.value, None);
        assert!(matches!(field.flag, Some(NormalizeFlag::InvalidCurrency(_))));

        let lower = normalizer.currency(&raw("usd", 0.95));
        assert_eq!(lower.value.as_deref(), Some("USD"));
    }

    #[test]
    fn test_ambiguous_date_flag_depends_on_locale() {
        let field = raw("03/04/2024", 0.9);

        let without_hint = FieldNormalizer::new(None).date(&field);
        assert!(matches!(without_hint.flag, Some(NormalizeFlag::AmbiguousDate(_))));

        let locale = RawLocale {
            country: Some("US".to_string()),
            currency: Some("USD".to_string()),
            ..Default::default()
        };
        let with_hint = FieldNormalizer::new(Some(&locale)).date(&field);
        assert_eq!(with_hint.flag, None);
        assert_eq!(
            with_hint.value,
            chrono::NaiveDate::from_ymd_opt(2024, 4, 3)
        );
    }

    #[test]
    fn test_currency_falls_back_to_locale_block() {
        let payload = json!({
            "vendor_name": { "value": "Acme", "confidence": 0.9 },
            "locale": { "language": "en", "country": "US", "currency": "USD", "confidence": 0.88 }
        });
        let prediction = RawPrediction::from_value(&payload).unwrap();
        let normalizer = FieldNormalizer::new(prediction.locale.as_ref());
        let fields = NormalizedFields::from_prediction(&prediction, &normalizer);
        assert_eq!(fields.currency_code.value.as_deref(), Some("USD"));
        assert_eq!(fields.currency_code.confidence, 0.88);
    }
}
