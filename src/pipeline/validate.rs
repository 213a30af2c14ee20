use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use crate::constants;
use crate::domain::{LineItem, Warning};
use crate::pipeline::confidence::FieldConfidences;
use crate::pipeline::normalize::{currency, NormalizeFlag, NormalizedFields, NormalizedLineItem};

fn default_low_confidence_threshold() -> f64 {
    0.5
}

fn default_required_fields() -> Vec<String> {
    vec![
        constants::VENDOR_NAME.to_string(),
        constants::DOCUMENT_DATE.to_string(),
        constants::CURRENCY_CODE.to_string(),
        constants::TOTAL.to_string(),
    ]
}

/// Configuration for the cross-field consistency rules.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorConfig {
    /// Fields scoring below this emit a LowConfidence warning
    #[serde(default = "default_low_confidence_threshold")]
    pub low_confidence_threshold: f64,
    /// Fields whose absence emits a MissingField warning
    #[serde(default = "default_required_fields")]
    pub required_fields: Vec<String>,
    /// Per-currency overrides for the totals tolerance; defaults come from
    /// the ISO-4217 minor-unit table
    #[serde(default)]
    pub currency_tolerance: HashMap<String, Decimal>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            low_confidence_threshold: default_low_confidence_threshold(),
            required_fields: default_required_fields(),
            currency_tolerance: HashMap::new(),
        }
    }
}

/// Best-effort corrected monetary fields. The subtotal may be replaced by
/// the line-item sum; the stated total is surfaced as-is, never rewritten.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectedTotals {
    pub subtotal: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub total: Option<Decimal>,
}

/// Cross-checks normalized fields against each other and turns field-level
/// problems into warnings. Never raises a hard failure: the output is
/// always a warning set plus best-effort corrected values.
pub struct ConsistencyValidator {
    config: ValidatorConfig,
}

impl ConsistencyValidator {
    pub fn new() -> Self {
        Self {
            config: ValidatorConfig::default(),
        }
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn validate(
        &self,
        fields: &NormalizedFields,
        line_items: &[NormalizedLineItem],
        confidences: &FieldConfidences,
    ) -> (Vec<Warning>, CorrectedTotals, Vec<LineItem>) {
        let mut warnings = Vec::new();

        collect_flag_warnings(fields, &mut warnings);
        self.collect_missing_required(fields, &mut warnings);

        let items = materialize_line_items(line_items, confidences);
        let totals = self.check_totals(fields, &items, &mut warnings);
        self.collect_low_confidence(fields, confidences, &mut warnings);

        (warnings, totals, items)
    }

    fn collect_missing_required(&self, fields: &NormalizedFields, warnings: &mut Vec<Warning>) {
        for name in &self.config.required_fields {
            let missing = match name.as_str() {
                constants::VENDOR_NAME => fields.vendor_name.value.is_none(),
                constants::DOCUMENT_DATE => fields.document_date.value.is_none(),
                constants::CURRENCY_CODE => fields.currency_code.value.is_none(),
                constants::SUBTOTAL => fields.subtotal.value.is_none(),
                constants::TAX => fields.tax.value.is_none(),
                constants::TOTAL => fields.total.value.is_none(),
                _ => false,
            };
            if missing {
                push_unique(warnings, Warning::MissingField { field: name.clone() });
            }
        }
    }

    /// Tolerance for totals checks: per-currency override, else the
    /// currency's smallest unit, else one cent when the currency itself is
    /// unknown.
    fn tolerance(&self, fields: &NormalizedFields) -> Decimal {
        fields
            .currency_code
            .value
            .as_deref()
            .and_then(|code| {
                self.config
                    .currency_tolerance
                    .get(code)
                    .copied()
                    .or_else(|| currency::tolerance(code))
            })
            .unwrap_or_else(|| Decimal::new(1, 2))
    }

    fn check_totals(
        &self,
        fields: &NormalizedFields,
        items: &[LineItem],
        warnings: &mut Vec<Warning>,
    ) -> CorrectedTotals {
        let tolerance = self.tolerance(fields);
        let tax = fields.tax.value;
        let total = fields.total.value;

        let subtotal = if items.is_empty() {
            fields.subtotal.value
        } else {
            let line_sum: Decimal = items.iter().map(|item| item.line_total).sum();
            match fields.subtotal.value {
                Some(stated) if (line_sum - stated).abs() > tolerance => {
                    // Line-item detail is more granular and less error-prone
                    // than a single OCR'd summary number
                    warn!(
                        %line_sum,
                        %stated,
                        "line-item sum disagrees with stated subtotal, preferring line items"
                    );
                    push_unique(
                        warnings,
                        Warning::InconsistentTotals {
                            expected: line_sum,
                            actual: stated,
                        },
                    );
                    Some(line_sum)
                }
                Some(stated) => Some(stated),
                None => Some(line_sum),
            }
        };

        if let (Some(subtotal), Some(total)) = (subtotal, total) {
            let expected = subtotal + tax.unwrap_or(Decimal::ZERO);
            if (expected - total).abs() > tolerance {
                // The stated total stays; both values travel in the warning
                // for human review
                warn!(%expected, actual = %total, "subtotal + tax disagrees with stated total");
                push_unique(
                    warnings,
                    Warning::InconsistentTotals {
                        expected,
                        actual: total,
                    },
                );
            }
        }

        CorrectedTotals {
            subtotal,
            tax,
            total,
        }
    }

    fn collect_low_confidence(
        &self,
        fields: &NormalizedFields,
        confidences: &FieldConfidences,
        warnings: &mut Vec<Warning>,
    ) {
        let threshold = self.config.low_confidence_threshold;
        // Absent fields are already covered by the missing-field rule
        let scalars = [
            (constants::VENDOR_NAME, fields.vendor_name.value.is_some(), confidences.vendor_name),
            (constants::DOCUMENT_DATE, fields.document_date.value.is_some(), confidences.document_date),
            (constants::CURRENCY_CODE, fields.currency_code.value.is_some(), confidences.currency_code),
            (constants::SUBTOTAL, fields.subtotal.value.is_some(), confidences.subtotal),
            (constants::TAX, fields.tax.value.is_some(), confidences.tax),
            (constants::TOTAL, fields.total.value.is_some(), confidences.total),
        ];
        for (name, present, score) in scalars {
            if present && score < threshold {
                push_unique(
                    warnings,
                    Warning::LowConfidence {
                        field: name.to_string(),
                        score,
                    },
                );
            }
        }

        for (index, &score) in confidences.line_items.iter().enumerate() {
            if score < threshold {
                push_unique(
                    warnings,
                    Warning::LowConfidence {
                        field: format!("line_items[{index}]"),
                        score,
                    },
                );
            }
        }
    }
}

impl Default for ConsistencyValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_flag_warnings(fields: &NormalizedFields, warnings: &mut Vec<Warning>) {
    let flags = [
        fields.vendor_name.flag.as_ref(),
        fields.document_date.flag.as_ref(),
        fields.currency_code.flag.as_ref(),
        fields.subtotal.flag.as_ref(),
        fields.tax.flag.as_ref(),
        fields.total.flag.as_ref(),
    ];
    for flag in flags.into_iter().flatten() {
        match flag {
            NormalizeFlag::AmbiguousDate(raw) | NormalizeFlag::InvalidDate(raw) => {
                push_unique(warnings, Warning::InvalidDate { raw: raw.clone() });
            }
            NormalizeFlag::InvalidCurrency(raw) => {
                push_unique(warnings, Warning::InvalidCurrency { raw: raw.clone() });
            }
            // Malformed numbers surface through the missing-field and
            // low-confidence rules instead
            NormalizeFlag::MalformedNumber(_) => {}
        }
    }
}

/// Turns normalized line items into domain line items, deriving a missing
/// amount from its counterparts where arithmetic allows. Granular detail
/// wins over dropping a display-relevant row; an underivable amount stays
/// zero with component confidence zero, which trips the low-confidence
/// rule.
fn materialize_line_items(
    line_items: &[NormalizedLineItem],
    confidences: &FieldConfidences,
) -> Vec<LineItem> {
    line_items
        .iter()
        .zip(&confidences.line_items)
        .map(|(item, &confidence)| {
            let quantity = item.quantity.value.unwrap_or(Decimal::ONE);
            let line_total = item
                .line_total
                .value
                .or_else(|| item.unit_price.value.map(|price| price * quantity));
            let unit_price = item.unit_price.value.or_else(|| {
                line_total
                    .filter(|_| !quantity.is_zero())
                    .map(|total| total / quantity)
            });
            LineItem {
                description: item.description.value.clone().unwrap_or_default(),
                quantity,
                unit_price: unit_price.unwrap_or(Decimal::ZERO),
                line_total: line_total.unwrap_or(Decimal::ZERO),
                confidence,
            }
        })
        .collect()
}

fn push_unique(warnings: &mut Vec<Warning>, warning: Warning) {
    if !warnings.contains(&warning) {
        warnings.push(warning);
    }
}
