use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single purchased item as read off the receipt. Order is document order
/// (top to bottom); it carries no meaning for the totals but matters for
/// display and review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    /// Trust in the line as a whole: the minimum over its component fields.
    pub confidence: f64,
}

/// Field-level problems surfaced on an otherwise-built record. Structural
/// problems are a `ParseFailure` instead and never reach this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Warning {
    /// A required field could not be read from the prediction
    MissingField { field: String },
    /// A field was read but its confidence is below the configured floor
    LowConfidence { field: String, score: f64 },
    /// Two monetary views of the document disagree beyond the currency
    /// tolerance; both values are surfaced for human review
    InconsistentTotals { expected: Decimal, actual: Decimal },
    /// The raw date did not normalize cleanly (unparseable or ambiguous)
    InvalidDate { raw: String },
    /// The raw currency code is not a known ISO-4217 code
    InvalidCurrency { raw: String },
}

/// The validated, confidence-annotated expense entity returned to the
/// caller. Immutable once built and owned by the caller.
///
/// When `warnings` is empty the monetary invariants hold within the
/// currency tolerance: `total == subtotal + tax` and
/// `subtotal == sum(line_items.line_total)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub vendor_name: Option<String>,
    pub document_date: Option<NaiveDate>,
    pub currency_code: Option<String>,
    pub line_items: Vec<LineItem>,
    pub subtotal: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub total: Option<Decimal>,
    /// Weighted composite over the document's fields, from the aggregator
    pub overall_confidence: f64,
    /// Document-ordered, deduplicated
    pub warnings: Vec<Warning>,
}

impl ExpenseRecord {
    /// Whether the record can flow into downstream accounting without
    /// manual review.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
