use crate::domain::{ExpenseRecord, LineItem, Warning};
use crate::pipeline::normalize::NormalizedFields;
use crate::pipeline::validate::CorrectedTotals;

/// Assembles the final immutable record. Purely construction: validation
/// already happened upstream and `overall_confidence` arrives from the
/// aggregator unchanged. Deliberately stateless and timestamp-free so the
/// same prediction always builds the same record.
pub struct ExpenseRecordBuilder;

impl ExpenseRecordBuilder {
    pub fn build(
        fields: &NormalizedFields,
        totals: CorrectedTotals,
        line_items: Vec<LineItem>,
        warnings: Vec<Warning>,
        overall_confidence: f64,
    ) -> ExpenseRecord {
        ExpenseRecord {
            vendor_name: fields.vendor_name.value.clone(),
            document_date: fields.document_date.value,
            currency_code: fields.currency_code.value.clone(),
            line_items,
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
            overall_confidence,
            warnings,
        }
    }
}
