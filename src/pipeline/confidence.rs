use serde::Serialize;

use crate::pipeline::normalize::{NormalizedFields, NormalizedLineItem};

/// Per-field and composite trust scores for one document.
#[derive(Debug, Clone, Serialize)]
pub struct FieldConfidences {
    pub vendor_name: f64,
    pub document_date: f64,
    pub currency_code: f64,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
    /// One score per line item, document order
    pub line_items: Vec<f64>,
    pub composite: f64,
}

/// Weighted trust aggregation over a record's fields. A pure function of
/// its inputs; a field that failed normalization contributes zero
/// regardless of the model's raw score.
pub struct ConfidenceAggregator {
    required_weight: f64,
    optional_weight: f64,
}

impl Default for ConfidenceAggregator {
    fn default() -> Self {
        Self {
            required_weight: 2.0,
            optional_weight: 1.0,
        }
    }
}

impl ConfidenceAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aggregate(
        &self,
        fields: &NormalizedFields,
        line_items: &[NormalizedLineItem],
    ) -> FieldConfidences {
        let vendor_name = fields.vendor_name.effective_confidence();
        let document_date = fields.document_date.effective_confidence();
        let currency_code = fields.currency_code.effective_confidence();
        let subtotal = fields.subtotal.effective_confidence();
        let tax = fields.tax.effective_confidence();
        let total = fields.total.effective_confidence();

        let line_scores: Vec<f64> = line_items.iter().map(line_item_confidence).collect();

        let mut weighted = vec![
            (self.required_weight, vendor_name),
            (self.required_weight, document_date),
            (self.required_weight, currency_code),
            (self.required_weight, total),
            (self.optional_weight, subtotal),
            (self.optional_weight, tax),
        ];
        if !line_scores.is_empty() {
            let mean = line_scores.iter().sum::<f64>() / line_scores.len() as f64;
            weighted.push((self.optional_weight, mean));
        }

        let total_weight: f64 = weighted.iter().map(|(weight, _)| weight).sum();
        let composite =
            weighted.iter().map(|(weight, score)| weight * score).sum::<f64>() / total_weight;

        FieldConfidences {
            vendor_name,
            document_date,
            currency_code,
            subtotal,
            tax,
            total,
            line_items: line_scores,
            composite,
        }
    }
}

/// A line item is only as trustworthy as its weakest attribute.
pub fn line_item_confidence(item: &NormalizedLineItem) -> f64 {
    item.description
        .effective_confidence()
        .min(item.quantity.effective_confidence())
        .min(item.unit_price.effective_confidence())
        .min(item.line_total.effective_confidence())
}
