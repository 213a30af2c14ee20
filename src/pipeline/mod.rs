use serde_json::Value;
use tracing::{debug, info};

use crate::domain::ExpenseRecord;
use crate::error::ParseFailure;

pub mod builder;
pub mod confidence;
pub mod normalize;
pub mod prediction;
pub mod validate;

use builder::ExpenseRecordBuilder;
use confidence::ConfidenceAggregator;
use normalize::{normalize_line_items, FieldNormalizer, NormalizedFields};
use prediction::RawPrediction;
use validate::{ConsistencyValidator, ValidatorConfig};

/// The full response-to-domain-model pipeline: structural gate → field
/// normalization → confidence aggregation → consistency validation →
/// record assembly. One synchronous call per document; no shared state
/// across invocations, so concurrent documents need no coordination.
pub struct ReceiptPipeline {
    aggregator: ConfidenceAggregator,
    validator: ConsistencyValidator,
}

impl ReceiptPipeline {
    pub fn new() -> Self {
        Self::with_config(ValidatorConfig::default())
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self {
            aggregator: ConfidenceAggregator::new(),
            validator: ConsistencyValidator::with_config(config),
        }
    }

    /// Processes one raw prediction payload into an expense record, or a
    /// `ParseFailure` when the payload shape itself is unusable. Field
    /// problems never fail the call; they come back as warnings on the
    /// record.
    pub fn process(&self, payload: &Value) -> Result<ExpenseRecord, ParseFailure> {
        let prediction = RawPrediction::from_value(payload)?;
        let normalizer = FieldNormalizer::new(prediction.locale.as_ref());

        let fields = NormalizedFields::from_prediction(&prediction, &normalizer);
        let line_items = normalize_line_items(&prediction, &normalizer);
        debug!(line_items = line_items.len(), "normalization complete");

        let confidences = self.aggregator.aggregate(&fields, &line_items);
        let (warnings, totals, items) = self.validator.validate(&fields, &line_items, &confidences);

        let record =
            ExpenseRecordBuilder::build(&fields, totals, items, warnings, confidences.composite);
        info!(
            warnings = record.warnings.len(),
            confidence = record.overall_confidence,
            "expense record built"
        );
        Ok(record)
    }
}

impl Default for ReceiptPipeline {
    fn default() -> Self {
        Self::new()
    }
}
