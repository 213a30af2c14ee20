use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use receipt_ingest::domain::{ExpenseRecord, Warning};
use receipt_ingest::pipeline::ReceiptPipeline;

fn field(value: &str, confidence: f64) -> Value {
    json!({ "value": value, "confidence": confidence })
}

fn line_item(description: &str, quantity: &str, unit_price: &str, line_total: &str) -> Value {
    json!({
        "description": field(description, 0.92),
        "quantity": field(quantity, 0.9),
        "unit_price": field(unit_price, 0.9),
        "line_total": field(line_total, 0.94),
    })
}

/// A clean US receipt: consistent totals, high confidence everywhere.
fn acme_payload() -> Value {
    json!({
        "vendor_name": field("Acme Ltd", 0.97),
        "document_date": field("03/04/2024", 0.93),
        "currency_code": field("USD", 0.99),
        "subtotal": field("125.00", 0.91),
        "total": field("125.00", 0.96),
        "locale": { "language": "en", "country": "US", "currency": "USD", "confidence": 0.9 },
        "line_items": [
            line_item("Blue widget", "2", "50.00", "100.00"),
            line_item("Gadget", "1", "25.00", "25.00"),
        ],
    })
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[test]
fn test_clean_receipt_builds_without_warnings() {
    let record = ReceiptPipeline::new().process(&acme_payload()).unwrap();

    assert!(record.is_clean(), "unexpected warnings: {:?}", record.warnings);
    assert_eq!(record.vendor_name.as_deref(), Some("Acme Ltd"));
    assert_eq!(record.document_date, NaiveDate::from_ymd_opt(2024, 4, 3));
    assert_eq!(record.currency_code.as_deref(), Some("USD"));
    assert_eq!(record.subtotal, Some(dec("125.00")));
    assert_eq!(record.total, Some(dec("125.00")));
    assert_eq!(record.line_items.len(), 2);
}

#[test]
fn test_warning_free_records_satisfy_sum_invariants() {
    let record = ReceiptPipeline::new().process(&acme_payload()).unwrap();
    assert!(record.is_clean());

    let line_sum: Decimal = record.line_items.iter().map(|item| item.line_total).sum();
    assert_eq!(record.subtotal, Some(line_sum));
    assert_eq!(
        record.total,
        record.subtotal.map(|s| s + record.tax.unwrap_or(Decimal::ZERO))
    );
}

#[test]
fn test_line_item_sum_corrects_disagreeing_subtotal() {
    let payload = json!({
        "vendor_name": field("Acme Ltd", 0.97),
        "document_date": field("2024-04-03", 0.93),
        "currency_code": field("USD", 0.99),
        "subtotal": field("90.00", 0.85),
        "total": field("100.00", 0.96),
        "line_items": [
            line_item("Blue widget", "2", "40.00", "80.00"),
            line_item("Gadget", "1", "20.00", "20.00"),
        ],
    });
    let record = ReceiptPipeline::new().process(&payload).unwrap();

    assert_eq!(
        record.warnings,
        vec![Warning::InconsistentTotals {
            expected: dec("100.00"),
            actual: dec("90.00"),
        }]
    );
    assert_eq!(record.subtotal, Some(dec("100.00")));
    assert_eq!(record.total, Some(dec("100.00")));
}

#[test]
fn test_missing_total_still_builds_flagged_record() {
    let mut payload = acme_payload();
    payload.as_object_mut().unwrap().remove("total");
    let baseline = ReceiptPipeline::new().process(&acme_payload()).unwrap();
    let record = ReceiptPipeline::new().process(&payload).unwrap();

    assert_eq!(record.total, None);
    assert!(record.warnings.contains(&Warning::MissingField {
        field: "total".to_string()
    }));
    // The composite pays for the lost required field
    assert!(record.overall_confidence < baseline.overall_confidence);
}

#[test]
fn test_empty_payload_is_a_parse_failure() {
    let failure = ReceiptPipeline::new().process(&json!({})).unwrap_err();
    assert!(failure.reason.contains("empty"));
    assert!(ReceiptPipeline::new().process(&json!(null)).is_err());
}

#[test]
fn test_pipeline_is_idempotent() {
    let pipeline = ReceiptPipeline::new();
    let first = pipeline.process(&acme_payload()).unwrap();
    let second = pipeline.process(&acme_payload()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_lowering_one_confidence_never_raises_the_composite() {
    let baseline = ReceiptPipeline::new().process(&acme_payload()).unwrap();

    let mut payload = acme_payload();
    payload["vendor_name"] = field("Acme Ltd", 0.25);
    let lowered = ReceiptPipeline::new().process(&payload).unwrap();

    assert!(lowered.overall_confidence < baseline.overall_confidence);
    assert!(lowered.warnings.contains(&Warning::LowConfidence {
        field: "vendor_name".to_string(),
        score: 0.25,
    }));
}

#[test]
fn test_malformed_amounts_degrade_instead_of_failing() {
    let mut payload = acme_payload();
    payload["total"] = field("one hundred", 0.8);
    let record = ReceiptPipeline::new().process(&payload).unwrap();

    assert_eq!(record.total, None);
    assert!(record.warnings.contains(&Warning::MissingField {
        field: "total".to_string()
    }));
}

#[test]
fn test_unknown_currency_is_flagged_not_fatal() {
    let mut payload = acme_payload();
    payload["currency_code"] = field("XYZ", 0.9);
    payload
        .as_object_mut()
        .unwrap()
        .remove("locale");
    let record = ReceiptPipeline::new().process(&payload).unwrap();

    assert_eq!(record.currency_code, None);
    assert!(record.warnings.contains(&Warning::InvalidCurrency {
        raw: "XYZ".to_string()
    }));
}

#[test]
fn test_record_round_trips_through_disk() -> Result<()> {
    let record = ReceiptPipeline::new().process(&acme_payload()).unwrap();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("record.json");
    std::fs::write(&path, serde_json::to_string_pretty(&record)?)?;

    let restored: ExpenseRecord = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(restored, record);
    Ok(())
}
