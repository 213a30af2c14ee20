/// Field key constants for the prediction service's structured output.
/// These keys tie the pipeline, configuration, and tests to one contract;
/// a change in the service schema should only touch this file.

// Scalar fields, one RawField each
pub const VENDOR_NAME: &str = "vendor_name";
pub const DOCUMENT_DATE: &str = "document_date";
pub const CURRENCY_CODE: &str = "currency_code";
pub const SUBTOTAL: &str = "subtotal";
pub const TAX: &str = "tax";
pub const TOTAL: &str = "total";

// Composite keys with their own sub-structure
pub const LINE_ITEMS: &str = "line_items";
pub const LOCALE: &str = "locale";

/// Mandatory sub-keys every line-item entry must carry. An entry missing
/// any of these is a structural failure, not a field warning.
pub const LINE_ITEM_KEYS: [&str; 4] = ["description", "quantity", "unit_price", "line_total"];
