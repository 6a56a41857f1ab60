use std::path::Path;
use vfisc_core::config::SellerProfile;
use vfisc_core::source::SourceDocument;

#[allow(dead_code)]
pub fn test_seller() -> SellerProfile {
    SellerProfile {
        name: "Acme Mauritius Ltd".into(),
        trade_name: "Acme Mauritius Ltd".into(),
        tan: "27124193".into(),
        brn: "C11106429".into(),
        business_addr: "Port Louis".into(),
        business_phone_no: "2302909090".into(),
        ebs_counter_no: "".into(),
        cashier_id: "SYSTEM".into(),
    }
}

/// Load a webhook-shaped fixture and return the pieces the mapping layer
/// consumes: counter, identifier, and the parsed document body.
#[allow(dead_code)]
pub fn load_webhook_fixture(name: &str) -> (String, String, SourceDocument) {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read fixture {}: {e}", path.display()));
    let payload: serde_json::Value = serde_json::from_str(&text).expect("fixture is valid JSON");
    let invoice_id = payload["invoice_id"].as_str().expect("invoice_id").to_string();
    let invoice_number = payload["invoice_number"]
        .as_str()
        .expect("invoice_number")
        .to_string();
    let document =
        SourceDocument::from_value(payload["invoice_data"].clone()).expect("parse invoice_data");
    (invoice_id, invoice_number, document)
}
