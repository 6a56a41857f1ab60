//! Mapping from source documents to the MRA fiscal invoice schema.
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use thiserror::Error;

use crate::config::SellerProfile;
use crate::document::{Buyer, FiscalInvoice, InvoiceItem, InvoiceTypeDesc, PersonType, Seller, TaxCode};
use crate::source::{SourceDocument, SourceLineItem};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("missing required source field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid invoice date/time: {value:?}, expected an ISO datetime such as 2025-09-15T12:00:00+0400")]
    InvalidDateTime { value: String },
    #[error("document must contain at least one line item")]
    NoLineItems,
    #[error("proforma must contain at least 2 line items, got {count}")]
    ProformaItemCount { count: usize },
    #[error("reference invoice not found; provide a reference number or populate invoices_credited with the original invoice identifier")]
    MissingReference,
    #[error("invoice {identifier} does not meet the VAT mix requirement (vatable={found_vatable}, non-vatable={found_non_vatable})")]
    VatMixViolation {
        identifier: String,
        found_vatable: bool,
        found_non_vatable: bool,
    },
}

/// Which document shape to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Standard invoice, all line items.
    Standard,
    /// Standard invoice reduced to its first line item.
    StandardSingleItem,
    /// Credit note.
    CreditNote,
    /// Debit note.
    DebitNote,
    /// Proforma, mapped from an estimate.
    Proforma,
}

impl DocumentKind {
    fn type_desc(self) -> InvoiceTypeDesc {
        match self {
            DocumentKind::Standard | DocumentKind::StandardSingleItem => InvoiceTypeDesc::STD,
            DocumentKind::CreditNote => InvoiceTypeDesc::CRN,
            DocumentKind::DebitNote => InvoiceTypeDesc::DRN,
            DocumentKind::Proforma => InvoiceTypeDesc::PRF,
        }
    }

    fn is_note(self) -> bool {
        matches!(self, DocumentKind::CreditNote | DocumentKind::DebitNote)
    }

    fn default_reason(self) -> &'static str {
        match self {
            DocumentKind::CreditNote => "Credit Note issued",
            DocumentKind::DebitNote => "Correction / Debit Note",
            _ => "",
        }
    }
}

/// Caller-supplied overrides for a single mapping run.
#[derive(Debug, Clone, Default)]
pub struct MappingOptions {
    /// Explicit reference to the original invoice, used by credit and
    /// debit notes ahead of anything found in the source document.
    pub reference_override: Option<String>,
    /// Explicit note reason, used ahead of the source document notes.
    pub reason_override: Option<String>,
    /// Require each document to carry at least one VATable and one
    /// non-VATable line (batch submissions).
    pub require_vat_mix: bool,
}

/// Convert a source datetime into the gateway `yyyyMMdd HH:mm:ss` form.
///
/// ISO-like inputs keep their stated wall-clock time, whatever the zone
/// suffix says. A bare date maps to midnight. Anything else is rejected.
pub fn fiscal_datetime(raw: &str) -> Result<String, MappingError> {
    let raw = raw.trim();
    if let Some(prefix) = raw.get(..19) {
        let prefix = prefix.replacen('T', " ", 1);
        if let Ok(dt) = NaiveDateTime::parse_from_str(&prefix, "%Y-%m-%d %H:%M:%S") {
            return Ok(dt.format("%Y%m%d %H:%M:%S").to_string());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(format!("{} 00:00:00", date.format("%Y%m%d")));
    }
    Err(MappingError::InvalidDateTime { value: raw.to_string() })
}

/// Format a transmission timestamp, 17 characters, local wall-clock.
pub fn format_request_datetime(now: DateTime<Local>) -> String {
    now.format("%Y%m%d %H:%M:%S").to_string()
}

/// Classify a line item into an MRA tax code.
///
/// Looks at the first tax entry: 15% or a name containing "15" is
/// standard-rated, 0% or a zero-rate name is zero-rated, "EXEMPT" is
/// exempt, any other VAT name is treated as standard. Item-level
/// percentages are consulted when no tax entries exist. Everything else
/// falls through to TC04.
pub fn detect_tax_code(item: &SourceLineItem) -> TaxCode {
    if let Some(first) = item.line_item_taxes.first() {
        let pct = first.tax_percentage.as_f64();
        let name = first.tax_name.as_deref().unwrap_or("").to_uppercase();
        if pct == 15.0 || name.contains("15") {
            return TaxCode::TC01;
        }
        if (first.tax_percentage.is_present() && pct == 0.0)
            || name.contains("VAT 0")
            || name.contains("(0%)")
        {
            return TaxCode::TC02;
        }
        if name.contains("EXEMPT") {
            return TaxCode::TC03;
        }
        if name.contains("VAT") {
            return TaxCode::TC01;
        }
    }
    if let Some(pct) = item.tax_percentage {
        let p = pct.as_f64();
        if p == 15.0 {
            return TaxCode::TC01;
        }
        if p == 0.0 {
            return TaxCode::TC02;
        }
    }
    TaxCode::TC04
}

/// SHA-256 over `dateTime + totalAmtPaid + brn + invoiceIdentifier` of
/// the previous document, uppercase hex. "0" when the chain has no
/// predecessor or any component is missing.
fn previous_note_hash(source: &SourceDocument) -> String {
    let Some(prev) = source.previous_invoice.as_ref() else {
        return "0".to_string();
    };
    let (Some(date), Some(total), Some(brn), Some(identifier)) = (
        prev.date_time(),
        prev.total_paid(),
        prev.brn(),
        prev.identifier(),
    ) else {
        return "0".to_string();
    };
    let mut hasher = Sha256::new();
    hasher.update(date.as_bytes());
    hasher.update(total.as_bytes());
    hasher.update(brn.as_bytes());
    hasher.update(identifier.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(64);
    for byte in digest {
        // uppercase hex per the gateway hash-chain rule
        let _ = write!(hex, "{byte:02X}");
    }
    hex
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn money(value: f64) -> String {
    format!("{:.2}", round2(value))
}

/// Quantities keep their natural form: whole numbers print without a
/// decimal part.
fn quantity_string(q: f64) -> String {
    if q.fract() == 0.0 {
        format!("{}", q as i64)
    } else {
        format!("{q}")
    }
}

/// Numeric view of a mapped line, kept so totals can be summed without
/// re-parsing the formatted strings.
struct LineAmounts {
    amt_wo_vat: f64,
    tax: f64,
    total: f64,
    discount: f64,
}

fn map_item(item: &SourceLineItem, index: usize, currency: &str) -> (InvoiceItem, LineAmounts) {
    let quantity = item.quantity();
    let unit_price = item.unit_price();
    let stated_total = item.stated_total();

    let tax_amount = if !item.line_item_taxes.is_empty() {
        item.line_item_taxes.iter().map(|t| t.amount()).sum()
    } else if let Some(amount) = item.tax_amount {
        amount.as_f64()
    } else {
        let pct = item.tax_percentage.map(|p| p.as_f64()).unwrap_or(0.0);
        if pct != 0.0 {
            round2(stated_total * pct / 100.0)
        } else {
            0.0
        }
    };

    let amt_wo_vat = round2(stated_total - tax_amount);
    let total_price = round2(amt_wo_vat + tax_amount);
    let discount = item.discount_amount();

    let mapped = InvoiceItem {
        item_no: (index + 1).to_string(),
        tax_code: detect_tax_code(item),
        nature: "GOODS".to_string(),
        currency: currency.to_string(),
        item_desc: item.description().to_string(),
        quantity: quantity_string(quantity),
        unit_price: money(unit_price),
        discount: money(discount),
        discounted_value: money(item.discounted_value()),
        amt_wo_vat_cur: money(amt_wo_vat),
        amt_wo_vat_mur: money(amt_wo_vat),
        vat_amt: money(tax_amount),
        total_price: money(total_price),
        product_code_own: item.product_code().to_string(),
    };
    let amounts = LineAmounts {
        amt_wo_vat,
        tax: tax_amount,
        total: total_price,
        discount,
    };
    (mapped, amounts)
}

fn resolve_reference(
    kind: DocumentKind,
    source: &SourceDocument,
    options: &MappingOptions,
) -> Result<String, MappingError> {
    let explicit = options
        .reference_override
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let from_source = source
        .reference_number
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| match kind {
            DocumentKind::DebitNote => source.first_referenced_invoice(),
            _ => source.first_credited_reference(),
        });
    match explicit.or(from_source) {
        Some(reference) => Ok(reference.to_string()),
        None if kind.is_note() => Err(MappingError::MissingReference),
        None => Ok(String::new()),
    }
}

/// Map one source document into a [`FiscalInvoice`].
///
/// `invoice_counter` and `invoice_identifier` come from the caller since
/// the platform carries them outside the document body. Totals are
/// recomputed from the mapped items rather than trusted from the source.
pub fn map_document(
    kind: DocumentKind,
    invoice_counter: &str,
    invoice_identifier: &str,
    source: &SourceDocument,
    seller: &SellerProfile,
    options: &MappingOptions,
) -> Result<FiscalInvoice, MappingError> {
    // Estimates often carry no timestamp; a proforma gets stamped with
    // the current time instead of being rejected.
    let date_time_invoice_issued = match source.created_time() {
        Some(created) => fiscal_datetime(created)?,
        None if kind == DocumentKind::Proforma => format_request_datetime(Local::now()),
        None => return Err(MappingError::MissingField { field: "created_time" }),
    };

    let buyer_name = source
        .customer_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(MappingError::MissingField { field: "customer_name" })?;

    let items = source
        .line_items
        .as_ref()
        .ok_or(MappingError::MissingField { field: "line_items" })?;
    if items.is_empty() {
        return Err(MappingError::NoLineItems);
    }
    if kind == DocumentKind::Proforma && items.len() < 2 {
        return Err(MappingError::ProformaItemCount { count: items.len() });
    }
    let selected: Vec<&SourceLineItem> = match kind {
        DocumentKind::StandardSingleItem => items.iter().take(1).collect(),
        _ => items.iter().collect(),
    };

    let currency = source.currency();
    let (mapped_items, line_amounts): (Vec<InvoiceItem>, Vec<LineAmounts>) = selected
        .iter()
        .enumerate()
        .map(|(idx, item)| map_item(item, idx, currency))
        .unzip();

    if options.require_vat_mix {
        let found_vatable = mapped_items.iter().any(|i| i.tax_code == TaxCode::TC01);
        let found_non_vatable = mapped_items.iter().any(|i| {
            matches!(i.tax_code, TaxCode::TC02 | TaxCode::TC03 | TaxCode::TC04)
        });
        if !found_vatable || !found_non_vatable {
            return Err(MappingError::VatMixViolation {
                identifier: invoice_identifier.to_string(),
                found_vatable,
                found_non_vatable,
            });
        }
    }

    // Totals are recomputed from the mapped lines, the source totals are
    // treated as advisory only.
    let mut total_wo_vat = 0.0;
    let mut total_vat = 0.0;
    let mut invoice_total = 0.0;
    let mut discount_total = 0.0;
    for line in &line_amounts {
        total_wo_vat += line.amt_wo_vat;
        total_vat += line.tax;
        invoice_total += line.total;
        discount_total += line.discount;
    }

    let total_amt_paid = source.total_paid().unwrap_or(invoice_total);

    let buyer_tan = source.buyer_tan();
    let person_type = if buyer_tan.is_some() {
        PersonType::VATR
    } else {
        PersonType::NVTR
    };

    let reason_stated = if kind.is_note() {
        let reason = options
            .reason_override
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| {
                source
                    .notes
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or(kind.default_reason());
        Some(reason.to_string())
    } else {
        None
    };

    Ok(FiscalInvoice {
        invoice_counter: invoice_counter.to_string(),
        transaction_type: source
            .transaction_type
            .clone()
            .unwrap_or_else(|| "B2C".to_string()),
        person_type,
        invoice_type_desc: kind.type_desc(),
        currency: currency.to_string(),
        invoice_identifier: invoice_identifier.to_string(),
        invoice_ref_identifier: resolve_reference(kind, source, options)?,
        previous_note_hash: previous_note_hash(source),
        reason_stated,
        total_vat_amount: money(total_vat),
        total_amt_wo_vat_cur: money(total_wo_vat),
        total_amt_wo_vat_mur: money(total_wo_vat),
        invoice_total: money(invoice_total),
        discount_total_amount: money(discount_total),
        total_amt_paid: money(total_amt_paid),
        date_time_invoice_issued,
        seller: Seller {
            name: seller.name.clone(),
            trade_name: seller.trade_name.clone(),
            tan: seller.tan.clone(),
            brn: seller.brn.clone(),
            business_addr: seller.business_addr.clone(),
            business_phone_no: seller.business_phone_no.clone(),
            ebs_counter_no: seller.ebs_counter_no.clone(),
            cashier_id: source
                .cashier_id
                .clone()
                .unwrap_or_else(|| seller.cashier_id.clone()),
        },
        buyer: Buyer {
            name: buyer_name.to_string(),
            tan: buyer_tan.unwrap_or("").to_string(),
            brn: source.buyer_brn().unwrap_or("").to_string(),
            business_addr: source.billing_address().to_string(),
            buyer_type: person_type,
            nic: source.nic.clone().unwrap_or_default(),
        },
        item_list: mapped_items,
        sales_transactions: source
            .sales_transactions
            .clone()
            .unwrap_or_else(|| "CASH".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seller() -> SellerProfile {
        SellerProfile {
            name: "Acme Ltd".into(),
            trade_name: "Acme Ltd".into(),
            tan: "27124193".into(),
            brn: "C11106429".into(),
            business_addr: "Port Louis".into(),
            business_phone_no: "2302909090".into(),
            ebs_counter_no: "".into(),
            cashier_id: "SYSTEM".into(),
        }
    }

    fn standard_source() -> SourceDocument {
        SourceDocument::from_value(json!({
            "created_time": "2025-03-07T09:05:03+0400",
            "customer_name": "Jane Doe",
            "cf_vat": "20123456",
            "cf_brn": "C99887766",
            "currency_code": "MUR",
            "billing_address": "{\"address\": \"Royal Road, Curepipe\"}",
            "line_items": [
                {
                    "name": "Widget",
                    "quantity": 2,
                    "rate": 50.0,
                    "item_total": 115.0,
                    "line_item_taxes": [
                        {"tax_name": "VAT (15%)", "tax_amount": 15.0, "tax_percentage": 15}
                    ],
                    "item_id": "SKU-1"
                },
                {
                    "name": "Zero widget",
                    "quantity": 1,
                    "rate": 20.0,
                    "item_total": 20.0,
                    "line_item_taxes": [
                        {"tax_name": "VAT 0%", "tax_amount": 0, "tax_percentage": 0}
                    ]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn fiscal_datetime_preserves_wall_clock() {
        assert_eq!(
            fiscal_datetime("2025-03-07T09:05:03+0400").unwrap(),
            "20250307 09:05:03"
        );
        assert_eq!(
            fiscal_datetime("2025-03-07 09:05:03").unwrap(),
            "20250307 09:05:03"
        );
        assert_eq!(fiscal_datetime("2025-03-07").unwrap(), "20250307 00:00:00");
        assert!(fiscal_datetime("07/03/2025").is_err());
    }

    #[test]
    fn request_datetime_is_17_chars() {
        let now = Local::now();
        let formatted = format_request_datetime(now);
        assert_eq!(formatted.len(), 17);
        assert_eq!(formatted.as_bytes()[8], b' ');

        use chrono::TimeZone;
        let fixed = Local.with_ymd_and_hms(2025, 3, 7, 9, 5, 3).unwrap();
        assert_eq!(format_request_datetime(fixed), "20250307 09:05:03");
    }

    #[test]
    fn tax_code_detection() {
        let fifteen: SourceLineItem = serde_json::from_value(json!({
            "line_item_taxes": [{"tax_name": "VAT (15%)", "tax_percentage": 15}]
        }))
        .unwrap();
        assert_eq!(detect_tax_code(&fifteen), TaxCode::TC01);

        let zero: SourceLineItem = serde_json::from_value(json!({
            "line_item_taxes": [{"tax_name": "VAT 0%", "tax_percentage": 0}]
        }))
        .unwrap();
        assert_eq!(detect_tax_code(&zero), TaxCode::TC02);

        let exempt: SourceLineItem = serde_json::from_value(json!({
            "line_item_taxes": [{"tax_name": "EXEMPT SUPPLY"}]
        }))
        .unwrap();
        assert_eq!(detect_tax_code(&exempt), TaxCode::TC03);

        let generic_vat: SourceLineItem = serde_json::from_value(json!({
            "line_item_taxes": [{"tax_name": "Standard VAT"}]
        }))
        .unwrap();
        assert_eq!(detect_tax_code(&generic_vat), TaxCode::TC01);

        let untaxed: SourceLineItem = serde_json::from_value(json!({})).unwrap();
        assert_eq!(detect_tax_code(&untaxed), TaxCode::TC04);

        let item_level: SourceLineItem =
            serde_json::from_value(json!({"tax_percentage": 15})).unwrap();
        assert_eq!(detect_tax_code(&item_level), TaxCode::TC01);
    }

    #[test]
    fn standard_invoice_totals_recomputed() {
        let invoice = map_document(
            DocumentKind::Standard,
            "8001",
            "INV-000042",
            &standard_source(),
            &seller(),
            &MappingOptions::default(),
        )
        .unwrap();

        assert_eq!(invoice.invoice_type_desc, InvoiceTypeDesc::STD);
        assert_eq!(invoice.item_list.len(), 2);
        // first line: stated 115 minus 15 tax
        assert_eq!(invoice.item_list[0].amt_wo_vat_cur, "100.00");
        assert_eq!(invoice.item_list[0].vat_amt, "15.00");
        assert_eq!(invoice.item_list[0].total_price, "115.00");
        assert_eq!(invoice.item_list[0].tax_code, TaxCode::TC01);
        assert_eq!(invoice.item_list[1].tax_code, TaxCode::TC02);
        assert_eq!(invoice.total_amt_wo_vat_cur, "120.00");
        assert_eq!(invoice.total_vat_amount, "15.00");
        assert_eq!(invoice.invoice_total, "135.00");
        assert_eq!(invoice.total_amt_paid, "135.00");
        assert_eq!(invoice.date_time_invoice_issued, "20250307 09:05:03");
        assert_eq!(invoice.person_type, PersonType::VATR);
        assert_eq!(invoice.buyer.business_addr, "Royal Road, Curepipe");
        assert_eq!(invoice.previous_note_hash, "0");
        assert!(invoice.reason_stated.is_none());
    }

    #[test]
    fn buyer_without_tan_is_nvtr() {
        let mut source = standard_source();
        source.cf_vat = None;
        let invoice = map_document(
            DocumentKind::Standard,
            "8001",
            "INV-000042",
            &source,
            &seller(),
            &MappingOptions::default(),
        )
        .unwrap();
        assert_eq!(invoice.person_type, PersonType::NVTR);
        assert_eq!(invoice.buyer.buyer_type, PersonType::NVTR);
        assert_eq!(invoice.buyer.tan, "");
    }

    #[test]
    fn single_item_kind_keeps_only_first_line() {
        let invoice = map_document(
            DocumentKind::StandardSingleItem,
            "8001",
            "INV-000042",
            &standard_source(),
            &seller(),
            &MappingOptions::default(),
        )
        .unwrap();
        assert_eq!(invoice.item_list.len(), 1);
        assert_eq!(invoice.invoice_type_desc, InvoiceTypeDesc::STD);
        assert_eq!(invoice.invoice_total, "115.00");
    }

    #[test]
    fn credit_note_requires_reference() {
        let source = standard_source();
        let err = map_document(
            DocumentKind::CreditNote,
            "8002",
            "CN-000007",
            &source,
            &seller(),
            &MappingOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, MappingError::MissingReference);
    }

    #[test]
    fn credit_note_reference_priority() {
        let mut source = standard_source();
        source.reference_number = Some("INV-000041".into());
        let from_source = map_document(
            DocumentKind::CreditNote,
            "8002",
            "CN-000007",
            &source,
            &seller(),
            &MappingOptions::default(),
        )
        .unwrap();
        assert_eq!(from_source.invoice_ref_identifier, "INV-000041");
        assert_eq!(
            from_source.reason_stated.as_deref(),
            Some("Credit Note issued")
        );

        let options = MappingOptions {
            reference_override: Some("INV-000040".into()),
            reason_override: Some("Goods returned".into()),
            ..Default::default()
        };
        let overridden = map_document(
            DocumentKind::CreditNote,
            "8002",
            "CN-000007",
            &source,
            &seller(),
            &options,
        )
        .unwrap();
        assert_eq!(overridden.invoice_ref_identifier, "INV-000040");
        assert_eq!(overridden.reason_stated.as_deref(), Some("Goods returned"));
    }

    #[test]
    fn debit_note_default_reason() {
        let mut source = standard_source();
        source.reference_number = Some("INV-000041".into());
        let invoice = map_document(
            DocumentKind::DebitNote,
            "8003",
            "DN-000002",
            &source,
            &seller(),
            &MappingOptions::default(),
        )
        .unwrap();
        assert_eq!(invoice.invoice_type_desc, InvoiceTypeDesc::DRN);
        assert_eq!(
            invoice.reason_stated.as_deref(),
            Some("Correction / Debit Note")
        );
    }

    #[test]
    fn debit_note_reference_from_referenced_invoices() {
        let mut source = standard_source();
        source.invoices_referenced =
            Some(serde_json::from_value(json!("[\"INV-000039\"]")).unwrap());
        let invoice = map_document(
            DocumentKind::DebitNote,
            "8003",
            "DN-000002",
            &source,
            &seller(),
            &MappingOptions::default(),
        )
        .unwrap();
        assert_eq!(invoice.invoice_ref_identifier, "INV-000039");
    }

    #[test]
    fn previous_invoice_hash_chain() {
        let mut source = standard_source();
        source.previous_invoice = Some(
            serde_json::from_value(json!({
                "dateTime": "20250101 10:00:00",
                "totalAmtPaid": "115.00",
                "brn": "C11106429",
                "invoiceIdentifier": "INV-000041"
            }))
            .unwrap(),
        );
        let invoice = map_document(
            DocumentKind::Standard,
            "8001",
            "INV-000042",
            &source,
            &seller(),
            &MappingOptions::default(),
        )
        .unwrap();
        assert_eq!(
            invoice.previous_note_hash,
            "445F0D575DF55DA6BE57AAD02AD2E55AF563D63A2243EE215159E47FCD943C25"
        );
    }

    #[test]
    fn incomplete_previous_invoice_hashes_to_zero() {
        let mut source = standard_source();
        source.previous_invoice = Some(
            serde_json::from_value(json!({"dateTime": "20250101 10:00:00"})).unwrap(),
        );
        let invoice = map_document(
            DocumentKind::Standard,
            "8001",
            "INV-000042",
            &source,
            &seller(),
            &MappingOptions::default(),
        )
        .unwrap();
        assert_eq!(invoice.previous_note_hash, "0");
    }

    #[test]
    fn vat_mix_violation_rejected() {
        let source = SourceDocument::from_value(json!({
            "created_time": "2025-03-07T09:05:03+0400",
            "customer_name": "Jane Doe",
            "line_items": [
                {
                    "name": "Widget",
                    "quantity": 1,
                    "rate": 100.0,
                    "item_total": 115.0,
                    "line_item_taxes": [{"tax_name": "VAT (15%)", "tax_amount": 15.0}]
                }
            ]
        }))
        .unwrap();
        let options = MappingOptions {
            require_vat_mix: true,
            ..Default::default()
        };
        let err = map_document(
            DocumentKind::Standard,
            "8001",
            "INV-000042",
            &source,
            &seller(),
            &options,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MappingError::VatMixViolation {
                found_vatable: true,
                found_non_vatable: false,
                ..
            }
        ));
    }

    #[test]
    fn missing_created_time_is_rejected() {
        let source = SourceDocument::from_value(json!({
            "customer_name": "Jane Doe",
            "line_items": []
        }))
        .unwrap();
        let err = map_document(
            DocumentKind::Standard,
            "8001",
            "INV-000042",
            &source,
            &seller(),
            &MappingOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, MappingError::MissingField { field: "created_time" });
    }

    #[test]
    fn proforma_without_created_time_uses_current_time() {
        let mut source = standard_source();
        source.created_time = None;
        let invoice = map_document(
            DocumentKind::Proforma,
            "8004",
            "EST-000011",
            &source,
            &seller(),
            &MappingOptions::default(),
        )
        .unwrap();
        assert_eq!(invoice.invoice_type_desc, InvoiceTypeDesc::PRF);
        assert_eq!(invoice.date_time_invoice_issued.len(), 17);
        assert_eq!(invoice.date_time_invoice_issued.as_bytes()[8], b' ');
    }

    #[test]
    fn proforma_requires_two_line_items() {
        let source = SourceDocument::from_value(json!({
            "created_time": "2025-03-07T09:05:03+0400",
            "customer_name": "Jane Doe",
            "line_items": [
                {
                    "name": "Widget",
                    "quantity": 1,
                    "rate": 100.0,
                    "item_total": 115.0,
                    "line_item_taxes": [{"tax_name": "VAT (15%)", "tax_amount": 15.0}]
                }
            ]
        }))
        .unwrap();
        let err = map_document(
            DocumentKind::Proforma,
            "8004",
            "EST-000011",
            &source,
            &seller(),
            &MappingOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, MappingError::ProformaItemCount { count: 1 });
    }

    #[test]
    fn quantity_formatting() {
        assert_eq!(quantity_string(2.0), "2");
        assert_eq!(quantity_string(1.5), "1.5");
    }
}
