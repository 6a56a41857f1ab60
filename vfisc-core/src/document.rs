//! Gateway-side fiscal invoice model.
//!
//! The MRA schema carries every amount as a string with two decimals, so
//! all monetary fields here are `String` and the mapping layer is
//! responsible for formatting. Field names follow the gateway JSON.
use serde::{Deserialize, Serialize};

/// Document type stamped into `invoiceTypeDesc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceTypeDesc {
    /// Standard invoice.
    STD,
    /// Credit note, requires a reference to the original invoice.
    CRN,
    /// Debit note, requires a reference to the original invoice.
    DRN,
    /// Proforma invoice, mapped from an estimate.
    PRF,
}

impl std::fmt::Display for InvoiceTypeDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InvoiceTypeDesc::STD => "STD",
            InvoiceTypeDesc::CRN => "CRN",
            InvoiceTypeDesc::DRN => "DRN",
            InvoiceTypeDesc::PRF => "PRF",
        };
        f.write_str(s)
    }
}

/// VAT registration status, used for both `personType` and
/// `buyer.buyerType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonType {
    /// VAT registered.
    VATR,
    /// Not VAT registered.
    NVTR,
}

/// MRA tax classification codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxCode {
    /// Standard rate VAT (15%).
    TC01,
    /// Zero-rated.
    TC02,
    /// Exempt.
    TC03,
    /// Out of scope / unclassified.
    TC04,
    /// Reserved.
    TC05,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub name: String,
    pub trade_name: String,
    pub tan: String,
    pub brn: String,
    pub business_addr: String,
    pub business_phone_no: String,
    pub ebs_counter_no: String,
    pub cashier_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buyer {
    pub name: String,
    pub tan: String,
    pub brn: String,
    pub business_addr: String,
    pub buyer_type: PersonType,
    pub nic: String,
}

/// One line of `itemList`. Amounts are pre-formatted two-decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub item_no: String,
    pub tax_code: TaxCode,
    pub nature: String,
    pub currency: String,
    pub item_desc: String,
    pub quantity: String,
    pub unit_price: String,
    pub discount: String,
    pub discounted_value: String,
    pub amt_wo_vat_cur: String,
    pub amt_wo_vat_mur: String,
    pub vat_amt: String,
    pub total_price: String,
    pub product_code_own: String,
}

/// A fully mapped document ready for encryption and transmission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiscalInvoice {
    pub invoice_counter: String,
    pub transaction_type: String,
    pub person_type: PersonType,
    pub invoice_type_desc: InvoiceTypeDesc,
    pub currency: String,
    pub invoice_identifier: String,
    pub invoice_ref_identifier: String,
    pub previous_note_hash: String,
    /// Only credit and debit notes carry a reason; absent otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_stated: Option<String>,
    pub total_vat_amount: String,
    pub total_amt_wo_vat_cur: String,
    pub total_amt_wo_vat_mur: String,
    pub invoice_total: String,
    pub discount_total_amount: String,
    pub total_amt_paid: String,
    pub date_time_invoice_issued: String,
    pub seller: Seller,
    pub buyer: Buyer,
    pub item_list: Vec<InvoiceItem>,
    pub sales_transactions: String,
}
