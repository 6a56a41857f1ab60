//! Source document model for Zoho Books style exports.
//!
//! Zoho webhooks are loose about shape: nested structures such as
//! `line_items` and `billing_address` frequently arrive as JSON-strings
//! rather than JSON values, and amounts arrive as numbers, bare strings,
//! or formatted strings like `"Rs 1,150.00"`. [`Embedded`] and [`Amount`]
//! absorb both representations at the serde boundary so the mapping layer
//! only sees clean values.
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;

/// A value that may arrive either inline or as a JSON-string.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedded<T>(pub T);

impl<T> Embedded<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Embedded<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<'de, T> Deserialize<'de> for Embedded<T>
where
    T: serde::de::DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let inner = match value {
            serde_json::Value::String(s) => serde_json::from_str(&s).map_err(de::Error::custom)?,
            other => serde_json::from_value(other).map_err(de::Error::custom)?,
        };
        Ok(Embedded(inner))
    }
}

/// A lenient monetary or quantity field. Accepts JSON numbers, numeric
/// strings, and formatted strings with currency symbols or thousands
/// separators. Unparseable or absent values read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Amount(Option<f64>);

impl Amount {
    pub fn new(value: f64) -> Self {
        Amount(Some(value))
    }

    /// Whether the source carried any value at all, parseable or not.
    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }

    pub fn as_f64(&self) -> f64 {
        self.0.unwrap_or(0.0)
    }
}

/// Strip everything except digits, dot and minus, then parse. Mirrors how
/// formatted Zoho amounts like "Rs 1,150.00" are read.
fn lenient_number(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AmountVisitor;

        impl<'de> Visitor<'de> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a number, a numeric string, or null")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
                Ok(Amount(Some(v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                Ok(Amount(Some(v as f64)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Ok(Amount(Some(v as f64)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                Ok(Amount(lenient_number(v)))
            }

            fn visit_none<E: de::Error>(self) -> Result<Amount, E> {
                Ok(Amount(None))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Amount, E> {
                Ok(Amount(None))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineItemTax {
    #[serde(default)]
    pub tax_name: Option<String>,
    #[serde(default)]
    pub tax_amount: Amount,
    #[serde(default)]
    pub tax_amount_formatted: Amount,
    #[serde(default)]
    pub tax_percentage: Amount,
}

impl LineItemTax {
    /// Tax amount, preferring the plain field over the formatted one.
    pub fn amount(&self) -> f64 {
        if self.tax_amount.is_present() {
            self.tax_amount.as_f64()
        } else {
            self.tax_amount_formatted.as_f64()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceLineItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: Amount,
    #[serde(default)]
    pub qty: Amount,
    #[serde(default)]
    pub rate: Amount,
    #[serde(default)]
    pub sales_rate: Amount,
    #[serde(default)]
    pub rate_formatted: Amount,
    #[serde(default)]
    pub unit_price: Amount,
    #[serde(default)]
    pub item_total: Amount,
    #[serde(default)]
    pub item_total_formatted: Amount,
    #[serde(default)]
    pub amount: Amount,
    #[serde(default)]
    pub total: Amount,
    #[serde(default)]
    pub tax_amount: Option<Amount>,
    #[serde(default)]
    pub tax_percentage: Option<Amount>,
    #[serde(default)]
    pub discount_amount: Amount,
    #[serde(default)]
    pub discount: Amount,
    #[serde(default)]
    pub discounted_value: Amount,
    #[serde(rename = "discountedValue", default)]
    pub discounted_value_camel: Amount,
    #[serde(default)]
    pub line_item_taxes: Vec<LineItemTax>,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
}

impl SourceLineItem {
    pub fn quantity(&self) -> f64 {
        let q = first_nonzero(&[self.quantity, self.qty]);
        if q == 0.0 {
            1.0
        } else {
            q
        }
    }

    pub fn unit_price(&self) -> f64 {
        first_nonzero(&[self.rate, self.sales_rate, self.rate_formatted, self.unit_price])
    }

    /// Line total as stated by the source, falling back to qty * price.
    pub fn stated_total(&self) -> f64 {
        let stated = first_nonzero(&[
            self.item_total,
            self.item_total_formatted,
            self.amount,
            self.total,
        ]);
        if stated != 0.0 {
            stated
        } else {
            self.quantity() * self.unit_price()
        }
    }

    pub fn discount_amount(&self) -> f64 {
        first_nonzero(&[self.discount_amount, self.discount])
    }

    pub fn discounted_value(&self) -> f64 {
        let v = first_nonzero(&[self.discounted_value, self.discounted_value_camel]);
        if v != 0.0 {
            v
        } else {
            self.stated_total()
        }
    }

    pub fn description(&self) -> &str {
        non_empty(&self.name)
            .or_else(|| non_empty(&self.description))
            .unwrap_or("")
    }

    pub fn product_code(&self) -> &str {
        non_empty(&self.item_id)
            .or_else(|| non_empty(&self.product_code))
            .or_else(|| non_empty(&self.sku))
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingAddress {
    #[serde(default)]
    pub address: Option<String>,
}

/// Details of the previously fiscalised invoice, used to chain note
/// hashes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviousInvoice {
    #[serde(rename = "dateTime", default)]
    pub date_time_camel: Option<String>,
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "totalAmtPaid", default)]
    pub total_amt_paid_camel: Option<String>,
    #[serde(default)]
    pub total_amt_paid: Option<String>,
    #[serde(default)]
    pub total: Option<String>,
    #[serde(rename = "totalAmt", default)]
    pub total_amt: Option<String>,
    #[serde(default)]
    pub brn: Option<String>,
    #[serde(rename = "prevBrn", default)]
    pub prev_brn: Option<String>,
    #[serde(default)]
    pub previous_brn: Option<String>,
    #[serde(rename = "invoiceIdentifier", default)]
    pub invoice_identifier: Option<String>,
    #[serde(default)]
    pub invoice_id: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
}

impl PreviousInvoice {
    pub fn date_time(&self) -> Option<&str> {
        non_empty(&self.date_time_camel)
            .or_else(|| non_empty(&self.date_time))
            .or_else(|| non_empty(&self.date))
    }

    pub fn total_paid(&self) -> Option<&str> {
        non_empty(&self.total_amt_paid_camel)
            .or_else(|| non_empty(&self.total_amt_paid))
            .or_else(|| non_empty(&self.total))
            .or_else(|| non_empty(&self.total_amt))
    }

    pub fn brn(&self) -> Option<&str> {
        non_empty(&self.brn)
            .or_else(|| non_empty(&self.prev_brn))
            .or_else(|| non_empty(&self.previous_brn))
    }

    pub fn identifier(&self) -> Option<&str> {
        non_empty(&self.invoice_identifier)
            .or_else(|| non_empty(&self.invoice_id))
            .or_else(|| non_empty(&self.invoice_number))
    }
}

/// An entry of `invoices_credited`, which Zoho emits either as bare
/// identifiers or as small objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CreditedReference {
    Identifier(String),
    Entry {
        #[serde(default)]
        invoice_identifier: Option<String>,
        #[serde(default)]
        invoice_number: Option<String>,
    },
}

impl CreditedReference {
    pub fn identifier(&self) -> Option<&str> {
        match self {
            CreditedReference::Identifier(s) => {
                let s = s.trim();
                (!s.is_empty()).then_some(s)
            }
            CreditedReference::Entry {
                invoice_identifier,
                invoice_number,
            } => non_empty(invoice_identifier).or_else(|| non_empty(invoice_number)),
        }
    }
}

/// One invoice, credit note, debit note, or estimate as exported from the
/// e-commerce platform.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceDocument {
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub line_items: Option<Embedded<Vec<SourceLineItem>>>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub cf_vat: Option<String>,
    #[serde(default)]
    pub cf_tan: Option<String>,
    #[serde(default)]
    pub tan: Option<String>,
    #[serde(default)]
    pub cf_brn: Option<String>,
    #[serde(default)]
    pub cf_brn_number: Option<String>,
    #[serde(default)]
    pub brn: Option<String>,
    #[serde(default)]
    pub nic: Option<String>,
    #[serde(default)]
    pub billing_address: Option<Embedded<BillingAddress>>,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub invoices_credited: Option<Embedded<Vec<CreditedReference>>>,
    #[serde(
        default,
        alias = "invoices_referenced_json",
        alias = "invoices_referenced_list"
    )]
    pub invoices_referenced: Option<Embedded<Vec<CreditedReference>>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub total_paid: Amount,
    #[serde(default)]
    pub amount_paid: Amount,
    #[serde(default)]
    pub total: Amount,
    #[serde(rename = "transactionType", default)]
    pub transaction_type: Option<String>,
    #[serde(rename = "salesTransactions", default)]
    pub sales_transactions: Option<String>,
    #[serde(rename = "previousInvoice", default)]
    pub previous_invoice: Option<PreviousInvoice>,
    #[serde(default)]
    pub cashier_id: Option<String>,
}

impl SourceDocument {
    /// Parse from a JSON value which may itself be a JSON-string.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let Embedded(doc) = serde_json::from_value(value)?;
        Ok(doc)
    }

    pub fn created_time(&self) -> Option<&str> {
        non_empty(&self.created_time)
            .or_else(|| non_empty(&self.date_time))
            .or_else(|| non_empty(&self.date))
    }

    pub fn buyer_tan(&self) -> Option<&str> {
        non_empty(&self.cf_vat)
            .or_else(|| non_empty(&self.cf_tan))
            .or_else(|| non_empty(&self.tan))
    }

    pub fn buyer_brn(&self) -> Option<&str> {
        non_empty(&self.cf_brn)
            .or_else(|| non_empty(&self.cf_brn_number))
            .or_else(|| non_empty(&self.brn))
    }

    pub fn currency(&self) -> &str {
        non_empty(&self.currency_code).unwrap_or("MUR")
    }

    pub fn billing_address(&self) -> &str {
        self.billing_address
            .as_ref()
            .and_then(|b| non_empty(&b.address))
            .unwrap_or("")
    }

    /// Amount paid, falling back to the stated grand total.
    pub fn total_paid(&self) -> Option<f64> {
        [self.total_paid, self.amount_paid, self.total]
            .iter()
            .find(|a| a.is_present() && a.as_f64() != 0.0)
            .map(|a| a.as_f64())
    }

    /// First usable identifier from `invoices_credited`.
    pub fn first_credited_reference(&self) -> Option<&str> {
        self.invoices_credited
            .as_ref()
            .and_then(|refs| refs.iter().find_map(|r| r.identifier()))
    }

    /// First usable identifier from `invoices_referenced` (debit notes),
    /// falling back to `invoices_credited`.
    pub fn first_referenced_invoice(&self) -> Option<&str> {
        self.invoices_referenced
            .as_ref()
            .and_then(|refs| refs.iter().find_map(|r| r.identifier()))
            .or_else(|| self.first_credited_reference())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn first_nonzero(amounts: &[Amount]) -> f64 {
    amounts
        .iter()
        .map(Amount::as_f64)
        .find(|v| *v != 0.0)
        .unwrap_or(0.0)
}
