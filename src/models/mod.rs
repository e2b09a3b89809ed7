use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed prefixes for the categories the app ships with.
const KNOWN_PREFIXES: [(&str, &str); 5] = [
    ("payment", "PAY"),
    ("receipt", "REC"),
    ("purchase", "PUR"),
    ("invoice", "INV"),
    ("sell", "SEL"),
];

const PREFIX_LEN: usize = 3;

/// A document category such as `payment` or a user-created folder name.
///
/// Stored trimmed and lower-cased so that `"Payment "` and `"payment"` share
/// one counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DocumentCategory(String);

impl DocumentCategory {
    pub fn new(raw: &str) -> Self {
        DocumentCategory(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Three-character prefix used in front of every number of this category.
    pub fn prefix(&self) -> String {
        if let Some((_, prefix)) = KNOWN_PREFIXES.iter().find(|(name, _)| *name == self.0) {
            return prefix.to_string();
        }

        let head: String = self
            .0
            .chars()
            .take(PREFIX_LEN)
            .map(|c| c.to_ascii_uppercase())
            .collect();
        format!("{:X<width$}", head, width = PREFIX_LEN)
    }

    /// Store key holding the last number handed out for this category.
    pub fn counter_key(&self) -> String {
        format!("last_{}_number", self.0)
    }

    /// How to find existing numbers of this category on the ledger API.
    pub fn query_shape(&self) -> Option<QueryShape> {
        let shape = match self.0.as_str() {
            "payment" | "purchase" => QueryShape {
                transaction_type: TransactionType::Debit,
                number_field: NumberField::BillNumber,
            },
            "receipt" => QueryShape {
                transaction_type: TransactionType::Credit,
                number_field: NumberField::ReceiptNumber,
            },
            "invoice" | "sell" => QueryShape {
                transaction_type: TransactionType::Credit,
                number_field: NumberField::InvoiceNumber,
            },
            _ => return None,
        };
        Some(shape)
    }
}

impl From<&str> for DocumentCategory {
    fn from(raw: &str) -> Self {
        DocumentCategory::new(raw)
    }
}

impl From<String> for DocumentCategory {
    fn from(raw: String) -> Self {
        DocumentCategory::new(&raw)
    }
}

impl From<DocumentCategory> for String {
    fn from(category: DocumentCategory) -> Self {
        category.0
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }
}

/// The response field that carries a document number. The ledger API names
/// it differently per document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberField {
    BillNumber,
    ReceiptNumber,
    InvoiceNumber,
}

impl NumberField {
    pub fn json_name(&self) -> &'static str {
        match self {
            NumberField::BillNumber => "billNumber",
            NumberField::ReceiptNumber => "receiptNumber",
            NumberField::InvoiceNumber => "invoiceNumber",
        }
    }

    pub fn value<'a>(&self, document: &'a RemoteDocument) -> Option<&'a str> {
        let value = match self {
            NumberField::BillNumber => document.bill_number.as_deref(),
            NumberField::ReceiptNumber => document.receipt_number.as_deref(),
            NumberField::InvoiceNumber => document.invoice_number.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryShape {
    pub transaction_type: TransactionType,
    pub number_field: NumberField,
}

/// A transaction record as returned by the ledger API. Only the number
/// fields are read; everything else in the record is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    #[serde(default)]
    pub bill_number: Option<String>,
    #[serde(default)]
    pub receipt_number: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub api_base_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_base_url: None,
            request_timeout_secs: 10,
        }
    }
}

/// One entry of the local numbering history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberLogEntry {
    pub id: String,
    pub category: String,
    pub document_number: String,
    pub source: String,
    pub created_at: String,
}
