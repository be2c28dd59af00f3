use chrono::NaiveDate;

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub account_type: String,
    pub institution: Option<String>,
    pub last_four: Option<String>,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub category_type: String,
    pub description: Option<String>,
    pub is_active: bool,
}

/// A fully normalized transaction, ready for the store.
/// Positive amounts are income/credits, negative are expenses/debits.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTransaction {
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub date: NaiveDate,
    pub amount: f64,
    pub description: String,
    pub merchant: Option<String>,
    pub status: &'static str,
}

impl CanonicalTransaction {
    pub fn new(account_id: i64, date: NaiveDate, amount: f64, description: String) -> Self {
        CanonicalTransaction {
            account_id,
            category_id: None,
            date,
            amount,
            description,
            merchant: None,
            status: "posted",
        }
    }
}

/// One row-scoped problem, kept with enough context to point the user at
/// the offending cell. Never aborts sibling rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportError {
    pub row: usize,
    pub field: String,
    pub raw_value: String,
    pub message: String,
}

/// Informational only; warnings never block a row.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportWarning {
    pub row: usize,
    pub field: String,
    pub message: String,
}
