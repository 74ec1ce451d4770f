use chrono::NaiveDate;

use crate::month;

/// One ledger entry, owned by a single profile's ledger.
///
/// The entry contract (`amount > 0`, category non-empty after trim) is
/// enforced by callers before insertion; the store itself only coerces
/// types, so rows written by other paths may carry zero or negative
/// amounts.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub category: String,
    pub amount: f64,
    pub description: String,
}

impl Expense {
    pub fn new(date: NaiveDate, category: String, amount: f64, description: String) -> Self {
        Self {
            id: None,
            date,
            category,
            amount,
            description,
        }
    }

    /// Month key (`YYYY-MM`) this expense falls in.
    pub fn month_key(&self) -> String {
        month::month_key(self.date)
    }
}
