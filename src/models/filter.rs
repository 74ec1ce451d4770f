use chrono::NaiveDate;

/// Query filter for ledger rows. All bounds are inclusive; `None` leaves
/// that side open.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub category: Option<String>,
}

impl ExpenseFilter {
    pub fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            start,
            end,
            category: None,
        }
    }
}
