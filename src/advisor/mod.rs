//! Derived views over a profile's ledger and limits: suggested monthly
//! limits from spending history, and overspend warnings. Pure with
//! respect to the stores; no hidden state.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::ledger::LedgerStore;
use crate::limits::{CategoryLimits, LimitsTable};
use crate::models::ExpenseFilter;
use crate::month;

/// Language-neutral status tokens; display layers map these to text.
pub const OVER_LIMIT: &str = "over";
pub const WITHIN_LIMIT: &str = "within";

/// How many months of history to pull: the target month plus the three
/// preceding it. The extra month lets the average stay a full trailing
/// three even while the target month only has partial data.
const LOOKBACK_MONTHS: usize = 4;

/// Suggest per-category limits for `target` from spending history.
///
/// Per category, the suggestion is the mean of its monthly totals over
/// the three months strictly before the target; the target month never
/// feeds its own suggestion. Months with no data for a category are
/// left out of the mean rather than counted as zero. If every
/// suggestion comes out exactly zero, the raw totals of the immediately
/// preceding month are used instead, when that month has data at all.
/// Values are rounded to cents. No history in the window yields an
/// empty map, not an error.
pub fn suggest_limits_for_month(
    ledger: &LedgerStore,
    target: &str,
) -> Result<CategoryLimits, StoreError> {
    let window = month::lookback_window(target, LOOKBACK_MONTHS)?;
    let oldest = window.last().map(String::as_str).unwrap_or(target);
    let filter = ExpenseFilter::date_range(
        Some(month::first_day(oldest)?),
        Some(month::last_day(target)?),
    );
    let rows = ledger.query(&filter)?;
    if rows.is_empty() {
        return Ok(CategoryLimits::new());
    }

    // pivot: month -> category -> summed amount
    let mut pivot: BTreeMap<String, CategoryLimits> = BTreeMap::new();
    let mut categories: BTreeSet<String> = BTreeSet::new();
    for row in &rows {
        categories.insert(row.category.clone());
        *pivot
            .entry(row.month_key())
            .or_default()
            .entry(row.category.clone())
            .or_insert(0.0) += row.amount;
    }

    let trailing = &window[1..];
    let mut suggestions = CategoryLimits::new();
    for category in &categories {
        let values: Vec<f64> = trailing
            .iter()
            .filter_map(|mk| pivot.get(mk).and_then(|sums| sums.get(category)))
            .copied()
            .collect();
        let mean = if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        };
        suggestions.insert(category.clone(), mean);
    }

    // Trailing average uniformly zero: fall back to the previous
    // month's raw totals, if that month appears in the pivot.
    if suggestions.values().all(|v| *v == 0.0) {
        if let Some(prev_sums) = pivot.get(&window[1]) {
            for category in &categories {
                let value = prev_sums.get(category).copied().unwrap_or(0.0);
                suggestions.insert(category.clone(), value);
            }
        }
    }

    Ok(suggestions
        .into_iter()
        .map(|(category, value)| (category, round_cents(value)))
        .collect())
}

/// Evaluate spend in `[start, end]` against the limits table.
///
/// One line per (month, category) group:
/// `"<month> <category>: $<total>"`, extended with
/// `" [<status>] (limit: $<limit>)"` when a limit is defined for that
/// month and category. A limit of zero with any positive spend is over.
/// Lines come out in sorted group order; an empty range yields an empty
/// vec.
pub fn check_budget_limits(
    ledger: &LedgerStore,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    limits: &LimitsTable,
) -> Result<Vec<String>, StoreError> {
    let rows = ledger.query(&ExpenseFilter::date_range(start, end))?;

    let mut totals: BTreeMap<(String, String), f64> = BTreeMap::new();
    for row in &rows {
        *totals
            .entry((row.month_key(), row.category.clone()))
            .or_insert(0.0) += row.amount;
    }

    let mut warnings = Vec::with_capacity(totals.len());
    for ((month_key, category), total) in &totals {
        let mut line = format!("{month_key} {category}: ${total:.2}");
        if let Some(limit) = limits.get(month_key).and_then(|m| m.get(category)) {
            let status = if total > limit { OVER_LIMIT } else { WITHIN_LIMIT };
            line.push_str(&format!(" [{status}] (limit: ${limit:.2})"));
        }
        warnings.push(line);
    }
    Ok(warnings)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests;
