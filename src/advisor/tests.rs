#![allow(clippy::unwrap_used)]

use super::*;

use crate::models::Expense;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn add(ledger: &LedgerStore, y: i32, m: u32, d: u32, category: &str, amount: f64) {
    ledger
        .add_expense(&Expense::new(date(y, m, d), category.into(), amount, String::new()))
        .unwrap();
}

fn limits_table(month: &str, pairs: &[(&str, f64)]) -> LimitsTable {
    let mut table = LimitsTable::new();
    table.insert(
        month.to_string(),
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
    );
    table
}

// ── Suggestions ───────────────────────────────────────────────

#[test]
fn test_suggest_empty_ledger() {
    let ledger = LedgerStore::open_in_memory().unwrap();
    assert!(suggest_limits_for_month(&ledger, "2025-07").unwrap().is_empty());
}

#[test]
fn test_suggest_invalid_month_key() {
    let ledger = LedgerStore::open_in_memory().unwrap();
    assert!(suggest_limits_for_month(&ledger, "2025-7").is_err());
}

#[test]
fn test_suggest_trailing_three_month_mean() {
    let ledger = LedgerStore::open_in_memory().unwrap();
    add(&ledger, 2025, 4, 10, "food", 25.0);
    add(&ledger, 2025, 5, 12, "food", 30.0);
    add(&ledger, 2025, 6, 3, "food", 40.0);

    let suggestions = suggest_limits_for_month(&ledger, "2025-07").unwrap();
    // mean(25, 30, 40) = 31.666... -> 31.67
    assert_eq!(suggestions.len(), 1);
    assert!((suggestions["food"] - 31.67).abs() < 1e-9);
}

#[test]
fn test_suggest_sums_within_each_month() {
    let ledger = LedgerStore::open_in_memory().unwrap();
    add(&ledger, 2025, 6, 1, "food", 10.0);
    add(&ledger, 2025, 6, 15, "food", 20.0);
    add(&ledger, 2025, 6, 28, "food", 15.0);

    let suggestions = suggest_limits_for_month(&ledger, "2025-07").unwrap();
    // single trailing month with data: mean over one value (45), not three
    assert!((suggestions["food"] - 45.0).abs() < 1e-9);
}

#[test]
fn test_suggest_excludes_target_month_from_its_own_average() {
    let ledger = LedgerStore::open_in_memory().unwrap();
    add(&ledger, 2025, 4, 10, "food", 25.0);
    add(&ledger, 2025, 5, 12, "food", 30.0);
    add(&ledger, 2025, 6, 3, "food", 40.0);
    // heavy partial spend in the target month must not skew the result
    add(&ledger, 2025, 7, 2, "food", 999.0);

    let suggestions = suggest_limits_for_month(&ledger, "2025-07").unwrap();
    assert!((suggestions["food"] - 31.67).abs() < 1e-9);
}

#[test]
fn test_suggest_ignores_months_outside_window() {
    let ledger = LedgerStore::open_in_memory().unwrap();
    // too old: four or more months before the target
    add(&ledger, 2025, 3, 10, "food", 500.0);
    add(&ledger, 2025, 6, 3, "food", 40.0);

    let suggestions = suggest_limits_for_month(&ledger, "2025-07").unwrap();
    assert!((suggestions["food"] - 40.0).abs() < 1e-9);
}

#[test]
fn test_suggest_missing_months_are_excluded_not_zero() {
    let ledger = LedgerStore::open_in_memory().unwrap();
    // data in two of the three trailing months
    add(&ledger, 2025, 4, 10, "food", 20.0);
    add(&ledger, 2025, 6, 3, "food", 40.0);

    let suggestions = suggest_limits_for_month(&ledger, "2025-07").unwrap();
    // mean(20, 40), not mean(20, 0, 40)
    assert!((suggestions["food"] - 30.0).abs() < 1e-9);
}

#[test]
fn test_suggest_category_only_in_target_month_is_zero() {
    let ledger = LedgerStore::open_in_memory().unwrap();
    add(&ledger, 2025, 6, 3, "food", 40.0);
    add(&ledger, 2025, 7, 2, "games", 60.0);

    let suggestions = suggest_limits_for_month(&ledger, "2025-07").unwrap();
    assert!((suggestions["food"] - 40.0).abs() < 1e-9);
    // no trailing history for games
    assert!((suggestions["games"] - 0.0).abs() < 1e-9);
}

#[test]
fn test_suggest_fallback_to_previous_month_when_average_cancels() {
    let ledger = LedgerStore::open_in_memory().unwrap();
    // a refund in May exactly cancels June in the average
    add(&ledger, 2025, 5, 12, "food", -50.0);
    add(&ledger, 2025, 6, 3, "food", 50.0);

    let suggestions = suggest_limits_for_month(&ledger, "2025-07").unwrap();
    // trailing mean is 0.0 for every category, so the previous month's
    // raw totals win
    assert!((suggestions["food"] - 50.0).abs() < 1e-9);
}

#[test]
fn test_suggest_rounds_to_cents() {
    let ledger = LedgerStore::open_in_memory().unwrap();
    add(&ledger, 2025, 4, 10, "food", 10.0);
    add(&ledger, 2025, 5, 12, "food", 10.0);
    add(&ledger, 2025, 6, 3, "food", 10.01);

    let suggestions = suggest_limits_for_month(&ledger, "2025-07").unwrap();
    // 30.01 / 3 = 10.003333... -> 10.0
    assert!((suggestions["food"] - 10.0).abs() < 1e-9);
}

// ── Limit checks ──────────────────────────────────────────────

#[test]
fn test_check_empty_range() {
    let ledger = LedgerStore::open_in_memory().unwrap();
    let warnings = check_budget_limits(
        &ledger,
        Some(date(2025, 7, 1)),
        Some(date(2025, 7, 31)),
        &LimitsTable::new(),
    )
    .unwrap();
    assert!(warnings.is_empty());
}

#[test]
fn test_check_over_limit() {
    let ledger = LedgerStore::open_in_memory().unwrap();
    add(&ledger, 2025, 7, 10, "food", 60.0);
    let limits = limits_table("2025-07", &[("food", 50.0)]);

    let warnings = check_budget_limits(
        &ledger,
        Some(date(2025, 7, 1)),
        Some(date(2025, 7, 31)),
        &limits,
    )
    .unwrap();
    assert_eq!(
        warnings,
        ["2025-07 food: $60.00 [over] (limit: $50.00)"]
    );
}

#[test]
fn test_check_within_limit() {
    let ledger = LedgerStore::open_in_memory().unwrap();
    add(&ledger, 2025, 7, 10, "food", 40.0);
    let limits = limits_table("2025-07", &[("food", 50.0)]);

    let warnings =
        check_budget_limits(&ledger, Some(date(2025, 7, 1)), Some(date(2025, 7, 31)), &limits)
            .unwrap();
    assert_eq!(warnings, ["2025-07 food: $40.00 [within] (limit: $50.00)"]);
}

#[test]
fn test_check_spend_equal_to_limit_is_within() {
    let ledger = LedgerStore::open_in_memory().unwrap();
    add(&ledger, 2025, 7, 10, "food", 50.0);
    let limits = limits_table("2025-07", &[("food", 50.0)]);

    let warnings =
        check_budget_limits(&ledger, None, None, &limits).unwrap();
    assert!(warnings[0].contains("[within]"));
}

#[test]
fn test_check_zero_limit_with_spend_is_over() {
    let ledger = LedgerStore::open_in_memory().unwrap();
    add(&ledger, 2025, 7, 10, "food", 0.01);
    let limits = limits_table("2025-07", &[("food", 0.0)]);

    let warnings = check_budget_limits(&ledger, None, None, &limits).unwrap();
    assert!(warnings[0].contains("[over]"));
}

#[test]
fn test_check_no_limit_emits_plain_line() {
    let ledger = LedgerStore::open_in_memory().unwrap();
    add(&ledger, 2025, 7, 10, "transport", 15.0);

    let warnings = check_budget_limits(&ledger, None, None, &LimitsTable::new()).unwrap();
    assert_eq!(warnings, ["2025-07 transport: $15.00"]);
}

#[test]
fn test_check_groups_by_month_and_category() {
    let ledger = LedgerStore::open_in_memory().unwrap();
    add(&ledger, 2025, 7, 10, "food", 20.0);
    add(&ledger, 2025, 7, 20, "food", 15.0);
    add(&ledger, 2025, 7, 11, "transport", 5.0);
    add(&ledger, 2025, 8, 1, "food", 12.0);

    let warnings = check_budget_limits(&ledger, None, None, &LimitsTable::new()).unwrap();
    assert_eq!(
        warnings,
        [
            "2025-07 food: $35.00",
            "2025-07 transport: $5.00",
            "2025-08 food: $12.00",
        ]
    );
}

#[test]
fn test_check_respects_range_bounds() {
    let ledger = LedgerStore::open_in_memory().unwrap();
    add(&ledger, 2025, 6, 30, "food", 10.0);
    add(&ledger, 2025, 7, 1, "food", 20.0);

    let warnings = check_budget_limits(
        &ledger,
        Some(date(2025, 7, 1)),
        None,
        &LimitsTable::new(),
    )
    .unwrap();
    assert_eq!(warnings, ["2025-07 food: $20.00"]);
}
