use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::path::Path;

use ledgerly::advisor;
use ledgerly::audit::{AuditKind, AuditLog};
use ledgerly::ledger::LedgerStore;
use ledgerly::limits::{self, LimitsStore};
use ledgerly::models::{Expense, ExpenseFilter};
use ledgerly::profiles::{self, ProfileStore};

/// Entry validation (amount > 0, non-empty category, well-formed dates)
/// lives here: the stores trust their callers, and this CLI is the
/// caller.
pub(crate) fn run(args: &[String], store: &ProfileStore) -> Result<()> {
    let (profile, rest) = extract_profile_flag(&args[1..]);
    let profile = match profile {
        Some(raw) => profiles::normalize_handle(&raw)?,
        None => "default".to_string(),
    };
    let mut audit = AuditLog::new();

    let result = match rest.first().map(String::as_str) {
        None => {
            print_usage();
            Ok(())
        }
        Some("add") => cli_add(&rest[1..], store, &profile),
        Some("list") => cli_list(&rest[1..], store, &profile),
        Some("categories") => cli_categories(store, &profile),
        Some("export") => cli_export(&rest[1..], store, &profile),
        Some("suggest") => cli_suggest(&rest[1..], store, &profile, &mut audit),
        Some("check") => cli_check(&rest[1..], store, &profile),
        Some("limits") => cli_limits(&rest[1..], store, &profile, &mut audit),
        Some("profiles") => cli_profiles(&rest[1..], store),
        Some("--help" | "-h" | "help") => {
            print_usage();
            Ok(())
        }
        Some("--version" | "-V" | "version") => {
            println!("ledgerly {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(other) => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    };

    if !audit.is_empty() {
        tracing::info!(entries = audit.len(), "limit changes recorded this run");
    }
    result
}

fn print_usage() {
    println!("Ledgerly — local-only, multi-profile expense ledger");
    println!();
    println!("Usage: ledgerly [--profile <handle>] <command>");
    println!();
    println!("Commands:");
    println!("  add <YYYY-MM-DD> <category> <amount> [description]");
    println!("                                Record an expense");
    println!("  list [--from D] [--to D] [--category C]");
    println!("                                List matching expenses (newest first)");
    println!("  categories                    List known categories");
    println!("  export <file.csv> [--from D] [--to D] [--category C]");
    println!("                                Export matching expenses to CSV");
    println!("  suggest [YYYY-MM] [--save]    Suggest limits from recent history");
    println!("  check [--from D] [--to D]     Evaluate spend against monthly limits");
    println!("  limits show <YYYY-MM>         Show limits for a month");
    println!("  limits set <YYYY-MM> <category> <amount>");
    println!("  limits clear <YYYY-MM>        Remove all limits for a month");
    println!("  limits export <YYYY-MM> <file.csv>");
    println!("  limits import <YYYY-MM> <file.csv>");
    println!("  profiles [list]               List profiles");
    println!("  profiles create <handle>");
    println!("  profiles rename <old> <new>");
    println!("  profiles archive <handle>");
    println!("  profiles delete <handle> [--no-archive]");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
}

fn open_ledger(store: &ProfileStore, profile: &str) -> Result<LedgerStore> {
    let paths = store.resolve(profile);
    Ok(LedgerStore::open(&paths.ledger)?)
}

fn open_limits(store: &ProfileStore, profile: &str) -> LimitsStore {
    LimitsStore::new(store.resolve(profile).limits)
}

// ── Expenses ─────────────────────────────────────────────────

fn cli_add(args: &[String], store: &ProfileStore, profile: &str) -> Result<()> {
    if args.len() < 3 {
        anyhow::bail!("Usage: ledgerly add <YYYY-MM-DD> <category> <amount> [description]");
    }

    let date = parse_date(&args[0])?;
    let category = args[1].trim();
    if category.is_empty() {
        anyhow::bail!("Category must not be empty");
    }
    let amount: f64 = args[2]
        .parse()
        .with_context(|| format!("Invalid amount '{}'", args[2]))?;
    if amount <= 0.0 {
        anyhow::bail!("Amount must be greater than zero");
    }
    let description = args[3..].join(" ");

    let ledger = open_ledger(store, profile)?;
    let expense = Expense::new(date, category.to_string(), amount, description);
    let id = ledger.add_expense(&expense)?;
    println!("Added expense #{id}: {date} {category} ${amount:.2}");
    Ok(())
}

fn cli_list(args: &[String], store: &ProfileStore, profile: &str) -> Result<()> {
    let filter = parse_filter(args)?;
    let ledger = open_ledger(store, profile)?;
    let rows = ledger.query(&filter)?;
    if rows.is_empty() {
        println!("No expenses found");
        return Ok(());
    }

    let total: f64 = rows.iter().map(|e| e.amount).sum();
    println!("{:<12} {:<16} {:>10}  Description", "Date", "Category", "Amount");
    println!("{}", "─".repeat(55));
    for expense in &rows {
        println!(
            "{:<12} {:<16} {:>10.2}  {}",
            expense.date.format("%Y-%m-%d"),
            expense.category,
            expense.amount,
            expense.description,
        );
    }
    println!("{}", "─".repeat(55));
    println!("{} expenses, total ${total:.2}", rows.len());
    Ok(())
}

fn cli_categories(store: &ProfileStore, profile: &str) -> Result<()> {
    let ledger = open_ledger(store, profile)?;
    let table = open_limits(store, profile).load();

    // union with limit-table keys so a category with a limit but no
    // transactions still shows up
    let mut categories: BTreeSet<String> = ledger.distinct_categories()?.into_iter().collect();
    for month_limits in table.values() {
        categories.extend(month_limits.keys().cloned());
    }

    if categories.is_empty() {
        println!("No categories yet");
    }
    for category in categories {
        println!("{category}");
    }
    Ok(())
}

fn cli_export(args: &[String], store: &ProfileStore, profile: &str) -> Result<()> {
    let Some(path) = args.first().filter(|a| !a.starts_with('-')) else {
        anyhow::bail!("Usage: ledgerly export <file.csv> [--from D] [--to D] [--category C]");
    };
    let filter = parse_filter(&args[1..])?;
    let ledger = open_ledger(store, profile)?;
    let count = ledger.export_to_csv(Path::new(path), &filter)?;
    if count == 0 {
        println!("No expenses matched; wrote header only to {path}");
    } else {
        println!("Exported {count} expenses to {path}");
    }
    Ok(())
}

// ── Advisory ─────────────────────────────────────────────────

fn cli_suggest(
    args: &[String],
    store: &ProfileStore,
    profile: &str,
    audit: &mut AuditLog,
) -> Result<()> {
    let month_key = args
        .first()
        .filter(|a| !a.starts_with('-'))
        .cloned()
        .unwrap_or_else(current_month);
    let save = args.iter().any(|a| a == "--save");

    let ledger = open_ledger(store, profile)?;
    let suggestions = advisor::suggest_limits_for_month(&ledger, &month_key)?;
    if suggestions.is_empty() {
        println!("No history to suggest limits for {month_key}");
        return Ok(());
    }

    println!("Suggested limits for {month_key}:");
    for (category, value) in &suggestions {
        println!("  {category:<16} ${value:.2}");
    }

    if save {
        let limits_store = open_limits(store, profile);
        let before = limits_store.load().remove(&month_key).unwrap_or_default();
        limits_store.upsert_month(&month_key, suggestions.clone())?;
        audit.append_diff_only(profile, &month_key, before, suggestions);
        println!("Saved as limits for {month_key}");
    }
    Ok(())
}

fn cli_check(args: &[String], store: &ProfileStore, profile: &str) -> Result<()> {
    let start = parse_date_flag(args, "--from")?;
    let end = parse_date_flag(args, "--to")?;

    let ledger = open_ledger(store, profile)?;
    let table = open_limits(store, profile).load();
    let warnings = advisor::check_budget_limits(&ledger, start, end, &table)?;
    if warnings.is_empty() {
        println!("No expenses in range");
        return Ok(());
    }
    for warning in warnings {
        println!("{warning}");
    }
    Ok(())
}

// ── Limits ───────────────────────────────────────────────────

fn cli_limits(
    args: &[String],
    store: &ProfileStore,
    profile: &str,
    audit: &mut AuditLog,
) -> Result<()> {
    let usage = "Usage: ledgerly limits <show|set|clear|export|import> <YYYY-MM> ...";
    let (Some(action), Some(month_key)) = (args.first(), args.get(1)) else {
        anyhow::bail!(usage);
    };
    let limits_store = open_limits(store, profile);

    match action.as_str() {
        "show" => {
            let table = limits_store.load();
            match table.get(month_key.as_str()) {
                None => println!("No limits defined for {month_key}"),
                Some(month_limits) if month_limits.is_empty() => {
                    println!("No categories limited for {month_key}");
                }
                Some(month_limits) => {
                    for (category, limit) in month_limits {
                        println!("  {category:<16} ${limit:.2}");
                    }
                }
            }
        }
        "set" => {
            let (Some(category), Some(raw_amount)) = (args.get(2), args.get(3)) else {
                anyhow::bail!("Usage: ledgerly limits set <YYYY-MM> <category> <amount>");
            };
            let category = category.trim();
            if category.is_empty() {
                anyhow::bail!("Category must not be empty");
            }
            let amount: f64 = raw_amount
                .parse()
                .with_context(|| format!("Invalid amount '{raw_amount}'"))?;
            if amount < 0.0 {
                anyhow::bail!("Limit must not be negative");
            }

            let before = limits_store
                .load()
                .remove(month_key.as_str())
                .unwrap_or_default();
            let mut after = before.clone();
            after.insert(category.to_string(), amount);
            limits_store.upsert_month(month_key, after.clone())?;
            audit.append_diff_only(profile, month_key, before, after);
            println!("Set {month_key} {category} = ${amount:.2}");
        }
        "clear" => {
            let before = limits_store
                .load()
                .remove(month_key.as_str())
                .unwrap_or_default();
            limits_store.clear_month(month_key)?;
            audit.append(
                AuditKind::ClearMonth,
                profile,
                month_key,
                before,
                Default::default(),
            );
            println!("Cleared limits for {month_key}");
        }
        "export" => {
            let Some(path) = args.get(2) else {
                anyhow::bail!("Usage: ledgerly limits export <YYYY-MM> <file.csv>");
            };
            let month_limits = limits_store
                .load()
                .remove(month_key.as_str())
                .unwrap_or_default();
            std::fs::write(path, limits::to_csv(&month_limits)?)
                .with_context(|| format!("Failed to write {path}"))?;
            println!("Exported {} limits to {path}", month_limits.len());
        }
        "import" => {
            let Some(path) = args.get(2) else {
                anyhow::bail!("Usage: ledgerly limits import <YYYY-MM> <file.csv>");
            };
            let data =
                std::fs::read(path).with_context(|| format!("Failed to read {path}"))?;
            let imported = limits::from_csv(&data);
            let before = limits_store
                .load()
                .remove(month_key.as_str())
                .unwrap_or_default();
            limits_store.upsert_month(month_key, imported.clone())?;
            audit.append(AuditKind::ImportCsv, profile, month_key, before, imported.clone());
            println!("Imported {} limits for {month_key}", imported.len());
        }
        other => {
            anyhow::bail!("{usage} (got '{other}')");
        }
    }
    Ok(())
}

// ── Profiles ─────────────────────────────────────────────────

fn cli_profiles(args: &[String], store: &ProfileStore) -> Result<()> {
    match args.first().map(String::as_str) {
        None | Some("list") => {
            for handle in store.list()? {
                println!("{handle}");
            }
        }
        Some("create") => {
            let Some(raw) = args.get(1) else {
                anyhow::bail!("Usage: ledgerly profiles create <handle>");
            };
            let handle = store.create(raw)?;
            println!("Profile '{handle}' ready");
        }
        Some("rename") => {
            let (Some(old), Some(new)) = (args.get(1), args.get(2)) else {
                anyhow::bail!("Usage: ledgerly profiles rename <old> <new>");
            };
            store.rename(old, new)?;
            println!("Renamed '{old}' to '{new}'");
        }
        Some("archive") => {
            let Some(handle) = args.get(1) else {
                anyhow::bail!("Usage: ledgerly profiles archive <handle>");
            };
            let target = store.archive(handle)?;
            println!("Archived '{handle}' to {}", target.display());
        }
        Some("delete") => {
            let Some(handle) = args.get(1) else {
                anyhow::bail!("Usage: ledgerly profiles delete <handle> [--no-archive]");
            };
            let archive_first = !args.iter().any(|a| a == "--no-archive");
            store.delete(handle, archive_first)?;
            println!("Deleted '{handle}'");
        }
        Some(other) => {
            anyhow::bail!("Unknown profiles action: {other}");
        }
    }
    Ok(())
}

// ── Arg helpers ──────────────────────────────────────────────

fn extract_profile_flag(args: &[String]) -> (Option<String>, Vec<String>) {
    let mut profile = None;
    let mut rest = Vec::with_capacity(args.len());
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--profile" {
            profile = iter.next().cloned();
        } else {
            rest.push(arg.clone());
        }
    }
    (profile, rest)
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{raw}' (expected YYYY-MM-DD)"))
}

fn parse_date_flag(args: &[String], name: &str) -> Result<Option<NaiveDate>> {
    flag_value(args, name).map(parse_date).transpose()
}

fn parse_filter(args: &[String]) -> Result<ExpenseFilter> {
    Ok(ExpenseFilter {
        start: parse_date_flag(args, "--from")?,
        end: parse_date_flag(args, "--to")?,
        category: flag_value(args, "--category").map(str::to_string),
    })
}

fn current_month() -> String {
    chrono::Local::now().format("%Y-%m").to_string()
}
