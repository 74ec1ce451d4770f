pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS expenses (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    date        TEXT NOT NULL,
    category    TEXT NOT NULL,
    amount      REAL NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);
CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category);

"#;

/// Columns that must be present for a pre-existing file to be usable.
/// A table missing any of these is a schema mismatch, not a migration
/// candidate.
pub(crate) const REQUIRED_COLUMNS: &[&str] = &["id", "date", "category", "amount"];

/// Additive migrations only: columns that may be bolted onto an older
/// table without touching existing data.
/// Each entry is (column, ddl).
pub(crate) const ADDITIVE_COLUMNS: &[(&str, &str)] = &[(
    "description",
    "ALTER TABLE expenses ADD COLUMN description TEXT NOT NULL DEFAULT ''",
)];
