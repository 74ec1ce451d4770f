mod schema;

use chrono::NaiveDate;
use rusqlite::{params, Connection, ErrorCode};
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::models::{Expense, ExpenseFilter};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Durable, queryable storage of expense rows for one profile.
///
/// One SQLite file per profile; opening ensures the schema exists, so a
/// missing file is always repaired in place. A file that is present but
/// structurally incompatible fails with `SchemaMismatch` instead of
/// being silently rewritten.
#[derive(Debug)]
pub struct LedgerStore {
    conn: Connection,
    path: PathBuf,
}

impl LedgerStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        match Self::try_open(path) {
            Ok(store) => Ok(store),
            Err(StoreError::Sqlite(err)) if is_not_a_database(&err) => {
                // Not a SQLite file at all. Quarantine it and start fresh;
                // the data is personal-scale and availability wins here.
                let quarantined = quarantine_path(path);
                tracing::warn!(
                    path = %path.display(),
                    quarantined = %quarantined.display(),
                    "ledger file is not a database; moving it aside and re-initializing"
                );
                std::fs::rename(path, &quarantined)?;
                Self::try_open(path)
            }
            Err(err) => Err(err),
        }
    }

    fn try_open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let store = Self {
            conn,
            path: path.to_path_buf(),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn,
            path: PathBuf::from(":memory:"),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Create the table and indices if absent, then verify the column
    /// layout. Idempotent and cheap; called on every open.
    fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(schema::SCHEMA)?;

        let columns = self.column_names()?;
        for required in schema::REQUIRED_COLUMNS {
            if !columns.iter().any(|c| c == required) {
                return Err(StoreError::SchemaMismatch {
                    path: self.path.clone(),
                    column: (*required).to_string(),
                });
            }
        }
        for (column, ddl) in schema::ADDITIVE_COLUMNS {
            if !columns.iter().any(|c| c == column) {
                tracing::debug!(column, "adding missing ledger column");
                self.conn.execute(ddl, [])?;
            }
        }
        Ok(())
    }

    fn column_names(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare("PRAGMA table_info(expenses)")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    // ── Expenses ──────────────────────────────────────────────

    pub fn add_expense(&self, expense: &Expense) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO expenses (date, category, amount, description) VALUES (?1, ?2, ?3, ?4)",
            params![
                expense.date.format(DATE_FORMAT).to_string(),
                expense.category,
                expense.amount,
                expense.description,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Matching rows, newest first (date desc, then id desc).
    pub fn query(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>, StoreError> {
        let mut sql = String::from(
            "SELECT id, date, category, amount, description FROM expenses WHERE 1=1",
        );
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(start) = filter.start {
            sql.push_str(&format!(" AND date >= ?{}", param_values.len() + 1));
            param_values.push(Box::new(start.format(DATE_FORMAT).to_string()));
        }
        if let Some(end) = filter.end {
            sql.push_str(&format!(" AND date <= ?{}", param_values.len() + 1));
            param_values.push(Box::new(end.format(DATE_FORMAT).to_string()));
        }
        if let Some(category) = &filter.category {
            sql.push_str(&format!(" AND category = ?{}", param_values.len() + 1));
            param_values.push(Box::new(category.clone()));
        }

        sql.push_str(" ORDER BY date DESC, id DESC");

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), row_to_expense)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn update_expense(&self, id: i64, expense: &Expense) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE expenses SET date = ?1, category = ?2, amount = ?3, description = ?4
             WHERE id = ?5",
            params![
                expense.date.format(DATE_FORMAT).to_string(),
                expense.category,
                expense.amount,
                expense.description,
                id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::ExpenseNotFound { id });
        }
        Ok(())
    }

    pub fn delete_expense(&self, id: i64) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM expenses WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::ExpenseNotFound { id });
        }
        Ok(())
    }

    // ── Categories ────────────────────────────────────────────

    /// Distinct categories observed in the ledger, sorted. Consumers
    /// union this with the limit-table keys so a category with a limit
    /// but no transactions still appears.
    pub fn distinct_categories(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT category FROM expenses ORDER BY category")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    // ── Export ────────────────────────────────────────────────

    /// Write matching rows to a CSV file, oldest first. Returns the row
    /// count.
    pub fn export_to_csv(
        &self,
        path: &Path,
        filter: &ExpenseFilter,
    ) -> Result<usize, StoreError> {
        let mut rows = self.query(filter)?;
        rows.reverse();

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["date", "category", "amount", "description"])?;
        for expense in &rows {
            writer.write_record([
                expense.date.format(DATE_FORMAT).to_string(),
                expense.category.clone(),
                expense.amount.to_string(),
                expense.description.clone(),
            ])?;
        }
        writer.flush()?;
        Ok(rows.len())
    }
}

fn row_to_expense(row: &rusqlite::Row) -> rusqlite::Result<Expense> {
    let date_str: String = row.get(1)?;
    let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(err))
    })?;
    Ok(Expense {
        id: Some(row.get(0)?),
        date,
        category: row.get(2)?,
        amount: row.get(3)?,
        description: row.get(4)?,
    })
}

fn is_not_a_database(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _) if inner.code == ErrorCode::NotADatabase
    )
}

fn quarantine_path(path: &Path) -> PathBuf {
    let mut quarantined = path.as_os_str().to_owned();
    quarantined.push(".corrupt");
    PathBuf::from(quarantined)
}
