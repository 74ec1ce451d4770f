use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the profile, ledger and limits stores.
///
/// Reads on missing resources do not error (they yield empty values);
/// these variants cover validation failures, invariant violations and
/// destructive operations against missing targets.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid profile handle {handle:?}: allowed [a-z0-9_-], 1..=32 chars")]
    InvalidHandle { handle: String },

    #[error("invalid month key {key:?}: expected YYYY-MM")]
    InvalidMonthKey { key: String },

    #[error("profile '{handle}' already exists")]
    AlreadyExists { handle: String },

    #[error("cannot delete '{handle}': it is the last remaining profile")]
    LastProfile { handle: String },

    #[error("profile '{handle}' not found")]
    ProfileNotFound { handle: String },

    #[error("no expense with id {id}")]
    ExpenseNotFound { id: i64 },

    #[error("ledger {path}: incompatible schema, missing column '{column}'")]
    SchemaMismatch { path: PathBuf, column: String },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
