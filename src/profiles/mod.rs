use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use crate::error::StoreError;
use crate::ledger::LedgerStore;

const LEDGER_SUFFIX: &str = "_expenses.db";
const LIMITS_SUFFIX: &str = "_budget_limits.json";
const DEFAULT_HANDLE: &str = "default";
const MAX_HANDLE_LEN: usize = 32;

/// Storage locations for one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePaths {
    pub ledger: PathBuf,
    pub limits: PathBuf,
}

/// Maps profile handles to concrete storage locations and manages
/// profile lifecycle. All profile files live flat in one data directory,
/// named `<handle>_expenses.db` and `<handle>_budget_limits.json`;
/// archived profiles move to timestamped directories under `archive/`.
pub struct ProfileStore {
    data_dir: PathBuf,
    archive_dir: PathBuf,
}

impl ProfileStore {
    pub fn open(data_dir: PathBuf) -> Result<Self, StoreError> {
        let archive_dir = data_dir.join("archive");
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            archive_dir,
        })
    }

    // ── Path resolution (pure) ────────────────────────────────

    pub fn ledger_path(&self, handle: &str) -> PathBuf {
        self.data_dir.join(format!("{handle}{LEDGER_SUFFIX}"))
    }

    pub fn limits_path(&self, handle: &str) -> PathBuf {
        self.data_dir.join(format!("{handle}{LIMITS_SUFFIX}"))
    }

    /// Both storage paths for a handle. Never fails and never touches
    /// the filesystem; the paths need not exist yet.
    pub fn resolve(&self, handle: &str) -> ProfilePaths {
        ProfilePaths {
            ledger: self.ledger_path(handle),
            limits: self.limits_path(handle),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Handles present on disk, lexicographically sorted. A handle
    /// counts as present if either of its files exists. An empty data
    /// dir yields `["default"]` so at least one profile always exists.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut handles = BTreeSet::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(handle) = name.strip_suffix(LEDGER_SUFFIX) {
                handles.insert(handle.to_string());
            } else if let Some(handle) = name.strip_suffix(LIMITS_SUFFIX) {
                handles.insert(handle.to_string());
            }
        }
        if handles.is_empty() {
            handles.insert(DEFAULT_HANDLE.to_string());
        }
        Ok(handles.into_iter().collect())
    }

    /// Materialize the profile's files if absent and return the
    /// normalized handle. Idempotent: an existing profile (under any
    /// casing of the same handle) is not an error.
    pub fn create(&self, raw: &str) -> Result<String, StoreError> {
        let handle = normalize_handle(raw)?;
        let limits = self.limits_path(&handle);
        if !limits.exists() {
            fs::write(&limits, "{}")?;
        }
        LedgerStore::open(&self.ledger_path(&handle))?;
        tracing::info!(%handle, "profile ready");
        Ok(handle)
    }

    /// Rename both files. The two renames run in sequence; if the second
    /// fails the first is not rolled back (documented limitation).
    pub fn rename(&self, old: &str, new: &str) -> Result<(), StoreError> {
        let old = normalize_handle(old)?;
        let new = normalize_handle(new)?;
        let from = self.resolve(&old);
        let to = self.resolve(&new);

        if !from.ledger.exists() && !from.limits.exists() {
            return Err(StoreError::ProfileNotFound { handle: old });
        }
        if to.ledger.exists() || to.limits.exists() {
            return Err(StoreError::AlreadyExists { handle: new });
        }

        if from.ledger.exists() {
            fs::rename(&from.ledger, &to.ledger)?;
        }
        if from.limits.exists() {
            fs::rename(&from.limits, &to.limits)?;
        }
        tracing::info!(%old, %new, "profile renamed");
        Ok(())
    }

    /// Move the profile's files into a timestamped archive directory.
    /// Nothing is deleted.
    pub fn archive(&self, handle: &str) -> Result<PathBuf, StoreError> {
        let handle = normalize_handle(handle)?;
        let paths = self.resolve(&handle);
        if !paths.ledger.exists() && !paths.limits.exists() {
            return Err(StoreError::ProfileNotFound { handle });
        }

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let target = self.archive_dir.join(format!("{handle}_{stamp}"));
        fs::create_dir_all(&target)?;

        for path in [&paths.ledger, &paths.limits] {
            if path.exists() {
                if let Some(name) = path.file_name() {
                    fs::rename(path, target.join(name))?;
                }
            }
        }
        tracing::info!(%handle, target = %target.display(), "profile archived");
        Ok(target)
    }

    /// Remove a profile. The last-profile invariant is checked before
    /// anything is touched: deleting the only remaining profile fails
    /// and performs no filesystem mutation.
    pub fn delete(&self, handle: &str, archive_first: bool) -> Result<(), StoreError> {
        let handle = normalize_handle(handle)?;
        let paths = self.resolve(&handle);
        if !paths.ledger.exists() && !paths.limits.exists() {
            return Err(StoreError::ProfileNotFound { handle });
        }

        let remaining = self.list()?.into_iter().filter(|h| *h != handle).count();
        if remaining == 0 {
            return Err(StoreError::LastProfile { handle });
        }

        if archive_first {
            self.archive(&handle)?;
            return Ok(());
        }
        for path in [&paths.ledger, &paths.limits] {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        tracing::info!(%handle, "profile deleted");
        Ok(())
    }
}

/// Trim, lowercase, then require `[a-z0-9_-]{1,32}` (the same charset a
/// handle may use inside file names).
pub fn normalize_handle(raw: &str) -> Result<String, StoreError> {
    let handle = raw.trim().to_lowercase();
    let valid = !handle.is_empty()
        && handle.len() <= MAX_HANDLE_LEN
        && handle
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-'));
    if !valid {
        return Err(StoreError::InvalidHandle {
            handle: raw.to_string(),
        });
    }
    Ok(handle)
}
