use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::StoreError;
use crate::limits::CategoryLimits;

/// Changes smaller than this are noise, not edits.
pub const CHANGE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Save,
    ClearMonth,
    ImportCsv,
}

impl AuditKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditKind::Save => "save",
            AuditKind::ClearMonth => "clear_month",
            AuditKind::ImportCsv => "import_csv",
        }
    }
}

/// One recorded limits change: full before/after snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub ts: String,
    pub kind: AuditKind,
    pub user: String,
    pub month: String,
    pub before: CategoryLimits,
    pub after: CategoryLimits,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryChange {
    pub category: String,
    pub before: f64,
    pub after: f64,
}

#[derive(Serialize)]
struct DiffRecord<'a> {
    user: &'a str,
    month: &'a str,
    changes: Vec<CategoryChange>,
}

/// Append-only, process-lifetime trail of limit edits. Nothing is
/// persisted; hosts export or clear it explicitly.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record full before/after snapshots, unconditionally.
    pub fn append(
        &mut self,
        kind: AuditKind,
        user: &str,
        month: &str,
        before: CategoryLimits,
        after: CategoryLimits,
    ) {
        self.entries.push(AuditEntry {
            ts: now_ts(),
            kind,
            user: user.to_string(),
            month: month.to_string(),
            before,
            after,
        });
    }

    /// Record a save only when something actually changed. A no-op edit
    /// (every category within epsilon of its old value) is skipped
    /// entirely so the log stays meaningful. Returns whether an entry
    /// was appended.
    pub fn append_diff_only(
        &mut self,
        user: &str,
        month: &str,
        before: CategoryLimits,
        after: CategoryLimits,
    ) -> bool {
        if changed_categories(&before, &after).is_empty() {
            return false;
        }
        self.append(AuditKind::Save, user, month, before, after);
        true
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Irreversible; confirmation is the caller's concern.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // ── Exports ───────────────────────────────────────────────

    /// Pretty-printed JSON array of full entries.
    pub fn to_json(&self) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec_pretty(&self.entries)?)
    }

    /// Wide CSV of full entries. The header spans every category ever
    /// seen across all entries (`before_<cat>` / `after_<cat>`), with
    /// missing cells defaulting to 0.
    pub fn to_csv(&self) -> Result<Vec<u8>, StoreError> {
        let mut categories: BTreeSet<&str> = BTreeSet::new();
        for entry in &self.entries {
            categories.extend(entry.before.keys().map(String::as_str));
            categories.extend(entry.after.keys().map(String::as_str));
        }

        let mut header: Vec<String> = vec!["ts".into(), "kind".into(), "month".into()];
        header.extend(categories.iter().map(|c| format!("before_{c}")));
        header.extend(categories.iter().map(|c| format!("after_{c}")));

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&header)?;
        for entry in &self.entries {
            let mut row: Vec<String> = vec![
                entry.ts.clone(),
                entry.kind.as_str().to_string(),
                entry.month.clone(),
            ];
            row.extend(
                categories
                    .iter()
                    .map(|c| entry.before.get(*c).copied().unwrap_or(0.0).to_string()),
            );
            row.extend(
                categories
                    .iter()
                    .map(|c| entry.after.get(*c).copied().unwrap_or(0.0).to_string()),
            );
            writer.write_record(&row)?;
        }
        Ok(writer.into_inner().map_err(|err| err.into_error())?)
    }

    /// JSON array of per-entry change sets; entries without changes are
    /// omitted.
    pub fn diff_to_json(&self) -> Result<Vec<u8>, StoreError> {
        let records: Vec<DiffRecord> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let changes = changed_categories(&entry.before, &entry.after);
                if changes.is_empty() {
                    return None;
                }
                Some(DiffRecord {
                    user: &entry.user,
                    month: &entry.month,
                    changes,
                })
            })
            .collect();
        Ok(serde_json::to_vec_pretty(&records)?)
    }

    /// Flat CSV of changes: one row per changed category, not per
    /// entry.
    pub fn diff_to_csv(&self) -> Result<Vec<u8>, StoreError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["user", "month", "category", "before", "after"])?;
        for entry in &self.entries {
            for change in changed_categories(&entry.before, &entry.after) {
                writer.write_record([
                    entry.user.clone(),
                    entry.month.clone(),
                    change.category,
                    change.before.to_string(),
                    change.after.to_string(),
                ])?;
            }
        }
        Ok(writer.into_inner().map_err(|err| err.into_error())?)
    }
}

/// Categories whose value moved by more than [`CHANGE_EPSILON`] between
/// the two snapshots, over the union of their keys, sorted by category.
pub fn changed_categories(
    before: &CategoryLimits,
    after: &CategoryLimits,
) -> Vec<CategoryChange> {
    let categories: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
    categories
        .into_iter()
        .filter_map(|category| {
            let old = before.get(category).copied().unwrap_or(0.0);
            let new = after.get(category).copied().unwrap_or(0.0);
            if (old - new).abs() > CHANGE_EPSILON {
                Some(CategoryChange {
                    category: category.clone(),
                    before: old,
                    after: new,
                })
            } else {
                None
            }
        })
        .collect()
}

fn now_ts() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}
