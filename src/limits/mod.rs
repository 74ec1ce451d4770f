use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::error::StoreError;
use crate::month;

/// Per-month category ceilings: `category -> limit`.
pub type CategoryLimits = BTreeMap<String, f64>;

/// The whole limits document: `YYYY-MM -> category -> limit`.
///
/// An absent month key means "no limits defined for that month"; a month
/// key mapping to an empty object means "explicitly no categories
/// limited" and must survive a save/load cycle as such.
pub type LimitsTable = BTreeMap<String, CategoryLimits>;

/// Durable storage of one profile's limits table as a single JSON
/// document. Corrupt or missing files read as empty; writes go through a
/// temp file and rename so a crash never leaves a truncated document.
pub struct LimitsStore {
    path: PathBuf,
}

impl LimitsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> LimitsTable {
        let Ok(data) = fs::read_to_string(&self.path) else {
            return LimitsTable::new();
        };
        match serde_json::from_str(&data) {
            Ok(table) => table,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    %err,
                    "limits document unreadable; treating as empty"
                );
                LimitsTable::new()
            }
        }
    }

    pub fn save(&self, table: &LimitsTable) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(table)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), months = table.len(), "limits saved");
        Ok(())
    }

    /// Replace the whole entry for one month.
    pub fn upsert_month(
        &self,
        month_key: &str,
        limits: CategoryLimits,
    ) -> Result<(), StoreError> {
        month::parse_month_key(month_key)?;
        let mut table = self.load();
        table.insert(month_key.to_string(), limits);
        self.save(&table)
    }

    /// Remove the month key entirely (distinct from setting all its
    /// values to zero). No-op if the key is absent.
    pub fn clear_month(&self, month_key: &str) -> Result<(), StoreError> {
        let mut table = self.load();
        if table.remove(month_key).is_some() {
            self.save(&table)?;
        }
        Ok(())
    }
}

// ── CSV interchange ───────────────────────────────────────────

/// Serialize one month's limits as `category,limit` rows, sorted by
/// category for determinism.
pub fn to_csv(limits: &CategoryLimits) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["category", "limit"])?;
    for (category, limit) in limits {
        writer.write_record([category.clone(), limit.to_string()])?;
    }
    Ok(writer.into_inner().map_err(|err| err.into_error())?)
}

/// Parse `category,limit` rows. Lenient by policy: rows with a blank
/// category or an unparsable limit are skipped silently rather than
/// failing the whole import.
pub fn from_csv(data: &[u8]) -> CategoryLimits {
    let mut out = CategoryLimits::new();
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(_) => return out,
    };
    let category_idx = headers.iter().position(|h| h.trim() == "category");
    let limit_idx = headers.iter().position(|h| h.trim() == "limit");
    let (Some(category_idx), Some(limit_idx)) = (category_idx, limit_idx) else {
        return out;
    };

    for record in reader.records() {
        let Ok(record) = record else { continue };
        let category = record.get(category_idx).map(str::trim).unwrap_or("");
        if category.is_empty() {
            continue;
        }
        let Some(Ok(limit)) = record.get(limit_idx).map(|v| v.trim().parse::<f64>()) else {
            continue;
        };
        out.insert(category.to_string(), limit);
    }
    out
}

#[cfg(test)]
mod tests;
