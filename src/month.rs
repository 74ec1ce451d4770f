use chrono::{Months, NaiveDate};

use crate::error::StoreError;

/// Month key for a date, e.g. `2025-07`.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Validate and split a `YYYY-MM` month key.
pub fn parse_month_key(key: &str) -> Result<(i32, u32), StoreError> {
    let invalid = || StoreError::InvalidMonthKey {
        key: key.to_string(),
    };
    let bytes = key.as_bytes();
    let well_formed = bytes.len() == 7
        && bytes[4] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || b.is_ascii_digit());
    if !well_formed {
        return Err(invalid());
    }
    let year: i32 = key[..4].parse().map_err(|_| invalid())?;
    let month: u32 = key[5..].parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

pub fn prev_month_key(key: &str) -> Result<String, StoreError> {
    let (year, month) = parse_month_key(key)?;
    Ok(if month == 1 {
        format!("{:04}-12", year - 1)
    } else {
        format!("{year:04}-{:02}", month - 1)
    })
}

/// The `len` consecutive month keys ending at `key`, newest first.
pub fn lookback_window(key: &str, len: usize) -> Result<Vec<String>, StoreError> {
    let mut months = Vec::with_capacity(len);
    let mut cur = key.to_string();
    for _ in 0..len {
        let prev = prev_month_key(&cur)?;
        months.push(cur);
        cur = prev;
    }
    Ok(months)
}

pub fn first_day(key: &str) -> Result<NaiveDate, StoreError> {
    let (year, month) = parse_month_key(key)?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| StoreError::InvalidMonthKey {
        key: key.to_string(),
    })
}

pub fn last_day(key: &str) -> Result<NaiveDate, StoreError> {
    let first = first_day(key)?;
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| StoreError::InvalidMonthKey {
            key: key.to_string(),
        })
}
