//! Monthly production codes.
//!
//! Each calendar month has its own counter in the `sequences` table, so codes read
//! `ORD-202610-001`, `ORD-202610-002`, ... and restart at `001` in November.
//! Allocation must run inside the same database transaction as the order insert.

use crate::{
    entities::{Sequence, sequence},
    errors::Result,
};
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{Set, prelude::*};

const PRODUCTION_CODE_KEY: &str = "production_code_seq";

/// Counter key for the month containing `date` (`production_code_seq:YYYY-MM`).
#[must_use]
pub fn month_key(date: NaiveDate) -> String {
    format!("{PRODUCTION_CODE_KEY}:{:04}-{:02}", date.year(), date.month())
}

/// Formats a production code.
#[must_use]
pub fn format_production_code(prefix: &str, date: NaiveDate, number: i64) -> String {
    format!(
        "{}-{:04}{:02}-{number:03}",
        prefix.trim(),
        date.year(),
        date.month()
    )
}

/// Increments the named counter and returns the new value, starting at 1.
pub async fn next_value<C>(db: &C, key: &str) -> Result<i64>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();
    let existing = Sequence::find()
        .filter(sequence::Column::Key.eq(key))
        .one(db)
        .await?;

    if let Some(counter) = existing {
        let next = counter.value + 1;
        let mut active_model: sequence::ActiveModel = counter.into();
        active_model.value = Set(next);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
        Ok(next)
    } else {
        let counter = sequence::ActiveModel {
            key: Set(key.to_string()),
            value: Set(1),
            updated_at: Set(now),
            ..Default::default()
        };
        counter.insert(db).await?;
        Ok(1)
    }
}

/// Allocates the next production code for an order taken on `intake_date`.
pub async fn next_production_code<C>(db: &C, prefix: &str, intake_date: NaiveDate) -> Result<String>
where
    C: ConnectionTrait,
{
    let number = next_value(db, &month_key(intake_date)).await?;
    Ok(format_production_code(prefix, intake_date, number))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_production_code() {
        assert_eq!(
            format_production_code("ORD", date(2026, 3, 9), 7),
            "ORD-202603-007"
        );
        assert_eq!(
            format_production_code(" SP ", date(2026, 12, 31), 1234),
            "SP-202612-1234"
        );
    }

    #[test]
    fn test_month_key() {
        assert_eq!(month_key(date(2026, 10, 19)), "production_code_seq:2026-10");
    }

    #[tokio::test]
    async fn test_codes_are_sequential_per_month() -> Result<()> {
        let db = setup_test_db().await?;

        let oct_1 = next_production_code(&db, "ORD", date(2026, 10, 1)).await?;
        let oct_2 = next_production_code(&db, "ORD", date(2026, 10, 31)).await?;
        let nov_1 = next_production_code(&db, "ORD", date(2026, 11, 2)).await?;
        let oct_3 = next_production_code(&db, "ORD", date(2026, 10, 15)).await?;

        assert_eq!(oct_1, "ORD-202610-001");
        assert_eq!(oct_2, "ORD-202610-002");
        assert_eq!(nov_1, "ORD-202611-001");
        assert_eq!(oct_3, "ORD-202610-003");

        Ok(())
    }
}
