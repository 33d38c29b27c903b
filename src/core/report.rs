//! Report generation business logic.
//!
//! Status counts, deadline watch and the one-line order summaries the bot prints.
//! Everything here reads the stored status; nothing recomputes it.

use crate::{
    core::{document::OrderDocument, order as order_service},
    entities::{OrderStatus, order},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Number of active orders in each status, in workflow order. Statuses with no
/// orders are included with a count of zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSummary {
    /// `(status, count)` pairs
    pub counts: Vec<(OrderStatus, usize)>,
    /// Total active orders
    pub total: usize,
}

impl StatusSummary {
    /// Count for a single status.
    #[must_use]
    pub fn count(&self, status: OrderStatus) -> usize {
        self.counts
            .iter()
            .find(|(candidate, _)| *candidate == status)
            .map_or(0, |(_, count)| *count)
    }
}

/// An order whose deadline is close or already past.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadlineEntry {
    /// The order
    pub order: order::Model,
    /// Days until the deadline, negative when overdue
    pub days_left: i64,
}

/// Counts active orders per status.
pub async fn status_summary(db: &DatabaseConnection) -> Result<StatusSummary> {
    let orders = order_service::list_active_orders(db, None).await?;
    let counts = OrderStatus::ALL
        .iter()
        .map(|status| {
            let count = orders.iter().filter(|order| order.status == *status).count();
            (*status, count)
        })
        .collect();

    Ok(StatusSummary {
        counts,
        total: orders.len(),
    })
}

/// Active, unfinished orders due within `within_days` of `today` (overdue ones
/// included), earliest deadline first.
pub async fn deadline_watch(
    db: &DatabaseConnection,
    today: NaiveDate,
    within_days: i64,
) -> Result<Vec<DeadlineEntry>> {
    let orders = order_service::list_active_orders(db, None).await?;
    Ok(orders
        .into_iter()
        .filter(|order| order.status != OrderStatus::Completed)
        .map(|order| {
            let days_left = (order.deadline - today).num_days();
            DeadlineEntry { order, days_left }
        })
        .filter(|entry| entry.days_left <= within_days)
        .collect())
}

/// `(completed, total)` production steps.
#[must_use]
pub fn step_progress(document: &OrderDocument) -> (usize, usize) {
    let done = document.steps.iter().filter(|step| step.completed).count();
    (done, document.steps.len())
}

/// Generates a progress bar string like `[████████░░] 4/5`.
#[must_use]
pub fn format_progress_bar(done: usize, total: usize, bar_length: usize) -> String {
    let filled = if total == 0 {
        bar_length
    } else {
        (done.min(total) * bar_length + total / 2) / total
    };
    let empty = bar_length.saturating_sub(filled);
    format!("[{}{}] {done}/{total}", "█".repeat(filled), "░".repeat(empty))
}

/// Human wording for [`DeadlineEntry::days_left`].
#[must_use]
pub fn format_deadline(days_left: i64) -> String {
    match days_left {
        0 => "due today".to_string(),
        1 => "due tomorrow".to_string(),
        d if d < 0 => format!("overdue by {}d", -d),
        d => format!("due in {d}d"),
    }
}

/// One-line summary of an order.
#[must_use]
pub fn format_status_line(order: &order::Model) -> String {
    format!(
        "`{}` | {} | {} pcs {} | **{}** | deadline {}",
        order.production_code,
        order.customer_name,
        order.quantity,
        order.production_type,
        order.status,
        order.deadline.format("%Y-%m-%d"),
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::order::{complete_step, upload_approval};
    use crate::test_utils::*;

    #[test]
    fn test_format_progress_bar() {
        assert_eq!(format_progress_bar(0, 4, 8), "[░░░░░░░░] 0/4");
        assert_eq!(format_progress_bar(2, 4, 8), "[████░░░░] 2/4");
        assert_eq!(format_progress_bar(4, 4, 8), "[████████] 4/4");
        // No steps counts as done
        assert_eq!(format_progress_bar(0, 0, 4), "[████] 0/0");
    }

    #[test]
    fn test_format_deadline() {
        assert_eq!(format_deadline(-3), "overdue by 3d");
        assert_eq!(format_deadline(0), "due today");
        assert_eq!(format_deadline(1), "due tomorrow");
        assert_eq!(format_deadline(5), "due in 5d");
    }

    #[tokio::test]
    async fn test_status_summary_integration() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        let first = create_test_order(&db, &boss, "dtf").await?;
        create_test_order(&db, &boss, "dtf").await?;
        create_test_order(&db, &boss, "manual").await?;
        upload_approval(&db, &boss, first.id, "design.pdf").await?;

        let summary = status_summary(&db).await?;
        assert_eq!(summary.total, 3);
        assert_eq!(summary.counts.len(), OrderStatus::ALL.len());
        assert_eq!(summary.count(OrderStatus::OrderReceived), 2);
        assert_eq!(summary.count(OrderStatus::InProcess), 1);
        assert_eq!(summary.count(OrderStatus::Completed), 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_deadline_watch_integration() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        // Test orders are due on the 20th
        let order = create_test_order(&db, &boss, "dtf").await?;
        let today = order.deadline - chrono::Duration::days(5);

        assert!(deadline_watch(&db, today, 3).await?.is_empty());
        let due = deadline_watch(&db, today, 7).await?;
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].days_left, 5);

        let late = deadline_watch(&db, order.deadline + chrono::Duration::days(2), 0).await?;
        assert_eq!(late[0].days_left, -2);

        Ok(())
    }

    #[tokio::test]
    async fn test_step_progress_and_status_line() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        let order = create_test_order(&db, &boss, "dtf").await?;
        upload_approval(&db, &boss, order.id, "design.pdf").await?;
        let order = complete_step(&db, &boss, order.id, 2, None).await?;

        let document = crate::core::order::document(&order)?;
        assert_eq!(step_progress(&document), (1, 2));

        let line = format_status_line(&order);
        assert!(line.starts_with("`ORD-202610-001`"));
        assert!(line.contains("In Process"));
        assert!(line.contains("deadline 2026-10-20"));

        Ok(())
    }
}
