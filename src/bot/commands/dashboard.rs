//! Dashboard Discord commands - `/summary` and `/notifications`.

use crate::{
    core::report::{DeadlineEntry, StatusSummary, format_deadline},
    entities::NotificationModel,
    errors::Result,
};
use std::fmt::Write;

/// Orders due within this many days show up in `/summary`.
const DEADLINE_WINDOW_DAYS: i64 = 3;

/// Status counts followed by the deadline watch list.
pub fn format_summary(summary: &StatusSummary, due: &[DeadlineEntry]) -> Result<String> {
    let mut response = format!("📊 **Dashboard** - {} active orders\n\n", summary.total);
    for (status, count) in &summary.counts {
        writeln!(&mut response, "{status}: **{count}**")?;
    }

    if due.is_empty() {
        writeln!(
            &mut response,
            "\n_Nothing due in the next {DEADLINE_WINDOW_DAYS} days._"
        )?;
    } else {
        writeln!(&mut response, "\n⏰ **Deadlines**")?;
        for entry in due {
            writeln!(
                &mut response,
                "• `{}` {} - {} ({})",
                entry.order.production_code,
                entry.order.customer_name,
                format_deadline(entry.days_left),
                entry.order.status
            )?;
        }
    }
    Ok(response)
}

/// Notification feed, oldest first.
pub fn format_notifications(entries: &[NotificationModel]) -> Result<String> {
    let mut response = format!("🔔 **{} unread**\n\n", entries.len());
    for entry in entries {
        writeln!(
            &mut response,
            "`{}` {}",
            entry.created_at.format("%m-%d %H:%M"),
            entry.message
        )?;
    }
    Ok(response)
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{DEADLINE_WINDOW_DAYS, format_notifications, format_summary};
    use crate::{
        bot::{Context, acting_user_with},
        core::{
            notification,
            permissions::{Action, Menu},
            report,
        },
        errors::Result,
    };
    use std::fmt::Write;

    /// Shows order counts per status and upcoming deadlines.
    #[poise::command(slash_command, prefix_command)]
    pub async fn summary(ctx: Context<'_>) -> Result<()> {
        if acting_user_with(ctx, Menu::Dashboard, Action::View)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let db = &ctx.data().database;
        let today = chrono::Local::now().date_naive();
        let counts = report::status_summary(db).await?;
        let due = report::deadline_watch(db, today, DEADLINE_WINDOW_DAYS).await?;

        ctx.say(format_summary(&counts, &due)?).await?;
        Ok(())
    }

    /// Shows unread notifications.
    #[poise::command(slash_command, prefix_command)]
    pub async fn notifications(
        ctx: Context<'_>,
        #[description = "Mark everything as read afterwards"] mark_read: Option<bool>,
    ) -> Result<()> {
        if acting_user_with(ctx, Menu::Dashboard, Action::View)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let db = &ctx.data().database;
        let unread = notification::list_unread(db, 15).await?;
        if unread.is_empty() {
            ctx.say("🔔 No unread notifications.").await?;
            return Ok(());
        }

        let mut response = format_notifications(&unread)?;
        if mark_read.unwrap_or(false) {
            let marked = notification::mark_all_read(db).await?;
            write!(&mut response, "\n_Marked {marked} as read._")?;
        }
        ctx.say(response).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
