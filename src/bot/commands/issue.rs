//! Issue Discord commands - report, resolve, delete and list issue notes.
//!
//! An unresolved issue puts the order on hold ("Has Issue") until it is resolved.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            Context, acting_user_with, actor_and_order, find_order, handlers::autocomplete,
            reply_error,
        },
        core::{
            order as order_service,
            permissions::{Action, Menu},
        },
        errors::Result,
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    /// Parent command for issue notes.
    #[poise::command(
        slash_command,
        subcommands("issue_add", "issue_resolve", "issue_delete", "issue_list")
    )]
    pub async fn issue(ctx: Context<'_>) -> Result<()> {
        let help_text = "Issue command. Available subcommands:\n\
            `/issue add` - Report a production issue\n\
            `/issue resolve` - Resolve an issue\n\
            `/issue delete` - Delete an issue note\n\
            `/issue list` - Show the issues of an order";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Reports an issue. The order is on hold until every issue is resolved.
    #[poise::command(slash_command, rename = "add")]
    pub async fn issue_add(
        ctx: Context<'_>,
        #[description = "Production code"]
        #[autocomplete = "autocomplete::autocomplete_order_code"]
        code: String,
        #[description = "What went wrong"] note: String,
        #[description = "Photo of the problem"] evidence: Option<serenity::Attachment>,
    ) -> Result<()> {
        let Some((actor, current)) = actor_and_order(ctx, &code).await? else {
            return Ok(());
        };

        let evidence = evidence.as_ref().map(|file| file.url.as_str());
        match order_service::add_issue(&ctx.data().database, &actor, current.id, &note, evidence)
            .await
        {
            Ok((saved, issue_id)) => {
                ctx.say(format!(
                    "⚠️ Issue #{issue_id} reported on `{}`. Status: **{}**",
                    saved.production_code, saved.status
                ))
                .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Resolves an issue.
    #[poise::command(slash_command, rename = "resolve")]
    pub async fn issue_resolve(
        ctx: Context<'_>,
        #[description = "Production code"]
        #[autocomplete = "autocomplete::autocomplete_order_code"]
        code: String,
        #[description = "Issue number"] issue_id: u32,
        #[description = "Photo of the fix"] evidence: Option<serenity::Attachment>,
    ) -> Result<()> {
        let Some((actor, current)) = actor_and_order(ctx, &code).await? else {
            return Ok(());
        };

        let evidence = evidence.as_ref().map(|file| file.url.as_str());
        match order_service::resolve_issue(
            &ctx.data().database,
            &actor,
            current.id,
            issue_id,
            evidence,
        )
        .await
        {
            Ok(saved) => {
                ctx.say(format!(
                    "✅ Issue #{issue_id} on `{}` resolved. Status: **{}**",
                    saved.production_code, saved.status
                ))
                .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Deletes an issue note, e.g. one reported by mistake.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn issue_delete(
        ctx: Context<'_>,
        #[description = "Production code"]
        #[autocomplete = "autocomplete::autocomplete_order_code"]
        code: String,
        #[description = "Issue number"] issue_id: u32,
    ) -> Result<()> {
        let Some((actor, current)) = actor_and_order(ctx, &code).await? else {
            return Ok(());
        };

        match order_service::delete_issue(&ctx.data().database, &actor, current.id, issue_id).await
        {
            Ok(saved) => {
                ctx.say(format!(
                    "🗑️ Issue #{issue_id} deleted from `{}`. Status: **{}**",
                    saved.production_code, saved.status
                ))
                .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Lists the issue notes of an order.
    #[poise::command(slash_command, rename = "list")]
    pub async fn issue_list(
        ctx: Context<'_>,
        #[description = "Production code"]
        #[autocomplete = "autocomplete::autocomplete_order_code"]
        code: String,
    ) -> Result<()> {
        if acting_user_with(ctx, Menu::Issues, Action::View)
            .await?
            .is_none()
        {
            return Ok(());
        }
        let Some(found) = find_order(ctx, &code).await? else {
            return Ok(());
        };

        let document = order_service::document(&found)?;
        if document.issues.is_empty() {
            ctx.say(format!("No issues on `{}`.", found.production_code))
                .await?;
            return Ok(());
        }

        let mut response = format!(
            "⚠️ **Issues on {}** ({} open)\n\n",
            found.production_code,
            document.open_issue_count()
        );
        for issue in &document.issues {
            writeln!(
                &mut response,
                "**#{}** {} - reported by {} on {}",
                issue.id,
                issue.note,
                issue.reported_by,
                issue.reported_at.format("%Y-%m-%d")
            )?;
            if let Some(evidence) = &issue.evidence_file_reference {
                writeln!(&mut response, "  📎 <{evidence}>")?;
            }
            if let (true, Some(by)) = (issue.resolved, &issue.resolved_by) {
                writeln!(&mut response, "  ✅ resolved by {by}")?;
            }
        }
        ctx.say(response).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
