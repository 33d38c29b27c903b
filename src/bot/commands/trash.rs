//! Trash Discord commands - list, restore and permanently delete orders.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            Context, acting_user_with, actor_and_order, commands::order::format_order_list,
            handlers::autocomplete, reply_error,
        },
        core::{
            order as order_service,
            permissions::{Action, Menu},
        },
        errors::Result,
    };
    use std::fmt::Write;

    /// Parent command for the order trash.
    #[poise::command(slash_command, subcommands("trash_list", "trash_restore", "trash_purge"))]
    pub async fn trash(ctx: Context<'_>) -> Result<()> {
        let help_text = "Trash command. Available subcommands:\n\
            `/trash list` - List deleted orders\n\
            `/trash restore` - Restore a deleted order\n\
            `/trash purge` - Delete an order permanently";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Lists orders in the trash, most recently deleted first.
    #[poise::command(slash_command, rename = "list")]
    pub async fn trash_list(ctx: Context<'_>) -> Result<()> {
        if acting_user_with(ctx, Menu::Trash, Action::View)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let orders = order_service::list_deleted_orders(&ctx.data().database).await?;
        if orders.is_empty() {
            ctx.say("🗑️ The trash is empty.").await?;
            return Ok(());
        }
        ctx.say(format_order_list("Trash", &orders)?).await?;
        Ok(())
    }

    /// Restores an order from the trash.
    #[poise::command(slash_command, rename = "restore")]
    pub async fn trash_restore(
        ctx: Context<'_>,
        #[description = "Production code"]
        #[autocomplete = "autocomplete::autocomplete_deleted_order_code"]
        code: String,
    ) -> Result<()> {
        let Some((actor, current)) = actor_and_order(ctx, &code).await? else {
            return Ok(());
        };

        match order_service::restore_order(&ctx.data().database, &actor, current.id).await {
            Ok(restored) => {
                ctx.say(format!(
                    "♻️ Order `{}` restored. Status: **{}**",
                    restored.production_code, restored.status
                ))
                .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Deletes an order from the trash for good and lists the files it held.
    #[poise::command(slash_command, rename = "purge")]
    pub async fn trash_purge(
        ctx: Context<'_>,
        #[description = "Production code"]
        #[autocomplete = "autocomplete::autocomplete_deleted_order_code"]
        code: String,
    ) -> Result<()> {
        let Some((actor, current)) = actor_and_order(ctx, &code).await? else {
            return Ok(());
        };

        match order_service::delete_order_permanently(&ctx.data().database, &actor, current.id)
            .await
        {
            Ok(files) => {
                let mut response = format!(
                    "🔥 Order `{}` permanently deleted.",
                    current.production_code
                );
                if !files.is_empty() {
                    writeln!(&mut response, "\nFiles it referenced:")?;
                    for file in &files {
                        writeln!(&mut response, "• <{file}>")?;
                    }
                }
                ctx.say(response).await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }
}

// Re-export all commands
pub use inner::*;
