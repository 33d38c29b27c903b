//! General Discord commands - ping, help, and other utility commands.
//! This module contains simple commands that don't require database operations
//! and provide basic bot functionality and user assistance.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{bot::Context, errors::Result};

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: Context<'_>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: Context<'_>) -> Result<()> {
        let help_text = "**Print Tracker Help**\n\
        Orders move through: Order Received → In Process → Finishing → Shipping → Completed. \
        An open issue puts an order on hold; a failed QC sends it back for revision.\n\n\
        **Getting started**\n\
        • `/login <username> <password>` - Link your Discord account to your tracker account.\n\n\
        **Workflow**\n\
        • `/order <subcommand>` - Take orders, upload approval, complete steps, QC, pack and ship.\n\
        • `/issue <subcommand>` - Report and resolve production issues.\n\
        • `/trash <subcommand>` - Restore or permanently delete orders.\n\n\
        **Overview**\n\
        • `/summary` - Order counts per status and upcoming deadlines.\n\
        • `/notifications [mark_read]` - Unread activity.\n\
        • `/price <subcommand>` - Quotes and the price list.\n\n\
        **Administration**\n\
        • `/admin <subcommand>` - Accounts, permissions and production types.\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
