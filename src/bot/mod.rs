//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the print tracker, including all
//! slash commands, autocomplete handlers, and bot context management. Commands
//! only parse input and format replies; the rules live in [`crate::core`].

/// Discord command implementations (order, issue, pricing, admin, dashboard, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    core::{
        order,
        permissions::{Action, Menu, authorize},
        user,
    },
    entities::{OrderModel, UserModel},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use tracing::{error, info, instrument, warn};

/// Shared data available to all bot commands.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Prefix for newly allocated production codes
    pub code_prefix: String,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub const fn new(database: DatabaseConnection, code_prefix: String) -> Self {
        Self {
            database,
            code_prefix,
        }
    }
}

/// Poise context with the tracker's data and error types.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Errors caused by the user's input or the order's state. These are answered
/// with a message instead of being reported as failures.
const fn is_user_facing(error: &Error) -> bool {
    matches!(
        error,
        Error::Validation { .. }
            | Error::OrderNotFound { .. }
            | Error::StepNotFound { .. }
            | Error::IssueNotFound { .. }
            | Error::ProductionTypeNotFound { .. }
            | Error::UserNotFound { .. }
            | Error::PricingNotFound { .. }
            | Error::PermissionDenied { .. }
            | Error::InvalidTransition { .. }
            | Error::Conflict { .. }
            | Error::InvalidCredentials
    )
}

/// Replies to a failed service call. User-facing errors are answered and
/// swallowed; anything else is reported and propagated to `on_error`.
pub async fn reply_error(ctx: Context<'_>, error: Error) -> Result<()> {
    if is_user_facing(&error) {
        ctx.say(format!("❌ {error}")).await?;
        return Ok(());
    }
    ctx.say("❌ Something went wrong. Please try again later.")
        .await?;
    Err(error)
}

/// Resolves the tracker account linked to the invoking Discord user.
///
/// Replies and returns `None` when the account is not linked.
pub async fn acting_user(ctx: Context<'_>) -> Result<Option<UserModel>> {
    let discord_id = ctx.author().id.to_string();
    let account = user::get_user_by_discord_id(&ctx.data().database, &discord_id).await?;
    if account.is_none() {
        ctx.say("❌ Your Discord account is not linked to a tracker account. Use `/login` first.")
            .await?;
    }
    Ok(account)
}

/// Like [`acting_user`] but also checks one permission, for read-only commands
/// that never reach a service function that would check it.
pub async fn acting_user_with(
    ctx: Context<'_>,
    menu: Menu,
    action: Action,
) -> Result<Option<UserModel>> {
    let Some(account) = acting_user(ctx).await? else {
        return Ok(None);
    };
    match authorize(&account, menu, action) {
        Ok(()) => Ok(Some(account)),
        Err(e) => {
            reply_error(ctx, e).await?;
            Ok(None)
        }
    }
}

/// Finds an order by production code, active or trashed.
///
/// Replies and returns `None` when there is no such order.
pub async fn find_order(ctx: Context<'_>, code: &str) -> Result<Option<OrderModel>> {
    let found = order::get_order_by_code(&ctx.data().database, code).await?;
    if found.is_none() {
        ctx.say(format!("❌ No order with production code `{}`.", code.trim()))
            .await?;
    }
    Ok(found)
}

/// The acting user and the order a mutation targets, or `None` after replying
/// why either is missing.
pub async fn actor_and_order(
    ctx: Context<'_>,
    code: &str,
) -> Result<Option<(UserModel, OrderModel)>> {
    let Some(actor) = acting_user(ctx).await? else {
        return Ok(None);
    };
    Ok(find_order(ctx, code).await?.map(|order| (actor, order)))
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| Error::Validation {
        message: format!("'{input}' is not a date, use YYYY-MM-DD"),
    })
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(format!("An error occurred: {error}")).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Every top-level command the bot registers.
fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        commands::order(),
        commands::trash(),
        commands::issue(),
        commands::price(),
        commands::admin(),
        commands::login(),
        commands::notifications(),
        commands::summary(),
        commands::ping(),
        commands::help(),
    ]
}

/// Builds the framework and runs the Discord client until it stops.
#[instrument(skip(token, data))]
pub async fn run_bot(token: &str, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e:?}"))?;

    info!("Starting bot client...");
    if let Err(why) = client.start().await {
        warn!("Client stopped with error: {why:?}");
        return Err(why.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_date() -> Result<()> {
        assert_eq!(parse_date(" 2026-10-20 ")?, NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
        assert!(matches!(parse_date("20/10/2026"), Err(Error::Validation { .. })));
        Ok(())
    }

    /// Discord rejects registration when a name or description is too long.
    #[test]
    fn test_command_descriptions_fit_discord_limits() {
        fn check(command: &poise::Command<BotData, Error>) {
            assert!(command.name.len() <= 32, "name too long: {}", command.name);
            let description = command.description.as_deref().unwrap_or_default();
            assert!(
                description.chars().count() <= 100,
                "description of `{}` is {} chars",
                command.name,
                description.chars().count()
            );
            for parameter in &command.parameters {
                let text = parameter.description.as_deref().unwrap_or_default();
                assert!(
                    text.chars().count() <= 100,
                    "parameter `{}` of `{}` is {} chars",
                    parameter.name,
                    command.name,
                    text.chars().count()
                );
            }
            command.subcommands.iter().for_each(check);
        }

        all_commands().iter().for_each(check);
    }

    #[test]
    fn test_user_facing_errors() {
        assert!(is_user_facing(&Error::Conflict {
            code: "ORD-202610-001".to_string()
        }));
        assert!(!is_user_facing(&Error::Config {
            message: "broken".to_string()
        }));
    }
}
