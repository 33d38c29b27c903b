//! Admin Discord commands - accounts, permissions and production types, plus
//! `/login` for linking a Discord account to a tracker account.

use crate::{
    core::{
        permissions::{Menu, PermissionMatrix, is_superuser},
        production_type, user,
    },
    entities::{ProductionTypeModel, UserModel},
    errors::Result,
};
use std::fmt::Write;

/// Granted actions of an account, one menu per line.
pub fn format_permissions(account: &UserModel) -> Result<String> {
    let mut response = format!(
        "🔐 **{}** ({}, role `{}`)\n\n",
        account.display_name, account.username, account.role
    );
    if is_superuser(&account.role) {
        response.push_str("Supervisor: every action on every menu.\n");
        return Ok(response);
    }

    let matrix: PermissionMatrix = user::permission_matrix(account);
    for menu in Menu::ALL {
        let granted = matrix
            .entry(menu.as_str())
            .map(|flags| flags.granted())
            .unwrap_or_default();
        let actions = if granted.is_empty() {
            "-".to_string()
        } else {
            granted
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        writeln!(&mut response, "`{menu}`: {actions}")?;
    }
    Ok(response)
}

/// One line per production type with its steps.
pub fn format_production_type(production_type: &ProductionTypeModel) -> Result<String> {
    let steps = production_type::step_templates(production_type)?;
    let mut line = format!("**{}** `{}`:", production_type.name, production_type.code);
    for (i, step) in steps.iter().enumerate() {
        let separator = if i == 0 { " " } else { " → " };
        write!(&mut line, "{separator}{}", step.name)?;
        if step.kind.requires_file() {
            line.push_str(" 📎");
        }
    }
    Ok(line)
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{format_permissions, format_production_type};
    use crate::{
        bot::{Context, acting_user, acting_user_with, handlers::autocomplete, reply_error},
        core::{
            permissions::{Action, Menu},
            production_type,
            user::{self, NewUser},
        },
        errors::Result,
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    async fn say_private(ctx: Context<'_>, text: String) -> Result<()> {
        ctx.send(poise::CreateReply::default().content(text).ephemeral(true))
            .await?;
        Ok(())
    }

    /// Links your Discord account to your tracker account.
    #[poise::command(slash_command, ephemeral)]
    pub async fn login(
        ctx: Context<'_>,
        #[description = "Tracker username"] username: String,
        #[description = "Password"] password: String,
    ) -> Result<()> {
        let discord_id = ctx.author().id.to_string();
        match user::login_discord(&ctx.data().database, &username, &password, &discord_id).await {
            Ok(account) => {
                say_private(
                    ctx,
                    format!(
                        "✅ Logged in as **{}**. Your Discord account is now linked.",
                        account.display_name
                    ),
                )
                .await
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Parent command for administration.
    #[poise::command(
        slash_command,
        subcommands(
            "user_add",
            "user_list",
            "user_delete",
            "user_role",
            "user_link",
            "permission_toggle",
            "permission_show",
            "type_add",
            "type_list",
            "type_steps",
            "type_delete"
        )
    )]
    pub async fn admin(ctx: Context<'_>) -> Result<()> {
        let help_text = "Admin command. Available subcommands:\n\
            `/admin user_add` - Create an account\n\
            `/admin user_list` - List accounts\n\
            `/admin user_delete` - Delete an account\n\
            `/admin user_role` - Change an account's role\n\
            `/admin user_link` - Link an account to a Discord user\n\
            `/admin permission` - Toggle one permission\n\
            `/admin permissions` - Show an account's permissions\n\
            `/admin type_add` - Create a production type\n\
            `/admin type_list` - List production types\n\
            `/admin type_steps` - Replace a type's steps\n\
            `/admin type_delete` - Delete a production type";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Creates an account with the starter permissions.
    #[poise::command(slash_command, ephemeral)]
    pub async fn user_add(
        ctx: Context<'_>,
        #[description = "Login name"] username: String,
        #[description = "Initial password (at least 8 characters)"] password: String,
        #[description = "Name shown in the workflow history"] display_name: String,
        #[description = "Role label, defaults to operator"] role: Option<String>,
        #[description = "Discord account to link"] discord: Option<serenity::User>,
        #[description = "Phone number"] phone: Option<String>,
    ) -> Result<()> {
        let Some(actor) = acting_user(ctx).await? else {
            return Ok(());
        };

        let new_user = NewUser {
            username,
            password,
            display_name,
            role: role.unwrap_or_else(|| "operator".to_string()),
            phone,
            discord_id: discord.map(|discord| discord.id.to_string()),
        };
        match user::create_user(&ctx.data().database, &actor, new_user).await {
            Ok(created) => {
                say_private(
                    ctx,
                    format!(
                        "✅ Account **{}** created. Grant permissions with `/admin permission`.",
                        created.username
                    ),
                )
                .await
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Lists all accounts.
    #[poise::command(slash_command)]
    pub async fn user_list(ctx: Context<'_>) -> Result<()> {
        if acting_user_with(ctx, Menu::Users, Action::View)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let accounts = user::list_users(&ctx.data().database).await?;
        let mut response = String::from("👥 **Accounts**\n\n");
        for account in &accounts {
            let linked = if account.discord_id.is_some() { "🔗" } else { "" };
            writeln!(
                &mut response,
                "• **{}** `{}` - {} {linked}",
                account.display_name, account.username, account.role
            )?;
        }
        ctx.say(response).await?;
        Ok(())
    }

    /// Deletes an account.
    #[poise::command(slash_command)]
    pub async fn user_delete(
        ctx: Context<'_>,
        #[description = "Login name"]
        #[autocomplete = "autocomplete::autocomplete_username"]
        username: String,
    ) -> Result<()> {
        let Some(actor) = acting_user(ctx).await? else {
            return Ok(());
        };

        match user::delete_user(&ctx.data().database, &actor, &username).await {
            Ok(()) => {
                ctx.say(format!("🗑️ Account `{username}` deleted.")).await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Changes the role label of an account.
    #[poise::command(slash_command)]
    pub async fn user_role(
        ctx: Context<'_>,
        #[description = "Login name"]
        #[autocomplete = "autocomplete::autocomplete_username"]
        username: String,
        #[description = "New role (supervisor has every permission)"] role: String,
    ) -> Result<()> {
        let Some(actor) = acting_user(ctx).await? else {
            return Ok(());
        };

        match user::set_role(&ctx.data().database, &actor, &username, &role).await {
            Ok(updated) => {
                ctx.say(format!(
                    "✅ `{}` now has role `{}`.",
                    updated.username, updated.role
                ))
                .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Links an account to a Discord user, or unlinks it when no user is given.
    #[poise::command(slash_command)]
    pub async fn user_link(
        ctx: Context<'_>,
        #[description = "Login name"]
        #[autocomplete = "autocomplete::autocomplete_username"]
        username: String,
        #[description = "Discord user to link"] discord: Option<serenity::User>,
    ) -> Result<()> {
        let Some(actor) = acting_user(ctx).await? else {
            return Ok(());
        };

        let discord_id = discord.as_ref().map(|discord| discord.id.to_string());
        match user::link_discord(&ctx.data().database, &actor, &username, discord_id).await {
            Ok(updated) => {
                let message = match &discord {
                    Some(discord) => format!("🔗 `{}` linked to {}.", updated.username, discord.name),
                    None => format!("🔗 `{}` unlinked.", updated.username),
                };
                ctx.say(message).await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Toggles one permission. Enabling any action grants view; revoking view
    /// revokes the whole menu.
    #[poise::command(slash_command, rename = "permission")]
    pub async fn permission_toggle(
        ctx: Context<'_>,
        #[description = "Login name"]
        #[autocomplete = "autocomplete::autocomplete_username"]
        username: String,
        #[description = "Menu"]
        #[autocomplete = "autocomplete::autocomplete_menu"]
        menu: String,
        #[description = "Action"]
        #[autocomplete = "autocomplete::autocomplete_action"]
        action: String,
    ) -> Result<()> {
        let Some(actor) = acting_user(ctx).await? else {
            return Ok(());
        };

        match user::toggle_user_permission(&ctx.data().database, &actor, &username, &menu, &action)
            .await
        {
            Ok(updated) => {
                ctx.say(format_permissions(&updated)?).await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Shows the permissions of an account (yours by default).
    #[poise::command(slash_command, rename = "permissions")]
    pub async fn permission_show(
        ctx: Context<'_>,
        #[description = "Login name"]
        #[autocomplete = "autocomplete::autocomplete_username"]
        username: Option<String>,
    ) -> Result<()> {
        let Some(actor) = acting_user(ctx).await? else {
            return Ok(());
        };

        let target = match username {
            Some(username) if username.trim() != actor.username => {
                if let Err(e) = crate::core::permissions::authorize(&actor, Menu::Users, Action::View)
                {
                    return reply_error(ctx, e).await;
                }
                match user::get_user_by_username(&ctx.data().database, &username).await? {
                    Some(account) => account,
                    None => {
                        ctx.say(format!("❌ No account named `{username}`.")).await?;
                        return Ok(());
                    }
                }
            }
            _ => actor,
        };
        ctx.say(format_permissions(&target)?).await?;
        Ok(())
    }

    /// Creates a production type from `Name:kind; Name:kind` steps.
    #[poise::command(slash_command)]
    pub async fn type_add(
        ctx: Context<'_>,
        #[description = "Display name"] name: String,
        #[description = "Short code (e.g. dtf)"] code: String,
        #[description = "Name:kind; ... with kind upload-document, upload-image or mark-complete"]
        steps: String,
    ) -> Result<()> {
        let Some(actor) = acting_user(ctx).await? else {
            return Ok(());
        };

        let db = &ctx.data().database;
        let result = match production_type::parse_step_templates(&steps) {
            Ok(steps) => production_type::create_production_type(db, &actor, &name, &code, &steps).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(created) => {
                ctx.say(format!("✅ {}", format_production_type(&created)?))
                    .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Lists production types and their steps.
    #[poise::command(slash_command)]
    pub async fn type_list(ctx: Context<'_>) -> Result<()> {
        if acting_user_with(ctx, Menu::ProductionTypes, Action::View)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let types = production_type::get_all_active_production_types(&ctx.data().database).await?;
        if types.is_empty() {
            ctx.say("No production types defined.").await?;
            return Ok(());
        }
        let mut response = String::from("🏭 **Production types**\n\n");
        for production_type in &types {
            writeln!(&mut response, "• {}", format_production_type(production_type)?)?;
        }
        ctx.say(response).await?;
        Ok(())
    }

    /// Replaces the steps of a production type. Existing orders keep theirs.
    #[poise::command(slash_command)]
    pub async fn type_steps(
        ctx: Context<'_>,
        #[description = "Production type"]
        #[autocomplete = "autocomplete::autocomplete_production_type"]
        code: String,
        #[description = "Name:kind; ... with kind upload-document, upload-image or mark-complete"]
        steps: String,
    ) -> Result<()> {
        let Some(actor) = acting_user(ctx).await? else {
            return Ok(());
        };

        let db = &ctx.data().database;
        let result = match production_type::parse_step_templates(&steps) {
            Ok(steps) => {
                production_type::update_production_type_steps(db, &actor, &code, &steps).await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(updated) => {
                ctx.say(format!("✅ {}", format_production_type(&updated)?))
                    .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Deletes a production type. Existing orders are not affected.
    #[poise::command(slash_command)]
    pub async fn type_delete(
        ctx: Context<'_>,
        #[description = "Production type"]
        #[autocomplete = "autocomplete::autocomplete_production_type"]
        code: String,
    ) -> Result<()> {
        let Some(actor) = acting_user(ctx).await? else {
            return Ok(());
        };

        match production_type::delete_production_type(&ctx.data().database, &actor, &code).await {
            Ok(deleted) => {
                ctx.say(format!("🗑️ Production type `{}` deleted.", deleted.code))
                    .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_format_permissions() -> Result<()> {
        let (db, boss) = setup_with_supervisor().await?;
        let operator = create_test_user(&db, &boss, "operator1").await?;

        let text = format_permissions(&operator)?;
        assert!(text.contains("`dashboard`: view"));
        assert!(text.contains("`orders`: view"));
        assert!(text.contains("`trash`: -"));

        assert!(format_permissions(&boss)?.contains("Supervisor: every action"));
        Ok(())
    }

    #[tokio::test]
    async fn test_format_production_type() -> Result<()> {
        let (db, _boss) = setup_with_catalog().await?;
        let dtf = production_type::get_production_type_by_code(&db, "dtf")
            .await?
            .ok_or_else(|| crate::errors::Error::ProductionTypeNotFound {
                code: "dtf".to_string(),
            })?;

        assert_eq!(
            format_production_type(&dtf)?,
            "**DTF** `dtf`: Print film 📎 → Heat press"
        );
        Ok(())
    }
}
