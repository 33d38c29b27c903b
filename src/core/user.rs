//! User accounts - creation, login, role and permission editing.
//!
//! Every mutating function takes the acting user and checks the `users` menu
//! before touching the database. Bootstrapping the first supervisor goes through
//! [`ensure_supervisor`], which needs no actor.

use crate::{
    config::users::SupervisorSettings,
    core::{
        password,
        permissions::{self, Action, Menu, PermissionMatrix, authorize},
    },
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Input for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login name, no whitespace
    pub username: String,
    /// Plaintext password, hashed before storage
    pub password: String,
    /// Name shown in the workflow history
    pub display_name: String,
    /// Role label
    pub role: String,
    /// Contact phone number
    pub phone: Option<String>,
    /// Linked Discord user id
    pub discord_id: Option<String>,
}

/// The stored permission matrix of a user.
#[must_use]
pub fn permission_matrix(user: &user::Model) -> PermissionMatrix {
    PermissionMatrix::from_json(&user.permissions)
}

fn validate_new_user(new_user: &NewUser) -> Result<()> {
    let username = new_user.username.trim();
    if username.is_empty() || username.chars().any(char::is_whitespace) {
        return Err(Error::Validation {
            message: "username must be a single non-empty word".to_string(),
        });
    }
    if new_user.display_name.trim().is_empty() {
        return Err(Error::Validation {
            message: "display name cannot be empty".to_string(),
        });
    }
    if new_user.role.trim().is_empty() {
        return Err(Error::Validation {
            message: "role cannot be empty".to_string(),
        });
    }
    password::validate_password(&new_user.password)
}

async fn insert_user(
    db: &DatabaseConnection,
    new_user: NewUser,
    matrix: &PermissionMatrix,
) -> Result<user::Model> {
    validate_new_user(&new_user)?;

    let now = chrono::Utc::now();
    let account = user::ActiveModel {
        username: Set(new_user.username.trim().to_string()),
        password_hash: Set(password::hash_password(&new_user.password)?),
        display_name: Set(new_user.display_name.trim().to_string()),
        role: Set(new_user.role.trim().to_lowercase()),
        permissions: Set(matrix.to_json()?),
        phone: Set(new_user.phone),
        discord_id: Set(new_user.discord_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    account.insert(db).await.map_err(Into::into)
}

/// Creates an account with the starter permission matrix.
#[instrument(skip(db, actor, new_user), fields(actor = %actor.username, username = %new_user.username))]
pub async fn create_user(
    db: &DatabaseConnection,
    actor: &user::Model,
    new_user: NewUser,
) -> Result<user::Model> {
    authorize(actor, Menu::Users, Action::Create)?;
    let created = insert_user(db, new_user, &PermissionMatrix::starter()).await?;
    info!(user_id = created.id, "User created");
    Ok(created)
}

/// Creates the supervisor account from the environment if its username is free.
///
/// Returns the account when one was created.
pub async fn ensure_supervisor(
    db: &DatabaseConnection,
    settings: &SupervisorSettings,
) -> Result<Option<user::Model>> {
    if get_user_by_username(db, &settings.username).await?.is_some() {
        return Ok(None);
    }

    let new_user = NewUser {
        username: settings.username.clone(),
        password: settings.password.clone(),
        display_name: settings.username.clone(),
        role: permissions::SUPERUSER_ROLE.to_string(),
        phone: None,
        discord_id: settings.discord_id.clone(),
    };
    let created = insert_user(db, new_user, &PermissionMatrix::new()).await?;
    info!(username = %created.username, "Supervisor account bootstrapped");
    Ok(Some(created))
}

/// Checks a username/password pair.
///
/// Unknown users and wrong passwords both yield `InvalidCredentials`.
pub async fn authenticate(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<user::Model> {
    let account = get_user_by_username(db, username)
        .await?
        .ok_or(Error::InvalidCredentials)?;

    if password::verify_password(password, &account.password_hash)? {
        Ok(account)
    } else {
        Err(Error::InvalidCredentials)
    }
}

/// Finds a user by login name.
pub async fn get_user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Username.eq(username.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds the user linked to a Discord account.
pub async fn get_user_by_discord_id(
    db: &DatabaseConnection,
    discord_id: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::DiscordId.eq(discord_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All accounts, alphabetically.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_asc(user::Column::Username)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn find_user(db: &DatabaseConnection, username: &str) -> Result<user::Model> {
    get_user_by_username(db, username)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            name: username.to_string(),
        })
}

/// Flips one permission flag of `username` and persists the resulting matrix.
#[instrument(skip(db, actor), fields(actor = %actor.username))]
pub async fn toggle_user_permission(
    db: &DatabaseConnection,
    actor: &user::Model,
    username: &str,
    menu_id: &str,
    action: &str,
) -> Result<user::Model> {
    authorize(actor, Menu::Users, Action::Edit)?;
    let menu: Menu = menu_id.parse()?;
    let parsed_action: Action = action.parse()?;
    if !menu.declares(parsed_action) {
        return Err(Error::Validation {
            message: format!("menu '{menu}' has no '{parsed_action}' action"),
        });
    }

    let account = find_user(db, username).await?;
    let toggled = permissions::toggle_permission(&permission_matrix(&account), menu_id, action);

    let mut active_model: user::ActiveModel = account.into();
    active_model.permissions = Set(toggled.to_json()?);
    active_model.updated_at = Set(chrono::Utc::now());
    let updated = active_model.update(db).await?;
    info!(username = %updated.username, %menu, action = %parsed_action, "Permission toggled");
    Ok(updated)
}

/// Changes a user's role label.
pub async fn set_role(
    db: &DatabaseConnection,
    actor: &user::Model,
    username: &str,
    role: &str,
) -> Result<user::Model> {
    authorize(actor, Menu::Users, Action::Edit)?;
    if role.trim().is_empty() {
        return Err(Error::Validation {
            message: "role cannot be empty".to_string(),
        });
    }

    let mut active_model: user::ActiveModel = find_user(db, username).await?.into();
    active_model.role = Set(role.trim().to_lowercase());
    active_model.updated_at = Set(chrono::Utc::now());
    active_model.update(db).await.map_err(Into::into)
}

/// Points `discord_id` at `account`, unlinking whichever account held it.
async fn move_discord_link(
    db: &DatabaseConnection,
    account: user::Model,
    discord_id: Option<String>,
) -> Result<user::Model> {
    let txn = db.begin().await?;
    if let Some(id) = discord_id.as_deref() {
        let previous = User::find()
            .filter(user::Column::DiscordId.eq(id))
            .filter(user::Column::Id.ne(account.id))
            .one(&txn)
            .await?;
        if let Some(previous) = previous {
            info!(username = %previous.username, "Discord link moved off account");
            let mut unlinked: user::ActiveModel = previous.into();
            unlinked.discord_id = Set(None);
            unlinked.updated_at = Set(chrono::Utc::now());
            unlinked.update(&txn).await?;
        }
    }
    let mut linked: user::ActiveModel = account.into();
    linked.discord_id = Set(discord_id);
    linked.updated_at = Set(chrono::Utc::now());
    let linked = linked.update(&txn).await?;
    txn.commit().await?;
    Ok(linked)
}

/// Links (or with `None` unlinks) a Discord account. An id already linked to
/// another account moves over.
pub async fn link_discord(
    db: &DatabaseConnection,
    actor: &user::Model,
    username: &str,
    discord_id: Option<String>,
) -> Result<user::Model> {
    authorize(actor, Menu::Users, Action::Edit)?;
    let account = find_user(db, username).await?;
    let discord_id = discord_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());
    move_discord_link(db, account, discord_id).await
}

/// Authenticates and links the account to `discord_id`, moving the link away
/// from any other account that held it.
pub async fn login_discord(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    discord_id: &str,
) -> Result<user::Model> {
    let account = authenticate(db, username, password).await?;
    if account.discord_id.as_deref() == Some(discord_id) {
        return Ok(account);
    }

    let linked = move_discord_link(db, account, Some(discord_id.to_string())).await?;
    info!(username = %linked.username, "Discord account linked by login");
    Ok(linked)
}

/// Deletes an account. Users cannot delete themselves.
pub async fn delete_user(db: &DatabaseConnection, actor: &user::Model, username: &str) -> Result<()> {
    authorize(actor, Menu::Users, Action::Delete)?;
    let account = find_user(db, username).await?;
    if account.id == actor.id {
        return Err(Error::Validation {
            message: "you cannot delete your own account".to_string(),
        });
    }
    User::delete_by_id(account.id).exec(db).await?;
    info!(username = %account.username, "User deleted");
    Ok(())
}
