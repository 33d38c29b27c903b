//! User entity - staff accounts with a role label and a permission matrix.
//!
//! `permissions` holds a serialized [`crate::core::permissions::PermissionMatrix`].
//! `discord_id` links the account to the Discord user driving the bot.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Name shown in the workflow history
    pub display_name: String,
    /// Role label (e.g. `"supervisor"`, `"operator"`)
    pub role: String,
    /// Serialized permission matrix
    #[sea_orm(column_type = "Json")]
    pub permissions: Json,
    /// Contact phone number
    pub phone: Option<String>,
    /// Linked Discord user id
    #[sea_orm(unique)]
    pub discord_id: Option<String>,
    /// When the account was created
    pub created_at: DateTimeUtc,
    /// When the account was last modified
    pub updated_at: DateTimeUtc,
}

/// `User` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
