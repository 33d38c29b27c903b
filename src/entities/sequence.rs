//! Sequence entity - named counters.
//!
//! Production codes use one counter per calendar month, keyed
//! `production_code_seq:YYYY-MM`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sequence database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sequences")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Counter name
    #[sea_orm(unique)]
    pub key: String,
    /// Last value handed out
    pub value: i64,
    /// When the counter last moved
    pub updated_at: DateTime,
}

/// `Sequence` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
