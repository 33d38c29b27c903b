//! Production type entity - a configurable kind of job (e.g. DTF, manual screen
//! printing) with the ordered step template new orders receive.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Production type database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "production_types")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g. "DTF Transfer")
    pub name: String,
    /// Code stored on orders (e.g. `"dtf"`)
    #[sea_orm(unique)]
    pub code: String,
    /// Serialized `Vec<StepTemplate>`
    #[sea_orm(column_type = "Json")]
    pub steps: Json,
    /// Soft delete flag - existing orders keep their copied steps
    pub is_deleted: bool,
    /// When the type was created
    pub created_at: DateTime,
    /// When the type was last modified
    pub updated_at: DateTime,
}

/// `ProductionType` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
