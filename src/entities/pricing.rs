//! Pricing entity - flat key/value price list used by the quote calculator.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Pricing entry database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pricing")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Lookup key (e.g. `"dtf.price_per_cm2"`)
    #[sea_orm(unique)]
    pub key: String,
    /// Grouping for display (e.g. `"garment"`, `"dtf"`)
    pub category: String,
    /// Display name
    pub name: String,
    /// Numeric value
    pub value: f64,
    /// Unit label (e.g. `"pcs"`, `"%"`, `"cm2"`)
    pub unit: String,
    /// When the value was last changed
    pub updated_at: DateTime,
}

/// `Pricing` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
