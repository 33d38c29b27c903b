//! Order entity - one customer order moving through the production workflow.
//!
//! Customer fields, dates and the cached `status` are plain columns so they can be
//! filtered in SQL. Everything the workflow mutates (steps, approval, QC, packing,
//! shipping, issue notes) lives in the `production` JSON document, see
//! [`crate::core::document::OrderDocument`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical workflow status of an order.
///
/// Stored as its human-readable label.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum OrderStatus {
    /// Waiting for the customer's design approval
    #[sea_orm(string_value = "Order Received")]
    OrderReceived,
    /// Approved, production steps still open
    #[sea_orm(string_value = "In Process")]
    InProcess,
    /// At least one unresolved issue note
    #[sea_orm(string_value = "Has Issue")]
    HasIssue,
    /// QC explicitly failed with notes
    #[sea_orm(string_value = "Needs Revision")]
    NeedsRevision,
    /// Steps done, waiting for QC and packing
    #[sea_orm(string_value = "Finishing")]
    Finishing,
    /// Packed, waiting for proof of receipt
    #[sea_orm(string_value = "Shipping")]
    Shipping,
    /// Received by the customer
    #[sea_orm(string_value = "Completed")]
    Completed,
}

impl OrderStatus {
    /// Every status in workflow order.
    pub const ALL: [Self; 7] = [
        Self::OrderReceived,
        Self::InProcess,
        Self::HasIssue,
        Self::NeedsRevision,
        Self::Finishing,
        Self::Shipping,
        Self::Completed,
    ];

    /// Human-readable label, identical to the stored value.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OrderReceived => "Order Received",
            Self::InProcess => "In Process",
            Self::HasIssue => "Has Issue",
            Self::NeedsRevision => "Needs Revision",
            Self::Finishing => "Finishing",
            Self::Shipping => "Shipping",
            Self::Completed => "Completed",
        }
    }

    /// Looks a status up by its label, ignoring case.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable code, sequential within the intake month (e.g. `ORD-202610-007`)
    #[sea_orm(unique)]
    pub production_code: String,
    /// Customer name
    pub customer_name: String,
    /// Customer phone number
    pub customer_phone: String,
    /// Number of pieces ordered
    pub quantity: i32,
    /// Date the order was taken
    pub intake_date: Date,
    /// Promised delivery date
    pub deadline: Date,
    /// Production type code (e.g. `"dtf"`, `"manual"`)
    pub production_type: String,
    /// Free-text notes from intake
    pub notes: Option<String>,
    /// Serialized `OrderDocument`
    #[sea_orm(column_type = "Json")]
    pub production: Json,
    /// Cached status, recomputed by every workflow mutation
    pub status: OrderStatus,
    /// Optimistic concurrency counter, bumped on every write
    pub version: i32,
    /// Username of the user who took the order
    pub created_by: String,
    /// When the order was created
    pub created_at: DateTimeUtc,
    /// When the order was last written
    pub updated_at: DateTimeUtc,
    /// Soft delete marker - set while the order sits in the trash
    pub deleted_at: Option<DateTimeUtc>,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One order has many notifications
    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
