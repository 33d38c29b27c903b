//! Entity module - Contains all SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod notification;
pub mod order;
pub mod pricing;
pub mod production_type;
pub mod sequence;
pub mod user;

// Re-export specific types to avoid conflicts
pub use notification::{
    Column as NotificationColumn, Entity as Notification, Model as NotificationModel,
};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel, OrderStatus};
pub use pricing::{Column as PricingColumn, Entity as Pricing, Model as PricingModel};
pub use production_type::{
    Column as ProductionTypeColumn, Entity as ProductionType, Model as ProductionTypeModel,
};
pub use sequence::{Column as SequenceColumn, Entity as Sequence, Model as SequenceModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
