//! In-app notification feed.
//!
//! Order services append an entry when an order is taken, when its status changes
//! and when an issue is reported. Delivering them anywhere else is up to the
//! front end.

use crate::{
    entities::{Notification, notification},
    errors::Result,
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*, sea_query::Expr};
use tracing::debug;

/// Appends a notification. Generic over the connection so it can join the
/// caller's database transaction.
pub async fn notify<C>(db: &C, order_id: Option<i64>, message: String) -> Result<notification::Model>
where
    C: ConnectionTrait,
{
    debug!(?order_id, %message, "Recording notification");
    let entry = notification::ActiveModel {
        order_id: Set(order_id),
        message: Set(message),
        created_at: Set(chrono::Utc::now()),
        is_read: Set(false),
        ..Default::default()
    };
    entry.insert(db).await.map_err(Into::into)
}

/// Unread notifications, oldest first, at most `limit`.
pub async fn list_unread(db: &DatabaseConnection, limit: u64) -> Result<Vec<notification::Model>> {
    Notification::find()
        .filter(notification::Column::IsRead.eq(false))
        .order_by_asc(notification::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every notification about one order, oldest first.
pub async fn list_for_order(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<Vec<notification::Model>> {
    Notification::find()
        .filter(notification::Column::OrderId.eq(order_id))
        .order_by_asc(notification::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks everything read and returns how many entries changed.
pub async fn mark_all_read(db: &DatabaseConnection) -> Result<u64> {
    let result = Notification::update_many()
        .col_expr(notification::Column::IsRead, Expr::value(true))
        .filter(notification::Column::IsRead.eq(false))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
