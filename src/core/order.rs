//! Order business logic - intake, the production workflow, trash and restore.
//!
//! Every workflow mutation follows the same path:
//!
//! 1. check the acting user's permission
//! 2. load the active order and decode its [`OrderDocument`]
//! 3. apply a pure document transformation
//! 4. recompute the status with [`resolve_status`] and persist both, guarded by
//!    the order's `version` so a concurrent edit fails with `Conflict` instead of
//!    being silently overwritten
//! 5. record a notification when the status changed, plus any note the
//!    mutation announces, in the same transaction
//!
//! The stored status is never refreshed on read. Code that writes the document
//! by other means must call [`refresh_status`] afterwards.

use crate::{
    core::{
        document::OrderDocument,
        notification,
        permissions::{Action, Menu, authorize},
        production_type, sequence,
        status::resolve_status,
    },
    entities::{Notification, Order, OrderStatus, notification as notification_entity, order, user},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, instrument, warn};

/// Input for taking a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Customer name
    pub customer_name: String,
    /// Customer phone number
    pub customer_phone: String,
    /// Number of pieces
    pub quantity: i32,
    /// Date the order was taken; picks the production code month
    pub intake_date: NaiveDate,
    /// Promised delivery date
    pub deadline: NaiveDate,
    /// Production type code
    pub production_type: String,
    /// Free-text notes
    pub notes: Option<String>,
}

/// Editable customer fields.
#[derive(Debug, Clone)]
pub struct CustomerUpdate {
    /// Customer name
    pub customer_name: String,
    /// Customer phone number
    pub customer_phone: String,
    /// Number of pieces
    pub quantity: i32,
    /// Promised delivery date
    pub deadline: NaiveDate,
}

fn validate_customer(name: &str, quantity: i32, intake: NaiveDate, deadline: NaiveDate) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "customer name cannot be empty".to_string(),
        });
    }
    if quantity <= 0 {
        return Err(Error::Validation {
            message: format!("quantity must be positive, got {quantity}"),
        });
    }
    if deadline < intake {
        return Err(Error::Validation {
            message: format!("deadline {deadline} is before intake date {intake}"),
        });
    }
    Ok(())
}

/// Decodes the production document of an order.
pub fn document(order: &order::Model) -> Result<OrderDocument> {
    serde_json::from_value(order.production.clone()).map_err(Into::into)
}

/// Takes a new order: allocates its production code, copies the type's step
/// template and stores the computed initial status.
#[instrument(skip(db, actor, new_order), fields(actor = %actor.username))]
pub async fn create_order(
    db: &DatabaseConnection,
    actor: &user::Model,
    code_prefix: &str,
    new_order: NewOrder,
) -> Result<order::Model> {
    authorize(actor, Menu::Orders, Action::Create)?;
    validate_customer(
        &new_order.customer_name,
        new_order.quantity,
        new_order.intake_date,
        new_order.deadline,
    )?;

    let production_type = production_type::get_production_type_by_code(db, &new_order.production_type)
        .await?
        .ok_or_else(|| Error::ProductionTypeNotFound {
            code: new_order.production_type.clone(),
        })?;
    let document = OrderDocument::from_template(&production_type::step_templates(&production_type)?);
    let status = resolve_status(&document);

    let txn = db.begin().await?;

    let production_code =
        sequence::next_production_code(&txn, code_prefix, new_order.intake_date).await?;
    let now = Utc::now();
    let model = order::ActiveModel {
        production_code: Set(production_code),
        customer_name: Set(new_order.customer_name.trim().to_string()),
        customer_phone: Set(new_order.customer_phone.trim().to_string()),
        quantity: Set(new_order.quantity),
        intake_date: Set(new_order.intake_date),
        deadline: Set(new_order.deadline),
        production_type: Set(production_type.code.clone()),
        notes: Set(new_order.notes.filter(|notes| !notes.trim().is_empty())),
        production: Set(serde_json::to_value(&document)?),
        status: Set(status),
        version: Set(0),
        created_by: Set(actor.username.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    };
    let created = model.insert(&txn).await?;

    notification::notify(
        &txn,
        Some(created.id),
        format!(
            "New order {} for {} ({} pcs, {})",
            created.production_code, created.customer_name, created.quantity, production_type.name
        ),
    )
    .await?;

    txn.commit().await?;

    info!(code = %created.production_code, "Order created");
    Ok(created)
}

/// Finds an order (active or in the trash) by production code.
pub async fn get_order_by_code(db: &DatabaseConnection, code: &str) -> Result<Option<order::Model>> {
    Order::find()
        .filter(order::Column::ProductionCode.eq(code.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds an order (active or in the trash) by id.
pub async fn get_order_by_id(db: &DatabaseConnection, order_id: i64) -> Result<Option<order::Model>> {
    Order::find_by_id(order_id).one(db).await.map_err(Into::into)
}

/// Active orders, earliest deadline first, optionally narrowed to one status.
pub async fn list_active_orders(
    db: &DatabaseConnection,
    status: Option<OrderStatus>,
) -> Result<Vec<order::Model>> {
    let mut query = Order::find().filter(order::Column::DeletedAt.is_null());
    if let Some(status) = status {
        query = query.filter(order::Column::Status.eq(status));
    }
    query
        .order_by_asc(order::Column::Deadline)
        .order_by_asc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Orders in the trash, most recently deleted first.
pub async fn list_deleted_orders(db: &DatabaseConnection) -> Result<Vec<order::Model>> {
    Order::find()
        .filter(order::Column::DeletedAt.is_not_null())
        .order_by_desc(order::Column::DeletedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn find_active(db: &DatabaseConnection, order_id: i64) -> Result<order::Model> {
    get_order_by_id(db, order_id)
        .await?
        .filter(|order| order.deleted_at.is_none())
        .ok_or_else(|| Error::OrderNotFound {
            code: order_id.to_string(),
        })
}

async fn find_deleted(db: &DatabaseConnection, order_id: i64) -> Result<order::Model> {
    let order = get_order_by_id(db, order_id)
        .await?
        .ok_or_else(|| Error::OrderNotFound {
            code: order_id.to_string(),
        })?;
    if order.deleted_at.is_none() {
        return Err(Error::InvalidTransition {
            message: format!("order {} is not in the trash", order.production_code),
        });
    }
    Ok(order)
}

/// Writes `changes` onto `order` only if nobody else wrote it since it was read.
async fn write_versioned<C>(
    db: &C,
    order: &order::Model,
    mut changes: order::ActiveModel,
) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    changes.version = Set(order.version + 1);
    changes.updated_at = Set(Utc::now());

    let result = Order::update_many()
        .set(changes)
        .filter(order::Column::Id.eq(order.id))
        .filter(order::Column::Version.eq(order.version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        warn!(code = %order.production_code, version = order.version, "Stale order write rejected");
        return Err(Error::Conflict {
            code: order.production_code.clone(),
        });
    }

    Order::find_by_id(order.id)
        .one(db)
        .await?
        .ok_or_else(|| Error::OrderNotFound {
            code: order.production_code.clone(),
        })
}

/// Persists a new document together with its recomputed status. `note` is an
/// extra notification committed in the same transaction.
async fn save_document(
    db: &DatabaseConnection,
    order: &order::Model,
    document: &OrderDocument,
    note: Option<String>,
) -> Result<order::Model> {
    let status = resolve_status(document);
    let changes = order::ActiveModel {
        production: Set(serde_json::to_value(document)?),
        status: Set(status),
        ..Default::default()
    };

    let txn = db.begin().await?;
    let saved = write_versioned(&txn, order, changes).await?;
    if saved.status != order.status {
        notification::notify(
            &txn,
            Some(saved.id),
            format!(
                "Order {}: {} → {}",
                saved.production_code, order.status, saved.status
            ),
        )
        .await?;
    }
    if let Some(note) = note {
        notification::notify(&txn, Some(saved.id), note).await?;
    }
    txn.commit().await?;

    if saved.status != order.status {
        info!(code = %saved.production_code, from = %order.status, to = %saved.status, "Order status changed");
    }
    Ok(saved)
}

/// Shared path for every document mutation, see the module docs.
async fn mutate<T, F>(
    db: &DatabaseConnection,
    actor: &user::Model,
    permission: (Menu, Action),
    order_id: i64,
    transform: F,
) -> Result<(order::Model, T)>
where
    F: FnOnce(&OrderDocument) -> Result<(OrderDocument, T)>,
{
    mutate_announced(db, actor, permission, order_id, transform, |_, _| None).await
}

/// [`mutate`] plus a notification built from the loaded order and the
/// transformation's output, written atomically with the document.
async fn mutate_announced<T, F, N>(
    db: &DatabaseConnection,
    actor: &user::Model,
    (menu, action): (Menu, Action),
    order_id: i64,
    transform: F,
    announce: N,
) -> Result<(order::Model, T)>
where
    F: FnOnce(&OrderDocument) -> Result<(OrderDocument, T)>,
    N: FnOnce(&order::Model, &T) -> Option<String>,
{
    authorize(actor, menu, action)?;
    let order = find_active(db, order_id).await?;
    let (next, extra) = transform(&document(&order)?)?;
    let note = announce(&order, &extra);
    let saved = save_document(db, &order, &next, note).await?;
    Ok((saved, extra))
}

/// Recomputes and persists the status of an order if it is stale.
pub async fn refresh_status(db: &DatabaseConnection, order_id: i64) -> Result<order::Model> {
    let order = find_active(db, order_id).await?;
    let current = document(&order)?;
    if resolve_status(&current) == order.status {
        return Ok(order);
    }
    save_document(db, &order, &current, None).await
}

/// Edits the customer fields. Does not affect the status.
pub async fn update_customer(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i64,
    update: CustomerUpdate,
) -> Result<order::Model> {
    authorize(actor, Menu::Orders, Action::Edit)?;
    let order = find_active(db, order_id).await?;
    validate_customer(
        &update.customer_name,
        update.quantity,
        order.intake_date,
        update.deadline,
    )?;

    let changes = order::ActiveModel {
        customer_name: Set(update.customer_name.trim().to_string()),
        customer_phone: Set(update.customer_phone.trim().to_string()),
        quantity: Set(update.quantity),
        deadline: Set(update.deadline),
        ..Default::default()
    };
    write_versioned(db, &order, changes).await
}

/// Uploads the customer's design approval.
pub async fn upload_approval(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i64,
    file_reference: &str,
) -> Result<order::Model> {
    let at = Utc::now();
    let (order, ()) = mutate(db, actor, (Menu::Orders, Action::Edit), order_id, |doc| {
        Ok((doc.with_approval(file_reference, &actor.username, at)?, ()))
    })
    .await?;
    Ok(order)
}

/// Completes a production step.
pub async fn complete_step(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i64,
    step_id: u32,
    file_reference: Option<&str>,
) -> Result<order::Model> {
    let at = Utc::now();
    let (order, ()) = mutate(db, actor, (Menu::Production, Action::Edit), order_id, |doc| {
        Ok((
            doc.with_step_completed(step_id, file_reference, &actor.username, at)?,
            (),
        ))
    })
    .await?;
    Ok(order)
}

/// Removes a step's uploaded file, reopening upload steps. Returns the removed
/// reference so the caller can delete it from storage.
pub async fn remove_step_file(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i64,
    step_id: u32,
) -> Result<(order::Model, String)> {
    mutate(db, actor, (Menu::Orders, Action::DeleteFiles), order_id, |doc| {
        doc.without_step_file(step_id)
    })
    .await
}

/// Records a QC decision. Failing requires revision notes.
pub async fn record_qc(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i64,
    passed: bool,
    notes: &str,
) -> Result<order::Model> {
    let at = Utc::now();
    let (order, ()) = mutate(db, actor, (Menu::Qc, Action::Edit), order_id, |doc| {
        Ok((doc.with_qc(passed, notes, &actor.username, at)?, ()))
    })
    .await?;
    Ok(order)
}

/// Closes a revision request. Only legal while the order needs revision; the QC
/// record goes back to unchecked and the status is recomputed from there.
pub async fn complete_revision(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i64,
) -> Result<order::Model> {
    authorize(actor, Menu::Qc, Action::Edit)?;
    let current = find_active(db, order_id).await?;
    if current.status != OrderStatus::NeedsRevision {
        return Err(Error::InvalidTransition {
            message: format!(
                "order {} is '{}', not '{}'",
                current.production_code,
                current.status,
                OrderStatus::NeedsRevision
            ),
        });
    }

    let (order, ()) = mutate(db, actor, (Menu::Qc, Action::Edit), order_id, |doc| {
        Ok((doc.with_revision_completed()?, ()))
    })
    .await?;
    Ok(order)
}

/// Marks the goods packed, optionally with a photo.
pub async fn mark_packed(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i64,
    file_reference: Option<&str>,
) -> Result<order::Model> {
    let at = Utc::now();
    let (order, ()) = mutate(db, actor, (Menu::Packing, Action::Edit), order_id, |doc| {
        Ok((doc.with_packing(file_reference, &actor.username, at)?, ()))
    })
    .await?;
    Ok(order)
}

/// Uploads proof that the parcel was handed to the courier.
pub async fn upload_shipment_proof(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i64,
    file_reference: &str,
) -> Result<order::Model> {
    let at = Utc::now();
    let (order, ()) = mutate(db, actor, (Menu::Shipping, Action::Edit), order_id, |doc| {
        Ok((doc.with_shipment_proof(file_reference, &actor.username, at)?, ()))
    })
    .await?;
    Ok(order)
}

/// Uploads proof that the customer received the goods.
pub async fn upload_receipt_proof(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i64,
    file_reference: &str,
) -> Result<order::Model> {
    let at = Utc::now();
    let (order, ()) = mutate(db, actor, (Menu::Shipping, Action::Edit), order_id, |doc| {
        Ok((doc.with_receipt_proof(file_reference, &actor.username, at)?, ()))
    })
    .await?;
    Ok(order)
}

/// Reports an issue. Returns the order and the new issue id.
pub async fn add_issue(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i64,
    note: &str,
    evidence: Option<&str>,
) -> Result<(order::Model, u32)> {
    let at = Utc::now();
    mutate_announced(
        db,
        actor,
        (Menu::Issues, Action::Create),
        order_id,
        |doc| doc.with_issue(note, evidence, &actor.username, at),
        |order, issue_id| {
            Some(format!(
                "Issue #{issue_id} on {} reported by {}: {}",
                order.production_code,
                actor.display_name,
                note.trim()
            ))
        },
    )
    .await
}

/// Resolves an open issue. Once the last one is resolved the order falls back to
/// whatever state its document describes.
pub async fn resolve_issue(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i64,
    issue_id: u32,
    evidence: Option<&str>,
) -> Result<order::Model> {
    let at = Utc::now();
    let (order, ()) = mutate(db, actor, (Menu::Issues, Action::Edit), order_id, |doc| {
        Ok((
            doc.with_issue_resolved(issue_id, evidence, &actor.username, at)?,
            (),
        ))
    })
    .await?;
    Ok(order)
}

/// Deletes an issue note.
pub async fn delete_issue(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i64,
    issue_id: u32,
) -> Result<order::Model> {
    let (order, ()) = mutate(db, actor, (Menu::Issues, Action::Delete), order_id, |doc| {
        Ok((doc.without_issue(issue_id)?, ()))
    })
    .await?;
    Ok(order)
}

/// Moves an order to the trash.
pub async fn soft_delete_order(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i64,
) -> Result<order::Model> {
    authorize(actor, Menu::Orders, Action::Delete)?;
    let order = find_active(db, order_id).await?;
    let changes = order::ActiveModel {
        deleted_at: Set(Some(Utc::now())),
        ..Default::default()
    };
    let deleted = write_versioned(db, &order, changes).await?;
    info!(code = %deleted.production_code, "Order moved to trash");
    Ok(deleted)
}

/// Brings an order back from the trash.
pub async fn restore_order(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i64,
) -> Result<order::Model> {
    authorize(actor, Menu::Trash, Action::Restore)?;
    let order = find_deleted(db, order_id).await?;
    let changes = order::ActiveModel {
        deleted_at: Set(None),
        ..Default::default()
    };
    let restored = write_versioned(db, &order, changes).await?;
    info!(code = %restored.production_code, "Order restored");
    Ok(restored)
}

/// Deletes a trashed order for good. Returns every file reference the order held
/// so the caller can clean up storage.
pub async fn delete_order_permanently(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i64,
) -> Result<Vec<String>> {
    authorize(actor, Menu::Trash, Action::DeletePermanent)?;
    let order = find_deleted(db, order_id).await?;
    let files = document(&order)?.file_references();

    let txn = db.begin().await?;
    Notification::update_many()
        .col_expr(notification_entity::Column::OrderId, Expr::value(Option::<i64>::None))
        .filter(notification_entity::Column::OrderId.eq(order.id))
        .exec(&txn)
        .await?;
    Order::delete_by_id(order.id).exec(&txn).await?;
    txn.commit().await?;
    info!(code = %order.production_code, files = files.len(), "Order permanently deleted");
    Ok(files)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    /// Drives a "dtf" order through approval and both steps.
    async fn produced_order(
        db: &DatabaseConnection,
        boss: &user::Model,
    ) -> Result<order::Model> {
        let order = create_test_order(db, boss, "dtf").await?;
        upload_approval(db, boss, order.id, "design.pdf").await?;
        complete_step(db, boss, order.id, 1, Some("film.png")).await?;
        complete_step(db, boss, order.id, 2, None).await
    }

    #[tokio::test]
    async fn test_create_order_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let boss = supervisor_model();

        let mut input = new_order_input("dtf");
        input.quantity = 0;
        assert!(matches!(
            create_order(&db, &boss, "ORD", input).await,
            Err(Error::Validation { .. })
        ));

        let mut input = new_order_input("dtf");
        input.customer_name = "  ".to_string();
        assert!(matches!(
            create_order(&db, &boss, "ORD", input).await,
            Err(Error::Validation { .. })
        ));

        let mut input = new_order_input("dtf");
        input.deadline = input.intake_date.pred_opt().unwrap();
        assert!(matches!(
            create_order(&db, &boss, "ORD", input).await,
            Err(Error::Validation { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_integration() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;

        let order = create_test_order(&db, &boss, "dtf").await?;
        assert_eq!(order.production_code, "ORD-202610-001");
        assert_eq!(order.status, OrderStatus::OrderReceived);
        assert_eq!(order.version, 0);
        assert_eq!(order.created_by, boss.username);
        assert_eq!(document(&order)?.steps.len(), 2);

        let second = create_test_order(&db, &boss, "manual").await?;
        assert_eq!(second.production_code, "ORD-202610-002");
        assert_eq!(document(&second)?.steps.len(), 3);

        let feed = notification::list_for_order(&db, order.id).await?;
        assert_eq!(feed.len(), 1);
        assert!(feed[0].message.contains("ORD-202610-001"));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_unknown_type() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        let result = create_test_order(&db, &boss, "sublimation").await;
        assert!(matches!(
            result,
            Err(Error::ProductionTypeNotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_full_workflow_to_completed() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        let order = create_test_order(&db, &boss, "dtf").await?;

        let order = upload_approval(&db, &boss, order.id, "design.pdf").await?;
        assert_eq!(order.status, OrderStatus::InProcess);

        let order = complete_step(&db, &boss, order.id, 2, None).await?;
        assert_eq!(order.status, OrderStatus::InProcess);
        let order = complete_step(&db, &boss, order.id, 1, Some("film.png")).await?;
        assert_eq!(order.status, OrderStatus::Finishing);

        let order = record_qc(&db, &boss, order.id, true, "").await?;
        assert_eq!(order.status, OrderStatus::Finishing);
        let order = mark_packed(&db, &boss, order.id, Some("box.jpg")).await?;
        assert_eq!(order.status, OrderStatus::Shipping);

        let order = upload_shipment_proof(&db, &boss, order.id, "resi.jpg").await?;
        assert_eq!(order.status, OrderStatus::Shipping);
        let order = upload_receipt_proof(&db, &boss, order.id, "received.jpg").await?;
        assert_eq!(order.status, OrderStatus::Completed);

        // intake + status changes: In Process, Finishing, Shipping, Completed
        let feed = notification::list_for_order(&db, order.id).await?;
        assert_eq!(feed.len(), 5);
        assert!(feed[4].message.ends_with("Shipping → Completed"));

        Ok(())
    }

    #[tokio::test]
    async fn test_step_before_approval_is_rejected() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        let order = create_test_order(&db, &boss, "dtf").await?;

        let result = complete_step(&db, &boss, order.id, 2, None).await;
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));

        let unchanged = get_order_by_id(&db, order.id).await?.unwrap();
        assert_eq!(unchanged.version, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_revision_cycle() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        let order = produced_order(&db, &boss).await?;

        let result = complete_revision(&db, &boss, order.id).await;
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));

        let order = record_qc(&db, &boss, order.id, false, "colors bled").await?;
        assert_eq!(order.status, OrderStatus::NeedsRevision);

        let order = complete_revision(&db, &boss, order.id).await?;
        assert_eq!(order.status, OrderStatus::Finishing);
        let doc = document(&order)?;
        assert!(!doc.qc.passed);
        assert!(doc.qc.notes.is_empty());

        let order = record_qc(&db, &boss, order.id, true, "").await?;
        let order = mark_packed(&db, &boss, order.id, None).await?;
        assert_eq!(order.status, OrderStatus::Shipping);

        Ok(())
    }

    #[tokio::test]
    async fn test_issue_overrides_and_auto_reverts() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        let order = produced_order(&db, &boss).await?;
        assert_eq!(order.status, OrderStatus::Finishing);

        let (order, first) = add_issue(&db, &boss, order.id, "ink smudge", None).await?;
        assert_eq!(order.status, OrderStatus::HasIssue);
        let (order, second) = add_issue(&db, &boss, order.id, "wrong size", Some("size.jpg")).await?;
        assert_eq!(order.status, OrderStatus::HasIssue);

        let order = resolve_issue(&db, &boss, order.id, first, None).await?;
        assert_eq!(order.status, OrderStatus::HasIssue);
        let order = resolve_issue(&db, &boss, order.id, second, Some("fixed.jpg")).await?;
        assert_eq!(order.status, OrderStatus::Finishing);

        let (order, third) = add_issue(&db, &boss, order.id, "late courier", None).await?;
        assert_eq!(order.status, OrderStatus::HasIssue);
        let order = delete_issue(&db, &boss, order.id, third).await?;
        assert_eq!(order.status, OrderStatus::Finishing);
        assert_eq!(document(&order)?.issues.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_issue_and_its_notification_are_saved_together() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        let order = create_test_order(&db, &boss, "dtf").await?;

        let (saved, issue_id) = add_issue(&db, &boss, order.id, " torn screen ", None).await?;
        assert_eq!(saved.version, order.version + 1);

        let feed = notification::list_for_order(&db, order.id).await?;
        let reported = format!(
            "Issue #{issue_id} on {} reported by {}: torn screen",
            saved.production_code, boss.display_name
        );
        assert_eq!(feed.iter().filter(|entry| entry.message == reported).count(), 1);
        assert!(feed.iter().any(|entry| entry.message.ends_with("→ Has Issue")));

        // A rejected issue leaves neither the note nor a notification behind
        let before = feed.len();
        assert!(matches!(
            add_issue(&db, &boss, order.id, "   ", None).await,
            Err(Error::Validation { .. })
        ));
        assert_eq!(notification::list_for_order(&db, order.id).await?.len(), before);
        let current = get_order_by_id(&db, order.id).await?.unwrap();
        assert_eq!(document(&current)?.issues.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_skipped_recompute_leaves_stale_status() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        let order = create_test_order(&db, &boss, "dtf").await?;

        // Write a new document without going through the workflow path
        let approved = document(&order)?.with_approval("design.pdf", "boss", Utc::now())?;
        let mut raw: order::ActiveModel = order.clone().into();
        raw.production = Set(serde_json::to_value(&approved)?);
        raw.update(&db).await?;

        // Reading does not heal it
        let stale = get_order_by_id(&db, order.id).await?.unwrap();
        assert_eq!(stale.status, OrderStatus::OrderReceived);
        assert_eq!(resolve_status(&document(&stale)?), OrderStatus::InProcess);
        let listed = list_active_orders(&db, Some(OrderStatus::OrderReceived)).await?;
        assert_eq!(listed.len(), 1);

        let refreshed = refresh_status(&db, order.id).await?;
        assert_eq!(refreshed.status, OrderStatus::InProcess);
        // A second refresh is a no-op
        let again = refresh_status(&db, order.id).await?;
        assert_eq!(again.version, refreshed.version);

        Ok(())
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        let order = create_test_order(&db, &boss, "dtf").await?;
        upload_approval(&db, &boss, order.id, "design.pdf").await?;

        // `order` still carries version 0
        let doc = document(&order)?.with_approval("other.pdf", "boss", Utc::now())?;
        let result = save_document(&db, &order, &doc, Some("not written".to_string())).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));
        let feed = notification::list_for_order(&db, order.id).await?;
        assert!(feed.iter().all(|entry| entry.message != "not written"));

        let current = get_order_by_id(&db, order.id).await?.unwrap();
        assert_eq!(
            document(&current)?.approval.unwrap().file_reference.as_deref(),
            Some("design.pdf")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_permission_denied_leaves_order_untouched() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        let operator = create_test_user(&db, &boss, "operator1").await?;
        let order = create_test_order(&db, &boss, "dtf").await?;

        assert!(matches!(
            upload_approval(&db, &operator, order.id, "design.pdf").await,
            Err(Error::PermissionDenied { .. })
        ));
        assert!(matches!(
            create_test_order(&db, &operator, "dtf").await,
            Err(Error::PermissionDenied { .. })
        ));

        let unchanged = get_order_by_id(&db, order.id).await?.unwrap();
        assert_eq!(unchanged, order);

        // Granting orders/edit unlocks the approval upload
        let operator = crate::core::user::toggle_user_permission(
            &db, &boss, "operator1", "orders", "edit",
        )
        .await?;
        let order = upload_approval(&db, &operator, order.id, "design.pdf").await?;
        assert_eq!(order.status, OrderStatus::InProcess);

        Ok(())
    }

    #[tokio::test]
    async fn test_remove_step_file_reopens_step() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        let order = produced_order(&db, &boss).await?;
        assert_eq!(order.status, OrderStatus::Finishing);

        let (order, removed) = remove_step_file(&db, &boss, order.id, 1).await?;
        assert_eq!(removed, "film.png");
        assert_eq!(order.status, OrderStatus::InProcess);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_customer() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        let order = create_test_order(&db, &boss, "dtf").await?;

        let update = CustomerUpdate {
            customer_name: "Toko Baju Maju".to_string(),
            customer_phone: "0812000111".to_string(),
            quantity: 48,
            deadline: order.deadline.succ_opt().unwrap(),
        };
        let updated = update_customer(&db, &boss, order.id, update.clone()).await?;
        assert_eq!(updated.customer_name, "Toko Baju Maju");
        assert_eq!(updated.quantity, 48);
        assert_eq!(updated.version, 1);
        assert_eq!(updated.status, order.status);

        let mut bad = update;
        bad.deadline = order.intake_date.pred_opt().unwrap();
        assert!(matches!(
            update_customer(&db, &boss, order.id, bad).await,
            Err(Error::Validation { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_trash_restore_and_purge() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        let order = produced_order(&db, &boss).await?;
        let other = create_test_order(&db, &boss, "manual").await?;

        assert!(matches!(
            delete_order_permanently(&db, &boss, order.id).await,
            Err(Error::InvalidTransition { .. })
        ));

        soft_delete_order(&db, &boss, order.id).await?;
        let active = list_active_orders(&db, None).await?;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, other.id);
        assert_eq!(list_deleted_orders(&db).await?.len(), 1);

        // Workflow mutations do not reach trashed orders
        assert!(matches!(
            record_qc(&db, &boss, order.id, true, "").await,
            Err(Error::OrderNotFound { .. })
        ));

        restore_order(&db, &boss, order.id).await?;
        assert_eq!(list_active_orders(&db, None).await?.len(), 2);
        assert!(matches!(
            restore_order(&db, &boss, order.id).await,
            Err(Error::InvalidTransition { .. })
        ));

        soft_delete_order(&db, &boss, order.id).await?;
        let files = delete_order_permanently(&db, &boss, order.id).await?;
        assert_eq!(files, vec!["design.pdf", "film.png"]);
        assert!(get_order_by_id(&db, order.id).await?.is_none());

        // Notifications survive with the order link cleared
        let orphaned = notification::list_unread(&db, 100).await?;
        assert!(orphaned.iter().any(|n| n.order_id.is_none()));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_active_orders_by_status() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        let first = create_test_order(&db, &boss, "dtf").await?;
        create_test_order(&db, &boss, "dtf").await?;
        upload_approval(&db, &boss, first.id, "design.pdf").await?;

        let received = list_active_orders(&db, Some(OrderStatus::OrderReceived)).await?;
        let in_process = list_active_orders(&db, Some(OrderStatus::InProcess)).await?;
        assert_eq!(received.len(), 1);
        assert_eq!(in_process.len(), 1);
        assert_eq!(in_process[0].id, first.id);

        let by_code = get_order_by_code(&db, &first.production_code).await?.unwrap();
        assert_eq!(by_code.id, first.id);
        assert!(get_order_by_code(&db, "ORD-199901-001").await?.is_none());
        Ok(())
    }
}
