//! Order Discord commands - intake, the production workflow and soft delete.
//!
//! Uploads take a Discord attachment; its URL is stored as the file reference.

use crate::{
    core::{document::OrderDocument, report},
    entities::OrderModel,
    errors::Result,
};
use std::fmt::Write;

/// Longest list the bot prints in one message.
const LIST_LIMIT: usize = 20;

fn check(done: bool) -> &'static str {
    if done { "✅" } else { "⬜" }
}

/// Multi-line overview of an order and its production document.
pub fn format_order_detail(order: &OrderModel, document: &OrderDocument) -> Result<String> {
    let mut response = format!("📦 **{}** - {}\n", order.production_code, order.status);
    writeln!(
        &mut response,
        "👤 {} ({}) | {} pcs {}",
        order.customer_name, order.customer_phone, order.quantity, order.production_type
    )?;
    writeln!(
        &mut response,
        "📅 Intake {} | Deadline {}",
        order.intake_date, order.deadline
    )?;
    if let Some(notes) = &order.notes {
        writeln!(&mut response, "📝 {notes}")?;
    }
    if order.deleted_at.is_some() {
        response.push_str("🗑️ _In the trash_\n");
    }
    writeln!(&mut response)?;

    match &document.approval {
        Some(approval) if document.is_approved() => writeln!(
            &mut response,
            "✅ Design approved by {} on {}",
            approval.approved_by,
            approval.approved_at.format("%Y-%m-%d")
        )?,
        _ => response.push_str("⬜ Design approval\n"),
    }

    let (done, total) = report::step_progress(document);
    writeln!(
        &mut response,
        "\n**Production** {}",
        report::format_progress_bar(done, total, 10)
    )?;
    for step in &document.steps {
        let by = step
            .completed_by
            .as_deref()
            .map(|by| format!(" - {by}"))
            .unwrap_or_default();
        writeln!(
            &mut response,
            "{} `{}` {}{by}",
            check(step.completed),
            step.id,
            step.name
        )?;
    }

    writeln!(&mut response, "\n**Finishing**")?;
    if document.qc_failed_with_notes() {
        writeln!(&mut response, "❌ QC failed: {}", document.qc.notes)?;
    } else {
        writeln!(&mut response, "{} QC", check(document.qc.passed))?;
    }
    writeln!(&mut response, "{} Packed", check(document.packing.packed))?;
    writeln!(
        &mut response,
        "{} Shipped",
        check(document.shipping.proof_of_shipment.is_some())
    )?;
    writeln!(&mut response, "{} Received", check(document.has_receipt()))?;

    if !document.issues.is_empty() {
        writeln!(&mut response, "\n**Issues**")?;
        for issue in &document.issues {
            let marker = if issue.resolved { "✅" } else { "⚠️" };
            writeln!(
                &mut response,
                "{marker} #{} {} - {}",
                issue.id, issue.note, issue.reported_by
            )?;
        }
    }

    Ok(response)
}

/// Numbered list of orders, cut at [`LIST_LIMIT`].
pub fn format_order_list(title: &str, orders: &[OrderModel]) -> Result<String> {
    let mut response = format!("📋 **{title}** ({})\n\n", orders.len());
    for order in orders.iter().take(LIST_LIMIT) {
        writeln!(&mut response, "• {}", report::format_status_line(order))?;
    }
    if orders.len() > LIST_LIMIT {
        writeln!(&mut response, "_…and {} more_", orders.len() - LIST_LIMIT)?;
    }
    Ok(response)
}

fn updated(order: &OrderModel, what: &str) -> String {
    format!(
        "✅ {what} for `{}`. Status: **{}**",
        order.production_code, order.status
    )
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{format_order_detail, format_order_list, updated};
    use crate::{
        bot::{
            Context, acting_user, acting_user_with, actor_and_order, find_order,
            handlers::autocomplete, parse_date, reply_error,
        },
        core::{
            order::{self as order_service, CustomerUpdate, NewOrder},
            permissions::{Action, Menu},
        },
        entities::OrderStatus,
        errors::Result,
    };
    use poise::serenity_prelude as serenity;

    /// Parent command for the order workflow.
    #[poise::command(
        slash_command,
        subcommands(
            "order_new",
            "order_view",
            "order_list",
            "order_edit",
            "order_approve",
            "order_step",
            "order_remove_file",
            "order_qc",
            "order_revision",
            "order_pack",
            "order_ship",
            "order_receive",
            "order_delete"
        )
    )]
    pub async fn order(ctx: Context<'_>) -> Result<()> {
        let help_text = "Order command. Available subcommands:\n\
            `/order new` - Take a new order\n\
            `/order view` - Show an order\n\
            `/order list` - List active orders\n\
            `/order edit` - Edit customer details\n\
            `/order approve` - Upload the design approval\n\
            `/order step` - Complete a production step\n\
            `/order remove_file` - Remove a step's file\n\
            `/order qc` - Record a QC decision\n\
            `/order revision` - Finish a requested revision\n\
            `/order pack` - Mark the goods packed\n\
            `/order ship` - Upload proof of shipment\n\
            `/order receive` - Upload proof of receipt\n\
            `/order delete` - Move an order to the trash";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Takes a new order.
    #[poise::command(slash_command, rename = "new")]
    pub async fn order_new(
        ctx: Context<'_>,
        #[description = "Customer name"] customer: String,
        #[description = "Customer phone number"] phone: String,
        #[description = "Number of pieces"] quantity: i32,
        #[description = "Production type"]
        #[autocomplete = "autocomplete::autocomplete_production_type"]
        production_type: String,
        #[description = "Deadline (YYYY-MM-DD)"] deadline: String,
        #[description = "Intake date (YYYY-MM-DD), defaults to today"] intake_date: Option<String>,
        #[description = "Notes for the production team"] notes: Option<String>,
    ) -> Result<()> {
        let Some(actor) = acting_user(ctx).await? else {
            return Ok(());
        };

        let intake_date = match intake_date.as_deref().map(parse_date).transpose() {
            Ok(date) => date.unwrap_or_else(|| chrono::Local::now().date_naive()),
            Err(e) => return reply_error(ctx, e).await,
        };
        let deadline = match parse_date(&deadline) {
            Ok(date) => date,
            Err(e) => return reply_error(ctx, e).await,
        };

        let new_order = NewOrder {
            customer_name: customer,
            customer_phone: phone,
            quantity,
            intake_date,
            deadline,
            production_type,
            notes,
        };
        let data = ctx.data();
        match order_service::create_order(&data.database, &actor, &data.code_prefix, new_order).await {
            Ok(created) => {
                ctx.say(format!(
                    "✅ Order **{}** created for {} ({} pcs). Waiting for design approval.",
                    created.production_code, created.customer_name, created.quantity
                ))
                .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Shows an order with its production progress.
    #[poise::command(slash_command, rename = "view")]
    pub async fn order_view(
        ctx: Context<'_>,
        #[description = "Production code"]
        #[autocomplete = "autocomplete::autocomplete_order_code"]
        code: String,
    ) -> Result<()> {
        if acting_user_with(ctx, Menu::Orders, Action::View)
            .await?
            .is_none()
        {
            return Ok(());
        }
        let Some(found) = find_order(ctx, &code).await? else {
            return Ok(());
        };

        let document = order_service::document(&found)?;
        ctx.say(format_order_detail(&found, &document)?).await?;
        Ok(())
    }

    /// Lists active orders, earliest deadline first.
    #[poise::command(slash_command, rename = "list")]
    pub async fn order_list(
        ctx: Context<'_>,
        #[description = "Only orders in this status"]
        #[autocomplete = "autocomplete::autocomplete_status"]
        status: Option<String>,
    ) -> Result<()> {
        if acting_user_with(ctx, Menu::Orders, Action::View)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let filter = match status.as_deref() {
            Some(label) => {
                let Some(parsed) = OrderStatus::from_label(label) else {
                    ctx.say(format!("❌ Unknown status '{label}'.")).await?;
                    return Ok(());
                };
                Some(parsed)
            }
            None => None,
        };

        let orders = order_service::list_active_orders(&ctx.data().database, filter).await?;
        if orders.is_empty() {
            ctx.say("📂 No matching orders.").await?;
            return Ok(());
        }
        let title = filter.map_or_else(|| "Active orders".to_string(), |s| s.to_string());
        ctx.say(format_order_list(&title, &orders)?).await?;
        Ok(())
    }

    /// Edits customer details. Omitted fields keep their value.
    #[poise::command(slash_command, rename = "edit")]
    pub async fn order_edit(
        ctx: Context<'_>,
        #[description = "Production code"]
        #[autocomplete = "autocomplete::autocomplete_order_code"]
        code: String,
        #[description = "Customer name"] customer: Option<String>,
        #[description = "Customer phone number"] phone: Option<String>,
        #[description = "Number of pieces"] quantity: Option<i32>,
        #[description = "Deadline (YYYY-MM-DD)"] deadline: Option<String>,
    ) -> Result<()> {
        let Some((actor, current)) = actor_and_order(ctx, &code).await? else {
            return Ok(());
        };

        let deadline = match deadline.as_deref().map(parse_date).transpose() {
            Ok(date) => date.unwrap_or(current.deadline),
            Err(e) => return reply_error(ctx, e).await,
        };
        let update = CustomerUpdate {
            customer_name: customer.unwrap_or_else(|| current.customer_name.clone()),
            customer_phone: phone.unwrap_or_else(|| current.customer_phone.clone()),
            quantity: quantity.unwrap_or(current.quantity),
            deadline,
        };

        match order_service::update_customer(&ctx.data().database, &actor, current.id, update).await {
            Ok(saved) => {
                ctx.say(updated(&saved, "Customer details updated")).await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Uploads the customer's design approval.
    #[poise::command(slash_command, rename = "approve")]
    pub async fn order_approve(
        ctx: Context<'_>,
        #[description = "Production code"]
        #[autocomplete = "autocomplete::autocomplete_order_code"]
        code: String,
        #[description = "Approved design or the customer's confirmation"] file: serenity::Attachment,
    ) -> Result<()> {
        let Some((actor, current)) = actor_and_order(ctx, &code).await? else {
            return Ok(());
        };

        match order_service::upload_approval(&ctx.data().database, &actor, current.id, &file.url).await {
            Ok(saved) => {
                ctx.say(updated(&saved, "Design approved")).await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Completes a production step. Upload steps need a file.
    #[poise::command(slash_command, rename = "step")]
    pub async fn order_step(
        ctx: Context<'_>,
        #[description = "Production code"]
        #[autocomplete = "autocomplete::autocomplete_order_code"]
        code: String,
        #[description = "Step number as shown by /order view"] step: u32,
        #[description = "Document or photo for upload steps"] file: Option<serenity::Attachment>,
    ) -> Result<()> {
        let Some((actor, current)) = actor_and_order(ctx, &code).await? else {
            return Ok(());
        };

        let file_reference = file.as_ref().map(|file| file.url.as_str());
        match order_service::complete_step(&ctx.data().database, &actor, current.id, step, file_reference)
            .await
        {
            Ok(saved) => {
                ctx.say(updated(&saved, &format!("Step {step} completed")))
                    .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Removes the file of a step. Upload steps become open again.
    #[poise::command(slash_command, rename = "remove_file")]
    pub async fn order_remove_file(
        ctx: Context<'_>,
        #[description = "Production code"]
        #[autocomplete = "autocomplete::autocomplete_order_code"]
        code: String,
        #[description = "Step number as shown by /order view"] step: u32,
    ) -> Result<()> {
        let Some((actor, current)) = actor_and_order(ctx, &code).await? else {
            return Ok(());
        };

        match order_service::remove_step_file(&ctx.data().database, &actor, current.id, step).await {
            Ok((saved, removed)) => {
                ctx.say(format!(
                    "{}\nRemoved: <{removed}>",
                    updated(&saved, &format!("File of step {step} removed"))
                ))
                .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Records a QC decision. A failure needs notes describing the revision.
    #[poise::command(slash_command, rename = "qc")]
    pub async fn order_qc(
        ctx: Context<'_>,
        #[description = "Production code"]
        #[autocomplete = "autocomplete::autocomplete_order_code"]
        code: String,
        #[description = "Did the goods pass QC?"] passed: bool,
        #[description = "What needs to be revised"] notes: Option<String>,
    ) -> Result<()> {
        let Some((actor, current)) = actor_and_order(ctx, &code).await? else {
            return Ok(());
        };

        let notes = notes.unwrap_or_default();
        match order_service::record_qc(&ctx.data().database, &actor, current.id, passed, &notes).await {
            Ok(saved) => {
                let what = if passed { "QC passed" } else { "QC failed" };
                ctx.say(updated(&saved, what)).await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Marks a requested revision as done so QC can run again.
    #[poise::command(slash_command, rename = "revision")]
    pub async fn order_revision(
        ctx: Context<'_>,
        #[description = "Production code"]
        #[autocomplete = "autocomplete::autocomplete_order_code"]
        code: String,
    ) -> Result<()> {
        let Some((actor, current)) = actor_and_order(ctx, &code).await? else {
            return Ok(());
        };

        match order_service::complete_revision(&ctx.data().database, &actor, current.id).await {
            Ok(saved) => {
                ctx.say(updated(&saved, "Revision completed")).await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Marks the goods packed.
    #[poise::command(slash_command, rename = "pack")]
    pub async fn order_pack(
        ctx: Context<'_>,
        #[description = "Production code"]
        #[autocomplete = "autocomplete::autocomplete_order_code"]
        code: String,
        #[description = "Photo of the packed goods"] photo: Option<serenity::Attachment>,
    ) -> Result<()> {
        let Some((actor, current)) = actor_and_order(ctx, &code).await? else {
            return Ok(());
        };

        let file_reference = photo.as_ref().map(|photo| photo.url.as_str());
        match order_service::mark_packed(&ctx.data().database, &actor, current.id, file_reference).await {
            Ok(saved) => {
                ctx.say(updated(&saved, "Packed")).await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Uploads proof that the parcel was handed to the courier.
    #[poise::command(slash_command, rename = "ship")]
    pub async fn order_ship(
        ctx: Context<'_>,
        #[description = "Production code"]
        #[autocomplete = "autocomplete::autocomplete_order_code"]
        code: String,
        #[description = "Courier receipt or tracking screenshot"] proof: serenity::Attachment,
    ) -> Result<()> {
        let Some((actor, current)) = actor_and_order(ctx, &code).await? else {
            return Ok(());
        };

        match order_service::upload_shipment_proof(&ctx.data().database, &actor, current.id, &proof.url)
            .await
        {
            Ok(saved) => {
                ctx.say(updated(&saved, "Shipment recorded")).await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Uploads proof that the customer received the goods.
    #[poise::command(slash_command, rename = "receive")]
    pub async fn order_receive(
        ctx: Context<'_>,
        #[description = "Production code"]
        #[autocomplete = "autocomplete::autocomplete_order_code"]
        code: String,
        #[description = "Delivery confirmation"] proof: serenity::Attachment,
    ) -> Result<()> {
        let Some((actor, current)) = actor_and_order(ctx, &code).await? else {
            return Ok(());
        };

        match order_service::upload_receipt_proof(&ctx.data().database, &actor, current.id, &proof.url)
            .await
        {
            Ok(saved) => {
                ctx.say(updated(&saved, "Receipt recorded")).await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Moves an order to the trash.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn order_delete(
        ctx: Context<'_>,
        #[description = "Production code"]
        #[autocomplete = "autocomplete::autocomplete_order_code"]
        code: String,
    ) -> Result<()> {
        let Some((actor, current)) = actor_and_order(ctx, &code).await? else {
            return Ok(());
        };

        match order_service::soft_delete_order(&ctx.data().database, &actor, current.id).await {
            Ok(deleted) => {
                ctx.say(format!(
                    "🗑️ Order `{}` moved to the trash. Use `/trash restore` to bring it back.",
                    deleted.production_code
                ))
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
    use crate::core::order::document;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_format_order_detail() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        let created = create_test_order(&db, &boss, "dtf").await?;
        let created =
            crate::core::order::upload_approval(&db, &boss, created.id, "design.pdf").await?;
        let (created, _) =
            crate::core::order::add_issue(&db, &boss, created.id, "ink smudge", None).await?;

        let detail = format_order_detail(&created, &document(&created)?)?;
        assert!(detail.starts_with("📦 **ORD-202610-001** - Has Issue"));
        assert!(detail.contains("✅ Design approved by boss"));
        assert!(detail.contains("[░░░░░░░░░░] 0/2"));
        assert!(detail.contains("⬜ `1` Print film"));
        assert!(detail.contains("⚠️ #1 ink smudge"));
        Ok(())
    }

    #[tokio::test]
    async fn test_format_order_list_is_capped() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        let mut orders = Vec::new();
        for _ in 0..(LIST_LIMIT + 2) {
            orders.push(create_test_order(&db, &boss, "manual").await?);
        }

        let list = format_order_list("Active orders", &orders)?;
        assert!(list.starts_with(&format!("📋 **Active orders** ({})", LIST_LIMIT + 2)));
        assert!(list.contains("_…and 2 more_"));
        Ok(())
    }
}
