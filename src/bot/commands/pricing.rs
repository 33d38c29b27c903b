//! Pricing Discord commands - quotes and the price list.

use crate::{core::pricing::PriceQuote, errors::Result};
use std::fmt::Write;

/// Formats a whole-unit amount as `Rp 1.440.000`.
#[must_use]
pub fn format_amount(amount: f64) -> String {
    // Cast safety: quotes are rounded to whole units and far below i64::MAX
    #[allow(clippy::cast_possible_truncation)]
    let whole = amount.round() as i64;
    let digits = whole.unsigned_abs().to_string();

    let mut grouped = String::new();
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    let sign = if whole < 0 { "-" } else { "" };
    format!("{sign}Rp {grouped}")
}

/// Quote breakdown for a reply.
pub fn format_quote(quote: &PriceQuote) -> Result<String> {
    let mut response = String::from("🧾 **Price quote**\n\n");
    for line in &quote.lines {
        writeln!(&mut response, "• {} - {}", line.label, format_amount(line.amount))?;
    }
    writeln!(&mut response, "\nSubtotal: {}", format_amount(quote.subtotal))?;
    if quote.discount > 0.0 {
        writeln!(&mut response, "Bulk discount: -{}", format_amount(quote.discount))?;
    }
    writeln!(
        &mut response,
        "**Total: {}** ({} / pc)",
        format_amount(quote.total),
        format_amount(quote.unit_price)
    )?;
    Ok(response)
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{format_amount, format_quote};
    use crate::{
        bot::{Context, acting_user, acting_user_with, handlers::autocomplete, reply_error},
        core::{
            permissions::{Action, Menu},
            pricing::{self, QuoteRequest},
        },
        errors::Result,
    };
    use std::fmt::Write;

    /// Parent command for pricing.
    #[poise::command(slash_command, subcommands("price_quote", "price_list", "price_set"))]
    pub async fn price(ctx: Context<'_>) -> Result<()> {
        let help_text = "Pricing command. Available subcommands:\n\
            `/price quote` - Calculate a quote\n\
            `/price list` - Show the price list\n\
            `/price set` - Change a price";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Calculates a quote from the current price list.
    #[poise::command(slash_command, rename = "quote")]
    pub async fn price_quote(
        ctx: Context<'_>,
        #[description = "Production type (dtf or manual)"]
        #[autocomplete = "autocomplete::autocomplete_production_type"]
        production_type: String,
        #[description = "Number of pieces"] quantity: u32,
        #[description = "Garment, if we supply it (e.g. tshirt)"] garment: Option<String>,
        #[description = "DTF print width in cm"] width_cm: Option<f64>,
        #[description = "DTF print height in cm"] height_cm: Option<f64>,
        #[description = "Number of colors for manual printing"] colors: Option<u32>,
    ) -> Result<()> {
        if acting_user_with(ctx, Menu::Pricing, Action::View)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let request = QuoteRequest {
            production_type,
            garment,
            quantity,
            print_width_cm: width_cm.unwrap_or_default(),
            print_height_cm: height_cm.unwrap_or_default(),
            colors: colors.unwrap_or_default(),
        };

        match pricing::quote(&ctx.data().database, &request).await {
            Ok(quote) => {
                ctx.say(format_quote(&quote)?).await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }

    /// Shows the price list, optionally one category.
    #[poise::command(slash_command, rename = "list")]
    pub async fn price_list(
        ctx: Context<'_>,
        #[description = "Category (e.g. garment, dtf, manual, discount)"] category: Option<String>,
    ) -> Result<()> {
        if acting_user_with(ctx, Menu::Pricing, Action::View)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let db = &ctx.data().database;
        let entries = match category.as_deref() {
            Some(category) => pricing::get_pricing_by_category(db, category.trim()).await?,
            None => pricing::list_pricing(db).await?,
        };
        if entries.is_empty() {
            ctx.say("No pricing entries found.").await?;
            return Ok(());
        }

        let mut response = String::from("💰 **Price list**\n");
        let mut current_category = "";
        for entry in &entries {
            if entry.category != current_category {
                writeln!(&mut response, "\n**{}**", entry.category)?;
                current_category = &entry.category;
            }
            let value = if entry.unit == "%" || entry.category == "discount" {
                format!("{} {}", entry.value, entry.unit)
            } else {
                format!("{} / {}", format_amount(entry.value), entry.unit)
            };
            writeln!(&mut response, "• {} `{}` - {value}", entry.name, entry.key)?;
        }
        ctx.say(response).await?;
        Ok(())
    }

    /// Changes the value of a price list entry.
    #[poise::command(slash_command, rename = "set")]
    pub async fn price_set(
        ctx: Context<'_>,
        #[description = "Pricing key"]
        #[autocomplete = "autocomplete::autocomplete_pricing_key"]
        key: String,
        #[description = "New value"] value: f64,
    ) -> Result<()> {
        let Some(actor) = acting_user(ctx).await? else {
            return Ok(());
        };

        match pricing::set_pricing_value(&ctx.data().database, &actor, key.trim(), value).await {
            Ok(entry) => {
                ctx.say(format!("✅ `{}` is now {} {}.", entry.key, entry.value, entry.unit))
                    .await?;
                Ok(())
            }
            Err(e) => reply_error(ctx, e).await,
        }
    }
}

// Re-export all commands
pub use inner::*;
