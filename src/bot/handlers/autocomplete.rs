//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggestions come straight from the database or the fixed enums, so commands
//! receive exactly the codes and keys the services expect.

use crate::{
    bot::Context,
    core::{
        order,
        permissions::{Action, Menu},
        pricing, production_type, user,
    },
    entities::OrderStatus,
};

/// Discord autocomplete limit.
const MAX_SUGGESTIONS: usize = 25;

/// Case-insensitive substring filter, capped at [`MAX_SUGGESTIONS`].
fn filter_matches<I>(candidates: I, partial: &str) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let partial_lower = partial.trim().to_lowercase();
    candidates
        .into_iter()
        .filter(|candidate| candidate.to_lowercase().contains(&partial_lower))
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Production codes of active orders, earliest deadline first.
pub async fn autocomplete_order_code(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let Ok(orders) = order::list_active_orders(&ctx.data().database, None).await else {
        return Vec::new();
    };
    filter_matches(orders.into_iter().map(|o| o.production_code), partial)
}

/// Production codes of orders in the trash.
pub async fn autocomplete_deleted_order_code(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let Ok(orders) = order::list_deleted_orders(&ctx.data().database).await else {
        return Vec::new();
    };
    filter_matches(orders.into_iter().map(|o| o.production_code), partial)
}

/// Codes of active production types.
pub async fn autocomplete_production_type(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let Ok(types) = production_type::get_all_active_production_types(&ctx.data().database).await
    else {
        return Vec::new();
    };
    filter_matches(types.into_iter().map(|t| t.code), partial)
}

/// Price list keys.
pub async fn autocomplete_pricing_key(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let Ok(entries) = pricing::list_pricing(&ctx.data().database).await else {
        return Vec::new();
    };
    filter_matches(entries.into_iter().map(|e| e.key), partial)
}

/// Account usernames.
pub async fn autocomplete_username(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let Ok(accounts) = user::list_users(&ctx.data().database).await else {
        return Vec::new();
    };
    filter_matches(accounts.into_iter().map(|a| a.username), partial)
}

/// Order status labels.
pub async fn autocomplete_status(_ctx: Context<'_>, partial: &str) -> Vec<String> {
    filter_matches(OrderStatus::ALL.iter().map(ToString::to_string), partial)
}

/// Menu ids.
pub async fn autocomplete_menu(_ctx: Context<'_>, partial: &str) -> Vec<String> {
    filter_matches(Menu::ALL.iter().map(ToString::to_string), partial)
}

/// Action names.
pub async fn autocomplete_action(_ctx: Context<'_>, partial: &str) -> Vec<String> {
    filter_matches(Action::ALL.iter().map(ToString::to_string), partial)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches() {
        let statuses = || OrderStatus::ALL.iter().map(ToString::to_string);
        assert_eq!(filter_matches(statuses(), "ship"), vec!["Shipping"]);
        assert_eq!(filter_matches(statuses(), "").len(), OrderStatus::ALL.len());
        assert!(filter_matches(statuses(), "zzz").is_empty());

        let many = (0..40).map(|i| format!("ORD-202610-{i:03}"));
        assert_eq!(filter_matches(many, "ord").len(), MAX_SUGGESTIONS);
    }
}
