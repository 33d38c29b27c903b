//! Pricing business logic - the price list and the quote calculator.
//!
//! The price list is a flat table of numeric entries addressed by key:
//!
//! | key                         | meaning                                   |
//! |-----------------------------|-------------------------------------------|
//! | `garment.{name}`            | blank garment price per piece             |
//! | `dtf.price_per_cm2`         | DTF print price per cm² per piece         |
//! | `manual.screen_per_color`   | one-time screen setup per color           |
//! | `manual.print_per_color`    | manual screen print per color per piece   |
//! | `discount.bulk_min_qty`     | quantity at which the bulk discount starts |
//! | `discount.bulk_percent`     | bulk discount in percent of the subtotal  |

use crate::{
    config::catalog::PricingConfig,
    core::permissions::{Action, Menu, authorize},
    entities::{Pricing, pricing, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::BTreeMap;
use tracing::info;

/// In-memory snapshot of the price list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable(BTreeMap<String, f64>);

impl PriceTable {
    /// Builds a table from stored entries.
    #[must_use]
    pub fn from_entries(entries: &[pricing::Model]) -> Self {
        Self(
            entries
                .iter()
                .map(|entry| (entry.key.clone(), entry.value))
                .collect(),
        )
    }

    /// Sets a value, replacing any previous one.
    #[must_use]
    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    /// Looks up a value.
    ///
    /// # Errors
    /// `PricingNotFound` naming the key when it is missing.
    pub fn get(&self, key: &str) -> Result<f64> {
        self.0.get(key).copied().ok_or_else(|| Error::PricingNotFound {
            key: key.to_string(),
        })
    }
}

/// What the customer wants priced.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    /// Production type code (`dtf` or `manual`)
    pub production_type: String,
    /// Garment key suffix; `None` when the customer supplies the garments
    pub garment: Option<String>,
    /// Number of pieces
    pub quantity: u32,
    /// Print width in centimetres (DTF)
    pub print_width_cm: f64,
    /// Print height in centimetres (DTF)
    pub print_height_cm: f64,
    /// Number of colors (manual screen printing)
    pub colors: u32,
}

/// One priced component of a quote.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteLine {
    /// What the line charges for
    pub label: String,
    /// Line total
    pub amount: f64,
}

/// A computed quote. Money values are rounded to whole units.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    /// Priced components
    pub lines: Vec<QuoteLine>,
    /// Sum of all lines
    pub subtotal: f64,
    /// Bulk discount, zero below the threshold
    pub discount: f64,
    /// `subtotal - discount`
    pub total: f64,
    /// `total / quantity`
    pub unit_price: f64,
}

/// Prices a request against a price table.
///
/// # Errors
/// - `Validation` for a zero quantity, an empty DTF print area, a manual print
///   without colors or an unknown production type
/// - `PricingNotFound` for any price key the calculation needs but the table
///   lacks
pub fn calculate_price(table: &PriceTable, request: &QuoteRequest) -> Result<PriceQuote> {
    if request.quantity == 0 {
        return Err(Error::Validation {
            message: "quantity must be at least 1".to_string(),
        });
    }
    let quantity = f64::from(request.quantity);
    let mut lines = Vec::new();

    if let Some(garment) = request.garment.as_deref().map(str::trim) {
        let unit = table.get(&format!("garment.{}", garment.to_lowercase()))?;
        lines.push(QuoteLine {
            label: format!("Garment {garment} × {}", request.quantity),
            amount: unit * quantity,
        });
    }

    match request.production_type.trim().to_lowercase().as_str() {
        "dtf" => {
            let area = request.print_width_cm * request.print_height_cm;
            if !area.is_finite() || area <= 0.0 {
                return Err(Error::Validation {
                    message: "DTF print size must be positive".to_string(),
                });
            }
            let per_cm2 = table.get("dtf.price_per_cm2")?;
            lines.push(QuoteLine {
                label: format!("DTF print {area:.0} cm² × {}", request.quantity),
                amount: area * per_cm2 * quantity,
            });
        }
        "manual" => {
            if request.colors == 0 {
                return Err(Error::Validation {
                    message: "manual printing needs at least one color".to_string(),
                });
            }
            let colors = f64::from(request.colors);
            let screen = table.get("manual.screen_per_color")?;
            let print = table.get("manual.print_per_color")?;
            lines.push(QuoteLine {
                label: format!("Screens × {}", request.colors),
                amount: screen * colors,
            });
            lines.push(QuoteLine {
                label: format!("Print {} colors × {}", request.colors, request.quantity),
                amount: print * colors * quantity,
            });
        }
        other => {
            return Err(Error::Validation {
                message: format!("no pricing rule for production type '{other}'"),
            });
        }
    }

    let subtotal: f64 = lines.iter().map(|line| line.amount).sum();
    let min_quantity = table.get("discount.bulk_min_qty")?;
    let percent = table.get("discount.bulk_percent")?;
    let discount = if quantity >= min_quantity {
        subtotal * percent / 100.0
    } else {
        0.0
    };

    let subtotal = subtotal.round();
    let discount = discount.round();
    let total = subtotal - discount;
    Ok(PriceQuote {
        lines: lines
            .into_iter()
            .map(|line| QuoteLine {
                amount: line.amount.round(),
                ..line
            })
            .collect(),
        subtotal,
        discount,
        total,
        unit_price: (total / quantity).round(),
    })
}

/// Every entry, grouped by category then key.
pub async fn list_pricing(db: &DatabaseConnection) -> Result<Vec<pricing::Model>> {
    Pricing::find()
        .order_by_asc(pricing::Column::Category)
        .order_by_asc(pricing::Column::Key)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Entries of one category, ordered by key.
pub async fn get_pricing_by_category(
    db: &DatabaseConnection,
    category: &str,
) -> Result<Vec<pricing::Model>> {
    Pricing::find()
        .filter(pricing::Column::Category.eq(category))
        .order_by_asc(pricing::Column::Key)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an entry by key.
pub async fn get_pricing_by_key(
    db: &DatabaseConnection,
    key: &str,
) -> Result<Option<pricing::Model>> {
    Pricing::find()
        .filter(pricing::Column::Key.eq(key))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads the whole price list into a [`PriceTable`].
pub async fn load_price_table(db: &DatabaseConnection) -> Result<PriceTable> {
    Ok(PriceTable::from_entries(&list_pricing(db).await?))
}

/// Prices a request against the stored price list.
pub async fn quote(db: &DatabaseConnection, request: &QuoteRequest) -> Result<PriceQuote> {
    let table = load_price_table(db).await?;
    calculate_price(&table, request)
}

/// Changes the value of an existing entry.
pub async fn set_pricing_value(
    db: &DatabaseConnection,
    actor: &user::Model,
    key: &str,
    value: f64,
) -> Result<pricing::Model> {
    authorize(actor, Menu::Pricing, Action::Edit)?;
    if !value.is_finite() || value < 0.0 {
        return Err(Error::Validation {
            message: format!("price must be a non-negative number, got {value}"),
        });
    }

    let entry = get_pricing_by_key(db, key)
        .await?
        .ok_or_else(|| Error::PricingNotFound {
            key: key.to_string(),
        })?;
    let previous = entry.value;

    let mut active_model: pricing::ActiveModel = entry.into();
    active_model.value = Set(value);
    active_model.updated_at = Set(chrono::Utc::now().naive_utc());
    let updated = active_model.update(db).await?;

    info!(key, previous, value, actor = %actor.username, "Price updated");
    Ok(updated)
}

/// Inserts every configured entry whose key is not stored yet. Existing values
/// are left alone so edits made through the bot survive restarts.
///
/// Returns how many were inserted.
pub async fn seed_pricing(db: &DatabaseConnection, configs: &[PricingConfig]) -> Result<usize> {
    let mut inserted = 0;
    for config in configs {
        if get_pricing_by_key(db, &config.key).await?.is_some() {
            continue;
        }
        let entry = pricing::ActiveModel {
            key: Set(config.key.clone()),
            category: Set(config.category.clone()),
            name: Set(config.name.clone()),
            value: Set(config.value),
            unit: Set(config.unit.clone()),
            updated_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };
        entry.insert(db).await?;
        inserted += 1;
    }
    info!(inserted, "Pricing seeded");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn table() -> PriceTable {
        PriceTable::default()
            .with("garment.tshirt", 45_000.0)
            .with("dtf.price_per_cm2", 25.0)
            .with("manual.screen_per_color", 50_000.0)
            .with("manual.print_per_color", 3_000.0)
            .with("discount.bulk_min_qty", 100.0)
            .with("discount.bulk_percent", 10.0)
    }

    fn dtf_request(quantity: u32) -> QuoteRequest {
        QuoteRequest {
            production_type: "dtf".to_string(),
            garment: Some("tshirt".to_string()),
            quantity,
            print_width_cm: 20.0,
            print_height_cm: 30.0,
            colors: 0,
        }
    }

    #[test]
    fn test_dtf_quote_with_garment() -> Result<()> {
        let quote = calculate_price(&table(), &dtf_request(24))?;
        assert_eq!(quote.lines.len(), 2);
        assert_eq!(quote.lines[0].amount, 1_080_000.0);
        assert_eq!(quote.lines[1].amount, 360_000.0);
        assert_eq!(quote.subtotal, 1_440_000.0);
        assert_eq!(quote.discount, 0.0);
        assert_eq!(quote.total, 1_440_000.0);
        assert_eq!(quote.unit_price, 60_000.0);
        Ok(())
    }

    #[test]
    fn test_manual_quote_gets_bulk_discount() -> Result<()> {
        let request = QuoteRequest {
            production_type: "manual".to_string(),
            garment: None,
            quantity: 100,
            print_width_cm: 0.0,
            print_height_cm: 0.0,
            colors: 2,
        };
        let quote = calculate_price(&table(), &request)?;
        assert_eq!(quote.subtotal, 700_000.0);
        assert_eq!(quote.discount, 70_000.0);
        assert_eq!(quote.total, 630_000.0);
        assert_eq!(quote.unit_price, 6_300.0);

        // One piece below the threshold pays full price
        let quote = calculate_price(&table(), &QuoteRequest { quantity: 99, ..request })?;
        assert_eq!(quote.discount, 0.0);
        Ok(())
    }

    #[test]
    fn test_totals_are_rounded() -> Result<()> {
        let table = table().with("dtf.price_per_cm2", 2.5);
        let request = QuoteRequest {
            garment: None,
            quantity: 1,
            print_width_cm: 7.0,
            print_height_cm: 9.0,
            ..dtf_request(1)
        };
        let quote = calculate_price(&table, &request)?;
        assert_eq!(quote.total, 158.0);
        Ok(())
    }

    #[test]
    fn test_missing_key_names_the_key() {
        let result = calculate_price(&table(), &QuoteRequest {
            garment: Some("hoodie".to_string()),
            ..dtf_request(10)
        });
        assert!(matches!(
            result,
            Err(Error::PricingNotFound { key }) if key == "garment.hoodie"
        ));
    }

    #[test]
    fn test_invalid_requests() {
        assert!(matches!(
            calculate_price(&table(), &dtf_request(0)),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            calculate_price(&table(), &QuoteRequest {
                print_width_cm: 0.0,
                ..dtf_request(10)
            }),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            calculate_price(&table(), &QuoteRequest {
                production_type: "embroidery".to_string(),
                ..dtf_request(10)
            }),
            Err(Error::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_seeded_price_list() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;

        let all = list_pricing(&db).await?;
        assert_eq!(all.len(), test_catalog().pricing.len());
        assert_eq!(get_pricing_by_category(&db, "manual").await?.len(), 2);
        assert_eq!(seed_pricing(&db, &test_catalog().pricing).await?, 0);

        let quote = quote(&db, &dtf_request(24)).await?;
        assert_eq!(quote.total, 1_440_000.0);

        set_pricing_value(&db, &boss, "dtf.price_per_cm2", 30.0).await?;
        let table = load_price_table(&db).await?;
        assert_eq!(table.get("dtf.price_per_cm2")?, 30.0);

        // Reseeding does not overwrite the edited value
        seed_pricing(&db, &test_catalog().pricing).await?;
        let entry = get_pricing_by_key(&db, "dtf.price_per_cm2").await?;
        assert_eq!(entry.map(|e| e.value), Some(30.0));

        Ok(())
    }

    #[tokio::test]
    async fn test_set_pricing_value_checks() -> Result<()> {
        let (db, boss) = setup_with_catalog().await?;
        let operator = create_test_user(&db, &boss, "operator1").await?;

        assert!(matches!(
            set_pricing_value(&db, &operator, "dtf.price_per_cm2", 1.0).await,
            Err(Error::PermissionDenied { .. })
        ));
        assert!(matches!(
            set_pricing_value(&db, &boss, "dtf.price_per_cm2", -1.0).await,
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            set_pricing_value(&db, &boss, "nope", 1.0).await,
            Err(Error::PricingNotFound { .. })
        ));
        Ok(())
    }
}
