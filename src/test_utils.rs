//! Shared test utilities for the print tracker.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    config::{
        catalog::{Config, parse_config},
        users::SupervisorSettings,
    },
    core::{order, pricing, production_type, user},
    entities,
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Password used for every account created by these helpers.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

const TEST_CATALOG: &str = r#"
    [[production_types]]
    name = "DTF"
    code = "dtf"
    steps = [
        { name = "Print film", kind = "upload-image" },
        { name = "Heat press", kind = "mark-complete" },
    ]

    [[production_types]]
    name = "Manual Screen Printing"
    code = "manual"
    steps = [
        { name = "Film separation", kind = "upload-document" },
        { name = "Screen exposure", kind = "mark-complete" },
        { name = "Printing", kind = "upload-image" },
    ]

    [[pricing]]
    key = "garment.tshirt"
    category = "garment"
    name = "T-shirt"
    value = 45000.0

    [[pricing]]
    key = "dtf.price_per_cm2"
    category = "dtf"
    name = "DTF per cm²"
    value = 25.0

    [[pricing]]
    key = "manual.screen_per_color"
    category = "manual"
    name = "Screen per color"
    value = 50000.0

    [[pricing]]
    key = "manual.print_per_color"
    category = "manual"
    name = "Print per color"
    value = 3000.0

    [[pricing]]
    key = "discount.bulk_min_qty"
    category = "discount"
    name = "Bulk threshold"
    value = 100.0

    [[pricing]]
    key = "discount.bulk_percent"
    category = "discount"
    name = "Bulk discount"
    value = 10.0
"#;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// The catalog used by the integration tests.
///
/// # Contents
/// * `dtf`: print film (upload-image), heat press (mark-complete)
/// * `manual`: three steps
/// * a complete price list
pub fn test_catalog() -> Config {
    parse_config(TEST_CATALOG).unwrap()
}

/// An unsaved supervisor, for validation paths that never reach the database.
pub fn supervisor_model() -> entities::UserModel {
    let now = chrono::Utc::now();
    entities::UserModel {
        id: 1,
        username: "boss".to_string(),
        password_hash: String::new(),
        display_name: "Boss".to_string(),
        role: crate::core::permissions::SUPERUSER_ROLE.to_string(),
        permissions: serde_json::json!({}),
        phone: None,
        discord_id: None,
        created_at: now,
        updated_at: now,
    }
}

/// Input for an operator account with the shared test password.
pub fn operator_input(username: &str) -> user::NewUser {
    user::NewUser {
        username: username.to_string(),
        password: TEST_PASSWORD.to_string(),
        display_name: format!("Operator {username}"),
        role: "operator".to_string(),
        phone: None,
        discord_id: None,
    }
}

/// Creates a test database with a bootstrapped supervisor named `boss`.
pub async fn setup_with_supervisor() -> Result<(DatabaseConnection, entities::UserModel)> {
    let db = setup_test_db().await?;
    let settings = SupervisorSettings {
        username: "boss".to_string(),
        password: TEST_PASSWORD.to_string(),
        discord_id: Some("1000".to_string()),
    };
    let boss = user::ensure_supervisor(&db, &settings)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            name: settings.username.clone(),
        })?;
    Ok((db, boss))
}

/// Creates a test database with a supervisor and the [`test_catalog`] seeded.
pub async fn setup_with_catalog() -> Result<(DatabaseConnection, entities::UserModel)> {
    let (db, boss) = setup_with_supervisor().await?;
    let catalog = test_catalog();
    production_type::seed_production_types(&db, &catalog.production_types).await?;
    pricing::seed_pricing(&db, &catalog.pricing).await?;
    Ok((db, boss))
}

/// Creates an operator with the starter permissions (dashboard and order view).
pub async fn create_test_user(
    db: &DatabaseConnection,
    actor: &entities::UserModel,
    username: &str,
) -> Result<entities::UserModel> {
    user::create_user(db, actor, operator_input(username)).await
}

/// Order input with sensible defaults.
///
/// # Defaults
/// * customer: "Budi Santoso", 24 pieces
/// * intake: 2026-10-05, deadline: 2026-10-20
pub fn new_order_input(production_type: &str) -> order::NewOrder {
    order::NewOrder {
        customer_name: "Budi Santoso".to_string(),
        customer_phone: "081234567890".to_string(),
        quantity: 24,
        intake_date: NaiveDate::from_ymd_opt(2026, 10, 5).unwrap(),
        deadline: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
        production_type: production_type.to_string(),
        notes: None,
    }
}

/// Creates an order of the given type with [`new_order_input`] defaults and the
/// `ORD` prefix.
pub async fn create_test_order(
    db: &DatabaseConnection,
    actor: &entities::UserModel,
    production_type: &str,
) -> Result<entities::OrderModel> {
    order::create_order(db, actor, "ORD", new_order_input(production_type)).await
}
