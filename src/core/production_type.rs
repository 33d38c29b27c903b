//! Production type business logic - the step templates new orders are built from.
//!
//! Changing or deleting a type never touches existing orders: they keep the steps
//! copied at intake.

use crate::{
    config::catalog::ProductionTypeConfig,
    core::{
        document::{StepKind, StepTemplate},
        permissions::{Action, Menu, authorize},
    },
    entities::{ProductionType, production_type, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Decodes the stored step template of a type.
pub fn step_templates(production_type: &production_type::Model) -> Result<Vec<StepTemplate>> {
    serde_json::from_value(production_type.steps.clone()).map_err(Into::into)
}

/// Parses a step list written as `Name:kind; Name:kind`.
///
/// Kinds are `upload-document`, `upload-image` and `mark-complete`; a step
/// without a kind is `mark-complete`.
pub fn parse_step_templates(input: &str) -> Result<Vec<StepTemplate>> {
    input
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, kind) = entry.rsplit_once(':').unwrap_or((entry, "mark-complete"));
            let kind = match kind.trim().to_lowercase().as_str() {
                "upload-document" => StepKind::UploadDocument,
                "upload-image" => StepKind::UploadImage,
                "mark-complete" => StepKind::MarkComplete,
                other => {
                    return Err(Error::Validation {
                        message: format!("unknown step kind '{other}'"),
                    });
                }
            };
            Ok(StepTemplate {
                name: name.trim().to_string(),
                kind,
            })
        })
        .collect()
}

fn validate(name: &str, code: &str, steps: &[StepTemplate]) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "production type name cannot be empty".to_string(),
        });
    }
    let code = code.trim();
    if code.is_empty() || code.chars().any(char::is_whitespace) {
        return Err(Error::Validation {
            message: "production type code must be a single non-empty word".to_string(),
        });
    }
    if let Some(step) = steps.iter().find(|step| step.name.trim().is_empty()) {
        return Err(Error::Validation {
            message: format!("step names cannot be empty (kind {:?})", step.kind),
        });
    }
    Ok(())
}

async fn insert(
    db: &DatabaseConnection,
    name: &str,
    code: &str,
    steps: &[StepTemplate],
) -> Result<production_type::Model> {
    validate(name, code, steps)?;

    let now = chrono::Utc::now().naive_utc();
    let model = production_type::ActiveModel {
        name: Set(name.trim().to_string()),
        code: Set(code.trim().to_lowercase()),
        steps: Set(serde_json::to_value(steps)?),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// All active types, alphabetically by name.
pub async fn get_all_active_production_types(
    db: &DatabaseConnection,
) -> Result<Vec<production_type::Model>> {
    ProductionType::find()
        .filter(production_type::Column::IsDeleted.eq(false))
        .order_by_asc(production_type::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an active type by code (case-insensitive).
pub async fn get_production_type_by_code(
    db: &DatabaseConnection,
    code: &str,
) -> Result<Option<production_type::Model>> {
    ProductionType::find()
        .filter(production_type::Column::Code.eq(code.trim().to_lowercase()))
        .filter(production_type::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new production type.
pub async fn create_production_type(
    db: &DatabaseConnection,
    actor: &user::Model,
    name: &str,
    code: &str,
    steps: &[StepTemplate],
) -> Result<production_type::Model> {
    authorize(actor, Menu::ProductionTypes, Action::Create)?;
    let created = insert(db, name, code, steps).await?;
    info!(code = %created.code, steps = steps.len(), "Production type created");
    Ok(created)
}

/// Replaces the step template of a type.
pub async fn update_production_type_steps(
    db: &DatabaseConnection,
    actor: &user::Model,
    code: &str,
    steps: &[StepTemplate],
) -> Result<production_type::Model> {
    authorize(actor, Menu::ProductionTypes, Action::Edit)?;
    let existing = get_production_type_by_code(db, code)
        .await?
        .ok_or_else(|| Error::ProductionTypeNotFound {
            code: code.to_string(),
        })?;
    validate(&existing.name, &existing.code, steps)?;

    let mut active_model: production_type::ActiveModel = existing.into();
    active_model.steps = Set(serde_json::to_value(steps)?);
    active_model.updated_at = Set(chrono::Utc::now().naive_utc());
    active_model.update(db).await.map_err(Into::into)
}

/// Soft deletes a type so no new orders can use it.
pub async fn delete_production_type(
    db: &DatabaseConnection,
    actor: &user::Model,
    code: &str,
) -> Result<production_type::Model> {
    authorize(actor, Menu::ProductionTypes, Action::Delete)?;
    let existing = get_production_type_by_code(db, code)
        .await?
        .ok_or_else(|| Error::ProductionTypeNotFound {
            code: code.to_string(),
        })?;

    let mut active_model: production_type::ActiveModel = existing.into();
    active_model.is_deleted = Set(true);
    active_model.updated_at = Set(chrono::Utc::now().naive_utc());
    active_model.update(db).await.map_err(Into::into)
}

/// Inserts every configured type whose code is not in the database yet.
///
/// Returns how many were inserted.
pub async fn seed_production_types(
    db: &DatabaseConnection,
    configs: &[ProductionTypeConfig],
) -> Result<usize> {
    let mut inserted = 0;
    for config in configs {
        let exists = ProductionType::find()
            .filter(production_type::Column::Code.eq(config.code.trim().to_lowercase()))
            .one(db)
            .await?
            .is_some();
        if !exists {
            insert(db, &config.name, &config.code, &config.steps).await?;
            inserted += 1;
        }
    }
    info!(inserted, "Production types seeded");
    Ok(inserted)
}
