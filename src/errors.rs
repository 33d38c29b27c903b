//! Unified error type for the tracker.
//!
//! Service functions in [`crate::core`] return [`Result`]; the bot layer turns
//! these into user-facing replies.

use thiserror::Error;

/// All errors produced by the tracker.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Input rejected before touching the database
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// Any `SeaORM` failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Order lookup by production code or id failed
    #[error("Order not found: {code}")]
    OrderNotFound {
        /// Production code or id that was looked up
        code: String,
    },

    /// No step with this id on the order
    #[error("Step {step_id} not found on order")]
    StepNotFound {
        /// Requested step id
        step_id: u32,
    },

    /// No issue note with this id on the order
    #[error("Issue {issue_id} not found on order")]
    IssueNotFound {
        /// Requested issue id
        issue_id: u32,
    },

    /// Unknown production type code
    #[error("Production type not found: {code}")]
    ProductionTypeNotFound {
        /// Requested code
        code: String,
    },

    /// Unknown user
    #[error("User not found: {name}")]
    UserNotFound {
        /// Username, id or Discord id that was looked up
        name: String,
    },

    /// Unknown pricing key
    #[error("Pricing entry not found: {key}")]
    PricingNotFound {
        /// Missing key
        key: String,
    },

    /// The acting user may not perform this action
    #[error("Permission denied: `{action}` on `{menu}`")]
    PermissionDenied {
        /// Menu id
        menu: String,
        /// Action name
        action: String,
    },

    /// The workflow does not allow this mutation in the order's current state
    #[error("Invalid workflow transition: {message}")]
    InvalidTransition {
        /// Which rule blocked the mutation
        message: String,
    },

    /// The order changed between read and write
    #[error("Order {code} was modified by someone else, reload and try again")]
    Conflict {
        /// Production code of the order
        code: String,
    },

    /// Username/password mismatch
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Argon2 failure other than a mismatch
    #[error("Password hashing error: {message}")]
    PasswordHash {
        /// Underlying message
        message: String,
    },

    /// Malformed JSON document column
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Integer conversion failure
    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),

    /// Formatting error while building a reply
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or invalid environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise error
    #[error("Discord framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::PasswordHash {
            message: value.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
