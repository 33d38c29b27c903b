//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Account, permission and production type administration
pub mod admin;

/// Dashboard summary and notification feed
pub mod dashboard;

/// General utility commands
pub mod general;

/// Issue note commands
pub mod issue;

/// Order workflow commands
pub mod order;

/// Quote and price list commands
pub mod pricing;

/// Trash commands
pub mod trash;

// Export commands
pub use admin::*;
pub use dashboard::*;
pub use general::*;
pub use issue::*;
pub use order::*;
pub use pricing::*;
pub use trash::*;
