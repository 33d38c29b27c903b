//! Core business logic - framework-agnostic order, user, pricing and reporting
//! operations. The bot layer only parses input and formats output; every rule
//! lives here.

/// Order sub-documents and their pure transformations
pub mod document;
/// Order status resolution from the production document
pub mod status;
/// Per-user permission matrix and its evaluation
pub mod permissions;
/// Named counters and monthly production codes
pub mod sequence;
/// In-app notification feed
pub mod notification;
/// Argon2 password hashing
pub mod password;
/// User accounts and permission management
pub mod user;
/// Production types and their step templates
pub mod production_type;
/// Order lifecycle service
pub mod order;
/// Price list and quote calculator
pub mod pricing;
/// Status summaries, deadline watch and order formatting
pub mod report;
