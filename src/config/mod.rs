/// Database configuration and connection management
pub mod database;

/// Production type, pricing and order settings loaded from config.toml
pub mod catalog;

/// Supervisor bootstrap account from environment variables
pub mod users;
