//! Supervisor bootstrap account from environment variables.
//!
//! On startup the bot makes sure one `supervisor` exists so somebody can grant
//! permissions to everyone else. The account is only created when both
//! `SUPERVISOR_USERNAME` and `SUPERVISOR_PASSWORD` are set.

/// Credentials of the bootstrap supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorSettings {
    /// Login name
    pub username: String,
    /// Plaintext password, hashed before it is stored
    pub password: String,
    /// Discord account to link, so the supervisor can use the bot right away
    pub discord_id: Option<String>,
}

/// Reads `SUPERVISOR_USERNAME`, `SUPERVISOR_PASSWORD` and the optional
/// `SUPERVISOR_DISCORD_ID`.
///
/// Returns `None` unless both username and password are configured.
#[must_use]
pub fn supervisor_settings() -> Option<SupervisorSettings> {
    let non_empty = |name: &str| std::env::var(name).ok().filter(|value| !value.trim().is_empty());

    match (non_empty("SUPERVISOR_USERNAME"), non_empty("SUPERVISOR_PASSWORD")) {
        (Some(username), Some(password)) => Some(SupervisorSettings {
            username: username.trim().to_string(),
            password,
            discord_id: non_empty("SUPERVISOR_DISCORD_ID").map(|id| id.trim().to_string()),
        }),
        _ => None,
    }
}
