//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions such as autocomplete.

/// Autocomplete handlers for order codes, production types, pricing keys and permissions
pub mod autocomplete;
