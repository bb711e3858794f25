//! Configuration and process setup helpers.

/// Log subscriber setup (console + file).
pub mod logging;
/// TOML configuration (`docqa.toml`).
pub mod toml_config;
