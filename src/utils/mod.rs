/// TOML configuration loading and environment overrides.
pub mod toml_config;
