//! Installed plugin descriptions
//!
//! - [`types`]: `PluginInfo` and slug extraction
//! - [`manifest`]: loading a plugin list from JSON or command-line arguments

pub mod manifest;
pub mod types;
