//! Lookup outcome types

use serde::Serialize;

/// A terminal answer from the registry.
///
/// Only these outcomes are ever cached; a failed lookup has no representation
/// here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Raw last-updated value as returned by the registry, already sanitized
    Found(String),
    /// The registry has no record of the plugin
    NotFound,
}

/// Outcome of a cache-through lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    Found(String),
    NotFound,
    /// The registry could not be reached or answered unexpectedly
    Failed,
}

impl LookupResult {
    pub fn status(&self) -> LookupStatus {
        match self {
            LookupResult::Found(_) => LookupStatus::Found,
            LookupResult::NotFound => LookupStatus::NotFound,
            LookupResult::Failed => LookupStatus::Failed,
        }
    }
}

impl From<Lookup> for LookupResult {
    fn from(lookup: Lookup) -> Self {
        match lookup {
            Lookup::Found(timestamp) => LookupResult::Found(timestamp),
            Lookup::NotFound => LookupResult::NotFound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    Found,
    NotFound,
    Failed,
}
