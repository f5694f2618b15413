//! Registry trait for fetching last-updated dates

#[cfg(test)]
use mockall::automock;

use crate::freshness::error::RegistryError;
use crate::freshness::types::Lookup;

/// Trait for fetching plugin metadata from a registry
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Fetches the last-updated value for a plugin
    ///
    /// # Arguments
    /// * `slug` - The registry identifier of the plugin (e.g., "akismet")
    ///
    /// # Returns
    /// * `Ok(Lookup::Found)` - Sanitized last-updated value
    /// * `Ok(Lookup::NotFound)` - The registry has no record of the plugin
    /// * `Err(RegistryError)` - The request failed or the answer was unusable
    async fn fetch_last_updated(&self, slug: &str) -> Result<Lookup, RegistryError>;
}
