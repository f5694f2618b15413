//! WordPress.org plugin directory client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::DEFAULT_REGISTRY_URL;
use crate::freshness::error::RegistryError;
use crate::freshness::registries::sanitize::sanitize_text_field;
use crate::freshness::registry::Registry;
use crate::freshness::types::Lookup;

const PLUGIN_INFORMATION_ACTION: &str = "plugin_information";

/// Plugin directory client
#[derive(Clone)]
pub struct WordPressRegistry {
    client: Client,
    base_url: String,
}

impl Default for WordPressRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_URL.to_string())
    }
}

impl WordPressRegistry {
    /// `base_url` is the full plugin information endpoint
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

/// Subset of the plugin information response
#[derive(Debug, Deserialize)]
struct PluginInformation {
    last_updated: Option<String>,
}

#[async_trait]
impl Registry for WordPressRegistry {
    async fn fetch_last_updated(&self, slug: &str) -> Result<Lookup, RegistryError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("action", PLUGIN_INFORMATION_ACTION),
                ("request[slug]", slug),
                ("request[fields][last_updated]", "1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RegistryError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        parse_plugin_information(&body)
    }
}

/// Interpret a successful response body.
///
/// An empty or undecodable body means the directory does not carry the plugin,
/// as does a `last_updated` that is blank once sanitized. A populated body must
/// contain `last_updated`.
fn parse_plugin_information(body: &str) -> Result<Lookup, RegistryError> {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return Ok(Lookup::NotFound);
    };

    if is_empty(&value) {
        return Ok(Lookup::NotFound);
    }

    let information: PluginInformation = serde_json::from_value(value)
        .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;

    match information.last_updated {
        Some(last_updated) => {
            let last_updated = sanitize_text_field(&last_updated);
            if last_updated.is_empty() {
                Ok(Lookup::NotFound)
            } else {
                Ok(Lookup::Found(last_updated))
            }
        }
        None => Err(RegistryError::InvalidResponse(
            "response has no last_updated field".to_string(),
        )),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}
