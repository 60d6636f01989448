//! Translation lookup for admin and public menu strings.
//!
//! Explicit two-level fallback chain: the current language's table, then
//! the default language's table, then the raw key itself. The backend
//! stores translations as flat key/value maps per language.

use std::collections::HashMap;

use serde_json::Value;
use tracing::info;

use crate::api::ApiClient;

pub struct Translations {
    language: String,
    default_language: String,
    current: HashMap<String, String>,
    fallback: HashMap<String, String>,
}

impl Translations {
    pub fn new(
        language: &str,
        default_language: &str,
        current: HashMap<String, String>,
        fallback: HashMap<String, String>,
    ) -> Self {
        Self {
            language: language.to_string(),
            default_language: default_language.to_string(),
            current,
            fallback,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Resolve a key through the chain; the raw key is the terminal
    /// fallback so missing translations stay visible instead of blank.
    pub fn lookup<'a>(&'a self, key: &'a str) -> &'a str {
        self.current
            .get(key)
            .or_else(|| self.fallback.get(key))
            .map(String::as_str)
            .unwrap_or(key)
    }
}

fn map_from_value(data: &Value) -> HashMap<String, String> {
    match data.as_object() {
        Some(obj) => obj
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect(),
        None => HashMap::new(),
    }
}

async fn fetch_language_map(
    api: &ApiClient,
    language: &str,
) -> Result<HashMap<String, String>, String> {
    let data = api
        .post_action(
            "rms_get_translations",
            &[("language", language.to_string())],
        )
        .await
        .map_err(|e| e.to_string())?;
    Ok(map_from_value(&data))
}

/// Fetch the tables for the current and default languages. When both are
/// the same language only one fetch is issued.
pub async fn fetch(
    api: &ApiClient,
    language: &str,
    default_language: &str,
) -> Result<Translations, String> {
    let current = fetch_language_map(api, language).await?;
    let fallback = if language == default_language {
        current.clone()
    } else {
        fetch_language_map(api, default_language).await?
    };
    Ok(Translations::new(
        language,
        default_language,
        current,
        fallback,
    ))
}

/// Store one translation, then re-fetch both tables.
pub async fn save_translation(
    api: &ApiClient,
    language: &str,
    default_language: &str,
    key: &str,
    value: &str,
) -> Result<Translations, String> {
    if key.trim().is_empty() {
        return Err("Translation key cannot be empty".into());
    }
    api.post_action(
        "rms_save_translation",
        &[
            ("language", language.to_string()),
            ("key", key.trim().to_string()),
            ("value", value.to_string()),
        ],
    )
    .await
    .map_err(|e| e.to_string())?;
    info!(language, key = %key.trim(), "translation saved");
    fetch(api, language, default_language).await
}
