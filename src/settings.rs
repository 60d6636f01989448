//! Settings and QR-code screen operations.
//!
//! Restaurant-wide settings live on the backend as a flat record; the QR
//! screen lists per-table public-menu links whose images the backend
//! renders (image generation is a platform concern, not ours).

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::api::ApiClient;
use crate::{value_i64, value_str};

#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub restaurant_name: String,
    pub currency: String,
    /// BCP-47-ish language tag the admin UI renders in.
    pub language: String,
    /// Fallback language for translation lookups.
    pub default_language: String,
    pub table_count: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            restaurant_name: String::new(),
            currency: "EUR".to_string(),
            language: "en".to_string(),
            default_language: "en".to_string(),
            table_count: 0,
        }
    }
}

impl Settings {
    pub fn from_value(v: &Value) -> Settings {
        let defaults = Settings::default();
        Settings {
            restaurant_name: value_str(v, &["restaurant_name", "name"]).unwrap_or_default(),
            currency: value_str(v, &["currency"]).unwrap_or(defaults.currency),
            language: value_str(v, &["language"]).unwrap_or(defaults.language),
            default_language: value_str(v, &["default_language"])
                .unwrap_or(defaults.default_language),
            table_count: value_i64(v, &["table_count", "tables"])
                .unwrap_or(0)
                .max(0) as u32,
        }
    }

    fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("restaurant_name", self.restaurant_name.clone()),
            ("currency", self.currency.clone()),
            ("language", self.language.clone()),
            ("default_language", self.default_language.clone()),
            ("table_count", self.table_count.to_string()),
        ]
    }
}

pub async fn get_settings(api: &ApiClient) -> Result<Settings, String> {
    let data = api
        .post_action("rms_get_settings", &[])
        .await
        .map_err(|e| e.to_string())?;
    Ok(Settings::from_value(&data))
}

/// Save settings, then re-fetch so the screen shows whatever the backend
/// actually stored.
pub async fn save_settings(api: &ApiClient, settings: &Settings) -> Result<Settings, String> {
    api.post_action("rms_save_settings", &settings.to_fields())
        .await
        .map_err(|e| e.to_string())?;
    info!(restaurant = %settings.restaurant_name, "settings saved");
    get_settings(api).await
}

// ---------------------------------------------------------------------------
// QR codes
// ---------------------------------------------------------------------------

/// One table's QR entry: the public-menu link encoded in the code plus the
/// backend-rendered image URL.
#[derive(Debug, Clone, Serialize)]
pub struct TableQr {
    pub table_number: u32,
    pub menu_url: String,
    pub image_url: String,
}

/// Build the per-table public-menu URL the QR code encodes.
pub fn table_menu_url(public_base: &str, table_number: u32) -> String {
    let base = public_base.trim_end_matches('/');
    format!("{base}/menu?table={table_number}")
}

/// Fetch the backend-rendered QR image list. Entries are matched up with
/// locally built menu URLs so the screen can show both.
pub async fn get_qr_codes(api: &ApiClient, public_base: &str) -> Result<Vec<TableQr>, String> {
    let data = api
        .post_action("rms_get_qr_codes", &[])
        .await
        .map_err(|e| e.to_string())?;

    let entries = match data.as_array() {
        Some(arr) => arr,
        None => return Ok(Vec::new()),
    };
    Ok(entries
        .iter()
        .filter_map(|entry| {
            let table_number = value_i64(entry, &["table_number", "table"])?.max(0) as u32;
            Some(TableQr {
                table_number,
                menu_url: table_menu_url(public_base, table_number),
                image_url: value_str(entry, &["image_url", "qr_url"]).unwrap_or_default(),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_settings_from_value_with_defaults() {
        let settings = Settings::from_value(&json!({
            "restaurant_name": "Ouzeri",
            "table_count": "12"
        }));
        assert_eq!(settings.restaurant_name, "Ouzeri");
        assert_eq!(settings.table_count, 12);
        assert_eq!(settings.currency, "EUR");
        assert_eq!(settings.language, "en");
    }

    #[test]
    fn test_settings_negative_table_count_clamps() {
        let settings = Settings::from_value(&json!({ "table_count": -3 }));
        assert_eq!(settings.table_count, 0);
    }

    #[test]
    fn test_table_menu_url() {
        assert_eq!(
            table_menu_url("https://ouzeri.example/", 4),
            "https://ouzeri.example/menu?table=4"
        );
        assert_eq!(
            table_menu_url("https://ouzeri.example", 11),
            "https://ouzeri.example/menu?table=11"
        );
    }
}
