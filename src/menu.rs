//! Menu and category screen operations.
//!
//! CRUD over menu items and categories, item image upload, and the
//! diner-facing public menu view (active items grouped by category). All
//! state lives on the backend; every mutation re-fetches.

use tracing::info;

use crate::api::ApiClient;
use crate::models::{categories_from_value, menu_items_from_value, Category, MenuItem};

/// Draft for creating or updating a menu item. `id == None` creates.
#[derive(Debug, Clone, Default)]
pub struct MenuItemInput {
    pub id: Option<String>,
    pub category_id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image_url: String,
    pub available: bool,
}

impl MenuItemInput {
    fn to_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("category_id", self.category_id.clone()),
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            ("price", format!("{:.2}", self.price)),
            ("image_url", self.image_url.clone()),
            ("available", if self.available { "1" } else { "0" }.to_string()),
        ];
        if let Some(id) = &self.id {
            fields.push(("item_id", id.clone()));
        }
        fields
    }
}

pub async fn get_menu_items(api: &ApiClient) -> Result<Vec<MenuItem>, String> {
    let data = api
        .post_action("rms_get_menu_items", &[])
        .await
        .map_err(|e| e.to_string())?;
    Ok(menu_items_from_value(&data))
}

/// Create or update a menu item, then re-fetch the list.
pub async fn save_menu_item(
    api: &ApiClient,
    input: &MenuItemInput,
) -> Result<Vec<MenuItem>, String> {
    if input.name.trim().is_empty() {
        return Err("Menu item name cannot be empty".into());
    }
    api.post_action("rms_save_menu_item", &input.to_fields())
        .await
        .map_err(|e| e.to_string())?;
    info!(name = %input.name, updating = input.id.is_some(), "menu item saved");
    get_menu_items(api).await
}

pub async fn delete_menu_item(api: &ApiClient, item_id: &str) -> Result<Vec<MenuItem>, String> {
    api.post_action("rms_delete_menu_item", &[("item_id", item_id.to_string())])
        .await
        .map_err(|e| e.to_string())?;
    info!(item_id, "menu item deleted");
    get_menu_items(api).await
}

pub async fn get_categories(api: &ApiClient) -> Result<Vec<Category>, String> {
    let data = api
        .post_action("rms_get_categories", &[])
        .await
        .map_err(|e| e.to_string())?;
    Ok(categories_from_value(&data))
}

/// Create or update a category (`category_id` empty creates), then
/// re-fetch.
pub async fn save_category(
    api: &ApiClient,
    category_id: Option<&str>,
    name: &str,
    sort_order: i64,
) -> Result<Vec<Category>, String> {
    if name.trim().is_empty() {
        return Err("Category name cannot be empty".into());
    }
    let mut fields = vec![
        ("name", name.trim().to_string()),
        ("sort_order", sort_order.to_string()),
    ];
    if let Some(id) = category_id {
        fields.push(("category_id", id.to_string()));
    }
    api.post_action("rms_save_category", &fields)
        .await
        .map_err(|e| e.to_string())?;
    get_categories(api).await
}

pub async fn delete_category(api: &ApiClient, category_id: &str) -> Result<Vec<Category>, String> {
    api.post_action(
        "rms_delete_category",
        &[("category_id", category_id.to_string())],
    )
    .await
    .map_err(|e| e.to_string())?;
    info!(category_id, "category deleted");
    get_categories(api).await
}

/// Upload an item image and return its stored URL for use in a
/// [`MenuItemInput`].
pub async fn upload_item_image(
    api: &ApiClient,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<String, String> {
    if bytes.is_empty() {
        return Err("Image file is empty".into());
    }
    api.upload_image(file_name, bytes)
        .await
        .map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Public menu view
// ---------------------------------------------------------------------------

/// One section of the diner-facing menu.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MenuSection {
    pub category: Category,
    pub items: Vec<MenuItem>,
}

/// Group active items under their categories, ordered by `sort_order`.
/// Categories with no available items are omitted; items pointing at an
/// unknown category are dropped.
pub fn group_public_menu(mut categories: Vec<Category>, items: Vec<MenuItem>) -> Vec<MenuSection> {
    categories.sort_by_key(|c| c.sort_order);
    categories
        .into_iter()
        .filter_map(|category| {
            let section_items: Vec<MenuItem> = items
                .iter()
                .filter(|i| i.available && i.category_id == category.id)
                .cloned()
                .collect();
            if section_items.is_empty() {
                None
            } else {
                Some(MenuSection {
                    category,
                    items: section_items,
                })
            }
        })
        .collect()
}

/// Fetch the diner-facing menu: the backend exposes it as a single
/// read-only action since the public widget has no nonce-bearing session.
pub async fn get_public_menu(api: &ApiClient) -> Result<Vec<MenuSection>, String> {
    let data = api
        .post_action("rms_get_public_menu", &[])
        .await
        .map_err(|e| e.to_string())?;
    let categories = categories_from_value(data.get("categories").unwrap_or(&serde_json::Value::Null));
    let items = menu_items_from_value(data.get("items").unwrap_or(&serde_json::Value::Null));
    Ok(group_public_menu(categories, items))
}
