//! Menu catalog and the candidate pool derived from it
//!
//! The static catalog is loaded once from JSON. Admin specials are not part of
//! the catalog; they are prepended as their own category whenever a view of the
//! full menu is built, so a newly added special is immediately drawable.

use crate::domain::types::{ItemId, ItemTags, MenuItem};
use anyhow::Context;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Category id used for admin-entered items
pub const SPECIALS_CATEGORY_ID: &str = "specials";

/// Label of the specials category
pub const SPECIALS_CATEGORY_LABEL: &str = "Today's Special";

/// Description given to every admin-entered item without one
pub const DEFAULT_SPECIAL_DESCRIPTION: &str = "Today's Chef Special Recommendation";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuCategory {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

/// Static menu data
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    categories: Vec<MenuCategory>,
}

impl Catalog {
    /// Build a catalog, dropping items whose id was already seen
    pub fn new(mut categories: Vec<MenuCategory>) -> Self {
        let mut seen = FxHashSet::default();
        for category in &mut categories {
            category.items.retain(|item| {
                let fresh = seen.insert(item.id.clone());
                if !fresh {
                    warn!(item_id = %item.id, category = %category.id, "catalog_duplicate_id_dropped");
                }
                fresh
            });
        }
        Self { categories }
    }

    /// Parse a JSON array of categories
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let categories: Vec<MenuCategory> =
            serde_json::from_str(json).context("Failed to parse catalog JSON")?;
        Ok(Self::new(categories))
    }

    /// Load the catalog from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
        let catalog = Self::from_json(&content)
            .with_context(|| format!("Invalid catalog file {}", path.display()))?;
        info!(
            file = %path.display(),
            categories = %catalog.categories.len(),
            items = %catalog.item_count(),
            "catalog_loaded"
        );
        Ok(catalog)
    }

    /// Load the catalog, degrading to an empty menu on any error
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(error = %e, "catalog_load_failed_using_empty");
                Self::default()
            }
        }
    }

    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }

    /// Categories as the host renders them: specials first when there are any
    pub fn with_specials(&self, specials: &[MenuItem]) -> Vec<MenuCategory> {
        let mut out = Vec::with_capacity(self.categories.len() + 1);
        if !specials.is_empty() {
            out.push(MenuCategory {
                id: SPECIALS_CATEGORY_ID.to_string(),
                label: SPECIALS_CATEGORY_LABEL.to_string(),
                items: specials.to_vec(),
            });
        }
        out.extend(self.categories.iter().cloned());
        out
    }

    /// Flattened candidate pool across every category, specials included
    pub fn candidate_pool(&self, specials: &[MenuItem]) -> Vec<MenuItem> {
        specials
            .iter()
            .chain(self.categories.iter().flat_map(|c| c.items.iter()))
            .cloned()
            .collect()
    }

    /// Look an item up by id, checking specials first
    pub fn find<'a>(&'a self, id: &ItemId, specials: &'a [MenuItem]) -> Option<&'a MenuItem> {
        specials
            .iter()
            .chain(self.categories.iter().flat_map(|c| c.items.iter()))
            .find(|item| &item.id == id)
    }

    /// True if any static item uses this id
    pub fn contains(&self, id: &ItemId) -> bool {
        self.categories.iter().flat_map(|c| c.items.iter()).any(|item| &item.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("item name is required")]
    MissingName,
    #[error("item image is required")]
    MissingImage,
}

/// Admin form input for a special
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub name: String,
    pub price: u32,
    pub image: String,
    #[serde(default)]
    pub hindi_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_spicy: bool,
    #[serde(default)]
    pub ingredients: Vec<String>,
}

impl ItemDraft {
    pub fn new(name: &str, price: u32, image: &str) -> Self {
        Self { name: name.to_string(), price, image: image.to_string(), ..Default::default() }
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        if self.name.trim().is_empty() {
            return Err(DraftError::MissingName);
        }
        if self.image.trim().is_empty() {
            return Err(DraftError::MissingImage);
        }
        Ok(())
    }

    pub(crate) fn into_item(self, id: ItemId) -> MenuItem {
        MenuItem {
            id,
            name: self.name.trim().to_string(),
            hindi_name: self.hindi_name,
            description: self
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SPECIAL_DESCRIPTION.to_string()),
            price: self.price,
            image: self.image,
            tags: ItemTags { is_veg: true, is_spicy: self.is_spicy, is_popular: true },
            ingredients: self.ingredients,
            is_custom: true,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::domain::types::ItemTags;

    pub fn item(id: &str, price: u32) -> MenuItem {
        MenuItem {
            id: ItemId::from(id),
            name: format!("Item {id}"),
            hindi_name: None,
            description: String::new(),
            price,
            image: format!("{id}.jpg"),
            tags: ItemTags { is_veg: true, ..Default::default() },
            ingredients: Vec::new(),
            is_custom: false,
        }
    }

    pub fn catalog(items: &[(&str, u32)]) -> Catalog {
        Catalog::new(vec![MenuCategory {
            id: "parathas".to_string(),
            label: "Parathas".to_string(),
            items: items.iter().map(|(id, price)| item(id, *price)).collect(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{catalog, item};
    use super::*;

    #[test]
    fn test_pool_includes_specials_first() {
        let catalog = catalog(&[("a", 50), ("b", 80)]);
        let mut special = item("custom-1", 250);
        special.is_custom = true;

        let pool = catalog.candidate_pool(std::slice::from_ref(&special));
        let ids: Vec<&str> = pool.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["custom-1", "a", "b"]);
    }

    #[test]
    fn test_specials_category_only_when_non_empty() {
        let catalog = catalog(&[("a", 50)]);
        assert_eq!(catalog.with_specials(&[]).len(), 1);

        let categories = catalog.with_specials(&[item("custom-1", 10)]);
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].id, SPECIALS_CATEGORY_ID);
        assert_eq!(categories[0].label, "Today's Special");
    }

    #[test]
    fn test_duplicate_ids_dropped() {
        let catalog = catalog(&[("a", 50), ("a", 60), ("b", 80)]);
        assert_eq!(catalog.item_count(), 2);
        assert_eq!(catalog.find(&ItemId::from("a"), &[]).unwrap().price, 50);
    }

    #[test]
    fn test_from_json() {
        let json = r#"[{"id":"rice","label":"Rice","items":[{"id":"r1","name":"Jeera Rice","price":90,"isVeg":true}]}]"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.item_count(), 1);
        assert!(catalog.contains(&ItemId::from("r1")));
        assert!(Catalog::from_json("not json").is_err());
    }

    #[test]
    fn test_load_from_missing_path_is_empty() {
        let catalog = Catalog::load_from_path("/nonexistent/catalog.json");
        assert_eq!(catalog.item_count(), 0);
    }
}
