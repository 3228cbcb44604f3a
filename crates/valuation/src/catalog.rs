//! Catalog reference data: base items and modifications.

use serde::{Deserialize, Serialize};

use hoard_core::numeric::lenient_decimal;
use hoard_core::{CatalogItemId, ModificationId};

/// Item category. Only weapons and armor take part in size and enhancement
/// pricing; every other category string is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Weapon,
    Armor,
    Other(String),
}

impl Category {
    pub fn is_weapon_or_armor(&self) -> bool {
        matches!(self, Category::Weapon | Category::Armor)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::Weapon => "weapon",
            Category::Armor => "armor",
            Category::Other(s) => s,
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        match value {
            "weapon" => Category::Weapon,
            "armor" => Category::Armor,
            other => Category::Other(other.to_string()),
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.as_str() {
            "weapon" => Category::Weapon,
            "armor" => Category::Armor,
            _ => Category::Other(value),
        }
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical priced item definition (immutable reference data).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: CatalogItemId,
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub base_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub base_weight: Option<f64>,
}

impl CatalogItem {
    pub fn new(name: impl Into<String>, category: impl Into<Category>) -> Self {
        Self {
            id: CatalogItemId::new(),
            name: name.into(),
            category: category.into(),
            subtype: None,
            base_value: None,
            base_weight: None,
        }
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    pub fn with_base_value(mut self, value: f64) -> Self {
        self.base_value = Some(value);
        self
    }

    pub fn with_base_weight(mut self, weight: f64) -> Self {
        self.base_weight = Some(weight);
        self
    }
}

/// A named pricing/enhancement rule attachable to a loot instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modification {
    pub id: ModificationId,
    pub name: String,
    /// Flat enhancement level. Fractional levels are legal input.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub plus: Option<f64>,
    /// Operator-prefixed arithmetic continuation, e.g. `+item.wgt*5`.
    #[serde(default)]
    pub value_transform: Option<String>,
    /// Used by upstream matching only.
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub subtarget: Option<String>,
}

impl Modification {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ModificationId::new(),
            name: name.into(),
            plus: None,
            value_transform: None,
            target: None,
            subtarget: None,
        }
    }

    pub fn with_plus(mut self, plus: f64) -> Self {
        self.plus = Some(plus);
        self
    }

    pub fn with_transform(mut self, transform: impl Into<String>) -> Self {
        self.value_transform = Some(transform.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_strings_map_to_variants() {
        assert_eq!(Category::from("weapon"), Category::Weapon);
        assert_eq!(Category::from("armor"), Category::Armor);
        assert_eq!(Category::from("ring"), Category::Other("ring".to_string()));
        assert!(!Category::from("Weapon").is_weapon_or_armor());
    }

    #[test]
    fn modification_accepts_string_plus() {
        let id = ModificationId::new();
        let json = format!(r#"{{"id":"{id}","name":"Keen","plus":"2"}}"#);
        let m: Modification = serde_json::from_str(&json).unwrap();
        assert_eq!(m.plus, Some(2.0));
        assert_eq!(m.value_transform, None);
    }

    #[test]
    fn modification_with_invalid_plus_has_no_plus() {
        let id = ModificationId::new();
        let json = format!(r#"{{"id":"{id}","name":"Odd","plus":"invalid"}}"#);
        let m: Modification = serde_json::from_str(&json).unwrap();
        assert_eq!(m.plus, None);
    }

    #[test]
    fn catalog_item_serializes_category_as_plain_string() {
        let item = CatalogItem::new("Arrow", "weapon")
            .with_subtype("ammunition")
            .with_base_value(1.0);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["category"], "weapon");
        assert_eq!(json["subtype"], "ammunition");
    }
}
