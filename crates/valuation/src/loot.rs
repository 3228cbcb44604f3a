//! Tracked loot instances.

use serde::{Deserialize, Serialize};

use hoard_core::numeric::{lenient_decimal, lenient_integer};
use hoard_core::{CatalogItemId, LootId, ModificationId};

use crate::catalog::{CatalogItem, Modification};
use crate::engine::{Valuation, ValuationInput, valuate};

/// A concrete piece of treasure the party is tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootInstance {
    pub id: LootId,
    /// Free text, editable independently of the catalog name.
    pub name: String,
    pub quantity: u32,
    /// Absent for manually entered items.
    #[serde(default)]
    pub catalog_item_id: Option<CatalogItemId>,
    /// Applied modifications, in application order.
    #[serde(default)]
    pub modification_ids: Vec<ModificationId>,
    #[serde(default)]
    pub masterwork: bool,
    /// Only meaningful for "wand of ..." items.
    #[serde(default, deserialize_with = "lenient_integer")]
    pub charges: Option<i64>,
    #[serde(default)]
    pub size: Option<String>,
    /// Overrides the catalog base weight when set.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub weight: Option<f64>,
    /// Objective value; `None` until computed.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub value: Option<f64>,
}

impl LootInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: LootId::new(),
            name: name.into(),
            quantity: 1,
            catalog_item_id: None,
            modification_ids: Vec::new(),
            masterwork: false,
            charges: None,
            size: None,
            weight: None,
            value: None,
        }
    }

    /// Build an instance of a catalog item with the given modifications applied.
    pub fn of(item: &CatalogItem, modifications: &[Modification]) -> Self {
        let mut loot = Self::new(item.name.clone());
        loot.catalog_item_id = Some(item.id);
        loot.modification_ids = modifications.iter().map(|m| m.id).collect();
        loot
    }

    pub fn with_masterwork(mut self, masterwork: bool) -> Self {
        self.masterwork = masterwork;
        self
    }

    pub fn with_charges(mut self, charges: i64) -> Self {
        self.charges = Some(charges);
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Assemble the valuation input from this instance and its resolved records.
    ///
    /// `catalog` is `None` for manual entries; the instance name always
    /// drives the wand rule.
    pub fn valuation_input<'a>(
        &'a self,
        catalog: Option<&'a CatalogItem>,
        modifications: &'a [Modification],
    ) -> ValuationInput<'a> {
        ValuationInput {
            base_value: catalog.and_then(|c| c.base_value),
            category: catalog.map(|c| &c.category),
            subtype: catalog.and_then(|c| c.subtype.as_deref()),
            modifications,
            masterwork: self.masterwork,
            item_name: Some(self.name.as_str()),
            charges: self.charges,
            size: self.size.as_deref(),
            weight: self.weight.or_else(|| catalog.and_then(|c| c.base_weight)),
        }
    }

    /// Compute and store the objective value.
    pub fn revaluate(
        &mut self,
        catalog: Option<&CatalogItem>,
        modifications: &[Modification],
    ) -> Valuation {
        let valuation = valuate(&self.valuation_input(catalog, modifications));
        self.value = Some(valuation.value);
        valuation
    }

    pub fn comparison_key(&self) -> ComparisonKey {
        ComparisonKey {
            catalog_item_id: self.catalog_item_id,
            modification_ids: self.modification_ids.clone(),
            masterwork: self.masterwork,
            charges: self.charges,
            true_value: self.value,
        }
    }
}

/// What makes two loot instances "look identical" to an appraiser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonKey {
    pub catalog_item_id: Option<CatalogItemId>,
    /// Order-sensitive.
    pub modification_ids: Vec<ModificationId>,
    pub masterwork: bool,
    pub charges: Option<i64>,
    pub true_value: Option<f64>,
}

impl ComparisonKey {
    /// Structural match with true values within `epsilon` (exclusive).
    ///
    /// Two instances without a true value never match.
    pub fn matches(&self, other: &ComparisonKey, epsilon: f64) -> bool {
        let values_close = match (self.true_value, other.true_value) {
            (Some(a), Some(b)) => (a - b).abs() < epsilon,
            _ => false,
        };
        values_close
            && self.catalog_item_id == other.catalog_item_id
            && self.modification_ids == other.modification_ids
            && self.masterwork == other.masterwork
            && self.charges == other.charges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_valuation_uses_catalog_fields() {
        let sword = CatalogItem::new("Longsword", "weapon")
            .with_base_value(15.0)
            .with_base_weight(4.0);
        let mods = [Modification::new("+1").with_plus(1.0)];
        let mut loot = LootInstance::of(&sword, &mods).with_size("Large");

        let v = loot.revaluate(Some(&sword), &mods);
        assert_eq!(v.value, 30.0 + 300.0 + 2000.0);
        assert_eq!(loot.value, Some(2330.0));
    }

    #[test]
    fn manual_wand_uses_instance_name() {
        let mut loot = LootInstance::new("Wand of Cure Light Wounds").with_charges(10);
        let v = loot.revaluate(None, &[]);
        // no catalog: base 0, so charges multiply nothing
        assert_eq!(v.value, 0.0);
    }

    #[test]
    fn instance_weight_overrides_catalog_weight() {
        let hammer = CatalogItem::new("Warhammer", "weapon")
            .with_base_value(12.0)
            .with_base_weight(5.0);
        let mods = [Modification::new("Weighted").with_transform("+item.wgt")];
        let mut loot = LootInstance::of(&hammer, &mods);
        assert_eq!(loot.revaluate(Some(&hammer), &mods).value, 17.0);

        loot.weight = Some(2.0);
        assert_eq!(loot.revaluate(Some(&hammer), &mods).value, 14.0);
    }

    #[test]
    fn comparison_key_is_order_sensitive_and_epsilon_bounded() {
        let a = ModificationId::new();
        let b = ModificationId::new();
        let item = CatalogItemId::new();
        let key = ComparisonKey {
            catalog_item_id: Some(item),
            modification_ids: vec![a, b],
            masterwork: false,
            charges: None,
            true_value: Some(100.0),
        };

        let mut close = key.clone();
        close.true_value = Some(100.005);
        assert!(key.matches(&close, 0.01));

        let mut far = key.clone();
        far.true_value = Some(100.01);
        assert!(!key.matches(&far, 0.01));

        let mut reordered = key.clone();
        reordered.modification_ids = vec![b, a];
        assert!(!key.matches(&reordered, 0.01));

        let mut unvalued = key.clone();
        unvalued.true_value = None;
        assert!(!unvalued.matches(&unvalued.clone(), 0.01));
    }

    #[test]
    fn loot_deserializes_lenient_numbers() {
        let id = LootId::new();
        let json = format!(
            r#"{{"id":"{id}","name":"Wand of Light","quantity":1,"charges":"25","value":"112.5"}}"#
        );
        let loot: LootInstance = serde_json::from_str(&json).unwrap();
        assert_eq!(loot.charges, Some(25));
        assert_eq!(loot.value, Some(112.5));
        assert!(loot.modification_ids.is_empty());
    }
}
