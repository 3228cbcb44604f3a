//! Objective value of a loot instance.
//!
//! Pipeline, in order:
//! 1. base value (absent → 0)
//! 2. size multiplier (weapons and armor only)
//! 3. wand charge multiplier
//! 4. modification transforms in list order, summing "plus" levels
//! 5. masterwork surcharge (once, if flagged or plus ≥ 1)
//! 6. enhancement table value for integral plus 1..=10 (÷50 for ammunition)

use serde::Serialize;
use thiserror::Error;

use hoard_core::ModificationId;

use crate::catalog::{Category, Modification};
use crate::expr::{ExprError, Transform};
use crate::size::Size;

const WEAPON_MASTERWORK: f64 = 300.0;
const ARMOR_MASTERWORK: f64 = 150.0;

const WEAPON_ENHANCEMENT: [f64; 10] = [
    2000.0, 8000.0, 18000.0, 32000.0, 50000.0, 72000.0, 98000.0, 128000.0, 162000.0, 200000.0,
];
const ARMOR_ENHANCEMENT: [f64; 10] = [
    1000.0, 4000.0, 9000.0, 16000.0, 25000.0, 36000.0, 49000.0, 64000.0, 81000.0, 100000.0,
];

const AMMUNITION_DIVISOR: f64 = 50.0;
const AMMUNITION_SUBTYPE: &str = "ammunition";
const WAND_PREFIX: &str = "wand of";

/// Everything the valuation needs, already resolved by the caller.
#[derive(Debug, Clone, Default)]
pub struct ValuationInput<'a> {
    pub base_value: Option<f64>,
    pub category: Option<&'a Category>,
    pub subtype: Option<&'a str>,
    pub modifications: &'a [Modification],
    pub masterwork: bool,
    pub item_name: Option<&'a str>,
    pub charges: Option<i64>,
    pub size: Option<&'a str>,
    pub weight: Option<f64>,
}

/// A modification whose transform could not be applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModWarning {
    pub modification_id: ModificationId,
    pub modification_name: String,
    pub transform: String,
    pub reason: String,
}

/// Detailed valuation result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Valuation {
    pub value: f64,
    pub warnings: Vec<ModWarning>,
    /// Set when the pipeline failed and `value` is the coerced base value.
    pub fell_back: bool,
}

#[derive(Debug, Error)]
enum ValuationError {
    #[error("running value became non-finite after {stage}")]
    NonFinite { stage: &'static str },
}

fn ensure_finite(v: f64, stage: &'static str) -> Result<f64, ValuationError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ValuationError::NonFinite { stage })
    }
}

fn is_wand(name: Option<&str>) -> bool {
    name.and_then(|n| n.get(..WAND_PREFIX.len()))
        .is_some_and(|p| p.eq_ignore_ascii_case(WAND_PREFIX))
}

/// Additional value for an accumulated enhancement level.
///
/// Only exact integers 1..=10 match the tables; anything else yields 0.
pub fn enhancement_value(category: &Category, total_plus: f64) -> f64 {
    let table = match category {
        Category::Weapon => &WEAPON_ENHANCEMENT,
        Category::Armor => &ARMOR_ENHANCEMENT,
        Category::Other(_) => return 0.0,
    };
    if total_plus.fract() != 0.0 || !(1.0..=10.0).contains(&total_plus) {
        return 0.0;
    }
    table[total_plus as usize - 1]
}

/// Flat masterwork surcharge for a category.
pub fn masterwork_surcharge(category: &Category) -> f64 {
    match category {
        Category::Weapon => WEAPON_MASTERWORK,
        Category::Armor => ARMOR_MASTERWORK,
        Category::Other(_) => 0.0,
    }
}

fn try_valuate(input: &ValuationInput<'_>) -> Result<Valuation, ValuationError> {
    let mut running = input.base_value.unwrap_or(0.0);
    let size = Size::resolve(input.size);
    let category = input.category;
    let priced_by_size = category.is_some_and(Category::is_weapon_or_armor);

    if priced_by_size {
        running *= size.value_multiplier();
    }

    let effective_weight = input.weight.unwrap_or(1.0) * size.weight_multiplier();

    if is_wand(input.item_name) {
        if let Some(charges) = input.charges.filter(|c| *c != 0) {
            running *= charges as f64;
        }
    }
    running = ensure_finite(running, "size and charges")?;

    let mut total_plus = 0.0;
    let mut warnings = Vec::new();
    for m in input.modifications {
        if let Some(source) = m.value_transform.as_deref().filter(|s| !s.trim().is_empty()) {
            match Transform::parse(source).and_then(|t| t.apply(running, effective_weight)) {
                Ok(v) => running = v,
                Err(err) => {
                    tracing::warn!(
                        modification_id = %m.id,
                        modification = %m.name,
                        transform = source,
                        error = %err,
                        "skipping modification transform"
                    );
                    warnings.push(warning(m, source, &err));
                }
            }
        }
        if let Some(plus) = m.plus {
            total_plus += plus;
        }
    }

    let mut additional = 0.0;
    if let Some(category) = category {
        if input.masterwork || total_plus >= 1.0 {
            running += masterwork_surcharge(category);
        }
        additional = enhancement_value(category, total_plus);
    }
    if input.subtype == Some(AMMUNITION_SUBTYPE) {
        additional /= AMMUNITION_DIVISOR;
    }

    let value = ensure_finite(running + additional, "enhancement")?;
    tracing::debug!(value, total_plus, size = %size, "valuated item");

    Ok(Valuation {
        value,
        warnings,
        fell_back: false,
    })
}

fn warning(m: &Modification, source: &str, err: &ExprError) -> ModWarning {
    ModWarning {
        modification_id: m.id,
        modification_name: m.name.clone(),
        transform: source.to_string(),
        reason: err.to_string(),
    }
}

/// Price an item, reporting skipped transforms.
///
/// Never fails: if the pipeline breaks down the coerced base value (or 0) is
/// returned with `fell_back` set.
pub fn valuate(input: &ValuationInput<'_>) -> Valuation {
    match try_valuate(input) {
        Ok(v) => v,
        Err(err) => {
            let base = input.base_value.unwrap_or(0.0);
            tracing::warn!(error = %err, base, "valuation failed; falling back to base value");
            Valuation {
                value: base,
                warnings: Vec::new(),
                fell_back: true,
            }
        }
    }
}

/// Price an item.
pub fn value(input: &ValuationInput<'_>) -> f64 {
    valuate(input).value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weapon() -> Category {
        Category::Weapon
    }

    fn input<'a>(category: &'a Category, base: f64, mods: &'a [Modification]) -> ValuationInput<'a> {
        ValuationInput {
            base_value: Some(base),
            category: Some(category),
            modifications: mods,
            ..Default::default()
        }
    }

    #[test]
    fn base_value_passes_through_for_plain_items() {
        let misc = Category::from("misc");
        assert_eq!(value(&input(&misc, 100.0, &[])), 100.0);
        assert_eq!(value(&input(&misc, 99.95, &[])), 99.95);
        assert_eq!(value(&input(&misc, -100.0, &[])), -100.0);
    }

    #[test]
    fn missing_base_value_is_zero() {
        let misc = Category::from("misc");
        let mut i = input(&misc, 0.0, &[]);
        i.base_value = None;
        assert_eq!(value(&i), 0.0);
    }

    #[test]
    fn size_scales_weapons_and_armor_only() {
        let w = weapon();
        let a = Category::Armor;
        let ring = Category::from("ring");
        for (size, factor) in [
            ("Fine", 0.5),
            ("Small", 1.0),
            ("Medium", 1.0),
            ("Large", 2.0),
            ("Huge", 4.0),
            ("Gargantuan", 8.0),
            ("Colossal", 16.0),
        ] {
            let mut i = input(&w, 100.0, &[]);
            i.size = Some(size);
            assert_eq!(value(&i), 100.0 * factor, "weapon at {size}");

            let mut i = input(&a, 200.0, &[]);
            i.size = Some(size);
            assert_eq!(value(&i), 200.0 * factor, "armor at {size}");

            let mut i = input(&ring, 100.0, &[]);
            i.size = Some(size);
            assert_eq!(value(&i), 100.0, "ring at {size}");
        }
    }

    #[test]
    fn large_weapon_plus_one() {
        let w = weapon();
        let mods = [Modification::new("+1").with_plus(1.0)];
        let mut i = input(&w, 100.0, &mods);
        i.size = Some("Large");
        // 100*2 = 200, +300 masterwork, +2000 enhancement
        assert_eq!(value(&i), 2500.0);
    }

    #[test]
    fn ammunition_divides_only_the_enhancement() {
        let w = weapon();
        let mods = [Modification::new("+1").with_plus(1.0)];
        let mut i = input(&w, 50.0, &mods);
        i.subtype = Some("ammunition");
        // 50 + 300 + 2000/50
        assert_eq!(value(&i), 390.0);

        let mods = [
            Modification::new("Silver").with_transform("+item.wgt*0.1"),
            Modification::new("+2").with_plus(2.0),
        ];
        let mut i = input(&w, 5.0, &mods);
        i.subtype = Some("ammunition");
        // 5 + 0.1 + 300 + 8000/50
        assert!((value(&i) - 465.1).abs() < 1e-9);
    }

    #[test]
    fn plus_levels_accumulate_and_masterwork_applies_once() {
        let w = weapon();
        let mods = [
            Modification::new("+2").with_plus(2.0),
            Modification::new("+1").with_plus(1.0),
        ];
        let mut i = input(&w, 100.0, &mods);
        i.masterwork = true;
        assert_eq!(value(&i), 100.0 + 300.0 + 18000.0);
    }

    #[test]
    fn fractional_plus_triggers_masterwork_but_no_table_value() {
        let w = weapon();
        let mods = [Modification::new("odd").with_plus(1.5)];
        assert_eq!(value(&input(&w, 100.0, &mods)), 400.0);
    }

    #[test]
    fn plus_beyond_table_adds_nothing() {
        let a = Category::Armor;
        let mods = [Modification::new("+11").with_plus(11.0)];
        assert_eq!(value(&input(&a, 100.0, &mods)), 250.0);
    }

    #[test]
    fn masterwork_flag_ignored_outside_weapons_and_armor() {
        let misc = Category::from("misc");
        let mut i = input(&misc, 100.0, &[]);
        i.masterwork = true;
        assert_eq!(value(&i), 100.0);

        let a = Category::Armor;
        let mut i = input(&a, 100.0, &[]);
        i.masterwork = true;
        assert_eq!(value(&i), 250.0);
    }

    #[test]
    fn wand_charges_multiply_only_for_wands() {
        let misc = Category::from("wand");
        let mut i = input(&misc, 15.0, &[]);
        i.item_name = Some("Wand of Magic Missile");
        i.charges = Some(50);
        assert_eq!(value(&i), 750.0);

        i.item_name = Some("Staff of Fire");
        assert_eq!(value(&i), 15.0);

        i.item_name = Some("WAND OF light");
        i.charges = Some(0);
        assert_eq!(value(&i), 15.0);

        i.item_name = Some("  wand of light");
        i.charges = Some(50);
        assert_eq!(value(&i), 15.0);
    }

    #[test]
    fn oversized_transform_is_a_warning_not_a_crash() {
        let w = weapon();
        let mods = [
            Modification::new("Endless").with_transform("+1".repeat(100_000)),
            Modification::new("Flat").with_transform("+25"),
        ];
        let v = valuate(&input(&w, 100.0, &mods));
        assert!(!v.fell_back);
        assert_eq!(v.value, 125.0);
        assert_eq!(v.warnings.len(), 1);
        assert_eq!(v.warnings[0].modification_name, "Endless");
    }

    #[test]
    fn transforms_apply_in_order_with_effective_weight() {
        let w = weapon();
        let mods = [
            Modification::new("Double").with_transform("*2"),
            Modification::new("Heavy").with_transform("+item.wgt*5"),
        ];
        let mut i = input(&w, 100.0, &mods);
        i.size = Some("Huge");
        i.weight = Some(4.0);
        // 100*4 = 400, *2 = 800, + (4*5)*5 = 900
        assert_eq!(value(&i), 900.0);
    }

    #[test]
    fn broken_transform_is_skipped_with_warning() {
        let w = weapon();
        let mods = [
            Modification::new("Broken").with_transform("+undefined_variable"),
            Modification::new("Flat").with_transform("+50"),
        ];
        let v = valuate(&input(&w, 100.0, &mods));
        assert_eq!(v.value, 150.0);
        assert!(!v.fell_back);
        assert_eq!(v.warnings.len(), 1);
        assert_eq!(v.warnings[0].modification_name, "Broken");
    }

    #[test]
    fn non_finite_result_falls_back_to_base() {
        let misc = Category::from("misc");
        let huge = format!("*{}", "9".repeat(300));
        let mods = [
            Modification::new("Huge").with_transform(huge.clone()),
            Modification::new("Huger").with_transform(huge),
        ];
        let v = valuate(&input(&misc, 100.0, &mods));
        // first transform stays finite, second overflows and is skipped
        assert!(!v.fell_back);
        assert_eq!(v.warnings.len(), 1);
        assert!(v.value.is_finite());

        let mut i = input(&misc, f64::MAX, &[]);
        i.item_name = Some("wand of plenty");
        i.charges = Some(10);
        let v = valuate(&i);
        assert!(v.fell_back);
        assert_eq!(v.value, f64::MAX);
    }

    #[test]
    fn manual_entry_without_category() {
        let mods = [Modification::new("+1").with_plus(1.0)];
        let i = ValuationInput {
            base_value: Some(40.0),
            modifications: &mods,
            masterwork: true,
            ..Default::default()
        };
        assert_eq!(value(&i), 40.0);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn size_name() -> impl Strategy<Value = Option<&'static str>> {
            prop_oneof![
                Just(None),
                proptest::sample::select(Size::ALL.map(|s| s.as_str()).to_vec()).prop_map(Some),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: valuation is deterministic.
            #[test]
            fn valuation_is_deterministic(
                base in 0.0f64..100_000.0,
                plus in 0u8..12,
                masterwork in any::<bool>(),
                size in size_name(),
            ) {
                let w = Category::Weapon;
                let mods = [
                    Modification::new("plus").with_plus(plus as f64),
                    Modification::new("calc").with_transform("*1.5+item.wgt*2"),
                ];
                let mut i = input(&w, base, &mods);
                i.masterwork = masterwork;
                i.size = size;
                prop_assert_eq!(valuate(&i), valuate(&i));
            }

            /// Property: size never changes the value of non weapon/armor items.
            #[test]
            fn size_is_ignored_for_other_categories(
                base in 0.0f64..100_000.0,
                size in size_name(),
                plus in 0u8..4,
            ) {
                let misc = Category::from("wondrous");
                let mods = [Modification::new("plus").with_plus(plus as f64)];
                let mut sized = input(&misc, base, &mods);
                sized.size = size;
                let medium = input(&misc, base, &mods);
                prop_assert_eq!(value(&sized), value(&medium));
            }

            /// Property: weapon value scales by the size table (no mods).
            #[test]
            fn weapon_value_scales_with_size(base in 0.0f64..100_000.0, size in size_name()) {
                let w = Category::Weapon;
                let mut i = input(&w, base, &[]);
                i.size = size;
                prop_assert_eq!(value(&i), base * Size::resolve(size).value_multiplier());
            }
        }
    }
}
