//! Size categories and their pricing/weight multipliers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Size {
    Fine,
    Diminutive,
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Huge,
    Gargantuan,
    Colossal,
}

impl Size {
    pub const ALL: [Size; 9] = [
        Size::Fine,
        Size::Diminutive,
        Size::Tiny,
        Size::Small,
        Size::Medium,
        Size::Large,
        Size::Huge,
        Size::Gargantuan,
        Size::Colossal,
    ];

    /// Parse a size name (case-insensitive, surrounding whitespace ignored).
    pub fn parse(name: &str) -> Option<Size> {
        let name = name.trim();
        Size::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(name))
    }

    /// Resolve an optional size name; absent or unknown sizes are Medium.
    pub fn resolve(name: Option<&str>) -> Size {
        name.and_then(Size::parse).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Size::Fine => "Fine",
            Size::Diminutive => "Diminutive",
            Size::Tiny => "Tiny",
            Size::Small => "Small",
            Size::Medium => "Medium",
            Size::Large => "Large",
            Size::Huge => "Huge",
            Size::Gargantuan => "Gargantuan",
            Size::Colossal => "Colossal",
        }
    }

    /// Price multiplier for weapons and armor.
    pub fn value_multiplier(self) -> f64 {
        match self {
            Size::Fine | Size::Diminutive | Size::Tiny => 0.5,
            Size::Small | Size::Medium => 1.0,
            Size::Large => 2.0,
            Size::Huge => 4.0,
            Size::Gargantuan => 8.0,
            Size::Colossal => 16.0,
        }
    }

    /// Weight multiplier, used for `item.wgt` in mod transforms.
    pub fn weight_multiplier(self) -> f64 {
        match self {
            Size::Fine | Size::Diminutive | Size::Tiny => 0.1,
            Size::Small => 0.5,
            Size::Medium => 1.0,
            Size::Large => 2.0,
            Size::Huge => 5.0,
            Size::Gargantuan => 8.0,
            Size::Colossal => 12.0,
        }
    }
}

impl core::fmt::Display for Size {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
