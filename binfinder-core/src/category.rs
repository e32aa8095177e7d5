//! Waste categories and the mapping from free-text classifier labels to bins.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Sorting category of a classified item.
pub enum WasteCategory {
    /// Plastic packaging and PET.
    Plastics,
    /// Paper and cardboard.
    Paper,
    /// Glass containers.
    Glass,
    /// Cans and small metal scrap.
    Metals,
    /// Food and garden waste.
    Biodegradable,
    /// Tetra-pak style drink cartons.
    BeverageCartons,
    /// Electrical and electronic equipment.
    Electronic,
    /// Batteries, chemicals, and other hazardous items.
    Hazardous,
    /// Clothes, shoes, and fabric.
    Textile,
    /// Residual waste that fits no other category.
    Mixed,
}

impl WasteCategory {
    /// Human-friendly name used in replies.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            WasteCategory::Plastics => "plastics",
            WasteCategory::Paper => "paper",
            WasteCategory::Glass => "glass",
            WasteCategory::Metals => "metals",
            WasteCategory::Biodegradable => "biodegradable waste",
            WasteCategory::BeverageCartons => "beverage cartons",
            WasteCategory::Electronic => "electronic waste",
            WasteCategory::Hazardous => "hazardous waste",
            WasteCategory::Textile => "textile",
            WasteCategory::Mixed => "mixed waste",
        }
    }

    /// Lower-case fragments of smart bin container trash types accepting this category.
    ///
    /// Container types are reported by the backend in Czech, hence the local terms.
    #[must_use]
    pub fn container_keywords(self) -> &'static [&'static str] {
        match self {
            WasteCategory::Plastics => &["plast", "plastic"],
            WasteCategory::Paper => &["papír", "paper"],
            WasteCategory::Glass => &["sklo", "glass"],
            WasteCategory::Metals => &["kov", "metal"],
            WasteCategory::BeverageCartons => &["karton", "carton"],
            WasteCategory::Electronic => &["elektro", "electro"],
            WasteCategory::Textile => &["textil"],
            WasteCategory::Biodegradable | WasteCategory::Hazardous | WasteCategory::Mixed => &[],
        }
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Colour of the bin (or disposal route) an item belongs in.
pub enum BinColor {
    /// Plastics.
    Yellow,
    /// Paper.
    Blue,
    /// Glass.
    Green,
    /// Metals.
    Gray,
    /// Biodegradable waste.
    Brown,
    /// Beverage cartons.
    Orange,
    /// No street bin; take it to a collection yard or take-back point.
    Dropoff,
    /// Residual waste.
    Black,
    /// Nothing to classify.
    Unknown,
}

impl BinColor {
    /// Human-friendly name used in replies.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            BinColor::Yellow => "yellow",
            BinColor::Blue => "blue",
            BinColor::Green => "green",
            BinColor::Gray => "gray",
            BinColor::Brown => "brown",
            BinColor::Orange => "orange",
            BinColor::Dropoff => "drop-off",
            BinColor::Black => "black",
            BinColor::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BinColor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Outcome of classifying a single photo.
pub struct ClassificationResult {
    /// Raw label reported by the classifier.
    pub label: String,
    /// Category resolved from the label.
    pub category: WasteCategory,
    /// Bin the item belongs in.
    pub bin_color: BinColor,
}

impl ClassificationResult {
    /// Resolve category and bin for a classifier label.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let (category, bin_color) = map_label_to_bin(label);
        Self {
            label: label.trim().to_owned(),
            category,
            bin_color,
        }
    }
}

struct BinRule {
    category: WasteCategory,
    color: BinColor,
    keywords: &'static [&'static str],
}

// Order is precedence: labels often hit several keyword sets ("glass bottle"),
// and the first rule that matches decides.
const RULES: &[BinRule] = &[
    BinRule {
        category: WasteCategory::Plastics,
        color: BinColor::Yellow,
        keywords: &[
            "plastic", "bottle", " pet ", "packaging", "bag", "wrapper", "foil", "polystyrene",
            "styrofoam", "straw", "yogurt",
        ],
    },
    BinRule {
        category: WasteCategory::Paper,
        color: BinColor::Blue,
        keywords: &[
            "paper", "cardboard", "newspaper", "magazine", "book", "envelope", "notebook",
            "leaflet",
        ],
    },
    BinRule {
        category: WasteCategory::Glass,
        color: BinColor::Green,
        keywords: &["glass", "jar", "wine"],
    },
    BinRule {
        category: WasteCategory::Metals,
        color: BinColor::Gray,
        keywords: &[
            "metal", " can ", " cans ", " tin ", "aluminium", "aluminum", "steel", " lid ",
        ],
    },
    BinRule {
        category: WasteCategory::Biodegradable,
        color: BinColor::Brown,
        keywords: &[
            "food", "banana", "apple", "peel", "organic", "leaf", "leaves", "grass", "coffee",
            "vegetable", "fruit", "eggshell",
        ],
    },
    BinRule {
        category: WasteCategory::BeverageCartons,
        color: BinColor::Orange,
        keywords: &["carton", "tetra", "juice box", "milk box"],
    },
    BinRule {
        category: WasteCategory::Electronic,
        color: BinColor::Dropoff,
        keywords: &[
            "electronic", "phone", "laptop", "computer", "charger", "cable", "keyboard",
            "monitor", "television", "remote",
        ],
    },
    BinRule {
        category: WasteCategory::Hazardous,
        color: BinColor::Dropoff,
        keywords: &[
            "battery", "batteries", "paint", "chemical", "medicine", "oil", "bulb", "aerosol",
            "solvent", "thermometer",
        ],
    },
    BinRule {
        category: WasteCategory::Textile,
        color: BinColor::Dropoff,
        keywords: &[
            "textile", "cloth", "shirt", "jeans", "dress", "fabric", "shoe", "sock", "jacket",
        ],
    },
];

/// Map a free-text classifier label to a waste category and bin colour.
///
/// Matching is case-insensitive and first-match-wins over the rule table above.
/// Labels matching no rule are mixed waste; blank labels additionally get
/// [`BinColor::Unknown`].
#[must_use]
pub fn map_label_to_bin(label: &str) -> (WasteCategory, BinColor) {
    let normalized = label.trim().to_lowercase();
    if normalized.is_empty() {
        return (WasteCategory::Mixed, BinColor::Unknown);
    }
    // Padding lets word-bounded keywords such as " can " match at either end.
    let padded = format!(" {normalized} ");

    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|keyword| padded.contains(keyword)))
        .map_or((WasteCategory::Mixed, BinColor::Black), |rule| {
            (rule.category, rule.color)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plastic_bottle_goes_to_yellow_bin() {
        assert_eq!(
            map_label_to_bin("plastic bottle"),
            (WasteCategory::Plastics, BinColor::Yellow)
        );
    }

    #[test]
    fn glass_jar_is_glass() {
        assert_eq!(
            map_label_to_bin("used glass jar"),
            (WasteCategory::Glass, BinColor::Green)
        );
    }

    #[test]
    fn earlier_rule_wins_on_overlap() {
        // "bottle" is a plastics keyword and plastics precede glass.
        assert_eq!(map_label_to_bin("Glass Bottle").0, WasteCategory::Plastics);
        // "paper" precedes "carton".
        assert_eq!(map_label_to_bin("paper carton").0, WasteCategory::Paper);
    }

    #[test]
    fn unmatched_label_is_mixed() {
        assert_eq!(
            map_label_to_bin("xyz"),
            (WasteCategory::Mixed, BinColor::Black)
        );
        assert_eq!(
            map_label_to_bin("   "),
            (WasteCategory::Mixed, BinColor::Unknown)
        );
    }

    #[test]
    fn later_rules_are_reachable() {
        assert_eq!(map_label_to_bin("AA battery").0, WasteCategory::Hazardous);
        assert_eq!(map_label_to_bin("old t-shirt").0, WasteCategory::Textile);
        assert_eq!(map_label_to_bin("tetra pak").0, WasteCategory::BeverageCartons);
        assert_eq!(map_label_to_bin("banana peel").0, WasteCategory::Biodegradable);
        assert_eq!(map_label_to_bin("mobile phone").0, WasteCategory::Electronic);
        assert_eq!(map_label_to_bin("soda can").0, WasteCategory::Metals);
    }

    #[test]
    fn classification_keeps_trimmed_label() {
        let result = ClassificationResult::from_label("  Plastic Bottle ");
        assert_eq!(result.label, "Plastic Bottle");
        assert_eq!(result.category, WasteCategory::Plastics);
        assert_eq!(result.bin_color, BinColor::Yellow);
    }
}
