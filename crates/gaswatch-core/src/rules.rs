//! Brand blocklist and loyalty discount rules.
//!
//! Both tables are ordered. The discount table is first-match-wins, so a name
//! containing several brand substrings is credited to the earliest entry.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::records::NO_DISCOUNT_RULE;
use crate::ConfigError;

const DEFAULT_BLOCKLIST: &[&str] = &[
    "BJ's",
    "Costco",
    "Sam's Club",
    // Listing-site artifacts: the provider's own headquarters address leaks
    // into some result pages.
    "Features",
    "GasBuddy",
    "Dallas Parkway",
];

/// `(brand, cents)` in match order.
const DEFAULT_DISCOUNTS: &[(&str, i64)] = &[
    // MD
    ("Royal Farms", 10),
    ("Giant", 5),
    ("High's", 5),
    // MA / NY
    ("Cumberland", 10),
    ("Big Y", 5),
    ("Pride", 10),
    ("Stop & Shop", 10),
    // National
    ("Speedway", 5),
    ("Sheetz", 3),
    ("7-Eleven", 3),
    ("7-11", 3),
    ("Shell", 5),
    ("Exxon", 3),
    ("Mobil", 3),
    ("Sunoco", 3),
    ("BP", 5),
    ("Wawa", 0),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountRule {
    pub brand: String,
    pub amount: Decimal,
}

/// Outcome of [`BrandRules::classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// `false` when the name or address hit the blocklist.
    pub included: bool,
    pub discount_rule: String,
    pub discount_amount: Decimal,
}

impl Decision {
    fn excluded() -> Self {
        Self {
            included: false,
            discount_rule: NO_DISCOUNT_RULE.to_string(),
            discount_amount: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrandRules {
    /// Lower-cased blocklist substrings.
    blocklist: Vec<String>,
    discounts: Vec<DiscountRule>,
    /// Lower-cased `discounts[i].brand`, index-aligned.
    discount_needles: Vec<String>,
}

impl Default for BrandRules {
    fn default() -> Self {
        Self::new(
            DEFAULT_BLOCKLIST.iter().map(|s| (*s).to_string()).collect(),
            DEFAULT_DISCOUNTS
                .iter()
                .map(|(brand, cents)| DiscountRule {
                    brand: (*brand).to_string(),
                    amount: Decimal::new(*cents, 2),
                })
                .collect(),
        )
    }
}

impl BrandRules {
    #[must_use]
    pub fn new(blocklist: Vec<String>, discounts: Vec<DiscountRule>) -> Self {
        let blocklist = blocklist.iter().map(|b| b.to_lowercase()).collect();
        let discount_needles = discounts.iter().map(|d| d.brand.to_lowercase()).collect();
        Self {
            blocklist,
            discounts,
            discount_needles,
        }
    }

    /// Applies the blocklist to both `name` and `address`, then looks up the
    /// first discount brand contained in `name`.
    ///
    /// Blocklist hits win over any discount match.
    #[must_use]
    pub fn classify(&self, name: &str, address: &str) -> Decision {
        if self.is_blocked(name, address) {
            return Decision::excluded();
        }

        match self.discount_for(name) {
            Some(rule) => Decision {
                included: true,
                discount_rule: rule.brand.clone(),
                discount_amount: rule.amount,
            },
            None => Decision {
                included: true,
                discount_rule: NO_DISCOUNT_RULE.to_string(),
                discount_amount: Decimal::ZERO,
            },
        }
    }

    #[must_use]
    pub fn is_blocked(&self, name: &str, address: &str) -> bool {
        let name = name.to_lowercase();
        let address = address.to_lowercase();
        self.blocklist
            .iter()
            .any(|b| name.contains(b.as_str()) || address.contains(b.as_str()))
    }

    #[must_use]
    pub fn discount_for(&self, name: &str) -> Option<&DiscountRule> {
        let name = name.to_lowercase();
        self.discount_needles
            .iter()
            .position(|needle| name.contains(needle.as_str()))
            .map(|idx| &self.discounts[idx])
    }

    #[must_use]
    pub fn discounts(&self) -> &[DiscountRule] {
        &self.discounts
    }
}

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default)]
    blocklist: Vec<String>,
    #[serde(default)]
    discounts: Vec<DiscountEntry>,
}

#[derive(Debug, Deserialize)]
struct DiscountEntry {
    brand: String,
    amount: f64,
}

/// Load blocklist and discount tables from a YAML file, preserving entry order.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, or if an entry
/// has an empty pattern or a negative / non-finite discount.
pub fn load_rules(path: &Path) -> Result<BrandRules, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_rules(&content, &path.display().to_string())
}

fn parse_rules(content: &str, origin: &str) -> Result<BrandRules, ConfigError> {
    let file: RulesFile = serde_yaml::from_str(content).map_err(|e| ConfigError::FileParse {
        path: origin.to_string(),
        source: e,
    })?;

    if let Some(pos) = file.blocklist.iter().position(|b| b.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "blocklist entry {pos} must be non-empty"
        )));
    }

    let mut discounts = Vec::with_capacity(file.discounts.len());
    for entry in file.discounts {
        if entry.brand.trim().is_empty() {
            return Err(ConfigError::Validation(
                "discount brand must be non-empty".to_string(),
            ));
        }
        let amount = Decimal::try_from(entry.amount)
            .ok()
            .filter(|d| !d.is_sign_negative())
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "discount for '{}' must be a non-negative amount, got {}",
                    entry.brand, entry.amount
                ))
            })?
            .round_dp(2);
        discounts.push(DiscountRule {
            brand: entry.brand,
            amount,
        });
    }

    Ok(BrandRules::new(file.blocklist, discounts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocklist_wins_over_discount() {
        let rules = BrandRules::default();
        // "Costco Gas" is blocklisted even though nothing else disqualifies it.
        let decision = rules.classify("Costco Gas", "123 Main St, 21044");
        assert!(!decision.included);
        assert_eq!(decision.discount_rule, NO_DISCOUNT_RULE);

        // A blocklisted brand that also contains a discount brand substring.
        let decision = rules.classify("Shell at Sam's Club", "1 Mall Rd, 21045");
        assert!(!decision.included);
    }

    #[test]
    fn blocklist_checks_address_case_insensitively() {
        let rules = BrandRules::default();
        let decision = rules.classify("Some Station", "5001 DALLAS PARKWAY, 75248");
        assert!(!decision.included);
    }

    #[test]
    fn first_discount_match_wins() {
        let rules = BrandRules::default();
        // Contains both "Giant" and "Shell"; Giant comes first in the table.
        let decision = rules.classify("Giant Shell Express", "10 Route 1, 21044");
        assert!(decision.included);
        assert_eq!(decision.discount_rule, "Giant");
        assert_eq!(decision.discount_amount, Decimal::new(5, 2));
    }

    #[test]
    fn discount_match_is_case_insensitive() {
        let rules = BrandRules::default();
        let decision = rules.classify("ROYAL FARMS #112", "Unknown Address, 21144");
        assert_eq!(decision.discount_rule, "Royal Farms");
        assert_eq!(decision.discount_amount, Decimal::new(10, 2));
    }

    #[test]
    fn no_match_gets_zero_discount() {
        let rules = BrandRules::default();
        let decision = rules.classify("Valero", "77 Elm St, 01060");
        assert!(decision.included);
        assert_eq!(decision.discount_rule, NO_DISCOUNT_RULE);
        assert_eq!(decision.discount_amount, Decimal::ZERO);
    }

    #[test]
    fn wawa_matches_with_zero_amount() {
        let rules = BrandRules::default();
        let decision = rules.classify("Wawa", "1 Pike Rd, 20723");
        assert_eq!(decision.discount_rule, "Wawa");
        assert!(decision.discount_amount.is_zero());
    }

    #[test]
    fn parse_rules_preserves_order() {
        let yaml = r"
blocklist:
  - Costco
discounts:
  - brand: Mobil
    amount: 0.03
  - brand: Exxon
    amount: 0.07
";
        let rules = parse_rules(yaml, "inline").unwrap();
        assert_eq!(rules.discounts()[0].brand, "Mobil");
        let decision = rules.classify("ExxonMobil", "3 Elm St, 11901");
        assert_eq!(decision.discount_rule, "Mobil");
        assert_eq!(decision.discount_amount, Decimal::new(3, 2));
    }

    #[test]
    fn parse_rules_rejects_negative_discount() {
        let yaml = "discounts:\n  - brand: Shell\n    amount: -0.05\n";
        let err = parse_rules(yaml, "inline").unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn parse_rules_rejects_empty_blocklist_entry() {
        let yaml = "blocklist:\n  - \"  \"\n";
        let err = parse_rules(yaml, "inline").unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn load_rules_from_repo_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("rules.yaml");
        let loaded = load_rules(&path).expect("config/rules.yaml should load");
        let defaults = BrandRules::default();
        assert_eq!(loaded.discounts(), defaults.discounts());
        assert!(!loaded.classify("BJ's Wholesale", "1 Main St, 21044").included);
    }
}
