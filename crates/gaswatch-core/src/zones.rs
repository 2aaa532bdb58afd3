//! Scrape zones: named, ordered zip lists plus the zip -> display label map.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

/// A named collection of zip codes scraped together as one logical region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub name: String,
    pub zips: Vec<String>,
}

impl Zone {
    #[must_use]
    pub fn new(name: impl Into<String>, zips: Vec<String>) -> Self {
        Self {
            name: name.into(),
            zips,
        }
    }

    /// Filesystem-safe location slug used in snapshot file names.
    ///
    /// `/` and spaces become `_`, `:` is dropped, then anything other than an
    /// alphanumeric, `_` or `-` is stripped.
    /// `"Commute: Severn <-> Scaggsville"` becomes `"Commute_Severn_-_Scaggsville"`.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .chars()
            .filter_map(|c| match c {
                '/' | ' ' => Some('_'),
                ':' => None,
                c if c.is_alphanumeric() || c == '_' || c == '-' => Some(c),
                _ => None,
            })
            .collect()
    }
}

/// Zip code -> human label (`"21044"` -> `"Columbia (Town Center)"`).
///
/// Built by zone resolution and handed to the snapshot builder; nothing
/// deeper in the pipeline mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZipLabels(BTreeMap<String, String>);

impl ZipLabels {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, zip: impl Into<String>, label: impl Into<String>) {
        self.0.insert(zip.into(), label.into());
    }

    /// Label for `zip`, or the zip itself when no label is known.
    #[must_use]
    pub fn label<'a>(&'a self, zip: &'a str) -> &'a str {
        self.0.get(zip).map_or(zip, String::as_str)
    }

    /// Adds every entry of `other`, overwriting existing labels.
    pub fn merge(&mut self, other: ZipLabels) {
        self.0.extend(other.0);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A selectable entry of the region table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Region {
    /// Short selector used on the command line (`"1"`, `"2"`, ...).
    pub key: String,
    pub name: String,
    pub zips: Vec<String>,
}

impl Region {
    #[must_use]
    pub fn to_zone(&self) -> Zone {
        Zone::new(self.name.clone(), self.zips.clone())
    }
}

#[derive(Debug, Clone)]
pub struct RegionTable {
    regions: Vec<Region>,
    labels: ZipLabels,
}

#[derive(Debug, Deserialize)]
struct RegionsFile {
    #[serde(default)]
    labels: BTreeMap<String, String>,
    regions: Vec<Region>,
}

impl RegionTable {
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if any region has an empty name or
    /// zip list, a malformed zip, or a duplicate key.
    pub fn new(regions: Vec<Region>, labels: ZipLabels) -> Result<Self, ConfigError> {
        validate_regions(&regions)?;
        Ok(Self { regions, labels })
    }

    /// The four regions the project ships with.
    #[must_use]
    pub fn builtin() -> Self {
        let mut labels = ZipLabels::new();
        for (zip, label) in BUILTIN_LABELS {
            labels.insert(*zip, *label);
        }
        let regions = BUILTIN_REGIONS
            .iter()
            .map(|(key, name, zips)| Region {
                key: (*key).to_string(),
                name: (*name).to_string(),
                zips: zips.iter().map(|z| (*z).to_string()).collect(),
            })
            .collect();
        Self { regions, labels }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.key == key)
    }

    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    #[must_use]
    pub fn labels(&self) -> &ZipLabels {
        &self.labels
    }
}

/// `true` for exactly five ASCII digits.
#[must_use]
pub fn is_valid_zip(zip: &str) -> bool {
    zip.len() == 5 && zip.bytes().all(|b| b.is_ascii_digit())
}

/// Load the region table and zip labels from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_regions(path: &Path) -> Result<RegionTable, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: RegionsFile = serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut labels = ZipLabels::new();
    for (zip, label) in file.labels {
        labels.insert(zip, label);
    }
    RegionTable::new(file.regions, labels)
}

fn validate_regions(regions: &[Region]) -> Result<(), ConfigError> {
    let mut seen_keys = HashSet::new();

    for region in regions {
        if region.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "region '{}' must have a non-empty name",
                region.key
            )));
        }

        if region.zips.is_empty() {
            return Err(ConfigError::Validation(format!(
                "region '{}' has no zip codes",
                region.name
            )));
        }

        if let Some(bad) = region.zips.iter().find(|z| !is_valid_zip(z)) {
            return Err(ConfigError::Validation(format!(
                "region '{}' has invalid zip '{bad}'; expected 5 digits",
                region.name
            )));
        }

        if !seen_keys.insert(region.key.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate region key: '{}'",
                region.key
            )));
        }
    }

    Ok(())
}

const BUILTIN_LABELS: &[(&str, &str)] = &[
    // Maryland - Columbia/EC
    ("20723", "Scaggsville / Laurel"),
    ("21044", "Columbia (Town Center)"),
    ("21045", "Columbia (East)"),
    ("21046", "Columbia (Guilford)"),
    ("21042", "Ellicott City (Central)"),
    ("21043", "Ellicott City (North)"),
    // Maryland - Severn/Commute Corridor
    ("21144", "Severn"),
    ("21076", "Hanover (Arundel Mills)"),
    ("20794", "Jessup"),
    ("20763", "Savage"),
    // Long Island
    ("11901", "Riverhead"),
    ("11946", "Hampton Bays"),
    ("11968", "Southampton"),
    ("11976", "Water Mill"),
    ("11932", "Bridgehampton"),
    ("11937", "East Hampton"),
    ("11930", "Amagansett"),
    ("11954", "Montauk"),
    // Western Mass
    ("01103", "Springfield"),
    ("01020", "Chicopee"),
    ("01040", "Holyoke"),
    ("01027", "Easthampton"),
    ("01060", "Northampton"),
    ("01035", "Hadley"),
    ("01002", "Amherst"),
    ("01054", "Leverett"),
    ("01301", "Greenfield"),
    ("01373", "South Deerfield"),
];

type BuiltinRegion = (&'static str, &'static str, &'static [&'static str]);

const BUILTIN_REGIONS: &[BuiltinRegion] = &[
    (
        "1",
        "Maryland (ALL: Columbia, EC, Severn)",
        &[
            "21044", "21045", "21046", "21042", "21043", "20723", "21144", "21076", "20794",
        ],
    ),
    (
        "2",
        "Long Island (East End)",
        &[
            "11901", "11946", "11968", "11976", "11932", "11937", "11930", "11954",
        ],
    ),
    (
        "3",
        "Western Mass (I-91 Corridor)",
        &[
            "01103", "01020", "01040", "01027", "01060", "01035", "01002", "01054", "01373",
            "01301",
        ],
    ),
    (
        "4",
        "Commute: Severn <-> Scaggsville",
        &["21144", "21076", "20794", "20763", "20723"],
    ),
];

#[cfg(test)]
#[path = "zones_test.rs"]
mod tests;
