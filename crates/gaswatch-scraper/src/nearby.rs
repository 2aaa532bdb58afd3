//! Custom radius zones around a center zip.
//!
//! Scanning every zip inside a radius would mean dozens of pages, mostly
//! rural. A radius zone is the center plus the [`MAX_NEIGHBORS`] most
//! populous zips nearby.

use std::path::Path;

use gaswatch_core::{Zone, ZipLabels};
use serde::Deserialize;

use crate::error::ScraperError;

pub const MAX_NEIGHBORS: usize = 4;

/// Nearest candidates considered before ranking by population.
const CANDIDATE_POOL: usize = 50;

const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Zips chosen for a radius zone and their display labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NearbyZone {
    /// Center first, then neighbors by descending population.
    pub zips: Vec<String>,
    pub labels: ZipLabels,
}

pub trait NearbyZips {
    fn nearby(&self, center: &str, radius_miles: f64) -> NearbyZone;
}

/// Used when no zip table is configured: the zone is just the center.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleZipFallback;

impl NearbyZips for SingleZipFallback {
    fn nearby(&self, center: &str, _radius_miles: f64) -> NearbyZone {
        tracing::warn!(center, "no zip table configured; scanning the center zip only");
        NearbyZone {
            zips: vec![center.to_string()],
            labels: ZipLabels::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ZipRow {
    zip: String,
    city: String,
    lat: f64,
    lng: f64,
    #[serde(default)]
    population: Option<u64>,
}

/// Radius search over a CSV table with `zip,city,lat,lng,population` columns.
#[derive(Debug, Clone)]
pub struct ZipTableSearch {
    rows: Vec<ZipRow>,
}

impl ZipTableSearch {
    /// # Errors
    ///
    /// Returns [`ScraperError::ZipTable`] if the file cannot be read or a row
    /// does not match the expected columns.
    pub fn load(path: &Path) -> Result<Self, ScraperError> {
        let reader = csv::Reader::from_path(path).map_err(|source| ScraperError::ZipTable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv(reader).map_err(|source| ScraperError::ZipTable {
            path: path.to_path_buf(),
            source,
        })
    }

    /// # Errors
    ///
    /// Returns the first row that fails to deserialize.
    pub fn from_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self, csv::Error> {
        let mut rows = Vec::new();
        for row in reader.deserialize::<ZipRow>() {
            let mut row = row?;
            row.zip = pad_zip(row.zip.trim());
            rows.push(row);
        }
        tracing::debug!(rows = rows.len(), "loaded zip table");
        Ok(Self { rows })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl NearbyZips for ZipTableSearch {
    fn nearby(&self, center: &str, radius_miles: f64) -> NearbyZone {
        let mut labels = ZipLabels::new();
        let Some(origin) = self.rows.iter().find(|r| r.zip == center) else {
            tracing::warn!(center, "center zip not in zip table; scanning it alone");
            return NearbyZone {
                zips: vec![center.to_string()],
                labels,
            };
        };
        labels.insert(center, origin.city.clone());

        let mut candidates: Vec<(f64, &ZipRow)> = self
            .rows
            .iter()
            .filter(|r| r.zip != center)
            .map(|r| (distance_miles(origin.lat, origin.lng, r.lat, r.lng), r))
            .filter(|(d, _)| *d <= radius_miles)
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
        candidates.truncate(CANDIDATE_POOL);
        // Stable: equal populations stay nearest-first.
        candidates.sort_by(|a, b| b.1.population.unwrap_or(0).cmp(&a.1.population.unwrap_or(0)));

        let mut zips = vec![center.to_string()];
        for (_, row) in candidates {
            if zips.len() > MAX_NEIGHBORS {
                break;
            }
            if zips.contains(&row.zip) {
                continue;
            }
            labels.insert(row.zip.clone(), row.city.clone());
            zips.push(row.zip.clone());
        }

        tracing::info!(center, radius_miles, zips = ?zips, "resolved radius zone");
        NearbyZone { zips, labels }
    }
}

/// Name of the zone built around `center`.
#[must_use]
pub fn radius_zone_name(center: &str) -> String {
    format!("Custom_Radius_{center}")
}

/// Resolves a radius zone into a [`Zone`] plus its labels.
pub fn radius_zone<N: NearbyZips + ?Sized>(
    finder: &N,
    center: &str,
    radius_miles: f64,
) -> (Zone, ZipLabels) {
    let found = finder.nearby(center, radius_miles);
    (Zone::new(radius_zone_name(center), found.zips), found.labels)
}

/// Spreadsheet exports drop leading zeros from New England zips.
fn pad_zip(zip: &str) -> String {
    if !zip.is_empty() && zip.len() < 5 && zip.bytes().all(|b| b.is_ascii_digit()) {
        format!("{zip:0>5}")
    } else {
        zip.to_string()
    }
}

/// Great-circle distance (haversine).
fn distance_miles(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlng / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}
