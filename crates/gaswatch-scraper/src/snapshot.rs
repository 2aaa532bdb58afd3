//! Per-zone snapshot assembly.
//!
//! For each zip in zone order the page is fetched, every price text node is
//! traced back to its station card, and the card is turned into a
//! [`StationRecord`] after brand filtering and geocoding. Anything that goes
//! wrong for a single price occurrence skips that occurrence only; a page
//! that cannot be fetched contributes zero records. The final list is
//! deduplicated on (station, address), first occurrence wins.

use gaswatch_core::{dedup_records, BrandRules, StationRecord, Zone, ZipLabels, UNKNOWN_ADDRESS};
use gaswatch_geocode::{GeoResolver, Geocoder, LookupTarget};
use rust_decimal::Decimal;

use crate::address;
use crate::card::{card_text, CardLocator};
use crate::dom::Document;
use crate::error::SnapshotError;
use crate::page::PageSource;
use crate::price::find_prices;

/// One priced station card, before filtering and geocoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub station: String,
    /// Street line or [`UNKNOWN_ADDRESS`].
    pub street: String,
    pub price: Decimal,
}

/// Listings found on one page plus the number of price nodes scanned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageScan {
    pub prices_found: usize,
    /// Price nodes with no enclosing card (trend panels, page chrome).
    pub unlocated: usize,
    pub listings: Vec<Listing>,
}

/// Scans a rendered page for priced station cards.
#[must_use]
pub fn scan_page(html: &str, locator: &CardLocator) -> PageScan {
    let doc = Document::parse(html);
    let hits = find_prices(doc.text_nodes());

    let mut scan = PageScan {
        prices_found: hits.len(),
        ..PageScan::default()
    };
    for hit in hits {
        let Some(card) = locator.locate(hit.node) else {
            scan.unlocated += 1;
            continue;
        };
        scan.listings.push(Listing {
            station: locator.station_name(card),
            street: address::extract(&card_text(card)),
            price: hit.price,
        });
    }
    scan
}

/// Per-zip counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipReport {
    pub zip: String,
    pub label: String,
    pub prices_found: usize,
    /// Records produced for this zip before run-level deduplication.
    pub records_emitted: usize,
    pub blocked: usize,
    pub unlocated: usize,
    /// Set when the page could not be obtained.
    pub page_error: Option<String>,
}

impl ZipReport {
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.records_emitted > 0
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotOutcome {
    pub zone_name: String,
    /// Deduplicated records in encounter order.
    pub records: Vec<StationRecord>,
    pub zips: Vec<ZipReport>,
    pub duplicates_dropped: usize,
}

impl SnapshotOutcome {
    /// `true` when no zip yielded a record. This is a normal outcome.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn zips_without_data(&self) -> impl Iterator<Item = &ZipReport> {
        self.zips.iter().filter(|z| !z.has_data())
    }
}

/// Orchestrates card location, address extraction, brand rules and
/// geocoding for one zone.
pub struct SnapshotBuilder<'a, G> {
    rules: &'a BrandRules,
    resolver: &'a mut GeoResolver<G>,
    locator: CardLocator,
}

impl<'a, G: Geocoder> SnapshotBuilder<'a, G> {
    pub fn new(rules: &'a BrandRules, resolver: &'a mut GeoResolver<G>) -> Self {
        Self {
            rules,
            resolver,
            locator: CardLocator::default(),
        }
    }

    #[must_use]
    pub fn with_locator(mut self, locator: CardLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Builds the record set for `zone`, fetching each zip's page from `pages`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::EmptyZone`] if the zone lists no zips. Page
    /// failures are reported per zip in the outcome, never as an error.
    pub async fn build_snapshot<P: PageSource>(
        &mut self,
        zone: &Zone,
        labels: &ZipLabels,
        pages: &P,
    ) -> Result<SnapshotOutcome, SnapshotError> {
        if zone.zips.is_empty() {
            return Err(SnapshotError::EmptyZone {
                name: zone.name.clone(),
            });
        }

        let mut records = Vec::new();
        let mut zips = Vec::with_capacity(zone.zips.len());

        for zip in &zone.zips {
            let label = labels.label(zip).to_string();
            tracing::info!(zip = %zip, label = %label, "scanning zip");

            let html = match pages.fetch_page(zip).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!(zip = %zip, error = %e, "page unavailable; no data for zip");
                    zips.push(ZipReport {
                        zip: zip.clone(),
                        label,
                        prices_found: 0,
                        records_emitted: 0,
                        blocked: 0,
                        unlocated: 0,
                        page_error: Some(e.to_string()),
                    });
                    continue;
                }
            };

            let scan = scan_page(&html, &self.locator);
            let (zip_records, blocked) = self.enrich(zip, &label, scan.listings).await;

            tracing::info!(
                zip = %zip,
                prices = scan.prices_found,
                records = zip_records.len(),
                blocked,
                unlocated = scan.unlocated,
                "zip scanned"
            );
            zips.push(ZipReport {
                zip: zip.clone(),
                label,
                prices_found: scan.prices_found,
                records_emitted: zip_records.len(),
                blocked,
                unlocated: scan.unlocated,
                page_error: None,
            });
            records.extend(zip_records);
        }

        let before = records.len();
        let records = dedup_records(records);
        let duplicates_dropped = before - records.len();

        Ok(SnapshotOutcome {
            zone_name: zone.name.clone(),
            records,
            zips,
            duplicates_dropped,
        })
    }

    /// Applies brand rules and geocoding; returns the records and the number
    /// of blocklisted listings.
    async fn enrich(
        &mut self,
        zip: &str,
        label: &str,
        listings: Vec<Listing>,
    ) -> (Vec<StationRecord>, usize) {
        let mut records = Vec::with_capacity(listings.len());
        let mut blocked = 0;

        for listing in listings {
            let address = format!("{}, {zip}", listing.street);
            let decision = self.rules.classify(&listing.station, &address);
            if !decision.included {
                tracing::debug!(station = %listing.station, address = %address, "blocklisted");
                blocked += 1;
                continue;
            }

            let target = if listing.street == UNKNOWN_ADDRESS {
                LookupTarget::Name {
                    name: &listing.station,
                    zip,
                }
            } else {
                LookupTarget::Street {
                    street: &listing.street,
                    zip,
                }
            };
            let coordinates = self.resolver.resolve(&target).await.map(Into::into);

            records.push(StationRecord::new(
                label.to_string(),
                zip.to_string(),
                listing.station,
                address,
                listing.price,
                decision.discount_amount,
                decision.discount_rule,
                coordinates,
            ));
        }

        (records, blocked)
    }
}

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod tests;
