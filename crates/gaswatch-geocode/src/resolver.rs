//! Per-run coordinate resolution with caching and a provider-friendly pace.
//!
//! Every cache miss pays one fixed delay before the first external query,
//! then tries a structured query (only when a street line is known) and
//! falls back to a free-form query. Both answers, found and not found, are
//! cached for the rest of the run, so each key hits the provider at most
//! once. Geocoder errors are logged and degrade to "not found" for that
//! occurrence; a lookup that errored is not cached.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::GeocodeError;
use crate::state::state_for_zip;
use crate::types::{GeoPoint, GeoQuery, Geocoder, StructuredQuery};

const COUNTRY: &str = "USA";

/// What to look up: a street line when one was extracted, otherwise the
/// station name. Both are scoped by zip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTarget<'a> {
    Street { street: &'a str, zip: &'a str },
    Name { name: &'a str, zip: &'a str },
}

impl LookupTarget<'_> {
    /// `"<street>, <zip>"` or `"<name>, <zip>"`.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{}, {}", self.text(), self.zip())
    }

    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Street { street, .. } => street,
            Self::Name { name, .. } => name,
        }
    }

    #[must_use]
    pub fn zip(&self) -> &str {
        match self {
            Self::Street { zip, .. } | Self::Name { zip, .. } => zip,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheEntry {
    Found(GeoPoint),
    NotFound,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    pub cache_hits: usize,
    /// Distinct keys that needed the provider.
    pub misses: usize,
    /// Individual requests sent to the geocoder (up to two per miss).
    pub queries: usize,
    pub failures: usize,
    pub not_found: usize,
}

pub struct GeoResolver<G> {
    geocoder: G,
    delay: Duration,
    cache: HashMap<String, CacheEntry>,
    stats: ResolverStats,
}

impl<G: Geocoder> GeoResolver<G> {
    /// `delay` is paid once before every uncached lookup.
    #[must_use]
    pub fn new(geocoder: G, delay: Duration) -> Self {
        Self {
            geocoder,
            delay,
            cache: HashMap::new(),
            stats: ResolverStats::default(),
        }
    }

    /// Resolve `target` to coordinates, consulting the per-run cache first.
    ///
    /// Never fails: provider errors are logged and treated as "not found"
    /// for this occurrence only. A negative answer is cached only when both
    /// strategies ran to completion and found nothing.
    pub async fn resolve(&mut self, target: &LookupTarget<'_>) -> Option<GeoPoint> {
        let key = target.cache_key();
        if let Some(entry) = self.cache.get(&key) {
            self.stats.cache_hits += 1;
            return match entry {
                CacheEntry::Found(point) => Some(*point),
                CacheEntry::NotFound => None,
            };
        }

        self.stats.misses += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.lookup(target, &key).await {
            Lookup::Found(point) => {
                self.cache.insert(key, CacheEntry::Found(point));
                Some(point)
            }
            Lookup::NotFound => {
                self.stats.not_found += 1;
                self.cache.insert(key, CacheEntry::NotFound);
                None
            }
            Lookup::Failed => None,
        }
    }

    async fn lookup(&mut self, target: &LookupTarget<'_>, key: &str) -> Lookup {
        let state = state_for_zip(target.zip());
        let mut failed = false;

        if let LookupTarget::Street { street, zip } = target {
            let query = GeoQuery::Structured(StructuredQuery {
                street: (*street).to_string(),
                postal_code: (*zip).to_string(),
                country: COUNTRY.to_string(),
                state: state.map(str::to_string),
            });
            match self.query(&query, key).await {
                Ok(Some(point)) => return Lookup::Found(point),
                Ok(None) => {}
                Err(_) => failed = true,
            }
        }

        let query = GeoQuery::FreeForm(free_form_text(target.text(), target.zip(), state));
        match self.query(&query, key).await {
            Ok(Some(point)) => Lookup::Found(point),
            Ok(None) if !failed => Lookup::NotFound,
            Ok(None) | Err(_) => Lookup::Failed,
        }
    }

    /// Errors come back already logged and counted.
    async fn query(
        &mut self,
        query: &GeoQuery,
        key: &str,
    ) -> Result<Option<GeoPoint>, GeocodeError> {
        self.stats.queries += 1;
        let result = self.geocoder.search(query).await;
        if let Err(e) = &result {
            self.stats.failures += 1;
            tracing::warn!(key, error = %e, "geocoder lookup failed; treating as not found");
        }
        result
    }

    #[must_use]
    pub fn cached(&self, key: &str) -> Option<&CacheEntry> {
        self.cache.get(key)
    }

    #[must_use]
    pub fn stats(&self) -> ResolverStats {
        self.stats
    }
}

/// Result of one uncached lookup. `Failed` means some query errored and
/// nothing was found, so the miss is not cached.
enum Lookup {
    Found(GeoPoint),
    NotFound,
    Failed,
}

/// Joins the non-empty parts of `{text, zip, state, country}` with `", "`.
fn free_form_text(text: &str, zip: &str, state: Option<&str>) -> String {
    [Some(text), Some(zip), state, Some(COUNTRY)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
