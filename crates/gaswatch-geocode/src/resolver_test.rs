use std::sync::{Arc, Mutex};

use super::*;
use crate::error::GeocodeError;
use crate::types::NullGeocoder;

/// Records every query and answers from a fixed script.
#[derive(Clone, Default)]
struct ScriptedGeocoder {
    seen: Arc<Mutex<Vec<GeoQuery>>>,
    structured: Option<GeoPoint>,
    free_form: Option<GeoPoint>,
    fail: bool,
}

impl ScriptedGeocoder {
    fn queries(&self) -> Vec<GeoQuery> {
        self.seen.lock().unwrap().clone()
    }
}

impl Geocoder for ScriptedGeocoder {
    async fn search(&self, query: &GeoQuery) -> Result<Option<GeoPoint>, GeocodeError> {
        self.seen.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(GeocodeError::UnexpectedStatus {
                status: 503,
                url: "http://geocoder.test/search".to_string(),
            });
        }
        Ok(match query {
            GeoQuery::Structured(_) => self.structured,
            GeoQuery::FreeForm(_) => self.free_form,
        })
    }
}

fn point() -> GeoPoint {
    GeoPoint::new(39.2, -76.8)
}

fn resolver(geocoder: ScriptedGeocoder) -> GeoResolver<ScriptedGeocoder> {
    GeoResolver::new(geocoder, Duration::ZERO)
}

#[test]
fn cache_key_joins_text_and_zip() {
    let street = LookupTarget::Street {
        street: "123 Main Street",
        zip: "21044",
    };
    let name = LookupTarget::Name {
        name: "Royal Farms",
        zip: "21144",
    };
    assert_eq!(street.cache_key(), "123 Main Street, 21044");
    assert_eq!(name.cache_key(), "Royal Farms, 21144");
}

#[test]
fn free_form_text_skips_missing_state() {
    assert_eq!(
        free_form_text("Royal Farms", "21144", Some("Maryland")),
        "Royal Farms, 21144, Maryland, USA"
    );
    assert_eq!(free_form_text("Shell", "00123", None), "Shell, 00123, USA");
}

#[tokio::test]
async fn structured_hit_skips_free_form() {
    let geocoder = ScriptedGeocoder {
        structured: Some(point()),
        ..Default::default()
    };
    let mut resolver = resolver(geocoder.clone());
    let target = LookupTarget::Street {
        street: "123 Main Street",
        zip: "21044",
    };

    assert_eq!(resolver.resolve(&target).await, Some(point()));

    let queries = geocoder.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(
        queries[0],
        GeoQuery::Structured(StructuredQuery {
            street: "123 Main Street".to_string(),
            postal_code: "21044".to_string(),
            country: "USA".to_string(),
            state: Some("Maryland".to_string()),
        })
    );
}

#[tokio::test]
async fn structured_miss_falls_back_to_free_form() {
    let geocoder = ScriptedGeocoder {
        free_form: Some(point()),
        ..Default::default()
    };
    let mut resolver = resolver(geocoder.clone());
    let target = LookupTarget::Street {
        street: "9 Elm Avenue",
        zip: "11901",
    };

    assert_eq!(resolver.resolve(&target).await, Some(point()));

    let queries = geocoder.queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(
        queries[1],
        GeoQuery::FreeForm("9 Elm Avenue, 11901, New York, USA".to_string())
    );
}

#[tokio::test]
async fn name_target_goes_straight_to_free_form() {
    let geocoder = ScriptedGeocoder {
        structured: Some(point()),
        free_form: None,
        ..Default::default()
    };
    let mut resolver = resolver(geocoder.clone());
    let target = LookupTarget::Name {
        name: "Royal Farms",
        zip: "21144",
    };

    assert_eq!(resolver.resolve(&target).await, None);
    assert_eq!(
        geocoder.queries(),
        vec![GeoQuery::FreeForm(
            "Royal Farms, 21144, Maryland, USA".to_string()
        )]
    );
}

#[tokio::test]
async fn repeated_key_is_served_from_cache() {
    let geocoder = ScriptedGeocoder {
        structured: Some(point()),
        ..Default::default()
    };
    let mut resolver = resolver(geocoder.clone());
    let target = LookupTarget::Street {
        street: "123 Main Street",
        zip: "21044",
    };

    for _ in 0..3 {
        assert_eq!(resolver.resolve(&target).await, Some(point()));
    }

    assert_eq!(geocoder.queries().len(), 1);
    let stats = resolver.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.cache_hits, 2);
    assert_eq!(stats.queries, 1);
}

#[tokio::test]
async fn not_found_is_cached_too() {
    let geocoder = ScriptedGeocoder::default();
    let mut resolver = resolver(geocoder.clone());
    let target = LookupTarget::Name {
        name: "Nowhere Fuel",
        zip: "21044",
    };

    assert_eq!(resolver.resolve(&target).await, None);
    assert_eq!(resolver.resolve(&target).await, None);

    assert_eq!(geocoder.queries().len(), 1);
    assert_eq!(
        resolver.cached("Nowhere Fuel, 21044"),
        Some(&CacheEntry::NotFound)
    );
    assert_eq!(resolver.stats().not_found, 1);
}

#[tokio::test]
async fn geocoder_errors_degrade_to_not_found() {
    let geocoder = ScriptedGeocoder {
        fail: true,
        ..Default::default()
    };
    let mut resolver = resolver(geocoder.clone());
    let target = LookupTarget::Street {
        street: "1 Failing Road",
        zip: "21044",
    };

    assert_eq!(resolver.resolve(&target).await, None);

    let stats = resolver.stats();
    assert_eq!(stats.failures, 2, "structured and free-form both failed");
    assert_eq!(stats.not_found, 0);
    assert_eq!(resolver.cached("1 Failing Road, 21044"), None);
}

#[tokio::test]
async fn failed_lookup_is_retried_on_next_occurrence() {
    let geocoder = ScriptedGeocoder {
        fail: true,
        ..Default::default()
    };
    let mut resolver = resolver(geocoder.clone());
    let target = LookupTarget::Name {
        name: "Shell",
        zip: "21044",
    };

    assert_eq!(resolver.resolve(&target).await, None);
    assert_eq!(resolver.resolve(&target).await, None);

    let stats = resolver.stats();
    assert_eq!(stats.queries, 2);
    assert_eq!(stats.cache_hits, 0);
    assert_eq!(stats.misses, 2);
    assert_eq!(geocoder.queries().len(), 2);
}

#[tokio::test]
async fn distinct_zips_are_distinct_keys() {
    let geocoder = ScriptedGeocoder {
        free_form: Some(point()),
        ..Default::default()
    };
    let mut resolver = resolver(geocoder.clone());

    for zip in ["21044", "21045"] {
        let target = LookupTarget::Name {
            name: "Exxon",
            zip,
        };
        assert!(resolver.resolve(&target).await.is_some());
    }

    assert_eq!(geocoder.queries().len(), 2);
    assert_eq!(resolver.stats().misses, 2);
}

#[tokio::test]
async fn delay_is_paid_only_on_miss() {
    let geocoder = ScriptedGeocoder {
        structured: Some(point()),
        ..Default::default()
    };
    let mut resolver = GeoResolver::new(geocoder, Duration::from_millis(50));
    let target = LookupTarget::Street {
        street: "123 Main Street",
        zip: "21044",
    };

    let start = std::time::Instant::now();
    resolver.resolve(&target).await;
    assert!(start.elapsed() >= Duration::from_millis(50));

    let start = std::time::Instant::now();
    resolver.resolve(&target).await;
    assert!(start.elapsed() < Duration::from_millis(50));
}

#[tokio::test]
async fn null_geocoder_never_finds_anything() {
    let mut resolver = GeoResolver::new(NullGeocoder, Duration::ZERO);
    let target = LookupTarget::Name {
        name: "Shell",
        zip: "21044",
    };
    assert_eq!(resolver.resolve(&target).await, None);
}
