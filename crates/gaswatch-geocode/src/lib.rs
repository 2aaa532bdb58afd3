//! Geocoding for station records.
//!
//! [`NominatimClient`] talks to a Nominatim-compatible search API;
//! [`GeoResolver`] wraps any [`Geocoder`] with the per-run cache, the
//! structured-then-free-form query strategy, and the mandatory pre-query delay.

pub mod client;
pub mod error;
pub mod resolver;
pub mod state;
pub mod types;

pub use client::NominatimClient;
pub use error::GeocodeError;
pub use resolver::{CacheEntry, GeoResolver, LookupTarget, ResolverStats};
pub use state::state_for_zip;
pub use types::{GeoPoint, GeoQuery, Geocoder, NullGeocoder, StructuredQuery};
