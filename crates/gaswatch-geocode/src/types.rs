use std::future::Future;

use crate::error::GeocodeError;

/// A resolved latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `true` when both components are finite and inside the valid ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl From<GeoPoint> for (f64, f64) {
    fn from(p: GeoPoint) -> Self {
        (p.lat, p.lng)
    }
}

/// Field-by-field address query. Preferred over free text because the
/// provider cannot mis-assign a house number to the wrong field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredQuery {
    pub street: String,
    pub postal_code: String,
    pub country: String,
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoQuery {
    Structured(StructuredQuery),
    FreeForm(String),
}

/// A geocoding backend.
///
/// `Ok(None)` means the provider answered but found nothing; `Err` is a
/// transport or protocol failure.
pub trait Geocoder {
    fn search(
        &self,
        query: &GeoQuery,
    ) -> impl Future<Output = Result<Option<GeoPoint>, GeocodeError>> + Send;
}

/// Answers every query with "not found". Used when geocoding is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullGeocoder;

impl Geocoder for NullGeocoder {
    async fn search(&self, _query: &GeoQuery) -> Result<Option<GeoPoint>, GeocodeError> {
        Ok(None)
    }
}
