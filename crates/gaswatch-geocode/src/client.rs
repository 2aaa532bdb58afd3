//! HTTP client for a Nominatim-compatible `/search` endpoint.
//!
//! Structured queries map to the `street`, `postalcode`, `country` and
//! `state` parameters; free-form queries use `q`. Only the best match is
//! requested (`limit=1`).

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::GeocodeError;
use crate::types::{GeoPoint, GeoQuery, Geocoder};

/// One entry of the JSON array Nominatim returns. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// Client for the Nominatim search API.
///
/// Use [`NominatimClient::new`] with the public endpoint or a self-hosted
/// instance; tests point it at a wiremock server.
pub struct NominatimClient {
    client: Client,
    base_url: Url,
}

impl NominatimClient {
    /// Creates a client for `base_url` (e.g. `https://nominatim.openstreetmap.org`).
    ///
    /// Nominatim's usage policy requires an identifying `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`GeocodeError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Normalise to exactly one trailing slash so `join("search")` appends
        // rather than replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| GeocodeError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// Builds the `/search` URL with percent-encoded query parameters.
    fn search_url(&self, query: &GeoQuery) -> Result<Url, GeocodeError> {
        let mut url = self
            .base_url
            .join("search")
            .map_err(|e| GeocodeError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("format", "json");
            pairs.append_pair("limit", "1");
            match query {
                GeoQuery::Structured(q) => {
                    pairs.append_pair("street", &q.street);
                    pairs.append_pair("postalcode", &q.postal_code);
                    pairs.append_pair("country", &q.country);
                    if let Some(state) = &q.state {
                        pairs.append_pair("state", state);
                    }
                }
                GeoQuery::FreeForm(text) => {
                    pairs.append_pair("q", text);
                }
            }
        }
        Ok(url)
    }

    async fn fetch(&self, query: &GeoQuery) -> Result<Option<GeoPoint>, GeocodeError> {
        let url = self.search_url(query)?;
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(GeocodeError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            return Err(GeocodeError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let places: Vec<NominatimPlace> =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };

        let point = parse_point(&place)?;
        tracing::debug!(
            lat = point.lat,
            lng = point.lng,
            display_name = place.display_name.as_deref().unwrap_or(""),
            "geocoder match"
        );
        Ok(Some(point))
    }
}

fn parse_point(place: &NominatimPlace) -> Result<GeoPoint, GeocodeError> {
    let invalid = || GeocodeError::InvalidCoordinate {
        lat: place.lat.clone(),
        lon: place.lon.clone(),
    };
    let lat = place.lat.trim().parse::<f64>().map_err(|_| invalid())?;
    let lng = place.lon.trim().parse::<f64>().map_err(|_| invalid())?;
    let point = GeoPoint::new(lat, lng);
    if point.is_valid() {
        Ok(point)
    } else {
        Err(invalid())
    }
}

impl Geocoder for NominatimClient {
    async fn search(&self, query: &GeoQuery) -> Result<Option<GeoPoint>, GeocodeError> {
        self.fetch(query).await
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
