use thiserror::Error;

/// Errors returned by a geocoding backend.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Network, timeout, or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429; the provider wants us to slow down.
    #[error("rate limited by geocoder (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A result carried a latitude/longitude that is not a finite number in range.
    #[error("invalid coordinate in geocoder response: lat={lat}, lon={lon}")]
    InvalidCoordinate { lat: String, lon: String },

    #[error("invalid geocoder base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
