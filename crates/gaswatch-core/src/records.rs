//! The per-run station record and its run-level deduplication.

use std::collections::HashSet;

use rust_decimal::{Decimal, RoundingStrategy};

/// Address sentinel used when no street line could be isolated from a card.
pub const UNKNOWN_ADDRESS: &str = "Unknown Address";

/// Discount-rule sentinel for stations that match no loyalty brand.
pub const NO_DISCOUNT_RULE: &str = "-";

/// One observed price listing.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRecord {
    /// Display label of the zip the listing was found under.
    pub city: String,
    pub zip: String,
    /// Station display name with any trailing distance suffix removed.
    pub station: String,
    /// Street line plus zip, e.g. `"123 Main St, 21044"`.
    pub address: String,
    pub base_price: Decimal,
    /// `base_price` minus the loyalty discount, rounded to cents.
    pub net_price: Decimal,
    /// Brand that produced the discount, or [`NO_DISCOUNT_RULE`].
    pub discount_rule: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl StationRecord {
    /// Builds a record, deriving `net_price` from `base_price - discount`.
    ///
    /// A negative discount is treated as zero so `net_price <= base_price`
    /// always holds.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        city: String,
        zip: String,
        station: String,
        address: String,
        base_price: Decimal,
        discount: Decimal,
        discount_rule: String,
        coordinates: Option<(f64, f64)>,
    ) -> Self {
        let net_price = net_price(base_price, discount);
        let (latitude, longitude) = coordinates.unzip();
        Self {
            city,
            zip,
            station,
            address,
            base_price,
            net_price,
            discount_rule,
            latitude,
            longitude,
        }
    }
}

/// `round(base - discount, 2)`, with the discount clamped at zero.
#[must_use]
pub fn net_price(base_price: Decimal, discount: Decimal) -> Decimal {
    (base_price - discount.max(Decimal::ZERO))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Drops every record whose `(station, address)` pair was already seen,
/// keeping the first occurrence in encounter order.
#[must_use]
pub fn dedup_records(records: Vec<StationRecord>) -> Vec<StationRecord> {
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert((r.station.clone(), r.address.clone())))
        .collect()
}
