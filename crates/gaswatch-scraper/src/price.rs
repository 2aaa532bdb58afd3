use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::dom::Node;

/// `$` + optional whitespace + a price in `[2.00, 5.99]`, not followed by a
/// further digit, so `$3.459` is not read as `$3.45`.
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*([2-5]\.\d{2})(?:[^\d]|$)").expect("valid price regex"));

/// First price in `text`, if any.
#[must_use]
pub fn parse_price(text: &str) -> Option<Decimal> {
    let caps = PRICE_RE.captures(text)?;
    Decimal::from_str(caps.get(1)?.as_str()).ok()
}

/// A text node carrying a price, paired with the parsed amount.
#[derive(Debug, Clone, Copy)]
pub struct PriceHit<N> {
    pub node: N,
    pub price: Decimal,
}

/// Every text node in `nodes` whose text contains a price, in input order.
pub fn find_prices<'a, N, I>(nodes: I) -> Vec<PriceHit<N>>
where
    N: Node<'a>,
    I: IntoIterator<Item = N>,
{
    nodes
        .into_iter()
        .filter_map(|node| {
            let price = parse_price(node.text()?)?;
            Some(PriceHit { node, price })
        })
        .collect()
}
