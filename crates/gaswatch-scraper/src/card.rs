//! Station card location.
//!
//! A listing page has no stable card markup, so a card is found by walking up
//! from a price text node to the nearest `div` that contains a station
//! heading. Price-trend widgets also contain prices; any ancestor whose class
//! mentions "trend" marks the price as not belonging to a listing.

use std::sync::LazyLock;

use regex::Regex;

use crate::dom::{class_tokens, find_descendant, text_fragments, Node};

pub const DEFAULT_HEADING_TAG: &str = "h3";

/// Ancestors examined above the price node before giving up.
pub const MAX_ASCENT: usize = 8;

/// Fallback display name when a card heading yields no text.
pub const UNKNOWN_STATION: &str = "Unknown";

/// Trailing distance such as `0.4 mi` or `2 miles away`.
static DISTANCE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(\.\d+)?\s*mi.*$").expect("valid distance regex"));

#[derive(Debug, Clone)]
pub struct CardLocator {
    heading_tag: String,
    max_ascent: usize,
}

impl Default for CardLocator {
    fn default() -> Self {
        Self::new(DEFAULT_HEADING_TAG)
    }
}

impl CardLocator {
    #[must_use]
    pub fn new(heading_tag: &str) -> Self {
        Self {
            heading_tag: heading_tag.to_ascii_lowercase(),
            max_ascent: MAX_ASCENT,
        }
    }

    /// Enclosing card of a price text node, or `None` when the price sits in
    /// a trend panel or no card is found within [`MAX_ASCENT`] ancestors.
    pub fn locate<'a, N: Node<'a>>(&self, price_node: N) -> Option<N> {
        let mut current = price_node.parent();
        for _ in 0..self.max_ascent {
            let node = current?;
            if is_trend_panel(node) {
                return None;
            }
            if node.tag() == Some("div") && find_descendant(node, &self.heading_tag).is_some() {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }

    /// Cleaned display name from the card's first heading.
    pub fn station_name<'a, N: Node<'a>>(&self, card: N) -> String {
        let raw = find_descendant(card, &self.heading_tag)
            .map(|heading| text_fragments(heading).join(" "))
            .unwrap_or_default();
        clean_station_name(&raw)
    }
}

fn is_trend_panel<'a, N: Node<'a>>(node: N) -> bool {
    class_tokens(node).any(|token| token.to_ascii_lowercase().contains("trend"))
}

/// Card text flattened to one fragment per line.
pub fn card_text<'a, N: Node<'a>>(card: N) -> String {
    text_fragments(card).join("\n")
}

/// Collapses whitespace and strips a trailing distance suffix.
#[must_use]
pub fn clean_station_name(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let stripped = DISTANCE_SUFFIX_RE.replace(&collapsed, "");
    let name = stripped.trim();
    if name.is_empty() {
        UNKNOWN_STATION.to_string()
    } else {
        name.to_string()
    }
}
