//! Street-address isolation from flattened card text.
//!
//! Card text mixes the station name, the address, fuel grades, payment
//! badges and "updated N minutes ago" stamps with no reliable structure. The
//! first line that starts with a house number and survives the noise filter
//! is taken as the street address.

use std::sync::LazyLock;

use gaswatch_core::UNKNOWN_ADDRESS;
use regex::Regex;

/// Lines containing any of these are never addresses.
const NOISE_KEYWORDS: &[&str] = &[
    "Regular",
    "Premium",
    "Diesel",
    "Midgrade",
    "UNL88",
    "Cash",
    "Credit",
    "Payment",
    "Station Brand",
    "Hours",
];

/// Street-type words the listing site truncates by one letter.
const TRUNCATIONS: &[(&str, &str)] = &[("Roa", "Road"), ("Stree", "Street"), ("Avenu", "Avenue")];

static TRUNCATION_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    TRUNCATIONS
        .iter()
        .map(|(short, full)| {
            let re = Regex::new(&format!(r"\b{short}\b")).expect("valid truncation regex");
            (re, *full)
        })
        .collect()
});

static LINE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}|\r?\n").expect("valid line split regex"));

/// Whole words only, so "Chicago Ave" survives.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(ago|updated)\b").expect("valid relative time regex"));

/// A bare distance badge such as `2 mi`.
static DISTANCE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?\s*mi(les?)?\.?$").expect("valid distance regex"));

static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,5}\s+[\w.\s\-,']+").expect("valid address regex"));

/// Most plausible street line in `card_text`, or [`UNKNOWN_ADDRESS`].
///
/// The result always starts with a digit unless it is the sentinel.
#[must_use]
pub fn extract(card_text: &str) -> String {
    let mut text = card_text.to_string();
    for (re, full) in TRUNCATION_RES.iter() {
        text = re.replace_all(&text, *full).into_owned();
    }

    LINE_SPLIT_RE
        .split(&text)
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_noise(line))
        .find_map(|line| ADDRESS_RE.find(line).map(|m| m.as_str().trim().to_string()))
        .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string())
}

fn is_noise(line: &str) -> bool {
    NOISE_KEYWORDS.iter().any(|kw| line.contains(kw))
        || RELATIVE_TIME_RE.is_match(line)
        || DISTANCE_LINE_RE.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_numbered_line() {
        let text = "Royal Farms\n0.4 mi\n123 Main St\nColumbia, MD\n$3.29";
        assert_eq!(extract(text), "123 Main St");
    }

    #[test]
    fn ignores_price_and_grade_lines() {
        let text = "123 Main St\n$3.459\nRegular Cash";
        assert_eq!(extract(text), "123 Main St");
    }

    #[test]
    fn splits_on_runs_of_whitespace() {
        let text = "Shell    4500 Dorsey Run Rd    Jessup, MD";
        assert_eq!(extract(text), "4500 Dorsey Run Rd");
    }

    #[test]
    fn expands_truncated_street_types() {
        assert_eq!(extract("Exxon\n8 Ridge Roa"), "8 Ridge Road");
        assert_eq!(extract("Exxon\n77 Main Stree"), "77 Main Street");
        assert_eq!(extract("Mobil\n1010 Park Avenu"), "1010 Park Avenue");
    }

    #[test]
    fn leaves_complete_words_alone() {
        assert_eq!(extract("12 Roanoke Street"), "12 Roanoke Street");
        assert_eq!(extract("5 Avenue Road"), "5 Avenue Road");
    }

    #[test]
    fn does_not_require_street_suffix() {
        assert_eq!(extract("Sunoco\n1 Montauk Highway East"), "1 Montauk Highway East");
        assert_eq!(extract("BP\n250 Route 25A"), "250 Route 25A");
    }

    #[test]
    fn noise_lines_are_skipped_even_with_house_numbers() {
        let text = "24 Hours\n10 Minutes Ago\n3 Payment Options\n2 mi\n9 Elm Ave";
        assert_eq!(extract(text), "9 Elm Ave");
    }

    #[test]
    fn relative_time_filter_matches_whole_words() {
        assert_eq!(extract("400 Chicago Ave"), "400 Chicago Ave");
        assert_eq!(extract("Updated 3 hours ago\n400 Chicago Ave"), "400 Chicago Ave");
    }

    #[test]
    fn keeps_punctuation_inside_address() {
        assert_eq!(
            extract("High's\n10 St. Mary's Ct, Suite-2"),
            "10 St. Mary's Ct, Suite-2"
        );
    }

    #[test]
    fn unknown_when_nothing_matches() {
        assert_eq!(extract(""), UNKNOWN_ADDRESS);
        assert_eq!(extract("Wawa\nColumbia, MD\n$3.19"), UNKNOWN_ADDRESS);
        assert_eq!(extract("123456 Too Long Number"), UNKNOWN_ADDRESS);
    }

    #[test]
    fn result_starts_with_digit_or_is_sentinel() {
        let samples = [
            "",
            "   ",
            "\n\n\n",
            "$3.29",
            "99",
            "99 ",
            "1 a",
            "Exxon  ·  12 Main St",
            "☃ 12 Main St",
            "12\u{a0}Main St",
        ];
        for sample in samples {
            let out = extract(sample);
            assert!(
                out == UNKNOWN_ADDRESS || out.starts_with(|c: char| c.is_ascii_digit()),
                "{sample:?} -> {out:?}"
            );
        }
    }
}
