//! Console report printed after a scrape.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use gaswatch_core::StationRecord;

const RULE: &str =
    "================================================================================";
const THIN_RULE: &str =
    "--------------------------------------------------------------------------------";

/// Two views over the same records: per city (cheapest first) and the
/// whole zone sorted by net price.
pub(crate) fn render_report(records: &[StationRecord]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\n{RULE}\nGROUPED BY CITY\n{RULE}");
    let mut by_city: BTreeMap<&str, Vec<&StationRecord>> = BTreeMap::new();
    for record in records {
        by_city.entry(record.city.as_str()).or_default().push(record);
    }
    for (city, mut group) in by_city {
        group.sort_by(|a, b| a.net_price.cmp(&b.net_price));
        let _ = writeln!(out, "\n>> {city}\n{THIN_RULE}");
        write_table(&mut out, &group);
    }

    let _ = writeln!(out, "\n{RULE}\nCHEAPEST OVERALL\n{RULE}");
    let mut sorted: Vec<&StationRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.net_price.cmp(&b.net_price));
    write_table(&mut out, &sorted);

    out
}

fn write_table(out: &mut String, rows: &[&StationRecord]) {
    let _ = writeln!(
        out,
        "{:<26}{:<7}{:<7}{:<16}{:<40}City",
        "Station", "Net", "Base", "Discount", "Address"
    );
    for r in rows {
        let _ = writeln!(
            out,
            "{:<26}{:<7}{:<7}{:<16}{:<40}{}",
            truncate(&r.station, 25),
            format!("{:.2}", r.net_price),
            format!("{:.2}", r.base_price),
            truncate(&r.discount_rule, 15),
            truncate(&r.address, 39),
            r.city
        );
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        t.push('~');
        t
    }
}
