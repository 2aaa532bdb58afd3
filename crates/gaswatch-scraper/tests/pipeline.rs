//! End-to-end: saved pages on disk -> snapshot -> CSV files -> retention.

use std::fs;
use std::time::Duration;

use chrono::NaiveDate;
use gaswatch_core::{BrandRules, RegionTable};
use gaswatch_geocode::{GeoResolver, NullGeocoder};
use gaswatch_scraper::{export_snapshot, reap, DirectoryPageSource, SnapshotBuilder};

const SEVERN: &str = r#"<html><body>
<div class="list">
  <div class="station"><h3>Royal Farms 1.1 mi</h3><div>8 Ridge Roa</div><span>$3.09</span></div>
  <div class="station"><h3>BJ's Wholesale</h3><div>7 Arundel Mills Blvd</div><span>$2.89</span></div>
  <div class="station"><h3>Wawa</h3><div>1 Dorsey Rd</div><span>$3.15</span></div>
</div>
</body></html>"#;

const HANOVER: &str = r#"<html><body>
<div class="station"><h3>Exxon</h3><div>7000 Arundel Mills Circle</div><span>$3.25</span></div>
</body></html>"#;

const JESSUP_NO_PRICES: &str = "<html><body><p>Something went wrong</p></body></html>";

#[tokio::test]
async fn commute_region_end_to_end() {
    let work = tempfile::tempdir().unwrap();
    let pages_dir = work.path().join("pages");
    fs::create_dir_all(&pages_dir).unwrap();
    fs::write(pages_dir.join("21144.html"), SEVERN).unwrap();
    fs::write(pages_dir.join("21076.html"), HANOVER).unwrap();
    fs::write(pages_dir.join("20794.html"), JESSUP_NO_PRICES).unwrap();
    // 20763 and 20723 have no saved page.

    let table = RegionTable::builtin();
    let region = table.get("4").expect("commute region");
    let zone = region.to_zone();
    let rules = BrandRules::default();
    let mut resolver = GeoResolver::new(NullGeocoder, Duration::ZERO);
    let pages = DirectoryPageSource::new(&pages_dir);

    let outcome = SnapshotBuilder::new(&rules, &mut resolver)
        .build_snapshot(&zone, table.labels(), &pages)
        .await
        .unwrap();

    let stations: Vec<&str> = outcome.records.iter().map(|r| r.station.as_str()).collect();
    assert_eq!(stations, vec!["Royal Farms", "Wawa", "Exxon"]);
    assert_eq!(outcome.records[0].address, "8 Ridge Road, 21144");
    assert_eq!(outcome.records[0].city, "Severn");
    assert!(outcome.records.iter().all(|r| r.latitude.is_none()));
    assert_eq!(outcome.zips.len(), 5);
    assert_eq!(outcome.zips_without_data().count(), 3);

    let history_dir = work.path().join("history");
    let morning = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let evening = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(18, 30, 0)
        .unwrap();
    let slug = zone.slug();
    export_snapshot(&outcome.records, &slug, &history_dir, work.path(), morning).unwrap();
    let last = export_snapshot(&outcome.records, &slug, &history_dir, work.path(), evening).unwrap();

    let latest = fs::read_to_string(&last.latest).unwrap();
    assert!(latest.starts_with("City,Zip,Station,Address,Base,Net,Discount,Lat,Long\n"));
    assert!(latest.contains("Severn,21144,Royal Farms,\"8 Ridge Road, 21144\",3.09,2.99,Royal Farms,,"));
    assert!(!latest.contains("BJ's"));

    let summary = reap(&history_dir, false);
    assert_eq!(summary.deleted_count(), 1);
    assert_eq!(summary.kept, vec![last.history.clone()]);
    assert!(last.history.exists());
}
