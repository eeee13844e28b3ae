//! Integration tests against live STAC catalogs.
//!
//! Every test needs network access and is marked `#[ignore]`.
//! Run with: `cargo test -p glofscan-cloud -- --ignored`

use chrono::NaiveDate;
use geo::Coord;

use glofscan_cloud::elevation::COPERNICUS_DEM_COLLECTION;
use glofscan_cloud::landsat::{asset_key, LANDSAT_COLLECTION};
use glofscan_cloud::{StacCatalog, StacClient, StacClientOptions, StacElevation, StacSearchParams};
use glofscan_core::source::{Band, ElevationModel};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Landsat scenes over Imja Tsho for one dry season.
#[tokio::test]
#[ignore]
async fn stac_planetary_computer_landsat() {
    let client = StacClient::new(StacCatalog::PlanetaryComputer, StacClientOptions::default())
        .expect("failed to create client");

    let params = StacSearchParams::new()
        .bbox(86.90, 27.88, 86.96, 27.92)
        .dates(date(2015, 10, 1), date(2015, 12, 31))
        .collections(&[LANDSAT_COLLECTION])
        .max_cloud_cover(80.0)
        .limit(10);

    let results = client.search(&params).await.expect("search failed");

    println!("Found {} items (matched: {:?})", results.len(), results.number_matched);
    assert!(!results.is_empty(), "should find at least one scene");

    for item in &results.features {
        assert!(item.acquired().is_some(), "item should have an acquisition date");
        assert!(item.asset(asset_key(Band::Green)).is_some(), "item should have a green band");
        assert!(item.asset("qa_pixel").is_some(), "item should have a QA band");
    }
}

/// Paginated search stops at `max_items`.
#[tokio::test]
#[ignore]
async fn stac_paginated_search() {
    let opts = StacClientOptions {
        page_size: 5,
        max_items: 15,
        ..StacClientOptions::default()
    };
    let client = StacClient::new(StacCatalog::EarthSearch, opts).expect("failed to create client");

    let params = StacSearchParams::new()
        .bbox(86.90, 27.88, 86.96, 27.92)
        .dates(date(2014, 1, 1), date(2016, 12, 31))
        .collections(&[LANDSAT_COLLECTION]);

    let items = client.search_all(&params).await.expect("search_all failed");

    println!("Fetched {} items across pages", items.len());
    assert!(items.len() > 5, "should have fetched more than one page");
    assert!(items.len() <= 15, "should respect max_items");
}

/// DEM tiles are found and sampled near Everest base camp.
#[test]
#[ignore]
fn stac_copernicus_dem_elevation() {
    let dem = StacElevation::new(StacCatalog::PlanetaryComputer, StacClientOptions::default(), 4)
        .expect("failed to create elevation source")
        .with_collection(COPERNICUS_DEM_COLLECTION);

    let values = dem
        .query_elevation(&[Coord { x: 86.93, y: 27.90 }, Coord { x: 86.85, y: 28.00 }])
        .expect("elevation query failed");

    println!("Elevations: {:?}", values);
    let lake = values[0].expect("lake point should have an elevation");
    assert!(lake > 4000.0 && lake < 5500.0);
}
