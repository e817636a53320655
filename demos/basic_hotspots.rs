//! Basic example of finding hotspots across a few regions.
//!
//! Run with: RUST_LOG=debug cargo run --example basic_hotspots

use hotspot_finder::{
    compute_hotspots, geo_utils, HotspotConfig, InMemorySource, RawOrigin, SourceRecord,
};

fn order(region: &str, n: usize, lat: f64, lng: f64, street: &str) -> SourceRecord {
    SourceRecord {
        id: format!("{region}order{n}"),
        region_id: Some(region.to_string()),
        origin: Some(RawOrigin {
            id: format!("{region}addr{n}"),
            latitude: lat,
            longitude: lng,
            streetname: street.to_string(),
            zipcode: "34117".to_string(),
            country: "DE".to_string(),
        }),
    }
}

fn main() {
    env_logger::init();

    let mut source = InMemorySource::new();

    // Kassel city center: busy, mostly around Koenigsplatz
    source.extend(
        "kassel",
        vec![
            order("kassel", 0, 51.3127, 9.4797, "Koenigsplatz"),
            order("kassel", 1, 51.3140, 9.4810, "Koenigsstrasse"),
            order("kassel", 2, 51.3115, 9.4785, "Obere Koenigsstrasse"),
            order("kassel", 3, 51.3132, 9.4770, "Kurfuerstenstrasse"),
            // Wilhelmshoehe, ~5 km west
            order("kassel", 4, 51.3157, 9.4078, "Wilhelmshoeher Allee"),
            order("kassel", 5, 51.3120, 9.4825, "Friedrichsplatz"),
        ],
    );

    // Baunatal: quiet, below the activity threshold
    source.extend(
        "baunatal",
        vec![
            order("baunatal", 0, 51.2560, 9.4180, "Marktplatz"),
            order("baunatal", 1, 51.2570, 9.4190, "Marktplatz"),
        ],
    );

    let config = HotspotConfig::default();
    let regions = vec!["kassel".to_string(), "baunatal".to_string()];

    println!("Hotspot Detection Example\n");
    println!(
        "Config: radius={}km, min_region_records={}, max_representatives={}\n",
        config.radius_km, config.min_region_records, config.max_representatives
    );

    let hotspots = match futures::executor::block_on(compute_hotspots(&source, &regions, &config)) {
        Ok(hotspots) => hotspots,
        Err(e) => {
            eprintln!("Hotspot computation failed: {}", e);
            return;
        }
    };

    if hotspots.is_empty() {
        println!("No region is busy enough for hotspots");
        return;
    }

    for (i, hotspot) in hotspots.iter().enumerate() {
        println!(
            "{}. {} points around ({:.5}, {:.5}), furthest {:.0}m from center",
            i + 1,
            hotspot.len(),
            hotspot.centroid.latitude,
            hotspot.centroid.longitude,
            hotspot.max_member_distance_km() * 1000.0
        );
        for point in &hotspot.points {
            println!(
                "   - {} ({:.0}m)",
                point.address(),
                geo_utils::distance_to_centroid_km(point, &hotspot.centroid) * 1000.0
            );
        }
    }
}
