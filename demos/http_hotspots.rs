//! Compute hotspots from a fleet API over HTTP.
//!
//! Run with: cargo run --example http_hotspots --features http -- <base_url> <region_id>...
//!
//! The API key is read from FLEET_API_KEY when set.

use hotspot_finder::{compute_hotspots_blocking, HotspotConfig, HttpSourceConfig};
use std::time::Instant;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(base_url) = args.next() else {
        eprintln!("usage: http_hotspots <base_url> <region_id>...");
        std::process::exit(2);
    };
    let region_ids: Vec<String> = args.collect();

    let source_config = HttpSourceConfig {
        base_url,
        api_key: std::env::var("FLEET_API_KEY").ok(),
        ..HttpSourceConfig::default()
    };

    println!("HTTP Hotspots");
    println!("=============");
    println!("API: {}", source_config.base_url);
    println!("Regions: {}", region_ids.len());
    println!();

    let start = Instant::now();
    match compute_hotspots_blocking(&source_config, &region_ids, &HotspotConfig::default()) {
        Ok(hotspots) => {
            println!("{} hotspots in {:?}", hotspots.len(), start.elapsed());
            for hotspot in &hotspots {
                let addresses: Vec<&str> = hotspot.points.iter().map(|p| p.address()).collect();
                println!(
                    "  ({:.5}, {:.5}) x{}: {:?}",
                    hotspot.centroid.latitude,
                    hotspot.centroid.longitude,
                    hotspot.len(),
                    addresses
                );
            }
        }
        Err(e) => {
            eprintln!("Failed: {}", e);
            std::process::exit(1);
        }
    }
}
