//! Example of evaluating many independent point sets at once.
//!
//! Run with: cargo run --example batch_hotspots --features parallel

use hotspot_finder::{find_hotspots_batch_parallel, GeoPoint, DEFAULT_RADIUS_KM};
use std::time::Instant;

fn main() {
    println!("Batch Hotspot Example\n");

    let centers = [
        ("kassel", 51.3127, 9.4797),
        ("goettingen", 51.5413, 9.9158),
        ("fulda", 50.5558, 9.6808),
        ("marburg", 50.8021, 8.7667),
    ];

    // Five points per city, spread over a few kilometers
    let point_sets: Vec<Vec<GeoPoint>> = centers
        .iter()
        .map(|(name, lat, lng)| {
            (0..5)
                .filter_map(|i| {
                    let f = i as f64;
                    GeoPoint::new(
                        format!("{name}-{i}"),
                        lat + (f * 1.3).sin() * 0.02,
                        lng + (f * 0.7).cos() * 0.02,
                        *name,
                    )
                    .ok()
                })
                .collect()
        })
        .collect();

    let start = Instant::now();
    let results = find_hotspots_batch_parallel(&point_sets, DEFAULT_RADIUS_KM);
    let elapsed = start.elapsed();

    println!("Evaluated {} point sets in {:?}\n", point_sets.len(), elapsed);

    for ((name, _, _), hotspots) in centers.iter().zip(&results) {
        let sizes: Vec<usize> = hotspots.iter().map(|h| h.len()).collect();
        println!("  {}: {} hotspots, sizes {:?}", name, hotspots.len(), sizes);
    }
}
