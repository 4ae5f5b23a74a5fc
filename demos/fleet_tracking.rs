use geomem::{BoundingBox, Config, Store};
use std::sync::Arc;
use std::thread;

#[derive(Debug)]
struct Ping {
    speed_kmh: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== geomem - Fleet Tracking ===\n");

    let config = Config::default().with_geohash_precision(9);
    let store: Arc<Store<Ping>> = Arc::new(Store::with_config(config)?);

    // Four vehicles reporting concurrently across the Bay Area
    let handles: Vec<_> = (0..4)
        .map(|v| {
            let store = Arc::clone(&store);
            thread::spawn(move || -> geomem::Result<()> {
                let id = format!("vehicle-{}", v);
                for step in 0..60 {
                    let lat = 37.60 + v as f64 * 0.05 + step as f64 * 0.002;
                    let lon = -122.50 + step as f64 * 0.004;
                    let ping = Ping {
                        speed_kmh: 30.0 + (step % 7) as f64 * 5.0,
                    };
                    store.add(lat, lon, step * 60, ping, Some(id.clone()))?;
                }
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("tracking thread panicked")?;
    }

    let stats = store.stats();
    println!(
        "Tracked {} vehicles, {} pings, {} records\n",
        stats.identifiers, stats.points_added, stats.primary_records
    );

    let downtown = BoundingBox::new(37.80, -122.45, 37.70, -122.35);
    let first_half_hour = 0..1_800;

    let in_downtown = store.find(&downtown, first_half_hour.clone())?.count();
    println!("Pings downtown in the first 30 minutes: {}", in_downtown);

    for id in ["vehicle-0", "vehicle-2"] {
        let pings: Vec<_> = store
            .find_by_id(&id.to_string(), &downtown, first_half_hour.clone())?
            .collect();
        let avg = if pings.is_empty() {
            0.0
        } else {
            pings.iter().map(|p| p.payload().speed_kmh).sum::<f64>() / pings.len() as f64
        };
        println!("  {}: {} pings, avg speed {:.1} km/h", id, pings.len(), avg);
    }

    Ok(())
}
