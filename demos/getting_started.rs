use bytes::Bytes;
use geomem::{BoundingBox, Point, Store};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug to see coverage decisions)
    env_logger::init();

    println!("=== geomem - Getting Started ===\n");

    let store: Store<Bytes> = Store::new();
    println!("✓ Created store at geohash precision {}\n", store.config().geohash_precision);

    // === INSERTING POINTS ===
    println!("1. Inserting points");
    println!("-------------------");

    store.add(40.7128, -74.0060, 1_000, Bytes::from_static(b"New York"), None)?;
    store.add(51.5074, -0.1278, 1_010, Bytes::from_static(b"London"), None)?;
    store.add(48.8566, 2.3522, 1_020, Bytes::from_static(b"Paris"), None)?;

    // geo::Point uses (lon, lat)
    let brooklyn = Point::new(-73.9442, 40.6782);
    store.add_point(&brooklyn, 1_030, Bytes::from_static(b"Brooklyn"), None)?;

    let stats = store.stats();
    println!(
        "   Added {} points as {} records in {} cells\n",
        stats.points_added, stats.primary_records, stats.primary_cells
    );

    // === BOUNDING BOX QUERIES ===
    println!("2. Bounding box queries");
    println!("-----------------------");

    let new_york_area = BoundingBox::new(41.0, -74.3, 40.5, -73.7);
    for record in store.find(&new_york_area, 0..2_000)? {
        println!(
            "   {} at ({:.4}, {:.4}) t={}",
            String::from_utf8_lossy(record.payload()),
            record.lat(),
            record.lon(),
            record.time()
        );
    }

    let europe = BoundingBox::new(60.0, -10.0, 40.0, 20.0);
    let in_europe = store.find(&europe, 0..2_000)?.count();
    println!("   {} cities in Europe", in_europe);

    // Time ranges are half-open: [start, finish)
    let early = store.find(&europe, 1_000..1_020)?.count();
    println!("   {} of them before t=1020\n", early);

    println!("=== Done ===");
    Ok(())
}
