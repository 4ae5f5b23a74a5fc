use geomem::{BoundingBox, Store};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;
const PER_THREAD: usize = 250;

fn region() -> BoundingBox {
    BoundingBox::new(41.0, -75.0, 40.0, -73.0)
}

fn point_for(thread: usize, i: usize) -> (f64, f64, i64) {
    let n = thread * PER_THREAD + i;
    let lat = 40.0 + (n % 100) as f64 * 0.01;
    let lon = -75.0 + (n / 100) as f64 * 0.05;
    (lat, lon, n as i64)
}

#[test]
fn test_concurrent_adds_all_visible_exactly_once() {
    let _ = env_logger::builder().is_test(true).try_init();

    let store: Arc<Store<usize>> = Arc::new(Store::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_THREAD {
                    let (lat, lon, time) = point_for(t, i);
                    store
                        .add(lat, lon, time, t * PER_THREAD + i, Some(format!("t{}", t)))
                        .expect("add failed");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let total = THREADS * PER_THREAD;
    let found: Vec<usize> = store
        .find(&region(), 0..total as i64)
        .unwrap()
        .map(|r| *r.payload())
        .collect();
    let unique: HashSet<usize> = found.iter().copied().collect();
    assert_eq!(found.len(), total);
    assert_eq!(unique.len(), total);

    for t in 0..THREADS {
        let id = format!("t{}", t);
        let scoped: HashSet<usize> = store
            .find_by_id(&id, &region(), 0..total as i64)
            .unwrap()
            .map(|r| *r.payload())
            .collect();
        let expected: HashSet<usize> = (t * PER_THREAD..(t + 1) * PER_THREAD).collect();
        assert_eq!(scoped, expected);
    }

    let stats = store.stats();
    assert_eq!(stats.points_added, total as u64);
    assert_eq!(stats.primary_records, total * stats.geohash_precision);
    assert_eq!(stats.identifiers, THREADS);
}

#[test]
fn test_concurrent_first_use_of_identifier() {
    let store: Arc<Store<usize, u32>> = Arc::new(Store::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    thread::scope(|s| {
        for t in 0..THREADS {
            let store = &store;
            let barrier = &barrier;
            s.spawn(move || {
                barrier.wait();
                // Every thread races to create the same secondary index.
                store.add(40.5, -74.0, t as i64, t, Some(42)).unwrap();
            });
        }
    });

    assert_eq!(store.identifiers(), vec![42]);
    let scoped = store.find_by_id(&42, &region(), 0..THREADS as i64).unwrap();
    assert_eq!(scoped.count(), THREADS);
}

#[test]
fn test_queries_run_alongside_writers() {
    let store: Arc<Store<usize>> = Arc::new(Store::new());
    let total = THREADS * PER_THREAD;

    thread::scope(|s| {
        for t in 0..THREADS / 2 {
            let store = &store;
            s.spawn(move || {
                for i in 0..PER_THREAD * 2 {
                    let (lat, lon, time) = point_for(t * 2, i);
                    store.add(lat, lon, time, time as usize, None).unwrap();
                }
            });
        }

        for _ in 0..2 {
            let store = &store;
            s.spawn(move || {
                let mut last = 0;
                for _ in 0..50 {
                    let seen = store.find(&region(), 0..total as i64).unwrap().count();
                    assert!(seen <= total);
                    // Completed inserts never disappear.
                    assert!(seen >= last);
                    last = seen;
                }
            });
        }
    });

    assert_eq!(store.find(&region(), 0..total as i64).unwrap().count(), total);
}
