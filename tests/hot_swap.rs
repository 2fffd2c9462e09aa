//! Reconfiguration while records are being emitted.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use logtree::{field, Level};

mod common;

#[test]
fn test_reconfigure_under_concurrent_emitter() {
    let (manager, capture) = common::manager(&common::memory_config(&["A"], "info"));
    let handle = manager.get_logger("svc/worker");
    let first = capture.writer("A");

    let stop = Arc::new(AtomicBool::new(false));
    let emitted = Arc::new(AtomicU64::new(0));
    let emitter = {
        let handle = handle.clone();
        let stop = Arc::clone(&stop);
        let emitted = Arc::clone(&emitted);
        thread::spawn(move || {
            let mut seq = 0u64;
            while !stop.load(Ordering::Relaxed) {
                let fields = [field::uint("seq", seq), field::string("pad", "x".repeat(64))];
                if seq % 2 == 0 {
                    handle.info("i", &fields);
                } else {
                    handle.error("e", &fields);
                }
                seq += 1;
                emitted.store(seq, Ordering::Relaxed);
            }
        })
    };

    while emitted.load(Ordering::Relaxed) < 100 {
        thread::yield_now();
    }
    manager
        .reconfigure(&common::memory_config(&["A"], "error"))
        .unwrap();

    let written_before_swap = first.lines().len();
    let second = capture.writer("A");
    let mark = emitted.load(Ordering::Relaxed);
    while emitted.load(Ordering::Relaxed) < mark + 200 {
        thread::yield_now();
    }
    stop.store(true, Ordering::Relaxed);
    emitter.join().unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(first.lines().len(), written_before_swap);
    assert_eq!(handle.min_level(), Level::Error);

    let before = common::records(&first);
    assert!(before.len() >= 100);
    for (expected, record) in before.iter().enumerate() {
        assert_eq!(record["seq"], expected as u64);
        let (msg, level) = if expected % 2 == 0 { ("i", "info") } else { ("e", "error") };
        assert_eq!(record["msg"], msg);
        assert_eq!(record["level"], level);
    }

    let after = common::records(&second);
    assert!(after.len() >= 100);
    let mut last_seq = before.len() as u64 - 1;
    for record in &after {
        assert_eq!(record["msg"], "e");
        assert_eq!(record["level"], "error");
        let seq = record["seq"].as_u64().unwrap();
        assert!(seq > last_seq);
        last_seq = seq;
    }
}

#[test]
fn test_handles_created_during_reconfiguration_see_a_consistent_tree() {
    let (manager, _capture) = common::manager(&common::memory_config(&["A"], "info"));

    let creators: Vec<_> = (0..4)
        .map(|t| {
            let manager = manager.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    let handle = manager.get_logger(&format!("t{t}/n{}", i % 20));
                    handle.debug("created", &[]);
                }
            })
        })
        .collect();

    for level in ["warn", "debug", "error"] {
        manager
            .reconfigure(&common::memory_config(&["A"], level))
            .unwrap();
        thread::sleep(Duration::from_millis(2));
    }
    for creator in creators {
        creator.join().unwrap();
    }

    for handle in manager.registry().handles() {
        assert_eq!(handle.min_level(), Level::Error, "{}", handle.name());
    }
    assert_eq!(manager.registry().handle_count(), 80);
}

#[test]
fn test_with_derivatives_follow_reconfiguration() {
    let (manager, capture) = common::manager(&common::memory_config(&["A"], "error"));
    let tagged = manager
        .get_logger("api")
        .with([field::string("request_id", "r-42")]);

    tagged.info("hidden", &[]);
    manager
        .reconfigure(&common::memory_config(&["A"], "info"))
        .unwrap();
    tagged.info("visible", &[]);

    let records = common::records(&capture.writer("A"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["msg"], "visible");
    assert_eq!(records[0]["request_id"], "r-42");
}
