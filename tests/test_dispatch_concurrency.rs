//! Concurrent first use of the dispatch cache

use std::sync::{Arc, Barrier};
use std::thread;
use typthon_bridge::{ConversionEngine, HostType, Interpreter, PrimitiveKind, Strategy};

const THREADS: usize = 8;

#[test]
fn test_concurrent_first_resolve_selects_once() {
    let engine = Arc::new(ConversionEngine::default());
    let target = HostType::array(&HostType::primitive(PrimitiveKind::F64), 2);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            let target = target.clone();
            thread::spawn(move || {
                barrier.wait();
                engine.resolve(&target)
            })
        })
        .collect();

    let entries: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(engine.cache().selections(), 1);
    assert_eq!(engine.cache().len(), 1);
    assert_eq!(entries[0].strategy, Strategy::MultiArray);
    for entry in &entries[1..] {
        assert!(Arc::ptr_eq(&entries[0], entry));
    }
}

#[test]
fn test_concurrent_distinct_types() {
    let engine = Arc::new(ConversionEngine::default());
    let types: Vec<HostType> = PrimitiveKind::ALL.iter().map(|k| HostType::primitive(*k)).collect();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            let types = types.clone();
            thread::spawn(move || {
                barrier.wait();
                engine.cache().warm(&types);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.cache().len(), types.len());
    assert_eq!(engine.cache().selections(), types.len());
}

#[test]
fn test_conversions_from_many_threads_share_the_cache() {
    let interp = Arc::new(Interpreter::new());
    let engine = Arc::new(ConversionEngine::default());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let interp = Arc::clone(&interp);
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let target = HostType::array(&HostType::primitive(PrimitiveKind::I64), 1);
                barrier.wait();

                let guard = interp.acquire();
                let py = guard.token();
                let value = py.list((0..=i as i128).map(|v| py.int(v)).collect());
                let converted = engine.foreign_to_host(py, &value, &target, false);
                converted.map(|host| match host {
                    typthon_bridge::HostValue::Array(array) => array.len(),
                    _ => 0,
                })
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Ok(i + 1));
    }

    let stats = engine.stats();
    assert_eq!(stats.to_host, THREADS);
    assert_eq!(stats.failures, 0);
    // The array type plus its element type
    assert_eq!(engine.cache().selections(), 2);
}
