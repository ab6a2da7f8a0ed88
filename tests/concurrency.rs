use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_utils::thread;
use wirebox::{Resolver, ScopeContext, ServiceCollection};

#[test]
fn concurrent_first_resolves_construct_once() {
    struct Slow;

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    let mut sc = ServiceCollection::new();
    sc.add_long_factory::<Slow, _>(move |_| {
        std::thread::sleep(Duration::from_millis(50));
        calls_clone.fetch_add(1, Ordering::SeqCst);
        Slow
    });

    let sp = sc.build().unwrap();

    thread::scope(|s| {
        let mut handles = Vec::new();
        for _ in 0..100 {
            let sp = sp.clone();
            handles.push(s.spawn(move |_| sp.get_required::<Slow>()));
        }
        let instances: Vec<Arc<Slow>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        for instance in &instances[1..] {
            assert!(Arc::ptr_eq(&instances[0], instance));
        }
    })
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_scoped_resolves_once_per_scope() {
    struct State;

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<State, _>(move |_| {
        calls_clone.fetch_add(1, Ordering::SeqCst);
        State
    });

    let sp = sc.build().unwrap();
    let scope = sp.create_scope(ScopeContext::background()).unwrap();

    thread::scope(|s| {
        for _ in 0..16 {
            let scope = scope.clone();
            s.spawn(move |_| {
                let _ = scope.get_required::<State>();
            });
        }
    })
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // A second scope constructs its own.
    let other = sp.create_scope(ScopeContext::background()).unwrap();
    let _ = other.get_required::<State>();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn scopes_are_created_and_closed_concurrently() {
    struct PerRequest;

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<PerRequest, _>(|_| PerRequest);

    let sp = sc.build().unwrap();

    thread::scope(|s| {
        for _ in 0..32 {
            let sp = sp.clone();
            s.spawn(move |_| {
                let scope = sp.create_scope(ScopeContext::background()).unwrap();
                let _ = scope.get_required::<PerRequest>();
                scope.close().unwrap();
            });
        }
    })
    .unwrap();

    sp.close().unwrap();
}

#[test]
fn concurrent_close_collapses_to_one() {
    let sp = ServiceCollection::new().build().unwrap();
    let scope = sp.create_scope(ScopeContext::background()).unwrap();

    thread::scope(|s| {
        for _ in 0..8 {
            let scope = scope.clone();
            s.spawn(move |_| scope.close().unwrap());
        }
    })
    .unwrap();

    assert!(scope.is_closed());
}

#[test]
fn resolution_after_concurrent_close_is_refused() {
    struct Thing;

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<Thing, _>(|_| Thing);

    let sp = sc.build().unwrap();
    let scope = sp.create_scope(ScopeContext::background()).unwrap();

    thread::scope(|s| {
        let closer = scope.clone();
        s.spawn(move |_| closer.close().unwrap());
    })
    .unwrap();

    assert!(scope.get::<Thing>().is_err());
}

#[test]
fn distinct_long_bindings_resolve_in_parallel() {
    struct A;
    struct B;

    let mut sc = ServiceCollection::new();
    sc.add_long_factory::<A, _>(|_| {
        std::thread::sleep(Duration::from_millis(20));
        A
    });
    sc.add_long_factory::<B, _>(|_| {
        std::thread::sleep(Duration::from_millis(20));
        B
    });

    let sp = sc.build().unwrap();

    let start = std::time::Instant::now();
    thread::scope(|s| {
        let p = sp.clone();
        s.spawn(move |_| p.get_required::<A>());
        let p = sp.clone();
        s.spawn(move |_| p.get_required::<B>());
    })
    .unwrap();

    // Two 20ms constructors on two threads should overlap.
    assert!(start.elapsed() < Duration::from_millis(200));
}
