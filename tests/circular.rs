use std::sync::Arc;

use wirebox::{
    BuildError, BuildOptions, DiError, Resolver, ResolutionError, ServiceCollection,
};

#[derive(Debug)]
struct A {
    _b: Option<Arc<B>>,
}
#[derive(Debug)]
struct B {
    _a: Option<Arc<A>>,
}

fn cyclic_collection() -> ServiceCollection {
    let mut sc = ServiceCollection::new();
    sc.add_long_try_factory::<A, _>(|ctx| {
        Ok(A {
            _b: Some(ctx.get::<B>()?),
        })
    })
    .depends_on::<B>();
    sc.add_long_try_factory::<B, _>(|ctx| {
        Ok(B {
            _a: Some(ctx.get::<A>()?),
        })
    })
    .depends_on::<A>();
    sc
}

#[test]
fn build_rejects_declared_cycle() {
    match cyclic_collection().build() {
        Err(BuildError::CircularDependency { path }) => {
            assert!(path.mentions(std::any::type_name::<A>()));
            assert!(path.mentions(std::any::type_name::<B>()));
        }
        other => panic!("expected circular dependency at build, got {other:?}"),
    }
}

#[test]
fn deferred_validation_detects_cycle_at_resolve() {
    let sp = cyclic_collection()
        .build_with(BuildOptions::default().defer_validation(true))
        .unwrap();

    match sp.get::<A>() {
        Err(DiError::Resolution(ResolutionError::CircularDependency { path })) => {
            assert!(path.mentions(std::any::type_name::<A>()));
            assert!(path.mentions(std::any::type_name::<B>()));
            // Path ends where it re-entered.
            assert_eq!(path.0.first(), path.0.last());
        }
        other => panic!("expected circular dependency at resolve, got {other:?}"),
    }
}

#[test]
fn self_reference_is_a_cycle() {
    #[derive(Debug)]
    struct Selfish;

    let mut sc = ServiceCollection::new();
    sc.add_long_try_factory::<Selfish, _>(|ctx| {
        let _ = ctx.get::<Selfish>()?;
        Ok(Selfish)
    });

    let sp = sc
        .build_with(BuildOptions::default().defer_validation(true))
        .unwrap();

    match sp.get::<Selfish>() {
        Err(DiError::Resolution(ResolutionError::CircularDependency { path })) => {
            assert_eq!(path.0.len(), 2);
        }
        other => panic!("expected circular dependency, got {other:?}"),
    }
}

#[test]
fn declared_self_loop_is_rejected_at_build() {
    struct Selfish;

    let mut sc = ServiceCollection::new();
    sc.add_long_factory::<Selfish, _>(|_| Selfish)
        .depends_on::<Selfish>();

    match sc.build() {
        Err(BuildError::CircularDependency { path }) => {
            assert_eq!(path.0.len(), 2);
        }
        other => panic!("expected circular dependency, got {other:?}"),
    }
}

#[test]
fn failed_cycle_leaves_container_usable() {
    struct Fine;

    let mut sc = cyclic_collection();
    sc.add_long(Fine);

    let sp = sc
        .build_with(BuildOptions::default().defer_validation(true))
        .unwrap();

    assert!(sp.get::<A>().is_err());
    // Unrelated bindings still resolve.
    assert!(sp.get::<Fine>().is_ok());
    // And the failed node can be retried (still failing, but cleanly).
    assert!(sp.get::<A>().is_err());
}

#[test]
fn depth_limit_bounds_recursion() {
    #[derive(Debug)]
    struct Link;

    const KEYS: [&str; 6] = ["k0", "k1", "k2", "k3", "k4", "k5"];

    let mut sc = ServiceCollection::new();
    for i in 0..KEYS.len() {
        let next = if i + 1 < KEYS.len() { Some(KEYS[i + 1]) } else { None };
        sc.add_long_try_factory::<Link, _>(move |ctx| {
            if let Some(next) = next {
                let _ = ctx.get_keyed::<Link>(next)?;
            }
            Ok(Link)
        })
        .with_key(KEYS[i]);
    }

    let sp = sc
        .build_with(BuildOptions::default().max_resolution_depth(3))
        .unwrap();

    match sp.get_keyed::<Link>("k0") {
        Err(DiError::Resolution(ResolutionError::MaxDepth { limit, .. })) => {
            assert_eq!(limit, 3);
        }
        other => panic!("expected depth limit, got {other:?}"),
    }

    // A shallow entry point stays within the bound.
    assert!(sp.get_keyed::<Link>("k4").is_ok());
}
