use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use wirebox::{
    from_context, BuildOptions, CancellationToken, DiError, Resolver, ResolutionError,
    ScopeContext, ServiceCollection,
};

#[test]
fn from_context_returns_the_creating_scope() {
    let sp = ServiceCollection::new().build().unwrap();
    let scope = sp.create_scope(ScopeContext::background()).unwrap();

    let recovered = from_context(scope.context()).unwrap();
    assert_eq!(recovered.id(), scope.id());
}

#[test]
fn from_context_sees_through_layered_values() {
    let sp = ServiceCollection::new().build().unwrap();
    let scope = sp.create_scope(ScopeContext::background()).unwrap();

    // A collaborator layers more values on the propagated context.
    let downstream = scope
        .context()
        .with_value("request-id", "r-17".to_string())
        .with_value("attempt", 3u32);

    let recovered = from_context(&downstream).unwrap();
    assert_eq!(recovered.id(), scope.id());
    assert_eq!(*downstream.value::<String>("request-id").unwrap(), "r-17");
    assert_eq!(*downstream.value::<u32>("attempt").unwrap(), 3);
}

#[test]
fn from_context_without_scope_fails() {
    let ctx = ScopeContext::background().with_value("k", 1u8);
    match from_context(&ctx) {
        Err(DiError::NoScopeInContext) => {}
        other => panic!("expected missing scope, got {other:?}"),
    }
}

#[test]
fn nested_scope_context_points_at_the_nearest_scope() {
    let sp = ServiceCollection::new().build().unwrap();
    let outer = sp.create_scope(ScopeContext::background()).unwrap();
    let inner = outer.create_scope(outer.context().clone()).unwrap();

    let recovered = from_context(inner.context()).unwrap();
    assert_eq!(recovered.id(), inner.id());
}

#[test]
fn original_context_values_remain_visible_in_scope() {
    let sp = ServiceCollection::new().build().unwrap();
    let base = ScopeContext::background().with_value("tenant", "acme".to_string());
    let scope = sp.create_scope(base).unwrap();

    assert_eq!(*scope.context().value::<String>("tenant").unwrap(), "acme");
}

#[test]
fn cancelled_context_fails_resolution() {
    #[derive(Debug)]
    struct Service;

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<Service, _>(|_| Service);

    let sp = sc.build().unwrap();
    let token = CancellationToken::new();
    let ctx = ScopeContext::background().with_cancellation(token.clone());
    let scope = sp.create_scope(ctx).unwrap();

    // Before cancellation the scope works.
    assert!(scope.get::<Service>().is_ok());

    token.cancel();

    match scope.get::<Service>() {
        // The instance is cached, but the fetch is refused first.
        Err(DiError::Resolution(ResolutionError::Cancelled { .. })) => {}
        other => panic!("expected cancellation, got {other:?}"),
    }
}

#[test]
fn resolution_deadline_bounds_one_resolve() {
    struct Slow;
    #[derive(Debug)]
    struct NeedsSlow;

    let mut sc = ServiceCollection::new();
    sc.add_long_factory::<Slow, _>(|_| {
        std::thread::sleep(Duration::from_millis(30));
        Slow
    });
    sc.add_long_try_factory::<NeedsSlow, _>(|ctx| {
        std::thread::sleep(Duration::from_millis(30));
        let _ = ctx.get::<Slow>()?;
        Ok(NeedsSlow)
    })
    .depends_on::<Slow>();

    let sp = sc
        .build_with(BuildOptions::default().resolution_deadline(Duration::from_millis(5)))
        .unwrap();

    match sp.get::<NeedsSlow>() {
        Err(DiError::Resolution(ResolutionError::Timeout { deadline, .. })) => {
            assert_eq!(deadline, Duration::from_millis(5));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[test]
fn observer_hooks_fire_on_success_and_failure() {
    struct Present;
    struct Absent;

    let resolved = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));

    let mut sc = ServiceCollection::new();
    sc.add_long_factory::<Present, _>(|_| Present);

    let r = resolved.clone();
    let f = failed.clone();
    let sp = sc
        .build_with(
            BuildOptions::default()
                .on_resolved(move |_, _| {
                    r.fetch_add(1, Ordering::SeqCst);
                })
                .on_error(move |_, _| {
                    f.fetch_add(1, Ordering::SeqCst);
                }),
        )
        .unwrap();

    let _ = sp.get_required::<Present>();
    let _ = sp.get::<Absent>();

    assert_eq!(resolved.load(Ordering::SeqCst), 1);
    assert_eq!(failed.load(Ordering::SeqCst), 1);
}

#[test]
fn cache_hits_also_notify_observers() {
    struct Hot;

    let resolved = Arc::new(AtomicUsize::new(0));

    let mut sc = ServiceCollection::new();
    sc.add_long_factory::<Hot, _>(|_| Hot);

    let r = resolved.clone();
    let sp = sc
        .build_with(BuildOptions::default().on_resolved(move |_, _| {
            r.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();

    let _ = sp.get_required::<Hot>();
    let _ = sp.get_required::<Hot>();
    let _ = sp.get_required::<Hot>();

    assert_eq!(resolved.load(Ordering::SeqCst), 3);
}
