use std::sync::{Arc, Mutex};

use wirebox::{
    BoxError, ContextDispose, Dispose, Resolver, ScopeContext, ServiceCollection,
};

type Log = Arc<Mutex<Vec<&'static str>>>;

struct Tracked {
    name: &'static str,
    log: Log,
}

impl Dispose for Tracked {
    fn dispose(&self) -> Result<(), BoxError> {
        self.log.lock().unwrap().push(self.name);
        Ok(())
    }
}

#[test]
fn disposal_runs_in_reverse_construction_order() {
    struct P(Tracked);
    struct Q(Tracked);
    struct R(Tracked);

    impl Dispose for P {
        fn dispose(&self) -> Result<(), BoxError> {
            self.0.dispose()
        }
    }
    impl Dispose for Q {
        fn dispose(&self) -> Result<(), BoxError> {
            self.0.dispose()
        }
    }
    impl Dispose for R {
        fn dispose(&self) -> Result<(), BoxError> {
            self.0.dispose()
        }
    }

    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let mut sc = ServiceCollection::new();
    let l = log.clone();
    sc.add_scoped_factory::<P, _>(move |_| P(Tracked { name: "P", log: l.clone() }))
        .disposable();
    let l = log.clone();
    sc.add_scoped_factory::<Q, _>(move |_| Q(Tracked { name: "Q", log: l.clone() }))
        .disposable();
    let l = log.clone();
    sc.add_scoped_factory::<R, _>(move |_| R(Tracked { name: "R", log: l.clone() }))
        .disposable();

    let sp = sc.build().unwrap();
    let scope = sp.create_scope(ScopeContext::background()).unwrap();

    let _p = scope.get_required::<P>();
    let _q = scope.get_required::<Q>();
    let _r = scope.get_required::<R>();

    scope.close().unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["R", "Q", "P"]);
}

#[test]
fn children_dispose_before_parents() {
    struct Held(Tracked);
    impl Dispose for Held {
        fn dispose(&self) -> Result<(), BoxError> {
            self.0.dispose()
        }
    }

    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let mut sc = ServiceCollection::new();
    let l = log.clone();
    sc.add_scoped_factory::<Held, _>(move |ctx| {
        let name = if ctx.scope().parent().map(|p| p.is_root()).unwrap_or(false) {
            "outer"
        } else {
            "inner"
        };
        Held(Tracked { name, log: l.clone() })
    })
    .disposable();

    let sp = sc.build().unwrap();
    let outer = sp.create_scope(ScopeContext::background()).unwrap();
    let inner = outer.create_scope(ScopeContext::background()).unwrap();

    let _o = outer.get_required::<Held>();
    let _i = inner.get_required::<Held>();

    // Closing the parent closes the child first.
    outer.close().unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["inner", "outer"]);
}

#[test]
fn closing_a_scope_does_not_dispose_long_instances() {
    struct LongLived(Tracked);
    impl Dispose for LongLived {
        fn dispose(&self) -> Result<(), BoxError> {
            self.0.dispose()
        }
    }

    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let mut sc = ServiceCollection::new();
    let l = log.clone();
    sc.add_long_factory::<LongLived, _>(move |_| {
        LongLived(Tracked { name: "long", log: l.clone() })
    })
    .disposable();

    let sp = sc.build().unwrap();
    let scope = sp.create_scope(ScopeContext::background()).unwrap();
    let _instance = scope.get_required::<LongLived>();

    scope.close().unwrap();
    assert!(log.lock().unwrap().is_empty());

    sp.close().unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["long"]);
}

#[test]
fn disposal_failures_are_collected_not_fatal() {
    struct Bad;
    struct Good(Tracked);

    impl Dispose for Bad {
        fn dispose(&self) -> Result<(), BoxError> {
            Err("flush failed".into())
        }
    }
    impl Dispose for Good {
        fn dispose(&self) -> Result<(), BoxError> {
            self.0.dispose()
        }
    }

    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let mut sc = ServiceCollection::new();
    let l = log.clone();
    sc.add_scoped_factory::<Good, _>(move |_| Good(Tracked { name: "good", log: l.clone() }))
        .disposable();
    sc.add_scoped_factory::<Bad, _>(|_| Bad).disposable();

    let sp = sc.build().unwrap();
    let scope = sp.create_scope(ScopeContext::background()).unwrap();
    let _good = scope.get_required::<Good>();
    let _bad = scope.get_required::<Bad>();

    let err = scope.close().unwrap_err();
    assert_eq!(err.failures.len(), 1);
    assert!(err.failures[0].type_name.contains("Bad"));
    // The failing disposer did not stop the other one.
    assert_eq!(*log.lock().unwrap(), vec!["good"]);
}

#[test]
fn context_disposer_sees_the_scope_context() {
    struct Uploader {
        seen_tenant: Arc<Mutex<Option<String>>>,
    }

    impl ContextDispose for Uploader {
        fn dispose(&self, ctx: &ScopeContext) -> Result<(), BoxError> {
            let tenant = ctx.value::<String>("tenant").map(|t| (*t).clone());
            *self.seen_tenant.lock().unwrap() = tenant;
            Ok(())
        }
    }

    let seen = Arc::new(Mutex::new(None));
    let seen_clone = seen.clone();

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<Uploader, _>(move |_| Uploader {
        seen_tenant: seen_clone.clone(),
    })
    .context_disposable();

    let sp = sc.build().unwrap();
    let ctx = ScopeContext::background().with_value("tenant", "acme".to_string());
    let scope = sp.create_scope(ctx).unwrap();
    let _uploader = scope.get_required::<Uploader>();
    scope.close().unwrap();

    assert_eq!(seen.lock().unwrap().as_deref(), Some("acme"));
}

#[test]
fn imperative_disposer_registration() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    struct Conn(Tracked);
    impl Dispose for Conn {
        fn dispose(&self) -> Result<(), BoxError> {
            self.0.dispose()
        }
    }

    let mut sc = ServiceCollection::new();
    let l = log.clone();
    sc.add_scoped_factory::<Conn, _>(move |ctx| {
        let conn = Arc::new(Conn(Tracked { name: "conn", log: l.clone() }));
        ctx.register_disposer(conn.clone());
        Conn(Tracked { name: "conn-value", log: l.clone() })
    });

    let sp = sc.build().unwrap();
    let scope = sp.create_scope(ScopeContext::background()).unwrap();
    let _conn = scope.get_required::<Conn>();
    scope.close().unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["conn"]);
}

#[test]
fn trait_bindings_dispose_via_upcast() {
    trait Cache: Send + Sync {
        fn shutdown(&self) -> Result<(), BoxError>;
    }

    struct MemCache(Tracked);
    impl Cache for MemCache {
        fn shutdown(&self) -> Result<(), BoxError> {
            self.0.dispose()
        }
    }

    struct CacheDisposer(Arc<dyn Cache>);
    impl Dispose for CacheDisposer {
        fn dispose(&self) -> Result<(), BoxError> {
            self.0.shutdown()
        }
    }

    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let mut sc = ServiceCollection::new();
    let l = log.clone();
    sc.add_scoped_trait_factory::<dyn Cache, _>(move |_| {
        Arc::new(MemCache(Tracked { name: "cache", log: l.clone() }))
    })
    .disposable_with(|cache| Arc::new(CacheDisposer(cache)));

    let sp = sc.build().unwrap();
    let scope = sp.create_scope(ScopeContext::background()).unwrap();
    let _cache = scope.get_required_trait::<dyn Cache>();
    scope.close().unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["cache"]);
}
