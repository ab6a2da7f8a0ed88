use std::any::Any;
use std::sync::{Arc, Mutex};

use wirebox::{
    published, DependencyRequest, DependencySet, DiResult, PublishedBinding, Resolver,
    ResolverContext, ScopeContext, ServiceBundle, ServiceCollection,
};

#[test]
fn dependency_set_resolves_all_field_kinds() {
    struct Database;
    struct Metrics;
    struct Conn(&'static str);

    trait Route: Send + Sync {
        fn path(&self) -> &'static str;
    }
    struct Fixed(&'static str);
    impl Route for Fixed {
        fn path(&self) -> &'static str {
            self.0
        }
    }

    struct HandlerDeps {
        db: Arc<Database>,
        metrics: Option<Arc<Metrics>>,
        primary: Arc<Conn>,
        routes: Vec<Arc<dyn Route>>,
    }

    impl DependencySet for HandlerDeps {
        fn manifest() -> Vec<DependencyRequest> {
            vec![
                DependencyRequest::on::<Database>(),
                DependencyRequest::on::<Metrics>().optional(),
                DependencyRequest::on_keyed::<Conn>("primary"),
                DependencyRequest::on_group::<dyn Route>("routes"),
            ]
        }

        fn resolve(ctx: &ResolverContext<'_>) -> DiResult<Self> {
            Ok(Self {
                db: ctx.get::<Database>()?,
                metrics: ctx.get_optional::<Metrics>()?,
                primary: ctx.get_keyed::<Conn>("primary")?,
                routes: ctx.get_trait_group::<dyn Route>("routes")?,
            })
        }
    }

    struct Handler {
        db: Arc<Database>,
        route_count: usize,
        conn: &'static str,
        has_metrics: bool,
    }

    let mut sc = ServiceCollection::new();
    sc.add_long(Database);
    sc.add_long(Conn("conn-1")).with_key("primary");
    sc.add_long_trait_factory::<dyn Route, _>(|_| Arc::new(Fixed("/a")))
        .in_group("routes");
    sc.add_long_trait_factory::<dyn Route, _>(|_| Arc::new(Fixed("/b")))
        .in_group("routes");
    sc.add_long_with::<Handler, HandlerDeps, _>(|deps| Handler {
        db: deps.db,
        route_count: deps.routes.len(),
        conn: deps.primary.0,
        has_metrics: deps.metrics.is_some(),
    });

    let sp = sc.build().unwrap();
    let handler = sp.get_required::<Handler>();

    assert_eq!(handler.route_count, 2);
    assert_eq!(handler.conn, "conn-1");
    assert!(!handler.has_metrics);
    // The database is shared with direct resolution.
    assert!(Arc::ptr_eq(&handler.db, &sp.get_required::<Database>()));
}

#[test]
fn empty_dependency_set_resolves() {
    struct Standalone;

    struct NoDeps;
    impl DependencySet for NoDeps {
        fn manifest() -> Vec<DependencyRequest> {
            Vec::new()
        }
        fn resolve(_ctx: &ResolverContext<'_>) -> DiResult<Self> {
            Ok(NoDeps)
        }
    }

    let mut sc = ServiceCollection::new();
    sc.add_long_with::<Standalone, NoDeps, _>(|_| Standalone);

    let sp = sc.build().unwrap();
    assert!(sp.get::<Standalone>().is_ok());
}

#[derive(Clone)]
struct ApiClient {
    base: &'static str,
}
#[derive(Clone)]
struct AdminClient {
    base: &'static str,
}
#[derive(Clone)]
struct Migration(&'static str);

struct Clients {
    api: ApiClient,
    admin: AdminClient,
    migrations: Vec<Migration>,
}

impl ServiceBundle for Clients {
    fn manifest() -> Vec<PublishedBinding> {
        vec![
            PublishedBinding::of::<ApiClient>(),
            PublishedBinding::keyed::<AdminClient>("admin"),
            PublishedBinding::grouped::<Migration>("migrations"),
            PublishedBinding::grouped::<Migration>("migrations"),
        ]
    }

    fn publish(&self) -> Vec<Arc<dyn Any + Send + Sync>> {
        vec![
            published(self.api.clone()),
            published(self.admin.clone()),
            published(self.migrations[0].clone()),
            published(self.migrations[1].clone()),
        ]
    }
}

#[test]
fn bundle_publishes_each_field_as_a_binding() {
    let built = Arc::new(Mutex::new(0));
    let built_clone = built.clone();

    let mut sc = ServiceCollection::new();
    sc.add_long_bundle::<Clients, _>(move |_| {
        *built_clone.lock().unwrap() += 1;
        Clients {
            api: ApiClient { base: "/v1" },
            admin: AdminClient { base: "/admin" },
            migrations: vec![Migration("001"), Migration("002")],
        }
    });

    let sp = sc.build().unwrap();

    assert_eq!(sp.get_required::<ApiClient>().base, "/v1");
    assert_eq!(sp.get_required_keyed::<AdminClient>("admin").base, "/admin");

    let migrations = sp.get_group::<Migration>("migrations").unwrap();
    assert_eq!(migrations.len(), 2);
    assert_eq!(migrations[0].0, "001");
    assert_eq!(migrations[1].0, "002");

    // Resolving three different fields ran the aggregate constructor once.
    assert_eq!(*built.lock().unwrap(), 1);

    // The bundle itself is also resolvable.
    assert!(sp.get::<Clients>().is_ok());
}

#[test]
fn scoped_bundle_publishes_per_scope() {
    #[derive(Clone)]
    struct Tx {
        id: u32,
    }

    struct Unit {
        tx: Tx,
    }

    impl ServiceBundle for Unit {
        fn manifest() -> Vec<PublishedBinding> {
            vec![PublishedBinding::of::<Tx>()]
        }
        fn publish(&self) -> Vec<Arc<dyn Any + Send + Sync>> {
            vec![published(self.tx.clone())]
        }
    }

    let counter = Arc::new(Mutex::new(0));
    let counter_clone = counter.clone();

    let mut sc = ServiceCollection::new();
    sc.add_scoped_bundle::<Unit, _>(move |_| {
        let mut n = counter_clone.lock().unwrap();
        *n += 1;
        Unit { tx: Tx { id: *n } }
    });

    let sp = sc.build().unwrap();
    let s1 = sp.create_scope(ScopeContext::background()).unwrap();
    let s2 = sp.create_scope(ScopeContext::background()).unwrap();

    assert_eq!(s1.get_required::<Tx>().id, 1);
    assert_eq!(s1.get_required::<Tx>().id, 1);
    assert_eq!(s2.get_required::<Tx>().id, 2);
}
