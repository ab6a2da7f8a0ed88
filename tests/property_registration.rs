use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use wirebox::{Resolver, ScopeContext, ServiceCollection};

#[derive(Debug, Clone, PartialEq)]
struct Tagged(usize);

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Group resolution returns exactly the registered members, in
    /// registration order, for any member count.
    #[test]
    fn group_order_is_registration_order(count in 0usize..24) {
        let mut sc = ServiceCollection::new();
        for i in 0..count {
            sc.add_long_factory::<Tagged, _>(move |_| Tagged(i)).in_group("items");
        }

        let sp = sc.build().unwrap();
        let items = sp.get_group::<Tagged>("items").unwrap();

        prop_assert_eq!(items.len(), count);
        for (i, item) in items.iter().enumerate() {
            prop_assert_eq!(item.0, i);
        }
    }

    /// Repeated module inclusion installs once no matter how many times
    /// and in which mixture it is included.
    #[test]
    fn module_inclusion_is_idempotent(repeats in 1usize..8) {
        use wirebox::ServiceModule;

        let installs = Arc::new(Mutex::new(0));
        let installs_clone = installs.clone();
        let module = Arc::new(ServiceModule::new("m").register(move |c| {
            *installs_clone.lock().unwrap() += 1;
            c.add_long(1u64);
        }));

        let mut sc = ServiceCollection::new();
        for _ in 0..repeats {
            sc.add_module(&module).unwrap();
        }

        prop_assert_eq!(*installs.lock().unwrap(), 1);
        let sp = sc.build().unwrap();
        prop_assert_eq!(*sp.get_required::<u64>(), 1);
    }

    /// Every keyed binding remains independently resolvable.
    #[test]
    fn keyed_bindings_are_independent(values in proptest::collection::vec(0u32..1000, 1..8)) {
        const KEYS: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];

        let mut sc = ServiceCollection::new();
        for (i, value) in values.iter().enumerate() {
            sc.add_long(*value).with_key(KEYS[i]);
        }

        let sp = sc.build().unwrap();
        for (i, value) in values.iter().enumerate() {
            prop_assert_eq!(*sp.get_required_keyed::<u32>(KEYS[i]), *value);
        }
    }

    /// Scoped instances never leak across scopes regardless of resolve
    /// interleaving.
    #[test]
    fn scoped_identity_per_scope(resolves in proptest::collection::vec(0usize..4, 1..32)) {
        struct State;

        let mut sc = ServiceCollection::new();
        sc.add_scoped_factory::<State, _>(|_| State);

        let sp = sc.build().unwrap();
        let scopes: Vec<_> = (0..4)
            .map(|_| sp.create_scope(ScopeContext::background()).unwrap())
            .collect();

        let mut first_seen: Vec<Option<Arc<State>>> = vec![None; 4];
        for &which in &resolves {
            let instance = scopes[which].get_required::<State>();
            match &first_seen[which] {
                Some(seen) => prop_assert!(Arc::ptr_eq(seen, &instance)),
                None => first_seen[which] = Some(instance),
            }
        }

        // Cross-scope instances are always distinct.
        let resolved: Vec<_> = first_seen.into_iter().flatten().collect();
        for i in 0..resolved.len() {
            for j in (i + 1)..resolved.len() {
                prop_assert!(!Arc::ptr_eq(&resolved[i], &resolved[j]));
            }
        }
    }
}
