mod common;

use common::*;
use lodestar_api::{
    Binding, BindingPublisher, Key, Rank, RankedBinding, Target, TypeRef, Visibility,
};
use lodestar_core::{BindingListener, BindingLocator, ScopePublisher};
use parking_lot::Mutex;
use std::sync::Arc;

#[test]
fn test_completeness_regardless_of_registration_order() {
    let s1 = new_scope("one");
    let s2 = new_scope("two");
    let service = ty("app.Service");
    let fast = bind_instance(&s1, Key::of(service.clone()), "app.FastService");
    let slow = bind_instance(&s2, Key::named(TypeRef::object(), "slow"), "app.SlowService");
    s1.bind_with(Key::named(service.clone(), "hidden"), Target::Constructor, |b| {
        b.with_visibility(Visibility::Internal)
    });
    bind_instance(&s2, Key::named(TypeRef::object(), "names"), "app.Names");

    // Subscriber first
    let early = BindingLocator::default();
    let located_early = early.locate(service.clone());
    early.add_publisher(publisher(&s1, 0)).unwrap();
    early.add_publisher(publisher(&s2, 0)).unwrap();

    // Publishers first
    let late = BindingLocator::default();
    late.add_publisher(publisher(&s1, 0)).unwrap();
    late.add_publisher(publisher(&s2, 0)).unwrap();
    let located_late = late.locate(service);

    for located in [&located_early, &located_late] {
        assert_eq!(located.len(), 2);
        assert!(holds(located, &fast));
        assert!(holds(located, &slow));
        assert_eq!(impls(located), vec!["app.FastService", "app.SlowService"]);
    }
}

#[test]
fn test_implementation_equal_to_raw_class_is_offered_once() {
    let scope = new_scope("s");
    let raw_list = ty("java.util.List");
    let exact = ty("java.util.List<java.lang.String>");
    // Keyed on the raw class, implemented by the raw class itself
    let raw_self = scope.bind(Key::named(raw_list.clone(), "self"), Target::Constructor);
    let typed = scope.bind(Key::of(exact.clone()), Target::Linked(Key::of(raw_list)));

    let locator = BindingLocator::default();
    locator.add_publisher(publisher(&scope, 0)).unwrap();

    let located = locator.locate(exact);
    assert_unique(&located);
    assert!(holds(&located, &typed));
    assert!(!holds(&located, &raw_self));
    assert_eq!(located.len(), 1);
}

#[test]
fn test_binding_matching_several_tiers_is_held_once() {
    let scope = new_scope("s");
    let service = ty("app.Service");
    let binding = bind_instance(&scope, Key::of(service.clone()), "app.FastService");

    let locator = BindingLocator::default();
    let located = locator.locate(service);
    locator.add_publisher(publisher(&scope, 0)).unwrap();
    // Offer the same identity again through a second wrapper over the same scope
    ScopePublisher::with_primary_rank(scope.clone(), 7).subscribe(&*located);

    assert_eq!(located.len(), 1);
    assert!(holds(&located, &binding));
}

#[test]
fn test_rank_ordering_and_publisher_tie_break() {
    let first = new_scope("first");
    let second = new_scope("second");
    let service = ty("app.Service");
    bind_instance(&second, Key::of(service.clone()), "app.SlowService");
    bind_instance(&first, Key::of(service.clone()), "app.FastService");
    bind_instance(&first, Key::named(service.clone(), "named"), "app.Names");
    second.bind_with(
        Key::named(service.clone(), "boosted"),
        Target::Instance("app.Ints".into()),
        |b| b.with_priority(100),
    );

    let locator = BindingLocator::default();
    let located = locator.locate(service);
    locator.add_publisher(publisher(&first, 0)).unwrap();
    locator.add_publisher(publisher(&second, 0)).unwrap();

    assert_ranked(&located);
    assert_eq!(
        impls(&located),
        vec!["app.Ints", "app.FastService", "app.SlowService", "app.Names"]
    );
}

#[test]
fn test_unregister_is_idempotent() {
    let scope = new_scope("s");
    let service = ty("app.Service");
    bind_instance(&scope, Key::of(service.clone()), "app.FastService");

    let locator = BindingLocator::default();
    assert!(!locator.remove_publisher(scope.id()));

    let publisher = publisher(&scope, 0);
    locator.add_publisher(publisher.clone()).unwrap();
    let located = locator.locate(service.clone());
    let other = locator.locate(service);

    assert!(locator.deregister(&*publisher));
    assert!(!locator.deregister(&*publisher));
    assert!(located.is_empty());

    let generation = other.generation();
    assert!(locator.remove_subscriber(&located));
    assert!(!locator.remove_subscriber(&located));
    assert_eq!(locator.subscriber_count(), 1);
    assert_eq!(other.generation(), generation);
}

#[derive(Default)]
struct Counter {
    events: Mutex<Vec<(bool, Rank)>>,
}

impl BindingListener for Counter {
    fn added(&self, binding: &RankedBinding) {
        self.events.lock().push((true, binding.rank));
    }

    fn removed(&self, _binding: &Arc<Binding>) {
        self.events.lock().push((false, 0));
    }
}

#[test]
fn test_live_update_keeps_existing_order() {
    let a = new_scope("a");
    let b = new_scope("b");
    let service = ty("app.Service");
    bind_instance(&a, Key::of(service.clone()), "app.FastService");
    bind_instance(&a, Key::named(service.clone(), "x"), "app.SlowService");
    bind_instance(&b, Key::of(service.clone()), "app.Names");
    bind_instance(&b, Key::named(service.clone(), "y"), "app.Ints");

    let locator = BindingLocator::default();
    locator.add_publisher(publisher(&a, 0)).unwrap();
    let located = locator.locate(service);
    let before: Vec<String> = impls(&located);
    let generation = located.generation();

    let counter = Arc::new(Counter::default());
    located.watch(counter.clone());
    counter.events.lock().clear();

    locator.add_publisher(publisher(&b, 0)).unwrap();
    let after = impls(&located);

    // Exactly the new publisher's bindings were added
    assert_eq!(counter.events.lock().len(), 2);
    assert!(counter.events.lock().iter().all(|(added, _)| *added));
    assert_eq!(located.generation(), generation + 2);
    let kept: Vec<String> = after.iter().filter(|i| before.contains(i)).cloned().collect();
    assert_eq!(kept, before);
    assert_eq!(
        after,
        vec!["app.FastService", "app.Names", "app.SlowService", "app.Ints"]
    );
}

#[test]
fn test_scenario_publishers_come_and_go() {
    let a = new_scope("A");
    let b = new_scope("B");
    let service = ty("app.Service");
    a.bind_with(
        Key::of(service.clone()),
        Target::Instance("app.ServiceImplA".into()),
        |binding| binding.with_priority(5),
    );
    b.bind_with(
        Key::of(service.clone()),
        Target::Instance("app.ServiceImplB".into()),
        |binding| binding.with_priority(8),
    );

    let locator = BindingLocator::default();
    locator.add_publisher(publisher(&a, 10)).unwrap();
    let located = locator.locate(service);
    let ranked = |l: &lodestar_core::Located| -> Vec<(String, Rank)> {
        l.iter()
            .map(|r| (r.binding.implementation().unwrap_or("?").to_string(), r.rank))
            .collect()
    };
    assert_eq!(ranked(&located), vec![("app.ServiceImplA".to_string(), 5)]);

    locator.add_publisher(publisher(&b, 20)).unwrap();
    assert_eq!(
        ranked(&located),
        vec![
            ("app.ServiceImplB".to_string(), 8),
            ("app.ServiceImplA".to_string(), 5)
        ]
    );
    assert_eq!(locator.max_rank(), Some(20));

    assert!(locator.remove_publisher(a.id()));
    assert_eq!(ranked(&located), vec![("app.ServiceImplB".to_string(), 8)]);
}

#[test]
fn test_scenario_generic_and_exact_from_two_scopes() {
    let raw_scope = new_scope("raw");
    let exact_scope = new_scope("exact");
    let requested = ty("java.util.List<java.lang.String>");
    let via_raw = raw_scope.bind(
        Key::of(ty("java.util.List")),
        Target::Linked(Key::of(ty("java.util.ArrayList"))),
    );
    let via_exact = bind_instance(&exact_scope, Key::of(requested.clone()), "app.Names");
    // Wrong element type: never offered
    bind_instance(&raw_scope, Key::named(ty("java.util.List"), "ints"), "app.Ints");

    let locator = BindingLocator::default();
    locator.add_publisher(publisher(&raw_scope, 0)).unwrap();
    locator.add_publisher(publisher(&exact_scope, 0)).unwrap();

    let located = locator.locate(requested);
    assert_unique(&located);
    assert_eq!(located.len(), 2);
    assert!(holds(&located, &via_raw));
    assert!(holds(&located, &via_exact));
}

#[test]
fn test_stale_binding_survives_unsubscribe() {
    let scope = new_scope("s");
    let service = ty("app.Service");
    let key = Key::of(service.clone());
    let original = bind_instance(&scope, key.clone(), "app.FastService");

    let locator = BindingLocator::default();
    locator.add_publisher(publisher(&scope, 0)).unwrap();
    let located = locator.locate(service);
    assert!(holds(&located, &original));

    // The scope moves on; the held binding is no longer current
    let replacement = bind_instance(&scope, key, "app.SlowService");
    assert!(locator.remove_publisher(scope.id()));
    assert!(holds(&located, &original));
    assert!(!holds(&located, &replacement));
}

#[test]
fn test_closed_scope_does_not_block_other_publishers() {
    let broken = new_scope("broken");
    let healthy = new_scope("healthy");
    let service = ty("app.Service");
    bind_instance(&broken, Key::of(service.clone()), "app.SlowService");
    bind_instance(&healthy, Key::of(service.clone()), "app.FastService");
    broken.close();

    let locator = BindingLocator::default();
    locator.add_publisher(publisher(&broken, 0)).unwrap();
    locator.add_publisher(publisher(&healthy, 0)).unwrap();
    assert_eq!(impls(&locator.locate(service)), vec!["app.FastService"]);
}
