//! Filter chains.

mod common;

use common::{CallCounter, Context, calc_registry};
use dynbind::{
    Binding, Injections, Registry, args,
    filters::{LoggingFilter, auto_inject},
    testing::{CountingFilter, RecordingFilter},
};
use serde_json::{Value, json};
use std::sync::Arc;

#[test]
fn test_rejecting_filter_short_circuits() {
    let counter = CallCounter::default();
    let first = CountingFilter::new();
    let last = CountingFilter::new();

    let mut registry = Registry::new();
    let c = counter.clone();
    registry
        .register_function(
            move |a: i64| {
                c.hit();
                a
            },
            "F",
            "id",
        )
        .filter(first.clone())
        .filter(|_: &Binding, _: &mut Injections| false)
        .filter(last.clone());

    let result = registry.invoke("F", "id", args![1]).unwrap();
    assert_eq!(result, Value::Null);
    assert_eq!(first.count(), 1);
    assert_eq!(last.count(), 0);
    assert_eq!(counter.count(), 0);
}

#[test]
fn test_filters_run_in_attachment_order() {
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let mut registry = calc_registry();

    for id in 1..=3 {
        let order = order.clone();
        registry
            .binding_mut("Calc", "add")
            .unwrap()
            .filter(move |_: &Binding, _: &mut Injections| {
                order.lock().push(id);
                true
            });
    }

    assert_eq!(registry.invoke("Calc", "add", args![1, 2]).unwrap(), json!(3));
    assert_eq!(*order.lock(), vec![1, 2, 3]);
}

#[test]
fn test_filter_passes_value_forward() {
    #[derive(Clone, Debug, PartialEq)]
    struct Session {
        user: String,
    }

    let mut registry = Registry::new();
    registry
        .register_function(
            |ctx: Arc<Context>, n: i64| format!("{}#{n}", ctx.user),
            "Users",
            "tag",
        )
        .inject(Context::shared("placeholder"))
        .filter(auto_inject(|inj: &mut Injections, session: Session| {
            inj.insert(Arc::new(Context { user: session.user }));
            true
        }));

    let call = Injections::new().with(Session {
        user: String::from("carol"),
    });
    let result = registry.invoke_with("Users", "tag", &call, args![9]).unwrap();
    assert_eq!(result, json!("carol#9"));

    // No session: the filter cannot resolve its parameter and rejects.
    assert_eq!(registry.invoke("Users", "tag", args![9]).unwrap(), Value::Null);
}

#[test]
fn test_selection_filters_every_binding() {
    let recorder = RecordingFilter::new();
    let mut registry = calc_registry();
    registry.register_function(|| 0, "Other", "zero");

    registry
        .select_interface("Calc")
        .filter(LoggingFilter::labelled("calc"))
        .filter(recorder.clone());

    registry.invoke("Calc", "add", args![1, 2]).unwrap();
    registry.invoke("Calc", "neg", args![1.0]).unwrap();
    registry.invoke("Other", "zero", args![]).unwrap();

    assert_eq!(recorder.names(), vec!["Calc.add", "Calc.neg"]);
    assert_eq!(registry.lookup("Calc", "concat").unwrap().filters().len(), 2);
    assert!(registry.lookup("Other", "zero").unwrap().filters().is_empty());
}

#[test]
fn test_clear_filters() {
    let mut registry = calc_registry();
    registry
        .select_all()
        .filter(RecordingFilter::with_verdict(false));
    assert_eq!(registry.invoke("Calc", "add", args![1, 2]).unwrap(), Value::Null);

    registry.select_all().clear_filters();
    assert_eq!(registry.invoke("Calc", "add", args![1, 2]).unwrap(), json!(3));
}

#[test]
fn test_filter_sees_binding_name() {
    let mut registry = calc_registry();
    registry
        .select_all()
        .filter(|binding: &Binding, _: &mut Injections| binding.name().method != "neg");

    assert_eq!(registry.invoke("Calc", "add", args![1, 2]).unwrap(), json!(3));
    assert_eq!(registry.invoke("Calc", "neg", args![2.0]).unwrap(), Value::Null);
}
