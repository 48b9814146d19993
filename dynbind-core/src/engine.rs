//! # Invocation engine
//!
//! Resolves one call against one binding:
//!
//! 1. merge the binding's singletons with the call-scoped injections
//!    (call-scoped values win), then add the binding's own name,
//! 2. run the filter chain; a rejection ends the call with no value,
//! 3. let the callable rearrange the raw arguments,
//! 4. assemble the argument vector, filling injected positions from the
//!    merged set and the rest from the raw arguments in order; attribute
//!    and handler bindings skip this step and ignore raw arguments,
//! 5. call, converting each slot to its parameter type,
//! 6. normalize the produced values to a single result.

use crate::{
    binding::Binding,
    callable::{ArgVector, Slot},
    convert::Converters,
    error::InvokeError,
    injection::Injections,
};
use serde_json::Value;
use tracing::{debug, trace, warn};

/// Invoke `binding` with `args`.
///
/// Returns [`Value::Null`] when a filter rejects the call or the callable
/// produces no value.
pub fn invoke(
    binding: &Binding,
    converters: &Converters,
    injections: &Injections,
    args: Vec<Value>,
) -> Result<Value, InvokeError> {
    trace!(binding = %binding.name(), args = args.len(), "invoking binding");

    let mut merged = Injections::merge([binding.singletons(), injections]);
    merged.insert(binding.name().clone());

    if !binding.filters().run(binding, &mut merged) {
        debug!(binding = %binding.name(), "invocation rejected by filter");
        return Ok(Value::Null);
    }

    let callable = binding.callable();
    let slots = if callable.takes_arguments() {
        assemble(binding, &merged, callable.bundle(args))?
    } else {
        if !args.is_empty() {
            trace!(
                binding = %binding.name(),
                ignored = args.len(),
                "binding takes no arguments"
            );
        }
        Vec::new()
    };
    let values = callable.call(ArgVector::new(slots, converters), &merged)?;

    Ok(normalize(binding, values))
}

/// Build the slot vector in declared parameter order.
fn assemble(
    binding: &Binding,
    merged: &Injections,
    raw: Vec<Value>,
) -> Result<Vec<Slot>, InvokeError> {
    let params = binding.params();
    let supplied = raw.len();
    let count_error = || InvokeError::ArgumentCount {
        binding: binding.name().to_string(),
        expected: params.len() - binding.injected_count(),
        supplied,
        injected: binding.injected_count(),
    };

    let mut raw = raw.into_iter();
    let mut slots = Vec::with_capacity(params.len());

    for (position, param) in params.iter().enumerate() {
        if binding.is_injected(position) {
            let injected = merged.get_by_id(param.id()).cloned().ok_or_else(|| {
                InvokeError::MissingInjection {
                    binding: binding.name().to_string(),
                    position,
                    type_name: param.name(),
                }
            })?;
            slots.push(Slot::Injected(injected));
        } else {
            let value = raw.next().ok_or_else(count_error)?;
            slots.push(Slot::Supplied(value));
        }
    }

    if raw.len() > 0 {
        return Err(count_error());
    }
    Ok(slots)
}

fn normalize(binding: &Binding, mut values: Vec<Value>) -> Value {
    match values.len() {
        0 => Value::Null,
        1 => values.swap_remove(0),
        n => {
            warn!(
                binding = %binding.name(),
                returned = n,
                "binding returned more than one value, keeping the first"
            );
            values.swap_remove(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        binding::QualifiedName,
        callable::{AttributeBinding, Callable, FunctionBinding, HandlerBinding},
    };
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct Session(String);

    fn binding<C: Callable>(callable: C) -> Binding {
        Binding::new(QualifiedName::new("T", "m"), Box::new(callable))
    }

    fn call(b: &Binding, args: Vec<Value>) -> Result<Value, InvokeError> {
        invoke(b, &Converters::new(), &Injections::new(), args)
    }

    #[test]
    fn test_supplied_arguments_are_converted() {
        let b = binding(FunctionBinding::new(|a: i64, b: f64| a as f64 * b));
        assert_eq!(call(&b, vec![json!("3"), json!(0.5)]).unwrap(), json!(1.5));
    }

    #[test]
    fn test_argument_count_is_checked_both_ways() {
        let b = binding(FunctionBinding::new(|a: i64| a));
        assert!(matches!(
            call(&b, vec![]),
            Err(InvokeError::ArgumentCount { expected: 1, supplied: 0, .. })
        ));
        assert!(matches!(
            call(&b, vec![json!(1), json!(2)]),
            Err(InvokeError::ArgumentCount { expected: 1, supplied: 2, .. })
        ));
    }

    #[test]
    fn test_call_scoped_injection_overrides_singleton() {
        let mut b = binding(FunctionBinding::new(|s: Arc<Session>, n: i64| {
            format!("{}:{n}", s.0)
        }));
        b.inject(Arc::new(Session("default".into())));

        assert_eq!(call(&b, vec![json!(1)]).unwrap(), json!("default:1"));

        let per_call = Injections::new().with(Arc::new(Session("call".into())));
        let out = invoke(&b, &Converters::new(), &per_call, vec![json!(2)]).unwrap();
        assert_eq!(out, json!("call:2"));
    }

    #[test]
    fn test_filter_rejection_yields_null_without_calling() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = calls.clone();
        let mut b = binding(FunctionBinding::new(move || {
            seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            1
        }));
        b.filter(|_: &Binding, _: &mut Injections| false);

        assert_eq!(call(&b, vec![]).unwrap(), Value::Null);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn test_filter_can_supply_injection() {
        let mut b = binding(FunctionBinding::new(|s: Arc<Session>| s.0.clone()));
        b.inject(Arc::new(Session("default".into())));
        b.filter(|_: &Binding, inj: &mut Injections| {
            inj.insert(Arc::new(Session("from filter".into())));
            true
        });
        assert_eq!(call(&b, vec![]).unwrap(), json!("from filter"));
    }

    #[test]
    fn test_multiple_returns_keep_first() {
        let b = binding(FunctionBinding::new(|| (1, 2)));
        assert_eq!(call(&b, vec![]).unwrap(), json!(1));

        let unit = binding(FunctionBinding::new(|| ()));
        assert_eq!(call(&unit, vec![]).unwrap(), Value::Null);
    }

    #[test]
    fn test_attribute_and_handler_ignore_raw_arguments() {
        struct Counter(i64);
        let attr = binding(AttributeBinding::new(Arc::new(Counter(7)), |c: &Counter| c.0));
        assert_eq!(call(&attr, vec![json!(1), json!("extra")]).unwrap(), json!(7));

        let handler = binding(HandlerBinding::new(|s: &Session| s.0.clone()));
        let request = Injections::new().with(Session("req".into()));
        let out = invoke(&handler, &Converters::new(), &request, vec![json!(1)]).unwrap();
        assert_eq!(out, json!("req"));
    }

    #[test]
    fn test_binding_name_is_injected() {
        let b = binding(FunctionBinding::new(|name: QualifiedName, n: i64| {
            format!("{}:{n}", name.method)
        }));
        assert_eq!(call(&b, vec![json!(4)]).unwrap(), json!("m:4"));

        let mut seen = binding(FunctionBinding::new(|| 1));
        seen.filter(|_: &Binding, inj: &mut Injections| {
            inj.get::<QualifiedName>() == Some(&QualifiedName::new("T", "m"))
        });
        let calls = Injections::new().with(QualifiedName::new("Other", "x"));
        let out = invoke(&seen, &Converters::new(), &calls, vec![]);
        assert_eq!(out.unwrap(), json!(1));
    }

    #[test]
    fn test_conversion_failure_reports_position() {
        let b = binding(FunctionBinding::new(|_a: i64, _b: bool| ()));
        let err = call(&b, vec![json!(1), json!([1])]).unwrap_err();
        assert!(matches!(err, InvokeError::Conversion { position: 1, .. }));
    }
}
