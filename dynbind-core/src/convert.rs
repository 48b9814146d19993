//! Type coercion.
//!
//! Best-effort conversion of a loosely typed caller value into the exact
//! parameter type. A registry of per-type [`Converter`]s can override the
//! built-in kind-based rules.

use crate::{
    error::{BoxError, ConvertError},
    param::{Parameter, TypeClass},
};
use serde_json::{Number, Value};
use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    fmt,
    marker::PhantomData,
    sync::Arc,
};
use tracing::{info, warn};

/// A conversion from a caller value to one specific target type.
pub trait Converter: Send + Sync + 'static {
    /// Convert `value`; the boxed result must be of the registered target type.
    fn convert(&self, value: &Value) -> Result<Box<dyn Any + Send>, BoxError>;
}

/// Adapter from a typed closure to [`Converter`].
struct TypedConverter<T, F> {
    func: F,
    _target: PhantomData<fn() -> T>,
}

impl<T, E, F> Converter for TypedConverter<T, F>
where
    T: Send + 'static,
    E: Into<BoxError>,
    F: Fn(&Value) -> Result<T, E> + Send + Sync + 'static,
{
    fn convert(&self, value: &Value) -> Result<Box<dyn Any + Send>, BoxError> {
        match (self.func)(value) {
            Ok(v) => Ok(Box::new(v)),
            Err(e) => Err(e.into()),
        }
    }
}

struct Entry {
    name: &'static str,
    converter: Arc<dyn Converter>,
}

/// The converter registry, keyed by target type.
#[derive(Clone, Default)]
pub struct Converters {
    registry: HashMap<TypeId, Arc<Entry>>,
}

impl Converters {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a converter for target type `T`, replacing any previous one.
    pub fn register<T, E, F>(&mut self, func: F)
    where
        T: Send + 'static,
        E: Into<BoxError>,
        F: Fn(&Value) -> Result<T, E> + Send + Sync + 'static,
    {
        self.register_dyn::<T>(Arc::new(TypedConverter {
            func,
            _target: PhantomData,
        }));
    }

    /// Register an already erased converter for target type `T`.
    pub fn register_dyn<T: 'static>(&mut self, converter: Arc<dyn Converter>) {
        info!(target_type = type_name::<T>(), "registering converter");
        self.registry.insert(
            TypeId::of::<T>(),
            Arc::new(Entry {
                name: type_name::<T>(),
                converter,
            }),
        );
    }

    /// Copy every converter of `other` into this registry; `other` wins on collision.
    pub fn extend(&mut self, other: &Converters) {
        for (id, entry) in &other.registry {
            self.registry.insert(*id, entry.clone());
        }
    }

    /// Remove the converter for `T`.
    pub fn unregister<T: 'static>(&mut self) -> bool {
        self.registry.remove(&TypeId::of::<T>()).is_some()
    }

    /// Whether a converter is registered for `T`.
    pub fn contains<T: 'static>(&self) -> bool {
        self.registry.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered converters.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no converter is registered.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Convert `value` to `T`.
    ///
    /// In order: a registered converter for `T` (a failure is logged and
    /// falls through); a kind-directed parse when the source is a string;
    /// finally [`Parameter::decode`], which casts directly or round-trips
    /// structured values and fails on incompatible representations.
    pub fn convert<T: Parameter>(&self, value: Value) -> Result<T, ConvertError> {
        if let Some(entry) = self.registry.get(&TypeId::of::<T>()) {
            match entry.converter.convert(&value) {
                Ok(boxed) => match boxed.downcast::<T>() {
                    Ok(v) => return Ok(*v),
                    Err(_) => warn!(
                        target_type = entry.name,
                        "converter produced a value of the wrong type"
                    ),
                },
                Err(e) => warn!(target_type = entry.name, error = %e, "converter failed"),
            }
        }

        let value = match value {
            Value::String(s) => parse_string(s, T::CLASS),
            other => other,
        };
        T::decode(value)
    }
}

impl fmt::Debug for Converters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.registry.values().map(|e| e.name))
            .finish()
    }
}

/// Kind-directed parse of a string argument.
///
/// A parse failure is logged and the string is passed on unchanged; the
/// final cast will then most likely reject it.
fn parse_string(s: String, class: TypeClass) -> Value {
    let parsed = match class {
        TypeClass::Float => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        TypeClass::Integer => s.trim().parse::<i64>().ok().map(Value::from),
        TypeClass::Bool => s.trim().parse::<bool>().ok().map(Value::Bool),
        _ => return Value::String(s),
    };

    match parsed {
        Some(v) => v,
        None => {
            warn!(input = %s, class = ?class, "string argument could not be parsed");
            Value::String(s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Json;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Point {
        x: i64,
        y: i64,
    }

    #[test]
    fn test_strings_parse_by_target_kind() {
        let c = Converters::new();
        assert_eq!(c.convert::<i64>(json!("42")).unwrap(), 42);
        assert_eq!(c.convert::<u8>(json!(" 7 ")).unwrap(), 7);
        assert_eq!(c.convert::<f64>(json!("2.5")).unwrap(), 2.5);
        assert!(c.convert::<bool>(json!("true")).unwrap());
        assert_eq!(c.convert::<String>(json!("x")).unwrap(), "x");
    }

    #[test]
    fn test_unparseable_string_fails_the_cast() {
        let c = Converters::new();
        let err = c.convert::<i64>(json!("forty-two")).unwrap_err();
        assert!(matches!(err, ConvertError::Incompatible { .. }));
    }

    #[test]
    fn test_maps_round_trip_into_structs() {
        let c = Converters::new();
        let Json(p) = c.convert::<Json<Point>>(json!({"x": 3, "y": 4})).unwrap();
        assert_eq!(p, Point { x: 3, y: 4 });
    }

    #[test]
    fn test_registered_converter_wins() {
        let mut c = Converters::new();
        c.register(|_: &Value| Ok::<_, std::convert::Infallible>(99i64));
        assert_eq!(c.convert::<i64>(json!(1)).unwrap(), 99);
        assert!(c.unregister::<i64>());
        assert_eq!(c.convert::<i64>(json!(1)).unwrap(), 1);
    }

    #[test]
    fn test_failing_converter_falls_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let mut c = Converters::new();
        c.register(move |_: &Value| {
            seen.fetch_add(1, Ordering::SeqCst);
            Err::<i64, _>("no")
        });

        assert_eq!(c.convert::<i64>(json!("12")).unwrap(), 12);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
