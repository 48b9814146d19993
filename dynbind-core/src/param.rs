//! Parameter marshalling.
//!
//! Every type that can appear in the parameter list of an exposed callable
//! implements [`Parameter`]. The trait answers three questions the engine
//! would otherwise need reflection for: which coarse [`TypeClass`] the type
//! belongs to (for the signature string), how to build it from a loosely
//! typed caller value, and how to take it out of an injection set.

use crate::{error::ConvertError, injection::Injected};
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{
    any::{TypeId, type_name},
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc,
};

/// Coarse type class of a parameter, as seen by a weakly-typed remote caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    /// `true` / `false`.
    Bool,
    /// Any integer width, signed or unsigned.
    Integer,
    /// `f32` / `f64`.
    Float,
    /// Text.
    String,
    /// Sequences.
    Array,
    /// String-keyed maps.
    Map,
    /// Structs, shared handles and opaque values.
    Object,
    /// Types a remote caller cannot supply.
    Unsupported,
}

impl TypeClass {
    /// The one-character code used in signature strings.
    pub const fn code(self) -> char {
        match self {
            TypeClass::Bool => 'b',
            TypeClass::Integer => 'i',
            TypeClass::Float => 'f',
            TypeClass::String => 's',
            TypeClass::Array => 'a',
            TypeClass::Map => 'm',
            TypeClass::Object => 'o',
            TypeClass::Unsupported => '_',
        }
    }
}

/// Description of one logical parameter slot.
#[derive(Clone, Copy)]
pub struct ParamType {
    id: TypeId,
    name: &'static str,
    class: TypeClass,
}

impl ParamType {
    /// Describe the parameter type `T`.
    pub fn of<T: Parameter>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            class: T::CLASS,
        }
    }

    /// The runtime type identity used for injection matching.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The Rust type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The coarse type class.
    pub fn class(&self) -> TypeClass {
        self.class
    }
}

impl PartialEq for ParamType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ParamType {}

impl fmt::Debug for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.class.code())
    }
}

/// A type that can be a parameter of an exposed callable.
///
/// `decode` is the last step of coercion: it runs after registered
/// converters and string parsing (see [`Converters::convert`]) and performs
/// either a direct cast or a structured round-trip.
///
/// [`Converters::convert`]: crate::Converters::convert
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be used as a binding parameter",
    label = "missing `Parameter` implementation",
    note = "wrap serde types in `Json<T>` and injected handles in `Arc<T>`"
)]
pub trait Parameter: Clone + Send + Sync + 'static {
    /// The coarse class of this type.
    const CLASS: TypeClass;

    /// Build a value of this type from a caller-supplied value.
    fn decode(value: Value) -> Result<Self, ConvertError>;

    /// Take a value of this type out of an injected object.
    fn from_injection(injected: &Injected) -> Option<Self> {
        injected.downcast_ref::<Self>().cloned()
    }
}

macro_rules! impl_integer_parameter {
    ($($t:ty),+) => {
        $(
            impl Parameter for $t {
                const CLASS: TypeClass = TypeClass::Integer;

                fn decode(value: Value) -> Result<Self, ConvertError> {
                    match &value {
                        Value::Number(n) => {
                            if let Some(i) = n.as_i64() {
                                Ok(i as $t)
                            } else if let Some(u) = n.as_u64() {
                                Ok(u as $t)
                            } else if let Some(f) = n.as_f64() {
                                Ok(f as $t)
                            } else {
                                Err(ConvertError::incompatible::<$t>(&value))
                            }
                        }
                        _ => Err(ConvertError::incompatible::<$t>(&value)),
                    }
                }
            }
        )+
    };
}

macro_rules! impl_float_parameter {
    ($($t:ty),+) => {
        $(
            impl Parameter for $t {
                const CLASS: TypeClass = TypeClass::Float;

                fn decode(value: Value) -> Result<Self, ConvertError> {
                    match value.as_f64() {
                        Some(f) => Ok(f as $t),
                        None => Err(ConvertError::incompatible::<$t>(&value)),
                    }
                }
            }
        )+
    };
}

impl_integer_parameter!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_float_parameter!(f32, f64);

impl Parameter for bool {
    const CLASS: TypeClass = TypeClass::Bool;

    fn decode(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(ConvertError::incompatible::<bool>(&other)),
        }
    }
}

impl Parameter for String {
    const CLASS: TypeClass = TypeClass::String;

    fn decode(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(ConvertError::incompatible::<String>(&other)),
        }
    }
}

impl Parameter for Value {
    const CLASS: TypeClass = TypeClass::Object;

    fn decode(value: Value) -> Result<Self, ConvertError> {
        Ok(value)
    }
}

impl<T: Parameter> Parameter for Vec<T> {
    const CLASS: TypeClass = TypeClass::Array;

    fn decode(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Array(items) => items.into_iter().map(T::decode).collect(),
            other => Err(ConvertError::incompatible::<Self>(&other)),
        }
    }
}

impl<T: Parameter> Parameter for HashMap<String, T> {
    const CLASS: TypeClass = TypeClass::Map;

    fn decode(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Object(entries) => entries
                .into_iter()
                .map(|(k, v)| T::decode(v).map(|v| (k, v)))
                .collect(),
            other => Err(ConvertError::incompatible::<Self>(&other)),
        }
    }
}

impl<T: Parameter> Parameter for BTreeMap<String, T> {
    const CLASS: TypeClass = TypeClass::Map;

    fn decode(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Object(entries) => entries
                .into_iter()
                .map(|(k, v)| T::decode(v).map(|v| (k, v)))
                .collect(),
            other => Err(ConvertError::incompatible::<Self>(&other)),
        }
    }
}

impl<T: Parameter> Parameter for Option<T> {
    const CLASS: TypeClass = T::CLASS;

    fn decode(value: Value) -> Result<Self, ConvertError> {
        match value {
            Value::Null => Ok(None),
            other => T::decode(other).map(Some),
        }
    }
}

/// Shared handles are injection-only: a remote caller cannot produce one.
impl<T: Send + Sync + 'static> Parameter for Arc<T> {
    const CLASS: TypeClass = TypeClass::Object;

    fn decode(_value: Value) -> Result<Self, ConvertError> {
        Err(ConvertError::NotDecodable {
            type_name: type_name::<Self>(),
        })
    }
}

impl Parameter for DateTime<Utc> {
    const CLASS: TypeClass = TypeClass::Object;

    fn decode(value: Value) -> Result<Self, ConvertError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Structured parameter and return wrapper.
///
/// Arguments are built by a serde round-trip from whatever map or object the
/// caller sent; return values are serialized the same way.
///
/// ```rust,ignore
/// #[derive(Clone, Deserialize, Serialize)]
/// struct Point { x: i64, y: i64 }
///
/// registry.register_function(|Json(p): Json<Point>| p.x + p.y, "Geo", "sum");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Unwrap the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Parameter for Json<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    const CLASS: TypeClass = TypeClass::Object;

    fn decode(value: Value) -> Result<Self, ConvertError> {
        Ok(Json(serde_json::from_value(value)?))
    }
}

impl<T: Serialize> Serialize for Json<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}
