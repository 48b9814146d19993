//! Return value marshalling.

use crate::{
    error::{BoxError, InvokeError},
    param::Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// A type that can be returned by an exposed callable.
///
/// `ARITY` is the number of values the callable produces. Zero becomes a
/// null result; one is passed through; anything above one is a policy
/// violation: method exposure skips such methods, and the engine keeps only
/// the first value if one is invoked anyway.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be returned from a binding",
    label = "missing `Returns` implementation",
    note = "wrap serde types in `Json<T>`"
)]
pub trait Returns {
    /// Number of values produced.
    const ARITY: usize;

    /// Encode the produced values.
    fn into_values(self) -> Result<Vec<Value>, InvokeError>;
}

fn encode<T: Serialize>(value: T) -> Result<Value, InvokeError> {
    serde_json::to_value(value).map_err(InvokeError::Return)
}

impl Returns for () {
    const ARITY: usize = 0;

    fn into_values(self) -> Result<Vec<Value>, InvokeError> {
        Ok(Vec::new())
    }
}

macro_rules! impl_single_returns {
    ($($t:ty),+ $(,)?) => {
        $(
            impl Returns for $t {
                const ARITY: usize = 1;

                fn into_values(self) -> Result<Vec<Value>, InvokeError> {
                    Ok(vec![encode(self)?])
                }
            }
        )+
    };
}

impl_single_returns!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String, &'static str,
    DateTime<Utc>,
);

impl Returns for Value {
    const ARITY: usize = 1;

    fn into_values(self) -> Result<Vec<Value>, InvokeError> {
        Ok(vec![self])
    }
}

impl<T: Serialize> Returns for Vec<T> {
    const ARITY: usize = 1;

    fn into_values(self) -> Result<Vec<Value>, InvokeError> {
        Ok(vec![encode(self)?])
    }
}

impl<T: Serialize> Returns for HashMap<String, T> {
    const ARITY: usize = 1;

    fn into_values(self) -> Result<Vec<Value>, InvokeError> {
        Ok(vec![encode(self)?])
    }
}

impl<T: Serialize> Returns for BTreeMap<String, T> {
    const ARITY: usize = 1;

    fn into_values(self) -> Result<Vec<Value>, InvokeError> {
        Ok(vec![encode(self)?])
    }
}

impl<T: Serialize> Returns for Option<T> {
    const ARITY: usize = 1;

    fn into_values(self) -> Result<Vec<Value>, InvokeError> {
        Ok(vec![encode(self)?])
    }
}

impl<T: Serialize> Returns for Json<T> {
    const ARITY: usize = 1;

    fn into_values(self) -> Result<Vec<Value>, InvokeError> {
        Ok(vec![encode(self.0)?])
    }
}

impl<R, E> Returns for Result<R, E>
where
    R: Returns,
    E: Into<BoxError>,
{
    const ARITY: usize = R::ARITY;

    fn into_values(self) -> Result<Vec<Value>, InvokeError> {
        match self {
            Ok(r) => r.into_values(),
            Err(e) => Err(InvokeError::Callable(e.into())),
        }
    }
}

/// Macro to implement Returns for tuples, one value per element.
macro_rules! impl_tuple_returns {
    ($n:expr; $($T:ident),+) => {
        impl<$($T: Serialize,)+> Returns for ($($T,)+) {
            const ARITY: usize = $n;

            #[allow(non_snake_case)]
            fn into_values(self) -> Result<Vec<Value>, InvokeError> {
                let ($($T,)+) = self;
                Ok(vec![$(encode($T)?),+])
            }
        }
    };
}

impl_tuple_returns!(2; T1, T2);
impl_tuple_returns!(3; T1, T2, T3);
impl_tuple_returns!(4; T1, T2, T3, T4);
