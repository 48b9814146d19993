//! Error types for dynbind.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`DynbindError`] - Top-level error type for all dynbind operations
//! - [`InvokeError`] - Errors that abort a single invocation
//! - [`ConvertError`] - Errors from coercing a caller value to a parameter type
//! - [`RegistrationError`] - Errors from registration calls that take user input

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all dynbind operations.
#[derive(Error, Debug)]
pub enum DynbindError {
    /// An invocation failed.
    #[error("invocation error: {0}")]
    Invoke(#[from] InvokeError),

    /// A value could not be converted.
    #[error("conversion error: {0}")]
    Convert(#[from] ConvertError),

    /// A registration call was rejected.
    #[error("registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Errors that abort a single invocation.
///
/// These are fatal to the call, never to the process. The registry never
/// retries; the transport layer is expected to turn them into a failure
/// response.
#[derive(Error, Debug)]
pub enum InvokeError {
    /// No binding is registered under the requested name.
    #[error("binding \"{interface}.{method}\" not found")]
    NotFound {
        /// Requested interface name.
        interface: String,
        /// Requested method name.
        method: String,
    },

    /// An injected parameter has no value of its type in the merged injection set.
    #[error("injection for type `{type_name}` not found (binding \"{binding}\", position {position})")]
    MissingInjection {
        /// Qualified binding name.
        binding: String,
        /// Logical parameter position.
        position: usize,
        /// Name of the required type.
        type_name: &'static str,
    },

    /// An injected value could not be turned into the parameter type.
    #[error("injected value of type `{found}` does not satisfy `{expected}` at position {position}")]
    InjectionMismatch {
        /// Logical parameter position.
        position: usize,
        /// Name of the parameter type.
        expected: &'static str,
        /// Name of the injected value's type.
        found: &'static str,
    },

    /// The caller supplied too few or too many arguments.
    #[error(
        "argument count does not match for \"{binding}\": expected {expected}, got {supplied} ({injected} injections applied)"
    )]
    ArgumentCount {
        /// Qualified binding name.
        binding: String,
        /// Number of caller-supplied parameters the binding accepts.
        expected: usize,
        /// Number of arguments the caller supplied.
        supplied: usize,
        /// Number of injected positions.
        injected: usize,
    },

    /// A caller-supplied argument could not be converted to the parameter type.
    #[error("argument at position {position} cannot be converted to `{type_name}`")]
    Conversion {
        /// Logical parameter position.
        position: usize,
        /// Name of the parameter type.
        type_name: &'static str,
        /// Underlying conversion failure.
        #[source]
        source: ConvertError,
    },

    /// The callable itself returned an error.
    #[error("callable failed: {0}")]
    Callable(#[source] BoxError),

    /// The remote side of a proxy binding failed.
    #[error("remote call failed: {0}")]
    Remote(#[source] BoxError),

    /// The return value could not be encoded.
    #[error("return value could not be encoded: {0}")]
    Return(#[source] serde_json::Error),
}

/// Errors from coercing one runtime value to a target type.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The source representation cannot be cast to the target type.
    #[error("cannot convert {found} to `{expected}`")]
    Incompatible {
        /// Coarse kind of the source value.
        found: &'static str,
        /// Name of the target type.
        expected: &'static str,
    },

    /// The target type can only be injected, never built from caller data.
    #[error("`{type_name}` cannot be built from a caller-supplied value")]
    NotDecodable {
        /// Name of the target type.
        type_name: &'static str,
    },

    /// The structured round-trip failed.
    #[error("structured conversion failed: {0}")]
    Structured(#[from] serde_json::Error),

    /// A registered converter failed.
    #[error("converter failed: {0}")]
    Converter(#[source] BoxError),
}

/// Errors from registration calls.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// A name pattern is not a valid regular expression.
    #[error("invalid name pattern \"{pattern}\": {source}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// Compilation error.
        #[source]
        source: regex::Error,
    },

    /// A remote endpoint is not a valid URL.
    #[error("\"{endpoint}\" is not a valid url: {source}")]
    InvalidEndpoint {
        /// The rejected endpoint.
        endpoint: String,
        /// Parse error.
        #[source]
        source: url::ParseError,
    },
}

// Convenience conversions
impl From<BoxError> for DynbindError {
    fn from(err: BoxError) -> Self {
        DynbindError::Custom(err)
    }
}

impl ConvertError {
    /// Build an [`ConvertError::Incompatible`] for a source value and a target type.
    pub fn incompatible<T: ?Sized>(found: &serde_json::Value) -> Self {
        ConvertError::Incompatible {
            found: value_kind(found),
            expected: std::any::type_name::<T>(),
        }
    }
}

/// Coarse name of a JSON value's kind, for messages.
pub fn value_kind(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_kind_names() {
        assert_eq!(value_kind(&json!(null)), "null");
        assert_eq!(value_kind(&json!(1)), "integer");
        assert_eq!(value_kind(&json!(1.5)), "float");
        assert_eq!(value_kind(&json!("x")), "string");
        assert_eq!(value_kind(&json!([1])), "array");
        assert_eq!(value_kind(&json!({"a": 1})), "map");
    }

    #[test]
    fn test_invoke_error_into_top_level() {
        let err: DynbindError = InvokeError::NotFound {
            interface: "X".into(),
            method: "M".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "invocation error: binding \"X.M\" not found"
        );
    }
}
