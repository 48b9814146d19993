//! # dynbind - Dynamic Binding Registry
//!
//! `dynbind` exposes ordinary Rust functions, methods, object attributes and
//! request handlers under two-level names (`interface.method`) and invokes
//! them from loosely typed argument lists, as they arrive from a web or RPC
//! transport.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dynbind::prelude::*;
//!
//! let mut registry = Registry::new();
//! registry.register_function(|a: i64, b: i64| a + b, "Calc", "add");
//!
//! let sum = registry.invoke("Calc", "add", args!["2", 3])?;
//! assert_eq!(sum, serde_json::json!(5));
//! ```
//!
//! ## Injection and Filters
//!
//! Parameters can be filled by type from an injection set instead of from
//! the caller's arguments, and filters run before each invocation:
//!
//! ```rust,ignore
//! registry
//!     .register_function(|db: Arc<Db>, id: i64| db.load(id), "Users", "get")
//!     .inject(db.clone())
//!     .filter(LoggingFilter::new());
//!
//! assert_eq!(registry.signature("Users", "get").as_deref(), Some("i"));
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

extern crate self as dynbind;

mod expose;
mod registry;
mod remote;
mod selection;

pub use dynbind_core::{
    // Callables
    ArgVector,
    AttributeBinding,
    // Bindings
    Binding,
    BindingKind,
    // Errors
    BoxError,
    Callable,
    // Remote
    CallerContext,
    ConvertError,
    // Conversion
    Converter,
    Converters,
    DynbindError,
    // Filters
    Filter,
    FilterChain,
    Function,
    FunctionBinding,
    HandlerBinding,
    // Injection
    Injected,
    Injections,
    InvokeError,
    Json,
    Method,
    MethodBinding,
    ParamType,
    Parameter,
    QualifiedName,
    RegistrationError,
    RemoteBinding,
    RemoteCall,
    RemoteTransport,
    Returns,
    TypeClass,
    engine,
    injections,
};

pub use expose::{AttributeSet, ExposeAttributes, ExposeMethods, MethodSet, short_type_name};
pub use registry::{BindingDescriptor, Registry, RegistryBuilder, RegistryConfig};
pub use remote::LocalTransport;
pub use selection::Selection;

#[doc(hidden)]
pub use serde_json;

/// Built-in converters.
pub mod converters {
    pub use dynbind_std::converters::{TimeError, install, string_converter, time_converter};
}

/// Standard filter implementations.
pub mod filters {
    pub use dynbind_std::filters::{AutoInject, InjectedPredicate, LoggingFilter, auto_inject};
}

/// Remote transports.
#[cfg(feature = "http")]
pub mod transport {
    pub use dynbind_std::transport::{
        CORRELATION_HEADER, ERROR_HEADER, HttpError, HttpTransport, PROXY_HEADER,
    };
}

/// Testing utilities.
pub mod testing {
    pub use dynbind_std::testing::{CountingFilter, MockTransport, RecordingFilter};
}

/// Build a raw argument list.
///
/// Each element is converted with `serde_json::json!`.
///
/// ```rust,ignore
/// registry.invoke("Calc", "add", args![1, "2"])?;
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::serde_json::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::serde_json::json!($value)),+]
    };
}

/// Prelude module - common imports for dynbind.
///
/// # Usage
///
/// ```rust,ignore
/// use dynbind::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Errors
        BoxError,
        CallerContext,
        ExposeAttributes,
        ExposeMethods,
        Filter,
        Injections,
        InvokeError,
        Json,
        LocalTransport,
        // Core types
        Registry,
        RegistryBuilder,
        RemoteTransport,
        args,
        filters::{LoggingFilter, auto_inject},
        injections,
    };
}

#[cfg(feature = "macros")]
pub use dynbind_macros::{ExposeAttributes, expose};
