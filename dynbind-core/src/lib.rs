//! # dynbind-core
//!
//! Core traits and the invocation engine of the dynbind binding registry.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! transports and extensions that don't need the full `dynbind` registry.
//!
//! # Building Blocks
//!
//! ## Marshalling ([`Parameter`], [`Returns`], [`Converters`])
//!
//! Callers send loosely typed [`serde_json::Value`]s. Each parameter type
//! knows its coarse [`TypeClass`] and how to be built from such a value;
//! the [`Converters`] registry adds per-type overrides on top.
//!
//! ## Callables ([`Callable`])
//!
//! A uniform, object-safe description of one exposed unit of behavior:
//! functions, methods on shared receivers, attribute getters, raw handlers
//! and remote proxies. Typed adapters are generated per closure arity.
//!
//! ## Bindings ([`Binding`], [`Injections`], [`Filter`])
//!
//! A callable registered under a [`QualifiedName`], together with its
//! injected parameter positions, singleton injections and filter chain.
//!
//! ## Engine ([`engine::invoke`])
//!
//! Merges injections, runs filters, assembles and converts arguments, calls,
//! and normalizes the result.
//!
//! # Error Types
//!
//! - [`DynbindError`] - Top-level error type
//! - [`InvokeError`] - Invocation errors
//! - [`ConvertError`] - Conversion errors
//! - [`RegistrationError`] - Registration errors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod binding;
mod callable;
mod convert;
pub mod engine;
mod error;
mod filter;
mod injection;
mod param;
mod remote;
mod returns;

// Re-exports
pub use binding::{Binding, QualifiedName};
pub use callable::{
    ArgVector, AttributeBinding, BindingKind, Callable, Function, FunctionBinding, HandlerBinding,
    Method, MethodBinding,
};
pub use convert::{Converter, Converters};
pub use error::{
    BoxError, ConvertError, DynbindError, InvokeError, RegistrationError, value_kind,
};
pub use filter::{Filter, FilterChain};
pub use injection::{Injected, Injections};
pub use param::{Json, ParamType, Parameter, TypeClass};
pub use remote::{CallerContext, RemoteBinding, RemoteCall, RemoteTransport};
pub use returns::Returns;
