//! Object exposure.
//!
//! Without runtime reflection an object announces its exposable methods and
//! attributes by implementing [`ExposeMethods`] and [`ExposeAttributes`].
//! Both are normally derived: `#[dynbind::expose]` on an inherent impl
//! block, `#[derive(dynbind::ExposeAttributes)]` on a struct.
//!
//! ```rust,ignore
//! struct Calc;
//!
//! impl ExposeMethods for Calc {
//!     fn methods(set: &mut MethodSet<Self>) {
//!         set.method("add", |_: &Calc, a: i64, b: i64| a + b)
//!             .method("neg", |_: &Calc, a: i64| -a);
//!     }
//! }
//! ```

use dynbind_core::{AttributeBinding, Callable, Method, MethodBinding, Returns};
use std::{any::type_name, sync::Arc};

/// Unqualified name of `T`, without module path or generic arguments.
pub fn short_type_name<T: ?Sized>() -> String {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// A type whose methods can be exposed.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not expose any methods",
    label = "missing `ExposeMethods` implementation",
    note = "add `#[dynbind::expose]` to an inherent `impl {Self}` block"
)]
pub trait ExposeMethods: Send + Sync + Sized + 'static {
    /// Default interface name. The short type name unless overridden.
    fn interface_name() -> String {
        short_type_name::<Self>()
    }

    /// Enumerate the exposable methods.
    fn methods(set: &mut MethodSet<Self>);
}

/// A type whose fields can be exposed as read-only attributes.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not expose any attributes",
    label = "missing `ExposeAttributes` implementation",
    note = "add `#[derive(dynbind::ExposeAttributes)]` to the struct"
)]
pub trait ExposeAttributes: Send + Sync + Sized + 'static {
    /// Default interface name. The short type name unless overridden.
    fn interface_name() -> String {
        short_type_name::<Self>()
    }

    /// Enumerate the exposable attributes.
    fn attributes(set: &mut AttributeSet<Self>);
}

pub(crate) struct Exposed {
    pub(crate) name: String,
    pub(crate) callable: Box<dyn Callable>,
    pub(crate) return_arity: usize,
}

/// Collects the methods of one receiver.
pub struct MethodSet<T> {
    receiver: Arc<T>,
    entries: Vec<Exposed>,
}

impl<T: Send + Sync + 'static> MethodSet<T> {
    pub(crate) fn new(receiver: Arc<T>) -> Self {
        Self {
            receiver,
            entries: Vec::new(),
        }
    }

    /// Add a method under `name`.
    pub fn method<F, Marker>(&mut self, name: &str, method: F) -> &mut Self
    where
        F: Method<T, Marker>,
        Marker: 'static,
    {
        self.entries.push(Exposed {
            name: name.to_string(),
            return_arity: F::return_arity(),
            callable: Box::new(MethodBinding::new(self.receiver.clone(), method)),
        });
        self
    }

    pub(crate) fn into_entries(self) -> Vec<Exposed> {
        self.entries
    }
}

/// Collects the attributes of one object.
pub struct AttributeSet<T> {
    receiver: Arc<T>,
    entries: Vec<Exposed>,
}

impl<T: Send + Sync + 'static> AttributeSet<T> {
    pub(crate) fn new(receiver: Arc<T>) -> Self {
        Self {
            receiver,
            entries: Vec::new(),
        }
    }

    /// Add a read-only attribute under `name`.
    pub fn attribute<R, G>(&mut self, name: &str, getter: G) -> &mut Self
    where
        R: Returns,
        G: Fn(&T) -> R + Send + Sync + 'static,
    {
        self.entries.push(Exposed {
            name: name.to_string(),
            return_arity: R::ARITY,
            callable: Box::new(AttributeBinding::new(self.receiver.clone(), getter)),
        });
        self
    }

    pub(crate) fn into_entries(self) -> Vec<Exposed> {
        self.entries
    }
}
