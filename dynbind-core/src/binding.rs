//! Bindings: a callable plus its per-binding configuration.

use crate::{
    callable::{BindingKind, Callable},
    convert::Converters,
    engine,
    error::{ConvertError, InvokeError},
    filter::{Filter, FilterChain},
    injection::{Injected, Injections},
    param::{ParamType, Parameter, TypeClass},
};
use serde_json::Value;
use std::{
    any::{Any, TypeId, type_name},
    collections::BTreeMap,
    fmt,
    sync::Arc,
};

/// The two-level name of a binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    /// Interface (namespace) name.
    pub interface: String,
    /// Method name within the interface.
    pub method: String,
}

impl QualifiedName {
    /// Create a qualified name.
    pub fn new(interface: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.interface, self.method)
    }
}

/// Every invocation injects the name of the binding being called, so a
/// callable may take it as a parameter.
impl Parameter for QualifiedName {
    const CLASS: TypeClass = TypeClass::Object;

    fn decode(_value: Value) -> Result<Self, ConvertError> {
        Err(ConvertError::NotDecodable {
            type_name: type_name::<Self>(),
        })
    }
}

/// A registered, named, configured callable.
///
/// Besides the callable itself a binding carries:
///
/// - the set of parameter positions filled by injection,
/// - its singleton injections (defaults for those positions),
/// - its filter chain.
pub struct Binding {
    name: QualifiedName,
    callable: Box<dyn Callable>,
    injected: BTreeMap<usize, ParamType>,
    singletons: Injections,
    filters: FilterChain,
}

impl Binding {
    /// Wrap a callable under `name`, with no singletons and no filters.
    ///
    /// Parameters of type [`QualifiedName`] are injected from the start.
    pub fn new(name: QualifiedName, callable: Box<dyn Callable>) -> Self {
        let injected = callable
            .params()
            .iter()
            .enumerate()
            .filter(|(_, param)| param.id() == TypeId::of::<QualifiedName>())
            .map(|(i, param)| (i, *param))
            .collect();

        Self {
            name,
            callable,
            injected,
            singletons: Injections::new(),
            filters: FilterChain::new(),
        }
    }

    /// The qualified name.
    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    /// The callable's shape.
    pub fn kind(&self) -> BindingKind {
        self.callable.kind()
    }

    /// The underlying callable.
    pub fn callable(&self) -> &dyn Callable {
        self.callable.as_ref()
    }

    /// All logical parameters, injected ones included.
    pub fn params(&self) -> &[ParamType] {
        self.callable.params()
    }

    /// Parameters a caller has to supply, in order.
    pub fn visible_params(&self) -> Vec<ParamType> {
        self.callable
            .params()
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.injected.contains_key(i))
            .map(|(_, p)| *p)
            .collect()
    }

    /// Signature string over the visible parameters.
    pub fn signature(&self) -> String {
        self.callable.signature(&self.visible_params())
    }

    /// Whether position `i` is filled by injection.
    pub fn is_injected(&self, i: usize) -> bool {
        self.injected.contains_key(&i)
    }

    /// Number of positions filled by injection.
    pub fn injected_count(&self) -> usize {
        self.injected.len()
    }

    /// The binding's singleton injections.
    pub fn singletons(&self) -> &Injections {
        &self.singletons
    }

    /// The binding's filter chain.
    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    /// Attach a singleton injection.
    ///
    /// Every parameter whose type is exactly `V` becomes injected, and
    /// `value` becomes its default. A call-scoped injection of the same
    /// type takes precedence. If no parameter has type `V` the value is
    /// still kept, for filters and handlers to read.
    pub fn inject<V: Any + Send + Sync>(&mut self, value: V) -> &mut Self {
        self.inject_shared(Injected::new(value))
    }

    /// Attach an already wrapped singleton injection.
    pub fn inject_shared(&mut self, injected: Injected) -> &mut Self {
        for (i, param) in self.callable.params().iter().enumerate() {
            if param.id() == injected.type_id() {
                self.injected.insert(i, *param);
            }
        }
        self.singletons.insert_injected(injected);
        self
    }

    /// Append a filter.
    pub fn filter<F: Filter>(&mut self, filter: F) -> &mut Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Append a shared filter.
    pub fn filter_shared(&mut self, filter: Arc<dyn Filter>) -> &mut Self {
        self.filters.push(filter);
        self
    }

    /// Remove every filter.
    pub fn clear_filters(&mut self) -> &mut Self {
        self.filters.clear();
        self
    }

    /// Invoke this binding. See [`engine::invoke`].
    pub fn call(
        &self,
        converters: &Converters,
        injections: &Injections,
        args: Vec<Value>,
    ) -> Result<Value, InvokeError> {
        engine::invoke(self, converters, injections, args)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name.to_string())
            .field("kind", &self.kind())
            .field("params", &self.params())
            .field("injected", &self.injected.keys().collect::<Vec<_>>())
            .field("singletons", &self.singletons)
            .field("filters", &self.filters.len())
            .finish()
    }
}
