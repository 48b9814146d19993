//! The binding registry.
//!
//! A two-level namespace `interface → method → Binding`, plus the
//! registry-wide state: global injections, the converter registry and a
//! revision counter bumped on every change to the set of bindings.
//!
//! Invocation takes `&self`; every mutation takes `&mut self`. Share a
//! finished registry as `Arc<Registry>` to invoke from several threads.

use crate::{
    expose::{AttributeSet, ExposeAttributes, ExposeMethods, Exposed, MethodSet},
    selection::Selection,
};
use dynbind_core::{
    Binding, BindingKind, BoxError, Callable, Converters, Function, FunctionBinding,
    HandlerBinding, Injected, Injections, InvokeError, QualifiedName, RegistrationError,
    RemoteBinding, RemoteTransport, Returns, engine,
};
use dynbind_std::converters;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::{
    any::Any,
    collections::{HashMap, hash_map::Entry},
    fmt,
    sync::Arc,
};
use tracing::{debug, warn};
use url::Url;

// ============================================================================
// Configuration
// ============================================================================

/// Registry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Interface used by [`Registry::expose_function`].
    pub default_interface: String,
    /// Method name used by [`Registry::expose_function`].
    pub default_method: String,
    /// Whether the built-in string and timestamp converters are installed.
    pub default_converters: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_interface: String::from("main"),
            default_method: String::from("f"),
            default_converters: true,
        }
    }
}

/// Builder for constructing a [`Registry`].
///
/// # Example
/// ```ignore
/// let registry = RegistryBuilder::new()
///     .with_default_interface("app")
///     .with_global_injection(Arc::new(pool))
///     .build();
/// ```
pub struct RegistryBuilder {
    config: RegistryConfig,
    converters: Converters,
    global: Injections,
}

impl RegistryBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: RegistryConfig::default(),
            converters: Converters::new(),
            global: Injections::new(),
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default interface name.
    pub fn with_default_interface(mut self, name: impl Into<String>) -> Self {
        self.config.default_interface = name.into();
        self
    }

    /// Set the default method name.
    pub fn with_default_method(mut self, name: impl Into<String>) -> Self {
        self.config.default_method = name.into();
        self
    }

    /// Enable or disable the built-in converters.
    pub fn with_default_converters(mut self, enabled: bool) -> Self {
        self.config.default_converters = enabled;
        self
    }

    /// Register a converter for `T`.
    pub fn with_converter<T, E, F>(mut self, func: F) -> Self
    where
        T: Send + 'static,
        E: Into<BoxError>,
        F: Fn(&Value) -> Result<T, E> + Send + Sync + 'static,
    {
        self.converters.register(func);
        self
    }

    /// Declare a global injection.
    pub fn with_global_injection<V: Any + Send + Sync>(mut self, value: V) -> Self {
        self.global.insert(value);
        self
    }

    /// Build the registry.
    ///
    /// Converters registered on the builder take precedence over the
    /// built-in ones.
    pub fn build(self) -> Registry {
        let mut converters = Converters::new();
        if self.config.default_converters {
            converters::install(&mut converters);
        }
        converters.extend(&self.converters);

        Registry {
            interfaces: HashMap::new(),
            revision: 0,
            global: self.global,
            converters,
            config: self.config,
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Serializable description of one binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingDescriptor {
    /// Qualified name, `interface.method`.
    pub name: String,
    /// Interface name.
    pub interface: String,
    /// Method name.
    pub method: String,
    /// Callable shape.
    pub kind: BindingKind,
    /// Signature over the visible parameters.
    pub signature: String,
}

/// How exposure selects names.
pub(crate) enum NameMatch {
    All,
    Exact(String),
    Pattern(Regex),
}

impl NameMatch {
    pub(crate) fn compile(pattern: &str) -> Result<Self, RegistrationError> {
        if pattern.is_empty() {
            return Ok(NameMatch::All);
        }
        Regex::new(pattern)
            .map(NameMatch::Pattern)
            .map_err(|source| RegistrationError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub(crate) fn matches(&self, name: &str) -> bool {
        match self {
            NameMatch::All => true,
            NameMatch::Exact(exact) => exact == name,
            NameMatch::Pattern(re) => re.is_match(name),
        }
    }
}

/// The binding registry.
pub struct Registry {
    interfaces: HashMap<String, HashMap<String, Binding>>,
    revision: u64,
    global: Injections,
    converters: Converters,
    config: RegistryConfig,
}

impl Registry {
    /// Create a registry with default settings.
    pub fn new() -> Self {
        RegistryBuilder::new().build()
    }

    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// The registry settings.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Register `callable` as `interface.method`.
    ///
    /// An existing binding under the same name is replaced. Global injections
    /// are applied to the new binding.
    pub fn register(
        &mut self,
        interface: impl Into<String>,
        method: impl Into<String>,
        callable: Box<dyn Callable>,
    ) -> &mut Binding {
        let name = QualifiedName::new(interface, method);
        let mut binding = Binding::new(name.clone(), callable);
        for injected in self.global.iter() {
            binding.inject_shared(injected.clone());
        }

        debug!(binding = %name, kind = %binding.kind(), "registering binding");
        self.revision += 1;

        let methods = self.interfaces.entry(name.interface).or_default();
        match methods.entry(name.method) {
            Entry::Occupied(mut slot) => {
                warn!(binding = %slot.get().name(), "overwriting existing binding");
                slot.insert(binding);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(binding),
        }
    }

    /// Register a free function or closure.
    pub fn register_function<F, Args>(
        &mut self,
        func: F,
        interface: impl Into<String>,
        method: impl Into<String>,
    ) -> &mut Binding
    where
        F: Function<Args>,
        Args: 'static,
    {
        self.register(interface, method, Box::new(FunctionBinding::new(func)))
    }

    /// Register a function under the default interface and method names.
    pub fn expose_function<F, Args>(&mut self, func: F) -> &mut Binding
    where
        F: Function<Args>,
        Args: 'static,
    {
        let interface = self.config.default_interface.clone();
        let method = self.config.default_method.clone();
        self.register_function(func, interface, method)
    }

    /// Register a raw request handler. `C` is the transport's request context.
    pub fn register_handler<C, F, R>(
        &mut self,
        interface: impl Into<String>,
        method: impl Into<String>,
        handler: F,
    ) -> &mut Binding
    where
        C: Send + Sync + 'static,
        F: Fn(&C) -> R + Send + Sync + 'static,
        R: Returns + 'static,
    {
        self.register(interface, method, Box::new(HandlerBinding::new(handler)))
    }

    /// Register `local_interface.local_method` as a proxy to
    /// `remote_interface.remote_method` at `endpoint`.
    ///
    /// `signature` is the remote binding's signature.
    #[allow(clippy::too_many_arguments)]
    pub fn register_remote(
        &mut self,
        local_interface: impl Into<String>,
        local_method: impl Into<String>,
        endpoint: &str,
        remote_interface: impl Into<String>,
        remote_method: impl Into<String>,
        signature: impl Into<String>,
        transport: Arc<dyn RemoteTransport>,
    ) -> Result<&mut Binding, RegistrationError> {
        let endpoint = Url::parse(endpoint).map_err(|source| RegistrationError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let proxy = RemoteBinding::new(
            endpoint,
            remote_interface,
            remote_method,
            signature,
            transport,
        );
        Ok(self.register(local_interface, local_method, Box::new(proxy)))
    }

    /// Expose the methods of `object` whose names match `pattern`.
    ///
    /// An empty pattern matches every method. Methods returning more than
    /// one value are skipped. The interface defaults to
    /// [`ExposeMethods::interface_name`].
    pub fn expose_methods<T: ExposeMethods>(
        &mut self,
        object: Arc<T>,
        pattern: &str,
        interface: Option<&str>,
    ) -> Result<Selection<'_>, RegistrationError> {
        let matcher = NameMatch::compile(pattern)?;
        Ok(self.expose_methods_matching(object, &matcher, interface))
    }

    /// Expose every method of `object`.
    pub fn expose_interface<T: ExposeMethods>(
        &mut self,
        object: Arc<T>,
        interface: Option<&str>,
    ) -> Selection<'_> {
        self.expose_methods_matching(object, &NameMatch::All, interface)
    }

    /// Expose the single method `name` of `object`.
    pub fn expose_method<T: ExposeMethods>(
        &mut self,
        object: Arc<T>,
        name: &str,
        interface: Option<&str>,
    ) -> Selection<'_> {
        let matcher = NameMatch::Exact(name.to_string());
        self.expose_methods_matching(object, &matcher, interface)
    }

    fn expose_methods_matching<T: ExposeMethods>(
        &mut self,
        object: Arc<T>,
        matcher: &NameMatch,
        interface: Option<&str>,
    ) -> Selection<'_> {
        let interface = interface
            .map(str::to_string)
            .unwrap_or_else(<T as ExposeMethods>::interface_name);
        let mut set = MethodSet::new(object);
        T::methods(&mut set);
        self.register_exposed(&interface, set.into_entries(), matcher)
    }

    /// Expose the attributes of `object` whose names match `pattern`.
    pub fn expose_attributes<T: ExposeAttributes>(
        &mut self,
        object: Arc<T>,
        pattern: &str,
        interface: Option<&str>,
    ) -> Result<Selection<'_>, RegistrationError> {
        let matcher = NameMatch::compile(pattern)?;
        Ok(self.expose_attributes_matching(object, &matcher, interface))
    }

    /// Expose every attribute of `object`.
    pub fn expose_all_attributes<T: ExposeAttributes>(
        &mut self,
        object: Arc<T>,
        interface: Option<&str>,
    ) -> Selection<'_> {
        self.expose_attributes_matching(object, &NameMatch::All, interface)
    }

    fn expose_attributes_matching<T: ExposeAttributes>(
        &mut self,
        object: Arc<T>,
        matcher: &NameMatch,
        interface: Option<&str>,
    ) -> Selection<'_> {
        let interface = interface
            .map(str::to_string)
            .unwrap_or_else(<T as ExposeAttributes>::interface_name);
        let mut set = AttributeSet::new(object);
        T::attributes(&mut set);
        self.register_exposed(&interface, set.into_entries(), matcher)
    }

    fn register_exposed(
        &mut self,
        interface: &str,
        entries: Vec<Exposed>,
        matcher: &NameMatch,
    ) -> Selection<'_> {
        let mut names = Vec::new();
        for entry in entries {
            if !matcher.matches(&entry.name) {
                continue;
            }
            if entry.return_arity > 1 {
                warn!(
                    interface,
                    method = %entry.name,
                    returns = entry.return_arity,
                    "skipping method with more than one return value"
                );
                continue;
            }
            self.register(interface, entry.name.clone(), entry.callable);
            names.push(QualifiedName::new(interface, entry.name));
        }
        Selection::new(self, names)
    }

    // ------------------------------------------------------------------------
    // Lookup and enumeration
    // ------------------------------------------------------------------------

    /// Look up a binding.
    pub fn lookup(&self, interface: &str, method: &str) -> Option<&Binding> {
        self.interfaces.get(interface)?.get(method)
    }

    /// Look up a binding for configuration.
    pub fn binding_mut(&mut self, interface: &str, method: &str) -> Option<&mut Binding> {
        self.interfaces.get_mut(interface)?.get_mut(method)
    }

    /// Every binding, in unspecified order.
    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.interfaces.values().flat_map(|methods| methods.values())
    }

    /// Every interface name, in unspecified order.
    pub fn interface_names(&self) -> impl Iterator<Item = &str> {
        self.interfaces.keys().map(String::as_str)
    }

    /// Every method name of `interface`, in unspecified order.
    pub fn method_names<'a>(&'a self, interface: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.interfaces
            .get(interface)
            .into_iter()
            .flat_map(|methods| methods.keys().map(String::as_str))
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.interfaces.values().map(HashMap::len).sum()
    }

    /// Whether no binding is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Signature of `interface.method`.
    pub fn signature(&self, interface: &str, method: &str) -> Option<String> {
        self.lookup(interface, method).map(Binding::signature)
    }

    /// Monotonic change counter of the set of bindings.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Describe every binding, sorted by name.
    pub fn describe(&self) -> Vec<BindingDescriptor> {
        let mut descriptors: Vec<_> = self
            .bindings()
            .map(|b| BindingDescriptor {
                name: b.name().to_string(),
                interface: b.name().interface.clone(),
                method: b.name().method.clone(),
                kind: b.kind(),
                signature: b.signature(),
            })
            .collect();
        descriptors.sort_by(|a, b| (&a.interface, &a.method).cmp(&(&b.interface, &b.method)));
        descriptors
    }

    // ------------------------------------------------------------------------
    // Removal and selection
    // ------------------------------------------------------------------------

    /// Remove `interface.method`. An interface left empty is dropped.
    pub fn remove(&mut self, interface: &str, method: &str) -> Option<Binding> {
        let methods = self.interfaces.get_mut(interface)?;
        let removed = methods.remove(method)?;
        if methods.is_empty() {
            self.interfaces.remove(interface);
        }
        self.revision += 1;
        debug!(binding = %removed.name(), "removed binding");
        Some(removed)
    }

    /// Remove every binding of `interface`. Returns how many were removed.
    pub fn remove_interface(&mut self, interface: &str) -> usize {
        let removed = self
            .interfaces
            .remove(interface)
            .map(|methods| methods.len())
            .unwrap_or(0);
        self.revision += removed as u64;
        if removed > 0 {
            debug!(interface, removed, "removed interface");
        }
        removed
    }

    /// Select every binding.
    pub fn select_all(&mut self) -> Selection<'_> {
        let names = self.bindings().map(|b| b.name().clone()).collect();
        Selection::new(self, names)
    }

    /// Select every binding of `interface`.
    pub fn select_interface(&mut self, interface: &str) -> Selection<'_> {
        let names = self
            .method_names(interface)
            .map(|m| QualifiedName::new(interface, m))
            .collect();
        Selection::new(self, names)
    }

    /// Select the bindings whose `interface.method` name matches `pattern`.
    pub fn select_matching(&mut self, pattern: &str) -> Result<Selection<'_>, RegistrationError> {
        let matcher = NameMatch::compile(pattern)?;
        let names = self
            .bindings()
            .map(|b| b.name().clone())
            .filter(|name| matcher.matches(&name.to_string()))
            .collect();
        Ok(Selection::new(self, names))
    }

    // ------------------------------------------------------------------------
    // Injections and converters
    // ------------------------------------------------------------------------

    /// Inject `value` into every current and future binding.
    pub fn declare_global_injection<V: Any + Send + Sync>(&mut self, value: V) {
        let injected = Injected::new(value);
        for methods in self.interfaces.values_mut() {
            for binding in methods.values_mut() {
                binding.inject_shared(injected.clone());
            }
        }
        self.global.insert_injected(injected);
    }

    /// The global injections.
    pub fn global_injections(&self) -> &Injections {
        &self.global
    }

    /// The converter registry.
    pub fn converters(&self) -> &Converters {
        &self.converters
    }

    /// The converter registry, for changes.
    pub fn converters_mut(&mut self) -> &mut Converters {
        &mut self.converters
    }

    /// Register a converter for `T`.
    pub fn register_converter<T, E, F>(&mut self, func: F)
    where
        T: Send + 'static,
        E: Into<BoxError>,
        F: Fn(&Value) -> Result<T, E> + Send + Sync + 'static,
    {
        self.converters.register(func);
    }

    // ------------------------------------------------------------------------
    // Invocation
    // ------------------------------------------------------------------------

    /// Invoke `interface.method` with no call-scoped injections.
    pub fn invoke(
        &self,
        interface: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, InvokeError> {
        self.invoke_with(interface, method, &Injections::new(), args)
    }

    /// Invoke `interface.method` with call-scoped injections.
    pub fn invoke_with(
        &self,
        interface: &str,
        method: &str,
        injections: &Injections,
        args: Vec<Value>,
    ) -> Result<Value, InvokeError> {
        let binding = self
            .lookup(interface, method)
            .ok_or_else(|| InvokeError::NotFound {
                interface: interface.to_string(),
                method: method.to_string(),
            })?;
        self.invoke_binding(binding, injections, args)
    }

    /// Invoke an already looked-up binding.
    pub fn invoke_binding(
        &self,
        binding: &Binding,
        injections: &Injections,
        args: Vec<Value>,
    ) -> Result<Value, InvokeError> {
        engine::invoke(binding, &self.converters, injections, args)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("bindings", &self.len())
            .field("revision", &self.revision)
            .field("global", &self.global)
            .field("converters", &self.converters)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_bumps_revision_and_warns_on_overwrite() {
        let mut registry = Registry::new();
        registry.register_function(|a: i64| a, "T", "m");
        registry.register_function(|a: i64| a * 2, "T", "m");
        assert_eq!(registry.revision(), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.invoke("T", "m", vec![json!(2)]).unwrap(), json!(4));
    }

    #[test]
    fn test_expose_function_uses_defaults() {
        let mut registry = Registry::builder()
            .with_default_interface("app")
            .with_default_method("run")
            .build();
        registry.expose_function(|| "ok");
        assert!(registry.lookup("app", "run").is_some());
    }

    #[test]
    fn test_builder_converter_overrides_builtin() {
        let registry = Registry::builder()
            .with_converter(|_: &Value| Ok::<_, std::convert::Infallible>(String::from("fixed")))
            .build();
        assert_eq!(
            registry.converters().convert::<String>(json!(1)).unwrap(),
            "fixed"
        );
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.select_matching("("),
            Err(RegistrationError::InvalidPattern { .. })
        ));

        let transport = Arc::new(dynbind_std::testing::MockTransport::replying(Value::Null));
        assert!(matches!(
            registry.register_remote("R", "m", "not a url", "R", "m", "", transport),
            Err(RegistrationError::InvalidEndpoint { .. })
        ));
        assert_eq!(registry.revision(), 0);
    }

    #[test]
    fn test_name_match() {
        assert!(NameMatch::compile("").unwrap().matches("anything"));
        assert!(NameMatch::compile("^get").unwrap().matches("getName"));
        assert!(!NameMatch::Exact("get".into()).matches("getName"));
    }
}
