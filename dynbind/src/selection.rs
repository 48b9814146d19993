//! Group operations over a set of bindings.

use crate::registry::Registry;
use dynbind_core::{Binding, Filter, Injected, QualifiedName};
use std::{any::Any, sync::Arc};

/// A set of bindings selected from a [`Registry`].
///
/// Every operation applies to each selected binding. Chain them:
///
/// ```rust,ignore
/// registry
///     .select_interface("Admin")
///     .inject(Arc::new(audit_log))
///     .filter(require_admin);
/// ```
pub struct Selection<'r> {
    registry: &'r mut Registry,
    names: Vec<QualifiedName>,
}

impl<'r> Selection<'r> {
    pub(crate) fn new(registry: &'r mut Registry, names: Vec<QualifiedName>) -> Self {
        Self { registry, names }
    }

    /// The selected names.
    pub fn names(&self) -> &[QualifiedName] {
        &self.names
    }

    /// Number of selected bindings.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Apply `f` to every selected binding.
    pub fn for_each(&mut self, mut f: impl FnMut(&mut Binding)) -> &mut Self {
        for name in &self.names {
            if let Some(binding) = self.registry.binding_mut(&name.interface, &name.method) {
                f(binding);
            }
        }
        self
    }

    /// Attach a singleton injection to every selected binding.
    ///
    /// The value itself is shared between the bindings.
    pub fn inject<V: Any + Send + Sync>(&mut self, value: V) -> &mut Self {
        let injected = Injected::new(value);
        self.for_each(|b| {
            b.inject_shared(injected.clone());
        })
    }

    /// Append a filter to every selected binding.
    pub fn filter<F: Filter>(&mut self, filter: F) -> &mut Self {
        let filter: Arc<dyn Filter> = Arc::new(filter);
        self.for_each(|b| {
            b.filter_shared(filter.clone());
        })
    }

    /// Remove every filter of every selected binding.
    pub fn clear_filters(&mut self) -> &mut Self {
        self.for_each(|b| {
            b.clear_filters();
        })
    }

    /// Remove every selected binding from the registry. Returns how many
    /// were removed.
    pub fn remove(self) -> usize {
        self.names
            .iter()
            .filter_map(|name| self.registry.remove(&name.interface, &name.method))
            .count()
    }
}

impl std::fmt::Debug for Selection<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.names.iter().map(ToString::to_string))
            .finish()
    }
}
