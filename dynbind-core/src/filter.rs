//! # Filter chain
//!
//! Filters run before every invocation of a binding, in attachment order.
//! Each receives the binding and the merged injection set for the call; it
//! may add values to the set (visible to later filters and to the callable)
//! and returns whether the invocation should proceed.
//!
//! A rejection is not an error: the invocation simply produces no value.

use crate::{binding::Binding, injection::Injections};
use std::{fmt, sync::Arc};

/// A pre-invocation predicate.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a binding filter",
    label = "missing `Filter` implementation",
    note = "closures of type `Fn(&Binding, &mut Injections) -> bool` are filters"
)]
pub trait Filter: Send + Sync + 'static {
    /// Return `false` to reject the invocation.
    fn check(&self, binding: &Binding, injections: &mut Injections) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&Binding, &mut Injections) -> bool + Send + Sync + 'static,
{
    fn check(&self, binding: &Binding, injections: &mut Injections) -> bool {
        self(binding, injections)
    }
}

/// The ordered filters of one binding.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter.
    pub fn push(&mut self, filter: Arc<dyn Filter>) {
        self.filters.push(filter);
    }

    /// Remove every filter.
    pub fn clear(&mut self) {
        self.filters.clear();
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run the chain; stops at the first rejection.
    pub fn run(&self, binding: &Binding, injections: &mut Injections) -> bool {
        self.filters.iter().all(|f| f.check(binding, injections))
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("len", &self.filters.len())
            .finish()
    }
}
