//! Testing utilities for dynbind.
//!
//! This module provides utilities to make testing bindings, filters and
//! remote proxies easier.
//!
//! # Features
//!
//! - [`RecordingFilter`]: A filter that records the bindings it sees
//! - [`CountingFilter`]: A filter that counts how often it runs
//! - [`MockTransport`]: A remote transport that records calls and replies with a canned result

use dynbind_core::{Binding, BoxError, Filter, Injections, RemoteCall, RemoteTransport};
use serde_json::Value;
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Recording Filter
// ============================================================================

/// A filter that records the qualified name of every binding it runs for.
///
/// Useful for verifying filter order and which bindings a group operation
/// reached.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingFilter::new();
/// registry.select_all().filter(recorder.clone());
///
/// registry.invoke("Calc", "add", args![1, 2])?;
/// assert_eq!(recorder.names(), vec!["Calc.add"]);
/// ```
#[derive(Clone)]
pub struct RecordingFilter {
    names: Arc<Mutex<Vec<String>>>,
    verdict: bool,
}

impl RecordingFilter {
    /// Create a recording filter that passes.
    pub fn new() -> Self {
        Self::with_verdict(true)
    }

    /// Create a recording filter with a fixed verdict.
    pub fn with_verdict(verdict: bool) -> Self {
        Self {
            names: Arc::new(Mutex::new(Vec::new())),
            verdict,
        }
    }

    /// Recorded binding names, in call order.
    pub fn names(&self) -> Vec<String> {
        lock(&self.names).clone()
    }

    /// Number of recorded calls.
    pub fn count(&self) -> usize {
        lock(&self.names).len()
    }

    /// Forget every recorded call.
    pub fn clear(&self) {
        lock(&self.names).clear();
    }
}

impl Default for RecordingFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for RecordingFilter {
    fn check(&self, binding: &Binding, _injections: &mut Injections) -> bool {
        lock(&self.names).push(binding.name().to_string());
        self.verdict
    }
}

// ============================================================================
// Counting Filter
// ============================================================================

/// A filter that counts its runs and always passes.
#[derive(Clone, Default)]
pub struct CountingFilter {
    count: Arc<AtomicUsize>,
}

impl CountingFilter {
    /// Create a new counting filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset the count to zero.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

impl Filter for CountingFilter {
    fn check(&self, _binding: &Binding, _injections: &mut Injections) -> bool {
        self.count.fetch_add(1, Ordering::SeqCst);
        true
    }
}

// ============================================================================
// Mock Transport
// ============================================================================

enum Reply {
    Value(Value),
    Error(String),
}

/// A remote transport that records every call.
///
/// Replies with a fixed value, or fails with a fixed message.
#[derive(Clone)]
pub struct MockTransport {
    calls: Arc<Mutex<Vec<RemoteCall>>>,
    reply: Arc<Reply>,
}

impl MockTransport {
    /// Reply to every call with `value`.
    pub fn replying(value: Value) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            reply: Arc::new(Reply::Value(value)),
        }
    }

    /// Fail every call with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            reply: Arc::new(Reply::Error(message.into())),
        }
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<RemoteCall> {
        lock(&self.calls).clone()
    }

    /// Number of calls received.
    pub fn count(&self) -> usize {
        lock(&self.calls).len()
    }
}

impl RemoteTransport for MockTransport {
    fn invoke(&self, call: &RemoteCall) -> Result<Value, BoxError> {
        lock(&self.calls).push(call.clone());
        match self.reply.as_ref() {
            Reply::Value(value) => Ok(value.clone()),
            Reply::Error(message) => Err(message.clone().into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynbind_core::{FunctionBinding, QualifiedName};

    fn binding(name: &str) -> Binding {
        Binding::new(
            QualifiedName::new("T", name),
            Box::new(FunctionBinding::new(|| ())),
        )
    }

    #[test]
    fn test_recording_filter_records_in_order() {
        let recorder = RecordingFilter::with_verdict(false);
        let mut injections = Injections::new();

        assert!(!recorder.check(&binding("a"), &mut injections));
        assert!(!recorder.check(&binding("b"), &mut injections));
        assert_eq!(recorder.names(), vec!["T.a", "T.b"]);

        recorder.clear();
        assert_eq!(recorder.count(), 0);
    }

    #[test]
    fn test_counting_filter_clones_share_count() {
        let counter = CountingFilter::new();
        let clone = counter.clone();
        clone.check(&binding("a"), &mut Injections::new());
        assert_eq!(counter.count(), 1);
        counter.reset();
        assert_eq!(clone.count(), 0);
    }
}
