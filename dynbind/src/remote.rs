//! In-process remote transport.

use crate::registry::Registry;
use dynbind_core::{BoxError, Injections, RemoteCall, RemoteTransport};
use serde_json::Value;
use std::sync::Arc;

/// Forwards remote calls to another registry in the same process.
///
/// The caller context travels as a call-scoped injection, the same way a
/// network transport would inject it on the receiving side.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    target: Arc<Registry>,
}

impl LocalTransport {
    /// Forward to `target`.
    pub fn new(target: Arc<Registry>) -> Self {
        Self { target }
    }
}

impl RemoteTransport for LocalTransport {
    fn invoke(&self, call: &RemoteCall) -> Result<Value, BoxError> {
        let mut injections = Injections::new();
        if let Some(context) = &call.context {
            injections.insert(context.clone());
        }
        Ok(self
            .target
            .invoke_with(&call.interface, &call.method, &injections, call.args.clone())?)
    }
}
