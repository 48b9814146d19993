//! Remote proxy contract.
//!
//! A [`RemoteBinding`] stands in for a binding that lives on another
//! instance. The engine treats it like any other callable; the actual
//! forwarding is done by a [`RemoteTransport`].

use crate::{
    callable::{ArgVector, BindingKind, Callable},
    error::{BoxError, ConvertError, InvokeError},
    injection::Injections,
    param::{ParamType, Parameter, TypeClass},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, sync::Arc};
use tracing::trace;
use url::Url;

/// Per-request information about the original caller.
///
/// The transport layer injects this into each call; remote bindings
/// forward it so the remote side sees the same session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    /// Correlation id of the request, if any.
    pub correlation_id: Option<String>,
    /// Request headers of the original caller.
    pub headers: BTreeMap<String, String>,
    /// Session cookie of the original caller, as a `name=value` pair.
    pub session_cookie: Option<String>,
    /// Name of the forwarding instance.
    pub origin: Option<String>,
}

impl CallerContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the correlation id.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the session cookie.
    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    /// Set the origin name.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

impl Parameter for CallerContext {
    const CLASS: TypeClass = TypeClass::Object;

    fn decode(_value: Value) -> Result<Self, ConvertError> {
        Err(ConvertError::NotDecodable {
            type_name: std::any::type_name::<Self>(),
        })
    }
}

/// One forwarded call.
#[derive(Debug, Clone)]
pub struct RemoteCall {
    /// Base URL of the remote instance.
    pub endpoint: Url,
    /// Remote interface name.
    pub interface: String,
    /// Remote method name.
    pub method: String,
    /// The caller's raw arguments, bundled.
    pub args: Vec<Value>,
    /// The caller context, when the transport layer supplied one.
    pub context: Option<CallerContext>,
}

/// Forwards calls to a remote instance.
///
/// Implementations block until the remote side answers.
pub trait RemoteTransport: Send + Sync + 'static {
    /// Perform `call` and return the remote result.
    fn invoke(&self, call: &RemoteCall) -> Result<Value, BoxError>;
}

/// A proxy to a binding on a remote instance.
pub struct RemoteBinding {
    endpoint: Url,
    interface: String,
    method: String,
    signature: String,
    params: [ParamType; 1],
    transport: Arc<dyn RemoteTransport>,
}

impl RemoteBinding {
    /// Create a proxy to `interface.method` at `endpoint`.
    ///
    /// `signature` is the remote binding's signature, known in advance.
    pub fn new(
        endpoint: Url,
        interface: impl Into<String>,
        method: impl Into<String>,
        signature: impl Into<String>,
        transport: Arc<dyn RemoteTransport>,
    ) -> Self {
        Self {
            endpoint,
            interface: interface.into(),
            method: method.into(),
            signature: signature.into(),
            params: [ParamType::of::<Vec<Value>>()],
            transport,
        }
    }

    /// The remote instance's base URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl fmt::Debug for RemoteBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteBinding")
            .field("endpoint", &self.endpoint.as_str())
            .field("interface", &self.interface)
            .field("method", &self.method)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl Callable for RemoteBinding {
    fn kind(&self) -> BindingKind {
        BindingKind::RemoteProxy
    }

    fn params(&self) -> &[ParamType] {
        &self.params
    }

    fn signature(&self, _visible: &[ParamType]) -> String {
        self.signature.clone()
    }

    fn bundle(&self, raw: Vec<Value>) -> Vec<Value> {
        vec![Value::Array(raw)]
    }

    fn call(
        &self,
        mut args: ArgVector<'_>,
        injections: &Injections,
    ) -> Result<Vec<Value>, InvokeError> {
        let args = args.take::<Vec<Value>>()?;
        let call = RemoteCall {
            endpoint: self.endpoint.clone(),
            interface: self.interface.clone(),
            method: self.method.clone(),
            args,
            context: injections.get::<CallerContext>().cloned(),
        };

        trace!(
            endpoint = %call.endpoint,
            interface = %call.interface,
            method = %call.method,
            "forwarding call"
        );
        let result = self.transport.invoke(&call).map_err(InvokeError::Remote)?;
        Ok(vec![result])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{callable::Slot, convert::Converters};
    use serde_json::json;
    use std::sync::Mutex;

    struct Echo {
        seen: Mutex<Vec<RemoteCall>>,
    }

    impl RemoteTransport for Echo {
        fn invoke(&self, call: &RemoteCall) -> Result<Value, BoxError> {
            self.seen.lock().unwrap().push(call.clone());
            Ok(Value::Array(call.args.clone()))
        }
    }

    #[test]
    fn test_bundles_and_forwards_context() {
        let echo = Arc::new(Echo {
            seen: Mutex::new(Vec::new()),
        });
        let endpoint = Url::parse("http://peer.local/api").unwrap();
        let proxy = RemoteBinding::new(endpoint, "Calc", "add", "ii", echo.clone());

        assert_eq!(proxy.param_count(), 1);
        assert_eq!(proxy.signature(&[]), "ii");

        let bundled = proxy.bundle(vec![json!(1), json!(2)]);
        assert_eq!(bundled, vec![json!([1, 2])]);

        let converters = Converters::new();
        let slots = bundled.into_iter().map(Slot::Supplied).collect();
        let injections = Injections::new().with(CallerContext::new().with_origin("front"));
        let out = proxy
            .call(ArgVector::new(slots, &converters), &injections)
            .unwrap();
        assert_eq!(out, vec![json!([1, 2])]);

        let seen = echo.seen.lock().unwrap();
        assert_eq!(seen[0].method, "add");
        assert_eq!(
            seen[0].context.as_ref().and_then(|c| c.origin.as_deref()),
            Some("front")
        );
    }
}
