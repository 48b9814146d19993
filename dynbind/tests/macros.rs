//! Integration tests for the dynbind macros.

#![cfg(feature = "macros")]

use dynbind::{ExposeAttributes, ExposeMethods, Registry, args};
use serde_json::json;
use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

#[derive(Default)]
struct Params {
    param1: AtomicI64,
}

#[dynbind::expose(interface = "T")]
impl Params {
    #[dynbind(name = "SetAndGetParam")]
    pub fn set_and_get_param(&self, p: i64) -> i64 {
        self.param1.store(p, Ordering::SeqCst);
        self.get_param()
    }

    #[dynbind(name = "GetParam")]
    pub fn get_param(&self) -> i64 {
        self.param1.load(Ordering::SeqCst)
    }

    #[dynbind(skip)]
    pub fn reset(&self) {
        self.param1.store(0, Ordering::SeqCst);
    }

    // Not public, not exposed.
    fn double(&self) -> i64 {
        self.get_param() * 2
    }

    pub fn doubled(&self) -> i64 {
        self.double()
    }

    // Takes no receiver, not exposed.
    pub fn create() -> Self {
        Self::default()
    }
}

#[test]
fn test_expose_macro_registers_public_methods() {
    assert_eq!(<Params as ExposeMethods>::interface_name(), "T");

    let params = Arc::new(Params::create());
    let mut registry = Registry::new();
    registry.expose_interface(params.clone(), None);

    let mut names: Vec<_> = registry.method_names("T").collect();
    names.sort();
    assert_eq!(names, vec!["GetParam", "SetAndGetParam", "doubled"]);

    assert_eq!(
        registry.invoke("T", "SetAndGetParam", args![2]).unwrap(),
        json!(2)
    );
    assert_eq!(registry.invoke("T", "GetParam", args![]).unwrap(), json!(2));
    assert_eq!(registry.invoke("T", "doubled", args![]).unwrap(), json!(4));

    // The receiver is shared with the caller.
    params.reset();
    assert_eq!(registry.invoke("T", "GetParam", args![]).unwrap(), json!(0));
}

struct Unnamed;

#[dynbind::expose]
impl Unnamed {
    pub fn answer(&self) -> u8 {
        42
    }
}

#[test]
fn test_expose_macro_defaults_to_type_name() {
    let mut registry = Registry::new();
    registry.expose_interface(Arc::new(Unnamed), None);
    assert_eq!(
        registry.invoke("Unnamed", "answer", args![]).unwrap(),
        json!(42)
    );
}

#[derive(dynbind::ExposeAttributes)]
#[dynbind(interface = "Server")]
struct ServerInfo {
    pub host: String,
    pub port: u16,
    #[dynbind(name = "tags")]
    pub labels: Vec<String>,
    #[dynbind(skip)]
    pub secret: String,
    internal: u64,
}

#[test]
fn test_derive_exposes_public_fields() {
    let info = ServerInfo {
        host: String::from("localhost"),
        port: 8080,
        labels: vec![String::from("blue")],
        secret: String::from("hidden"),
        internal: 7,
    };
    assert_eq!(info.internal, 7);
    assert_eq!(info.secret, "hidden");
    assert_eq!(<ServerInfo as ExposeAttributes>::interface_name(), "Server");

    let mut registry = Registry::new();
    registry.expose_all_attributes(Arc::new(info), None);

    let mut names: Vec<_> = registry.method_names("Server").collect();
    names.sort();
    assert_eq!(names, vec!["host", "port", "tags"]);

    assert_eq!(
        registry.invoke("Server", "host", args![]).unwrap(),
        json!("localhost")
    );
    assert_eq!(registry.invoke("Server", "port", args![]).unwrap(), json!(8080));
    assert_eq!(
        registry.invoke("Server", "tags", args![]).unwrap(),
        json!(["blue"])
    );
}

#[test]
fn test_derive_attribute_pattern() {
    let info = ServerInfo {
        host: String::from("a"),
        port: 1,
        labels: Vec::new(),
        secret: String::new(),
        internal: 0,
    };

    let mut registry = Registry::new();
    let selected = registry
        .expose_attributes(Arc::new(info), "^(host|port)$", Some("Srv"))
        .unwrap()
        .len();
    assert_eq!(selected, 2);
    assert_eq!(registry.signature("Srv", "port").as_deref(), Some(""));
}
