#![allow(dead_code)]

use dynbind::{ExposeMethods, MethodSet, Registry};
use std::sync::{
    Arc,
    atomic::{AtomicI64, AtomicUsize, Ordering},
};

// ============================================================================
// Test Objects
// ============================================================================

/// Per-request context, injected by type.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    pub user: String,
}

impl Context {
    pub fn shared(user: &str) -> Arc<Context> {
        Arc::new(Context {
            user: user.to_string(),
        })
    }
}

/// An object with a single integer parameter behind interior mutability.
#[derive(Default)]
pub struct Params {
    pub param1: AtomicI64,
}

impl Params {
    pub fn set_and_get_param(&self, p: i64) -> i64 {
        self.param1.store(p, Ordering::SeqCst);
        self.param1.load(Ordering::SeqCst)
    }

    pub fn get_param(&self) -> i64 {
        self.param1.load(Ordering::SeqCst)
    }

    pub fn both(&self) -> (i64, i64) {
        let p = self.get_param();
        (p, p)
    }
}

impl ExposeMethods for Params {
    fn methods(set: &mut MethodSet<Self>) {
        set.method("SetAndGetParam", Params::set_and_get_param)
            .method("GetParam", Params::get_param)
            .method("Both", Params::both);
    }
}

/// Counts how often the physical callable ran.
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// `Calc.add(i64, i64)`, `Calc.concat(String, String)` and `Calc.neg(f64)`.
pub fn calc_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register_function(|a: i64, b: i64| a + b, "Calc", "add");
    registry.register_function(|a: String, b: String| a + &b, "Calc", "concat");
    registry.register_function(|a: f64| -a, "Calc", "neg");
    registry
}

/// `S.f(a, b, ctx)` formats both numbers with the injected user.
pub fn greet(a: i64, b: i64, ctx: Arc<Context>) -> String {
    format!("{}:{}", ctx.user, a + b)
}
