//! Stock filters.

use dynbind_core::{Binding, Filter, Injections};
use std::{any::type_name, marker::PhantomData};
use tracing::{info, warn};

/// A filter that logs every invocation and always passes.
#[derive(Debug, Clone, Default)]
pub struct LoggingFilter {
    label: Option<String>,
}

impl LoggingFilter {
    /// Create an unlabelled logging filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging filter whose lines carry `label`.
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
        }
    }
}

impl Filter for LoggingFilter {
    fn check(&self, binding: &Binding, injections: &mut Injections) -> bool {
        info!(
            label = self.label.as_deref().unwrap_or("dynbind"),
            binding = %binding.name(),
            kind = %binding.kind(),
            injections = ?injections,
            "invoking binding"
        );
        true
    }
}

/// A predicate whose typed parameters are looked up in the injection set.
///
/// Implemented for `Fn(&mut Injections, A1, .., An) -> bool` with up to six
/// typed parameters. Resolution fails with the name of the first type that
/// has no value in the set.
pub trait InjectedPredicate<Args>: Send + Sync + 'static {
    /// Resolve the parameters and evaluate.
    fn evaluate(&self, injections: &mut Injections) -> Result<bool, &'static str>;
}

macro_rules! impl_injected_predicate {
    ($($A:ident),*) => {
        impl<F, $($A,)*> InjectedPredicate<($($A,)*)> for F
        where
            F: Fn(&mut Injections, $($A),*) -> bool + Send + Sync + 'static,
            $($A: Clone + Send + Sync + 'static,)*
        {
            #[allow(non_snake_case)]
            fn evaluate(&self, injections: &mut Injections) -> Result<bool, &'static str> {
                $(
                    let $A = injections.get::<$A>().cloned().ok_or(type_name::<$A>())?;
                )*
                Ok(self(injections, $($A),*))
            }
        }
    };
}

impl_injected_predicate!();
impl_injected_predicate!(A1);
impl_injected_predicate!(A1, A2);
impl_injected_predicate!(A1, A2, A3);
impl_injected_predicate!(A1, A2, A3, A4);
impl_injected_predicate!(A1, A2, A3, A4, A5);
impl_injected_predicate!(A1, A2, A3, A4, A5, A6);

/// A filter built from an [`InjectedPredicate`].
///
/// If a parameter type cannot be resolved the invocation is rejected and
/// a warning is logged.
pub struct AutoInject<F, Args> {
    predicate: F,
    _args: PhantomData<fn() -> Args>,
}

impl<F, Args> AutoInject<F, Args>
where
    F: InjectedPredicate<Args>,
{
    /// Wrap a predicate.
    pub fn new(predicate: F) -> Self {
        Self {
            predicate,
            _args: PhantomData,
        }
    }
}

impl<F, Args> Filter for AutoInject<F, Args>
where
    F: InjectedPredicate<Args>,
    Args: 'static,
{
    fn check(&self, binding: &Binding, injections: &mut Injections) -> bool {
        match self.predicate.evaluate(injections) {
            Ok(pass) => pass,
            Err(missing) => {
                warn!(
                    binding = %binding.name(),
                    missing,
                    "filter parameter could not be resolved from injections"
                );
                false
            }
        }
    }
}

/// Shorthand for [`AutoInject::new`].
///
/// ```rust,ignore
/// binding.filter(auto_inject(|inj: &mut Injections, session: Arc<Session>| {
///     inj.insert(session.user());
///     session.is_valid()
/// }));
/// ```
pub fn auto_inject<F, Args>(predicate: F) -> AutoInject<F, Args>
where
    F: InjectedPredicate<Args>,
{
    AutoInject::new(predicate)
}
