//! # Callable descriptors
//!
//! A uniform description of one exposed unit of behavior: which logical
//! parameters it declares, and how to physically call it once the engine
//! has assembled the argument vector.
//!
//! # Kinds
//!
//! - [`FunctionBinding`] - a free function or closure
//! - [`MethodBinding`] - a method on a shared receiver
//! - [`AttributeBinding`] - a read-only getter over a shared object
//! - [`HandlerBinding`] - a raw request handler fed from the injection set
//! - [`RemoteBinding`] - a proxy to another instance
//!
//! The typed adapters are generated for closures of up to 12 parameters,
//! the same way extractor handlers are generated per arity:
//!
//! ```rust,ignore
//! let callable = FunctionBinding::new(|a: i64, b: i64| a + b);
//! assert_eq!(callable.param_count(), 2);
//! ```
//!
//! [`RemoteBinding`]: crate::RemoteBinding

use crate::{
    convert::Converters,
    error::InvokeError,
    injection::{Injected, Injections},
    param::{ParamType, Parameter},
    returns::Returns,
};
use serde_json::Value;
use std::{any::type_name, fmt, marker::PhantomData, sync::Arc};

/// The closed set of callable shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum BindingKind {
    /// A free function or closure.
    Function,
    /// A method bound to a stored receiver.
    Method,
    /// A read-only field getter.
    Attribute,
    /// A raw request handler.
    Handler,
    /// A proxy to a remote instance.
    RemoteProxy,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BindingKind::Function => "function",
            BindingKind::Method => "method",
            BindingKind::Attribute => "attribute",
            BindingKind::Handler => "handler",
            BindingKind::RemoteProxy => "remote",
        };
        f.write_str(name)
    }
}

/// One assembled argument slot.
pub(crate) enum Slot {
    /// Taken from the caller's raw arguments.
    Supplied(Value),
    /// Taken from the merged injection set.
    Injected(Injected),
}

/// The assembled argument vector of one invocation.
///
/// Produced by the engine in declared parameter order. Each slot is
/// converted to its parameter type when it is taken.
pub struct ArgVector<'a> {
    slots: std::vec::IntoIter<Slot>,
    position: usize,
    converters: &'a Converters,
}

impl<'a> ArgVector<'a> {
    pub(crate) fn new(slots: Vec<Slot>, converters: &'a Converters) -> Self {
        Self {
            slots: slots.into_iter(),
            position: 0,
            converters,
        }
    }

    /// Take the next slot as a `T`.
    pub fn take<T: Parameter>(&mut self) -> Result<T, InvokeError> {
        let position = self.position;
        self.position += 1;

        match self.slots.next() {
            Some(Slot::Supplied(value)) => {
                self.converters
                    .convert::<T>(value)
                    .map_err(|source| InvokeError::Conversion {
                        position,
                        type_name: type_name::<T>(),
                        source,
                    })
            }
            Some(Slot::Injected(injected)) => {
                T::from_injection(&injected).ok_or(InvokeError::InjectionMismatch {
                    position,
                    expected: type_name::<T>(),
                    found: injected.type_name(),
                })
            }
            // The engine sizes the vector from `params()`; a callable asking
            // for more than it declared is a bug in that callable.
            None => Err(InvokeError::ArgumentCount {
                binding: String::from("<callable>"),
                expected: position + 1,
                supplied: position,
                injected: 0,
            }),
        }
    }

    /// Number of slots not yet taken.
    pub fn remaining(&self) -> usize {
        self.slots.len()
    }
}

/// Object-safe capability interface of every callable shape.
pub trait Callable: Send + Sync + 'static {
    /// The shape of this callable.
    fn kind(&self) -> BindingKind;

    /// Logical parameters: receiver excluded, injected slots included.
    fn params(&self) -> &[ParamType];

    /// Number of logical parameters.
    fn param_count(&self) -> usize {
        self.params().len()
    }

    /// Type of the `i`-th logical parameter.
    fn param_type_at(&self, i: usize) -> Option<&ParamType> {
        self.params().get(i)
    }

    /// Signature string for the externally visible parameters.
    fn signature(&self, visible: &[ParamType]) -> String {
        visible.iter().map(|p| p.class().code()).collect()
    }

    /// Whether the engine assembles caller arguments for this callable.
    ///
    /// Shapes that read nothing from the caller return `false`; the engine
    /// then skips assembly and ignores whatever raw arguments were sent.
    fn takes_arguments(&self) -> bool {
        true
    }

    /// Rearrange the raw argument list before assembly.
    ///
    /// Most kinds consume raw arguments one per position; a kind with a
    /// private convention (e.g. a proxy taking the whole list as one bundle)
    /// overrides this.
    fn bundle(&self, raw: Vec<Value>) -> Vec<Value> {
        raw
    }

    /// Physically invoke with the assembled vector.
    fn call(&self, args: ArgVector<'_>, injections: &Injections)
    -> Result<Vec<Value>, InvokeError>;
}

// ============================================================================
// Functions
// ============================================================================

/// A closure usable as a function binding, for parameter tuple `Args`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be exposed as a function",
    label = "not a `Fn` over `Parameter` arguments returning `Returns`",
    note = "every argument must implement `Parameter` and the return type `Returns`"
)]
pub trait Function<Args>: Send + Sync + 'static {
    /// Declared parameter types.
    fn param_types() -> Vec<ParamType>;

    /// Number of values the function returns.
    fn return_arity() -> usize;

    /// Call with the assembled vector.
    fn invoke(&self, args: &mut ArgVector<'_>) -> Result<Vec<Value>, InvokeError>;
}

/// A method usable on a receiver of type `T`.
///
/// `Marker` is `fn(A1, .., An) -> R`, the method's signature without the
/// receiver.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be exposed as a method of `{T}`",
    label = "not a `Fn(&{T}, ..)` over `Parameter` arguments returning `Returns`"
)]
pub trait Method<T, Marker>: Send + Sync + 'static {
    /// Declared parameter types, receiver excluded.
    fn param_types() -> Vec<ParamType>;

    /// Number of values the method returns.
    fn return_arity() -> usize;

    /// Call on `receiver` with the assembled vector.
    fn invoke(&self, receiver: &T, args: &mut ArgVector<'_>) -> Result<Vec<Value>, InvokeError>;
}

/// Macro to implement Function and Method for closures with N arguments.
macro_rules! impl_callable_arity {
    ($($A:ident),*) => {
        impl<F, R, $($A,)*> Function<($($A,)*)> for F
        where
            F: Fn($($A),*) -> R + Send + Sync + 'static,
            R: Returns,
            $($A: Parameter,)*
        {
            fn param_types() -> Vec<ParamType> {
                vec![$(ParamType::of::<$A>()),*]
            }

            fn return_arity() -> usize {
                R::ARITY
            }

            #[allow(non_snake_case, unused_variables)]
            fn invoke(&self, args: &mut ArgVector<'_>) -> Result<Vec<Value>, InvokeError> {
                $(
                    let $A = args.take::<$A>()?;
                )*
                (self)($($A),*).into_values()
            }
        }

        impl<F, T, R, $($A,)*> Method<T, fn($($A),*) -> R> for F
        where
            F: Fn(&T, $($A),*) -> R + Send + Sync + 'static,
            T: 'static,
            R: Returns + 'static,
            $($A: Parameter,)*
        {
            fn param_types() -> Vec<ParamType> {
                vec![$(ParamType::of::<$A>()),*]
            }

            fn return_arity() -> usize {
                R::ARITY
            }

            #[allow(non_snake_case, unused_variables)]
            fn invoke(&self, receiver: &T, args: &mut ArgVector<'_>) -> Result<Vec<Value>, InvokeError> {
                $(
                    let $A = args.take::<$A>()?;
                )*
                (self)(receiver, $($A),*).into_values()
            }
        }
    };
}

impl_callable_arity!();
impl_callable_arity!(A1);
impl_callable_arity!(A1, A2);
impl_callable_arity!(A1, A2, A3);
impl_callable_arity!(A1, A2, A3, A4);
impl_callable_arity!(A1, A2, A3, A4, A5);
impl_callable_arity!(A1, A2, A3, A4, A5, A6);
impl_callable_arity!(A1, A2, A3, A4, A5, A6, A7);
impl_callable_arity!(A1, A2, A3, A4, A5, A6, A7, A8);
impl_callable_arity!(A1, A2, A3, A4, A5, A6, A7, A8, A9);
impl_callable_arity!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10);
impl_callable_arity!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11);
impl_callable_arity!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12);

/// A free function or closure.
pub struct FunctionBinding<F, Args> {
    func: F,
    params: Vec<ParamType>,
    _args: PhantomData<fn() -> Args>,
}

impl<F, Args> FunctionBinding<F, Args>
where
    F: Function<Args>,
{
    /// Wrap a closure.
    pub fn new(func: F) -> Self {
        Self {
            func,
            params: F::param_types(),
            _args: PhantomData,
        }
    }
}

impl<F, Args> Callable for FunctionBinding<F, Args>
where
    F: Function<Args>,
    Args: 'static,
{
    fn kind(&self) -> BindingKind {
        BindingKind::Function
    }

    fn params(&self) -> &[ParamType] {
        &self.params
    }

    fn call(
        &self,
        mut args: ArgVector<'_>,
        _injections: &Injections,
    ) -> Result<Vec<Value>, InvokeError> {
        self.func.invoke(&mut args)
    }
}

/// A method bound to a shared receiver.
///
/// The receiver is shared by every concurrent invocation; methods take
/// `&T`, so any mutation goes through the receiver's own interior
/// mutability.
pub struct MethodBinding<T, F, Marker> {
    receiver: Arc<T>,
    func: F,
    params: Vec<ParamType>,
    _marker: PhantomData<fn() -> Marker>,
}

impl<T, F, Marker> MethodBinding<T, F, Marker>
where
    F: Method<T, Marker>,
{
    /// Bind `func` to `receiver`.
    pub fn new(receiver: Arc<T>, func: F) -> Self {
        Self {
            receiver,
            func,
            params: F::param_types(),
            _marker: PhantomData,
        }
    }
}

impl<T, F, Marker> Callable for MethodBinding<T, F, Marker>
where
    T: Send + Sync + 'static,
    F: Method<T, Marker>,
    Marker: 'static,
{
    fn kind(&self) -> BindingKind {
        BindingKind::Method
    }

    fn params(&self) -> &[ParamType] {
        &self.params
    }

    fn call(
        &self,
        mut args: ArgVector<'_>,
        _injections: &Injections,
    ) -> Result<Vec<Value>, InvokeError> {
        self.func.invoke(&self.receiver, &mut args)
    }
}

/// Type-erased attribute getter.
type Getter<T> = Box<dyn Fn(&T) -> Result<Vec<Value>, InvokeError> + Send + Sync>;

/// A read-only getter over a shared object. Takes no parameters.
pub struct AttributeBinding<T> {
    receiver: Arc<T>,
    getter: Getter<T>,
}

impl<T: Send + Sync + 'static> AttributeBinding<T> {
    /// Bind `getter` to `receiver`.
    pub fn new<R, G>(receiver: Arc<T>, getter: G) -> Self
    where
        R: Returns,
        G: Fn(&T) -> R + Send + Sync + 'static,
    {
        Self {
            receiver,
            getter: Box::new(move |t| getter(t).into_values()),
        }
    }
}

impl<T: Send + Sync + 'static> Callable for AttributeBinding<T> {
    fn kind(&self) -> BindingKind {
        BindingKind::Attribute
    }

    fn params(&self) -> &[ParamType] {
        &[]
    }

    fn takes_arguments(&self) -> bool {
        false
    }

    fn call(
        &self,
        _args: ArgVector<'_>,
        _injections: &Injections,
    ) -> Result<Vec<Value>, InvokeError> {
        (self.getter)(&self.receiver)
    }
}

/// A raw request handler.
///
/// `C` is the transport's request-context type. The transport injects it
/// per request; the handler is called with a reference to it and takes no
/// caller-supplied arguments.
pub struct HandlerBinding<C, F, R> {
    handler: F,
    _context: PhantomData<fn(&C) -> R>,
}

impl<C, F, R> HandlerBinding<C, F, R>
where
    C: Send + Sync + 'static,
    F: Fn(&C) -> R + Send + Sync + 'static,
    R: Returns,
{
    /// Wrap a handler.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _context: PhantomData,
        }
    }
}

impl<C, F, R> Callable for HandlerBinding<C, F, R>
where
    C: Send + Sync + 'static,
    F: Fn(&C) -> R + Send + Sync + 'static,
    R: Returns + 'static,
{
    fn kind(&self) -> BindingKind {
        BindingKind::Handler
    }

    fn params(&self) -> &[ParamType] {
        &[]
    }

    fn takes_arguments(&self) -> bool {
        false
    }

    fn signature(&self, _visible: &[ParamType]) -> String {
        String::new()
    }

    fn call(
        &self,
        _args: ArgVector<'_>,
        injections: &Injections,
    ) -> Result<Vec<Value>, InvokeError> {
        let context = injections
            .get::<C>()
            .ok_or_else(|| InvokeError::MissingInjection {
                binding: String::from("<handler>"),
                position: 0,
                type_name: type_name::<C>(),
            })?;
        (self.handler)(context).into_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vector<'a>(values: Vec<Value>, converters: &'a Converters) -> ArgVector<'a> {
        ArgVector::new(values.into_iter().map(Slot::Supplied).collect(), converters)
    }

    #[test]
    fn test_function_params_and_call() {
        let f = FunctionBinding::new(|a: i64, b: String| format!("{b}{a}"));
        assert_eq!(f.kind(), BindingKind::Function);
        assert_eq!(f.param_count(), 2);
        assert_eq!(f.signature(f.params()), "is");

        let converters = Converters::new();
        let out = f
            .call(vector(vec![json!(1), json!("x")], &converters), &Injections::new())
            .unwrap();
        assert_eq!(out, vec![json!("x1")]);
    }

    #[test]
    fn test_method_uses_receiver() {
        struct Adder(i64);
        let m = MethodBinding::new(Arc::new(Adder(10)), |a: &Adder, x: i64| a.0 + x);
        assert_eq!(m.param_count(), 1);

        let converters = Converters::new();
        let out = m
            .call(vector(vec![json!(5)], &converters), &Injections::new())
            .unwrap();
        assert_eq!(out, vec![json!(15)]);
    }

    #[test]
    fn test_injected_slot_is_downcast() {
        let f = FunctionBinding::new(|s: Arc<String>| s.len());
        let converters = Converters::new();
        let slots = vec![Slot::Injected(Injected::new(Arc::new(String::from("abc"))))];
        let out = f
            .call(ArgVector::new(slots, &converters), &Injections::new())
            .unwrap();
        assert_eq!(out, vec![json!(3)]);
    }

    #[test]
    fn test_handler_reads_context_from_injections() {
        struct Request {
            path: &'static str,
        }
        let h = HandlerBinding::new(|r: &Request| r.path.len());
        assert_eq!(h.signature(h.params()), "");

        let converters = Converters::new();
        let missing = h.call(vector(vec![], &converters), &Injections::new());
        assert!(matches!(missing, Err(InvokeError::MissingInjection { .. })));

        let injections = Injections::new().with(Request { path: "/a/b" });
        let out = h.call(vector(vec![], &converters), &injections).unwrap();
        assert_eq!(out, vec![json!(4)]);
    }

    #[test]
    fn test_return_arity_is_reported() {
        assert_eq!(<fn(i64) -> (i64, i64) as Function<(i64,)>>::return_arity(), 2);
        assert_eq!(<fn() as Function<()>>::return_arity(), 0);
    }
}
