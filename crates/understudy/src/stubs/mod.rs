//! Stub strategies: what a `Stub` behavior computes for a call.

mod strategies;

pub use strategies::{
    return_argument, return_callback, return_self, return_value, return_value_for,
    return_value_map, throw_error, ReturnArgument, ReturnCallback, ReturnSelf, ReturnValue,
    ReturnValueMap, ThrowError,
};

use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::runtime::frame::Receiver;
use crate::runtime::value::Value;

/// The call a stub is answering.
pub struct StubCall<'a> {
    pub method:   &'a str,
    /// Passed arguments; writes reach the caller for by-reference parameters.
    pub args:     &'a mut [Value],
    pub receiver: &'a Receiver,
}

pub trait StubStrategy: fmt::Debug {
    fn invoke(&self, call: &mut StubCall<'_>) -> Result<Value>;
}

pub type StubRef = Rc<dyn StubStrategy>;

/// Anything `Expectation::stub` accepts: a strategy, or a plain value
/// (shorthand for `return_value`).
pub trait IntoStub {
    fn into_stub(self) -> StubRef;
}

impl IntoStub for StubRef {
    fn into_stub(self) -> StubRef { self }
}

impl IntoStub for Value {
    fn into_stub(self) -> StubRef { return_value(self) }
}

macro_rules! value_stub {
    ($($ty:ty),*) => {
        $(impl IntoStub for $ty {
            fn into_stub(self) -> StubRef { return_value(Value::from(self)) }
        })*
    };
}

value_stub!(&str, String, i64, i32, f64, bool, ());
