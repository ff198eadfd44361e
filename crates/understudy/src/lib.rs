//! Test doubles for a dynamically typed object model.
//!
//! Types are declared into a [`TypeRegistry`]; a [`DoubleSession`] derives
//! doubles from them. Each double is a new type whose methods forward to a
//! dispatcher, which records the call and answers according to the method's
//! [`Expectation`]:
//!
//! - **mock** runs the original method body,
//! - **dummy** returns `Null`,
//! - **stub** runs a [`stubs::StubStrategy`].
//!
//! Argument constraints are checked on every call. Call-count constraints
//! are checked when the session is torn down.

pub mod error;
pub mod config;
pub mod constraints;
pub mod syntax;
pub mod types;
pub mod runtime;
pub mod analysis;
pub mod expect;
pub mod stubs;
pub mod session;
pub mod builder;
pub mod harness;

pub use analysis::{DoubleKind, TypeDescriptor};
pub use builder::DoubleBuilder;
pub use config::{ConfigOption, DoubleConfig};
pub use constraints::{Predicate, PredicateRef};
pub use error::{AssertionFailure, DoubleError, Result, VerificationReport};
pub use expect::{Arg, ArgsSpec, Behavior, Calls, CountRule, CountSpec, Expectation, ExpectationRegistry};
pub use harness::{with_doubles, DoubleScope};
pub use runtime::call_log::{CallLog, CallRecord};
pub use runtime::frame::{CallFrame, Receiver};
pub use runtime::value::{ObjectRef, Value};
pub use session::{DoubleInstance, DoubleSession, DoubleType};
pub use stubs::{
    return_argument, return_callback, return_self, return_value, return_value_for, return_value_map,
    throw_error, IntoStub, StubRef, StubStrategy,
};
pub use types::desc::{MethodDef, Parameter, TypeDef, TypeHint, Visibility};
pub use types::registry::TypeRegistry;
