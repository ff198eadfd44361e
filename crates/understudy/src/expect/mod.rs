//! Call expectations: behaviors, argument rules and count rules per method.

pub mod args;
pub mod collection;
pub mod count;
pub mod expectation;

pub use args::{to_predicate, Arg, ArgsRule, ArgsSpec};
pub use collection::ExpectationRegistry;
pub use count::{CountRule, CountSpec};
pub use expectation::{Behavior, BehaviorKind, Calls, Expectation};
