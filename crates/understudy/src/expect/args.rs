//! Argument rules and the adapter turning raw expected values into predicates.

use std::fmt;
use std::rc::Rc;

use crate::constraints::{self, PredicateRef};
use crate::runtime::value::{ObjectRef, Value};

/// One expected argument: a raw value (normalized by `to_predicate`) or a
/// ready-made predicate.
#[derive(Debug, Clone)]
pub enum Arg {
    Value(Value),
    Predicate(PredicateRef),
}

impl Arg {
    pub fn to_predicate(self) -> PredicateRef {
        match self {
            Arg::Predicate(p) => p,
            Arg::Value(value) => to_predicate(value),
        }
    }
}

/// `true`/`false`/`null` become their dedicated predicates; any other value
/// is compared with loose equality.
pub fn to_predicate(value: Value) -> PredicateRef {
    match value {
        Value::Bool(true)  => constraints::is_true(),
        Value::Bool(false) => constraints::is_false(),
        Value::Null        => constraints::is_null(),
        other              => constraints::equal_to(other),
    }
}

impl From<PredicateRef> for Arg { fn from(p: PredicateRef) -> Self { Arg::Predicate(p) } }
impl From<Value> for Arg { fn from(v: Value) -> Self { Arg::Value(v) } }
impl From<()> for Arg { fn from(_: ()) -> Self { Arg::Value(Value::Null) } }
impl From<bool> for Arg { fn from(b: bool) -> Self { Arg::Value(b.into()) } }
impl From<i64> for Arg { fn from(i: i64) -> Self { Arg::Value(i.into()) } }
impl From<i32> for Arg { fn from(i: i32) -> Self { Arg::Value(i.into()) } }
impl From<f64> for Arg { fn from(x: f64) -> Self { Arg::Value(x.into()) } }
impl From<&str> for Arg { fn from(s: &str) -> Self { Arg::Value(s.into()) } }
impl From<String> for Arg { fn from(s: String) -> Self { Arg::Value(s.into()) } }
impl From<ObjectRef> for Arg { fn from(o: ObjectRef) -> Self { Arg::Value(o.into()) } }

// ─── Input ────────────────────────────────────────────────────────────────────

pub type ArgsValidator = Rc<dyn Fn(&[Value]) -> Result<(), String>>;

/// What `Expectation::args` accepts.
#[derive(Clone)]
pub enum ArgsSpec {
    List(Vec<Arg>),
    /// The method must be called without arguments.
    NoArgs,
    Validator(ArgsValidator),
}

impl ArgsSpec {
    /// Validate all passed arguments at once; `Err` carries the failure message.
    pub fn validator(f: impl Fn(&[Value]) -> Result<(), String> + 'static) -> Self {
        ArgsSpec::Validator(Rc::new(f))
    }

    pub(crate) fn into_rule(self) -> ArgsRule {
        match self {
            ArgsSpec::List(args)   => ArgsRule::Predicates(args.into_iter().map(Arg::to_predicate).collect()),
            ArgsSpec::NoArgs       => ArgsRule::NoArgs,
            ArgsSpec::Validator(f) => ArgsRule::Validator(f),
        }
    }
}

impl<T: Into<Arg>> From<Vec<T>> for ArgsSpec {
    fn from(args: Vec<T>) -> Self {
        ArgsSpec::List(args.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Arg>, const N: usize> From<[T; N]> for ArgsSpec {
    fn from(args: [T; N]) -> Self {
        ArgsSpec::List(args.into_iter().map(Into::into).collect())
    }
}

impl From<()> for ArgsSpec {
    fn from(_: ()) -> Self { ArgsSpec::NoArgs }
}

/// Build an `ArgsSpec` from heterogeneous expected arguments:
/// `args![1, "two", is_null()]`.
#[macro_export]
macro_rules! args {
    () => { $crate::expect::ArgsSpec::List(::std::vec::Vec::new()) };
    ($($arg:expr),+ $(,)?) => {
        $crate::expect::ArgsSpec::List(::std::vec![$($crate::expect::Arg::from($arg)),+])
    };
}

// ─── Normalized rule ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub enum ArgsRule {
    /// Predicate *i* checks argument *i*; extra arguments are not checked.
    Predicates(Vec<PredicateRef>),
    NoArgs,
    Validator(ArgsValidator),
}

impl ArgsRule {
    pub fn check(&self, args: &[Value]) -> Result<(), String> {
        match self {
            ArgsRule::Predicates(predicates) => {
                for (i, p) in predicates.iter().enumerate() {
                    let Some(arg) = args.get(i) else {
                        return Err(format!("argument #{} is missing: expected one that {}", i + 1, p.describe()));
                    };
                    p.evaluate(arg).map_err(|m| format!("argument #{}: {m}", i + 1))?;
                }
                Ok(())
            }
            ArgsRule::NoArgs if args.is_empty() => Ok(()),
            ArgsRule::NoArgs => Err(format!("expected no arguments, {} given", args.len())),
            ArgsRule::Validator(f) => f(args),
        }
    }
}

impl fmt::Debug for ArgsRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsRule::Predicates(p) => f.debug_tuple("Predicates").field(p).finish(),
            ArgsRule::NoArgs        => f.write_str("NoArgs"),
            ArgsRule::Validator(_)  => f.write_str("Validator(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_are_normalized() {
        assert!(to_predicate(Value::Bool(true)).matches(&Value::Bool(true)));
        assert!(!to_predicate(Value::Bool(true)).matches(&Value::Int(1)));
        assert!(to_predicate(Value::Null).matches(&Value::Null));
        assert!(to_predicate(Value::Int(3)).matches(&Value::Float(3.0)));
    }

    #[test]
    fn missing_argument_fails() {
        let rule = ArgsSpec::from(vec![1, 2]).into_rule();
        let err = rule.check(&[Value::Int(1)]).unwrap_err();
        assert!(err.contains("argument #2 is missing"));
    }

    #[test]
    fn extra_arguments_are_not_checked() {
        let rule = ArgsSpec::from(["a"]).into_rule();
        assert!(rule.check(&[Value::from("a"), Value::from("b")]).is_ok());
    }

    #[test]
    fn no_args() {
        let rule = ArgsSpec::from(()).into_rule();
        assert!(rule.check(&[]).is_ok());
        assert!(rule.check(&[Value::Null]).is_err());
    }

    #[test]
    fn macro_mixes_values_and_predicates() {
        let rule = args![1, "x", constraints::is_null()].into_rule();
        assert!(rule.check(&[Value::Int(1), Value::from("x"), Value::Null]).is_ok());
        assert!(rule.check(&[Value::Int(1), Value::from("y"), Value::Null]).is_err());
    }
}
