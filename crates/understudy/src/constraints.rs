//! Predicates over call arguments and call counts.
//!
//! `Predicate` is the boundary the expectation engine talks to; the
//! constructors below cover what tests usually need. Anything implementing
//! the trait can be passed wherever a `PredicateRef` is accepted.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use crate::runtime::value::Value;

pub trait Predicate: fmt::Debug {
    fn matches(&self, value: &Value) -> bool;

    /// Phrase completing "failed asserting that <value> …".
    fn describe(&self) -> String;

    fn evaluate(&self, value: &Value) -> Result<(), String> {
        if self.matches(value) {
            Ok(())
        } else {
            Err(format!("failed asserting that {value} {}", self.describe()))
        }
    }
}

pub type PredicateRef = Rc<dyn Predicate>;

// ─── Closure-backed predicate ─────────────────────────────────────────────────

struct FnPredicate {
    description: String,
    test:        Box<dyn Fn(&Value) -> bool>,
}

impl fmt::Debug for FnPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({})", self.description)
    }
}

impl Predicate for FnPredicate {
    fn matches(&self, value: &Value) -> bool { (self.test)(value) }

    fn describe(&self) -> String { self.description.clone() }
}

fn predicate(description: impl Into<String>, test: impl Fn(&Value) -> bool + 'static) -> PredicateRef {
    Rc::new(FnPredicate { description: description.into(), test: Box::new(test) })
}

/// Numbers compare numerically, strings lexically; anything else is unordered.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        _ => a.as_float()?.partial_cmp(&b.as_float()?),
    }
}

fn identical(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => x.ptr_eq(y),
        (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => false,
        (Value::List(x), Value::List(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| identical(a, b))
        }
        _ => a == b,
    }
}

// ─── Constructors ─────────────────────────────────────────────────────────────

pub fn anything() -> PredicateRef {
    predicate("is anything", |_| true)
}

pub fn is_true() -> PredicateRef {
    predicate("is true", |v| matches!(v, Value::Bool(true)))
}

pub fn is_false() -> PredicateRef {
    predicate("is false", |v| matches!(v, Value::Bool(false)))
}

pub fn is_null() -> PredicateRef {
    predicate("is null", Value::is_null)
}

pub fn is_not_null() -> PredicateRef {
    predicate("is not null", |v| !v.is_null())
}

/// Loose equality: `1 == 1.0`, objects of the same type with equal properties.
pub fn equal_to(expected: impl Into<Value>) -> PredicateRef {
    let expected = expected.into();
    predicate(format!("is equal to {expected}"), move |v| *v == expected)
}

/// Strict equality: same variant, and the same instance for objects.
pub fn identical_to(expected: impl Into<Value>) -> PredicateRef {
    let expected = expected.into();
    predicate(format!("is identical to {expected}"), move |v| identical(v, &expected))
}

pub fn greater_than(bound: impl Into<Value>) -> PredicateRef {
    let bound = bound.into();
    predicate(format!("is greater than {bound}"), move |v| {
        compare(v, &bound) == Some(Ordering::Greater)
    })
}

pub fn less_than(bound: impl Into<Value>) -> PredicateRef {
    let bound = bound.into();
    predicate(format!("is less than {bound}"), move |v| {
        compare(v, &bound) == Some(Ordering::Less)
    })
}

/// Matches on the value's type name: `"int"`, `"string"`, `"array"`, …, or
/// `"object"` for any instance, or an exact class name.
pub fn is_type(name: &str) -> PredicateRef {
    let name = name.trim_start_matches('\\').to_string();
    predicate(format!("is of type {name}"), move |v| {
        v.type_name() == name || (name == "object" && matches!(v, Value::Object(_)))
    })
}

pub fn string_contains(needle: &str) -> PredicateRef {
    let needle = needle.to_string();
    predicate(format!("contains \"{needle}\""), move |v| {
        v.as_str().is_some_and(|s| s.contains(needle.as_str()))
    })
}

pub fn string_starts_with(prefix: &str) -> PredicateRef {
    let prefix = prefix.to_string();
    predicate(format!("starts with \"{prefix}\""), move |v| {
        v.as_str().is_some_and(|s| s.starts_with(prefix.as_str()))
    })
}

pub fn string_ends_with(suffix: &str) -> PredicateRef {
    let suffix = suffix.to_string();
    predicate(format!("ends with \"{suffix}\""), move |v| {
        v.as_str().is_some_and(|s| s.ends_with(suffix.as_str()))
    })
}

/// A list holding `item`.
pub fn contains(item: impl Into<Value>) -> PredicateRef {
    let item = item.into();
    predicate(format!("contains {item}"), move |v| {
        v.items().is_some_and(|items| items.contains(&item))
    })
}

/// A list of exactly `len` items.
pub fn count_of(len: usize) -> PredicateRef {
    predicate(format!("has {len} element(s)"), move |v| {
        v.items().is_some_and(|items| items.len() == len)
    })
}

pub fn callback(test: impl Fn(&Value) -> bool + 'static) -> PredicateRef {
    predicate("is accepted by specified callback", test)
}

pub fn logical_not(inner: PredicateRef) -> PredicateRef {
    predicate(format!("not( {} )", inner.describe()), move |v| !inner.matches(v))
}

pub fn logical_and(all: Vec<PredicateRef>) -> PredicateRef {
    let description = all.iter().map(|p| p.describe()).collect::<Vec<_>>().join(" and ");
    predicate(description, move |v| all.iter().all(|p| p.matches(v)))
}

pub fn logical_or(any: Vec<PredicateRef>) -> PredicateRef {
    let description = any.iter().map(|p| p.describe()).collect::<Vec<_>>().join(" or ");
    predicate(description, move |v| any.iter().any(|p| p.matches(v)))
}
