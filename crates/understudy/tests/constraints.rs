//! Predicate library tests.

use understudy::constraints::*;
use understudy::expect::to_predicate;
use understudy::{ObjectRef, Value};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn object(class: &str, props: &[(&str, Value)]) -> Value {
    let obj = ObjectRef::new(class, Default::default());
    for (name, value) in props {
        obj.set(name, value.clone());
    }
    Value::Object(obj)
}

fn list(items: &[i64]) -> Value {
    Value::from(items.to_vec())
}

// ─── Equality ────────────────────────────────────────────────────────────────

#[test]
fn equal_is_loose() {
    assert!(equal_to(1).matches(&Value::Float(1.0)));
    assert!(equal_to("a").matches(&Value::from("a")));
    assert!(!equal_to("1").matches(&Value::from(1)));
    let a = object("Point", &[("x", Value::from(1))]);
    let b = object("Point", &[("x", Value::from(1))]);
    assert!(equal_to(a.clone()).matches(&b));
}

#[test]
fn identical_is_strict() {
    assert!(!identical_to(1).matches(&Value::Float(1.0)));
    let a = object("Point", &[]);
    let b = object("Point", &[]);
    assert!(identical_to(a.clone()).matches(&a));
    assert!(!identical_to(a).matches(&b));
}

#[test]
fn literal_conversion() {
    assert!(to_predicate(Value::Bool(true)).matches(&Value::Bool(true)));
    assert!(!to_predicate(Value::Bool(true)).matches(&Value::Int(1)));
    assert!(!to_predicate(Value::Bool(false)).matches(&Value::Int(0)));
    assert!(to_predicate(Value::Null).matches(&Value::Null));
    assert!(!to_predicate(Value::Null).matches(&Value::from("")));
    assert!(to_predicate(Value::from(3)).matches(&Value::Float(3.0)));
}

// ─── Ordering and types ──────────────────────────────────────────────────────

#[test]
fn ordering() {
    assert!(greater_than(2).matches(&Value::from(3)));
    assert!(!greater_than(2).matches(&Value::from(2)));
    assert!(less_than(2.5).matches(&Value::from(2)));
    assert!(greater_than("a").matches(&Value::from("b")));
    assert!(!less_than(1).matches(&Value::from("0")));
}

#[test]
fn types() {
    assert!(is_type("int").matches(&Value::from(1)));
    assert!(is_type("array").matches(&list(&[1])));
    assert!(is_type("object").matches(&object("Point", &[])));
    assert!(is_type("\\Point").matches(&object("Point", &[])));
    assert!(!is_type("string").matches(&Value::Null));
    assert!(is_null().matches(&Value::Null));
    assert!(is_not_null().matches(&Value::from(false)));
}

// ─── Strings and lists ───────────────────────────────────────────────────────

#[test]
fn strings() {
    let v = Value::from("hello world");
    assert!(string_contains("o w").matches(&v));
    assert!(string_starts_with("hell").matches(&v));
    assert!(string_ends_with("world").matches(&v));
    assert!(!string_contains("x").matches(&Value::from(1)));
}

#[test]
fn lists() {
    assert!(contains(2).matches(&list(&[1, 2, 3])));
    assert!(!contains(4).matches(&list(&[1, 2, 3])));
    assert!(count_of(3).matches(&list(&[1, 2, 3])));
    assert!(!count_of(3).matches(&Value::from("abc")));
}

// ─── Composition ─────────────────────────────────────────────────────────────

#[test]
fn composition() {
    let between = logical_and(vec![greater_than(1), less_than(5)]);
    assert!(between.matches(&Value::from(3)));
    assert!(!between.matches(&Value::from(5)));
    let edge = logical_or(vec![equal_to(0), equal_to(10)]);
    assert!(edge.matches(&Value::from(10)));
    assert!(logical_not(edge).matches(&Value::from(5)));
    assert!(callback(|v| v.as_int() == Some(7)).matches(&Value::from(7)));
    assert!(anything().matches(&Value::Null));
}

#[test]
fn evaluate_describes_failure() {
    let err = greater_than(5).evaluate(&Value::from(3)).unwrap_err();
    assert_eq!(err, "failed asserting that 3 is greater than 5");
    let err = logical_not(is_null()).evaluate(&Value::Null).unwrap_err();
    assert_eq!(err, "failed asserting that null not( is null )");
}

#[test]
fn custom_predicate() {
    #[derive(Debug)]
    struct Even;

    impl Predicate for Even {
        fn matches(&self, value: &Value) -> bool {
            value.as_int().is_some_and(|i| i % 2 == 0)
        }

        fn describe(&self) -> String { "is even".into() }
    }

    let even: PredicateRef = std::rc::Rc::new(Even);
    assert!(even.evaluate(&Value::from(4)).is_ok());
    assert_eq!(even.evaluate(&Value::from(3)).unwrap_err(), "failed asserting that 3 is even");
}
