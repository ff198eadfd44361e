//! Call-count rules: `count(3)`, `count(">=2")`, `count("1-3")`, predicates
//! and whole-log inspectors.

use std::fmt;
use std::rc::Rc;

use crate::constraints::PredicateRef;
use crate::error::{DoubleError, Result};
use crate::runtime::call_log::CallLog;
use crate::runtime::value::Value;

pub type CountInspector = Rc<dyn Fn(&CallLog) -> Result<(), String>>;

const GRAMMAR: &str =
    "expected a non-negative integer, \"N\", \">N\", \">=N\", \"<N\", \"<=N\", \"i-j\", a predicate or an inspector";

#[derive(Clone)]
pub enum CountRule {
    Exactly(usize),
    MoreThan(usize),
    AtLeast(usize),
    LessThan(usize),
    AtMost(usize),
    /// Inclusive range.
    Between(usize, usize),
    /// Evaluated against the call count as `Value::Int`.
    Predicate(PredicateRef),
    Inspect(CountInspector),
}

impl CountRule {
    /// Parse the string grammar.
    pub fn parse(src: &str) -> Result<Self> {
        let s = src.trim();
        let invalid = || DoubleError::InvalidArgument(format!("invalid count `{src}`: {GRAMMAR}"));
        // Digits only, no sign.
        let number = |n: &str| {
            let n = n.trim();
            if n.is_empty() || !n.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            n.parse::<usize>().map_err(|_| invalid())
        };

        if let Some(rest) = s.strip_prefix(">=") {
            Ok(CountRule::AtLeast(number(rest)?))
        } else if let Some(rest) = s.strip_prefix('>') {
            Ok(CountRule::MoreThan(number(rest)?))
        } else if let Some(rest) = s.strip_prefix("<=") {
            Ok(CountRule::AtMost(number(rest)?))
        } else if let Some(rest) = s.strip_prefix('<') {
            Ok(CountRule::LessThan(number(rest)?))
        } else if let Some((lo, hi)) = s.split_once('-') {
            let (lo, hi) = (number(lo)?, number(hi)?);
            if lo > hi {
                return Err(invalid());
            }
            Ok(CountRule::Between(lo, hi))
        } else {
            Ok(CountRule::Exactly(number(s)?))
        }
    }

    pub fn check(&self, log: &CallLog) -> Result<(), String> {
        let n = log.len();
        let ok = match self {
            CountRule::Exactly(k)      => n == *k,
            CountRule::MoreThan(k)     => n > *k,
            CountRule::AtLeast(k)      => n >= *k,
            CountRule::LessThan(k)     => n < *k,
            CountRule::AtMost(k)       => n <= *k,
            CountRule::Between(lo, hi) => (*lo..=*hi).contains(&n),
            CountRule::Predicate(p)    => {
                let count = i64::try_from(n).unwrap_or(i64::MAX);
                return p
                    .evaluate(&Value::Int(count))
                    .map_err(|m| format!("call count: {m}"));
            }
            CountRule::Inspect(f)      => return f(log),
        };
        if ok {
            Ok(())
        } else {
            Err(format!("expected to be called {self}, called {n} time(s)"))
        }
    }
}

impl fmt::Display for CountRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountRule::Exactly(k)      => write!(f, "exactly {k} time(s)"),
            CountRule::MoreThan(k)     => write!(f, "more than {k} time(s)"),
            CountRule::AtLeast(k)      => write!(f, "at least {k} time(s)"),
            CountRule::LessThan(k)     => write!(f, "less than {k} time(s)"),
            CountRule::AtMost(k)       => write!(f, "at most {k} time(s)"),
            CountRule::Between(lo, hi) => write!(f, "between {lo} and {hi} time(s)"),
            CountRule::Predicate(p)    => write!(f, "a number of times that {}", p.describe()),
            CountRule::Inspect(_)      => f.write_str("as accepted by the inspector"),
        }
    }
}

impl fmt::Debug for CountRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CountRule({self})")
    }
}

// ─── Input ────────────────────────────────────────────────────────────────────

/// What `Expectation::count` accepts. Parsing is deferred to `into_rule` so
/// a malformed string surfaces as an error from `count` itself.
#[derive(Clone)]
pub enum CountSpec {
    Int(i64),
    Text(String),
    Rule(CountRule),
}

impl CountSpec {
    /// Validate the whole call log of the method at verification time.
    pub fn inspect(f: impl Fn(&CallLog) -> Result<(), String> + 'static) -> Self {
        CountSpec::Rule(CountRule::Inspect(Rc::new(f)))
    }

    pub(crate) fn into_rule(self) -> Result<CountRule> {
        match self {
            CountSpec::Int(n) => usize::try_from(n).map(CountRule::Exactly).map_err(|_| {
                DoubleError::InvalidArgument(format!("invalid count `{n}`: {GRAMMAR}"))
            }),
            CountSpec::Text(s) => CountRule::parse(&s),
            CountSpec::Rule(r) => Ok(r),
        }
    }
}

impl From<i64> for CountSpec { fn from(n: i64) -> Self { CountSpec::Int(n) } }
impl From<i32> for CountSpec { fn from(n: i32) -> Self { CountSpec::Int(i64::from(n)) } }
impl From<&str> for CountSpec { fn from(s: &str) -> Self { CountSpec::Text(s.to_string()) } }
impl From<String> for CountSpec { fn from(s: String) -> Self { CountSpec::Text(s) } }
impl From<PredicateRef> for CountSpec { fn from(p: PredicateRef) -> Self { CountSpec::Rule(CountRule::Predicate(p)) } }
impl From<CountRule> for CountSpec { fn from(r: CountRule) -> Self { CountSpec::Rule(r) } }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints;

    fn log_of(n: usize) -> CallLog {
        let mut log = CallLog::default();
        for i in 0..n {
            log.push(i as u64, Vec::new(), crate::expect::BehaviorKind::Dummy);
        }
        log
    }

    fn accepts(spec: impl Into<CountSpec>, n: usize) -> bool {
        spec.into().into_rule().unwrap().check(&log_of(n)).is_ok()
    }

    #[test]
    fn exact_forms_agree() {
        assert!(accepts(3, 3));
        assert!(accepts("3", 3));
        assert!(accepts(">=3", 3));
        assert!(!accepts(3, 2));
    }

    #[test]
    fn range_is_inclusive() {
        assert!(!accepts("2-4", 1));
        assert!(accepts("2-4", 2));
        assert!(accepts("2-4", 3));
        assert!(accepts("2-4", 4));
        assert!(!accepts("2-4", 5));
    }

    #[test]
    fn strict_bounds() {
        assert!(accepts(">2", 3));
        assert!(!accepts(">2", 2));
        assert!(accepts("<2", 1));
        assert!(!accepts("<2", 2));
        assert!(accepts("<=2", 2));
        assert!(accepts("0", 0));
    }

    #[test]
    fn predicate_sees_count() {
        assert!(accepts(constraints::greater_than(1), 2));
        assert!(!accepts(constraints::greater_than(1), 1));
    }

    #[test]
    fn inspector_sees_log() {
        let spec = CountSpec::inspect(|log| if log.len() % 2 == 0 { Ok(()) } else { Err("odd".into()) });
        assert!(accepts(spec.clone(), 4));
        assert!(!accepts(spec, 3));
    }

    #[test]
    fn invalid_forms_are_rejected() {
        for bad in ["abc", ">", ">=x", "4-2", "-1", "1-2-3", "", "+3", ">=+2", "1-+4", "<+1"] {
            let err = CountSpec::from(bad).into_rule().unwrap_err();
            assert!(matches!(err, DoubleError::InvalidArgument(ref m) if m.contains("\"i-j\"")), "{bad}");
        }
        assert!(CountSpec::from(-1).into_rule().is_err());
    }
}
