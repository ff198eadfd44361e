use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{DoubleError, Result};
use crate::expect::args::{ArgsRule, ArgsSpec};
use crate::expect::count::{CountRule, CountSpec};
use crate::stubs::{IntoStub, StubRef};

// ─── Behaviors ────────────────────────────────────────────────────────────────

/// What a call to a double's method does.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Return `Null` without touching the original.
    Dummy,
    /// Run the original method body.
    Mock,
    Stub(StubRef),
}

impl Behavior {
    pub fn kind(&self) -> BehaviorKind {
        match self {
            Behavior::Dummy   => BehaviorKind::Dummy,
            Behavior::Mock    => BehaviorKind::Mock,
            Behavior::Stub(_) => BehaviorKind::Stub,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorKind {
    Dummy,
    Mock,
    Stub,
}

// ─── Call indices ─────────────────────────────────────────────────────────────

/// One or more 1-based call indices. Validated when used.
#[derive(Debug, Clone, PartialEq)]
pub struct Calls(Vec<i64>);

impl Calls {
    pub(crate) fn indices(&self) -> Result<Vec<usize>> {
        if self.0.is_empty() {
            return Err(DoubleError::InvalidArgument("at least one call index is required".into()));
        }
        self.0
            .iter()
            .map(|&i| match usize::try_from(i) {
                Ok(i) if i >= 1 => Ok(i),
                _ => Err(DoubleError::InvalidArgument(format!(
                    "call index must be a positive integer, got {i}"
                ))),
            })
            .collect()
    }
}

impl From<i64> for Calls { fn from(i: i64) -> Self { Calls(vec![i]) } }
impl From<i32> for Calls { fn from(i: i32) -> Self { Calls(vec![i64::from(i)]) } }
impl From<Vec<i64>> for Calls { fn from(v: Vec<i64>) -> Self { Calls(v) } }
impl From<Vec<i32>> for Calls { fn from(v: Vec<i32>) -> Self { Calls(v.into_iter().map(i64::from).collect()) } }
impl From<&[i64]> for Calls { fn from(v: &[i64]) -> Self { Calls(v.to_vec()) } }

impl<const N: usize> From<[i64; N]> for Calls {
    fn from(v: [i64; N]) -> Self { Calls(v.to_vec()) }
}

impl<const N: usize> From<[i32; N]> for Calls {
    fn from(v: [i32; N]) -> Self { Calls(v.into_iter().map(i64::from).collect()) }
}

// ─── Expectation ──────────────────────────────────────────────────────────────

struct ExpectationState {
    double: String,
    method: String,
    /// `None` entries pin a call to the method's blanket default.
    behaviors:        BTreeMap<usize, Option<Behavior>>,
    default_behavior: Option<Behavior>,
    args:             BTreeMap<usize, ArgsRule>,
    default_args:     Option<ArgsRule>,
    count:            Option<CountRule>,
}

/// Per-method rules of one double, keyed by call index.
///
/// Cloning yields another handle to the same rules; the dispatcher holds one,
/// the test holds another.
#[derive(Clone)]
pub struct Expectation(Rc<RefCell<ExpectationState>>);

impl Expectation {
    pub(crate) fn new(double: &str, method: &str) -> Self {
        Expectation(Rc::new(RefCell::new(ExpectationState {
            double: double.to_string(),
            method: method.to_string(),
            behaviors: BTreeMap::new(),
            default_behavior: None,
            args: BTreeMap::new(),
            default_args: None,
            count: None,
        })))
    }

    pub fn double(&self) -> String { self.0.borrow().double.clone() }

    pub fn method(&self) -> String { self.0.borrow().method.clone() }

    // ── Behaviors ─────────────────────────────────────────────────────────────

    pub fn dummy(&self) -> Result<&Self> {
        self.set_behavior(Some(Behavior::Dummy));
        Ok(self)
    }

    pub fn dummy_on(&self, calls: impl Into<Calls>) -> Result<&Self> {
        self.set_behavior_on(Some(Behavior::Dummy), calls.into())?;
        Ok(self)
    }

    pub fn mock(&self) -> Result<&Self> {
        self.set_behavior(Some(Behavior::Mock));
        Ok(self)
    }

    pub fn mock_on(&self, calls: impl Into<Calls>) -> Result<&Self> {
        self.set_behavior_on(Some(Behavior::Mock), calls.into())?;
        Ok(self)
    }

    pub fn stub(&self, stub: impl IntoStub) -> Result<&Self> {
        self.set_behavior(Some(Behavior::Stub(stub.into_stub())));
        Ok(self)
    }

    pub fn stub_on(&self, stub: impl IntoStub, calls: impl Into<Calls>) -> Result<&Self> {
        self.set_behavior_on(Some(Behavior::Stub(stub.into_stub())), calls.into())?;
        Ok(self)
    }

    /// Back to the method's blanket default for every call.
    pub fn use_default(&self) -> Result<&Self> {
        self.set_behavior(None);
        Ok(self)
    }

    pub fn use_default_on(&self, calls: impl Into<Calls>) -> Result<&Self> {
        self.set_behavior_on(None, calls.into())?;
        Ok(self)
    }

    fn set_behavior(&self, behavior: Option<Behavior>) {
        let mut state = self.0.borrow_mut();
        state.behaviors.clear();
        state.default_behavior = behavior;
    }

    fn set_behavior_on(&self, behavior: Option<Behavior>, calls: Calls) -> Result<()> {
        let indices = calls.indices()?;
        let mut state = self.0.borrow_mut();
        for i in indices {
            state.behaviors.insert(i, behavior.clone());
        }
        Ok(())
    }

    // ── Arguments ─────────────────────────────────────────────────────────────

    pub fn args(&self, spec: impl Into<ArgsSpec>) -> Result<&Self> {
        let rule = spec.into().into_rule();
        let mut state = self.0.borrow_mut();
        state.args.clear();
        state.default_args = Some(rule);
        drop(state);
        Ok(self)
    }

    pub fn args_on(&self, spec: impl Into<ArgsSpec>, calls: impl Into<Calls>) -> Result<&Self> {
        let indices = calls.into().indices()?;
        let rule = spec.into().into_rule();
        let mut state = self.0.borrow_mut();
        for i in indices {
            state.args.insert(i, rule.clone());
        }
        drop(state);
        Ok(self)
    }

    // ── Count ─────────────────────────────────────────────────────────────────

    pub fn count(&self, spec: impl Into<CountSpec>) -> Result<&Self> {
        let rule = spec.into().into_rule()?;
        self.0.borrow_mut().count = Some(rule);
        Ok(self)
    }

    // ── Read side ─────────────────────────────────────────────────────────────

    /// Explicit behavior for call `index`; `None` means the blanket default.
    pub fn behavior_for(&self, index: usize) -> Option<Behavior> {
        let state = self.0.borrow();
        match state.behaviors.get(&index) {
            Some(pinned) => pinned.clone(),
            None => state.default_behavior.clone(),
        }
    }

    pub fn args_for(&self, index: usize) -> Option<ArgsRule> {
        let state = self.0.borrow();
        state.args.get(&index).or(state.default_args.as_ref()).cloned()
    }

    pub fn count_rule(&self) -> Option<CountRule> {
        self.0.borrow().count.clone()
    }

    pub(crate) fn reset(&self) {
        let mut state = self.0.borrow_mut();
        state.behaviors.clear();
        state.default_behavior = None;
        state.args.clear();
        state.default_args = None;
        state.count = None;
    }
}

impl std::fmt::Debug for Expectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.0.borrow();
        f.debug_struct("Expectation")
            .field("double", &state.double)
            .field("method", &state.method)
            .field("behaviors", &state.behaviors)
            .field("default_behavior", &state.default_behavior)
            .field("count", &state.count)
            .finish()
    }
}
