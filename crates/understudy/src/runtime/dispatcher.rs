//! Call dispatcher: the body behind every generated method of a double.
//!
//! Per (double, method) the dispatcher keeps a call log and an optional
//! expectation. A call:
//!   1. resolves its behavior: expectation for the call index, else the
//!      expectation's default, else the method's blanket default
//!   2. is appended to the call log
//!   3. is checked against the argument rule for its index
//!   4. runs the behavior
//!
//! Count rules are only checked by `verify`.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::analysis::{DoubleDefinition, DoubleKind};
use crate::config::DoubleConfig;
use crate::error::{AssertionFailure, Result};
use crate::expect::{Behavior, Expectation};
use crate::runtime::call_log::CallLog;
use crate::runtime::frame::CallFrame;
use crate::runtime::value::Value;
use crate::stubs::StubCall;

pub struct Dispatcher {
    double:       String,
    kind:         DoubleKind,
    /// Where `Mock` behavior finds the real implementation.
    base:         Option<String>,
    config:       DoubleConfig,
    /// Behavior used when no expectation says otherwise.
    blankets:     HashMap<String, Behavior>,
    expectations: RefCell<HashMap<String, Expectation>>,
    logs:         RefCell<HashMap<String, CallLog>>,
    failures:     RefCell<Vec<AssertionFailure>>,
    /// Shared by every double of a session.
    clock:        Rc<Cell<u64>>,
}

impl Dispatcher {
    pub(crate) fn new(
        definition: &DoubleDefinition,
        blankets: HashMap<String, Behavior>,
        clock: Rc<Cell<u64>>,
    ) -> Self {
        Self {
            double: definition.synthetic_name.clone(),
            kind: definition.kind,
            base: definition.base.clone(),
            config: definition.config,
            blankets,
            expectations: RefCell::new(HashMap::new()),
            logs: RefCell::new(HashMap::new()),
            failures: RefCell::new(Vec::new()),
            clock,
        }
    }

    pub fn double(&self) -> &str { &self.double }

    pub fn kind(&self) -> DoubleKind { self.kind }

    pub fn handles(&self, method: &str) -> bool {
        self.blankets.contains_key(method)
    }

    /// The method's expectation, created on first use.
    pub(crate) fn expectation(&self, method: &str) -> Expectation {
        self.expectations
            .borrow_mut()
            .entry(method.to_string())
            .or_insert_with(|| Expectation::new(&self.double, method))
            .clone()
    }

    pub fn has_expectation(&self, method: &str) -> bool {
        self.expectations.borrow().contains_key(method)
    }

    pub fn calls(&self, method: &str) -> CallLog {
        self.logs.borrow().get(method).cloned().unwrap_or_default()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.logs.borrow().get(method).map_or(0, CallLog::len)
    }

    fn blanket(&self, method: &str) -> Behavior {
        self.blankets.get(method).cloned().unwrap_or(Behavior::Dummy)
    }

    // ─── Dispatch ────────────────────────────────────────────────────────────

    pub(crate) fn dispatch(&self, frame: &mut CallFrame<'_>) -> Result<Value> {
        let method = frame.method().to_string();
        let expectation = self.expectations.borrow().get(&method).cloned();

        let index = self.call_count(&method) + 1;
        let behavior = expectation
            .as_ref()
            .and_then(|e| e.behavior_for(index))
            .unwrap_or_else(|| self.blanket(&method));

        let sequence = self.clock.get() + 1;
        self.clock.set(sequence);
        self.logs
            .borrow_mut()
            .entry(method.clone())
            .or_default()
            .push(sequence, frame.passed_args().to_vec(), behavior.kind());

        tracing::trace!(
            target: "understudy::dispatch",
            double = %self.double,
            method = %method,
            call = index,
            behavior = ?behavior.kind(),
            "dispatch"
        );

        if let Some(rule) = expectation.as_ref().and_then(|e| e.args_for(index)) {
            if let Err(message) = rule.check(frame.passed_args()) {
                let failure = AssertionFailure::new(&self.double, &method, Some(index), message);
                self.record(failure.clone());
                return Err(failure.into());
            }
        }

        match behavior {
            Behavior::Dummy => Ok(Value::Null),
            Behavior::Mock => match &self.base {
                Some(base) if has_implementation(frame, base, &method) => frame.delegate(base),
                _ => Ok(Value::Null),
            },
            Behavior::Stub(stub) => {
                let receiver = frame.receiver().clone();
                let mut call = StubCall { method: &method, args: frame.passed_args_mut(), receiver: &receiver };
                stub.invoke(&mut call)
            }
        }
    }

    fn record(&self, failure: AssertionFailure) {
        tracing::warn!(target: "understudy::dispatch", %failure, "expectation failed");
        self.failures.borrow_mut().push(failure);
    }

    // ─── Verification ────────────────────────────────────────────────────────

    /// Recorded argument failures, then count failures, then (when enabled)
    /// calls to methods without an expectation.
    pub fn verify(&self) -> Vec<AssertionFailure> {
        let mut out = self.failures.borrow().clone();

        let mut expectations: Vec<(String, Expectation)> = self
            .expectations
            .borrow()
            .iter()
            .map(|(name, e)| (name.clone(), e.clone()))
            .collect();
        expectations.sort_by(|a, b| a.0.cmp(&b.0));

        for (method, expectation) in &expectations {
            let Some(rule) = expectation.count_rule() else { continue };
            let log = self.calls(method);
            if let Err(message) = rule.check(&log) {
                out.push(AssertionFailure::new(&self.double, method, None, message));
            }
        }

        if self.config.test_unexpected_methods {
            let mut unexpected: Vec<(String, usize)> = self
                .logs
                .borrow()
                .iter()
                .filter(|(name, log)| !log.is_empty() && !self.has_expectation(name))
                .map(|(name, log)| (name.clone(), log.len()))
                .collect();
            unexpected.sort();
            for (method, count) in unexpected {
                out.push(AssertionFailure::new(
                    &self.double,
                    &method,
                    None,
                    format!("unexpected method called {count} time(s) without an expectation"),
                ));
            }
        }
        out
    }

    /// Forget expectations, calls and recorded failures. Handles to old
    /// expectations keep working but no longer affect the double.
    pub(crate) fn reset(&self) {
        for expectation in self.expectations.borrow_mut().drain().map(|(_, e)| e) {
            expectation.reset();
        }
        self.logs.borrow_mut().clear();
        self.failures.borrow_mut().clear();
    }
}

fn has_implementation(frame: &CallFrame<'_>, base: &str, method: &str) -> bool {
    frame
        .registry()
        .find_method(base, method)
        .is_some_and(|m| m.is_concrete())
}
