use std::fmt;
use std::rc::Rc;

use crate::constraints::PredicateRef;
use crate::error::{DoubleError, Result};
use crate::expect::Arg;
use crate::runtime::value::Value;
use crate::stubs::{StubCall, StubRef, StubStrategy};

// ─── Return value ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ReturnValue(pub Value);

impl StubStrategy for ReturnValue {
    fn invoke(&self, _call: &mut StubCall<'_>) -> Result<Value> {
        Ok(self.0.clone())
    }
}

pub fn return_value(value: impl Into<Value>) -> StubRef {
    Rc::new(ReturnValue(value.into()))
}

// ─── Return argument ──────────────────────────────────────────────────────────

/// Echo the argument at a 1-based position.
#[derive(Debug)]
pub struct ReturnArgument(usize);

impl StubStrategy for ReturnArgument {
    fn invoke(&self, call: &mut StubCall<'_>) -> Result<Value> {
        call.args.get(self.0 - 1).cloned().ok_or_else(|| {
            DoubleError::InvalidArgument(format!(
                "argument #{} of `{}()` was not passed and cannot be returned", self.0, call.method
            ))
        })
    }
}

pub fn return_argument(position: usize) -> Result<StubRef> {
    if position == 0 {
        return Err(DoubleError::InvalidArgument("argument positions start at 1".into()));
    }
    Ok(Rc::new(ReturnArgument(position)))
}

// ─── Callback ─────────────────────────────────────────────────────────────────

/// Runs a closure over the passed arguments. Writes to the slice reach the
/// caller for by-reference parameters.
pub struct ReturnCallback(Box<dyn Fn(&mut [Value]) -> Result<Value>>);

impl fmt::Debug for ReturnCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ReturnCallback(..)")
    }
}

impl StubStrategy for ReturnCallback {
    fn invoke(&self, call: &mut StubCall<'_>) -> Result<Value> {
        (self.0)(call.args)
    }
}

pub fn return_callback(f: impl Fn(&mut [Value]) -> Result<Value> + 'static) -> StubRef {
    Rc::new(ReturnCallback(Box::new(f)))
}

// ─── Self ─────────────────────────────────────────────────────────────────────

/// The instance for instance calls, the type for static calls.
#[derive(Debug)]
pub struct ReturnSelf;

impl StubStrategy for ReturnSelf {
    fn invoke(&self, call: &mut StubCall<'_>) -> Result<Value> {
        Ok(call.receiver.to_value())
    }
}

pub fn return_self() -> StubRef {
    Rc::new(ReturnSelf)
}

// ─── Value map ────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum MapReturns {
    /// One value per row.
    Each(Vec<Value>),
    /// Same value for every row.
    Single(Value),
}

/// Returns the value of the first row whose predicates accept the arguments;
/// `Null` when no row matches. A row matches only calls with exactly as many
/// arguments as it has entries.
#[derive(Debug)]
pub struct ReturnValueMap {
    rows:    Vec<Vec<PredicateRef>>,
    returns: MapReturns,
}

impl ReturnValueMap {
    fn matching_row(&self, args: &[Value]) -> Option<usize> {
        self.rows.iter().position(|row| {
            row.len() == args.len() && row.iter().zip(args).all(|(p, a)| p.matches(a))
        })
    }
}

impl StubStrategy for ReturnValueMap {
    fn invoke(&self, call: &mut StubCall<'_>) -> Result<Value> {
        let Some(i) = self.matching_row(call.args) else { return Ok(Value::Null) };
        Ok(match &self.returns {
            MapReturns::Each(values) => values[i].clone(),
            MapReturns::Single(value) => value.clone(),
        })
    }
}

fn normalize_rows(rows: Vec<Vec<Arg>>) -> Vec<Vec<PredicateRef>> {
    rows.into_iter()
        .map(|row| row.into_iter().map(Arg::to_predicate).collect())
        .collect()
}

/// Row *i* of `rows` maps to `returns[i]`.
pub fn return_value_map(rows: Vec<Vec<Arg>>, returns: Vec<Value>) -> Result<StubRef> {
    if rows.len() != returns.len() {
        return Err(DoubleError::InvalidArgument(format!(
            "value map has {} argument row(s) but {} return value(s)", rows.len(), returns.len()
        )));
    }
    Ok(Rc::new(ReturnValueMap { rows: normalize_rows(rows), returns: MapReturns::Each(returns) }))
}

/// Every row in `rows` maps to `value`.
pub fn return_value_for(rows: Vec<Vec<Arg>>, value: impl Into<Value>) -> StubRef {
    Rc::new(ReturnValueMap { rows: normalize_rows(rows), returns: MapReturns::Single(value.into()) })
}

// ─── Throw ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ThrowError {
    kind:    String,
    message: Option<String>,
}

impl StubStrategy for ThrowError {
    fn invoke(&self, _call: &mut StubCall<'_>) -> Result<Value> {
        Err(DoubleError::thrown(self.kind.clone(), self.message.clone()))
    }
}

pub fn throw_error(kind: &str, message: Option<&str>) -> StubRef {
    Rc::new(ThrowError { kind: kind.to_string(), message: message.map(str::to_string) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::frame::Receiver;

    fn invoke(stub: &StubRef, args: &mut [Value]) -> Result<Value> {
        let receiver = Receiver::Type("Foo".into());
        stub.invoke(&mut StubCall { method: "bar", args, receiver: &receiver })
    }

    #[test]
    fn argument_position_zero_is_invalid() {
        assert!(matches!(return_argument(0), Err(DoubleError::InvalidArgument(_))));
    }

    #[test]
    fn missing_argument_errors_at_call_time() {
        let stub = return_argument(2).unwrap();
        assert_eq!(invoke(&stub, &mut [Value::Int(1), Value::Int(2)]).unwrap(), Value::Int(2));
        assert!(invoke(&stub, &mut [Value::Int(1)]).is_err());
    }

    #[test]
    fn value_map_rows() {
        let stub = return_value_map(
            vec![vec![Arg::from(1), Arg::from("a")], vec![Arg::from(2)]],
            vec![Value::from("first"), Value::from("second")],
        ).unwrap();
        assert_eq!(invoke(&stub, &mut [Value::Int(1), Value::from("a")]).unwrap(), Value::from("first"));
        assert_eq!(invoke(&stub, &mut [Value::Int(2)]).unwrap(), Value::from("second"));
        assert_eq!(invoke(&stub, &mut [Value::Int(2), Value::Int(2)]).unwrap(), Value::Null);
    }

    #[test]
    fn value_map_length_mismatch() {
        let err = return_value_map(vec![vec![Arg::from(1)]], vec![]).unwrap_err();
        assert!(matches!(err, DoubleError::InvalidArgument(_)));
    }

    #[test]
    fn callback_can_write_arguments() {
        let stub = return_callback(|args| {
            args[0] = Value::from("changed");
            Ok(Value::Bool(true))
        });
        let mut args = [Value::from("orig")];
        invoke(&stub, &mut args).unwrap();
        assert_eq!(args[0], Value::from("changed"));
    }

    #[test]
    fn throw_carries_kind_and_message() {
        let err = invoke(&throw_error("RuntimeError", Some("boom")), &mut []).unwrap_err();
        assert_eq!(err, DoubleError::thrown("RuntimeError", Some("boom".into())));
        assert_eq!(err.to_string(), "[C002] RuntimeError: boom");
    }
}
