use crate::error::{DoubleError, Result};
use crate::runtime::value::{ObjectRef, Value};
use crate::types::registry::TypeRegistry;

/// Who a method was invoked on.
#[derive(Debug, Clone, PartialEq)]
pub enum Receiver {
    Instance(ObjectRef),
    /// Static call; holds the type the call was made through.
    Type(String),
}

impl Receiver {
    pub fn to_value(&self) -> Value {
        match self {
            Receiver::Instance(obj) => Value::Object(obj.clone()),
            Receiver::Type(name)    => Value::Class(name.clone()),
        }
    }

    /// Name of the receiver's runtime type.
    pub fn type_name(&self) -> &str {
        match self {
            Receiver::Instance(obj) => obj.class(),
            Receiver::Type(name)    => name,
        }
    }
}

/// Everything a method body can see while it runs.
///
/// `args` holds the bound arguments: the ones the caller passed, followed by
/// defaults for the optional parameters that were left out. Writes to a slot
/// bound to a by-reference parameter reach the caller once the body returns.
pub struct CallFrame<'a> {
    pub(crate) registry: &'a TypeRegistry,
    pub(crate) receiver: &'a Receiver,
    /// Type that declared the running method; `call_parent` starts above it.
    pub(crate) owner:    &'a str,
    pub(crate) method:   &'a str,
    pub(crate) args:     &'a mut Vec<Value>,
    pub(crate) passed:   usize,
}

impl<'a> CallFrame<'a> {
    pub fn registry(&self) -> &TypeRegistry { self.registry }

    pub fn receiver(&self) -> &Receiver { self.receiver }

    pub fn method(&self) -> &str { self.method }

    pub fn owner(&self) -> &str { self.owner }

    /// The instance for instance calls; a `Type` error for static ones.
    pub fn this(&self) -> Result<&ObjectRef> {
        match self.receiver {
            Receiver::Instance(obj) => Ok(obj),
            Receiver::Type(name) => Err(DoubleError::Type(format!(
                "`{}::{}` has no instance in static context", name, self.method
            ))),
        }
    }

    /// Bound argument at `index`, or `Null` when out of range.
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or(Value::Null)
    }

    pub fn args(&self) -> &[Value] { self.args }

    /// Only the arguments the caller actually passed.
    pub fn passed_args(&self) -> &[Value] { &self.args[..self.passed] }

    pub fn passed_args_mut(&mut self) -> &mut [Value] { &mut self.args[..self.passed] }

    pub fn passed_count(&self) -> usize { self.passed }

    /// Arguments from `from` onwards, for variadic parameters.
    pub fn rest(&self, from: usize) -> Vec<Value> {
        self.args.iter().skip(from).cloned().collect()
    }

    /// Overwrite the argument slot at `index`. Visible to the caller for
    /// by-reference parameters.
    pub fn set_arg(&mut self, index: usize, value: impl Into<Value>) {
        if let Some(slot) = self.args.get_mut(index) {
            *slot = value.into();
        }
    }

    /// Call another method on the same receiver, bypassing visibility.
    pub fn call_self(&self, method: &str, mut args: Vec<Value>) -> Result<Value> {
        let type_name = self.receiver.type_name().to_string();
        self.registry.invoke_from(&type_name, self.receiver, method, &mut args, true)
    }

    /// Call the implementation of `method` found above the declaring type.
    pub fn call_parent(&self, method: &str, mut args: Vec<Value>) -> Result<Value> {
        let parent = self.registry.parent_of(self.owner).ok_or_else(|| {
            DoubleError::Lookup(format!("`{}` has no parent type", self.owner))
        })?;
        self.registry.invoke_from(&parent, self.receiver, method, &mut args, true)
    }

    /// Re-run the current call against the implementation visible from
    /// `from_type`, forwarding the passed arguments. By-reference writes made
    /// by that implementation land back in this frame.
    pub fn delegate(&mut self, from_type: &str) -> Result<Value> {
        let mut forwarded = self.passed_args().to_vec();
        let result = self.registry.invoke_from(from_type, self.receiver, self.method, &mut forwarded, true);
        for (slot, value) in self.args.iter_mut().zip(forwarded) {
            *slot = value;
        }
        result
    }
}
