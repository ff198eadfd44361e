use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Dynamic value passed to and returned from every method in the type universe.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Rc<RefCell<Vec<Value>>>),
    Object(ObjectRef),
    /// A type used as a value: the receiver of a static call.
    Class(String),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    pub fn as_bool(&self) -> Option<bool> {
        match self { Value::Bool(b) => Some(*b), _ => None }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self { Value::Int(i) => Some(*i), _ => None }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(i)   => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self { Value::Str(s) => Some(s), _ => None }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self { Value::Object(o) => Some(o), _ => None }
    }

    /// Snapshot of a list's items. `None` for non-lists.
    pub fn items(&self) -> Option<Vec<Value>> {
        match self { Value::List(items) => Some(items.borrow().clone()), _ => None }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Value::Null      => "null",
            Value::Bool(_)   => "bool",
            Value::Int(_)    => "int",
            Value::Float(_)  => "float",
            Value::Str(_)    => "string",
            Value::List(_)   => "array",
            Value::Object(o) => o.class(),
            Value::Class(_)  => "class",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null)           => true,
            (Value::Bool(a), Value::Bool(b))     => a == b,
            (Value::Int(a), Value::Int(b))       => a == b,
            (Value::Float(a), Value::Float(b))   => a == b,
            (Value::Int(a), Value::Float(b))
            | (Value::Float(b), Value::Int(a))   => (*a as f64) == *b,
            (Value::Str(a), Value::Str(b))       => a == b,
            (Value::List(a), Value::List(b))     => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Class(a), Value::Class(b))   => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null      => f.write_str("null"),
            Value::Bool(b)   => write!(f, "{b}"),
            Value::Int(i)    => write!(f, "{i}"),
            Value::Float(x)  => write!(f, "{x}"),
            Value::Str(s)    => write!(f, "'{s}'"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(o) => write!(f, "{} object", o.class()),
            Value::Class(c)  => write!(f, "class {c}"),
        }
    }
}

impl From<()> for Value { fn from(_: ()) -> Self { Value::Null } }
impl From<bool> for Value { fn from(b: bool) -> Self { Value::Bool(b) } }
impl From<i64> for Value { fn from(i: i64) -> Self { Value::Int(i) } }
impl From<i32> for Value { fn from(i: i32) -> Self { Value::Int(i64::from(i)) } }
impl From<f64> for Value { fn from(x: f64) -> Self { Value::Float(x) } }
impl From<&str> for Value { fn from(s: &str) -> Self { Value::Str(s.to_string()) } }
impl From<String> for Value { fn from(s: String) -> Self { Value::Str(s) } }
impl From<ObjectRef> for Value { fn from(o: ObjectRef) -> Self { Value::Object(o) } }

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ─── Objects ──────────────────────────────────────────────────────────────────

/// Shared handle to an instance. Cloning aliases the same instance.
#[derive(Clone)]
pub struct ObjectRef(Rc<ObjectData>);

struct ObjectData {
    class: String,
    props: RefCell<BTreeMap<String, Value>>,
}

impl ObjectRef {
    pub fn new(class: impl Into<String>, props: BTreeMap<String, Value>) -> Self {
        ObjectRef(Rc::new(ObjectData { class: class.into(), props: RefCell::new(props) }))
    }

    pub fn class(&self) -> &str { &self.0.class }

    pub fn get(&self, prop: &str) -> Option<Value> {
        self.0.props.borrow().get(prop).cloned()
    }

    pub fn set(&self, prop: &str, value: impl Into<Value>) {
        self.0.props.borrow_mut().insert(prop.to_string(), value.into());
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.0.class == other.0.class && *self.0.props.borrow() == *other.0.props.borrow())
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.0.class)
            .field("props", &self.0.props.borrow())
            .finish()
    }
}
