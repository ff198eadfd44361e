//! Type and method definitions, as loaded into the `TypeRegistry`.
//!
//! Production types that tests want to double are declared with the builders
//! below; synthesized doubles and their intermediates are plain `TypeDef`s too.

use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::runtime::frame::CallFrame;
use crate::runtime::value::Value;
use crate::types::registry::TypeRegistry;

/// Runtime implementation of a method.
pub type MethodBody = Rc<dyn Fn(&mut CallFrame<'_>) -> Result<Value>>;

// ─── Classification ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    /// Reusable method bundle applied to classes (trait-equivalent).
    Mixin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public    => "public",
            Self::Protected => "protected",
            Self::Private   => "private",
        }
    }
}

/// Declared parameter or return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeHint {
    Bool,
    Int,
    Float,
    String,
    Array,
    Iterable,
    Object,
    Mixed,
    /// The type declaring the method.
    SelfType,
    Named(String),
}

impl TypeHint {
    pub fn named(name: &str) -> Self {
        TypeHint::Named(normalize_type_name(name))
    }

    /// Runtime check. `self_type` is the type `SelfType` refers to.
    pub fn accepts(&self, value: &Value, registry: &TypeRegistry, self_type: &str) -> bool {
        match self {
            TypeHint::Mixed    => true,
            TypeHint::Bool     => matches!(value, Value::Bool(_)),
            TypeHint::Int      => matches!(value, Value::Int(_)),
            TypeHint::Float    => matches!(value, Value::Float(_) | Value::Int(_)),
            TypeHint::String   => matches!(value, Value::Str(_)),
            TypeHint::Array
            | TypeHint::Iterable => matches!(value, Value::List(_)),
            TypeHint::Object   => matches!(value, Value::Object(_)),
            TypeHint::SelfType => registry.instance_of(value, self_type),
            TypeHint::Named(n) => registry.instance_of(value, n),
        }
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeHint::Bool     => f.write_str("bool"),
            TypeHint::Int      => f.write_str("int"),
            TypeHint::Float    => f.write_str("float"),
            TypeHint::String   => f.write_str("string"),
            TypeHint::Array    => f.write_str("array"),
            TypeHint::Iterable => f.write_str("iterable"),
            TypeHint::Object   => f.write_str("object"),
            TypeHint::Mixed    => f.write_str("mixed"),
            TypeHint::SelfType => f.write_str("self"),
            TypeHint::Named(n) => f.write_str(n),
        }
    }
}

/// Strip the leading/trailing namespace separators: `\App\Foo\` → `App\Foo`.
pub fn normalize_type_name(name: &str) -> String {
    name.trim().trim_matches('\\').to_string()
}

/// Split a qualified name into `(namespace, short_name)`.
pub fn split_type_name(name: &str) -> (Option<String>, String) {
    let name = normalize_type_name(name);
    match name.rsplit_once('\\') {
        Some((ns, short)) => (Some(ns.to_string()), short.to_string()),
        None => (None, name),
    }
}

// ─── Signatures ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name:          String,
    pub declared_type: Option<TypeHint>,
    pub has_default:   bool,
    pub default_value: Value,
    pub is_variadic:   bool,
    pub is_by_reference: bool,
    pub is_nullable:   bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            has_default: false,
            default_value: Value::Null,
            is_variadic: false,
            is_by_reference: false,
            is_nullable: false,
        }
    }

    pub fn typed(mut self, hint: TypeHint) -> Self {
        self.declared_type = Some(hint);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.has_default = true;
        self.default_value = value.into();
        self
    }

    pub fn variadic(mut self) -> Self {
        self.is_variadic = true;
        self
    }

    pub fn by_ref(mut self) -> Self {
        self.is_by_reference = true;
        self
    }

    pub fn is_optional(&self) -> bool {
        self.has_default || self.is_variadic
    }

    /// Null passes the type check for nullable params and params defaulting to null.
    pub fn accepts_null(&self) -> bool {
        self.is_nullable || (self.has_default && self.default_value.is_null())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub name:            String,
    /// Type the method was declared on. Filled in when the type is loaded.
    pub declaring_type:  String,
    pub visibility:      Visibility,
    pub is_static:       bool,
    pub is_final:        bool,
    pub is_abstract:     bool,
    pub return_type:     Option<TypeHint>,
    pub nullable_return: bool,
    pub parameters:      Vec<Parameter>,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declaring_type: String::new(),
            visibility: Visibility::Public,
            is_static: false,
            is_final: false,
            is_abstract: false,
            return_type: None,
            nullable_return: false,
            parameters: Vec::new(),
        }
    }

    pub fn required_params(&self) -> usize {
        self.parameters.iter().filter(|p| !p.is_optional()).count()
    }

    /// Parameter bound to the argument at `index`; variadics absorb the tail.
    pub fn param_at(&self, index: usize) -> Option<&Parameter> {
        self.parameters.get(index).or_else(|| {
            self.parameters.last().filter(|p| p.is_variadic)
        })
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR
    }

    /// Replace `self` hints with the concrete type they refer to, so the
    /// signature keeps its meaning once copied onto another type.
    pub fn anchor_self_type(&mut self, self_type: &str) {
        let anchored = TypeHint::named(self_type);
        for param in self.parameters.iter_mut() {
            if param.declared_type == Some(TypeHint::SelfType) {
                param.declared_type = Some(anchored.clone());
            }
        }
        if self.return_type == Some(TypeHint::SelfType) {
            self.return_type = Some(anchored);
        }
    }
}

/// Name of the method `instantiate` runs on new instances.
pub const CONSTRUCTOR: &str = "__construct";

// ─── Method definitions ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MethodDef {
    pub signature: MethodSignature,
    /// `None` for abstract and interface methods.
    pub body:      Option<MethodBody>,
}

impl MethodDef {
    pub fn public(name: impl Into<String>) -> Self {
        Self { signature: MethodSignature::new(name), body: None }
    }

    pub fn protected(name: impl Into<String>) -> Self {
        let mut m = Self::public(name);
        m.signature.visibility = Visibility::Protected;
        m
    }

    pub fn private(name: impl Into<String>) -> Self {
        let mut m = Self::public(name);
        m.signature.visibility = Visibility::Private;
        m
    }

    pub fn static_(mut self) -> Self {
        self.signature.is_static = true;
        self
    }

    pub fn final_(mut self) -> Self {
        self.signature.is_final = true;
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.signature.is_abstract = true;
        self.body = None;
        self
    }

    pub fn param(mut self, param: Parameter) -> Self {
        self.signature.parameters.push(param);
        self
    }

    pub fn returns(mut self, hint: TypeHint) -> Self {
        self.signature.return_type = Some(hint);
        self
    }

    pub fn returns_nullable(mut self, hint: TypeHint) -> Self {
        self.signature.return_type = Some(hint);
        self.signature.nullable_return = true;
        self
    }

    pub fn body<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut CallFrame<'_>) -> Result<Value> + 'static,
    {
        self.body = Some(Rc::new(f));
        self.signature.is_abstract = false;
        self
    }

    /// Shorthand for a body that ignores its arguments and returns `value`.
    pub fn returning(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.body(move |_| Ok(value.clone()))
    }

    pub fn name(&self) -> &str { &self.signature.name }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("signature", &self.signature)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

// ─── Type definitions ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name:        String,
    pub kind:        TypeKind,
    pub is_final:    bool,
    pub is_abstract: bool,
    /// Sealed built-in: cannot be cloned or rewritten.
    pub is_internal: bool,
    pub parent:      Option<String>,
    /// Implemented interfaces; for an interface, the interfaces it extends.
    pub interfaces:  Vec<String>,
    pub mixins:      Vec<String>,
    pub properties:  Vec<(String, Value)>,
    pub methods:     Vec<MethodDef>,
    /// Set on final-stripped clones: instances also count as this type.
    pub stands_in_for: Option<String>,
}

impl TypeDef {
    fn new(name: &str, kind: TypeKind) -> Self {
        Self {
            name: normalize_type_name(name),
            kind,
            is_final: false,
            is_abstract: false,
            is_internal: false,
            parent: None,
            interfaces: Vec::new(),
            mixins: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            stands_in_for: None,
        }
    }

    pub fn class(name: &str) -> Self { Self::new(name, TypeKind::Class) }

    pub fn interface(name: &str) -> Self { Self::new(name, TypeKind::Interface) }

    pub fn mixin(name: &str) -> Self { Self::new(name, TypeKind::Mixin) }

    pub fn final_(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn internal(mut self) -> Self {
        self.is_internal = true;
        self
    }

    pub fn extends(mut self, parent: &str) -> Self {
        self.parent = Some(normalize_type_name(parent));
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(normalize_type_name(interface));
        self
    }

    pub fn uses(mut self, mixin: &str) -> Self {
        self.mixins.push(normalize_type_name(mixin));
        self
    }

    pub fn property(mut self, name: &str, default: impl Into<Value>) -> Self {
        self.properties.push((name.to_string(), default.into()));
        self
    }

    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    pub fn own_method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.signature.name == name)
    }

    /// Final class or any own final method.
    pub fn declares_final(&self) -> bool {
        self.is_final || self.methods.iter().any(|m| m.signature.is_final)
    }
}
