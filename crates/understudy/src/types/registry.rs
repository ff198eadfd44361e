//! Type registry: the loaded-type namespace.
//!
//! Consumed by:
//!   • the extractor   — structural introspection (methods_of, ancestors, …)
//!   • the resolver    — existence / kind / final checks
//!   • callers & bodies — instantiate / call / call_static / instance_of
//!
//! A loaded type is immutable. Names stay taken for the registry's lifetime.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::error::{DoubleError, Result};
use crate::runtime::frame::{CallFrame, Receiver};
use crate::runtime::value::{ObjectRef, Value};
use crate::types::desc::{
    normalize_type_name, MethodBody, MethodSignature, TypeDef, TypeKind, Visibility, CONSTRUCTOR,
};

// ─── Resolved methods ─────────────────────────────────────────────────────────

/// A method as seen from a particular type after inheritance is applied.
#[derive(Clone)]
pub struct ResolvedMethod {
    /// Type whose body runs; `call_parent` inside the body starts above it.
    pub owner:     String,
    pub signature: MethodSignature,
    pub body:      Option<MethodBody>,
}

impl ResolvedMethod {
    pub fn is_concrete(&self) -> bool { self.body.is_some() }
}

impl fmt::Debug for ResolvedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedMethod")
            .field("owner", &self.owner)
            .field("signature", &self.signature)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

// ─── Registry ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct TypeRegistry {
    types: RefCell<HashMap<String, Rc<TypeDef>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and load a type definition.
    pub fn load(&self, mut def: TypeDef) -> Result<()> {
        def.name = normalize_type_name(&def.name);
        if def.name.is_empty() {
            return Err(DoubleError::InvalidArgument("type name cannot be empty".into()));
        }
        if self.contains(&def.name) {
            return Err(DoubleError::Conflict(format!("type `{}` is already loaded", def.name)));
        }

        let mut seen = HashSet::new();
        for m in def.methods.iter_mut() {
            if !seen.insert(m.signature.name.clone()) {
                return Err(DoubleError::Conflict(format!(
                    "method `{}::{}` is declared twice", def.name, m.signature.name
                )));
            }
            m.signature.declaring_type = def.name.clone();
            if m.body.is_none() {
                m.signature.is_abstract = true;
            }
        }

        self.check_references(&def)?;

        if let Some(parent) = &def.parent {
            for m in &def.methods {
                if let Some(inherited) = self.find_method(parent, &m.signature.name) {
                    if inherited.signature.is_final {
                        return Err(DoubleError::NotAllowed(format!(
                            "`{}::{}` cannot override final method `{}::{}`",
                            def.name, m.signature.name, inherited.owner, m.signature.name
                        )));
                    }
                }
            }
        }

        if def.kind == TypeKind::Class && !def.is_abstract {
            let methods = self.methods_of_def(&def)?;
            if let Some(m) = methods.iter().find(|m| !m.is_concrete()) {
                return Err(DoubleError::InvalidArgument(format!(
                    "class `{}` must be declared abstract: `{}` has no implementation",
                    def.name, m.signature.name
                )));
            }
        }

        tracing::debug!(
            target: "understudy::types",
            name = %def.name,
            kind = ?def.kind,
            methods = def.methods.len(),
            "type loaded"
        );
        self.types.borrow_mut().insert(def.name.clone(), Rc::new(def));
        Ok(())
    }

    fn check_references(&self, def: &TypeDef) -> Result<()> {
        match def.kind {
            TypeKind::Interface => {
                if def.parent.is_some() || !def.mixins.is_empty() {
                    return Err(DoubleError::InvalidArgument(format!(
                        "interface `{}` can only extend interfaces", def.name
                    )));
                }
                if let Some(m) = def.methods.iter().find(|m| m.body.is_some()) {
                    return Err(DoubleError::InvalidArgument(format!(
                        "interface method `{}::{}` cannot have a body", def.name, m.signature.name
                    )));
                }
            }
            TypeKind::Mixin => {
                if def.parent.is_some() || !def.interfaces.is_empty() {
                    return Err(DoubleError::InvalidArgument(format!(
                        "mixin `{}` cannot extend or implement types", def.name
                    )));
                }
            }
            TypeKind::Class => {}
        }

        if let Some(parent) = &def.parent {
            let p = self.require(parent)?;
            if p.kind != TypeKind::Class {
                return Err(DoubleError::InvalidArgument(format!(
                    "`{}` cannot extend `{}`: not a class", def.name, parent
                )));
            }
            if p.is_final {
                return Err(DoubleError::NotAllowed(format!(
                    "`{}` cannot extend final class `{}`", def.name, parent
                )));
            }
        }
        for iface in &def.interfaces {
            if self.require(iface)?.kind != TypeKind::Interface {
                return Err(DoubleError::InvalidArgument(format!(
                    "`{}` cannot implement `{}`: not an interface", def.name, iface
                )));
            }
        }
        for mixin in &def.mixins {
            if self.require(mixin)?.kind != TypeKind::Mixin {
                return Err(DoubleError::InvalidArgument(format!(
                    "`{}` cannot use `{}`: not a mixin", def.name, mixin
                )));
            }
        }
        Ok(())
    }

    // ── Lookup ────────────────────────────────────────────────────────────────

    pub fn contains(&self, name: &str) -> bool {
        self.types.borrow().contains_key(&normalize_type_name(name))
    }

    pub fn get(&self, name: &str) -> Option<Rc<TypeDef>> {
        self.types.borrow().get(&normalize_type_name(name)).cloned()
    }

    /// Like `get`, but a missing type is a `Lookup` error.
    pub fn require(&self, name: &str) -> Result<Rc<TypeDef>> {
        self.get(name)
            .ok_or_else(|| DoubleError::Lookup(format!("type `{}` is not loaded", normalize_type_name(name))))
    }

    pub fn kind_of(&self, name: &str) -> Option<TypeKind> {
        self.get(name).map(|d| d.kind)
    }

    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.types.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize { self.types.borrow().len() }

    pub fn is_empty(&self) -> bool { self.types.borrow().is_empty() }

    pub fn parent_of(&self, name: &str) -> Option<String> {
        self.get(name)?.parent.clone()
    }

    /// Parent chain, nearest first.
    pub fn ancestors(&self, name: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut current = self.parent_of(name);
        while let Some(p) = current {
            current = self.parent_of(&p);
            out.push(p);
        }
        out
    }

    /// Every interface implemented directly, through parents, or by extension.
    pub fn interfaces_of(&self, name: &str) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_interfaces(name, &mut out);
        out
    }

    fn collect_interfaces(&self, name: &str, out: &mut Vec<String>) {
        let Some(def) = self.get(name) else { return };
        for iface in &def.interfaces {
            if !out.contains(iface) {
                out.push(iface.clone());
            }
            self.collect_interfaces(iface, out);
        }
        if let Some(parent) = &def.parent {
            self.collect_interfaces(parent, out);
        }
    }

    /// Every mixin applied directly, through other mixins, or through parents.
    pub fn mixins_of(&self, name: &str) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_mixins(name, &mut out);
        out
    }

    fn collect_mixins(&self, name: &str, out: &mut Vec<String>) {
        let Some(def) = self.get(name) else { return };
        for mixin in &def.mixins {
            if !out.contains(mixin) {
                out.push(mixin.clone());
            }
            self.collect_mixins(mixin, out);
        }
        if let Some(parent) = &def.parent {
            self.collect_mixins(parent, out);
        }
    }

    // ── Method resolution ─────────────────────────────────────────────────────

    /// All methods visible on a loaded type, in resolution order:
    /// own → mixins → parent chain → interface declarations.
    pub fn methods_of(&self, name: &str) -> Result<Vec<ResolvedMethod>> {
        let def = self.require(name)?;
        self.methods_of_def(&def)
    }

    /// Same as `methods_of`, for a definition that is not loaded (yet).
    pub fn methods_of_def(&self, def: &TypeDef) -> Result<Vec<ResolvedMethod>> {
        self.methods_of_pending(def, &[])
    }

    /// Same as `methods_of_def`; parents found in `pending` are taken from
    /// there instead of the registry.
    pub fn methods_of_pending(&self, def: &TypeDef, pending: &[TypeDef]) -> Result<Vec<ResolvedMethod>> {
        let mut out = Vec::new();
        self.collect_methods(def, pending, &mut out)?;
        Ok(out)
    }

    fn collect_methods(&self, def: &TypeDef, pending: &[TypeDef], out: &mut Vec<ResolvedMethod>) -> Result<()> {
        for m in &def.methods {
            let mut signature = m.signature.clone();
            if signature.declaring_type.is_empty() {
                signature.declaring_type = def.name.clone();
            }
            if m.body.is_none() {
                signature.is_abstract = true;
            }
            push_method(out, ResolvedMethod { owner: def.name.clone(), signature, body: m.body.clone() });
        }
        for mixin in &def.mixins {
            let mixin_def = self.require(mixin)?;
            // Mixin methods become methods of the using type.
            let mut applied = Vec::new();
            self.collect_methods(&mixin_def, &[], &mut applied)?;
            for mut m in applied {
                m.owner = def.name.clone();
                push_method(out, m);
            }
        }
        if let Some(parent) = &def.parent {
            match pending.iter().find(|p| p.name == *parent) {
                Some(parent_def) => self.collect_methods(parent_def, pending, out)?,
                None => self.collect_methods(&*self.require(parent)?, pending, out)?,
            }
        }
        for iface in &def.interfaces {
            let iface_def = self.require(iface)?;
            self.collect_methods(&iface_def, &[], out)?;
        }
        Ok(())
    }

    pub fn find_method(&self, type_name: &str, method: &str) -> Option<ResolvedMethod> {
        self.methods_of(type_name).ok()?
            .into_iter()
            .find(|m| m.signature.name == method)
    }

    // ── Type relations ────────────────────────────────────────────────────────

    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        let sub = normalize_type_name(sub);
        let sup = normalize_type_name(sup);
        if sub == sup {
            return true;
        }
        let Some(def) = self.get(&sub) else { return false };
        def.parent.as_deref().is_some_and(|p| self.is_subtype(p, &sup))
            || def.interfaces.iter().any(|i| self.is_subtype(i, &sup))
            || def.mixins.iter().any(|m| self.is_subtype(m, &sup))
            || def.stands_in_for.as_deref().is_some_and(|o| self.is_subtype(o, &sup))
    }

    /// Whether `value` can be passed where `type_name` is expected.
    pub fn instance_of(&self, value: &Value, type_name: &str) -> bool {
        match value {
            Value::Object(obj) => self.is_subtype(obj.class(), type_name),
            _ => false,
        }
    }

    pub fn uses_mixin(&self, value: &Value, mixin: &str) -> bool {
        let mixin = normalize_type_name(mixin);
        match value {
            Value::Object(obj) => self.mixins_of(obj.class()).contains(&mixin),
            _ => false,
        }
    }

    // ── Instances ─────────────────────────────────────────────────────────────

    /// Create an instance and run its constructor with `args`.
    pub fn instantiate(&self, type_name: &str, mut args: Vec<Value>) -> Result<Value> {
        let def = self.require(type_name)?;
        match def.kind {
            TypeKind::Class => {}
            TypeKind::Interface => {
                return Err(DoubleError::NotAllowed(format!("cannot instantiate interface `{}`", def.name)));
            }
            TypeKind::Mixin => {
                return Err(DoubleError::NotAllowed(format!("cannot instantiate mixin `{}`", def.name)));
            }
        }
        if def.is_abstract {
            return Err(DoubleError::NotAllowed(format!("cannot instantiate abstract class `{}`", def.name)));
        }

        let mut props = BTreeMap::new();
        self.collect_properties(&def, &mut props);
        let obj = ObjectRef::new(def.name.clone(), props);
        let receiver = Receiver::Instance(obj.clone());

        if self.find_method(&def.name, CONSTRUCTOR).is_some() {
            self.invoke_from(&def.name, &receiver, CONSTRUCTOR, &mut args, false)?;
        }
        Ok(Value::Object(obj))
    }

    fn collect_properties(&self, def: &TypeDef, out: &mut BTreeMap<String, Value>) {
        if let Some(parent) = def.parent.as_deref().and_then(|p| self.get(p)) {
            self.collect_properties(&parent, out);
        }
        for mixin in def.mixins.iter().filter_map(|m| self.get(m)) {
            self.collect_properties(&mixin, out);
        }
        for (name, default) in &def.properties {
            out.insert(name.clone(), default.clone());
        }
    }

    // ── Calls ─────────────────────────────────────────────────────────────────

    /// Call `method` on an instance (`Value::Object`) or a type (`Value::Class`).
    pub fn call(&self, target: &Value, method: &str, mut args: Vec<Value>) -> Result<Value> {
        self.call_with(target, method, &mut args)
    }

    /// Like `call`; by-reference parameters write back into `args`.
    pub fn call_with(&self, target: &Value, method: &str, args: &mut Vec<Value>) -> Result<Value> {
        let receiver = match target {
            Value::Object(obj) => Receiver::Instance(obj.clone()),
            Value::Class(name) => Receiver::Type(normalize_type_name(name)),
            other => {
                return Err(DoubleError::Type(format!(
                    "call to `{method}()` on {}", other.type_name()
                )));
            }
        };
        let type_name = receiver.type_name().to_string();
        self.invoke_from(&type_name, &receiver, method, args, false)
    }

    pub fn call_static(&self, type_name: &str, method: &str, mut args: Vec<Value>) -> Result<Value> {
        let receiver = Receiver::Type(normalize_type_name(type_name));
        let type_name = receiver.type_name().to_string();
        self.invoke_from(&type_name, &receiver, method, &mut args, false)
    }

    /// Resolve `method` starting at `from_type` and invoke it on `receiver`.
    /// `internal` calls may reach protected and private methods.
    pub(crate) fn invoke_from(
        &self,
        from_type: &str,
        receiver: &Receiver,
        method: &str,
        args: &mut Vec<Value>,
        internal: bool,
    ) -> Result<Value> {
        let resolved = self.find_method(from_type, method).ok_or_else(|| {
            DoubleError::Lookup(format!("call to undefined method `{}::{}()`", from_type, method))
        })?;
        if !internal && resolved.signature.visibility != Visibility::Public {
            return Err(DoubleError::NotAllowed(format!(
                "call to {} method `{}::{}()` from outside",
                resolved.signature.visibility.as_str(), resolved.owner, method
            )));
        }
        let receiver = match (receiver, resolved.signature.is_static) {
            (Receiver::Instance(obj), true) => Receiver::Type(obj.class().to_string()),
            (Receiver::Type(name), false) => {
                return Err(DoubleError::Type(format!(
                    "non-static method `{}::{}()` cannot be called statically (through `{}`)",
                    resolved.owner, method, name
                )));
            }
            (r, _) => r.clone(),
        };
        self.invoke(&resolved, &receiver, args)
    }

    /// Bind `args` against the signature, run the body, write back by-ref slots.
    fn invoke(&self, resolved: &ResolvedMethod, receiver: &Receiver, args: &mut Vec<Value>) -> Result<Value> {
        let sig = &resolved.signature;
        let passed = args.len();

        let required = sig.required_params();
        if passed < required {
            return Err(DoubleError::Type(format!(
                "too few arguments to `{}::{}()`: {} passed, at least {} expected",
                resolved.owner, sig.name, passed, required
            )));
        }
        // Clones resolve `self` to the type they stand in for.
        let self_type = self
            .get(&resolved.owner)
            .and_then(|d| d.stands_in_for.clone())
            .unwrap_or_else(|| resolved.owner.clone());
        for (i, value) in args.iter().enumerate() {
            let Some(param) = sig.param_at(i) else { continue };
            let Some(hint) = &param.declared_type else { continue };
            if value.is_null() && param.accepts_null() {
                continue;
            }
            if !hint.accepts(value, self, &self_type) {
                return Err(DoubleError::Type(format!(
                    "argument #{} (${}) of `{}::{}()` must be of type {}, {} given",
                    i + 1, param.name, resolved.owner, sig.name, hint, value.type_name()
                )));
            }
        }

        let body = resolved.body.clone().ok_or_else(|| {
            DoubleError::NotAllowed(format!("cannot call abstract method `{}::{}()`", resolved.owner, sig.name))
        })?;

        let mut bound = args.clone();
        for param in sig.parameters.iter().skip(passed) {
            if param.is_variadic {
                break;
            }
            bound.push(if param.has_default { param.default_value.clone() } else { Value::Null });
        }

        let result = {
            let mut frame = CallFrame {
                registry: self,
                receiver,
                owner: &resolved.owner,
                method: &sig.name,
                args: &mut bound,
                passed,
            };
            body(&mut frame)
        };

        for (i, slot) in args.iter_mut().enumerate() {
            if sig.param_at(i).is_some_and(|p| p.is_by_reference) {
                *slot = bound[i].clone();
            }
        }
        result
    }
}

/// Keep the first method of each name, unless it is abstract and a later
/// one has a body.
fn push_method(out: &mut Vec<ResolvedMethod>, method: ResolvedMethod) {
    match out.iter_mut().find(|m| m.signature.name == method.signature.name) {
        Some(existing) if !existing.is_concrete() && method.is_concrete() => *existing = method,
        Some(_) => {}
        None => out.push(method),
    }
}
