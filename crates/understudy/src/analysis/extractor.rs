//! Pass 1 — Extractor
//!
//! Snapshots the structure of a type: modifiers, ancestry and the resolved
//! method list. Snapshots of loaded types are cached; loaded types never
//! change, so a cached snapshot stays valid for the registry's lifetime.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::Result;
use crate::types::desc::{normalize_type_name, split_type_name, MethodSignature, TypeDef, TypeKind};
use crate::types::registry::TypeRegistry;

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub name:        String,
    pub kind:        TypeKind,
    pub is_final:    bool,
    pub is_abstract: bool,
    pub is_internal: bool,
    pub parent:      Option<String>,
    /// Parent chain, nearest first.
    pub ancestors:   Vec<String>,
    /// Every implemented interface, transitively.
    pub interfaces:  Vec<String>,
    /// Every applied mixin, transitively.
    pub mixins:      Vec<String>,
    /// Own → mixin → inherited → interface-declared; one entry per name.
    pub methods:     Vec<MethodSignature>,
}

impl TypeDescriptor {
    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.method(name).is_some()
    }

    /// Final type, or any final method anywhere in its resolved surface.
    pub fn has_final_methods(&self) -> bool {
        self.is_final || self.methods.iter().any(|m| m.is_final)
    }

    pub fn has_abstract_methods(&self) -> bool {
        self.methods.iter().any(|m| m.is_abstract)
    }

    pub fn short_name(&self) -> String {
        split_type_name(&self.name).1
    }

    pub fn namespace(&self) -> Option<String> {
        split_type_name(&self.name).0
    }
}

#[derive(Default)]
pub struct Extractor {
    cache: RefCell<HashMap<String, Rc<TypeDescriptor>>>,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptor of a loaded type. `Lookup` error when it is not loaded.
    pub fn extract(&self, types: &TypeRegistry, name: &str) -> Result<Rc<TypeDescriptor>> {
        let name = normalize_type_name(name);
        if let Some(hit) = self.cache.borrow().get(&name) {
            return Ok(hit.clone());
        }
        let def = types.require(&name)?;
        let desc = Rc::new(Self::describe(types, &def)?);
        tracing::trace!(target: "understudy::analysis", name = %name, methods = desc.methods.len(), "type extracted");
        self.cache.borrow_mut().insert(name, desc.clone());
        Ok(desc)
    }

    /// Descriptor of any definition, loaded or not. Every type it refers to
    /// must be loaded. Never cached.
    pub fn describe(types: &TypeRegistry, def: &TypeDef) -> Result<TypeDescriptor> {
        let methods = types
            .methods_of_def(def)?
            .into_iter()
            .map(|m| m.signature)
            .collect();

        let ancestors = match &def.parent {
            Some(parent) => {
                let mut chain = vec![parent.clone()];
                chain.extend(types.ancestors(parent));
                chain
            }
            None => Vec::new(),
        };

        let mut interfaces = Vec::new();
        for iface in &def.interfaces {
            push_unique(&mut interfaces, iface.clone());
            for inherited in types.interfaces_of(iface) {
                push_unique(&mut interfaces, inherited);
            }
        }
        let mut mixins = Vec::new();
        for mixin in &def.mixins {
            push_unique(&mut mixins, mixin.clone());
            for nested in types.mixins_of(mixin) {
                push_unique(&mut mixins, nested);
            }
        }
        if let Some(parent) = &def.parent {
            for iface in types.interfaces_of(parent) {
                push_unique(&mut interfaces, iface);
            }
            for mixin in types.mixins_of(parent) {
                push_unique(&mut mixins, mixin);
            }
        }

        Ok(TypeDescriptor {
            name: normalize_type_name(&def.name),
            kind: def.kind,
            is_final: def.is_final,
            is_abstract: def.is_abstract,
            is_internal: def.is_internal,
            parent: def.parent.clone(),
            ancestors,
            interfaces,
            mixins,
            methods,
        })
    }

    pub fn cached(&self) -> usize {
        self.cache.borrow().len()
    }
}

fn push_unique(list: &mut Vec<String>, name: String) {
    if !list.contains(&name) {
        list.push(name);
    }
}
