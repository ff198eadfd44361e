//! Turns a `DoubleDefinition` into a loaded type whose generated methods all
//! forward to one `Dispatcher`.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::analysis::{DoubleDefinition, DoubleKind, GeneratedMethod};
use crate::error::{DoubleError, Result};
use crate::expect::Behavior;
use crate::runtime::dispatcher::Dispatcher;
use crate::runtime::frame::CallFrame;
use crate::types::desc::{MethodBody, MethodDef, MethodSignature, TypeDef};
use crate::types::registry::TypeRegistry;

pub struct Synthesizer<'a> {
    types: &'a TypeRegistry,
    clock: Rc<Cell<u64>>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(types: &'a TypeRegistry, clock: Rc<Cell<u64>>) -> Self {
        Self { types, clock }
    }

    pub fn synthesize(&self, definition: &DoubleDefinition) -> Result<Rc<Dispatcher>> {
        if self.types.contains(&definition.synthetic_name) {
            return Err(DoubleError::Conflict(format!(
                "cannot create double `{}`: the name is already taken", definition.synthetic_name
            )));
        }
        for intermediate in &definition.intermediates {
            self.types.load(intermediate.clone())?;
        }

        let blankets = definition
            .methods
            .iter()
            .map(|m| (m.name().to_string(), self.blanket(definition, m)))
            .collect::<HashMap<_, _>>();
        let dispatcher = Rc::new(Dispatcher::new(definition, blankets, self.clock.clone()));

        let mut double = TypeDef::class(&definition.synthetic_name);
        double.parent = definition.base.clone();
        double.interfaces = definition.interfaces.clone();
        double.mixins = definition.mixins.clone();
        for generated in &definition.methods {
            let target = Rc::clone(&dispatcher);
            let body: MethodBody = Rc::new(move |frame: &mut CallFrame<'_>| target.dispatch(frame));
            let mut signature = forwarding_signature(generated);
            if let Some(self_type) = self.self_type_of(definition, generated) {
                signature.anchor_self_type(&self_type);
            }
            double.methods.push(MethodDef { signature, body: Some(body) });
        }
        self.types.load(double)?;

        tracing::debug!(
            target: "understudy::synthesizer",
            name = %definition.synthetic_name,
            kind = %definition.kind,
            base = ?definition.base,
            methods = definition.methods.len(),
            intermediates = definition.intermediates.len(),
            "double synthesized"
        );
        Ok(dispatcher)
    }

    /// `Mock` only for mock doubles, and only where the base has a body to run.
    fn blanket(&self, definition: &DoubleDefinition, method: &GeneratedMethod) -> Behavior {
        let GeneratedMethod::Signature(signature) = method else { return Behavior::Dummy };
        if definition.kind != DoubleKind::Mock {
            return Behavior::Dummy;
        }
        let concrete = definition
            .base
            .as_deref()
            .and_then(|base| self.types.find_method(base, &signature.name))
            .is_some_and(|m| m.is_concrete());
        if concrete { Behavior::Mock } else { Behavior::Dummy }
    }

    /// Type a mirrored method's `self` hints meant where it was declared:
    /// the base type it resolves on, else its declaring type.
    fn self_type_of(&self, definition: &DoubleDefinition, method: &GeneratedMethod) -> Option<String> {
        let GeneratedMethod::Signature(signature) = method else { return None };
        let owner = definition
            .base
            .as_deref()
            .and_then(|base| self.types.find_method(base, &signature.name))
            .map(|m| m.owner);
        let self_type = owner.unwrap_or_else(|| signature.declaring_type.clone());
        let stand_in = self.types.get(&self_type).and_then(|d| d.stands_in_for.clone());
        Some(stand_in.unwrap_or(self_type))
    }
}

/// Same externally visible shape, never final or abstract.
fn forwarding_signature(method: &GeneratedMethod) -> MethodSignature {
    match method {
        GeneratedMethod::Signature(signature) => {
            let mut signature = signature.clone();
            signature.is_final = false;
            signature.is_abstract = false;
            signature
        }
        GeneratedMethod::Raw(raw) => {
            let mut signature = MethodSignature::new(raw.name.clone());
            signature.is_static = raw.is_static;
            signature
        }
    }
}
