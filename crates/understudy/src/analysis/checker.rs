//! Pass 3 — Method Planner
//!
//! Picks the methods the double generates, in order: extra methods, then
//! interface methods the base does not already satisfy, then abstract methods
//! of applied mixins, then base methods. Checks base/interface compatibility
//! and records why the rest are unreachable.

use std::collections::BTreeMap;

use crate::analysis::extractor::Extractor;
use crate::analysis::resolver::BasePlan;
use crate::analysis::{DoubleRequest, Exclusion, GeneratedMethod};
use crate::config::DoubleConfig;
use crate::error::{DoubleError, Result};
use crate::types::desc::{MethodSignature, Visibility};
use crate::types::registry::TypeRegistry;

pub struct MethodPlan {
    pub methods:  Vec<GeneratedMethod>,
    pub excluded: BTreeMap<String, Exclusion>,
}

pub struct MethodPlanner<'a> {
    types:     &'a TypeRegistry,
    extractor: &'a Extractor,
    config:    &'a DoubleConfig,
    methods:   Vec<GeneratedMethod>,
    excluded:  BTreeMap<String, Exclusion>,
}

impl<'a> MethodPlanner<'a> {
    pub fn new(types: &'a TypeRegistry, extractor: &'a Extractor, config: &'a DoubleConfig) -> Self {
        Self { types, extractor, config, methods: Vec::new(), excluded: BTreeMap::new() }
    }

    pub fn run(mut self, base: &BasePlan, request: &DoubleRequest) -> Result<MethodPlan> {
        let interface_methods = self.interface_methods(base)?;
        let mixin_methods = self.mixin_methods(base)?;

        // ── Extra methods ─────────────────────────────────────────────────────
        for extra in &request.extra_methods {
            let taken = base.base_methods.iter().any(|m| m.name == extra.name)
                || interface_methods.iter().any(|m| m.name == extra.name)
                || mixin_methods.iter().any(|m| m.name == extra.name);
            if taken {
                return Err(DoubleError::Conflict(format!(
                    "method `{}` already exists on `{}`", extra.name, base.original
                )));
            }
            if self.is_planned(&extra.name) {
                return Err(DoubleError::Conflict(format!("method `{}` is added twice", extra.name)));
            }
            self.methods.push(GeneratedMethod::Raw(extra.clone()));
        }

        // ── Interface methods ─────────────────────────────────────────────────
        for m in interface_methods {
            self.methods.push(GeneratedMethod::Signature(m));
        }

        // ── Abstract methods of applied mixins ────────────────────────────────
        for m in mixin_methods.into_iter().filter(|m| m.is_abstract) {
            if !self.is_planned(&m.name) && !base.base_methods.iter().any(|b| b.name == m.name) {
                self.methods.push(GeneratedMethod::Signature(m));
            }
        }

        // ── Base methods ──────────────────────────────────────────────────────
        for m in &base.base_methods {
            if self.is_planned(&m.name) {
                continue;
            }
            if m.visibility == Visibility::Private {
                self.excluded.insert(m.name.clone(), Exclusion::Private);
                continue;
            }
            if m.is_final {
                self.excluded.insert(m.name.clone(), Exclusion::Final);
                continue;
            }
            if m.visibility == Visibility::Protected && !self.config.allow_protected_methods {
                self.excluded.insert(m.name.clone(), Exclusion::Protected);
                // the double must still implement it to be instantiable
                if !m.is_abstract {
                    continue;
                }
            }
            let mut signature = m.clone();
            if signature.is_constructor() {
                signature.parameters.clear();
            }
            self.methods.push(GeneratedMethod::Signature(signature));
        }

        Ok(MethodPlan { methods: self.methods, excluded: self.excluded })
    }

    fn is_planned(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m.name() == name)
    }

    /// Interface methods the base does not provide, merged across interfaces.
    fn interface_methods(&self, base: &BasePlan) -> Result<Vec<MethodSignature>> {
        let mut out: Vec<MethodSignature> = Vec::new();
        for iface in &base.interfaces {
            let desc = self.extractor.extract(self.types, iface)?;
            for m in &desc.methods {
                if let Some(inherited) = base.base_methods.iter().find(|b| b.name == m.name) {
                    check_compatible(inherited, m)?;
                    continue;
                }
                if let Some(previous) = out.iter().find(|p| p.name == m.name) {
                    check_compatible(previous, m)?;
                    continue;
                }
                out.push(m.clone());
            }
        }
        Ok(out)
    }

    fn mixin_methods(&self, base: &BasePlan) -> Result<Vec<MethodSignature>> {
        let mut out: Vec<MethodSignature> = Vec::new();
        for mixin in &base.mixins {
            let desc = self.extractor.extract(self.types, mixin)?;
            for m in &desc.methods {
                if !out.iter().any(|p| p.name == m.name) {
                    out.push(m.clone());
                }
            }
        }
        Ok(out)
    }
}

/// `existing` can stand in for `required`: same staticness and return type,
/// and publicly callable.
pub fn is_compatible(existing: &MethodSignature, required: &MethodSignature) -> bool {
    existing.is_static == required.is_static
        && existing.visibility == Visibility::Public
        && existing.return_type == required.return_type
        && existing.nullable_return == required.nullable_return
}

fn check_compatible(existing: &MethodSignature, required: &MethodSignature) -> Result<()> {
    if is_compatible(existing, required) {
        return Ok(());
    }
    Err(DoubleError::IncompatibleSignature(format!(
        "`{}::{}` does not match `{}::{}`",
        existing.declaring_type, existing.name, required.declaring_type, required.name
    )))
}
