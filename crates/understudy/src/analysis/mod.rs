pub mod extractor;
pub mod resolver;
pub mod checker;


use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;

use crate::config::DoubleConfig;
use crate::error::Result;
use crate::types::desc::{MethodSignature, TypeDef};
use crate::types::registry::TypeRegistry;
use checker::MethodPlanner;
use resolver::BaseResolver;
pub use extractor::{Extractor, TypeDescriptor};

// ─── Requests ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoubleKind {
    /// Unconfigured calls run the original method body.
    Mock,
    /// Unconfigured calls return `Null`.
    Dummy,
    /// Stand-in for a type that is not loaded; named after it.
    Alias,
}

impl DoubleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoubleKind::Mock  => "mock",
            DoubleKind::Dummy => "dummy",
            DoubleKind::Alias => "alias",
        }
    }
}

impl fmt::Display for DoubleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A method added to a double that no base or interface declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMethodSpec {
    pub name:      String,
    pub is_static: bool,
}

/// Everything the builder collected for one double.
#[derive(Debug, Clone)]
pub struct DoubleRequest {
    pub kind:          DoubleKind,
    pub original:      String,
    pub name:          Option<String>,
    pub interfaces:    Vec<String>,
    pub mixins:        Vec<String>,
    pub extra_methods: Vec<RawMethodSpec>,
    pub config:        DoubleConfig,
}

impl DoubleRequest {
    pub fn new(kind: DoubleKind, original: &str, config: DoubleConfig) -> Self {
        Self {
            kind,
            original: original.to_string(),
            name: None,
            interfaces: Vec::new(),
            mixins: Vec::new(),
            extra_methods: Vec::new(),
            config,
        }
    }
}

// ─── Plans ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedMethod {
    /// Mirrors a base, interface or mixin method.
    Signature(MethodSignature),
    Raw(RawMethodSpec),
}

impl GeneratedMethod {
    pub fn name(&self) -> &str {
        match self {
            GeneratedMethod::Signature(s) => &s.name,
            GeneratedMethod::Raw(r)       => &r.name,
        }
    }

    pub fn is_static(&self) -> bool {
        match self {
            GeneratedMethod::Signature(s) => s.is_static,
            GeneratedMethod::Raw(r)       => r.is_static,
        }
    }
}

/// Why a method of the original is not reachable through `DoubleType::method`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    Protected,
    Private,
    Final,
}

impl Exclusion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exclusion::Protected => "protected",
            Exclusion::Private   => "private",
            Exclusion::Final     => "final",
        }
    }
}

/// Resolved plan for one double, consumed by the synthesizer.
#[derive(Debug, Clone)]
pub struct DoubleDefinition {
    pub kind:           DoubleKind,
    pub original:       String,
    pub synthetic_name: String,
    pub short_name:     String,
    pub namespace:      Option<String>,
    pub base:           Option<String>,
    pub interfaces:     Vec<String>,
    pub mixins:         Vec<String>,
    /// No name appears twice.
    pub methods:        Vec<GeneratedMethod>,
    /// Loaded before the double, in order.
    pub intermediates:  Vec<TypeDef>,
    pub excluded:       BTreeMap<String, Exclusion>,
    pub config:         DoubleConfig,
}

impl DoubleDefinition {
    pub fn generated(&self, name: &str) -> Option<&GeneratedMethod> {
        self.methods.iter().find(|m| m.name() == name)
    }
}

// ─── Names ────────────────────────────────────────────────────────────────────

/// Hands out `Double_<n>_<Original>` names that are free in the registry.
#[derive(Debug, Default)]
pub struct NameGenerator {
    counter: Cell<u64>,
}

impl NameGenerator {
    pub fn next(&self, types: &TypeRegistry, original: &str) -> String {
        let stem = original.trim_matches('\\').replace('\\', "_");
        loop {
            let n = self.counter.get() + 1;
            self.counter.set(n);
            let name = format!("Double_{n}_{stem}");
            if !types.contains(&name) {
                return name;
            }
        }
    }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Full resolver pipeline:
/// 1. Extractor     — descriptor of the original (cached)
/// 2. BaseResolver  — name, base type and intermediates
/// 3. MethodPlanner — methods to generate and exclusions
pub fn resolve(
    types: &TypeRegistry,
    extractor: &Extractor,
    names: &NameGenerator,
    request: &DoubleRequest,
) -> Result<DoubleDefinition> {
    // ── Pass 1+2: base ────────────────────────────────────────────────────────
    let base = BaseResolver::new(types, extractor, names).run(request)?;

    // ── Pass 3: methods ───────────────────────────────────────────────────────
    let plan = MethodPlanner::new(types, extractor, &request.config).run(&base, request)?;

    Ok(DoubleDefinition {
        kind: request.kind,
        original: base.original,
        synthetic_name: base.synthetic_name,
        short_name: base.short_name,
        namespace: base.namespace,
        base: base.base,
        interfaces: base.interfaces,
        mixins: base.mixins,
        methods: plan.methods,
        intermediates: base.intermediates,
        excluded: plan.excluded,
        config: request.config,
    })
}
