//! Pass 2 — Base Resolver
//!
//! Decides what the double is named, what it extends and which helper types
//! (final-stripped clones, mixin holders) must be loaded first.

use crate::analysis::extractor::{Extractor, TypeDescriptor};
use crate::analysis::{DoubleKind, DoubleRequest, NameGenerator};
use crate::config::DoubleConfig;
use crate::error::{DoubleError, Result};
use crate::runtime::value::Value;
use crate::types::desc::{
    normalize_type_name, split_type_name, MethodDef, MethodSignature, TypeDef, TypeKind,
};
use crate::types::registry::TypeRegistry;

/// Output of the base pass.
#[derive(Debug, Clone)]
pub struct BasePlan {
    pub original:       String,
    pub synthetic_name: String,
    pub short_name:     String,
    pub namespace:      Option<String>,
    pub base:           Option<String>,
    /// Resolved methods of `base`, intermediates included.
    pub base_methods:   Vec<MethodSignature>,
    pub interfaces:     Vec<String>,
    pub mixins:         Vec<String>,
    pub intermediates:  Vec<TypeDef>,
}

pub struct BaseResolver<'a> {
    types:     &'a TypeRegistry,
    extractor: &'a Extractor,
    names:     &'a NameGenerator,
}

impl<'a> BaseResolver<'a> {
    pub fn new(types: &'a TypeRegistry, extractor: &'a Extractor, names: &'a NameGenerator) -> Self {
        Self { types, extractor, names }
    }

    pub fn run(&self, request: &DoubleRequest) -> Result<BasePlan> {
        let original = normalize_type_name(&request.original);
        if original.is_empty() {
            return Err(DoubleError::InvalidArgument("original type name cannot be empty".into()));
        }
        let interfaces = self.check_refs(&request.interfaces, TypeKind::Interface)?;
        let mixins = self.check_refs(&request.mixins, TypeKind::Mixin)?;

        if request.kind == DoubleKind::Alias {
            return self.alias(original, request, interfaces, mixins);
        }

        let desc = self.extractor.extract(self.types, &original)?;
        let synthetic_name = match &request.name {
            Some(name) => {
                let name = normalize_type_name(name);
                if name.is_empty() {
                    return Err(DoubleError::InvalidArgument("double name cannot be empty".into()));
                }
                name
            }
            None => self.names.next(self.types, &original),
        };
        let (namespace, short_name) = split_type_name(&synthetic_name);

        let mut plan = BasePlan {
            original,
            synthetic_name,
            short_name,
            namespace,
            base: None,
            base_methods: Vec::new(),
            interfaces,
            mixins,
            intermediates: Vec::new(),
        };

        match desc.kind {
            TypeKind::Interface => {
                plan.interfaces.retain(|i| *i != desc.name);
                plan.interfaces.insert(0, desc.name.clone());
            }
            TypeKind::Mixin => self.mixin_base(&desc, &request.config, &mut plan)?,
            TypeKind::Class => self.class_base(&desc, &request.config, &mut plan)?,
        }
        Ok(plan)
    }

    fn check_refs(&self, names: &[String], kind: TypeKind) -> Result<Vec<String>> {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let def = self.types.require(name)?;
            if def.kind != kind {
                let expected = match kind {
                    TypeKind::Interface => "an interface",
                    TypeKind::Mixin => "a mixin",
                    TypeKind::Class => "a class",
                };
                return Err(DoubleError::InvalidArgument(format!("`{}` is not {expected}", def.name)));
            }
            if !out.contains(&def.name) {
                out.push(def.name.clone());
            }
        }
        Ok(out)
    }

    // ─── Alias ───────────────────────────────────────────────────────────────

    fn alias(
        &self,
        original: String,
        request: &DoubleRequest,
        interfaces: Vec<String>,
        mixins: Vec<String>,
    ) -> Result<BasePlan> {
        if self.types.contains(&original) {
            return Err(DoubleError::Conflict(format!(
                "cannot alias `{original}`: a type of that name is already loaded"
            )));
        }
        if !request.config.allow_non_existent_types {
            return Err(DoubleError::Config(format!(
                "`{original}` does not exist; enable `allow_non_existent_types` to alias it"
            )));
        }
        if request.name.is_some() {
            return Err(DoubleError::InvalidArgument(
                "alias doubles are always named after their original".into(),
            ));
        }
        let (namespace, short_name) = split_type_name(&original);
        Ok(BasePlan {
            synthetic_name: original.clone(),
            original,
            short_name,
            namespace,
            base: None,
            base_methods: Vec::new(),
            interfaces,
            mixins,
            intermediates: Vec::new(),
        })
    }

    // ─── Classes ─────────────────────────────────────────────────────────────

    fn class_base(&self, desc: &TypeDescriptor, config: &DoubleConfig, plan: &mut BasePlan) -> Result<()> {
        if desc.is_final && !config.allow_final_doubles {
            return Err(DoubleError::Config(format!(
                "class `{}` is final; enable `allow_final_doubles` to double it", desc.name
            )));
        }
        if desc.is_internal {
            if desc.is_final {
                return Err(DoubleError::UnsupportedType(format!(
                    "`{}` is a sealed final built-in and cannot be doubled", desc.name
                )));
            }
            plan.base = Some(desc.name.clone());
            plan.base_methods = desc.methods.clone();
            return Ok(());
        }
        if config.allow_final_doubles && desc.has_final_methods() {
            let chain = self.final_stripped_chain(&desc.name)?;
            let Some(bottom) = chain.last() else {
                return Err(DoubleError::Lookup(format!("type `{}` is not loaded", desc.name)));
            };
            plan.base_methods = self
                .types
                .methods_of_pending(bottom, &chain)?
                .into_iter()
                .map(|m| m.signature)
                .collect();
            plan.base = Some(bottom.name.clone());
            plan.intermediates.extend(chain);
        } else {
            plan.base = Some(desc.name.clone());
            plan.base_methods = desc.methods.clone();
        }
        Ok(())
    }

    /// Own final markers, or final methods brought in by the layer's mixins.
    fn layer_declares_final(&self, def: &TypeDef) -> Result<bool> {
        if def.declares_final() {
            return Ok(true);
        }
        for mixin in &def.mixins {
            if self.types.methods_of(mixin)?.iter().any(|m| m.signature.is_final) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// One non-final clone per layer, from the original up to and including
    /// the first layer that declares anything final. Each clone extends the
    /// clone of the layer above it, so `call_parent` walks the same layers it
    /// walks on the original. Bodies are shared; instances count as the layer
    /// they were cloned from.
    ///
    /// Returned in load order: topmost layer first, the original's clone last.
    fn final_stripped_chain(&self, original: &str) -> Result<Vec<TypeDef>> {
        let mut layers = Vec::new();
        let mut current = Some(original.to_string());
        while let Some(name) = current {
            let def = self.types.require(&name)?;
            let stop = self.layer_declares_final(&def)?;
            current = def.parent.clone();
            layers.push(def);
            if stop {
                break;
            }
        }

        let mut chain: Vec<TypeDef> = Vec::with_capacity(layers.len());
        for layer in layers.iter().rev() {
            let parent = match chain.last() {
                Some(above) => Some(above.name.clone()),
                None => layer.parent.clone(),
            };
            let clone = self.stripped_layer(layer, parent)?;
            chain.push(clone);
        }
        for i in 0..chain.len() {
            let has_abstract = self
                .types
                .methods_of_pending(&chain[i], &chain)?
                .iter()
                .any(|m| !m.is_concrete());
            chain[i].is_abstract |= has_abstract;
        }

        tracing::debug!(
            target: "understudy::analysis",
            original,
            clone = ?chain.last().map(|c| c.name.as_str()),
            layers = chain.len(),
            "final-stripped clone planned"
        );
        Ok(chain)
    }

    /// Non-final copy of one layer. Mixins carrying final methods are copied
    /// in so their markers can be dropped; the rest stay applied.
    fn stripped_layer(&self, layer: &TypeDef, parent: Option<String>) -> Result<TypeDef> {
        let mut clone = TypeDef::class(&self.names.next(self.types, &layer.name));
        clone.parent = parent;
        clone.stands_in_for = Some(layer.name.clone());
        clone.interfaces = layer.interfaces.clone();
        clone.is_abstract = layer.is_abstract;

        for m in &layer.methods {
            push_def(&mut clone.methods, m.clone());
        }
        let mut copied = Vec::new();
        for mixin in &layer.mixins {
            let methods = self.types.methods_of(mixin)?;
            if !methods.iter().any(|m| m.signature.is_final) {
                clone.mixins.push(mixin.clone());
                continue;
            }
            for m in methods {
                push_def(&mut clone.methods, MethodDef { signature: m.signature, body: m.body });
            }
            copied.push(mixin);
        }
        for m in clone.methods.iter_mut() {
            m.signature.is_final = false;
            m.signature.anchor_self_type(&layer.name);
        }

        for mixin in copied {
            self.collect_mixin_properties(mixin, &mut clone.properties);
        }
        for (name, value) in &layer.properties {
            set_property(&mut clone.properties, name, value.clone());
        }
        Ok(clone)
    }

    // ─── Mixins ──────────────────────────────────────────────────────────────

    /// A mixin cannot be extended; double a holder class that applies it.
    fn mixin_base(&self, desc: &TypeDescriptor, config: &DoubleConfig, plan: &mut BasePlan) -> Result<()> {
        let name = self.names.next(self.types, &desc.name);
        let mut holder = if config.allow_final_doubles && !desc.is_internal && desc.has_final_methods() {
            let mut holder = TypeDef::class(&name);
            for m in self.types.methods_of(&desc.name)? {
                let mut signature = m.signature;
                signature.is_final = false;
                holder.methods.push(MethodDef { signature, body: m.body });
            }
            self.collect_mixin_properties(&desc.name, &mut holder.properties);
            holder.stands_in_for = Some(desc.name.clone());
            holder
        } else {
            TypeDef::class(&name).uses(&desc.name)
        };
        holder.is_abstract = desc.has_abstract_methods();

        plan.base_methods = Extractor::describe(self.types, &holder)?.methods;
        plan.base = Some(name);
        plan.intermediates.push(holder);
        Ok(())
    }

    fn collect_mixin_properties(&self, mixin: &str, out: &mut Vec<(String, Value)>) {
        let Some(def) = self.types.get(mixin) else { return };
        for nested in &def.mixins {
            self.collect_mixin_properties(nested, out);
        }
        for (name, value) in &def.properties {
            set_property(out, name, value.clone());
        }
    }
}

fn push_def(methods: &mut Vec<MethodDef>, method: MethodDef) {
    match methods.iter_mut().find(|m| m.signature.name == method.signature.name) {
        Some(existing) if existing.body.is_none() && method.body.is_some() => *existing = method,
        Some(_) => {}
        None => methods.push(method),
    }
}

fn set_property(props: &mut Vec<(String, Value)>, name: &str, value: Value) {
    match props.iter_mut().find(|(n, _)| n == name) {
        Some(slot) => slot.1 = value,
        None => props.push((name.to_string(), value)),
    }
}
