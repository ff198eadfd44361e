//! Double session: every double and instance created during one test, plus
//! the verification pass that runs when the test ends.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::analysis::{self, DoubleDefinition, DoubleKind, DoubleRequest, Extractor, NameGenerator, TypeDescriptor};
use crate::builder::DoubleBuilder;
use crate::config::{ConfigOption, DoubleConfig};
use crate::error::{AssertionFailure, DoubleError, Result, VerificationReport};
use crate::expect::{Expectation, ExpectationRegistry};
use crate::runtime::call_log::CallLog;
use crate::runtime::dispatcher::Dispatcher;
use crate::runtime::synthesizer::Synthesizer;
use crate::runtime::value::{ObjectRef, Value};
use crate::syntax;
use crate::types::desc::TypeDef;
use crate::types::registry::TypeRegistry;

// ─── Session ──────────────────────────────────────────────────────────────────

pub struct DoubleSession {
    types:     Rc<TypeRegistry>,
    extractor: Extractor,
    names:     NameGenerator,
    config:    Cell<DoubleConfig>,
    doubles:   RefCell<Vec<DoubleType>>,
    instances: RefCell<Vec<DoubleInstance>>,
    clock:     Rc<Cell<u64>>,
}

impl Default for DoubleSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DoubleSession {
    pub fn new() -> Self {
        Self::with_types(Rc::new(TypeRegistry::new()))
    }

    /// Session over an existing registry, e.g. one shared by several tests.
    pub fn with_types(types: Rc<TypeRegistry>) -> Self {
        Self {
            types,
            extractor: Extractor::new(),
            names: NameGenerator::default(),
            config: Cell::new(DoubleConfig::default()),
            doubles: RefCell::new(Vec::new()),
            instances: RefCell::new(Vec::new()),
            clock: Rc::new(Cell::new(0)),
        }
    }

    pub fn types(&self) -> &Rc<TypeRegistry> { &self.types }

    /// Load a production type so it can be doubled.
    pub fn declare(&self, def: TypeDef) -> Result<()> {
        self.types.load(def)
    }

    pub fn describe(&self, name: &str) -> Result<Rc<TypeDescriptor>> {
        self.extractor.extract(&self.types, name)
    }

    // ── Configuration ─────────────────────────────────────────────────────────

    pub fn config(&self) -> DoubleConfig { self.config.get() }

    pub fn set_config(&self, config: DoubleConfig) {
        self.config.set(config);
    }

    pub fn configure(&self, option: ConfigOption, value: bool) {
        let mut config = self.config.get();
        config.set(option, value);
        self.config.set(config);
    }

    pub fn configure_key(&self, key: &str, value: bool) -> Result<()> {
        self.configure(key.parse()?, value);
        Ok(())
    }

    // ── Construction ──────────────────────────────────────────────────────────

    pub fn build(&self, kind: DoubleKind, original: &str) -> DoubleBuilder<'_> {
        DoubleBuilder::new(self, DoubleRequest::new(kind, original, self.config()))
    }

    pub fn mock(&self, original: &str) -> DoubleBuilder<'_> {
        self.build(DoubleKind::Mock, original)
    }

    pub fn dummy(&self, original: &str) -> DoubleBuilder<'_> {
        self.build(DoubleKind::Dummy, original)
    }

    pub fn alias(&self, original: &str) -> DoubleBuilder<'_> {
        self.build(DoubleKind::Alias, original)
    }

    /// Builder from a target string: `"[Name:]Original[method, static:method]"`.
    pub fn build_from(&self, kind: DoubleKind, target: &str) -> Result<DoubleBuilder<'_>> {
        let target = syntax::parse_target(target)?;
        let mut request = DoubleRequest::new(kind, &target.original, self.config());
        request.name = target.name;
        request.extra_methods = target.methods;
        Ok(DoubleBuilder::new(self, request))
    }

    pub(crate) fn create(&self, request: &DoubleRequest) -> Result<DoubleType> {
        let definition = analysis::resolve(&self.types, &self.extractor, &self.names, request)?;
        let dispatcher = Synthesizer::new(&self.types, self.clock.clone()).synthesize(&definition)?;
        let double = DoubleType {
            types: self.types.clone(),
            definition: Rc::new(definition),
            dispatcher,
        };
        self.doubles.borrow_mut().push(double.clone());
        Ok(double)
    }

    pub(crate) fn track(&self, instance: &DoubleInstance) {
        self.instances.borrow_mut().push(instance.clone());
    }

    // ── Inspection ────────────────────────────────────────────────────────────

    /// Doubles created since the last teardown.
    pub fn doubles(&self) -> Vec<DoubleType> {
        self.doubles.borrow().clone()
    }

    pub fn double(&self, name: &str) -> Option<DoubleType> {
        let name = name.trim_matches('\\');
        self.doubles.borrow().iter().find(|d| d.name() == name).cloned()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.borrow().len()
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Every failure pending on the session's doubles, without resetting them.
    pub fn verify(&self) -> Vec<AssertionFailure> {
        self.doubles().iter().flat_map(DoubleType::verify).collect()
    }

    /// Verify every double, then reset them and forget them. Loaded types stay
    /// loaded, so their names remain taken.
    pub fn teardown(&self) -> Result<(), VerificationReport> {
        let doubles = self.doubles.take();
        let failures: Vec<_> = doubles.iter().flat_map(DoubleType::verify).collect();
        for double in &doubles {
            double.dispatcher.reset();
        }
        self.instances.borrow_mut().clear();

        tracing::debug!(
            target: "understudy::session",
            doubles = doubles.len(),
            failures = failures.len(),
            "session torn down"
        );
        if failures.is_empty() {
            Ok(())
        } else {
            Err(VerificationReport { failures })
        }
    }
}

// ─── Double types ─────────────────────────────────────────────────────────────

/// Handle to a synthesized double type.
#[derive(Clone)]
pub struct DoubleType {
    types:      Rc<TypeRegistry>,
    definition: Rc<DoubleDefinition>,
    dispatcher: Rc<Dispatcher>,
}

impl DoubleType {
    pub fn name(&self) -> &str { &self.definition.synthetic_name }

    pub fn kind(&self) -> DoubleKind { self.definition.kind }

    pub fn definition(&self) -> &DoubleDefinition { &self.definition }

    /// The type as a value, for static calls through the registry.
    pub fn as_value(&self) -> Value {
        Value::Class(self.name().to_string())
    }

    /// Expectation for one generated method.
    pub fn method(&self, name: &str) -> Result<Expectation> {
        if let Some(exclusion) = self.definition.excluded.get(name) {
            return Err(DoubleError::NotAllowed(format!(
                "`{}::{}` is {} and cannot be configured", self.name(), name, exclusion.as_str()
            )));
        }
        if !self.dispatcher.handles(name) {
            return Err(DoubleError::Lookup(format!(
                "`{}` has no method `{}` to configure", self.name(), name
            )));
        }
        Ok(self.dispatcher.expectation(name))
    }

    pub fn methods(&self, names: &[&str]) -> Result<ExpectationRegistry> {
        let items = names.iter().map(|n| self.method(n)).collect::<Result<Vec<_>>>()?;
        Ok(ExpectationRegistry::new(items))
    }

    pub fn calls(&self, method: &str) -> CallLog {
        self.dispatcher.calls(method)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.dispatcher.call_count(method)
    }

    pub fn verify(&self) -> Vec<AssertionFailure> {
        self.dispatcher.verify()
    }

    /// Instantiate the double, running its constructor with `args`.
    pub fn new_instance(&self, args: Vec<Value>) -> Result<DoubleInstance> {
        let value = self.types.instantiate(self.name(), args)?;
        let Value::Object(object) = value else {
            return Err(DoubleError::Type(format!("`{}` did not produce an instance", self.name())));
        };
        Ok(DoubleInstance { double: self.clone(), object })
    }

    pub fn call_static(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        self.types.call_static(self.name(), method, args)
    }

    /// Like `call_static`; by-reference parameters write back into `args`.
    pub fn call_static_with(&self, method: &str, args: &mut Vec<Value>) -> Result<Value> {
        self.types.call_with(&self.as_value(), method, args)
    }
}

impl std::fmt::Debug for DoubleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoubleType")
            .field("name", &self.definition.synthetic_name)
            .field("kind", &self.definition.kind)
            .field("base", &self.definition.base)
            .finish()
    }
}

// ─── Instances ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DoubleInstance {
    double: DoubleType,
    object: ObjectRef,
}

impl DoubleInstance {
    pub fn double_type(&self) -> &DoubleType { &self.double }

    pub fn object(&self) -> &ObjectRef { &self.object }

    /// The instance as a value, to pass wherever the original is expected.
    pub fn as_value(&self) -> Value {
        Value::Object(self.object.clone())
    }

    pub fn method(&self, name: &str) -> Result<Expectation> {
        self.double.method(name)
    }

    pub fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        self.double.types.call(&self.as_value(), method, args)
    }

    /// Like `call`; by-reference parameters write back into `args`.
    pub fn call_with(&self, method: &str, args: &mut Vec<Value>) -> Result<Value> {
        self.double.types.call_with(&self.as_value(), method, args)
    }
}

impl std::fmt::Debug for DoubleInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoubleInstance")
            .field("double", &self.double.name())
            .field("object", &self.object)
            .finish()
    }
}
