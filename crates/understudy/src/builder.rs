use crate::analysis::DoubleRequest;
use crate::config::ConfigOption;
use crate::error::{DoubleError, Result};
use crate::runtime::value::Value;
use crate::session::{DoubleInstance, DoubleSession, DoubleType};
use crate::syntax;
use crate::types::desc::{normalize_type_name, CONSTRUCTOR};

/// Collects the options for one double. Chained calls never fail; the first
/// invalid option is kept and returned by `get_type` / `get_instance`.
pub struct DoubleBuilder<'s> {
    session: &'s DoubleSession,
    request: DoubleRequest,
    error:   Option<DoubleError>,
}

impl<'s> DoubleBuilder<'s> {
    pub(crate) fn new(session: &'s DoubleSession, request: DoubleRequest) -> Self {
        Self { session, request, error: None }
    }

    pub fn request(&self) -> &DoubleRequest { &self.request }

    fn fail(&mut self, error: DoubleError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub fn add_interface(mut self, name: &str) -> Self {
        self.request.interfaces.push(normalize_type_name(name));
        self
    }

    pub fn add_mixin(mut self, name: &str) -> Self {
        self.request.mixins.push(normalize_type_name(name));
        self
    }

    /// Add a method no base or interface declares: `"name"` or `"static:name"`.
    pub fn add_method(mut self, spec: &str) -> Self {
        match syntax::parse_method_spec(spec) {
            Ok(method) => self.request.extra_methods.push(method),
            Err(e) => self.fail(e),
        }
        self
    }

    pub fn set_name(mut self, name: &str) -> Self {
        self.request.name = Some(normalize_type_name(name));
        self
    }

    pub fn set_config(mut self, option: ConfigOption, value: bool) -> Self {
        self.request.config.set(option, value);
        self
    }

    pub fn set_config_key(mut self, key: &str, value: bool) -> Self {
        match key.parse::<ConfigOption>() {
            Ok(option) => self.request.config.set(option, value),
            Err(e) => self.fail(e),
        }
        self
    }

    /// Resolve, synthesize and load the double.
    pub fn get_type(self) -> Result<DoubleType> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.session.create(&self.request)
    }

    /// Instance whose constructor is skipped.
    pub fn get_instance(self) -> Result<DoubleInstance> {
        let session = self.session;
        let double = self.get_type()?;
        if double.definition().generated(CONSTRUCTOR).is_some() {
            double.method(CONSTRUCTOR)?.dummy()?;
        }
        let instance = double.new_instance(Vec::new())?;
        session.track(&instance);
        Ok(instance)
    }

    /// Instance built by running the original constructor with `args`.
    pub fn get_instance_with(self, args: Vec<Value>) -> Result<DoubleInstance> {
        let session = self.session;
        let double = self.get_type()?;
        if double.definition().generated(CONSTRUCTOR).is_some() {
            double.method(CONSTRUCTOR)?.mock()?;
        }
        let instance = double.new_instance(args)?;
        session.track(&instance);
        Ok(instance)
    }
}
