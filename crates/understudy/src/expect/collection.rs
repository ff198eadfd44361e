use crate::error::Result;
use crate::expect::args::ArgsSpec;
use crate::expect::count::CountSpec;
use crate::expect::expectation::{Calls, Expectation};
use crate::stubs::IntoStub;

/// Several expectations configured together. Every mutator is applied to each
/// member in order and stops at the first error.
#[derive(Debug, Clone, Default)]
pub struct ExpectationRegistry {
    items: Vec<Expectation>,
}

impl ExpectationRegistry {
    pub fn new(items: Vec<Expectation>) -> Self {
        Self { items }
    }

    pub fn push(&mut self, expectation: Expectation) {
        self.items.push(expectation);
    }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &Expectation> {
        self.items.iter()
    }

    pub fn get(&self, method: &str) -> Option<&Expectation> {
        self.items.iter().find(|e| e.method() == method)
    }

    fn each(&self, mut f: impl FnMut(&Expectation) -> Result<()>) -> Result<&Self> {
        for e in &self.items {
            f(e)?;
        }
        Ok(self)
    }

    pub fn dummy(&self) -> Result<&Self> {
        self.each(|e| e.dummy().map(drop))
    }

    pub fn dummy_on(&self, calls: impl Into<Calls>) -> Result<&Self> {
        let calls = calls.into();
        self.each(|e| e.dummy_on(calls.clone()).map(drop))
    }

    pub fn mock(&self) -> Result<&Self> {
        self.each(|e| e.mock().map(drop))
    }

    pub fn mock_on(&self, calls: impl Into<Calls>) -> Result<&Self> {
        let calls = calls.into();
        self.each(|e| e.mock_on(calls.clone()).map(drop))
    }

    pub fn stub(&self, stub: impl IntoStub) -> Result<&Self> {
        let stub = stub.into_stub();
        self.each(|e| e.stub(stub.clone()).map(drop))
    }

    pub fn stub_on(&self, stub: impl IntoStub, calls: impl Into<Calls>) -> Result<&Self> {
        let (stub, calls) = (stub.into_stub(), calls.into());
        self.each(|e| e.stub_on(stub.clone(), calls.clone()).map(drop))
    }

    pub fn use_default(&self) -> Result<&Self> {
        self.each(|e| e.use_default().map(drop))
    }

    pub fn use_default_on(&self, calls: impl Into<Calls>) -> Result<&Self> {
        let calls = calls.into();
        self.each(|e| e.use_default_on(calls.clone()).map(drop))
    }

    pub fn args(&self, spec: impl Into<ArgsSpec>) -> Result<&Self> {
        let spec = spec.into();
        self.each(|e| e.args(spec.clone()).map(drop))
    }

    pub fn args_on(&self, spec: impl Into<ArgsSpec>, calls: impl Into<Calls>) -> Result<&Self> {
        let (spec, calls) = (spec.into(), calls.into());
        self.each(|e| e.args_on(spec.clone(), calls.clone()).map(drop))
    }

    pub fn count(&self, spec: impl Into<CountSpec>) -> Result<&Self> {
        let spec = spec.into();
        self.each(|e| e.count(spec.clone()).map(drop))
    }
}

impl<'a> IntoIterator for &'a ExpectationRegistry {
    type Item = &'a Expectation;
    type IntoIter = std::slice::Iter<'a, Expectation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
