use std::fmt;

use thiserror::Error;

/// Errors raised by the type universe, the double engine and the expectation API.
///
/// Codes are prefixed by family: D = double/definition misuse, C = call-time
/// errors raised by the type universe, A = assertion failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DoubleError {
    /// Malformed count/args/call-index input, or a wrong-kind type reference.
    #[error("[D001] invalid argument: {0}")]
    InvalidArgument(String),

    /// Name collision or duplicate method.
    #[error("[D002] conflict: {0}")]
    Conflict(String),

    /// Operation disallowed by the active configuration.
    #[error("[D003] configuration: {0}")]
    Config(String),

    /// Base and interface declare the same method with different shapes.
    #[error("[D004] incompatible signature: {0}")]
    IncompatibleSignature(String),

    /// Unknown type or method.
    #[error("[D005] lookup failed: {0}")]
    Lookup(String),

    /// Access to a method or type that may not be used that way.
    #[error("[D006] not allowed: {0}")]
    NotAllowed(String),

    /// Sealed or uninspectable built-in type.
    #[error("[D007] unsupported type: {0}")]
    UnsupportedType(String),

    /// Call-compatibility violation: arity, parameter type, static vs instance.
    #[error("[C001] type error: {0}")]
    Type(String),

    /// Error raised from a method body or a throwing stub.
    #[error("[C002] {kind}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Thrown { kind: String, message: Option<String> },

    #[error(transparent)]
    Assertion(#[from] AssertionFailure),
}

impl DoubleError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_)       => "D001",
            Self::Conflict(_)              => "D002",
            Self::Config(_)                => "D003",
            Self::IncompatibleSignature(_) => "D004",
            Self::Lookup(_)                => "D005",
            Self::NotAllowed(_)            => "D006",
            Self::UnsupportedType(_)       => "D007",
            Self::Type(_)                  => "C001",
            Self::Thrown { .. }            => "C002",
            Self::Assertion(_)             => "A001",
        }
    }

    /// Only assertion failures are test failures; everything else is API misuse.
    pub fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion(_))
    }

    pub fn thrown(kind: impl Into<String>, message: Option<String>) -> Self {
        Self::Thrown { kind: kind.into(), message }
    }
}

pub type Result<T, E = DoubleError> = std::result::Result<T, E>;

// ─── Assertions ───────────────────────────────────────────────────────────────

/// A failed argument or count expectation.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct AssertionFailure {
    pub double:  String,
    pub method:  String,
    /// Call index the failure relates to. `None` for count failures.
    pub call:    Option<usize>,
    pub message: String,
}

impl AssertionFailure {
    pub fn new(
        double: impl Into<String>,
        method: impl Into<String>,
        call: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        Self { double: double.into(), method: method.into(), call, message: message.into() }
    }
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[A001] {}::{}", self.double, self.method)?;
        if let Some(call) = self.call {
            write!(f, " (call #{call})")?;
        }
        write!(f, ": {}", self.message)
    }
}

// ─── Teardown ─────────────────────────────────────────────────────────────────

/// Every failure collected by one verification pass.
#[derive(Debug, Clone, PartialEq, Default, Error)]
pub struct VerificationReport {
    pub failures: Vec<AssertionFailure>,
}

impl VerificationReport {
    pub fn is_empty(&self) -> bool { self.failures.is_empty() }

    pub fn len(&self) -> usize { self.failures.len() }

    pub fn involves(&self, double: &str, method: &str) -> bool {
        self.failures.iter().any(|f| f.double == double && f.method == method)
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} double expectation(s) failed", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n  {failure}")?;
        }
        Ok(())
    }
}
