//! Per-test wrapper around a `DoubleSession`.

use std::ops::Deref;

use crate::error::VerificationReport;
use crate::session::DoubleSession;

/// Owns a session for the length of one test and tears it down on drop.
///
/// A failed verification panics, which fails the test, unless the thread is
/// already unwinding from an earlier failure.
pub struct DoubleScope {
    session:  DoubleSession,
    finished: bool,
}

impl DoubleScope {
    pub fn new() -> Self {
        Self { session: DoubleSession::new(), finished: false }
    }

    pub fn with_session(session: DoubleSession) -> Self {
        Self { session, finished: false }
    }

    /// Tear down now and return the outcome instead of panicking on drop.
    pub fn finish(mut self) -> Result<(), VerificationReport> {
        self.finished = true;
        self.session.teardown()
    }
}

impl Default for DoubleScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for DoubleScope {
    type Target = DoubleSession;

    fn deref(&self) -> &DoubleSession {
        &self.session
    }
}

impl Drop for DoubleScope {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let outcome = self.session.teardown();
        if std::thread::panicking() {
            return;
        }
        if let Err(report) = outcome {
            panic!("{report}");
        }
    }
}

/// Run `test` against a fresh session and tear it down afterwards.
///
/// The closure's value is returned only when verification passes.
pub fn with_doubles<R>(test: impl FnOnce(&DoubleSession) -> R) -> Result<R, VerificationReport> {
    let session = DoubleSession::new();
    let result = test(&session);
    session.teardown()?;
    Ok(result)
}
