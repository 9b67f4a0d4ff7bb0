//! Signature counter checks, the clone-detection signal on every authentication.

use crate::credential::PublicKeyCredentialSource;
use crate::error::{AttestError, Result};

/// Strategy validating the counter reported by an authenticator.
///
/// Callers persist the new counter themselves, atomically per credential.
pub trait CounterChecker: Send + Sync {
    fn check(&self, credential: &PublicKeyCredentialSource, current_counter: u32) -> Result<()>;
}

/// Requires the counter to strictly increase.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictCounterChecker;

impl CounterChecker for StrictCounterChecker {
    fn check(&self, credential: &PublicKeyCredentialSource, current_counter: u32) -> Result<()> {
        let stored = credential.counter();
        if current_counter > stored {
            return Ok(());
        }

        tracing::error!(
            current = current_counter,
            stored,
            credential_id = %hex::encode(credential.credential_id()),
            "Invalid counter"
        );
        Err(AttestError::Counter {
            stored,
            current: current_counter,
        })
    }
}

/// Accepts any counter, for authenticators that always report zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCounterChecker;

impl CounterChecker for NoopCounterChecker {
    fn check(&self, _credential: &PublicKeyCredentialSource, _current_counter: u32) -> Result<()> {
        Ok(())
    }
}
