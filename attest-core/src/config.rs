//! Engine configuration.
//!
//! Selects which formats and signature algorithms are accepted and how
//! signature counters are checked. Factories turn the configuration into the
//! shared components.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cose::algorithm::{self, AlgorithmManager, DEFAULT_ALGORITHMS};
use crate::counter::{CounterChecker, NoopCounterChecker, StrictCounterChecker};
use crate::error::{AttestError, Result};
use crate::formats::{
    AppleAttestationStatementSupport, AttestationFormat, NoneAttestationStatementSupport,
    PackedAttestationStatementSupport,
};
use crate::registry::FormatRegistry;

/// How signature counters are checked on authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterPolicy {
    /// Counter must strictly increase.
    #[default]
    Strict,
    /// Counter is not checked.
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttestationConfig {
    /// Accepted attestation formats
    pub formats: Vec<AttestationFormat>,
    /// Accepted COSE algorithm identifiers
    pub algorithms: Vec<i64>,
    pub counter_policy: CounterPolicy,
}

impl Default for AttestationConfig {
    fn default() -> Self {
        Self {
            formats: AttestationFormat::ALL.to_vec(),
            algorithms: DEFAULT_ALGORITHMS.to_vec(),
            counter_policy: CounterPolicy::default(),
        }
    }
}

impl AttestationConfig {
    pub fn algorithm_manager(&self) -> Result<AlgorithmManager> {
        let mut manager = AlgorithmManager::new();
        for &id in &self.algorithms {
            let algorithm = algorithm::builtin(id).ok_or_else(|| {
                AttestError::Configuration(format!("Unknown COSE algorithm: {}", id))
            })?;
            manager.add(algorithm);
        }
        Ok(manager)
    }

    pub fn build_registry(&self) -> Result<FormatRegistry> {
        if self.formats.is_empty() {
            return Err(AttestError::Configuration(
                "At least one attestation format must be enabled".into(),
            ));
        }

        let algorithm_manager = Arc::new(self.algorithm_manager()?);
        let mut registry = FormatRegistry::new();
        for format in &self.formats {
            match format {
                AttestationFormat::None => {
                    registry.add(NoneAttestationStatementSupport::new());
                }
                AttestationFormat::Packed => {
                    registry.add(PackedAttestationStatementSupport::new(
                        algorithm_manager.clone(),
                    ));
                }
                AttestationFormat::Apple => {
                    registry.add(AppleAttestationStatementSupport::new());
                }
            }
        }

        tracing::info!(
            formats = ?registry.formats(),
            algorithms = ?self.algorithms,
            "Attestation format registry built"
        );
        Ok(registry)
    }

    pub fn counter_checker(&self) -> Arc<dyn CounterChecker> {
        match self.counter_policy {
            CounterPolicy::Strict => Arc::new(StrictCounterChecker),
            CounterPolicy::Disabled => Arc::new(NoopCounterChecker),
        }
    }
}
