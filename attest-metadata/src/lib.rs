//! Attest Metadata - FIDO metadata BLOB trust store model
//!
//! Validated, immutable representation of the FIDO Alliance metadata BLOB
//! payload, used to resolve attestation trust anchors and authenticator
//! status. The BLOB is expected to be fetched and signature-checked by the
//! caller; this crate starts from its decoded JSON body.
//!
//! # Features
//!
//! - Payload and entry parsing with field-level error messages
//! - Exactly-one authenticator identifier (AAID, AAGUID or key identifiers)
//! - Status reports, biometric reports and metadata statements
//! - Snapshot store with monotonic `no` and atomic replacement
//!
//! # Example
//!
//! ```no_run
//! use attest_metadata::{MetadataBLOBPayload, MetadataTrustStore};
//!
//! # fn example(blob_body: &serde_json::Value, aaguid: uuid::Uuid) -> attest_metadata::Result<()> {
//! let store = MetadataTrustStore::new();
//! store.publish(MetadataBLOBPayload::create_from(blob_body)?)?;
//!
//! let roots = store.trust_anchors_for_aaguid(&aaguid)?;
//! println!("{} trust anchors", roots.len());
//! # Ok(())
//! # }
//! ```

pub mod entry;
pub mod error;
pub mod payload;
pub mod statement;
pub mod status_report;
pub mod store;
pub mod utils;

// Re-export main types for convenience
pub use entry::{AuthenticatorIdentifier, MetadataBLOBPayloadEntry};
pub use error::{MetadataError, Result};
pub use payload::MetadataBLOBPayload;
pub use statement::{
    MetadataStatement, PatternAccuracyDescriptor, VerificationMethodDescriptor, Version,
};
pub use status_report::{AuthenticatorStatus, BiometricStatusReport, StatusReport};
pub use store::MetadataTrustStore;
pub use utils::filter_null_values;
