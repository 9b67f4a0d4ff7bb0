//! Signature encoding normalisation.

use openssl::bn::BigNum;
use openssl::ecdsa::EcdsaSig;

use crate::cose::algorithm::SignatureEncoding;
use crate::error::{AttestError, Result};

/// Bring a signature into the encoding the verifying algorithm expects.
///
/// ECDSA verification takes a DER `Ecdsa-Sig-Value`. Some authenticators send
/// the fixed-width `r || s` form instead; that form is converted. Anything
/// else is returned untouched and left for the verifier to reject.
pub fn fix_signature(signature: &[u8], encoding: SignatureEncoding) -> Result<Vec<u8>> {
    let component_len = match encoding {
        SignatureEncoding::Opaque => return Ok(signature.to_vec()),
        SignatureEncoding::EcdsaDer { component_len } => component_len,
    };

    if is_canonical_der(signature) || signature.len() != 2 * component_len {
        return Ok(signature.to_vec());
    }

    let (r, s) = signature.split_at(component_len);
    let convert = |e: openssl::error::ErrorStack| {
        AttestError::Verification(format!("Unable to convert the signature: {}", e))
    };
    let r = BigNum::from_slice(r).map_err(convert)?;
    let s = BigNum::from_slice(s).map_err(convert)?;
    EcdsaSig::from_private_components(r, s)
        .and_then(|sig| sig.to_der())
        .map_err(convert)
}

fn is_canonical_der(signature: &[u8]) -> bool {
    EcdsaSig::from_der(signature)
        .and_then(|sig| sig.to_der())
        .map(|der| der == signature)
        .unwrap_or(false)
}
