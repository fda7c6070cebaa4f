#![forbid(unsafe_code)]

//! Chain-signature check through `x509-cert` and `rsa`.

use islandis_core::Error;
use islandis_crypto::sign::{self, SigningKey};

use crate::cert::LeafCertificate;

/// Verify that `leaf` was signed by `issuer`.
///
/// Returns `Ok(None)` when the signature algorithm has no library
/// implementation, leaving the caller to choose another path.
pub fn verify_signature(
    leaf: &LeafCertificate,
    issuer: &rsa::RsaPublicKey,
) -> Result<Option<bool>, Error> {
    let oid = leaf.signature_oid();
    let Some(alg) = sign::from_certificate_oid(&oid) else {
        return Ok(None);
    };
    let tbs = leaf.tbs_der()?;
    let signature = leaf.signature_bytes()?;
    let key = SigningKey::RsaPublic(issuer.clone());

    // A signature that does not even decode is a failed signature here.
    let valid = alg.verify(&key, &tbs, signature).unwrap_or(false);
    tracing::debug!(algorithm = alg.name(), valid, "native chain signature check");
    Ok(Some(valid))
}
