#![forbid(unsafe_code)]

//! Digest (hash) algorithm implementations.

use digest::Digest;
use islandis_core::{algorithm, Error};

/// Trait for digest algorithms.
pub trait DigestAlgorithm: Send {
    /// Feed data into the hash.
    fn update(&mut self, data: &[u8]);
    /// Finalize and return the hash value.
    fn finalize(self: Box<Self>) -> Vec<u8>;
    /// Short algorithm name, as used in log output.
    fn name(&self) -> &'static str;
}

/// Create a digest algorithm from its XML-DSig URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn DigestAlgorithm>, Error> {
    match uri {
        algorithm::SHA1 => Ok(Box::new(Sha1Digest::new())),
        algorithm::SHA224 => Ok(Box::new(Sha224Digest::new())),
        algorithm::SHA256 => Ok(Box::new(Sha256Digest::new())),
        algorithm::SHA384 => Ok(Box::new(Sha384Digest::new())),
        algorithm::SHA512 => Ok(Box::new(Sha512Digest::new())),
        _ => Err(Error::UnsupportedAlgorithm(format!(
            "digest algorithm: {uri}"
        ))),
    }
}

/// Create a digest algorithm from the OID found in a PKCS#1 `DigestInfo`.
///
/// Returns `Ok(None)` for OIDs outside the table. SHA-0 is recognised but
/// has no implementation, so it is reported as unsupported.
pub fn from_oid(oid: &str) -> Result<Option<Box<dyn DigestAlgorithm>>, Error> {
    let hasher: Box<dyn DigestAlgorithm> = match oid {
        algorithm::OID_MD2 => Box::new(Md2Digest::new()),
        algorithm::OID_MD4 => Box::new(Md4Digest::new()),
        algorithm::OID_MD5 => Box::new(Md5Digest::new()),
        algorithm::OID_SHA1 => Box::new(Sha1Digest::new()),
        algorithm::OID_SHA224 => Box::new(Sha224Digest::new()),
        algorithm::OID_SHA256 => Box::new(Sha256Digest::new()),
        algorithm::OID_SHA384 => Box::new(Sha384Digest::new()),
        algorithm::OID_SHA512 => Box::new(Sha512Digest::new()),
        algorithm::OID_SHA0 => {
            return Err(Error::UnsupportedAlgorithm("sha-0 digest".into()));
        }
        _ => return Ok(None),
    };
    Ok(Some(hasher))
}

/// The `DigestInfo` hash OID an RSA certificate signature must carry.
pub fn oid_for_signature(signature_oid: &str) -> Option<&'static str> {
    let oid = match signature_oid {
        algorithm::OID_MD2_WITH_RSA => algorithm::OID_MD2,
        algorithm::OID_MD4_WITH_RSA => algorithm::OID_MD4,
        algorithm::OID_MD5_WITH_RSA => algorithm::OID_MD5,
        algorithm::OID_SHA1_WITH_RSA => algorithm::OID_SHA1,
        algorithm::OID_SHA224_WITH_RSA => algorithm::OID_SHA224,
        algorithm::OID_SHA256_WITH_RSA => algorithm::OID_SHA256,
        algorithm::OID_SHA384_WITH_RSA => algorithm::OID_SHA384,
        algorithm::OID_SHA512_WITH_RSA => algorithm::OID_SHA512,
        _ => return None,
    };
    Some(oid)
}

/// Compute a digest in one shot.
pub fn digest(uri: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut hasher = from_uri(uri)?;
    hasher.update(data);
    Ok(hasher.finalize())
}

// ── Concrete implementations ─────────────────────────────────────────

macro_rules! impl_digest {
    ($name:ident, $hasher:ty, $label:expr) => {
        struct $name {
            inner: $hasher,
        }

        impl $name {
            fn new() -> Self {
                Self {
                    inner: <$hasher>::new(),
                }
            }
        }

        impl DigestAlgorithm for $name {
            fn update(&mut self, data: &[u8]) {
                Digest::update(&mut self.inner, data);
            }

            fn finalize(self: Box<Self>) -> Vec<u8> {
                Digest::finalize(self.inner).to_vec()
            }

            fn name(&self) -> &'static str {
                $label
            }
        }
    };
}

impl_digest!(Md2Digest, md2::Md2, "md2");
impl_digest!(Md4Digest, md4::Md4, "md4");
impl_digest!(Md5Digest, md5::Md5, "md5");
impl_digest!(Sha1Digest, sha1::Sha1, "sha1");
impl_digest!(Sha224Digest, sha2::Sha224, "sha224");
impl_digest!(Sha256Digest, sha2::Sha256, "sha256");
impl_digest!(Sha384Digest, sha2::Sha384, "sha384");
impl_digest!(Sha512Digest, sha2::Sha512, "sha512");
