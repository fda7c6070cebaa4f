#![forbid(unsafe_code)]

//! RSA PKCS#1 v1.5 signature algorithms.

use islandis_core::{algorithm, Error, SignatureError};
use signature::SignatureEncoding;

/// Key material for signature operations.
#[derive(Debug, Clone)]
pub enum SigningKey {
    Rsa(rsa::RsaPrivateKey),
    RsaPublic(rsa::RsaPublicKey),
}

impl SigningKey {
    pub fn public_key(&self) -> rsa::RsaPublicKey {
        match self {
            SigningKey::Rsa(pk) => pk.to_public_key(),
            SigningKey::RsaPublic(pk) => pk.clone(),
        }
    }
}

/// Trait for signature algorithms.
pub trait SignatureAlgorithm: Send + Sync {
    fn name(&self) -> &'static str;
    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error>;
    fn verify(&self, key: &SigningKey, data: &[u8], signature: &[u8]) -> Result<bool, Error>;
}

/// Create a signature algorithm from its XML-DSig URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn SignatureAlgorithm>, Error> {
    let hash = match uri {
        algorithm::RSA_SHA1 => HashType::Sha1,
        algorithm::RSA_SHA224 => HashType::Sha224,
        algorithm::RSA_SHA256 => HashType::Sha256,
        algorithm::RSA_SHA384 => HashType::Sha384,
        algorithm::RSA_SHA512 => HashType::Sha512,
        _ => {
            return Err(Error::UnsupportedAlgorithm(format!(
                "signature algorithm: {uri}"
            )))
        }
    };
    Ok(Box::new(RsaPkcs1v15 { hash }))
}

/// Create a signature algorithm from an X.509 `signatureAlgorithm` OID.
///
/// Returns `None` for algorithms without a library implementation
/// (md2WithRSAEncryption, md4WithRSAEncryption) and for unknown OIDs.
pub fn from_certificate_oid(oid: &str) -> Option<Box<dyn SignatureAlgorithm>> {
    let hash = match oid {
        algorithm::OID_MD5_WITH_RSA => HashType::Md5,
        algorithm::OID_SHA1_WITH_RSA => HashType::Sha1,
        algorithm::OID_SHA224_WITH_RSA => HashType::Sha224,
        algorithm::OID_SHA256_WITH_RSA => HashType::Sha256,
        algorithm::OID_SHA384_WITH_RSA => HashType::Sha384,
        algorithm::OID_SHA512_WITH_RSA => HashType::Sha512,
        _ => return None,
    };
    Some(Box::new(RsaPkcs1v15 { hash }))
}

#[derive(Debug, Clone, Copy)]
enum HashType {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

// ── RSA PKCS#1 v1.5 ─────────────────────────────────────────────────

struct RsaPkcs1v15 {
    hash: HashType,
}

impl RsaPkcs1v15 {
    fn sign_with_key(&self, private_key: &rsa::RsaPrivateKey, data: &[u8]) -> Vec<u8> {
        use signature::Signer;
        macro_rules! do_sign {
            ($hasher:ty) => {{
                let sk = rsa::pkcs1v15::SigningKey::<$hasher>::new(private_key.clone());
                sk.sign(data).to_vec()
            }};
        }
        match self.hash {
            HashType::Md5 => do_sign!(md5::Md5),
            HashType::Sha1 => do_sign!(sha1::Sha1),
            HashType::Sha224 => do_sign!(sha2::Sha224),
            HashType::Sha256 => do_sign!(sha2::Sha256),
            HashType::Sha384 => do_sign!(sha2::Sha384),
            HashType::Sha512 => do_sign!(sha2::Sha512),
        }
    }

    fn verify_with_key(
        &self,
        public_key: &rsa::RsaPublicKey,
        data: &[u8],
        sig_bytes: &[u8],
    ) -> Result<bool, Error> {
        use signature::Verifier;
        let sig = rsa::pkcs1v15::Signature::try_from(sig_bytes)
            .map_err(|e| SignatureError::Malformed(format!("invalid RSA signature: {e}")))?;
        macro_rules! do_verify {
            ($hasher:ty) => {{
                let vk = rsa::pkcs1v15::VerifyingKey::<$hasher>::new(public_key.clone());
                Ok(vk.verify(data, &sig).is_ok())
            }};
        }
        match self.hash {
            HashType::Md5 => do_verify!(md5::Md5),
            HashType::Sha1 => do_verify!(sha1::Sha1),
            HashType::Sha224 => do_verify!(sha2::Sha224),
            HashType::Sha256 => do_verify!(sha2::Sha256),
            HashType::Sha384 => do_verify!(sha2::Sha384),
            HashType::Sha512 => do_verify!(sha2::Sha512),
        }
    }
}

impl SignatureAlgorithm for RsaPkcs1v15 {
    fn name(&self) -> &'static str {
        match self.hash {
            HashType::Md5 => "rsa-md5",
            HashType::Sha1 => "rsa-sha1",
            HashType::Sha224 => "rsa-sha224",
            HashType::Sha256 => "rsa-sha256",
            HashType::Sha384 => "rsa-sha384",
            HashType::Sha512 => "rsa-sha512",
        }
    }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        match key {
            SigningKey::Rsa(pk) => Ok(self.sign_with_key(pk, data)),
            SigningKey::RsaPublic(_) => Err(SignatureError::Malformed(
                "RSA private key required".into(),
            )
            .into()),
        }
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        self.verify_with_key(&key.public_key(), data, sig_bytes)
    }
}
