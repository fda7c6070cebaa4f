#![allow(dead_code)]

//! Fixtures: RSA keys, X.509 certificates and signed SAML responses.

use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use der::asn1::{
    Any, BitStringRef, Null, ObjectIdentifier, OctetStringRef, PrintableStringRef, UintRef,
    UtcTime, Utf8StringRef,
};
use der::{Encode, Tag, TagNumber};
use digest::Digest;
use islandis::crypto::SigningKey;
use islandis::{FixedClock, Verifier, VerifierConfig};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};

pub const AUDIENCE: &str = "https://minarsidur.example.is/saml";
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0";
pub const SERIAL: &str = "6503760649";
pub const ISSUER_CN: &str = "Fullgilt audkenni";

const OID_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
const OID_COMMON_NAME: &str = "2.5.4.3";
const OID_SERIAL_NUMBER: &str = "2.5.4.5";
const OID_ORGANIZATION: &str = "2.5.4.10";

fn key(slot: &'static OnceLock<RsaPrivateKey>) -> &'static RsaPrivateKey {
    slot.get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 1024).expect("rsa keygen"))
}

/// Key of the pinned issuing authority.
pub fn anchor_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    key(&KEY)
}

/// Key of the identity provider's signing certificate.
pub fn leaf_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    key(&KEY)
}

/// A key nobody trusts.
pub fn rogue_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    key(&KEY)
}

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

/// The instant most scenarios are verified at.
pub fn now() -> DateTime<Utc> {
    utc(2024, 6, 1, 12, 0, 0)
}

// ── DER building ─────────────────────────────────────────────────────

fn constructed(tag: Tag, parts: &[Vec<u8>]) -> Vec<u8> {
    Any::new(tag, parts.concat()).unwrap().to_der().unwrap()
}

pub fn seq(parts: &[Vec<u8>]) -> Vec<u8> {
    constructed(Tag::Sequence, parts)
}

fn set(parts: &[Vec<u8>]) -> Vec<u8> {
    constructed(Tag::Set, parts)
}

fn explicit0(inner: Vec<u8>) -> Vec<u8> {
    constructed(
        Tag::ContextSpecific {
            constructed: true,
            number: TagNumber::N0,
        },
        &[inner],
    )
}

pub fn oid(dotted: &str) -> Vec<u8> {
    ObjectIdentifier::new(dotted).unwrap().to_der().unwrap()
}

fn null() -> Vec<u8> {
    Null.to_der().unwrap()
}

fn uint(bytes: &[u8]) -> Vec<u8> {
    UintRef::new(bytes).unwrap().to_der().unwrap()
}

fn time(t: DateTime<Utc>) -> Vec<u8> {
    let secs = u64::try_from(t.timestamp()).unwrap();
    UtcTime::from_unix_duration(Duration::from_secs(secs))
        .unwrap()
        .to_der()
        .unwrap()
}

fn algorithm(dotted: &str) -> Vec<u8> {
    seq(&[oid(dotted), null()])
}

/// One name attribute. Serial numbers are PrintableString, the rest UTF8String.
fn rdn(attr_oid: &str, value: &str) -> Vec<u8> {
    let encoded = if attr_oid == OID_SERIAL_NUMBER {
        PrintableStringRef::new(value).unwrap().to_der().unwrap()
    } else {
        Utf8StringRef::new(value).unwrap().to_der().unwrap()
    };
    set(&[seq(&[oid(attr_oid), encoded])])
}

fn public_key_info(key: &RsaPublicKey) -> Vec<u8> {
    let rsa_key = seq(&[uint(&key.n().to_bytes_be()), uint(&key.e().to_bytes_be())]);
    seq(&[
        algorithm(OID_RSA_ENCRYPTION),
        BitStringRef::from_bytes(&rsa_key).unwrap().to_der().unwrap(),
    ])
}

// ── Certificates ─────────────────────────────────────────────────────

/// Signature hash of a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hash {
    Md2,
    Md4,
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl Hash {
    pub fn signature_oid(self) -> &'static str {
        match self {
            Hash::Md2 => "1.2.840.113549.1.1.2",
            Hash::Md4 => "1.2.840.113549.1.1.3",
            Hash::Md5 => "1.2.840.113549.1.1.4",
            Hash::Sha1 => "1.2.840.113549.1.1.5",
            Hash::Sha256 => "1.2.840.113549.1.1.11",
            Hash::Sha384 => "1.2.840.113549.1.1.12",
            Hash::Sha512 => "1.2.840.113549.1.1.13",
        }
    }

    pub fn digest_oid(self) -> &'static str {
        match self {
            Hash::Md2 => "1.2.840.113549.2.2",
            Hash::Md4 => "1.2.840.113549.2.4",
            Hash::Md5 => "1.2.840.113549.2.5",
            Hash::Sha1 => "1.3.14.3.2.26",
            Hash::Sha256 => "2.16.840.1.101.3.4.2.1",
            Hash::Sha384 => "2.16.840.1.101.3.4.2.2",
            Hash::Sha512 => "2.16.840.1.101.3.4.2.3",
        }
    }

    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Hash::Md2 => md2::Md2::digest(data).to_vec(),
            Hash::Md4 => md4::Md4::digest(data).to_vec(),
            Hash::Md5 => md5::Md5::digest(data).to_vec(),
            Hash::Sha1 => sha1::Sha1::digest(data).to_vec(),
            Hash::Sha256 => sha2::Sha256::digest(data).to_vec(),
            Hash::Sha384 => sha2::Sha384::digest(data).to_vec(),
            Hash::Sha512 => sha2::Sha512::digest(data).to_vec(),
        }
    }
}

/// What goes into a generated certificate.
#[derive(Debug, Clone)]
pub struct CertSpec {
    pub subject: Vec<(&'static str, String)>,
    pub issuer: Vec<(&'static str, String)>,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub hash: Hash,
    /// Overrides the hash OID inside the signed DigestInfo.
    pub digest_info_oid: Option<&'static str>,
    /// Signs a DigestInfo of this hash while still labelling the
    /// certificate with `hash`.
    pub digest_info_hash: Option<Hash>,
}

impl CertSpec {
    /// A leaf that satisfies every identity check.
    pub fn leaf() -> Self {
        Self {
            subject: vec![
                (OID_COMMON_NAME, "Ísland.is innskráning".into()),
                (OID_SERIAL_NUMBER, SERIAL.into()),
            ],
            issuer: anchor_subject(),
            not_before: utc(2010, 1, 1, 0, 0, 0),
            not_after: utc(2040, 1, 1, 0, 0, 0),
            hash: Hash::Sha256,
            digest_info_oid: None,
            digest_info_hash: None,
        }
    }

    pub fn with_hash(mut self, hash: Hash) -> Self {
        self.hash = hash;
        self
    }

    pub fn with_subject_serial(mut self, serial: &str) -> Self {
        for (attr, value) in &mut self.subject {
            if *attr == OID_SERIAL_NUMBER {
                *value = serial.into();
            }
        }
        self
    }

    pub fn with_issuer(mut self, issuer: Vec<(&'static str, String)>) -> Self {
        self.issuer = issuer;
        self
    }

    pub fn with_validity(mut self, not_before: DateTime<Utc>, not_after: DateTime<Utc>) -> Self {
        self.not_before = not_before;
        self.not_after = not_after;
        self
    }

    pub fn with_digest_info_oid(mut self, dotted: &'static str) -> Self {
        self.digest_info_oid = Some(dotted);
        self
    }

    pub fn with_digest_info_hash(mut self, hash: Hash) -> Self {
        self.digest_info_hash = Some(hash);
        self
    }

    /// Encode the certificate for `subject_key`, signed by `issuer_key`.
    pub fn build(&self, subject_key: &RsaPublicKey, issuer_key: &RsaPrivateKey) -> Vec<u8> {
        let name = |attrs: &[(&'static str, String)]| {
            seq(&attrs
                .iter()
                .map(|(attr, value)| rdn(attr, value))
                .collect::<Vec<_>>())
        };
        let tbs = seq(&[
            explicit0(2u8.to_der().unwrap()),
            uint(&[0x01, 0x23, 0x45, 0x67]),
            algorithm(self.hash.signature_oid()),
            name(&self.issuer),
            seq(&[time(self.not_before), time(self.not_after)]),
            name(&self.subject),
            public_key_info(subject_key),
        ]);

        let signed_hash = self.digest_info_hash.unwrap_or(self.hash);
        let digest_info = seq(&[
            algorithm(self.digest_info_oid.unwrap_or(signed_hash.digest_oid())),
            OctetStringRef::new(&signed_hash.digest(&tbs))
                .unwrap()
                .to_der()
                .unwrap(),
        ]);
        let signature = issuer_key
            .sign(Pkcs1v15Sign::new_unprefixed(), &digest_info)
            .unwrap();

        seq(&[
            tbs,
            algorithm(self.hash.signature_oid()),
            BitStringRef::from_bytes(&signature).unwrap().to_der().unwrap(),
        ])
    }
}

pub fn anchor_subject() -> Vec<(&'static str, String)> {
    vec![
        (OID_COMMON_NAME, ISSUER_CN.into()),
        (OID_ORGANIZATION, "Auðkenni hf.".into()),
    ]
}

/// Same common name as the anchor, different organization.
pub fn impostor_issuer() -> Vec<(&'static str, String)> {
    vec![
        (OID_COMMON_NAME, ISSUER_CN.into()),
        (OID_ORGANIZATION, "Falsari ehf.".into()),
    ]
}

/// The signatureValue of a DER certificate.
pub fn signature_value(der: &[u8]) -> Vec<u8> {
    let root = islandis::der::DerElement::parse_exact(der).unwrap();
    let parts = root.children_exact(3).unwrap();
    parts[2].value().unwrap().to_vec()
}

/// Re-encode a DER certificate with a different signatureValue.
pub fn with_signature_value(der: &[u8], signature: &[u8]) -> Vec<u8> {
    let root = islandis::der::DerElement::parse_exact(der).unwrap();
    let parts = root.children_exact(3).unwrap();
    seq(&[
        parts[0].as_bytes().to_vec(),
        parts[1].as_bytes().to_vec(),
        BitStringRef::from_bytes(signature).unwrap().to_der().unwrap(),
    ])
}

/// The self-signed issuing certificate.
pub fn anchor_cert() -> Vec<u8> {
    CertSpec {
        subject: anchor_subject(),
        issuer: anchor_subject(),
        not_before: utc(2005, 1, 1, 0, 0, 0),
        not_after: utc(2045, 1, 1, 0, 0, 0),
        hash: Hash::Sha256,
        digest_info_oid: None,
        digest_info_hash: None,
    }
    .build(&anchor_key().to_public_key(), anchor_key())
}

/// A valid leaf for `leaf_key()`.
pub fn leaf_cert() -> Vec<u8> {
    CertSpec::leaf().build(&leaf_key().to_public_key(), anchor_key())
}

pub fn pem(der: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(der);
    let mut out = String::from("-----BEGIN CERTIFICATE-----\n");
    for line in b64.as_bytes().chunks(64) {
        out.push_str(std::str::from_utf8(line).unwrap());
        out.push('\n');
    }
    out.push_str("-----END CERTIFICATE-----\n");
    out
}

/// A certificate directory holding `Milliskilriki.cer`.
pub fn cert_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Milliskilriki.cer"), anchor_cert()).unwrap();
    dir
}

pub fn verifier_at(dir: &Path, instant: DateTime<Utc>) -> Verifier {
    let config = VerifierConfig::new(AUDIENCE).with_cert_dir(dir);
    Verifier::new(config, Arc::new(FixedClock::new(instant))).unwrap()
}

// ── SAML responses ───────────────────────────────────────────────────

pub const RESPONSE_ID: &str = "_9f1c7e0a-5b7d-4c63-8f7e-1b2d4e6a8c01";
pub const ASSERTION_ID: &str = "_3a8d2f61-0c4e-4b7a-9d15-7e2c9b0f4a22";

/// How the signature's KeyInfo is written.
#[derive(Debug, Clone)]
pub enum KeyInfo {
    Certificate(Vec<u8>),
    KeyValue(RsaPublicKey),
    /// KeyInfo with only a KeyName.
    NameOnly,
    Missing,
}

impl KeyInfo {
    fn render(&self) -> String {
        let engine = base64::engine::general_purpose::STANDARD;
        match self {
            KeyInfo::Certificate(der) => format!(
                "<ds:KeyInfo><ds:X509Data><ds:X509Certificate>{}</ds:X509Certificate></ds:X509Data></ds:KeyInfo>",
                engine.encode(der)
            ),
            KeyInfo::KeyValue(key) => format!(
                "<ds:KeyInfo><ds:KeyValue><ds:RSAKeyValue><ds:Modulus>{}</ds:Modulus><ds:Exponent>{}</ds:Exponent></ds:RSAKeyValue></ds:KeyValue></ds:KeyInfo>",
                engine.encode(key.n().to_bytes_be()),
                engine.encode(key.e().to_bytes_be())
            ),
            KeyInfo::NameOnly => "<ds:KeyInfo><ds:KeyName>island.is</ds:KeyName></ds:KeyInfo>".into(),
            KeyInfo::Missing => String::new(),
        }
    }
}

/// Which element carries the enveloped signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signed {
    Assertion,
    Response,
}

#[derive(Debug, Clone)]
pub struct ResponseSpec {
    pub audience: String,
    pub not_before: String,
    pub not_on_or_after: String,
    pub attributes: Vec<(String, String)>,
    pub key_info: KeyInfo,
    pub signed: Signed,
}

impl Default for ResponseSpec {
    fn default() -> Self {
        Self {
            audience: AUDIENCE.into(),
            not_before: "2024-06-01T11:55:00Z".into(),
            not_on_or_after: "2024-06-01T12:05:00Z".into(),
            attributes: vec![
                ("UserSSN".into(), "0101302989".into()),
                ("Name".into(), "Jón Jónsson".into()),
                ("Authentication".into(), "Rafræn skilríki".into()),
                ("IPAddress".into(), "192.0.2.17".into()),
                ("UserAgent".into(), USER_AGENT.into()),
                ("AuthID".into(), "b6d3c0de-4f5e-4a1b-9c2d-0e1f2a3b4c5d".into()),
                ("Mobile".into(), "6991234".into()),
            ],
            key_info: KeyInfo::Certificate(leaf_cert()),
            signed: Signed::Assertion,
        }
    }
}

impl ResponseSpec {
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.retain(|(n, _)| n != name);
        self.attributes.push((name.into(), value.into()));
        self
    }

    fn signature(&self, reference_id: &str) -> String {
        format!(
            concat!(
                r#"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:SignedInfo>"#,
                r#"<ds:CanonicalizationMethod Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"/>"#,
                r#"<ds:SignatureMethod Algorithm="http://www.w3.org/2001/04/xmldsig-more#rsa-sha256"/>"#,
                r##"<ds:Reference URI="#{id}"><ds:Transforms>"##,
                r#"<ds:Transform Algorithm="http://www.w3.org/2000/09/xmldsig#enveloped-signature"/>"#,
                r#"<ds:Transform Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#">"#,
                r#"<ec:InclusiveNamespaces xmlns:ec="http://www.w3.org/2001/10/xml-exc-c14n#" PrefixList="xs"/>"#,
                r#"</ds:Transform></ds:Transforms>"#,
                r#"<ds:DigestMethod Algorithm="http://www.w3.org/2001/04/xmlenc#sha256"/>"#,
                r#"<ds:DigestValue></ds:DigestValue></ds:Reference></ds:SignedInfo>"#,
                r#"<ds:SignatureValue></ds:SignatureValue>{key_info}</ds:Signature>"#,
            ),
            id = reference_id,
            key_info = self.key_info.render(),
        )
    }

    /// The unsigned template, with empty DigestValue and SignatureValue.
    pub fn template(&self) -> String {
        let attributes: String = self
            .attributes
            .iter()
            .map(|(name, value)| {
                format!(
                    "\n      <saml:Attribute Name=\"{name}\" NameFormat=\"urn:oasis:names:tc:SAML:2.0:attrname-format:basic\"><saml:AttributeValue xsi:type=\"xs:string\">{value}</saml:AttributeValue></saml:Attribute>"
                )
            })
            .collect();
        let (response_sig, assertion_sig) = match self.signed {
            Signed::Response => (self.signature(RESPONSE_ID), String::new()),
            Signed::Assertion => (String::new(), self.signature(ASSERTION_ID)),
        };
        format!(
            r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="{RESPONSE_ID}" Version="2.0" IssueInstant="2024-06-01T11:55:00Z" Destination="{audience}">{response_sig}
  <saml:Issuer>https://innskraning.island.is</saml:Issuer>
  <samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>
  <saml:Assertion xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" ID="{ASSERTION_ID}" Version="2.0" IssueInstant="2024-06-01T11:55:00Z">
    <saml:Issuer>https://innskraning.island.is</saml:Issuer>{assertion_sig}
    <saml:Subject><saml:NameID>0101302989</saml:NameID></saml:Subject>
    <saml:Conditions NotBefore="{not_before}" NotOnOrAfter="{not_on_or_after}">
      <saml:AudienceRestriction><saml:Audience>{audience}</saml:Audience></saml:AudienceRestriction>
    </saml:Conditions>
    <saml:AttributeStatement>{attributes}
    </saml:AttributeStatement>
  </saml:Assertion>
</samlp:Response>"#,
            audience = self.audience,
            not_before = self.not_before,
            not_on_or_after = self.not_on_or_after,
        )
    }

    /// The response signed with `key`.
    pub fn sign_with(&self, key: &RsaPrivateKey) -> String {
        islandis::dsig::sign::sign_template(
            &self.template(),
            &SigningKey::Rsa(key.clone()),
            &["ID"],
        )
        .unwrap()
    }

    /// The response signed with the leaf key.
    pub fn sign(&self) -> String {
        self.sign_with(leaf_key())
    }
}

pub fn token(xml: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(xml)
}
