//! Signature-wrapping attempts: a valid signature must never lend its
//! trust to an unsigned assertion.

mod common;

use common::*;
use islandis::{Error, ErrorKind, Stage};

const EVIL: &str = r#"<saml:Assertion ID="_evil" Version="2.0" IssueInstant="2024-06-01T11:55:00Z"><saml:Issuer>https://innskraning.island.is</saml:Issuer><saml:Conditions NotBefore="2024-06-01T11:55:00Z" NotOnOrAfter="2024-06-01T12:05:00Z"><saml:AudienceRestriction><saml:Audience>https://minarsidur.example.is/saml</saml:Audience></saml:AudienceRestriction></saml:Conditions><saml:AttributeStatement><saml:Attribute Name="UserSSN"><saml:AttributeValue>9999999999</saml:AttributeValue></saml:Attribute><saml:Attribute Name="UserAgent"><saml:AttributeValue>Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0</saml:AttributeValue></saml:Attribute></saml:AttributeStatement></saml:Assertion>"#;

fn assert_rejected(xml: &str) -> Error {
    let dir = cert_dir();
    let verifier = verifier_at(dir.path(), now());
    let mut seen = Vec::new();
    let err = verifier
        .verify_observed(&token(xml), Some(USER_AGENT), &mut |s| seen.push(s))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReferenceIntegrity, "{err}");
    assert!(!seen.contains(&Stage::SignatureVerified));
    err
}

fn signed_assertion_span(xml: &str) -> (usize, usize) {
    let start = xml.find("<saml:Assertion ").unwrap();
    let end = xml.find("</saml:Assertion>").unwrap() + "</saml:Assertion>".len();
    (start, end)
}

#[test]
fn test_unsigned_assertion_before_signed_one() {
    let xml = ResponseSpec::default().sign();
    let (start, _) = signed_assertion_span(&xml);
    let wrapped = format!("{}{EVIL}\n  {}", &xml[..start], &xml[start..]);
    let err = assert_rejected(&wrapped);
    assert!(err.to_string().contains("exactly one assertion"), "{err}");
}

#[test]
fn test_unsigned_assertion_after_signed_one() {
    let xml = ResponseSpec::default().sign();
    let (_, end) = signed_assertion_span(&xml);
    let wrapped = format!("{}{EVIL}{}", &xml[..end], &xml[end..]);
    assert_rejected(&wrapped);
}

#[test]
fn test_signed_assertion_moved_into_extensions() {
    let xml = ResponseSpec::default().sign();
    let (start, end) = signed_assertion_span(&xml);
    let wrapped = format!(
        "{}<samlp:Extensions>{}</samlp:Extensions>{EVIL}{}",
        &xml[..start],
        &xml[start..end],
        &xml[end..]
    );
    assert_rejected(&wrapped);
}

#[test]
fn test_signed_assertion_moved_and_replaced() {
    // Only the unsigned assertion stays a child of the Response; the signed
    // one hides inside it, where the ID still resolves.
    let xml = ResponseSpec::default().sign();
    let (start, end) = signed_assertion_span(&xml);
    let evil_with_hidden = EVIL.replace(
        "</saml:Assertion>",
        &format!("<saml:Advice>{}</saml:Advice></saml:Assertion>", &xml[start..end]),
    );
    let wrapped = format!("{}{evil_with_hidden}{}", &xml[..start], &xml[end..]);
    assert_rejected(&wrapped);
}

#[test]
fn test_duplicate_reference_id() {
    let xml = ResponseSpec::default().sign();
    let (start, _) = signed_assertion_span(&xml);
    let evil = EVIL.replace("_evil", ASSERTION_ID);
    let wrapped = format!("{}<samlp:Extensions>{evil}</samlp:Extensions>{}", &xml[..start], &xml[start..]);
    let err = assert_rejected(&wrapped);
    assert!(err.to_string().contains("Reference Validation Failed"));
}

#[test]
fn test_response_signature_with_unsigned_assertion_swapped_in() {
    let spec = ResponseSpec {
        signed: Signed::Response,
        ..ResponseSpec::default()
    };
    let xml = spec.sign();
    let (start, end) = signed_assertion_span(&xml);
    let swapped = format!("{}{EVIL}{}", &xml[..start], &xml[end..]);
    let err = assert_rejected(&swapped);
    assert!(err.to_string().contains("digest mismatch"), "{err}");
}

#[test]
fn test_signature_not_enveloped_by_reference() {
    // Move the assertion's signature up to the Response while it still
    // points at the assertion.
    let xml = ResponseSpec::default().sign();
    let sig_start = xml.find("<ds:Signature ").unwrap();
    let sig_end = xml.find("</ds:Signature>").unwrap() + "</ds:Signature>".len();
    let signature = &xml[sig_start..sig_end];
    let without = format!("{}{}", &xml[..sig_start], &xml[sig_end..]);
    let issuer_end = without.find("</saml:Issuer>").unwrap() + "</saml:Issuer>".len();
    let moved = format!("{}{signature}{}", &without[..issuer_end], &without[issuer_end..]);
    let err = assert_rejected(&moved);
    assert!(err.to_string().contains("enveloped"), "{err}");
}

#[test]
fn test_two_references_rejected() {
    let xml = ResponseSpec::default().sign();
    let ref_start = xml.find("<ds:Reference ").unwrap();
    let ref_end = xml.find("</ds:Reference>").unwrap() + "</ds:Reference>".len();
    let extra = xml[ref_start..ref_end].replace(ASSERTION_ID, RESPONSE_ID);
    let doubled = format!("{}{extra}{}", &xml[..ref_end], &xml[ref_end..]);
    let err = assert_rejected(&doubled);
    assert!(err.to_string().contains("exactly one Reference"), "{err}");
}

#[test]
fn test_foreign_transform_rejected() {
    let xml = ResponseSpec::default().sign().replace(
        "http://www.w3.org/2000/09/xmldsig#enveloped-signature",
        "http://www.w3.org/TR/1999/REC-xslt-19991116",
    );
    assert_rejected(&xml);
}
