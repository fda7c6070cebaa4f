#![forbid(unsafe_code)]

//! Attributes of a verified assertion.

use islandis_core::ns;
use islandis_dsig::KeySource;
use islandis_xml::xpath::{find_child_element, is_named, text_content};
use roxmltree::Node;

use crate::config::AttributeNames;

/// First `AttributeValue` of the named `saml:Attribute` anywhere under
/// `assertion`.
pub(crate) fn attribute_value(assertion: Node<'_, '_>, name: &str) -> Option<String> {
    assertion
        .descendants()
        .find(|n| {
            is_named(n, ns::SAML_ASSERTION, ns::node::ATTRIBUTE)
                && n.attribute(ns::attr::NAME) == Some(name)
        })
        .and_then(|attr| find_child_element(attr, ns::SAML_ASSERTION, ns::node::ATTRIBUTE_VALUE))
        .map(text_content)
}

/// The outcome of a successful verification.
///
/// Holds copies of the assertion's attributes; the document itself does
/// not outlive the `verify` call.
#[derive(Debug, Clone)]
pub struct VerifiedAssertion {
    attributes: Vec<(String, String)>,
    names: AttributeNames,
    key_source: KeySource,
}

impl VerifiedAssertion {
    pub(crate) fn collect(
        assertion: Node<'_, '_>,
        names: &AttributeNames,
        key_source: KeySource,
    ) -> Self {
        let mut attributes: Vec<(String, String)> = Vec::new();
        for attr in assertion
            .descendants()
            .filter(|n| is_named(n, ns::SAML_ASSERTION, ns::node::ATTRIBUTE))
        {
            let Some(name) = attr.attribute(ns::attr::NAME) else {
                continue;
            };
            if attributes.iter().any(|(seen, _)| seen == name) {
                continue;
            }
            if let Some(value) = attribute_value(assertion, name) {
                attributes.push((name.to_owned(), value));
            }
        }
        Self {
            attributes,
            names: names.clone(),
            key_source,
        }
    }

    /// Value of the named attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Where the key that verified the signature came from.
    pub fn key_source(&self) -> KeySource {
        self.key_source
    }

    pub fn identity(&self) -> Identity {
        let value = |name: &str| self.get(name).unwrap_or_default().to_owned();
        let names = &self.names;
        Identity {
            name: value(&names.name),
            ssn: value(&names.ssn),
            authentication_method: value(&names.authentication),
            ip_address: value(&names.ip_address),
            user_agent: value(&names.user_agent),
            company_ssn: value(&names.company_ssn),
            company_name: value(&names.company_name),
            destination_ssn: value(&names.destination_ssn),
            auth_id: value(&names.auth_id),
            mobile: value(&names.mobile),
        }
    }
}

/// The authenticated person. Absent attributes are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    /// Kennitala of the person.
    pub ssn: String,
    pub authentication_method: String,
    pub ip_address: String,
    pub user_agent: String,
    /// Kennitala of the legal entity acted for, if any.
    pub company_ssn: String,
    pub company_name: String,
    pub destination_ssn: String,
    pub auth_id: String,
    pub mobile: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASSERTION: &str = r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion">
  <saml:AttributeStatement>
    <saml:Attribute Name="UserSSN"><saml:AttributeValue>0101302989</saml:AttributeValue></saml:Attribute>
    <saml:Attribute Name="Name"><saml:AttributeValue>Gervimaður Færeyjar</saml:AttributeValue></saml:Attribute>
    <saml:Attribute Name="UserSSN"><saml:AttributeValue>9999999999</saml:AttributeValue></saml:Attribute>
    <saml:Attribute Name="Empty"/>
  </saml:AttributeStatement>
</saml:Assertion>"#;

    fn collect() -> VerifiedAssertion {
        let doc = roxmltree::Document::parse(ASSERTION).unwrap();
        VerifiedAssertion::collect(
            doc.root_element(),
            &AttributeNames::default(),
            KeySource::X509Certificate,
        )
    }

    #[test]
    fn test_first_value_wins() {
        let verified = collect();
        assert_eq!(verified.get("UserSSN"), Some("0101302989"));
        assert_eq!(verified.get("Empty"), None);
        assert_eq!(verified.get("Mobile"), None);
        let names: Vec<&str> = verified.attributes().map(|(n, _)| n).collect();
        assert_eq!(names, ["UserSSN", "Name"]);
    }

    #[test]
    fn test_identity_mapping() {
        let identity = collect().identity();
        assert_eq!(identity.ssn, "0101302989");
        assert_eq!(identity.name, "Gervimaður Færeyjar");
        assert_eq!(identity.mobile, "");
    }
}
