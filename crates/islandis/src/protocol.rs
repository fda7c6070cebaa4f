#![forbid(unsafe_code)]

//! Protocol checks on the signed assertion: audience, validity window and
//! the caller's user agent.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use islandis_core::{ns, Error, ProtocolError};
use islandis_xml::xpath::{find_child_element, find_path, text_content};
use roxmltree::Node;

use crate::identity::attribute_value;

/// Formats accepted for timestamps that carry no UTC offset.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone)]
pub struct ProtocolValidator {
    audience: String,
    timezone: FixedOffset,
    user_agent_attribute: String,
}

impl ProtocolValidator {
    pub fn new(
        audience: impl Into<String>,
        timezone: FixedOffset,
        user_agent_attribute: impl Into<String>,
    ) -> Self {
        Self {
            audience: audience.into(),
            timezone,
            user_agent_attribute: user_agent_attribute.into(),
        }
    }

    /// Check the assertion against `now` and the caller's user agent.
    ///
    /// A missing `user_agent` is compared as the empty string.
    pub fn validate(
        &self,
        assertion: Node<'_, '_>,
        now: DateTime<Utc>,
        user_agent: Option<&str>,
    ) -> Result<(), Error> {
        let conditions = find_child_element(assertion, ns::SAML_ASSERTION, ns::node::CONDITIONS)
            .ok_or_else(|| ProtocolError::MissingData(vec!["Conditions".into()]))?;
        self.check_audience(conditions)?;
        self.check_window(conditions, now)?;
        self.check_user_agent(assertion, user_agent.unwrap_or(""))
    }

    fn check_audience(&self, conditions: Node<'_, '_>) -> Result<(), Error> {
        let got = find_path(
            conditions,
            ns::SAML_ASSERTION,
            &[ns::node::AUDIENCE_RESTRICTION, ns::node::AUDIENCE],
        )
        .map(text_content)
        .unwrap_or_default();
        if got != self.audience {
            return Err(ProtocolError::InvalidAudience {
                expected: self.audience.clone(),
                got,
            }
            .into());
        }
        Ok(())
    }

    fn check_window(&self, conditions: Node<'_, '_>, now: DateTime<Utc>) -> Result<(), Error> {
        let not_before = conditions.attribute(ns::attr::NOT_BEFORE).unwrap_or("");
        let not_on_or_after = conditions.attribute(ns::attr::NOT_ON_OR_AFTER).unwrap_or("");
        if not_before.is_empty() || not_on_or_after.is_empty() {
            return Err(ProtocolError::MissingData(vec![
                "NotBefore".into(),
                "NotOnOrAfter".into(),
            ])
            .into());
        }

        let start = parse_time(not_before, self.timezone).ok_or(ProtocolError::DateInvalid)?;
        let end = parse_time(not_on_or_after, self.timezone).ok_or(ProtocolError::DateInvalid)?;
        if !(start < now && now < end) {
            tracing::debug!(%start, %end, %now, "assertion outside its validity window");
            return Err(ProtocolError::NotWithinTimeframe.into());
        }
        Ok(())
    }

    fn check_user_agent(&self, assertion: Node<'_, '_>, expected: &str) -> Result<(), Error> {
        match attribute_value(assertion, &self.user_agent_attribute) {
            Some(got) if got == expected => Ok(()),
            got => Err(ProtocolError::UserAgent {
                expected: expected.to_owned(),
                got: got.unwrap_or_default(),
            }
            .into()),
        }
    }
}

/// Parse an xs:dateTime, reading offset-less values in `timezone`.
pub fn parse_time(value: &str, timezone: FixedOffset) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .and_then(|naive| naive.and_local_timezone(timezone).single())
        .map(|t| t.with_timezone(&Utc))
}
