//! The `<hello>` document exchanged at session start.

use crate::capability::Capabilities;
use crate::error::Result;
use crate::NETCONF_URN;
use core::fmt;
use core::fmt::Display;
use serde_derive::{Deserialize, Serialize};

/// The NETCONF `<hello>` element.
///
/// Used in both directions: [`Hello::new`] builds the local hello for
/// serialization via [`Display`], [`Hello::parse`] reads a peer's hello.
/// Fields are optional on the way in so the session layer can report
/// precise validation errors instead of a generic parse failure.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename = "hello")]
pub struct Hello {
    #[serde(rename = "@xmlns", skip_serializing_if = "Option::is_none")]
    xmlns: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    capabilities: Option<CapabilityList>,
    #[serde(rename = "session-id", skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct CapabilityList {
    capability: Vec<String>,
}

impl Hello {
    /// Builds the local `<hello>`. The `<session-id>` element is included
    /// iff `session_id` is non-zero (server sessions only).
    pub fn new(capabilities: &Capabilities, session_id: u32) -> Hello {
        Hello {
            xmlns: Some(NETCONF_URN.to_string()),
            capabilities: Some(CapabilityList {
                capability: capabilities.iter().cloned().collect(),
            }),
            session_id: (session_id != 0).then(|| session_id.to_string()),
        }
    }

    pub fn parse(doc: &str) -> Result<Hello> {
        Ok(quick_xml::de::from_str(doc.trim())?)
    }

    /// Whether the element carried the NETCONF base namespace.
    pub fn is_netconf(&self) -> bool {
        self.xmlns.as_deref() == Some(NETCONF_URN)
    }

    /// The advertised capability URIs, trimmed of surrounding whitespace,
    /// with empty entries discarded.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
            .iter()
            .flat_map(|list| list.capability.iter())
            .map(|uri| uri.trim())
            .filter(|uri| !uri.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The raw `<session-id>` content, if the element was present.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}

impl Display for Hello {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use serde::Serialize;
        let mut buffer = String::with_capacity(206);
        let ser = quick_xml::se::Serializer::new(&mut buffer);
        self.serialize(ser).unwrap();
        write!(f, "{}", buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NETCONF_BASE_10_CAP, NETCONF_BASE_11_CAP};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serialize_client_hello() {
        let expected = r#"<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"><capabilities><capability>urn:ietf:params:netconf:base:1.0</capability><capability>urn:ietf:params:netconf:base:1.1</capability></capabilities></hello>"#;
        let caps: Capabilities = vec![
            NETCONF_BASE_10_CAP.to_string(),
            NETCONF_BASE_11_CAP.to_string(),
        ]
        .into();
        assert_eq!(expected, Hello::new(&caps, 0).to_string());
    }

    #[test]
    fn test_serialize_server_hello() {
        let expected = r#"<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"><capabilities><capability>urn:ietf:params:netconf:base:1.1</capability></capabilities><session-id>42</session-id></hello>"#;
        let caps: Capabilities = vec![NETCONF_BASE_11_CAP.to_string()].into();
        assert_eq!(expected, Hello::new(&caps, 42).to_string());
    }

    #[test]
    fn test_parse_peer_hello() {
        let hello = Hello::parse(
            r#"
<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
<capabilities>
	<capability>
		urn:ietf:params:netconf:base:1.1
	</capability>
	<capability>urn:ietf:params:netconf:base:1.0</capability>
</capabilities>
<session-id>123</session-id>
</hello>"#,
        )
        .unwrap();
        assert!(hello.is_netconf());
        let caps = hello.capabilities();
        assert!(caps.has(NETCONF_BASE_11_CAP));
        assert!(caps.has(NETCONF_BASE_10_CAP));
        assert_eq!(2, caps.len());
        assert_eq!(Some("123"), hello.session_id());
    }

    #[test]
    fn test_parse_foreign_element() {
        let hello = Hello::parse("<foo></foo>").unwrap();
        assert!(!hello.is_netconf());
        assert!(hello.capabilities().is_empty());
        assert_eq!(None, hello.session_id());
    }

    #[test]
    fn test_parse_empty_capabilities() {
        let hello = Hello::parse(
            r#"<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"><capabilities><capability></capability></capabilities></hello>"#,
        )
        .unwrap();
        assert!(hello.is_netconf());
        assert!(hello.capabilities().is_empty());
    }
}
