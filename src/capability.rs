//! NETCONF capability URI sets.

/// An ordered set of NETCONF capability URIs.
///
/// Capability URIs may carry a query-string of parameters (for example
/// `urn:ietf:params:netconf:capability:startup:1.0?module=...`); membership
/// tests compare only the part before any `?`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Capabilities(Vec<String>);

impl Capabilities {
    pub fn new() -> Capabilities {
        Capabilities::default()
    }

    /// Returns true if `uri` is in the set, ignoring any query portion on
    /// either side.
    pub fn has(&self, uri: &str) -> bool {
        let key = capability_key(uri);
        self.0.iter().any(|c| capability_key(c) == key)
    }

    pub fn push(&mut self, uri: impl Into<String>) {
        self.0.push(uri.into());
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for Capabilities {
    fn from(uris: Vec<String>) -> Capabilities {
        Capabilities(uris)
    }
}

impl FromIterator<String> for Capabilities {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Capabilities {
        Capabilities(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Capabilities {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The identifying part of a capability URI: everything before the first
/// `?`, per the RFC 6241 capability URI format.
fn capability_key(uri: &str) -> &str {
    match uri.find('?') {
        Some(idx) => &uri[..idx],
        None => uri,
    }
}
