//! NETCONF `<rpc-error>` values.
//!
//! The structured error taxonomy of RFC 6241 Appendix A, used by higher
//! layers to report protocol and application errors over an established
//! session. Constructors exist for every defined error-tag and pre-fill
//! the mandatory `error-info` members; tags with a mandatory error-type
//! (`lock-denied`, `data-exists`, `data-missing`, `malformed-message`)
//! cannot have it overridden.

use core::fmt;
use core::fmt::Display;
use quick_xml::escape::escape;
use serde_derive::Deserialize;

/// The NETCONF error-type enumerate: the conceptual layer the error
/// occurred at.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    #[default]
    Application,
    Protocol,
    Rpc,
    Transport,
}

impl Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorType::Application => write!(f, "application"),
            ErrorType::Protocol => write!(f, "protocol"),
            ErrorType::Rpc => write!(f, "rpc"),
            ErrorType::Transport => write!(f, "transport"),
        }
    }
}

/// The NETCONF error-severity enumerate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    #[default]
    Error,
    Warning,
}

impl Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Warning => write!(f, "warning"),
        }
    }
}

/// The error-tag values defined in RFC 6241 Appendix A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorTag {
    InUse,
    InvalidValue,
    TooBig,
    MissingAttribute,
    BadAttribute,
    UnknownAttribute,
    MissingElement,
    BadElement,
    UnknownElement,
    UnknownNamespace,
    AccessDenied,
    LockDenied,
    ResourceDenied,
    RollbackFailed,
    DataExists,
    DataMissing,
    OperationNotSupported,
    OperationFailed,
    MalformedMessage,
}

impl ErrorTag {
    /// The error-type mandated by RFC 6241 for this tag, if any.
    pub fn mandatory_type(&self) -> Option<ErrorType> {
        match self {
            ErrorTag::LockDenied => Some(ErrorType::Protocol),
            ErrorTag::DataExists | ErrorTag::DataMissing => Some(ErrorType::Application),
            ErrorTag::MalformedMessage => Some(ErrorType::Rpc),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ErrorTag::InUse => "in-use",
            ErrorTag::InvalidValue => "invalid-value",
            ErrorTag::TooBig => "too-big",
            ErrorTag::MissingAttribute => "missing-attribute",
            ErrorTag::BadAttribute => "bad-attribute",
            ErrorTag::UnknownAttribute => "unknown-attribute",
            ErrorTag::MissingElement => "missing-element",
            ErrorTag::BadElement => "bad-element",
            ErrorTag::UnknownElement => "unknown-element",
            ErrorTag::UnknownNamespace => "unknown-namespace",
            ErrorTag::AccessDenied => "access-denied",
            ErrorTag::LockDenied => "lock-denied",
            ErrorTag::ResourceDenied => "resource-denied",
            ErrorTag::RollbackFailed => "rollback-failed",
            ErrorTag::DataExists => "data-exists",
            ErrorTag::DataMissing => "data-missing",
            ErrorTag::OperationNotSupported => "operation-not-supported",
            ErrorTag::OperationFailed => "operation-failed",
            ErrorTag::MalformedMessage => "malformed-message",
        }
    }
}

impl Display for ErrorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Protocol-specific contents of `<error-info>`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ErrorInfo {
    pub bad_attribute: Option<String>,
    pub bad_element: Option<String>,
    pub bad_namespace: Option<String>,
    pub session_id: Option<String>,
}

/// A NETCONF error, renderable as an `<rpc-error>` element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename = "rpc-error", rename_all = "kebab-case")]
pub struct RpcError {
    pub error_type: ErrorType,
    pub error_tag: ErrorTag,
    pub error_severity: ErrorSeverity,
    pub error_app_tag: Option<String>,
    pub error_path: Option<String>,
    pub error_message: Option<String>,
    pub error_info: Option<ErrorInfo>,
}

impl RpcError {
    fn tagged(error_tag: ErrorTag) -> RpcError {
        RpcError {
            error_type: error_tag.mandatory_type().unwrap_or_default(),
            error_tag,
            error_severity: ErrorSeverity::Error,
            error_app_tag: None,
            error_path: None,
            error_message: None,
            error_info: None,
        }
    }

    pub fn in_use() -> RpcError {
        RpcError::tagged(ErrorTag::InUse)
    }

    pub fn invalid_value() -> RpcError {
        RpcError::tagged(ErrorTag::InvalidValue)
    }

    pub fn too_big() -> RpcError {
        RpcError::tagged(ErrorTag::TooBig)
    }

    pub fn missing_attribute(attribute: &str, element: &str) -> RpcError {
        RpcError::tagged(ErrorTag::MissingAttribute).with_info(ErrorInfo {
            bad_attribute: Some(attribute.to_string()),
            bad_element: Some(element.to_string()),
            ..ErrorInfo::default()
        })
    }

    pub fn bad_attribute(attribute: &str, element: &str) -> RpcError {
        RpcError::tagged(ErrorTag::BadAttribute).with_info(ErrorInfo {
            bad_attribute: Some(attribute.to_string()),
            bad_element: Some(element.to_string()),
            ..ErrorInfo::default()
        })
    }

    pub fn unknown_attribute(attribute: &str, element: &str) -> RpcError {
        RpcError::tagged(ErrorTag::UnknownAttribute).with_info(ErrorInfo {
            bad_attribute: Some(attribute.to_string()),
            bad_element: Some(element.to_string()),
            ..ErrorInfo::default()
        })
    }

    pub fn missing_element(element: &str) -> RpcError {
        RpcError::tagged(ErrorTag::MissingElement).with_info(ErrorInfo {
            bad_element: Some(element.to_string()),
            ..ErrorInfo::default()
        })
    }

    pub fn bad_element(element: &str) -> RpcError {
        RpcError::tagged(ErrorTag::BadElement).with_info(ErrorInfo {
            bad_element: Some(element.to_string()),
            ..ErrorInfo::default()
        })
    }

    pub fn unknown_element(element: &str) -> RpcError {
        RpcError::tagged(ErrorTag::UnknownElement).with_info(ErrorInfo {
            bad_element: Some(element.to_string()),
            ..ErrorInfo::default()
        })
    }

    pub fn unknown_namespace(element: &str, namespace: &str) -> RpcError {
        RpcError::tagged(ErrorTag::UnknownNamespace).with_info(ErrorInfo {
            bad_element: Some(element.to_string()),
            bad_namespace: Some(namespace.to_string()),
            ..ErrorInfo::default()
        })
    }

    pub fn access_denied() -> RpcError {
        RpcError::tagged(ErrorTag::AccessDenied)
    }

    /// `session_id` identifies the session holding the contested lock.
    pub fn lock_denied(session_id: u32) -> RpcError {
        RpcError::tagged(ErrorTag::LockDenied).with_info(ErrorInfo {
            session_id: Some(session_id.to_string()),
            ..ErrorInfo::default()
        })
    }

    pub fn resource_denied() -> RpcError {
        RpcError::tagged(ErrorTag::ResourceDenied)
    }

    pub fn rollback_failed() -> RpcError {
        RpcError::tagged(ErrorTag::RollbackFailed)
    }

    pub fn data_exists() -> RpcError {
        RpcError::tagged(ErrorTag::DataExists)
    }

    pub fn data_missing() -> RpcError {
        RpcError::tagged(ErrorTag::DataMissing)
    }

    pub fn operation_not_supported() -> RpcError {
        RpcError::tagged(ErrorTag::OperationNotSupported)
    }

    pub fn operation_failed() -> RpcError {
        RpcError::tagged(ErrorTag::OperationFailed)
    }

    pub fn malformed_message() -> RpcError {
        RpcError::tagged(ErrorTag::MalformedMessage)
    }

    pub fn with_message(mut self, message: &str) -> RpcError {
        self.error_message = Some(message.to_string());
        self
    }

    pub fn with_app_tag(mut self, app_tag: &str) -> RpcError {
        self.error_app_tag = Some(app_tag.to_string());
        self
    }

    pub fn with_path(mut self, path: &str) -> RpcError {
        self.error_path = Some(path.to_string());
        self
    }

    /// Sets the error-type, unless the tag mandates one.
    pub fn with_type(mut self, error_type: ErrorType) -> RpcError {
        if self.error_tag.mandatory_type().is_none() {
            self.error_type = error_type;
        }
        self
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> RpcError {
        self.error_severity = severity;
        self
    }

    pub fn with_info(mut self, info: ErrorInfo) -> RpcError {
        self.error_info = Some(info);
        self
    }

    /// Renders the error as an `<rpc-error>` element.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256);
        xml.push_str("<rpc-error>");
        element(&mut xml, "error-type", &self.error_type.to_string());
        element(&mut xml, "error-tag", self.error_tag.as_str());
        element(&mut xml, "error-severity", &self.error_severity.to_string());
        if let Some(app_tag) = &self.error_app_tag {
            element(&mut xml, "error-app-tag", app_tag);
        }
        if let Some(path) = &self.error_path {
            element(&mut xml, "error-path", path);
        }
        if let Some(message) = &self.error_message {
            element(&mut xml, "error-message", message);
        }
        if let Some(info) = &self.error_info {
            xml.push_str("<error-info>");
            if let Some(attribute) = &info.bad_attribute {
                element(&mut xml, "bad-attribute", attribute);
            }
            if let Some(elem) = &info.bad_element {
                element(&mut xml, "bad-element", elem);
            }
            if let Some(namespace) = &info.bad_namespace {
                element(&mut xml, "bad-namespace", namespace);
            }
            if let Some(session_id) = &info.session_id {
                element(&mut xml, "session-id", session_id);
            }
            xml.push_str("</error-info>");
        }
        xml.push_str("</rpc-error>");
        xml
    }
}

fn element(xml: &mut String, name: &str, value: &str) {
    xml.push('<');
    xml.push_str(name);
    xml.push('>');
    xml.push_str(&escape(value));
    xml.push_str("</");
    xml.push_str(name);
    xml.push('>');
}

impl Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error tag:{}", self.error_type, self.error_tag)?;
        if let Some(app_tag) = &self.error_app_tag {
            write!(f, " app-tag:{}", app_tag)?;
        }
        if let Some(path) = &self.error_path {
            write!(f, " path:{}", path)?;
        }
        if let Some(info) = &self.error_info {
            if let Some(attribute) = &info.bad_attribute {
                write!(f, " bad-attribute:{}", attribute)?;
            }
            if let Some(element) = &info.bad_element {
                write!(f, " bad-element:{}", element)?;
            }
            if let Some(namespace) = &info.bad_namespace {
                write!(f, " bad-namespace:{}", namespace)?;
            }
            if let Some(session_id) = &info.session_id {
                write!(f, " session-id:{}", session_id)?;
            }
        }
        if let Some(message) = &self.error_message {
            write!(f, " {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for RpcError {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quick_xml::de::from_str;

    #[test]
    fn test_mandatory_types() {
        assert_eq!(ErrorType::Protocol, RpcError::lock_denied(42).error_type);
        assert_eq!(ErrorType::Application, RpcError::data_exists().error_type);
        assert_eq!(ErrorType::Application, RpcError::data_missing().error_type);
        assert_eq!(ErrorType::Rpc, RpcError::malformed_message().error_type);

        // a mandated type cannot be overridden
        let err = RpcError::lock_denied(42).with_type(ErrorType::Application);
        assert_eq!(ErrorType::Protocol, err.error_type);
        let err = RpcError::too_big().with_type(ErrorType::Transport);
        assert_eq!(ErrorType::Transport, err.error_type);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            "protocol error tag:lock-denied session-id:42",
            RpcError::lock_denied(42).to_string()
        );
        assert_eq!(
            "application error tag:bad-element bad-element:startu bummer",
            RpcError::bad_element("startu").with_message("bummer").to_string()
        );
    }

    #[test]
    fn test_to_xml() {
        let expected = "<rpc-error>\
<error-type>protocol</error-type>\
<error-tag>lock-denied</error-tag>\
<error-severity>error</error-severity>\
<error-info><session-id>42</session-id></error-info>\
</rpc-error>";
        assert_eq!(expected, RpcError::lock_denied(42).to_xml());
    }

    #[test]
    fn test_deserialize_rpc_error() {
        let err: RpcError = from_str(
            r#"
<rpc-error>
  <error-type>protocol</error-type>
  <error-tag>bad-element</error-tag>
  <error-severity>error</error-severity>
  <error-message>Element is not valid in the specified context.</error-message>
  <error-info>
    <bad-element>startu</bad-element>
  </error-info>
</rpc-error>"#,
        )
        .unwrap();
        assert_eq!(ErrorType::Protocol, err.error_type);
        assert_eq!(ErrorTag::BadElement, err.error_tag);
        assert_eq!(ErrorSeverity::Error, err.error_severity);
        assert_eq!(
            Some("startu".to_string()),
            err.error_info.unwrap().bad_element
        );
    }
}
