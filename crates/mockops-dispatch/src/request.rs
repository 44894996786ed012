//! Inbound mock request

use crate::operation::OperationBinding;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Unique request identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Generate new request id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request handed to a mock operation by the transport layer
#[derive(Debug, Clone, Serialize)]
pub struct MockRequest {
    id: RequestId,
    /// HTTP method (informational)
    pub method: String,
    /// Request path
    pub path: String,
    /// Request headers
    pub headers: BTreeMap<String, String>,
    /// Raw body
    pub body: String,
    operation: Option<OperationBinding>,
}

impl MockRequest {
    /// Create a POST request to `/` with this body
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            id: RequestId::new(),
            method: "POST".to_string(),
            path: "/".to_string(),
            headers: BTreeMap::new(),
            body: body.into(),
            operation: None,
        }
    }

    /// Set path
    #[inline]
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set method
    #[inline]
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Add a header
    #[inline]
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Request id
    #[inline]
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Header value by case-insensitive name
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Operation resolved by the dispatcher, once dispatch has started
    #[inline]
    #[must_use]
    pub fn operation(&self) -> Option<&OperationBinding> {
        self.operation.as_ref()
    }

    /// Bind the resolved operation
    pub fn set_operation(&mut self, binding: OperationBinding) {
        self.operation = Some(binding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let req = MockRequest::new("").with_header("SOAPAction", "urn:get");
        assert_eq!(req.header("soapaction"), Some("urn:get"));
        assert_eq!(req.header("missing"), None);
    }

    #[test]
    fn new_request_is_unbound() {
        let req = MockRequest::new("<a/>").with_path("/svc").with_method("PUT");
        assert!(req.operation().is_none());
        assert_eq!(req.path, "/svc");
        assert_eq!(req.method, "PUT");
    }
}
