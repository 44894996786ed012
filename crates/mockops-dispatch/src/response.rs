//! Response definitions and their execution contract

use crate::error::BoxError;
use crate::request::MockRequest;
use crate::result::{MockResult, ResponseOutput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_status() -> u16 {
    200
}

/// Named response entry of a [`crate::ResponseStore`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDefinition {
    /// Unique name within the owning store
    pub name: String,

    /// Opaque payload
    #[serde(default)]
    pub content: String,

    /// HTTP status to answer with
    #[serde(default = "default_status")]
    pub http_status: u16,

    /// Content type, if overridden
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Extra response headers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl ResponseDefinition {
    /// Create response with content and status 200
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            http_status: default_status(),
            content_type: None,
            headers: BTreeMap::new(),
        }
    }

    /// Set status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = status;
        self
    }

    /// Set content type
    #[inline]
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Add a header
    #[inline]
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Executes a selected response into a result
pub trait ResponseHandler: Send + Sync + std::fmt::Debug {
    /// Produce the response output for `request`
    ///
    /// # Errors
    /// Any failure; the dispatcher wraps it as
    /// [`crate::DispatchError::ExecutionFailure`].
    fn execute(
        &self,
        response: &ResponseDefinition,
        request: &MockRequest,
        result: &MockResult,
    ) -> Result<(), BoxError>;
}

/// Answers with the stored content verbatim
#[derive(Debug, Clone, Default)]
pub struct StaticResponseHandler {
    default_content_type: Option<String>,
}

impl StaticResponseHandler {
    /// Create handler
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type used when a response does not set one
    #[inline]
    #[must_use]
    pub fn with_default_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.default_content_type = Some(content_type.into());
        self
    }
}

impl ResponseHandler for StaticResponseHandler {
    fn execute(
        &self,
        response: &ResponseDefinition,
        _request: &MockRequest,
        result: &MockResult,
    ) -> Result<(), BoxError> {
        let output = ResponseOutput {
            status: response.http_status,
            content_type: response
                .content_type
                .clone()
                .or_else(|| self.default_content_type.clone()),
            headers: response.headers.clone(),
            body: response.content.clone(),
        };
        result.set_output(output)?;
        Ok(())
    }
}
