//! Mock dispatch result
//!
//! Each field is write-once; a fresh [`MockResult`] is built per dispatch.

use crate::error::ResultError;
use crate::operation::OperationBinding;
use crate::request::{MockRequest, RequestId};
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// What the executed response produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseOutput {
    /// HTTP status
    pub status: u16,
    /// Content type, if any
    pub content_type: Option<String>,
    /// Response headers
    pub headers: BTreeMap<String, String>,
    /// Response body
    pub body: String,
}

/// Result of one dispatch
#[derive(Debug)]
pub struct MockResult {
    request_id: RequestId,
    timestamp: DateTime<Utc>,
    mock_operation: OnceCell<String>,
    operation: OnceCell<OperationBinding>,
    response: OnceCell<String>,
    output: OnceCell<ResponseOutput>,
    time_taken: OnceCell<Duration>,
}

fn set_once<T>(cell: &OnceCell<T>, value: T, field: &'static str) -> Result<(), ResultError> {
    cell.set(value).map_err(|_| ResultError(field))
}

impl MockResult {
    /// Create empty result for a request
    #[must_use]
    pub fn new(request: &MockRequest) -> Self {
        Self {
            request_id: request.id(),
            timestamp: Utc::now(),
            mock_operation: OnceCell::new(),
            operation: OnceCell::new(),
            response: OnceCell::new(),
            output: OnceCell::new(),
            time_taken: OnceCell::new(),
        }
    }

    /// Request this result answers
    #[inline]
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Creation time
    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Record the mock operation and its resolved binding
    ///
    /// # Errors
    /// `ResultError` if already recorded
    pub fn set_mock_operation(
        &self,
        name: impl Into<String>,
        binding: OperationBinding,
    ) -> Result<(), ResultError> {
        set_once(&self.mock_operation, name.into(), "mock_operation")?;
        set_once(&self.operation, binding, "operation")
    }

    /// Record the selected response name
    ///
    /// # Errors
    /// `ResultError` if already recorded
    pub fn set_response(&self, name: impl Into<String>) -> Result<(), ResultError> {
        set_once(&self.response, name.into(), "response")
    }

    /// Record the response output
    ///
    /// # Errors
    /// `ResultError` if already recorded
    pub fn set_output(&self, output: ResponseOutput) -> Result<(), ResultError> {
        set_once(&self.output, output, "output")
    }

    /// Record elapsed dispatch time
    ///
    /// # Errors
    /// `ResultError` if already recorded
    pub fn set_time_taken(&self, elapsed: Duration) -> Result<(), ResultError> {
        set_once(&self.time_taken, elapsed, "time_taken")
    }

    /// Mock operation name
    #[inline]
    #[must_use]
    pub fn mock_operation(&self) -> Option<&str> {
        self.mock_operation.get().map(String::as_str)
    }

    /// Resolved operation binding
    #[inline]
    #[must_use]
    pub fn operation(&self) -> Option<&OperationBinding> {
        self.operation.get()
    }

    /// Selected response name
    #[inline]
    #[must_use]
    pub fn response_name(&self) -> Option<&str> {
        self.response.get().map(String::as_str)
    }

    /// Response output
    #[inline]
    #[must_use]
    pub fn output(&self) -> Option<&ResponseOutput> {
        self.output.get()
    }

    /// Elapsed dispatch time
    #[inline]
    #[must_use]
    pub fn time_taken(&self) -> Option<Duration> {
        self.time_taken.get().copied()
    }

    /// Serializable view
    #[must_use]
    pub fn summary(&self) -> ResultSummary {
        let binding = self.operation();
        ResultSummary {
            request_id: self.request_id,
            timestamp: self.timestamp,
            mock_operation: self.mock_operation().map(str::to_string),
            interface: binding.and_then(|b| b.interface_name.clone()),
            operation: binding.and_then(|b| b.operation_name.clone()),
            response: self.response_name().map(str::to_string),
            output: self.output().cloned(),
            time_taken_ms: self
                .time_taken()
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
        }
    }
}

/// Flattened, serializable form of a [`MockResult`]
#[derive(Debug, Clone, Serialize)]
pub struct ResultSummary {
    /// Request id
    pub request_id: RequestId,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Mock operation name
    pub mock_operation: Option<String>,
    /// Bound interface name
    pub interface: Option<String>,
    /// Bound operation name
    pub operation: Option<String>,
    /// Selected response
    pub response: Option<String>,
    /// Output
    pub output: Option<ResponseOutput>,
    /// Elapsed milliseconds
    pub time_taken_ms: Option<u64>,
}
