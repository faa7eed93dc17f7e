//! The `{ success, data, error }` wrapper every endpoint responds with.

use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResult};

/// Message used when a failed envelope carries no error text.
const DEFAULT_FAILURE_MESSAGE: &str = "Request failed";

/// Uniform response shape for every remote call.
///
/// A successful envelope carries `data`; a failed one carries a
/// human-readable `error`. Some endpoints add an informational `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }

    /// Error text of a failed envelope, with a generic fallback.
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or(DEFAULT_FAILURE_MESSAGE)
    }

    /// Convert into a `Result`, treating `success: false` as
    /// [`ApiError::Rejected`] and a successful envelope without data as an
    /// invalid response.
    pub fn into_result(self) -> ApiResult<T> {
        if !self.success {
            return Err(ApiError::Rejected(self.error_message().to_string()));
        }
        self.data
            .ok_or_else(|| ApiError::InvalidResponse("Successful response without data".to_string()))
    }
}

impl<T> From<ApiResult<T>> for ApiEnvelope<T> {
    fn from(result: ApiResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failure(e.user_message()),
        }
    }
}
