//! Response envelope and payloads.

use serde::{Deserialize, Serialize};

use crate::dto::{ContentItemDto, FeatureProgressDto};

/// Envelope used by every service response.
///
/// `success` is optional because some endpoints (session open) only return
/// `data`. An explicit `success: false` is a failure even if `data` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Why an envelope could not be unwrapped into its payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Service reported failure: {0}")]
    Unsuccessful(String),
    #[error("Response carried no data")]
    MissingData,
}

impl<T> ApiResponse<T> {
    pub fn into_data(self) -> Result<T, EnvelopeError> {
        if self.success == Some(false) {
            return Err(EnvelopeError::Unsuccessful(
                self.error.unwrap_or_else(|| "no error message".to_string()),
            ));
        }
        self.data.ok_or(EnvelopeError::MissingData)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedData {
    #[serde(default)]
    pub videos: Vec<ContentItemDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionData {
    pub session_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureProgressData {
    #[serde(default)]
    pub progress: Vec<FeatureProgressDto>,
}
