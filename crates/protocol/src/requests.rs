//! Request bodies sent to the remote services.

use serde::{Deserialize, Serialize};

use explore_domain::{
    CategoryId, ContentId, DeviceClass, EngagementEvent, EngagementType, OnboardingEventType,
    SessionId,
};

/// Feed fetch. `offset` is always 0 in practice; pagination is by exclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRequest {
    pub session_history: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    pub limit: u32,
    pub offset: u32,
}

impl FeedRequest {
    pub fn new(
        history: &[ContentId],
        category_id: Option<CategoryId>,
        limit: u32,
        offset: u32,
    ) -> Self {
        Self {
            session_history: history.iter().map(|id| id.get()).collect(),
            category_id: category_id.map(CategoryId::get),
            limit,
            offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    pub device_type: DeviceClass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseSessionRequest {
    pub session_id: i64,
}

impl From<SessionId> for CloseSessionRequest {
    fn from(id: SessionId) -> Self {
        Self {
            session_id: id.get(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEngagementRequest {
    pub content_id: i64,
    pub engagement_type: EngagementType,
    /// Whole seconds
    pub watch_time: u32,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
}

impl From<&EngagementEvent> for RecordEngagementRequest {
    fn from(event: &EngagementEvent) -> Self {
        Self {
            content_id: event.content_id.get(),
            engagement_type: event.kind,
            watch_time: event.watch_time_secs,
            completed: event.completed,
            session_id: event.session_id.map(SessionId::get),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackOnboardingEventRequest {
    #[serde(rename = "type")]
    pub event_type: OnboardingEventType,
}
