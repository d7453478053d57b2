//! HTTP client for the remote explore, engagement and onboarding services.
//!
//! One client implements every service port. Routes are relative to the
//! configured base URL:
//!
//! | Port | Method | Path |
//! |---|---|---|
//! | feed | POST | `/explore/feed` |
//! | session open | POST | `/explore/sessions` |
//! | session close | POST | `/explore/sessions/close` |
//! | engagement | POST | `/explore/engagements` |
//! | onboarding state | GET | `/onboarding/state` |
//! | feature progress | GET | `/onboarding/progress` |
//! | onboarding event | POST | `/onboarding/events` |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use explore_domain::{
    ContentItem, DeviceClass, EngagementEvent, OnboardingEventType, SessionId,
};
use explore_protocol::{
    ApiResponse, CloseSessionRequest, EnvelopeError, FeatureProgressData, FeedData, FeedRequest,
    OnboardingStateDto, OpenSessionData, OpenSessionRequest, RecordEngagementRequest,
    TrackOnboardingEventRequest,
};

use crate::infrastructure::ports::{
    EngagementPort, FeatureProgressRecord, FeedPort, FeedQuery, OnboardingPort,
    OnboardingSnapshot, SessionPort, TransportError,
};

const FEED: &str = "explore/feed";
const SESSION_OPEN: &str = "explore/sessions";
const SESSION_CLOSE: &str = "explore/sessions/close";
const ENGAGEMENT: &str = "explore/engagements";
const ONBOARDING_STATE: &str = "onboarding/state";
const ONBOARDING_PROGRESS: &str = "onboarding/progress";
const ONBOARDING_EVENT: &str = "onboarding/events";

/// Client for the explore and onboarding REST API.
#[derive(Clone)]
pub struct HttpExploreClient {
    client: Client,
    base_url: String,
}

impl HttpExploreClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<B>(&self, endpoint: &'static str, body: &B) -> Result<Response, TransportError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let response = self
            .client
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::request(endpoint, e))?;
        check_status(endpoint, response).await
    }

    async fn get(&self, endpoint: &'static str) -> Result<Response, TransportError> {
        let response = self
            .client
            .get(self.url(endpoint))
            .send()
            .await
            .map_err(|e| TransportError::request(endpoint, e))?;
        check_status(endpoint, response).await
    }
}

async fn check_status(endpoint: &'static str, response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::status(endpoint, status.as_u16(), body))
}

/// Unwraps the `{ success, data, error }` envelope.
async fn decode<T: DeserializeOwned>(
    endpoint: &'static str,
    response: Response,
) -> Result<T, TransportError> {
    let envelope: ApiResponse<T> = response
        .json()
        .await
        .map_err(|e| TransportError::decode(endpoint, e))?;
    envelope.into_data().map_err(|e| match e {
        EnvelopeError::Unsuccessful(message) => TransportError::unsuccessful(endpoint, message),
        EnvelopeError::MissingData => TransportError::decode(endpoint, "response carried no data"),
    })
}

/// Accepts any 2xx body except an explicit `success: false`.
async fn acknowledge(endpoint: &'static str, response: Response) -> Result<(), TransportError> {
    let body = response
        .text()
        .await
        .map_err(|e| TransportError::request(endpoint, e))?;
    if body.trim().is_empty() {
        return Ok(());
    }
    match serde_json::from_str::<ApiResponse<serde_json::Value>>(&body) {
        Ok(ApiResponse {
            success: Some(false),
            error,
            ..
        }) => Err(TransportError::unsuccessful(
            endpoint,
            error.unwrap_or_else(|| "no error message".to_string()),
        )),
        _ => Ok(()),
    }
}

#[async_trait]
impl SessionPort for HttpExploreClient {
    async fn open_session(&self, device: DeviceClass) -> Result<SessionId, TransportError> {
        let response = self
            .post(SESSION_OPEN, &OpenSessionRequest { device_type: device })
            .await?;
        let data: OpenSessionData = decode(SESSION_OPEN, response).await?;
        SessionId::new(data.session_id).map_err(|e| TransportError::decode(SESSION_OPEN, e))
    }

    async fn close_session(&self, session_id: SessionId) -> Result<(), TransportError> {
        let response = self
            .post(SESSION_CLOSE, &CloseSessionRequest::from(session_id))
            .await?;
        acknowledge(SESSION_CLOSE, response).await
    }
}

#[async_trait]
impl FeedPort for HttpExploreClient {
    async fn fetch_batch(&self, query: FeedQuery) -> Result<Vec<ContentItem>, TransportError> {
        let request = FeedRequest::new(&query.history, query.category_id, query.limit, query.offset);
        let response = self.post(FEED, &request).await?;
        let data: FeedData = decode(FEED, response).await?;

        let items = data
            .videos
            .iter()
            .filter_map(|dto| match dto.to_domain() {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(content_id = dto.id, error = %e, "Skipping invalid feed item");
                    None
                }
            })
            .collect();
        Ok(items)
    }
}

#[async_trait]
impl EngagementPort for HttpExploreClient {
    async fn record(&self, event: EngagementEvent) -> Result<(), TransportError> {
        let response = self
            .post(ENGAGEMENT, &RecordEngagementRequest::from(&event))
            .await?;
        acknowledge(ENGAGEMENT, response).await
    }
}

#[async_trait]
impl OnboardingPort for HttpExploreClient {
    async fn get_state(&self) -> Result<OnboardingSnapshot, TransportError> {
        let response = self.get(ONBOARDING_STATE).await?;
        let dto: OnboardingStateDto = decode(ONBOARDING_STATE, response).await?;
        Ok(OnboardingSnapshot {
            counters: dto.counters(),
            features_unlocked: dto.features_unlocked,
        })
    }

    async fn get_feature_progress(&self) -> Result<Vec<FeatureProgressRecord>, TransportError> {
        let response = self.get(ONBOARDING_PROGRESS).await?;
        let data: FeatureProgressData = decode(ONBOARDING_PROGRESS, response).await?;
        Ok(data
            .progress
            .iter()
            .map(|dto| {
                let (feature, progress) = dto.to_domain();
                FeatureProgressRecord { feature, progress }
            })
            .collect())
    }

    async fn track_event(&self, event: OnboardingEventType) -> Result<(), TransportError> {
        let response = self
            .post(ONBOARDING_EVENT, &TrackOnboardingEventRequest { event_type: event })
            .await?;
        acknowledge(ONBOARDING_EVENT, response).await
    }
}
