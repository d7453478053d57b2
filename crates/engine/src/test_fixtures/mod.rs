//! Shared test helpers: a manual clock, a recording sink and content builders.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_fixtures::{content_batch, ManualClock, RecordingSink};
//!
//! let clock = Arc::new(ManualClock::default());
//! clock.advance_secs(12);
//! ```

use std::ops::RangeInclusive;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use tokio::sync::oneshot;

use explore_domain::{
    ContentId, ContentItem, DeviceClass, EngagementEvent, EngagementType, MediaLocator,
    PartnerId, SessionId,
};

use crate::infrastructure::ports::{ClockPort, SessionPort, TransportError};
use crate::use_cases::engagement::EngagementSink;

// =============================================================================
// Time
// =============================================================================

/// 2025-01-01 00:00:00 UTC.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .expect("valid base time")
}

pub fn at_secs(secs: i64) -> DateTime<Utc> {
    base_time() + Duration::seconds(secs)
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += Duration::seconds(secs);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(base_time()),
        }
    }
}

impl ClockPort for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Engagement
// =============================================================================

/// Sink that keeps every submitted event in memory.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngagementEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<EngagementEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn kinds(&self) -> Vec<EngagementType> {
        self.events().into_iter().map(|e| e.kind).collect()
    }
}

#[async_trait]
impl EngagementSink for RecordingSink {
    fn submit(&self, event: EngagementEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    async fn drain(&self) {}
}

// =============================================================================
// Sessions
// =============================================================================

/// Session port whose open resolves only once released.
pub struct GatedSessions {
    id: SessionId,
    release: Mutex<Option<oneshot::Receiver<()>>>,
    closed: Mutex<Vec<SessionId>>,
}

impl GatedSessions {
    pub fn new(id: SessionId) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let port = Self {
            id,
            release: Mutex::new(Some(rx)),
            closed: Mutex::new(Vec::new()),
        };
        (port, tx)
    }

    pub fn closed(&self) -> Vec<SessionId> {
        self.closed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SessionPort for GatedSessions {
    async fn open_session(&self, _device: DeviceClass) -> Result<SessionId, TransportError> {
        let release = self
            .release
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(release) = release {
            let _ = release.await;
        }
        Ok(self.id)
    }

    async fn close_session(&self, session_id: SessionId) -> Result<(), TransportError> {
        self.closed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(session_id);
        Ok(())
    }
}

// =============================================================================
// Content
// =============================================================================

pub fn content_id(raw: i64) -> ContentId {
    ContentId::new(raw).expect("positive content id")
}

pub fn content(raw: i64) -> ContentItem {
    let media = MediaLocator::new(format!("https://cdn.test/{}.mp4", raw)).expect("video url");
    ContentItem::new(content_id(raw), media).with_duration_secs(30)
}

pub fn partnered_content(raw: i64, partner: i64) -> ContentItem {
    content(raw).with_partner(PartnerId::from_raw(partner))
}

pub fn content_batch(ids: RangeInclusive<i64>) -> Vec<ContentItem> {
    ids.map(content).collect()
}
