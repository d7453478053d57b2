//! Engagement event taxonomy.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{ContentId, SessionId};

/// Kind of interaction a user had with a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementType {
    View,
    Save,
    Share,
    Click,
    Skip,
    Complete,
}

impl EngagementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementType::View => "view",
            EngagementType::Save => "save",
            EngagementType::Share => "share",
            EngagementType::Click => "click",
            EngagementType::Skip => "skip",
            EngagementType::Complete => "complete",
        }
    }
}

impl fmt::Display for EngagementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngagementType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "view" => Ok(EngagementType::View),
            "save" => Ok(EngagementType::Save),
            "share" => Ok(EngagementType::Share),
            "click" => Ok(EngagementType::Click),
            "skip" => Ok(EngagementType::Skip),
            "complete" => Ok(EngagementType::Complete),
            other => Err(DomainError::parse(format!(
                "Unknown engagement type: {}",
                other
            ))),
        }
    }
}

/// Device class reported when a session is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Tablet => "tablet",
            DeviceClass::Desktop => "desktop",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceClass {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mobile" | "phone" => Ok(DeviceClass::Mobile),
            "tablet" => Ok(DeviceClass::Tablet),
            "desktop" | "web" => Ok(DeviceClass::Desktop),
            other => Err(DomainError::parse(format!("Unknown device class: {}", other))),
        }
    }
}

/// A single recorded interaction. Append-only; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngagementEvent {
    pub content_id: ContentId,
    pub kind: EngagementType,
    pub watch_time_secs: u32,
    pub completed: bool,
    pub session_id: Option<SessionId>,
    /// Local emission time; not part of the wire payload.
    pub occurred_at: DateTime<Utc>,
}

impl EngagementEvent {
    pub fn new(
        content_id: ContentId,
        kind: EngagementType,
        watch_time_secs: u32,
        session_id: Option<SessionId>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            content_id,
            kind,
            watch_time_secs,
            completed: kind == EngagementType::Complete,
            session_id,
            occurred_at,
        }
    }
}

/// Client-side watch timer for the item currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchTimer {
    started_at: DateTime<Utc>,
}

impl WatchTimer {
    pub fn start(now: DateTime<Utc>) -> Self {
        Self { started_at: now }
    }

    /// Whole seconds watched. A clock that moved backwards reads as zero.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u32 {
        let secs = (now - self.started_at).num_seconds();
        u32::try_from(secs.max(0)).unwrap_or(u32::MAX)
    }
}
