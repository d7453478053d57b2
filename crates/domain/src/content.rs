//! Explorable content items.
//!
//! A [`ContentItem`] is owned by the external ranking/content service. The
//! client only reads it, so every field is private behind getters and the
//! builder methods are meant for decoding and fixtures.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{CategoryId, ContentId, DevelopmentId, PartnerId, PropertyId};

/// Where the media for a content item lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaLocator {
    video_url: String,
    thumbnail_url: Option<String>,
}

impl MediaLocator {
    pub fn new(video_url: impl Into<String>) -> Result<Self, DomainError> {
        let video_url = video_url.into();
        if video_url.trim().is_empty() {
            return Err(DomainError::validation("video url cannot be empty"));
        }
        Ok(Self {
            video_url,
            thumbnail_url: None,
        })
    }

    pub fn with_thumbnail(mut self, thumbnail_url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(thumbnail_url.into());
        self
    }

    pub fn video_url(&self) -> &str {
        &self.video_url
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.thumbnail_url.as_deref()
    }
}

/// Aggregate counters computed by the content service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentStats {
    pub view_count: u64,
    /// Fraction of views that reached the natural end, 0.0 - 1.0
    pub completion_rate: f64,
    pub engagement_score: f64,
}

/// An opaque unit of explorable content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    id: ContentId,
    title: Option<String>,
    media: MediaLocator,
    duration_secs: u32,
    category_id: Option<CategoryId>,
    property_id: Option<PropertyId>,
    development_id: Option<DevelopmentId>,
    partner_id: Option<PartnerId>,
    stats: ContentStats,
}

impl ContentItem {
    pub fn new(id: ContentId, media: MediaLocator) -> Self {
        Self {
            id,
            title: None,
            media,
            duration_secs: 0,
            category_id: None,
            property_id: None,
            development_id: None,
            partner_id: None,
            stats: ContentStats::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_duration_secs(mut self, duration_secs: u32) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_property(mut self, property_id: PropertyId) -> Self {
        self.property_id = Some(property_id);
        self
    }

    pub fn with_development(mut self, development_id: DevelopmentId) -> Self {
        self.development_id = Some(development_id);
        self
    }

    pub fn with_partner(mut self, partner_id: PartnerId) -> Self {
        self.partner_id = Some(partner_id);
        self
    }

    pub fn with_stats(mut self, stats: ContentStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn id(&self) -> ContentId {
        self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn media(&self) -> &MediaLocator {
        &self.media
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    pub fn property_id(&self) -> Option<PropertyId> {
        self.property_id
    }

    pub fn development_id(&self) -> Option<DevelopmentId> {
        self.development_id
    }

    pub fn partner_id(&self) -> Option<PartnerId> {
        self.partner_id
    }

    /// Whether engaging with this item's listing counts as a partner engagement.
    pub fn has_partner(&self) -> bool {
        self.partner_id.is_some()
    }

    pub fn stats(&self) -> ContentStats {
        self.stats
    }
}
