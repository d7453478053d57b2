//! Data Transfer Objects (DTOs)
//!
//! Wire-format types for serialization/deserialization. These use raw numeric
//! ids and primitive types for transport, and convert into domain types with
//! `to_domain()` at the boundary.

use serde::{Deserialize, Serialize};

use explore_domain::{
    CategoryId, ContentId, ContentItem, ContentStats, DevelopmentId, DomainError,
    FeatureProgress, MediaLocator, OnboardingCounters, PartnerId, PropertyId,
};

// =============================================================================
// Content DTOs
// =============================================================================

/// Wire-format content item as returned by the feed endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItemDto {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub video_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Seconds
    #[serde(default)]
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub development_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<i64>,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub completion_rate: f64,
    #[serde(default)]
    pub engagement_score: f64,
}

impl From<&ContentItem> for ContentItemDto {
    fn from(item: &ContentItem) -> Self {
        let stats = item.stats();
        Self {
            id: item.id().get(),
            title: item.title().map(str::to_string),
            video_url: item.media().video_url().to_string(),
            thumbnail_url: item.media().thumbnail_url().map(str::to_string),
            duration: item.duration_secs(),
            category_id: item.category_id().map(CategoryId::get),
            property_id: item.property_id().map(PropertyId::get),
            development_id: item.development_id().map(DevelopmentId::get),
            partner_id: item.partner_id().map(PartnerId::get),
            view_count: stats.view_count,
            completion_rate: stats.completion_rate,
            engagement_score: stats.engagement_score,
        }
    }
}

impl ContentItemDto {
    /// Convert to domain type, validating the id and media locator.
    pub fn to_domain(&self) -> Result<ContentItem, DomainError> {
        let mut media = MediaLocator::new(self.video_url.clone())?;
        if let Some(thumb) = &self.thumbnail_url {
            media = media.with_thumbnail(thumb.clone());
        }

        let mut item = ContentItem::new(ContentId::new(self.id)?, media)
            .with_duration_secs(self.duration)
            .with_stats(ContentStats {
                view_count: self.view_count,
                completion_rate: self.completion_rate,
                engagement_score: self.engagement_score,
            });
        if let Some(title) = &self.title {
            item = item.with_title(title.clone());
        }
        if let Some(id) = self.category_id {
            item = item.with_category(CategoryId::new(id)?);
        }
        if let Some(id) = self.property_id {
            item = item.with_property(PropertyId::new(id)?);
        }
        if let Some(id) = self.development_id {
            item = item.with_development(DevelopmentId::new(id)?);
        }
        if let Some(id) = self.partner_id {
            item = item.with_partner(PartnerId::new(id)?);
        }
        Ok(item)
    }
}

// =============================================================================
// Onboarding DTOs
// =============================================================================

/// Onboarding state read: counters plus the unlocked feature names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingStateDto {
    #[serde(default)]
    pub content_view_count: u32,
    #[serde(default)]
    pub save_count: u32,
    #[serde(default)]
    pub partner_engagement_count: u32,
    #[serde(default)]
    pub features_unlocked: Vec<String>,
}

impl OnboardingStateDto {
    pub fn counters(&self) -> OnboardingCounters {
        OnboardingCounters {
            content_view_count: self.content_view_count,
            save_count: self.save_count,
            partner_engagement_count: self.partner_engagement_count,
        }
    }
}

/// One gated feature's progress record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureProgressDto {
    pub feature: String,
    pub threshold: u32,
    pub current_progress: u32,
}

impl FeatureProgressDto {
    pub fn to_domain(&self) -> (String, FeatureProgress) {
        (
            self.feature.clone(),
            FeatureProgress::new(self.threshold, self.current_progress),
        )
    }
}
