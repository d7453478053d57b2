//! Progressive-disclosure onboarding: counters, gated features and unlock state.
//!
//! Counters are owned by the remote onboarding service. The client derives
//! nothing from them directly: the unlocked set and per-feature progress come
//! back from the server, and [`FeatureUnlockState`] only answers questions
//! about the most recent observation.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Onboarding event types the client can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingEventType {
    ContentView,
    Save,
    PartnerEngagement,
}

impl OnboardingEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnboardingEventType::ContentView => "content_view",
            OnboardingEventType::Save => "save",
            OnboardingEventType::PartnerEngagement => "partner_engagement",
        }
    }

    /// Counter bumped server-side when this event is tracked.
    pub fn counter(&self) -> CounterKind {
        match self {
            OnboardingEventType::ContentView => CounterKind::ContentViews,
            OnboardingEventType::Save => CounterKind::Saves,
            OnboardingEventType::PartnerEngagement => CounterKind::PartnerEngagements,
        }
    }
}

impl fmt::Display for OnboardingEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three cumulative counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    ContentViews,
    Saves,
    PartnerEngagements,
}

/// Per-user cumulative counts. Monotonically non-decreasing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingCounters {
    pub content_view_count: u32,
    pub save_count: u32,
    pub partner_engagement_count: u32,
}

impl OnboardingCounters {
    pub fn get(&self, kind: CounterKind) -> u32 {
        match kind {
            CounterKind::ContentViews => self.content_view_count,
            CounterKind::Saves => self.save_count,
            CounterKind::PartnerEngagements => self.partner_engagement_count,
        }
    }

    /// Server-side increment for a tracked event.
    pub fn increment(&mut self, event: OnboardingEventType) {
        let slot = match event.counter() {
            CounterKind::ContentViews => &mut self.content_view_count,
            CounterKind::Saves => &mut self.save_count,
            CounterKind::PartnerEngagements => &mut self.partner_engagement_count,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Features hidden until the user crosses a counter threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatedFeature {
    FiltersSave,
    Topics,
    PartnerProfiles,
}

impl GatedFeature {
    pub const ALL: [GatedFeature; 3] = [
        GatedFeature::FiltersSave,
        GatedFeature::Topics,
        GatedFeature::PartnerProfiles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GatedFeature::FiltersSave => "filters_save",
            GatedFeature::Topics => "topics",
            GatedFeature::PartnerProfiles => "partner_profiles",
        }
    }

    pub fn threshold(&self) -> u32 {
        match self {
            GatedFeature::FiltersSave => 10,
            GatedFeature::Topics => 3,
            GatedFeature::PartnerProfiles => 1,
        }
    }

    pub fn counter(&self) -> CounterKind {
        match self {
            GatedFeature::FiltersSave => CounterKind::ContentViews,
            GatedFeature::Topics => CounterKind::Saves,
            GatedFeature::PartnerProfiles => CounterKind::PartnerEngagements,
        }
    }
}

impl fmt::Display for GatedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatedFeature {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "filters_save" => Ok(GatedFeature::FiltersSave),
            "topics" => Ok(GatedFeature::Topics),
            "partner_profiles" => Ok(GatedFeature::PartnerProfiles),
            other => Err(DomainError::parse(format!("Unknown gated feature: {}", other))),
        }
    }
}

/// Progress record for one gated feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureProgress {
    pub threshold: u32,
    pub current_progress: u32,
}

impl FeatureProgress {
    pub fn new(threshold: u32, current_progress: u32) -> Self {
        Self {
            threshold,
            current_progress,
        }
    }

    /// `min(100, 100 * progress / threshold)`. A zero threshold means "no
    /// record yet" and reads as 0, never as unlocked.
    pub fn percentage(&self) -> f64 {
        if self.threshold == 0 {
            return 0.0;
        }
        let pct = (100.0 * f64::from(self.current_progress)) / f64::from(self.threshold);
        pct.min(100.0)
    }
}

/// Latest observed unlock state: unlocked feature names plus progress records.
///
/// Feature names are kept as strings so that features the server knows about
/// but this client does not still round-trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureUnlockState {
    unlocked: BTreeSet<String>,
    progress: BTreeMap<String, FeatureProgress>,
}

impl FeatureUnlockState {
    pub fn new(
        unlocked: impl IntoIterator<Item = String>,
        progress: impl IntoIterator<Item = (String, FeatureProgress)>,
    ) -> Self {
        Self {
            unlocked: unlocked.into_iter().collect(),
            progress: progress.into_iter().collect(),
        }
    }

    /// What the server computes from counters. Used by the in-memory backend.
    pub fn derive_from_counters(counters: &OnboardingCounters) -> Self {
        let mut state = Self::default();
        for feature in GatedFeature::ALL {
            let current = counters.get(feature.counter());
            let threshold = feature.threshold();
            if current >= threshold {
                state.unlocked.insert(feature.as_str().to_string());
            }
            state.progress.insert(
                feature.as_str().to_string(),
                FeatureProgress::new(threshold, current),
            );
        }
        state
    }

    pub fn is_unlocked(&self, feature: &str) -> bool {
        self.unlocked.contains(feature)
    }

    pub fn unlocked(&self) -> &BTreeSet<String> {
        &self.unlocked
    }

    /// Progress for `feature`; absent records read as threshold 0, progress 0.
    pub fn progress(&self, feature: &str) -> FeatureProgress {
        self.progress.get(feature).copied().unwrap_or_default()
    }

    pub fn percentage(&self, feature: &str) -> f64 {
        self.progress(feature).percentage()
    }

    /// Folds a newer observation into this one without ever re-locking.
    ///
    /// Returns the names that were not unlocked before and are now.
    pub fn absorb(&mut self, newer: FeatureUnlockState) -> Vec<String> {
        let newly: Vec<String> = newer
            .unlocked
            .difference(&self.unlocked)
            .cloned()
            .collect();
        self.unlocked.extend(newer.unlocked);
        self.progress = newer.progress;
        newly
    }
}
