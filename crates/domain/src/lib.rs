//! Explore domain types.
//!
//! Pure types and invariants for the explore feed: content items, engagement
//! events, session history and onboarding unlock state. No I/O lives here.

pub mod content;
pub mod engagement;
pub mod error;
pub mod history;
pub mod ids;
pub mod onboarding;

pub use content::{ContentItem, ContentStats, MediaLocator};
pub use engagement::{DeviceClass, EngagementEvent, EngagementType, WatchTimer};
pub use error::DomainError;
pub use history::SessionHistory;
pub use ids::{CategoryId, ContentId, DevelopmentId, PartnerId, PropertyId, SessionId};
pub use onboarding::{
    CounterKind, FeatureProgress, FeatureUnlockState, GatedFeature, OnboardingCounters,
    OnboardingEventType,
};
