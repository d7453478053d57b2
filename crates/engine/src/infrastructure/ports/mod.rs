//! Port traits for infrastructure boundaries.
//!
//! These are the only abstractions in the engine. Ports exist for:
//! - Remote services (session, feed, engagement, onboarding) that could be
//!   HTTP, in-memory, or something else entirely
//! - Clock (for testing)

mod error;
mod external;
mod testing;

// =============================================================================
// Remote Service Ports
// =============================================================================
pub use external::{
    EngagementPort, FeatureProgressRecord, FeedPort, FeedQuery, OnboardingPort,
    OnboardingSnapshot, SessionPort,
};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::{MockEngagementPort, MockFeedPort, MockOnboardingPort, MockSessionPort};

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::TransportError;
