//! Explore Protocol - Wire types for the explore feed and onboarding services
//!
//! This crate contains the request/response shapes exchanged with the remote
//! explore, engagement and onboarding services:
//! - Request bodies (`requests`)
//! - The response envelope and payloads (`responses`)
//! - Wire DTOs with conversions into domain types (`dto`)
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json and thiserror
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Raw ids on the wire** - DTOs carry plain `i64`; `to_domain()` wraps them

pub mod dto;
pub mod requests;
pub mod responses;

pub use dto::{ContentItemDto, FeatureProgressDto, OnboardingStateDto};
pub use requests::{
    CloseSessionRequest, FeedRequest, OpenSessionRequest, RecordEngagementRequest,
    TrackOnboardingEventRequest,
};
pub use responses::{
    ApiResponse, EnvelopeError, FeatureProgressData, FeedData, OpenSessionData,
};
