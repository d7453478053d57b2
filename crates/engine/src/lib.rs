//! Explore Engine library.
//!
//! Client-side engine for the explore video feed: sessions, batched feed
//! fetching with prefetch, engagement delivery and progressive feature
//! unlocks.
//!
//! ## Structure
//!
//! - `use_cases/` - Feed navigation, engagement, onboarding and session flows
//! - `infrastructure/` - Port traits and their adapters (HTTP, in-memory)
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

/// Test fixtures shared by unit tests.
#[cfg(test)]
pub mod test_fixtures;

/// End-to-end flows against the in-memory backend.
#[cfg(test)]
mod e2e_tests;

pub use app::{App, ServicePorts};
