//! Use cases - explore feed orchestration.
//!
//! Each module owns one concern; [`explore::ExploreFeed`] composes them for a
//! single feed instance.

pub mod engagement;
pub mod explore;
pub mod feed;
pub mod onboarding;
pub mod session;

pub use engagement::{EngagementRecorder, EngagementSink, SequentialOutbox};
pub use explore::{ExploreFeed, MountOutcome};
pub use feed::{FeedNavigator, FeedProvider};
pub use onboarding::{ProgressiveUnlockEngine, UnlockUpdate};
pub use session::{SessionHandle, SessionManager, SessionPhase};
