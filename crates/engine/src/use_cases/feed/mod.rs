//! Feed use cases: batch fetching and navigation.

mod navigator;
mod provider;

pub use navigator::{Advance, FeedNavigator, FeedState, LoadOutcome, PrefetchOutcome};
pub use provider::{FeedProvider, PREFETCH_REMAINING};
