//! One explore feed instance: session, navigator, engagement sink and
//! onboarding tracking wired together.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;

use explore_domain::{CategoryId, ContentId, DeviceClass, OnboardingEventType, SessionId};

use crate::use_cases::engagement::EngagementSink;
use crate::use_cases::feed::{Advance, FeedNavigator, FeedState, LoadOutcome, PrefetchOutcome};
use crate::use_cases::onboarding::ProgressiveUnlockEngine;
use crate::use_cases::session::{SessionHandle, SessionManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountOutcome {
    /// `None` when the session could not be opened; the feed still works.
    pub session_id: Option<SessionId>,
    pub load: LoadOutcome,
}

pub struct ExploreFeed {
    session: Arc<SessionManager>,
    navigator: FeedNavigator,
    sink: Arc<dyn EngagementSink>,
    unlocks: Arc<ProgressiveUnlockEngine>,
    tracking: TaskTracker,
    /// Items already counted as a content view.
    viewed: HashSet<ContentId>,
}

impl ExploreFeed {
    pub fn new(
        session: Arc<SessionManager>,
        navigator: FeedNavigator,
        sink: Arc<dyn EngagementSink>,
        unlocks: Arc<ProgressiveUnlockEngine>,
    ) -> Self {
        Self {
            session,
            navigator,
            sink,
            unlocks,
            tracking: TaskTracker::new(),
            viewed: HashSet::new(),
        }
    }

    pub fn navigator(&self) -> &FeedNavigator {
        &self.navigator
    }

    pub fn unlocks(&self) -> &ProgressiveUnlockEngine {
        &self.unlocks
    }

    pub fn session(&self) -> SessionHandle {
        self.session.handle()
    }

    /// Opens the session, loads the first batch and takes the onboarding
    /// baseline, all concurrently.
    pub async fn mount(&mut self, device: DeviceClass) -> MountOutcome {
        let (session_id, load, baseline) = tokio::join!(
            self.session.open_session(device),
            self.navigator.load(),
            self.unlocks.take_baseline(),
        );
        if let Err(e) = baseline {
            tracing::warn!(error = %e, "Failed to read onboarding state");
        }
        tracing::info!(
            session_id = ?session_id.map(SessionId::get),
            load = ?load,
            "Explore feed mounted"
        );
        self.note_view();
        MountOutcome { session_id, load }
    }

    /// Waits for outstanding tracking and engagement deliveries, then closes
    /// the session. A close deferred behind an unfinished open is awaited too.
    pub async fn unmount(&mut self) {
        self.settle().await;
        self.sink.drain().await;
        self.session.close_session().await;
        self.session.settle().await;
        tracing::info!(visited = self.navigator.history().len(), "Explore feed unmounted");
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn go_to_next(&mut self) -> Advance {
        let advance = self.navigator.go_to_next();
        if advance.moved {
            self.note_view();
        }
        advance
    }

    pub fn go_to_previous(&mut self) -> bool {
        self.navigator.go_to_previous()
    }

    pub async fn set_category(&mut self, category_id: Option<CategoryId>) -> LoadOutcome {
        self.navigator.set_category(category_id);
        let outcome = self.navigator.load().await;
        self.note_view();
        outcome
    }

    pub fn poll_prefetch(&mut self) -> Option<PrefetchOutcome> {
        self.navigator.poll_prefetch()
    }

    pub async fn await_prefetch(&mut self) -> Option<PrefetchOutcome> {
        self.navigator.await_prefetch().await
    }

    // =========================================================================
    // Actions
    // =========================================================================

    pub fn on_video_complete(&mut self) -> bool {
        self.navigator.on_video_complete()
    }

    pub fn on_save(&mut self) -> bool {
        let emitted = self.navigator.on_save();
        if emitted {
            self.track(OnboardingEventType::Save);
        }
        emitted
    }

    pub fn on_share(&mut self) -> bool {
        self.navigator.on_share()
    }

    /// Only listings with a partner count towards partner engagement.
    pub fn on_view_listing(&mut self) -> bool {
        let has_partner = self
            .navigator
            .current()
            .is_some_and(|item| item.has_partner());
        let emitted = self.navigator.on_view_listing();
        if emitted && has_partner {
            self.track(OnboardingEventType::PartnerEngagement);
        }
        emitted
    }

    // =========================================================================
    // Onboarding
    // =========================================================================

    /// Features unlocked since the last refresh. Waits for tracked events to
    /// reach the service first.
    pub async fn refresh_unlocks(&self) -> Vec<String> {
        self.settle().await;
        match self.unlocks.refresh().await {
            Ok(update) => update.newly_unlocked,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to refresh feature unlocks");
                Vec::new()
            }
        }
    }

    /// Waits for every onboarding event tracked so far.
    pub async fn settle(&self) {
        self.tracking.close();
        self.tracking.wait().await;
        self.tracking.reopen();
    }

    /// Counts a content view the first time an item is on screen.
    fn note_view(&mut self) {
        if !matches!(self.navigator.state(), FeedState::Viewing(_)) {
            return;
        }
        let Some(id) = self.navigator.current().map(|item| item.id()) else {
            return;
        };
        if self.viewed.insert(id) {
            self.track(OnboardingEventType::ContentView);
        }
    }

    fn track(&self, event: OnboardingEventType) {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(event = %event, "No async runtime, dropping onboarding event");
            return;
        };
        let unlocks = self.unlocks.clone();
        self.tracking.spawn_on(
            async move {
                unlocks.track_event(event).await;
            },
            &runtime,
        );
    }
}
