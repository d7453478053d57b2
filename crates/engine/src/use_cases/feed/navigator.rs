//! Feed navigation state machine.
//!
//! Tracks the position in the loaded buffer, emits skip/complete and action
//! events for the item on screen, appends visited items to the session
//! history, and prefetches the next batch in the background as the viewer
//! approaches the end of the buffer.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use explore_domain::{
    CategoryId, ContentId, ContentItem, EngagementEvent, EngagementType, SessionHistory,
    WatchTimer,
};

use super::provider::FeedProvider;
use crate::infrastructure::ports::{ClockPort, TransportError};
use crate::use_cases::engagement::EngagementSink;
use crate::use_cases::session::SessionHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// No batch loaded.
    Idle,
    /// Showing `buffer[i]`.
    Viewing(usize),
    /// Past the last item; the upstream has nothing more.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { items: usize },
    /// The first fetch came back empty.
    Exhausted,
    /// Transport failure; the navigator stays idle.
    Failed,
    /// Nothing to do, a batch is already loaded.
    AlreadyLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchOutcome {
    Appended { added: usize },
    /// Nothing new came back; no further prefetches will be made.
    Exhausted,
    /// Response belonged to a previous category and was dropped.
    Stale,
    Failed,
}

/// Result of a forward swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Advance {
    pub moved: bool,
    pub prefetch_triggered: bool,
}

type FetchResult = Result<Vec<ContentItem>, TransportError>;

struct PendingFetch {
    generation: u64,
    rx: oneshot::Receiver<FetchResult>,
}

pub struct FeedNavigator {
    provider: FeedProvider,
    sink: Arc<dyn EngagementSink>,
    session: SessionHandle,
    clock: Arc<dyn ClockPort>,
    category_id: Option<CategoryId>,
    buffer: Vec<ContentItem>,
    state: FeedState,
    history: SessionHistory,
    timer: WatchTimer,
    /// A `complete` was emitted for the current item during this viewing.
    completed_current: bool,
    /// Bumped on category change; fetches from older generations are stale.
    generation: u64,
    pending: Option<PendingFetch>,
    /// Buffer length at which the last prefetch started.
    prefetched_at_len: Option<usize>,
    upstream_exhausted: bool,
}

impl FeedNavigator {
    pub fn new(
        provider: FeedProvider,
        sink: Arc<dyn EngagementSink>,
        session: SessionHandle,
        clock: Arc<dyn ClockPort>,
        category_id: Option<CategoryId>,
    ) -> Self {
        let timer = WatchTimer::start(clock.now());
        Self {
            provider,
            sink,
            session,
            clock,
            category_id,
            buffer: Vec::new(),
            state: FeedState::Idle,
            history: SessionHistory::new(),
            timer,
            completed_current: false,
            generation: 0,
            pending: None,
            prefetched_at_len: None,
            upstream_exhausted: false,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> FeedState {
        self.state
    }

    pub fn current(&self) -> Option<&ContentItem> {
        match self.state {
            FeedState::Viewing(i) => self.buffer.get(i),
            FeedState::Idle | FeedState::Exhausted => None,
        }
    }

    pub fn buffer(&self) -> &[ContentItem] {
        &self.buffer
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    pub fn is_prefetching(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| p.generation == self.generation)
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Fetches the first batch. Only acts when idle.
    pub async fn load(&mut self) -> LoadOutcome {
        if self.state != FeedState::Idle {
            tracing::debug!(state = ?self.state, "Feed already loaded");
            return LoadOutcome::AlreadyLoaded;
        }

        let result = self
            .provider
            .fetch_next(self.history.ids(), self.category_id)
            .await;

        match result {
            Ok(items) => {
                let items = self.unseen(items);
                if items.is_empty() {
                    self.upstream_exhausted = true;
                    self.state = FeedState::Exhausted;
                    tracing::info!(category_id = ?self.category_id.map(CategoryId::get), "Feed is empty");
                    return LoadOutcome::Exhausted;
                }

                let count = items.len();
                self.buffer = items;
                self.state = FeedState::Viewing(0);
                self.restart_viewing();
                tracing::info!(items = count, "Feed loaded");
                self.maybe_prefetch();
                LoadOutcome::Loaded { items: count }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load feed");
                LoadOutcome::Failed
            }
        }
    }

    /// Switches category: drops the buffer (history is kept), returns to
    /// idle and marks any in-flight fetch as stale.
    pub fn set_category(&mut self, category_id: Option<CategoryId>) {
        self.generation += 1;
        self.category_id = category_id;
        self.buffer.clear();
        self.state = FeedState::Idle;
        self.completed_current = false;
        self.prefetched_at_len = None;
        self.upstream_exhausted = false;
        tracing::debug!(
            generation = self.generation,
            category_id = ?category_id.map(CategoryId::get),
            "Feed category changed"
        );
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn go_to_next(&mut self) -> Advance {
        self.poll_prefetch();

        let FeedState::Viewing(i) = self.state else {
            return Advance::default();
        };

        if i + 1 < self.buffer.len() {
            self.leave(i);
            self.state = FeedState::Viewing(i + 1);
            self.restart_viewing();
            let prefetch_triggered = self.maybe_prefetch();
            return Advance {
                moved: true,
                prefetch_triggered,
            };
        }

        if self.upstream_exhausted {
            self.leave(i);
            self.state = FeedState::Exhausted;
            tracing::info!(visited = self.history.len(), "Reached end of feed");
            return Advance {
                moved: true,
                prefetch_triggered: false,
            };
        }

        let prefetch_triggered = self.maybe_prefetch();
        tracing::debug!(index = i, "At end of buffer, waiting for more content");
        Advance {
            moved: false,
            prefetch_triggered,
        }
    }

    /// Steps back one item. Never emits an event.
    pub fn go_to_previous(&mut self) -> bool {
        let target = match self.state {
            FeedState::Viewing(i) if i > 0 => i - 1,
            FeedState::Exhausted if !self.buffer.is_empty() => self.buffer.len() - 1,
            _ => return false,
        };
        self.state = FeedState::Viewing(target);
        self.restart_viewing();
        true
    }

    // =========================================================================
    // Actions on the current item
    // =========================================================================

    /// Playback finished. Emitted at most once per viewing; suppresses the
    /// skip when the viewer moves on.
    pub fn on_video_complete(&mut self) -> bool {
        let Some(id) = self.current().map(ContentItem::id) else {
            return false;
        };
        if self.completed_current {
            tracing::debug!(content_id = %id, "Completion already recorded for this viewing");
            return false;
        }
        self.completed_current = true;
        self.emit(id, EngagementType::Complete);
        true
    }

    pub fn on_save(&mut self) -> bool {
        self.emit_for_current(EngagementType::Save)
    }

    pub fn on_share(&mut self) -> bool {
        self.emit_for_current(EngagementType::Share)
    }

    pub fn on_view_listing(&mut self) -> bool {
        self.emit_for_current(EngagementType::Click)
    }

    // =========================================================================
    // Prefetch
    // =========================================================================

    /// Applies a finished prefetch, if any. Never waits.
    pub fn poll_prefetch(&mut self) -> Option<PrefetchOutcome> {
        let pending = self.pending.as_mut()?;
        let result = match pending.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(TransportError::unavailable(
                "prefetch task ended without a result",
            )),
        };
        let generation = pending.generation;
        self.pending = None;
        Some(self.apply_prefetch(generation, result))
    }

    /// Waits for the in-flight prefetch, if any, and applies it.
    pub async fn await_prefetch(&mut self) -> Option<PrefetchOutcome> {
        let pending = self.pending.take()?;
        let result = pending.rx.await.unwrap_or_else(|_| {
            Err(TransportError::unavailable(
                "prefetch task ended without a result",
            ))
        });
        Some(self.apply_prefetch(pending.generation, result))
    }

    fn maybe_prefetch(&mut self) -> bool {
        let FeedState::Viewing(i) = self.state else {
            return false;
        };
        let len = self.buffer.len();
        if self.upstream_exhausted
            || !FeedProvider::should_prefetch(i, len)
            || self.is_prefetching()
            || self.prefetched_at_len == Some(len)
        {
            return false;
        }

        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("No async runtime, skipping prefetch");
            return false;
        };

        if self.pending.take().is_some() {
            tracing::debug!("Dropping stale prefetch still in flight");
        }

        let (tx, rx) = oneshot::channel();
        let provider = self.provider.clone();
        let history: Vec<ContentId> = self.history.ids().to_vec();
        let category_id = self.category_id;
        runtime.spawn(async move {
            let result = provider.fetch_next(&history, category_id).await;
            let _ = tx.send(result);
        });

        self.pending = Some(PendingFetch {
            generation: self.generation,
            rx,
        });
        self.prefetched_at_len = Some(len);
        tracing::debug!(index = i, buffered = len, "Prefetch started");
        true
    }

    fn apply_prefetch(&mut self, generation: u64, result: FetchResult) -> PrefetchOutcome {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "Discarding stale prefetch response"
            );
            return PrefetchOutcome::Stale;
        }

        match result {
            Ok(items) => {
                let fresh = self.unseen(items);
                if fresh.is_empty() {
                    self.upstream_exhausted = true;
                    tracing::info!(buffered = self.buffer.len(), "Feed upstream exhausted");
                    return PrefetchOutcome::Exhausted;
                }
                let added = fresh.len();
                self.buffer.extend(fresh);
                tracing::debug!(added, buffered = self.buffer.len(), "Prefetched batch appended");
                PrefetchOutcome::Appended { added }
            }
            Err(e) => {
                // Next forward move at this length may try again.
                self.prefetched_at_len = None;
                tracing::warn!(error = %e, "Prefetch failed");
                PrefetchOutcome::Failed
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Drops items already visited, already buffered, or repeated in the batch.
    fn unseen(&self, items: Vec<ContentItem>) -> Vec<ContentItem> {
        let mut seen: HashSet<ContentId> = self.buffer.iter().map(ContentItem::id).collect();
        items
            .into_iter()
            .filter(|item| !self.history.contains(item.id()) && seen.insert(item.id()))
            .collect()
    }

    /// Bookkeeping for moving off `buffer[i]`.
    fn leave(&mut self, i: usize) {
        let id = self.buffer[i].id();
        if !self.completed_current {
            self.emit(id, EngagementType::Skip);
        }
        if !self.history.record(id) {
            tracing::debug!(content_id = %id, "Item already in history");
        }
    }

    fn restart_viewing(&mut self) {
        self.timer = WatchTimer::start(self.clock.now());
        self.completed_current = false;
    }

    fn emit_for_current(&mut self, kind: EngagementType) -> bool {
        let Some(id) = self.current().map(ContentItem::id) else {
            return false;
        };
        self.emit(id, kind);
        true
    }

    fn emit(&self, content_id: ContentId, kind: EngagementType) {
        let now = self.clock.now();
        let event = EngagementEvent::new(
            content_id,
            kind,
            self.timer.elapsed_secs(now),
            self.session.current(),
            now,
        );
        tracing::trace!(content_id = %content_id, engagement_type = %kind, "Engagement emitted");
        self.sink.submit(event);
    }
}
