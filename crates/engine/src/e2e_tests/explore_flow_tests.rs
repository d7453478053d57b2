//! Feed navigation flows: session tagging, prefetch, ordering, exhaustion.

use explore_domain::{DeviceClass, EngagementType};

use super::E2EContext;
use crate::use_cases::feed::{FeedState, LoadOutcome, PrefetchOutcome};
use crate::use_cases::session::SessionPhase;

#[tokio::test]
async fn seven_advances_prefetch_once_and_build_history() {
    let ctx = E2EContext::with_catalog(30);
    let mut feed = ctx.app.explore_feed();

    let mounted = feed.mount(DeviceClass::Mobile).await;
    assert_eq!(mounted.load, LoadOutcome::Loaded { items: 10 });
    let session_id = mounted.session_id.expect("session opened");

    let mut triggered = Vec::new();
    for step in 1..=7 {
        ctx.clock.advance_secs(4);
        if feed.go_to_next().prefetch_triggered {
            triggered.push(step);
        }
    }
    assert_eq!(triggered, vec![7]);

    let history: Vec<i64> = feed
        .navigator()
        .history()
        .ids()
        .iter()
        .map(|id| id.get())
        .collect();
    assert_eq!(history, (1..=7).collect::<Vec<_>>());

    // 8..=17 come back; 8, 9 and 10 are already buffered.
    assert_eq!(
        feed.await_prefetch().await,
        Some(PrefetchOutcome::Appended { added: 7 })
    );
    assert_eq!(feed.navigator().buffer().len(), 17);

    feed.unmount().await;

    let queries = ctx.service.feed_queries().await;
    assert_eq!(queries.len(), 2);
    assert!(queries[0].history.is_empty());
    assert_eq!(queries[0].limit, 10);
    assert_eq!(queries[1].history.len(), 7);

    let events = ctx.service.engagements().await;
    assert_eq!(events.len(), 7);
    assert!(events.iter().all(|e| e.kind == EngagementType::Skip));
    assert!(events.iter().all(|e| e.session_id == Some(session_id)));
    assert!(events.iter().all(|e| e.watch_time_secs == 4));

    assert_eq!(feed.session().phase(), SessionPhase::Closed);
    assert_eq!(ctx.service.closed_sessions().await, vec![session_id]);
}

#[tokio::test]
async fn sequential_delivery_preserves_emission_order() {
    let ctx = E2EContext::sequential(30);
    let mut feed = ctx.app.explore_feed();
    feed.mount(DeviceClass::Desktop).await;

    feed.on_video_complete();
    feed.on_save();
    feed.go_to_next();
    feed.on_share();
    feed.go_to_next();
    feed.unmount().await;

    let seen: Vec<(i64, EngagementType)> = ctx
        .service
        .engagements()
        .await
        .iter()
        .map(|e| (e.content_id.get(), e.kind))
        .collect();
    assert_eq!(
        seen,
        vec![
            (1, EngagementType::Complete),
            (1, EngagementType::Save),
            (2, EngagementType::Share),
            (2, EngagementType::Skip),
        ]
    );
}

#[tokio::test]
async fn small_catalog_runs_to_exhaustion() {
    let ctx = E2EContext::with_catalog(3);
    let mut feed = ctx.app.explore_feed();

    assert_eq!(
        feed.mount(DeviceClass::Tablet).await.load,
        LoadOutcome::Loaded { items: 3 }
    );
    assert_eq!(feed.await_prefetch().await, Some(PrefetchOutcome::Exhausted));

    assert!(feed.go_to_next().moved);
    assert!(feed.go_to_next().moved);
    assert!(feed.go_to_next().moved);
    assert_eq!(feed.navigator().state(), FeedState::Exhausted);

    assert!(!feed.go_to_next().moved);
    feed.unmount().await;

    assert_eq!(ctx.service.engagements().await.len(), 3);
    assert_eq!(ctx.service.counters().await.content_view_count, 3);
}

#[tokio::test]
async fn empty_catalog_is_exhausted_on_mount() {
    let ctx = E2EContext::with_catalog(0);
    let mut feed = ctx.app.explore_feed();

    assert_eq!(
        feed.mount(DeviceClass::Mobile).await.load,
        LoadOutcome::Exhausted
    );
    assert!(!feed.go_to_next().moved);
    assert!(!feed.on_save());
    feed.unmount().await;

    assert!(ctx.service.engagements().await.is_empty());
}
