//! Explore Engine - demo entry point.
//!
//! Mounts one feed against the configured backend, walks it for
//! `EXPLORE_DEMO_STEPS` items and reports any features unlocked on the way.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use explore_engine::infrastructure::config::ExploreConfig;
use explore_engine::use_cases::feed::{FeedState, PrefetchOutcome};
use explore_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the binary may run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "explore_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Explore Engine");

    let config = ExploreConfig::from_env()?;
    tracing::info!(
        backend = ?config.backend,
        device = %config.device_class,
        page_size = config.page_size,
        delivery = ?config.delivery,
        "Configuration loaded"
    );

    let device = config.device_class;
    let steps = config.demo_steps;
    let app = App::from_config(config);
    let mut feed = app.explore_feed();

    let mounted = feed.mount(device).await;
    tracing::info!(load = ?mounted.load, "Feed ready");

    for step in 1..=steps {
        let Some(item) = feed.navigator().current() else {
            break;
        };
        tracing::info!(
            step,
            content_id = %item.id(),
            title = item.title().unwrap_or("untitled"),
            "Now viewing"
        );
        let has_partner = item.has_partner();

        if step % 3 == 0 {
            feed.on_video_complete();
        }
        if step % 5 == 0 {
            feed.on_save();
        }
        if has_partner {
            feed.on_view_listing();
        }

        if !feed.go_to_next().moved {
            match feed.await_prefetch().await {
                None | Some(PrefetchOutcome::Exhausted) => break,
                Some(outcome) => {
                    tracing::debug!(?outcome, "Prefetch settled");
                    feed.go_to_next();
                }
            }
        }
        if feed.navigator().state() == FeedState::Exhausted {
            tracing::info!(step, "Feed exhausted");
            break;
        }
    }

    let unlocked = feed.refresh_unlocks().await;
    if unlocked.is_empty() {
        tracing::info!("No new features unlocked");
    }
    for feature in &unlocked {
        tracing::info!(
            feature = %feature,
            progress = feed.unlocks().percentage(feature),
            "Unlocked during this session"
        );
    }

    feed.unmount().await;
    tracing::info!(
        visited = feed.navigator().history().len(),
        "Explore Engine finished"
    );
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
