//! Tally simulator binary
//!
//! Drives one voter through a seeded feed until the queue is exhausted,
//! waits out the cooldown on a simulated clock and runs a second cycle.

use rand::Rng;
use tally_engine::Direction;
use tally_feed::{FeedConfig, MemoryPostStore, Selection, Storage, VotingSession};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SEED_POSTS: &[(&str, Option<&str>)] = &[
    ("Tabs over spaces", Some("ada")),
    ("Pineapple belongs on pizza", Some("grace")),
    ("Dark mode everywhere", None),
    ("Meetings should be emails", Some("linus")),
    ("Cats are better than dogs", Some("sim-voter")),
    ("Mondays are fine actually", None),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally_sim=info,tally_feed=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = FeedConfig::from_env()?;
    tracing::info!(mode = ?config.mode, data_dir = %config.data_dir.display(), "Starting Tally simulator");

    let store = MemoryPostStore::default();
    for (i, (content, author)) in SEED_POSTS.iter().enumerate() {
        store.create_post(content, *author, i as u64 * 1_000).await;
    }

    std::fs::create_dir_all(&config.data_dir)?;
    let storage = Storage::open(&config.data_dir)?;
    let mut session = VotingSession::with_storage(config, store, storage, Some("sim-voter"))?;

    let mut rng = rand::thread_rng();
    let mut now = now_millis();
    session.load(now).await?;

    for cycle in 1..=2 {
        wait_out_cooldown(&mut session, &mut now)?;
        tracing::info!(cycle, "Voting cycle");
        loop {
            let Some(post_id) = next_target(session.selection()) else {
                break;
            };
            let direction = if rng.gen_bool(0.7) { Direction::Up } else { Direction::Down };
            now += 1_500;

            let outcome = session.cast_vote(&post_id, direction, now).await?;
            let (voted, total) = session.progress();
            tracing::info!(
                post = %outcome.post_id,
                direction = %direction,
                confirmed = outcome.confirmed,
                progress = %format!("{}/{}", voted, total),
                "Voted"
            );
            if outcome.streak_popup {
                tracing::info!(count = session.streak().count, "Streak!");
            }
            if outcome.exhausted {
                break;
            }
            session.settle();
        }
    }

    Ok(())
}

/// Jump the simulated clock past any running cooldown.
fn wait_out_cooldown(session: &mut VotingSession<MemoryPostStore>, now: &mut u64) -> tally_feed::Result<()> {
    let remaining = session.cooldown_remaining(*now);
    if remaining > 0 {
        tracing::info!(remaining_ms = remaining, "Cooling down");
        *now += remaining;
        session.tick(*now)?;
    }
    Ok(())
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// First actionable post on screen.
fn next_target(selection: &Selection) -> Option<String> {
    match selection {
        Selection::Focus { current } => current.clone(),
        Selection::Grid { slots } => slots
            .iter()
            .find(|slot| slot.anim_state == tally_engine::AnimState::Visible)
            .map(|slot| slot.post_id.clone()),
    }
}
