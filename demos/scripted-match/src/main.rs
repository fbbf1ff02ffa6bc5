//! Plays one complete match between two scripted players and logs the
//! whole thing. Useful for eyeballing the event stream:
//!
//! ```text
//! RUST_LOG=info cargo run -p scripted-match
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use tracing::info;

use twolies::{
    GenerateError, LieGenerator, LiePair, PartyService, PlayerId, RoomRepository, StoreConfig,
    TracingBroadcaster,
};

/// Offline stand-in for the LLM: template lies derived from the truth.
struct CannedGenerator;

impl LieGenerator for CannedGenerator {
    async fn generate_lies(&self, truth: &str) -> Result<LiePair, GenerateError> {
        Ok(LiePair::new(
            format!("{truth}, or so they claim"),
            format!("Contrary to rumor, not: {truth}"),
        ))
    }
}

fn truths(name: &str) -> Vec<String> {
    [
        "I have been to seventeen countries",
        "I once met my favorite author in an elevator",
        "I can solve a Rubik's cube in under two minutes",
        "I grew up next to a lighthouse",
        "I have never broken a bone",
    ]
    .iter()
    .map(|t| format!("{name}: {t}"))
    .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let repo = Arc::new(RoomRepository::new(StoreConfig::default()));
    let reaper = repo.spawn_reaper();
    let service = PartyService::new(Arc::clone(&repo), CannedGenerator, TracingBroadcaster);

    let room_id = service.create_room().await?.id;
    info!(room_id = %room_id, "starting scripted match");

    let alice = service.join(&room_id, "Alice").await?.player.id;
    let bob = service.join(&room_id, "Bob").await?.player.id;
    service.send_chat(&room_id, &alice, "ready when you are").await?;

    service.submit_truths(&room_id, "Alice", truths("Alice")).await?;
    service.submit_truths(&room_id, "Bob", truths("Bob")).await?;
    service.start_game(&room_id, &alice).await?;

    let mut score: HashMap<PlayerId, u32> = HashMap::new();
    loop {
        let room = service.room_snapshot(&room_id).await?;
        let Some(guesser) = room.current_guesser.clone() else {
            break;
        };

        // The scripted guesser picks a slot at random.
        let slot = rand::rng().random_range(0..3);
        let resp = service.guess(&room_id, &guesser, slot).await?;
        if resp.outcome.correct {
            *score.entry(guesser.clone()).or_default() += 1;
        }
        info!(
            round = room.current_round,
            slot,
            correct = resp.outcome.correct,
            truth = %resp.outcome.truth_statement,
            "reveal"
        );

        service.advance_round(&room_id, &alice).await?;
        let (outcome, _) = service.advance_round(&room_id, &bob).await?;
        if outcome.finished {
            break;
        }
    }

    info!(
        alice = score.get(&alice).copied().unwrap_or(0),
        bob = score.get(&bob).copied().unwrap_or(0),
        "final score"
    );
    reaper.abort();
    Ok(())
}
