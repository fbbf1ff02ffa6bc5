//! The session service: one method per player-facing operation.
//!
//! [`PartyService`] glues the three seams together: the rules layer in
//! `twolies-core`, the locked store in `twolies-store`, and the three
//! pluggable hooks ([`LieGenerator`], [`Broadcaster`], [`Clock`]).
//!
//! Every method follows the same shape: validate against a snapshot if
//! slow work is involved, do the slow work with no lock held, then
//! commit through `RoomRepository::mutate` (which re-validates), and
//! finally announce the committed state. Events always describe a room
//! that was real at commit time.

use std::sync::Arc;

use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::{debug, info, warn};

use twolies_core::{
    AdvanceOutcome, ChatMessage, GameError, Player, PlayerId, PlayerRound, RevealOutcome, Room,
    RoomId, assign,
};
use twolies_store::RoomRepository;

use crate::broadcast::{Broadcaster, RoomEvent};
use crate::clock::{Clock, SystemClock};
use crate::error::PartyError;
use crate::generate::{LieGenerator, validate_lies};

/// What a join call hands back: the caller's player record, the room,
/// and the chat backlog so a rejoining client can repopulate its view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinResponse {
    pub player: Player,
    pub rejoined: bool,
    pub room: Room,
    pub chat: Vec<ChatMessage>,
}

/// A resolved round plus the room as committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessResponse {
    pub outcome: RevealOutcome,
    pub room: Room,
}

/// The game service. Generic over its hooks so tests can swap in a
/// scripted generator, a recording broadcaster, and a manual clock.
pub struct PartyService<G, B, C = SystemClock> {
    repo: Arc<RoomRepository>,
    generator: G,
    broadcaster: B,
    clock: C,
}

impl<G, B> PartyService<G, B, SystemClock>
where
    G: LieGenerator,
    B: Broadcaster,
{
    pub fn new(repo: Arc<RoomRepository>, generator: G, broadcaster: B) -> Self {
        Self::with_clock(repo, generator, broadcaster, SystemClock)
    }
}

impl<G, B, C> PartyService<G, B, C>
where
    G: LieGenerator,
    B: Broadcaster,
    C: Clock,
{
    pub fn with_clock(repo: Arc<RoomRepository>, generator: G, broadcaster: B, clock: C) -> Self {
        Self {
            repo,
            generator,
            broadcaster,
            clock,
        }
    }

    // -----------------------------------------------------------------
    // Lobby
    // -----------------------------------------------------------------

    /// Creates an empty lobby under a fresh room code.
    pub async fn create_room(&self) -> Result<Room, PartyError> {
        let room_id = RoomId::generate(&mut rand::rng());
        let (_, room) = self
            .repo
            .mutate_or_create(&room_id, |_room| Ok::<_, GameError>(()))
            .await?;
        info!(room_id = %room_id, "room created");
        Ok(room)
    }

    /// Joins (or rejoins) a room by name, creating the room on first
    /// contact. New members get a system greeting in the chat log.
    pub async fn join(&self, room_id: &RoomId, name: &str) -> Result<JoinResponse, PartyError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::Validation("player name must not be empty".into()).into());
        }

        let (outcome, room) = self
            .repo
            .mutate_or_create(room_id, |room| room.join(name, &mut rand::rng()))
            .await?;

        if outcome.rejoined {
            debug!(room_id = %room_id, player = name, "player rejoined");
        } else {
            info!(room_id = %room_id, player = name, phase = %room.game_phase, "player joined");
            let greeting = self.system_message(&outcome.player, format!("Hello I am {name}"));
            self.repo.append_chat(room_id, greeting.clone()).await?;
            self.publish(room_id, RoomEvent::ChatMessage { message: greeting })
                .await;
            self.publish(
                room_id,
                RoomEvent::PlayerJoined {
                    player: outcome.player.clone(),
                    room: room.clone(),
                },
            )
            .await;
        }
        self.publish(room_id, RoomEvent::RoomUpdate { room: room.clone() })
            .await;

        let chat = self.repo.chat_history(room_id).await?;
        Ok(JoinResponse {
            player: outcome.player,
            rejoined: outcome.rejoined,
            room,
            chat,
        })
    }

    /// Removes a player from the room.
    pub async fn leave(&self, room_id: &RoomId, player_id: &PlayerId) -> Result<Room, PartyError> {
        let (removed, room) = self.repo.mutate(room_id, |room| room.leave(player_id)).await?;
        info!(room_id = %room_id, player = %removed.name, "player left");
        let farewell =
            self.system_message(&removed, format!("{} has left the room", removed.name));
        self.repo.append_chat(room_id, farewell.clone()).await?;
        self.publish(room_id, RoomEvent::ChatMessage { message: farewell })
            .await;
        self.publish(
            room_id,
            RoomEvent::PlayerLeft {
                room: room.clone(),
                player_name: removed.name,
            },
        )
        .await;
        self.publish(room_id, RoomEvent::RoomUpdate { room: room.clone() })
            .await;
        Ok(room)
    }

    // -----------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------

    /// Takes a player's five truths, generates two lies for each, and
    /// commits the assembled rounds.
    ///
    /// Generation runs against a snapshot with no lock held. Commit
    /// re-validates, so a request that raced a phase change is rejected
    /// whole. All-or-nothing: if any generation call fails, nothing is
    /// stored.
    pub async fn submit_truths(
        &self,
        room_id: &RoomId,
        name: &str,
        truths: Vec<String>,
    ) -> Result<Room, PartyError> {
        let snapshot = self.repo.get(room_id).await?;
        snapshot.check_submit_truths(name, &truths)?;

        let mut rounds = Vec::with_capacity(truths.len());
        for truth in &truths {
            rounds.push(self.generate_round(room_id, truth).await?);
        }

        let (_, room) = self
            .repo
            .mutate(room_id, |room| room.commit_rounds(name, rounds))
            .await?;
        info!(room_id = %room_id, player = name, phase = %room.game_phase, "statements generated");
        self.publish(room_id, RoomEvent::RoomUpdate { room: room.clone() })
            .await;
        Ok(room)
    }

    /// Regenerates the lies for one of a player's rounds. The truth
    /// must match what was originally submitted; only the lies and the
    /// truth slot change.
    pub async fn regenerate_round(
        &self,
        room_id: &RoomId,
        name: &str,
        round_index: usize,
        truth: &str,
    ) -> Result<Room, PartyError> {
        let snapshot = self.repo.get(room_id).await?;
        snapshot.check_regenerate(name, round_index, truth)?;

        let fresh = self.generate_round(room_id, truth).await?;
        let (_, room) = self
            .repo
            .mutate(room_id, |room| {
                room.replace_round(name, round_index, fresh).map(|_| ())
            })
            .await?;
        debug!(room_id = %room_id, player = name, round_index, "round regenerated");
        self.publish(room_id, RoomEvent::RoomUpdate { room: room.clone() })
            .await;
        Ok(room)
    }

    /// Records whether a player is done reviewing their rounds.
    pub async fn review_complete(
        &self,
        room_id: &RoomId,
        name: &str,
        done: bool,
    ) -> Result<Room, PartyError> {
        let (_, room) = self
            .repo
            .mutate(room_id, |room| room.set_review_complete(name, done))
            .await?;
        self.publish(room_id, RoomEvent::RoomUpdate { room: room.clone() })
            .await;
        Ok(room)
    }

    // -----------------------------------------------------------------
    // Match
    // -----------------------------------------------------------------

    /// Starts the match. Host only.
    pub async fn start_game(&self, room_id: &RoomId, caller: &PlayerId) -> Result<Room, PartyError> {
        let now = self.clock.now_ms();
        let (_, room) = self.repo.mutate(room_id, |room| room.start(caller, now)).await?;
        info!(
            room_id = %room_id,
            presenter = ?room.current_player,
            guesser = ?room.current_guesser,
            "game started"
        );
        self.publish(room_id, RoomEvent::GameStarted { room: room.clone() })
            .await;
        self.publish(room_id, RoomEvent::RoomUpdate { room: room.clone() })
            .await;
        Ok(room)
    }

    /// Records the current guesser's guess and reveals the round.
    pub async fn guess(
        &self,
        room_id: &RoomId,
        caller: &PlayerId,
        slot: usize,
    ) -> Result<GuessResponse, PartyError> {
        let now = self.clock.now_ms();
        let (outcome, room) = self
            .repo
            .mutate(room_id, |room| room.guess(caller, slot, now))
            .await?;
        info!(
            room_id = %room_id,
            round = room.current_round,
            guess = slot,
            correct = outcome.correct,
            "round resolved by guess"
        );
        self.publish_reveal(room_id, &room, &outcome).await;
        Ok(GuessResponse { outcome, room })
    }

    /// Resolves the active round as timed out.
    pub async fn timeout(
        &self,
        room_id: &RoomId,
        caller: &PlayerId,
    ) -> Result<GuessResponse, PartyError> {
        let (outcome, room) = self
            .repo
            .mutate(room_id, |room| room.timeout(caller))
            .await?;
        info!(room_id = %room_id, round = room.current_round, "round resolved by timeout");
        self.publish_reveal(room_id, &room, &outcome).await;
        Ok(GuessResponse { outcome, room })
    }

    /// Marks the caller ready to leave the intermission; when both
    /// players are, the next round starts (or the match finishes).
    pub async fn advance_round(
        &self,
        room_id: &RoomId,
        caller: &PlayerId,
    ) -> Result<(AdvanceOutcome, Room), PartyError> {
        let now = self.clock.now_ms();
        let (outcome, room) = self
            .repo
            .mutate(room_id, |room| room.advance(caller, now))
            .await?;

        if outcome.finished {
            info!(room_id = %room_id, "game finished");
            self.publish(room_id, RoomEvent::GameFinished { room: room.clone() })
                .await;
        } else if outcome.all_ready {
            info!(
                room_id = %room_id,
                round = room.current_round,
                presenter = ?room.current_player,
                "round started"
            );
            self.publish(room_id, RoomEvent::RoundStarted { room: room.clone() })
                .await;
        }
        self.publish(room_id, RoomEvent::RoomUpdate { room: room.clone() })
            .await;
        Ok((outcome, room))
    }

    /// Resets the room for a rematch with the same players.
    pub async fn restart(&self, room_id: &RoomId) -> Result<Room, PartyError> {
        let (_, room) = self
            .repo
            .mutate(room_id, |room| {
                room.restart();
                Ok::<_, GameError>(())
            })
            .await?;
        info!(room_id = %room_id, "room restarted");
        self.publish(room_id, RoomEvent::RoomRestart { room: room.clone() })
            .await;
        self.publish(room_id, RoomEvent::RoomUpdate { room: room.clone() })
            .await;
        Ok(room)
    }

    // -----------------------------------------------------------------
    // Chat and snapshots
    // -----------------------------------------------------------------

    /// Appends a player's chat message and announces it.
    pub async fn send_chat(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        text: &str,
    ) -> Result<ChatMessage, PartyError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GameError::Validation("chat message must not be empty".into()).into());
        }
        let room = self.repo.get(room_id).await?;
        let player = room
            .player(player_id)
            .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))?;

        let message = ChatMessage {
            id: chat_id(&mut rand::rng()),
            player_id: player.id.clone(),
            player_name: player.name.clone(),
            message: text.to_string(),
            timestamp: self.clock.now_ms(),
            is_system: false,
        };
        self.repo.append_chat(room_id, message.clone()).await?;
        self.publish(
            room_id,
            RoomEvent::ChatMessage {
                message: message.clone(),
            },
        )
        .await;
        Ok(message)
    }

    /// The room as it stands right now.
    pub async fn room_snapshot(&self, room_id: &RoomId) -> Result<Room, PartyError> {
        Ok(self.repo.get(room_id).await?)
    }

    /// The room's chat log, oldest first.
    pub async fn chat_history(&self, room_id: &RoomId) -> Result<Vec<ChatMessage>, PartyError> {
        Ok(self.repo.chat_history(room_id).await?)
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    /// One generator call plus validation and slot assignment.
    async fn generate_round(
        &self,
        room_id: &RoomId,
        truth: &str,
    ) -> Result<PlayerRound, PartyError> {
        let pair = match self.generator.generate_lies(truth).await {
            Ok(pair) => pair,
            Err(err) => {
                warn!(room_id = %room_id, %err, "lie generation failed");
                return Err(err.into());
            }
        };
        validate_lies(truth, &pair)?;
        Ok(assign::build_round(
            &mut rand::rng(),
            truth,
            pair.lie1,
            pair.lie2,
        ))
    }

    async fn publish_reveal(&self, room_id: &RoomId, room: &Room, outcome: &RevealOutcome) {
        self.publish(
            room_id,
            RoomEvent::RoundResult {
                room: room.clone(),
                guess: outcome.guess,
                is_correct: outcome.correct,
                timed_out: outcome.timed_out,
                correct_answer: outcome.truth_index,
                correct_statement: outcome.truth_statement.clone(),
            },
        )
        .await;
        self.publish(room_id, RoomEvent::RoomUpdate { room: room.clone() })
            .await;
    }

    async fn publish(&self, room_id: &RoomId, event: RoomEvent) {
        self.broadcaster.publish(room_id, event).await;
    }

    fn system_message(&self, player: &Player, text: String) -> ChatMessage {
        ChatMessage {
            id: chat_id(&mut rand::rng()),
            player_id: player.id.clone(),
            player_name: player.name.clone(),
            message: text,
            timestamp: self.clock.now_ms(),
            is_system: true,
        }
    }
}

/// Short random id for chat messages.
fn chat_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.sample_iter(Alphanumeric)
        .take(9)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}
