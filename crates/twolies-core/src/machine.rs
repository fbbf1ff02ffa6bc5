//! Phase transitions for a [`Room`].
//!
//! Every operation a player can take on a session lives here as a
//! method on `Room`: join, submit truths, regenerate, review, start,
//! guess, timeout, advance, restart, leave. Each one validates the
//! caller's role and the room's current phase before touching anything,
//! so a rejected operation leaves the room exactly as it was; stores
//! can apply these under a lock and discard the copy on `Err`.
//!
//! Lie generation is an external, slow call and must never run while a
//! room is locked. Submit-truths is therefore split in two: a read-only
//! [`Room::check_submit_truths`] run against a snapshot before calling
//! the generator, and [`Room::commit_rounds`] which re-validates and
//! commits under the lock.

use rand::Rng;

use crate::error::GameError;
use crate::evaluate::{self, RevealOutcome};
use crate::model::{
    GamePhase, Player, PlayerId, PlayerRound, Room, RoundPhase, ROUNDS_PER_PLAYER,
};
use crate::turns;

/// Result of a join: the (possibly pre-existing) player record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub player: Player,
    /// `true` when the name matched an existing member (idempotent join).
    pub rejoined: bool,
}

/// Result of an advance-round call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceOutcome {
    /// Both players confirmed; the room moved on.
    pub all_ready: bool,
    pub ready_count: usize,
    /// The match just ended (round 10 was the one being left).
    pub finished: bool,
}

impl Room {
    // -----------------------------------------------------------------
    // Lobby
    // -----------------------------------------------------------------

    /// Adds a player, or returns the existing record when the name is
    /// already a member.
    ///
    /// The first joiner becomes host; the second join moves the room
    /// from `waiting` to `generating`.
    pub fn join<R: Rng + ?Sized>(
        &mut self,
        name: &str,
        rng: &mut R,
    ) -> Result<JoinOutcome, GameError> {
        if let Some(existing) = self.player_by_name(name) {
            return Ok(JoinOutcome {
                player: existing.clone(),
                rejoined: true,
            });
        }
        if !self.game_phase.is_joinable() {
            return Err(GameError::InvalidState(format!(
                "cannot join a room in phase {}",
                self.game_phase
            )));
        }
        if self.players.len() >= 2 {
            return Err(GameError::RoomFull);
        }

        let player = Player::new(PlayerId::generate(rng), name);
        if self.players.is_empty() {
            self.host_id = Some(player.id.clone());
        }
        self.players.push(player.clone());
        if self.players.len() == 2 {
            self.game_phase = GamePhase::Generating;
        }

        Ok(JoinOutcome {
            player,
            rejoined: false,
        })
    }

    /// Removes a player. Promotes the next remaining member to host if
    /// the host left; an emptied room resets to `waiting` so the id can
    /// be reused by a later join.
    ///
    /// A departing guesser does not auto-resolve the active round: the
    /// round stays unresolved and the room stalls until a restart or a
    /// rejoin.
    pub fn leave(&mut self, player_id: &PlayerId) -> Result<Player, GameError> {
        let pos = self
            .players
            .iter()
            .position(|p| &p.id == player_id)
            .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))?;
        let removed = self.players.remove(pos);
        self.players_ready.retain(|id| id != player_id);

        if self.host_id.as_ref() == Some(player_id) {
            self.host_id = self.players.first().map(|p| p.id.clone());
        }
        if self.players.is_empty() {
            self.game_phase = GamePhase::Waiting;
            self.started = false;
            self.host_id = None;
        }

        Ok(removed)
    }

    // -----------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------

    /// Validates a submit-truths request without mutating anything.
    ///
    /// Run against a snapshot before the slow lie-generation calls;
    /// [`Room::commit_rounds`] repeats these checks at commit time.
    pub fn check_submit_truths(&self, name: &str, truths: &[String]) -> Result<(), GameError> {
        if self.game_phase != GamePhase::Generating {
            return Err(GameError::InvalidState(format!(
                "truths can only be submitted in the generating phase, room is {}",
                self.game_phase
            )));
        }
        let player = self
            .player_by_name(name)
            .ok_or_else(|| GameError::PlayerNotFound(name.to_string()))?;
        if player.has_generated {
            return Err(GameError::InvalidState(
                "player has already generated statements".into(),
            ));
        }
        if truths.len() != ROUNDS_PER_PLAYER {
            return Err(GameError::Validation(format!(
                "exactly {ROUNDS_PER_PLAYER} truths required, got {}",
                truths.len()
            )));
        }
        if truths.iter().any(|t| t.trim().is_empty()) {
            return Err(GameError::Validation("truths must not be empty".into()));
        }
        Ok(())
    }

    /// Stores a player's five generated rounds and marks them ready.
    ///
    /// Moves the room to `ready` once both players have generated.
    /// All-or-nothing: a failed validation stores no rounds, so a
    /// generator failure upstream can never leave a player half-done.
    pub fn commit_rounds(
        &mut self,
        name: &str,
        rounds: Vec<PlayerRound>,
    ) -> Result<(), GameError> {
        let truths: Vec<String> = rounds.iter().map(|r| r.truth.clone()).collect();
        self.check_submit_truths(name, &truths)?;

        let player = self
            .player_by_name_mut(name)
            .ok_or_else(|| GameError::PlayerNotFound(name.to_string()))?;
        player.rounds = rounds;
        player.has_generated = true;
        player.ready = true;
        player.review_complete = true;

        if self.players.len() == 2 && self.all_generated() {
            self.game_phase = GamePhase::Ready;
        }
        Ok(())
    }

    /// Validates a regenerate request against the stored round.
    ///
    /// `expected_truth` must match the stored truth: regeneration only
    /// redraws the lies and the truth slot, never the truth itself.
    pub fn check_regenerate(
        &self,
        name: &str,
        round_index: usize,
        expected_truth: &str,
    ) -> Result<(), GameError> {
        if round_index >= ROUNDS_PER_PLAYER {
            return Err(GameError::Validation(format!(
                "round index must be 0-4, got {round_index}"
            )));
        }
        let player = self
            .player_by_name(name)
            .ok_or_else(|| GameError::PlayerNotFound(name.to_string()))?;
        let round = player
            .rounds
            .get(round_index)
            .ok_or(GameError::RoundNotFound)?;
        if round.truth != expected_truth {
            return Err(GameError::Validation("truth mismatch".into()));
        }
        Ok(())
    }

    /// Replaces one generated round with freshly assigned statements.
    /// The game phase is untouched.
    pub fn replace_round(
        &mut self,
        name: &str,
        round_index: usize,
        round: PlayerRound,
    ) -> Result<PlayerRound, GameError> {
        self.check_regenerate(name, round_index, &round.truth)?;
        let player = self
            .player_by_name_mut(name)
            .ok_or_else(|| GameError::PlayerNotFound(name.to_string()))?;
        player.rounds[round_index] = round.clone();
        Ok(round)
    }

    /// Records whether a player has finished reviewing their own rounds.
    pub fn set_review_complete(&mut self, name: &str, done: bool) -> Result<(), GameError> {
        let player = self
            .player_by_name_mut(name)
            .ok_or_else(|| GameError::PlayerNotFound(name.to_string()))?;
        player.review_complete = done;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Match
    // -----------------------------------------------------------------

    /// Starts the match. Host-only; requires two generated, reviewed
    /// players and a room that has not started yet.
    pub fn start(&mut self, caller: &PlayerId, now_ms: u64) -> Result<(), GameError> {
        if self.player(caller).is_none() {
            return Err(GameError::PlayerNotFound(caller.to_string()));
        }
        if !self.is_host(caller) {
            return Err(GameError::NotHost);
        }
        if self.players.len() < 2 {
            return Err(GameError::InvalidState(
                "two players are required to start".into(),
            ));
        }
        if self.started {
            return Err(GameError::InvalidState("game already started".into()));
        }
        if !self.players.iter().all(|p| p.ready && p.review_complete) {
            return Err(GameError::InvalidState(
                "all players must be ready and done reviewing".into(),
            ));
        }

        self.started = true;
        self.game_phase = GamePhase::Playing;
        self.current_round = 1;
        self.begin_round(now_ms)?;
        Ok(())
    }

    /// Records a guess by the current guesser against the active round.
    ///
    /// Rejected once the 30-second window has closed, whether or not a
    /// timeout has been recorded yet; both expiry-detection paths see
    /// the same rule. On success the round moves to intermission.
    pub fn guess(
        &mut self,
        caller: &PlayerId,
        slot: usize,
        now_ms: u64,
    ) -> Result<RevealOutcome, GameError> {
        self.check_guessing(caller)?;
        if turns::remaining_ms(self.timer_start, self.timer_duration, now_ms) == 0 {
            return Err(GameError::TimerExpired);
        }
        let round = self.active_round_mut()?;
        let outcome = evaluate::record_guess(round, slot)?;
        self.begin_intermission();
        Ok(outcome)
    }

    /// Records a timeout for the active round.
    ///
    /// The trigger may be a client signal or a server-side sweep; either
    /// way it is rejected if a guess already resolved the round.
    pub fn timeout(&mut self, caller: &PlayerId) -> Result<RevealOutcome, GameError> {
        self.check_guessing(caller)?;
        let round = self.active_round_mut()?;
        let outcome = evaluate::record_timeout(round)?;
        self.begin_intermission();
        Ok(outcome)
    }

    /// Marks a player ready to leave the intermission. Idempotent per
    /// player. When both players are ready the room either starts the
    /// next round or, after round 10, finishes the match.
    pub fn advance(&mut self, caller: &PlayerId, now_ms: u64) -> Result<AdvanceOutcome, GameError> {
        if self.player(caller).is_none() {
            return Err(GameError::PlayerNotFound(caller.to_string()));
        }
        if self.game_phase != GamePhase::Playing || self.round_phase != RoundPhase::Intermission {
            return Err(GameError::InvalidState("not in intermission".into()));
        }

        if !self.players_ready.contains(caller) {
            self.players_ready.push(caller.clone());
        }
        let ready_count = self.players_ready.len();
        let all_ready = self
            .players
            .iter()
            .all(|p| self.players_ready.contains(&p.id));
        if !all_ready {
            return Ok(AdvanceOutcome {
                all_ready: false,
                ready_count,
                finished: false,
            });
        }

        if self.current_round < self.max_rounds {
            self.current_round += 1;
            self.begin_round(now_ms)?;
            Ok(AdvanceOutcome {
                all_ready: true,
                ready_count,
                finished: false,
            })
        } else {
            self.game_phase = GamePhase::Finished;
            Ok(AdvanceOutcome {
                all_ready: true,
                ready_count,
                finished: true,
            })
        }
    }

    /// Resets the session for a rematch: back to `generating` with the
    /// same members, all rounds and per-player flags cleared. The host
    /// keeps the role.
    pub fn restart(&mut self) {
        self.game_phase = GamePhase::Generating;
        self.round_phase = RoundPhase::Playing;
        self.current_round = 1;
        self.current_player = None;
        self.current_guesser = None;
        self.started = false;
        self.timer_start = None;
        self.players_ready.clear();
        for player in &mut self.players {
            player.has_generated = false;
            player.ready = false;
            player.review_complete = false;
            player.rounds.clear();
        }
    }

    /// Milliseconds left on the active guess timer.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        turns::remaining_ms(self.timer_start, self.timer_duration, now_ms)
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    /// Derives the turn roles for `current_round`, arms the timer, and
    /// enters the playing round-phase.
    fn begin_round(&mut self, now_ms: u64) -> Result<(), GameError> {
        let turn = turns::assignment(self.current_round, &self.players).ok_or_else(|| {
            GameError::InvalidState(format!(
                "no turn assignment for round {}",
                self.current_round
            ))
        })?;
        self.current_player = Some(turn.presenter);
        self.current_guesser = Some(turn.guesser);
        self.round_phase = RoundPhase::Playing;
        self.timer_start = Some(now_ms);
        self.players_ready.clear();
        Ok(())
    }

    fn begin_intermission(&mut self) {
        self.round_phase = RoundPhase::Intermission;
        self.players_ready.clear();
    }

    /// Common precondition for guess and timeout: the room is mid-round
    /// and the caller is the current guesser.
    fn check_guessing(&self, caller: &PlayerId) -> Result<(), GameError> {
        if self.game_phase != GamePhase::Playing || self.round_phase != RoundPhase::Playing {
            return Err(GameError::InvalidState(
                "round is not in the playing phase".into(),
            ));
        }
        if self.current_guesser.as_ref() != Some(caller) {
            return Err(GameError::NotGuesser);
        }
        Ok(())
    }

    /// The presenter's active [`PlayerRound`] for `current_round`.
    fn active_round_mut(&mut self) -> Result<&mut PlayerRound, GameError> {
        let presenter = self
            .current_player
            .clone()
            .ok_or(GameError::RoundNotFound)?;
        let round_index = turns::player_round_index(self.current_round);
        self.player_mut(&presenter)
            .and_then(|p| p.rounds.get_mut(round_index))
            .ok_or(GameError::RoundNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::place_statements;
    use crate::model::RoomId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(99)
    }

    /// Five rounds with the truth pinned to a known slot per round.
    fn rounds_for(name: &str, truth_index: usize) -> Vec<PlayerRound> {
        (0..ROUNDS_PER_PLAYER)
            .map(|i| {
                let truth = format!("{name} truth {i}");
                let lie1 = format!("{name} lie {i}a");
                let lie2 = format!("{name} lie {i}b");
                PlayerRound {
                    statements: place_statements(&truth, &lie1, &lie2, truth_index),
                    truth,
                    lie1,
                    lie2,
                    truth_index,
                    guess: None,
                    guessed_correctly: None,
                    revealed: false,
                    timed_out: false,
                }
            })
            .collect()
    }

    fn truths_for(name: &str) -> Vec<String> {
        (0..ROUNDS_PER_PLAYER)
            .map(|i| format!("{name} truth {i}"))
            .collect()
    }

    /// A room with Alice (host) and Bob joined.
    fn lobby() -> (Room, PlayerId, PlayerId) {
        let mut room = Room::new(RoomId::from("R1"));
        let mut rng = rng();
        let alice = room.join("Alice", &mut rng).unwrap().player.id;
        let bob = room.join("Bob", &mut rng).unwrap().player.id;
        (room, alice, bob)
    }

    /// A room started and sitting at round 1, truth slot 1 everywhere.
    fn started_room() -> (Room, PlayerId, PlayerId) {
        let (mut room, alice, bob) = lobby();
        room.commit_rounds("Alice", rounds_for("Alice", 1)).unwrap();
        room.commit_rounds("Bob", rounds_for("Bob", 1)).unwrap();
        room.start(&alice, 1_000).unwrap();
        (room, alice, bob)
    }

    // -- Join ------------------------------------------------------------

    #[test]
    fn test_first_joiner_becomes_host() {
        let mut room = Room::new(RoomId::from("R1"));
        let outcome = room.join("Alice", &mut rng()).unwrap();
        assert!(!outcome.rejoined);
        assert_eq!(room.host_id, Some(outcome.player.id));
        assert_eq!(room.game_phase, GamePhase::Waiting);
    }

    #[test]
    fn test_second_join_moves_to_generating() {
        let (room, _, _) = lobby();
        assert_eq!(room.players.len(), 2);
        assert_eq!(room.game_phase, GamePhase::Generating);
    }

    #[test]
    fn test_third_join_rejected() {
        let (mut room, _, _) = lobby();
        let err = room.join("Carol", &mut rng()).unwrap_err();
        assert_eq!(err, GameError::RoomFull);
        assert_eq!(room.players.len(), 2);
    }

    #[test]
    fn test_rejoin_by_name_is_idempotent() {
        let (mut room, alice, _) = lobby();
        let outcome = room.join("Alice", &mut rng()).unwrap();
        assert!(outcome.rejoined);
        assert_eq!(outcome.player.id, alice);
        assert_eq!(room.players.len(), 2);
    }

    #[test]
    fn test_rejoin_works_even_mid_game() {
        let (mut room, _, bob) = started_room();
        let outcome = room.join("Bob", &mut rng()).unwrap();
        assert!(outcome.rejoined);
        assert_eq!(outcome.player.id, bob);
    }

    #[test]
    fn test_new_player_cannot_join_mid_game() {
        let (mut room, _, bob) = started_room();
        room.leave(&bob).unwrap();
        let err = room.join("Carol", &mut rng()).unwrap_err();
        assert!(matches!(err, GameError::InvalidState(_)));
    }

    // -- Submit truths ---------------------------------------------------

    #[test]
    fn test_submit_requires_generating_phase() {
        let mut room = Room::new(RoomId::from("R1"));
        room.join("Alice", &mut rng()).unwrap();
        // Only one player: still waiting.
        let err = room
            .check_submit_truths("Alice", &truths_for("Alice"))
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidState(_)));
    }

    #[test]
    fn test_submit_requires_exactly_five_truths() {
        let (room, _, _) = lobby();
        let err = room
            .check_submit_truths("Alice", &truths_for("Alice")[..4].to_vec())
            .unwrap_err();
        assert!(matches!(err, GameError::Validation(_)));
    }

    #[test]
    fn test_submit_rejects_blank_truth() {
        let (room, _, _) = lobby();
        let mut truths = truths_for("Alice");
        truths[2] = "   ".into();
        let err = room.check_submit_truths("Alice", &truths).unwrap_err();
        assert!(matches!(err, GameError::Validation(_)));
    }

    #[test]
    fn test_commit_rounds_marks_player_generated() {
        let (mut room, _, _) = lobby();
        room.commit_rounds("Alice", rounds_for("Alice", 0)).unwrap();
        let alice = room.player_by_name("Alice").unwrap();
        assert!(alice.has_generated && alice.ready && alice.review_complete);
        assert_eq!(alice.rounds.len(), 5);
        // One player generated: still generating.
        assert_eq!(room.game_phase, GamePhase::Generating);
    }

    #[test]
    fn test_both_committed_moves_to_ready() {
        let (mut room, _, _) = lobby();
        room.commit_rounds("Alice", rounds_for("Alice", 0)).unwrap();
        room.commit_rounds("Bob", rounds_for("Bob", 2)).unwrap();
        assert_eq!(room.game_phase, GamePhase::Ready);
    }

    #[test]
    fn test_double_commit_rejected() {
        let (mut room, _, _) = lobby();
        room.commit_rounds("Alice", rounds_for("Alice", 0)).unwrap();
        let err = room
            .commit_rounds("Alice", rounds_for("Alice", 1))
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidState(_)));
    }

    // -- Regenerate / review ---------------------------------------------

    #[test]
    fn test_replace_round_swaps_lies_keeps_truth() {
        let (mut room, _, _) = lobby();
        room.commit_rounds("Alice", rounds_for("Alice", 0)).unwrap();

        let truth = "Alice truth 3".to_string();
        let fresh = PlayerRound {
            statements: place_statements(&truth, "new a", "new b", 2),
            truth: truth.clone(),
            lie1: "new a".into(),
            lie2: "new b".into(),
            truth_index: 2,
            guess: None,
            guessed_correctly: None,
            revealed: false,
            timed_out: false,
        };
        room.replace_round("Alice", 3, fresh).unwrap();

        let stored = &room.player_by_name("Alice").unwrap().rounds[3];
        assert_eq!(stored.truth, truth);
        assert_eq!(stored.lie1, "new a");
        assert_eq!(stored.truth_index, 2);
        assert_eq!(room.game_phase, GamePhase::Generating);
    }

    #[test]
    fn test_regenerate_truth_mismatch_rejected() {
        let (mut room, _, _) = lobby();
        room.commit_rounds("Alice", rounds_for("Alice", 0)).unwrap();
        let err = room
            .check_regenerate("Alice", 3, "a truth nobody submitted")
            .unwrap_err();
        assert_eq!(err, GameError::Validation("truth mismatch".into()));
    }

    #[test]
    fn test_regenerate_index_out_of_range_rejected() {
        let (mut room, _, _) = lobby();
        room.commit_rounds("Alice", rounds_for("Alice", 0)).unwrap();
        let err = room
            .check_regenerate("Alice", 5, "Alice truth 0")
            .unwrap_err();
        assert!(matches!(err, GameError::Validation(_)));
    }

    #[test]
    fn test_regenerate_before_generation_rejected() {
        let (room, _, _) = lobby();
        let err = room
            .check_regenerate("Alice", 0, "Alice truth 0")
            .unwrap_err();
        assert_eq!(err, GameError::RoundNotFound);
    }

    #[test]
    fn test_review_toggle_only_touches_named_player() {
        let (mut room, _, _) = lobby();
        room.commit_rounds("Alice", rounds_for("Alice", 0)).unwrap();
        room.set_review_complete("Alice", false).unwrap();
        assert!(!room.player_by_name("Alice").unwrap().review_complete);
        assert!(!room.player_by_name("Bob").unwrap().review_complete);
        room.set_review_complete("Alice", true).unwrap();
        assert!(room.player_by_name("Alice").unwrap().review_complete);
    }

    // -- Start -----------------------------------------------------------

    #[test]
    fn test_start_sets_up_round_one() {
        let (room, alice, bob) = started_room();
        assert_eq!(room.game_phase, GamePhase::Playing);
        assert_eq!(room.round_phase, RoundPhase::Playing);
        assert_eq!(room.current_round, 1);
        assert!(room.started);
        assert_eq!(room.current_player, Some(alice));
        assert_eq!(room.current_guesser, Some(bob));
        assert_eq!(room.timer_start, Some(1_000));
        assert!(room.players_ready.is_empty());
    }

    #[test]
    fn test_start_rejects_non_host() {
        let (mut room, _, bob) = lobby();
        room.commit_rounds("Alice", rounds_for("Alice", 1)).unwrap();
        room.commit_rounds("Bob", rounds_for("Bob", 1)).unwrap();
        assert_eq!(room.start(&bob, 0).unwrap_err(), GameError::NotHost);
    }

    #[test]
    fn test_start_rejects_unready_players() {
        let (mut room, alice, _) = lobby();
        room.commit_rounds("Alice", rounds_for("Alice", 1)).unwrap();
        let err = room.start(&alice, 0).unwrap_err();
        assert!(matches!(err, GameError::InvalidState(_)));
    }

    #[test]
    fn test_start_rejects_unreviewed_players() {
        let (mut room, alice, _) = lobby();
        room.commit_rounds("Alice", rounds_for("Alice", 1)).unwrap();
        room.commit_rounds("Bob", rounds_for("Bob", 1)).unwrap();
        room.set_review_complete("Bob", false).unwrap();
        let err = room.start(&alice, 0).unwrap_err();
        assert!(matches!(err, GameError::InvalidState(_)));
    }

    #[test]
    fn test_start_twice_rejected() {
        let (mut room, alice, _) = started_room();
        let err = room.start(&alice, 2_000).unwrap_err();
        assert!(matches!(err, GameError::InvalidState(_)));
    }

    // -- Guess / timeout -------------------------------------------------

    #[test]
    fn test_correct_guess_moves_to_intermission() {
        let (mut room, _, bob) = started_room();
        let outcome = room.guess(&bob, 1, 2_000).unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.truth_statement, "Alice truth 0");
        assert_eq!(room.round_phase, RoundPhase::Intermission);
        assert!(room.players_ready.is_empty());
    }

    #[test]
    fn test_guess_by_presenter_rejected() {
        let (mut room, alice, _) = started_room();
        assert_eq!(room.guess(&alice, 1, 2_000).unwrap_err(), GameError::NotGuesser);
    }

    #[test]
    fn test_guess_outside_playing_phase_rejected() {
        let (mut room, _, bob) = started_room();
        room.guess(&bob, 0, 2_000).unwrap();
        // Now in intermission.
        let err = room.guess(&bob, 1, 3_000).unwrap_err();
        assert!(matches!(err, GameError::InvalidState(_)));
    }

    #[test]
    fn test_late_guess_rejected_once_window_closes() {
        let (mut room, _, bob) = started_room();
        // Timer armed at 1_000; 30_000 later the window is shut.
        let err = room.guess(&bob, 1, 31_000).unwrap_err();
        assert_eq!(err, GameError::TimerExpired);
        // The round itself is untouched and can still be timed out.
        room.timeout(&bob).unwrap();
    }

    #[test]
    fn test_guess_just_inside_window_accepted() {
        let (mut room, _, bob) = started_room();
        room.guess(&bob, 1, 30_999).unwrap();
    }

    #[test]
    fn test_timeout_then_guess_rejected() {
        let (mut room, _, bob) = started_room();
        let outcome = room.timeout(&bob).unwrap();
        assert!(outcome.timed_out && !outcome.correct);
        let round = &room.player_by_name("Alice").unwrap().rounds[0];
        assert!(round.timed_out && round.revealed);
        assert_eq!(round.guessed_correctly, Some(false));
        // Intermission now; a guess is out of phase.
        let err = room.guess(&bob, 1, 2_000).unwrap_err();
        assert!(matches!(err, GameError::InvalidState(_)));
    }

    #[test]
    fn test_timeout_by_non_guesser_rejected() {
        let (mut room, alice, _) = started_room();
        assert_eq!(room.timeout(&alice).unwrap_err(), GameError::NotGuesser);
    }

    // -- Advance ---------------------------------------------------------

    #[test]
    fn test_advance_requires_intermission() {
        let (mut room, _, bob) = started_room();
        let err = room.advance(&bob, 2_000).unwrap_err();
        assert!(matches!(err, GameError::InvalidState(_)));
    }

    #[test]
    fn test_advance_is_idempotent_per_player() {
        let (mut room, _, bob) = started_room();
        room.guess(&bob, 1, 2_000).unwrap();

        let first = room.advance(&bob, 3_000).unwrap();
        assert!(!first.all_ready);
        assert_eq!(first.ready_count, 1);
        let second = room.advance(&bob, 3_100).unwrap();
        assert_eq!(second.ready_count, 1, "duplicate must not double-count");
    }

    #[test]
    fn test_both_ready_starts_next_round_with_swapped_roles() {
        let (mut room, alice, bob) = started_room();
        room.guess(&bob, 1, 2_000).unwrap();
        room.advance(&bob, 3_000).unwrap();
        let outcome = room.advance(&alice, 3_500).unwrap();

        assert!(outcome.all_ready && !outcome.finished);
        assert_eq!(room.current_round, 2);
        assert_eq!(room.current_player, Some(bob));
        assert_eq!(room.current_guesser, Some(alice));
        assert_eq!(room.round_phase, RoundPhase::Playing);
        assert_eq!(room.timer_start, Some(3_500));
        assert!(room.players_ready.is_empty());
    }

    #[test]
    fn test_full_match_finishes_after_round_ten() {
        let (mut room, alice, bob) = started_room();
        let mut now = 2_000u64;
        for round in 1..=10u32 {
            assert_eq!(room.current_round, round);
            let guesser = room.current_guesser.clone().unwrap();
            room.guess(&guesser, 1, now).unwrap();
            now += 100;
            room.advance(&alice, now).unwrap();
            let outcome = room.advance(&bob, now).unwrap();
            if round < 10 {
                assert!(!outcome.finished);
            } else {
                assert!(outcome.finished);
            }
        }
        assert_eq!(room.game_phase, GamePhase::Finished);
    }

    // -- Restart / leave -------------------------------------------------

    #[test]
    fn test_restart_clears_rounds_keeps_members() {
        let (mut room, alice, _) = started_room();
        let bob_guesser = room.current_guesser.clone().unwrap();
        room.guess(&bob_guesser, 1, 2_000).unwrap();

        room.restart();

        assert_eq!(room.game_phase, GamePhase::Generating);
        assert_eq!(room.round_phase, RoundPhase::Playing);
        assert_eq!(room.current_round, 1);
        assert!(!room.started);
        assert!(room.current_player.is_none() && room.current_guesser.is_none());
        assert!(room.timer_start.is_none());
        assert_eq!(room.players.len(), 2);
        assert_eq!(room.host_id, Some(alice));
        for p in &room.players {
            assert!(!p.has_generated && !p.ready && !p.review_complete);
            assert!(p.rounds.is_empty());
        }
    }

    #[test]
    fn test_host_leave_promotes_next_player() {
        let (mut room, alice, bob) = lobby();
        room.leave(&alice).unwrap();
        assert_eq!(room.host_id, Some(bob));
        assert_eq!(room.players.len(), 1);
    }

    #[test]
    fn test_last_leave_resets_room_to_waiting() {
        let (mut room, alice, bob) = started_room();
        room.leave(&alice).unwrap();
        room.leave(&bob).unwrap();
        assert!(room.players.is_empty());
        assert_eq!(room.game_phase, GamePhase::Waiting);
        assert!(!room.started);
        assert!(room.host_id.is_none());
    }

    #[test]
    fn test_leave_unknown_player_rejected() {
        let (mut room, _, _) = lobby();
        let err = room.leave(&PlayerId::from("nobody")).unwrap_err();
        assert!(matches!(err, GameError::PlayerNotFound(_)));
    }

    #[test]
    fn test_guesser_leave_leaves_round_unresolved() {
        let (mut room, _, bob) = started_room();
        room.leave(&bob).unwrap();
        assert_eq!(room.game_phase, GamePhase::Playing);
        let round = &room.player_by_name("Alice").unwrap().rounds[0];
        assert!(!round.revealed, "no auto-timeout on leave");
    }

    #[test]
    fn test_player_cap_survives_join_leave_churn() {
        let mut room = Room::new(RoomId::from("R1"));
        let mut rng = rng();
        for i in 0..20 {
            let name = format!("p{i}");
            match room.join(&name, &mut rng) {
                Ok(outcome) => {
                    assert!(room.players.len() <= 2);
                    if i % 3 == 0 {
                        room.leave(&outcome.player.id).unwrap();
                    }
                }
                Err(GameError::RoomFull) => assert_eq!(room.players.len(), 2),
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert!(room.players.len() <= 2);
    }
}
