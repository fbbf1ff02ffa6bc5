//! Turn scheduling: who presents, who guesses, and the guess timer.
//!
//! Turn order is pure parity arithmetic over the global round number
//! (1–10) and the fixed join order. Odd rounds show the first joiner's
//! statements; even rounds the second's. Each player's five rounds are
//! consumed in order, one every other global round.
//!
//! The timer is advisory wall-clock state, not a task: expiry is
//! detected by whichever operation (a late guess or an explicit
//! timeout) checks [`remaining_ms`].

use crate::model::{Player, PlayerId, ROUNDS_PER_PLAYER};

/// Derived turn roles for one global round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnAssignment {
    /// The player whose statements are on display.
    pub presenter: PlayerId,
    /// The player guessing. Always the other member.
    pub guesser: PlayerId,
    /// Index into the presenter's five pre-generated rounds (0–4).
    pub round_index: usize,
}

/// Index into `players` of the presenter: 0 for odd rounds, 1 for even.
pub fn presenter_index(round: u32) -> usize {
    if round % 2 == 1 { 0 } else { 1 }
}

/// Index into `players` of the guesser.
pub fn guesser_index(round: u32) -> usize {
    1 - presenter_index(round)
}

/// Which of the presenter's pre-generated rounds is active:
/// `floor((round - 1) / 2)`, always 0–4 for rounds 1–10.
pub fn player_round_index(round: u32) -> usize {
    ((round.saturating_sub(1)) / 2) as usize
}

/// Derives the turn assignment for a round, or `None` with fewer than
/// two players.
pub fn assignment(round: u32, players: &[Player]) -> Option<TurnAssignment> {
    if players.len() < 2 {
        return None;
    }
    let round_index = player_round_index(round);
    if round_index >= ROUNDS_PER_PLAYER {
        return None;
    }
    Some(TurnAssignment {
        presenter: players[presenter_index(round)].id.clone(),
        guesser: players[guesser_index(round)].id.clone(),
        round_index,
    })
}

/// Milliseconds left on the guess timer at `now_ms`.
///
/// Returns the full duration when the timer has not started, and 0 once
/// the window has closed (never negative).
pub fn remaining_ms(timer_start: Option<u64>, duration_ms: u64, now_ms: u64) -> u64 {
    match timer_start {
        Some(start) => duration_ms.saturating_sub(now_ms.saturating_sub(start)),
        None => duration_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlayerId;

    fn players() -> Vec<Player> {
        vec![
            Player::new(PlayerId::from("a"), "Alice"),
            Player::new(PlayerId::from("b"), "Bob"),
        ]
    }

    #[test]
    fn test_turn_parity_across_all_rounds() {
        let players = players();
        for round in 1..=10u32 {
            let turn = assignment(round, &players).unwrap();
            if round % 2 == 1 {
                assert_eq!(turn.presenter, players[0].id, "round {round}");
                assert_eq!(turn.guesser, players[1].id, "round {round}");
            } else {
                assert_eq!(turn.presenter, players[1].id, "round {round}");
                assert_eq!(turn.guesser, players[0].id, "round {round}");
            }
            assert_ne!(turn.presenter, turn.guesser);
        }
    }

    #[test]
    fn test_player_round_index_stays_in_range() {
        for round in 1..=10u32 {
            let idx = player_round_index(round);
            assert!(idx <= 4, "round {round} gave index {idx}");
        }
        assert_eq!(player_round_index(1), 0);
        assert_eq!(player_round_index(2), 0);
        assert_eq!(player_round_index(3), 1);
        assert_eq!(player_round_index(9), 4);
        assert_eq!(player_round_index(10), 4);
    }

    #[test]
    fn test_assignment_requires_two_players() {
        assert!(assignment(1, &[]).is_none());
        let one = vec![Player::new(PlayerId::from("a"), "Alice")];
        assert!(assignment(1, &one).is_none());
    }

    #[test]
    fn test_assignment_rejects_round_past_ten() {
        assert!(assignment(11, &players()).is_none());
    }

    #[test]
    fn test_remaining_ms_counts_down_and_floors_at_zero() {
        assert_eq!(remaining_ms(Some(1_000), 30_000, 1_000), 30_000);
        assert_eq!(remaining_ms(Some(1_000), 30_000, 16_000), 15_000);
        assert_eq!(remaining_ms(Some(1_000), 30_000, 31_000), 0);
        assert_eq!(remaining_ms(Some(1_000), 30_000, 99_000), 0);
    }

    #[test]
    fn test_remaining_ms_without_started_timer_is_full_window() {
        assert_eq!(remaining_ms(None, 30_000, 123), 30_000);
    }

    #[test]
    fn test_remaining_ms_tolerates_clock_skew() {
        // A timestamp before the recorded start must not underflow.
        assert_eq!(remaining_ms(Some(5_000), 30_000, 4_000), 30_000);
    }
}
