//! Guess evaluation: resolving a round by guess or by timeout.
//!
//! A round resolves exactly once. Whichever of the two paths gets there
//! first marks the round `revealed`, and the loser of the race is
//! rejected with [`GameError::RoundAlreadyResolved`].
//!
//! Scores are not stored anywhere: a [`RevealOutcome`] carries the
//! correctness of this reveal, and callers that want a running total
//! accumulate outcomes per guesser as they happen. The engine cannot
//! reconstruct after the fact which player was guessing a past round.

use crate::error::GameError;
use crate::model::{PlayerRound, STATEMENTS_PER_ROUND};

/// The result of resolving one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealOutcome {
    /// The guessed slot, or `None` when the round timed out.
    pub guess: Option<usize>,
    pub correct: bool,
    pub timed_out: bool,
    /// The slot that held the truth.
    pub truth_index: usize,
    /// The true statement, for display in the reveal.
    pub truth_statement: String,
}

/// Records a guess against an unresolved round.
pub fn record_guess(round: &mut PlayerRound, slot: usize) -> Result<RevealOutcome, GameError> {
    if slot >= STATEMENTS_PER_ROUND {
        return Err(GameError::Validation(format!(
            "guess slot must be 0-2, got {slot}"
        )));
    }
    if round.is_resolved() {
        return Err(GameError::RoundAlreadyResolved);
    }

    let correct = slot == round.truth_index;
    round.guess = Some(slot);
    round.guessed_correctly = Some(correct);
    round.revealed = true;

    Ok(RevealOutcome {
        guess: Some(slot),
        correct,
        timed_out: false,
        truth_index: round.truth_index,
        truth_statement: round.statements[round.truth_index].clone(),
    })
}

/// Records a timeout against an unresolved round.
pub fn record_timeout(round: &mut PlayerRound) -> Result<RevealOutcome, GameError> {
    if round.is_resolved() {
        return Err(GameError::RoundAlreadyResolved);
    }

    round.timed_out = true;
    round.guessed_correctly = Some(false);
    round.revealed = true;

    Ok(RevealOutcome {
        guess: None,
        correct: false,
        timed_out: true,
        truth_index: round.truth_index,
        truth_statement: round.statements[round.truth_index].clone(),
    })
}
