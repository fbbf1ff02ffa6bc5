//! Statement assignment: turning (truth, lie, lie) into the three
//! display slots.
//!
//! The only randomness is the choice of the truth slot, and the caller
//! supplies the RNG, so tests can seed it and assert exact placement.
//! Both the initial five-round generation and single-round regeneration
//! go through this module, so there is exactly one placement rule.

use rand::Rng;

use crate::model::{PlayerRound, STATEMENTS_PER_ROUND};

/// Draws the truth slot uniformly from {0, 1, 2}.
pub fn draw_truth_index<R: Rng + ?Sized>(rng: &mut R) -> usize {
    rng.random_range(0..STATEMENTS_PER_ROUND)
}

/// Places the three statements deterministically for a given truth slot.
///
/// The truth takes `truth_index`; the first lie takes the lowest free
/// slot, the second lie the next.
///
/// # Panics
///
/// Panics if `truth_index` is out of range. Callers obtain the index
/// from [`draw_truth_index`], which cannot produce one.
pub fn place_statements(
    truth: &str,
    lie1: &str,
    lie2: &str,
    truth_index: usize,
) -> [String; STATEMENTS_PER_ROUND] {
    assert!(truth_index < STATEMENTS_PER_ROUND, "truth slot out of range");
    let mut lies = [lie1, lie2].into_iter();
    let mut slots: [String; STATEMENTS_PER_ROUND] = Default::default();
    for (i, slot) in slots.iter_mut().enumerate() {
        if i == truth_index {
            *slot = truth.to_string();
        } else if let Some(lie) = lies.next() {
            *slot = lie.to_string();
        }
    }
    slots
}

/// Builds a fresh, unrevealed [`PlayerRound`] with a randomly drawn
/// truth slot.
pub fn build_round<R: Rng + ?Sized>(
    rng: &mut R,
    truth: impl Into<String>,
    lie1: impl Into<String>,
    lie2: impl Into<String>,
) -> PlayerRound {
    let truth = truth.into();
    let lie1 = lie1.into();
    let lie2 = lie2.into();
    let truth_index = draw_truth_index(rng);
    let statements = place_statements(&truth, &lie1, &lie2, truth_index);
    PlayerRound {
        truth,
        lie1,
        lie2,
        statements,
        truth_index,
        guess: None,
        guessed_correctly: None,
        revealed: false,
        timed_out: false,
    }
}
