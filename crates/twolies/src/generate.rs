//! The lie-generation hook.
//!
//! The service does not generate lies itself: an LLM, a template
//! engine, or a canned list does, behind the [`LieGenerator`] trait.
//! One async method takes a truth and returns two plausible lies. The
//! service calls it once per truth, always outside any room lock, so a
//! slow provider delays only the player who is waiting on it.
//!
//! # Why a trait?
//!
//! A trait defines WHAT the generator does without fixing HOW. This
//! lets us:
//! - Call a hosted LLM in production
//! - Use a canned template generator in demos and offline development
//! - Script exact lies (or exact failures) in tests
//!
//! All without the service knowing which one it is holding.
//!
//! Whatever the provider returns is checked by [`validate_lies`] before
//! it gets anywhere near a room: both lies non-blank, distinct from
//! each other, and distinct from the truth.

/// Two generated lies for one truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiePair {
    pub lie1: String,
    pub lie2: String,
}

impl LiePair {
    pub fn new(lie1: impl Into<String>, lie2: impl Into<String>) -> Self {
        Self {
            lie1: lie1.into(),
            lie2: lie2.into(),
        }
    }
}

/// A failed or unusable generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// The provider call itself failed (network, quota, model error).
    #[error("lie generation failed: {0}")]
    Failed(String),

    /// The provider answered, but the lies cannot be used as-is.
    #[error("generated lies are unusable: {0}")]
    Unusable(String),
}

/// Produces two lies for a player's true statement.
///
/// Implementations must be shareable across tasks (`Send + Sync`) and
/// own their data (`'static`): the service holds one instance for its
/// whole lifetime.
pub trait LieGenerator: Send + Sync + 'static {
    async fn generate_lies(&self, truth: &str) -> Result<LiePair, GenerateError>;
}

/// Rejects lie pairs that would break the game: a blank lie, two
/// identical lies, or a lie that repeats the truth (the guesser would
/// see the truth twice).
pub fn validate_lies(truth: &str, pair: &LiePair) -> Result<(), GenerateError> {
    if pair.lie1.trim().is_empty() || pair.lie2.trim().is_empty() {
        return Err(GenerateError::Unusable("a lie is blank".into()));
    }
    if pair.lie1 == pair.lie2 {
        return Err(GenerateError::Unusable("both lies are identical".into()));
    }
    if pair.lie1 == truth || pair.lie2 == truth {
        return Err(GenerateError::Unusable("a lie repeats the truth".into()));
    }
    Ok(())
}
