use chrono::{DateTime, Utc};
use std::sync::Arc;

use kotoba_core::{
    model::{AppState, CardId},
    scheduler::{AppliedReview, Scheduler},
    time::Clock,
};
use storage::StateStore;

use crate::error::ReviewServiceError;
use crate::grading::{AnswerGrader, NormalizedGrader};

//
// ─── REVIEW RESULT ─────────────────────────────────────────────────────────────
//

/// Outcome of one answered card: the verdict and the scheduler's update.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewResult {
    pub card_id: CardId,
    pub correct: bool,
    pub expected: String,
    pub applied: AppliedReview,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Grades answers, runs the scheduler, and writes the result back.
#[derive(Clone)]
pub struct ReviewService {
    clock: Clock,
    scheduler: Scheduler,
    grader: Arc<dyn AnswerGrader>,
}

impl Default for ReviewService {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewService {
    /// SM-2 scheduler, normalizing grader, and the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: Clock::default(),
            scheduler: Scheduler::new(),
            grader: Arc::new(NormalizedGrader),
        }
    }

    #[must_use]
    pub fn with_grader(mut self, grader: impl AnswerGrader + 'static) -> Self {
        self.grader = Arc::new(grader);
        self
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current time according to the service's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Checks `given` against the card's answer.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::UnknownCard` if the card is missing.
    pub fn grade(
        &self,
        state: &AppState,
        card_id: CardId,
        given: &str,
    ) -> Result<bool, ReviewServiceError> {
        let card = state
            .card(card_id)
            .ok_or(ReviewServiceError::UnknownCard(card_id))?;
        Ok(self.grader.is_correct(given, card.answer()))
    }

    /// Applies a verdict to a card in `state`, replacing its recall state.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::UnknownCard` if the card is missing.
    pub fn review_card(
        &self,
        state: &mut AppState,
        card_id: CardId,
        correct: bool,
        reviewed_at: DateTime<Utc>,
    ) -> Result<ReviewResult, ReviewServiceError> {
        let expected = state
            .card(card_id)
            .ok_or(ReviewServiceError::UnknownCard(card_id))?
            .answer()
            .to_owned();

        let applied =
            self.scheduler
                .apply_review(card_id, state.recall(card_id), correct, reviewed_at);
        state.record_review(card_id, applied.state.clone(), correct);

        tracing::debug!(
            card = %card_id,
            correct,
            interval_days = applied.state.interval_days,
            "review applied"
        );
        Ok(ReviewResult {
            card_id,
            correct,
            expected,
            applied,
        })
    }

    /// Grades a typed answer, applies it, and saves the whole state.
    ///
    /// If the save fails, `state` is rolled back to what it was before the call.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::UnknownCard` if the card is missing.
    /// Returns storage errors if persistence fails.
    pub async fn answer_persisted(
        &self,
        state: &mut AppState,
        card_id: CardId,
        given: &str,
        store: &dyn StateStore,
    ) -> Result<ReviewResult, ReviewServiceError> {
        let correct = self.grade(state, card_id, given)?;
        self.review_card_persisted(state, card_id, correct, store)
            .await
    }

    /// Applies a verdict at the service clock's time and saves the whole state.
    ///
    /// If the save fails, `state` is rolled back to what it was before the call.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::UnknownCard` if the card is missing.
    /// Returns storage errors if persistence fails.
    pub async fn review_card_persisted(
        &self,
        state: &mut AppState,
        card_id: CardId,
        correct: bool,
        store: &dyn StateStore,
    ) -> Result<ReviewResult, ReviewServiceError> {
        let original = state.clone();
        let result = self.review_card(state, card_id, correct, self.now())?;

        match store.save(state).await {
            Ok(()) => Ok(result),
            Err(err) => {
                tracing::warn!(card = %card_id, error = %err, "failed to save review");
                *state = original;
                Err(err.into())
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kotoba_core::model::{CardDraft, CardType, Deck, DeckId, DeckKind, Direction};
    use kotoba_core::time::fixed_now;
    use storage::{InMemoryStore, StorageError};

    struct FailingStore;

    #[async_trait]
    impl StateStore for FailingStore {
        async fn fetch(&self) -> Result<Option<AppState>, StorageError> {
            Ok(None)
        }

        async fn save(&self, _state: &AppState) -> Result<(), StorageError> {
            Err(StorageError::Connection("disk full".into()))
        }
    }

    fn build_state() -> AppState {
        let mut state = AppState::new();
        let deck = Deck::new(
            DeckId::new(1),
            "Words",
            None,
            Direction::EnJa,
            DeckKind::Standard,
            fixed_now(),
        )
        .unwrap();
        state.add_deck(deck).unwrap();
        let card = CardDraft::new(DeckId::new(1), CardType::Vocab, "water", "みず")
            .validate()
            .unwrap();
        state.add_card(card).unwrap();
        state
    }

    fn service() -> ReviewService {
        ReviewService::new().with_clock(Clock::fixed(fixed_now()))
    }

    #[test]
    fn review_new_card_creates_recall_state() {
        let mut state = build_state();
        let result = service()
            .review_card(&mut state, CardId::new(1), true, fixed_now())
            .unwrap();

        assert!(result.correct);
        assert_eq!(result.expected, "みず");
        assert_eq!(result.applied.state.interval_days, 1);
        assert_eq!(state.recall(CardId::new(1)), Some(&result.applied.state));
        assert_eq!(state.reviews_of(CardId::new(1)), 1);
    }

    #[test]
    fn unknown_card_is_an_error() {
        let mut state = build_state();
        let err = service()
            .review_card(&mut state, CardId::new(9), true, fixed_now())
            .unwrap_err();
        assert!(matches!(err, ReviewServiceError::UnknownCard(id) if id == CardId::new(9)));
    }

    #[tokio::test]
    async fn answer_persisted_grades_and_saves() {
        let store = InMemoryStore::new();
        let mut state = build_state();
        let result = service()
            .answer_persisted(&mut state, CardId::new(1), " みず。", &store)
            .await
            .unwrap();

        assert!(result.correct);
        let saved = store.fetch().await.unwrap().unwrap();
        assert_eq!(saved, state);
    }

    #[tokio::test]
    async fn failed_save_rolls_state_back() {
        let mut state = build_state();
        let before = state.clone();
        let err = service()
            .answer_persisted(&mut state, CardId::new(1), "ひ", &FailingStore)
            .await
            .unwrap_err();

        assert!(matches!(err, ReviewServiceError::Storage(_)));
        assert_eq!(state, before);
    }

    #[test]
    fn custom_grader_is_used() {
        struct AlwaysRight;
        impl AnswerGrader for AlwaysRight {
            fn is_correct(&self, _given: &str, _expected: &str) -> bool {
                true
            }
        }

        let state = build_state();
        let service = service().with_grader(AlwaysRight);
        assert!(service.grade(&state, CardId::new(1), "anything").unwrap());
    }
}
