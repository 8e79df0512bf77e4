use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;
use std::sync::Arc;

use kotoba_core::model::{AppState, Card, CardId, DeckId};
use kotoba_core::time::Clock;
use storage::StateStore;

use crate::error::SessionError;
use crate::grading::AnswerGrader;
use crate::queue::{self, PracticeOptions};
use crate::review_service::{ReviewResult, ReviewService};

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyMode {
    Due,
    Practice,
}

impl fmt::Display for StudyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StudyMode::Due => "due",
            StudyMode::Practice => "practice",
        })
    }
}

/// Aggregated view of session progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub skipped: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

/// Tally of a finished (or abandoned) session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySummary {
    pub deck_id: DeckId,
    pub mode: StudyMode,
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub skipped: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Linear walk over a queue of card ids.
pub struct StudySession {
    deck_id: DeckId,
    mode: StudyMode,
    queue: Vec<CardId>,
    current: usize,
    results: Vec<ReviewResult>,
    skipped: usize,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl StudySession {
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `queue` is empty.
    pub fn new(
        deck_id: DeckId,
        mode: StudyMode,
        queue: Vec<CardId>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if queue.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            deck_id,
            mode,
            queue,
            current: 0,
            results: Vec::new(),
            skipped: 0,
            started_at,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    #[must_use]
    pub fn mode(&self) -> StudyMode {
        self.mode
    }

    #[must_use]
    pub fn queue(&self) -> &[CardId] {
        &self.queue
    }

    #[must_use]
    pub fn results(&self) -> &[ReviewResult] {
        &self.results
    }

    /// Id of the card to show next.
    #[must_use]
    pub fn current(&self) -> Option<CardId> {
        self.queue.get(self.current).copied()
    }

    #[must_use]
    pub fn current_card<'a>(&self, state: &'a AppState) -> Option<&'a Card> {
        self.current().and_then(|id| state.card(id))
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current >= self.queue.len()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.queue.len(),
            answered: self.results.len(),
            skipped: self.skipped,
            remaining: self.queue.len().saturating_sub(self.current),
            is_complete: self.is_complete(),
        }
    }

    /// Grades `given` against the current card, saves the update, and advances.
    ///
    /// If the save fails, `state` is untouched and the session does not advance.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` when no card is left.
    /// Propagates review and storage errors via `SessionError::Review`.
    pub async fn answer_current(
        &mut self,
        reviews: &ReviewService,
        state: &mut AppState,
        given: &str,
        store: &dyn StateStore,
    ) -> Result<&ReviewResult, SessionError> {
        let card_id = self.current().ok_or(SessionError::Completed)?;
        let result = reviews
            .answer_persisted(state, card_id, given, store)
            .await?;
        self.results.push(result);
        self.advance(reviews.now());
        self.results.last().ok_or(SessionError::Completed)
    }

    /// Moves past the current card without reviewing it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` when no card is left.
    pub fn skip(&mut self, at: DateTime<Utc>) -> Result<CardId, SessionError> {
        let card_id = self.current().ok_or(SessionError::Completed)?;
        self.skipped += 1;
        self.advance(at);
        Ok(card_id)
    }

    fn advance(&mut self, at: DateTime<Utc>) {
        self.current += 1;
        if self.is_complete() && self.completed_at.is_none() {
            self.completed_at = Some(at);
        }
    }

    #[must_use]
    pub fn summary(&self) -> StudySummary {
        let correct = self.results.iter().filter(|r| r.correct).count();
        StudySummary {
            deck_id: self.deck_id,
            mode: self.mode,
            total: self.queue.len(),
            correct,
            incorrect: self.results.len() - correct,
            skipped: self.skipped,
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }
}

impl fmt::Debug for StudySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudySession")
            .field("deck_id", &self.deck_id)
            .field("mode", &self.mode)
            .field("queue_len", &self.queue.len())
            .field("current", &self.current)
            .field("results_len", &self.results.len())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Builds sessions from the stored state and answers through `ReviewService`.
pub struct StudyService {
    store: Arc<dyn StateStore>,
    reviews: ReviewService,
    rng: StdRng,
}

impl StudyService {
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            reviews: ReviewService::new(),
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Makes queue shuffles reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.reviews = self.reviews.with_clock(clock);
        self
    }

    #[must_use]
    pub fn with_grader(mut self, grader: impl AnswerGrader + 'static) -> Self {
        self.reviews = self.reviews.with_grader(grader);
        self
    }

    #[must_use]
    pub fn reviews(&self) -> &ReviewService {
        &self.reviews
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.reviews.now()
    }

    /// Loads the stored state, seeding it on first run.
    ///
    /// # Errors
    ///
    /// Returns storage errors from the backing store.
    pub async fn load(&self) -> Result<AppState, SessionError> {
        Ok(self.store.load(self.now()).await?)
    }

    /// Discards all progress.
    ///
    /// # Errors
    ///
    /// Returns storage errors from the backing store.
    pub async fn reset(&self) -> Result<AppState, SessionError> {
        Ok(self.store.reset(self.now()).await?)
    }

    /// A session over the cards of `deck_id` that are due now.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownDeck` or `SessionError::Empty`.
    pub fn start_due(
        &mut self,
        state: &AppState,
        deck_id: DeckId,
    ) -> Result<StudySession, SessionError> {
        let deck = state
            .deck(deck_id)
            .ok_or(SessionError::UnknownDeck(deck_id))?;
        let now = self.now();
        let queue = queue::due_card_ids(state, deck, now, &mut self.rng);
        StudySession::new(deck_id, StudyMode::Due, queue, now)
    }

    /// A free-practice session over `deck_id`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownDeck` or `SessionError::Empty`.
    pub fn start_practice(
        &mut self,
        state: &AppState,
        deck_id: DeckId,
        options: &PracticeOptions,
    ) -> Result<StudySession, SessionError> {
        let deck = state
            .deck(deck_id)
            .ok_or(SessionError::UnknownDeck(deck_id))?;
        let now = self.now();
        let queue = queue::build_practice_queue(state, deck, now, options, &mut self.rng);
        StudySession::new(deck_id, StudyMode::Practice, queue, now)
    }

    /// Answers the session's current card and persists the result.
    ///
    /// # Errors
    ///
    /// See [`StudySession::answer_current`].
    pub async fn answer<'s>(
        &self,
        session: &'s mut StudySession,
        state: &mut AppState,
        given: &str,
    ) -> Result<&'s ReviewResult, SessionError> {
        session
            .answer_current(&self.reviews, state, given, self.store.as_ref())
            .await
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
