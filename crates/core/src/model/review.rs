use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::CardId;

/// Ease factor given to a card on its first review.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

//
// ─── RECALL STATE ─────────────────────────────────────────────────────────────
//

/// Per-card spacing state, replaced wholesale by the scheduler after each answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecallState {
    pub due: DateTime<Utc>,
    pub interval_days: u32,
    pub ease_factor: f64,
    pub repetitions: u32,
    pub lapses: u32,
    pub last_reviewed: Option<DateTime<Utc>>,
}

impl RecallState {
    /// State of a card that has never been reviewed: due immediately.
    #[must_use]
    pub fn new_at(now: DateTime<Utc>) -> Self {
        Self {
            due: now,
            interval_days: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            repetitions: 0,
            lapses: 0,
            last_reviewed: None,
        }
    }

    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due <= now
    }
}

//
// ─── REVIEW STATS ─────────────────────────────────────────────────────────────
//

/// Lifetime answer counters. Used for ordering and display, never for spacing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub reviews: u32,
    pub correct: u32,
}

impl ReviewStats {
    pub fn record(&mut self, correct: bool) {
        self.reviews = self.reviews.saturating_add(1);
        if correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    /// Share of correct answers, or `None` before the first review.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        (self.reviews > 0).then(|| f64::from(self.correct) / f64::from(self.reviews))
    }
}

//
// ─── REVIEW LOG ───────────────────────────────────────────────────────────────
//

/// Record of a single answered card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewLog {
    pub card_id: CardId,
    pub correct: bool,
    pub reviewed_at: DateTime<Utc>,
    pub interval_days: u32,
}

impl ReviewLog {
    #[must_use]
    pub fn new(
        card_id: CardId,
        correct: bool,
        reviewed_at: DateTime<Utc>,
        interval_days: u32,
    ) -> Self {
        Self {
            card_id,
            correct,
            reviewed_at,
            interval_days,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn fresh_state_is_due_now() {
        let now = fixed_now();
        let state = RecallState::new_at(now);
        assert!(state.is_due(now));
        assert_eq!(state.interval_days, 0);
        assert_eq!(state.ease_factor, DEFAULT_EASE_FACTOR);
        assert_eq!(state.last_reviewed, None);
        assert!(!state.is_due(now - chrono::Duration::seconds(1)));
    }

    #[test]
    fn stats_track_accuracy() {
        let mut stats = ReviewStats::default();
        assert_eq!(stats.accuracy(), None);
        stats.record(true);
        stats.record(false);
        stats.record(true);
        stats.record(true);
        assert_eq!(stats.reviews, 4);
        assert_eq!(stats.correct, 3);
        assert_eq!(stats.accuracy(), Some(0.75));
    }
}
