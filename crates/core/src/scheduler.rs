use chrono::{DateTime, Duration, Utc};

use crate::model::{CardId, RecallState, ReviewLog};

/// Lower bound for the ease factor.
pub const MIN_EASE_FACTOR: f64 = 1.3;
/// Upper bound for the ease factor.
pub const MAX_EASE_FACTOR: f64 = 3.0;
/// Longest interval the scheduler hands out, roughly a century.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

//
// ─── QUALITY ───────────────────────────────────────────────────────────────────
//

/// SM-2 answer quality, collapsed to the two values a right/wrong answer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    /// Quality 4.
    Correct,
    /// Quality 2.
    Incorrect,
}

impl Quality {
    #[must_use]
    pub fn from_correct(correct: bool) -> Self {
        if correct {
            Quality::Correct
        } else {
            Quality::Incorrect
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        match self {
            Quality::Correct => 4,
            Quality::Incorrect => 2,
        }
    }

    #[must_use]
    pub fn is_pass(self) -> bool {
        self.value() >= 3
    }
}

//
// ─── SCHEDULER ─────────────────────────────────────────────────────────────────
//

/// Outcome of applying a review: the replacement recall state and a log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedReview {
    pub state: RecallState,
    pub log: ReviewLog,
}

/// SM-2 scheduler driven by a binary correct/incorrect signal.
///
/// A miss resets the streak and brings the card back the next day. A hit
/// walks the classic 1, 6, `interval * ease` progression. At quality 4 the
/// SM-2 ease update evaluates to zero, so ease never drops on a hit and only
/// a manual edit or imported data can move it; it is clamped to
/// `[MIN_EASE_FACTOR, MAX_EASE_FACTOR]` on every hit. Intervals stop growing
/// at [`MAX_INTERVAL_DAYS`].
///
/// ```
/// # use kotoba_core::scheduler::Scheduler;
/// # use kotoba_core::model::RecallState;
/// # use kotoba_core::time::fixed_now;
/// let now = fixed_now();
/// let next = Scheduler::new().next_state(&RecallState::new_at(now), true, now);
/// assert_eq!(next.interval_days, 1);
/// assert_eq!(next.repetitions, 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler;

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Computes the recall state that follows `prev` after one answer at `now`.
    #[must_use]
    pub fn next_state(&self, prev: &RecallState, correct: bool, now: DateTime<Utc>) -> RecallState {
        let quality = Quality::from_correct(correct);
        let mut next = prev.clone();

        if quality.is_pass() {
            next.repetitions = prev.repetitions.saturating_add(1);
            next.interval_days = match next.repetitions {
                1 => 1,
                2 => 6,
                _ => scaled_interval(prev.interval_days, prev.ease_factor),
            };
            let q = f64::from(5 - quality.value());
            let delta = 0.1 - q * (0.08 + q * 0.02);
            next.ease_factor = (prev.ease_factor + delta).clamp(MIN_EASE_FACTOR, MAX_EASE_FACTOR);
        } else {
            next.repetitions = 0;
            next.interval_days = 1;
            next.lapses = prev.lapses.saturating_add(1);
        }

        next.due = Duration::try_days(i64::from(next.interval_days))
            .and_then(|interval| now.checked_add_signed(interval))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        next.last_reviewed = Some(now);
        next
    }

    /// Applies an answer to a card, creating its first recall state when `prev` is `None`.
    #[must_use]
    pub fn apply_review(
        &self,
        card_id: CardId,
        prev: Option<&RecallState>,
        correct: bool,
        now: DateTime<Utc>,
    ) -> AppliedReview {
        let fresh;
        let prev = match prev {
            Some(state) => state,
            None => {
                fresh = RecallState::new_at(now);
                &fresh
            }
        };

        let state = self.next_state(prev, correct, now);
        let log = ReviewLog::new(card_id, correct, now, state.interval_days);
        AppliedReview { state, log }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled_interval(interval_days: u32, ease_factor: f64) -> u32 {
    let scaled = (f64::from(interval_days) * ease_factor).round();
    if scaled >= f64::from(MAX_INTERVAL_DAYS) {
        MAX_INTERVAL_DAYS
    } else {
        scaled.max(0.0) as u32
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn fresh() -> RecallState {
        RecallState::new_at(fixed_now())
    }

    #[test]
    fn quality_mapping() {
        assert_eq!(Quality::from_correct(true).value(), 4);
        assert_eq!(Quality::from_correct(false).value(), 2);
        assert!(!Quality::Incorrect.is_pass());
    }

    #[test]
    fn first_correct_review_schedules_one_day() {
        let now = fixed_now();
        let next = Scheduler::new().next_state(&fresh(), true, now);
        assert_eq!(next.interval_days, 1);
        assert_eq!(next.repetitions, 1);
        assert_eq!(next.due, now + Duration::milliseconds(86_400_000));
        assert_eq!(next.last_reviewed, Some(now));
    }

    #[test]
    fn second_correct_review_schedules_six_days() {
        let s = Scheduler::new();
        let now = fixed_now();
        let first = s.next_state(&fresh(), true, now);
        let second = s.next_state(&first, true, now);
        assert_eq!(second.interval_days, 6);
        assert_eq!(second.repetitions, 2);
    }

    #[test]
    fn third_correct_review_scales_by_ease() {
        let s = Scheduler::new();
        let now = fixed_now();
        let mut state = fresh();
        for _ in 0..3 {
            state = s.next_state(&state, true, now);
        }
        // 6 * 2.5 = 15
        assert_eq!(state.interval_days, 15);
        assert_eq!(state.repetitions, 3);
    }

    #[test]
    fn incorrect_review_resets_streak_and_counts_lapse() {
        let s = Scheduler::new();
        let now = fixed_now();
        let first = s.next_state(&fresh(), true, now);
        let second = s.next_state(&first, true, now);
        let missed = s.next_state(&second, false, now);
        assert_eq!(missed.repetitions, 0);
        assert_eq!(missed.interval_days, 1);
        assert_eq!(missed.lapses, 1);
        assert_eq!(missed.ease_factor, second.ease_factor);
    }

    #[test]
    fn ease_is_non_decreasing_and_bounded() {
        let s = Scheduler::new();
        let mut now = fixed_now();
        let mut state = fresh();
        for i in 0..40 {
            let before = state.ease_factor;
            let correct = i % 3 != 0;
            state = s.next_state(&state, correct, now);
            assert!(state.ease_factor >= before);
            assert!((MIN_EASE_FACTOR..=MAX_EASE_FACTOR).contains(&state.ease_factor));
            if !correct {
                assert_eq!(state.interval_days, 1);
                assert_eq!(state.repetitions, 0);
            }
            now = state.due;
        }
    }

    #[test]
    fn hits_leave_default_ease_untouched() {
        let s = Scheduler::new();
        let now = fixed_now();
        let mut state = fresh();
        for _ in 0..10 {
            state = s.next_state(&state, true, now);
            assert_eq!(state.ease_factor, 2.5);
        }
    }

    #[test]
    fn long_streak_caps_interval_without_overflow() {
        let s = Scheduler::new();
        let now = fixed_now();
        let mut state = fresh();
        let mut previous = 0;
        for _ in 0..40 {
            state = s.next_state(&state, true, now);
            assert!(state.interval_days >= previous);
            assert!(state.interval_days <= MAX_INTERVAL_DAYS);
            assert!(state.due > now);
            previous = state.interval_days;
        }
        assert_eq!(state.interval_days, MAX_INTERVAL_DAYS);
        assert_eq!(state.due, now + Duration::days(i64::from(MAX_INTERVAL_DAYS)));
    }

    #[test]
    fn huge_stored_interval_saturates_due() {
        let mut state = fresh();
        state.repetitions = 5;
        state.interval_days = u32::MAX;
        let next = Scheduler::new().next_state(&state, true, fixed_now());
        assert_eq!(next.interval_days, MAX_INTERVAL_DAYS);
        assert!(next.due > fixed_now());
    }

    #[test]
    fn out_of_range_ease_is_clamped_on_hit() {
        let mut state = fresh();
        state.ease_factor = 4.2;
        let next = Scheduler::new().next_state(&state, true, fixed_now());
        assert_eq!(next.ease_factor, MAX_EASE_FACTOR);
    }

    #[test]
    fn apply_review_creates_state_for_new_card() {
        let now = fixed_now();
        let applied = Scheduler::new().apply_review(CardId::new(3), None, true, now);
        assert_eq!(applied.state.interval_days, 1);
        assert_eq!(applied.log.card_id, CardId::new(3));
        assert!(applied.log.correct);
        assert_eq!(applied.log.reviewed_at, now);
        assert_eq!(applied.log.interval_days, 1);
    }

    #[test]
    fn apply_review_matches_next_state() {
        let s = Scheduler::new();
        let now = fixed_now();
        let prev = s.next_state(&fresh(), true, now);
        let applied = s.apply_review(CardId::new(1), Some(&prev), false, now);
        assert_eq!(applied.state, s.next_state(&prev, false, now));
    }
}
