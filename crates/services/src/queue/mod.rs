//! Queue construction: which cards to show next, and in what order.
//!
//! Every function here is a pure computation over an `AppState` snapshot and
//! a caller-supplied `now`. Randomness comes in through an injected `Rng`.
//! Nothing here fails: a missing deck or an empty eligible set yields an
//! empty queue.

pub mod due;
pub mod filter;
pub mod ladder;
pub mod practice;

use kotoba_core::model::CardId;

pub use due::{count_due, due_card_ids};
pub use filter::{eligible_card_ids, eligible_cards, filter_by_category, filter_by_tags};
pub use ladder::{
    BaseSelector, ClassPartition, bases_matching, excluded_verb_count, explicit_bases,
    mixed_forms, partition_by_class, practice_ladders, review_ladders, verb_endings,
};
pub use practice::{LadderMode, PracticeOptions, build_practice_queue};

/// Truncates to `limit`; `0` means unlimited.
pub(crate) fn apply_limit(ids: &mut Vec<CardId>, limit: usize) {
    if limit > 0 {
        ids.truncate(limit);
    }
}
