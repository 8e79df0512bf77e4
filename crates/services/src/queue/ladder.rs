//! Conjugation ladders: every generated form of one base verb, kept together.
//!
//! Only `CardKind::Conjugation` cards take part. Legacy hand-written verb cards
//! and non-verb cards are left out of every ladder; [`excluded_verb_count`]
//! reports how many legacy verb cards that was.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use kotoba_core::model::{
    AppState, Card, CardId, VerbBase, VerbClass, VerbClassifier, VerbEnding,
};

use super::apply_limit;

//
// ─── GROUPING ──────────────────────────────────────────────────────────────────
//

struct Rung<'a> {
    card: &'a Card,
    rank: u8,
    due: DateTime<Utc>,
    reviews: u32,
}

struct Ladder<'a> {
    base: &'a VerbBase,
    rungs: Vec<Rung<'a>>,
}

impl Ladder<'_> {
    fn min_due(&self) -> Option<DateTime<Utc>> {
        self.rungs.iter().map(|r| r.due).min()
    }

    #[allow(clippy::cast_precision_loss)]
    fn average_reviews(&self) -> f64 {
        if self.rungs.is_empty() {
            return 0.0;
        }
        let total: u64 = self.rungs.iter().map(|r| u64::from(r.reviews)).sum();
        total as f64 / self.rungs.len() as f64
    }

    fn card_ids(&self) -> impl Iterator<Item = CardId> + '_ {
        self.rungs.iter().map(|r| r.card.id())
    }
}

/// Groups conjugation cards by base. Rungs are ordered by form rank, then
/// answer, then id.
fn group<'a>(
    state: &AppState,
    cards: &[&'a Card],
    now: DateTime<Utc>,
    keep: impl Fn(DateTime<Utc>) -> bool,
) -> Vec<Ladder<'a>> {
    let mut by_base: BTreeMap<&'a VerbBase, Vec<Rung<'a>>> = BTreeMap::new();
    for &card in cards {
        let Some(verb) = card.conjugation() else {
            continue;
        };
        let due = state.due_at(card.id(), now);
        if !keep(due) {
            continue;
        }
        by_base.entry(verb.base()).or_default().push(Rung {
            card,
            rank: verb.form().rank(),
            due,
            reviews: state.reviews_of(card.id()),
        });
    }

    by_base
        .into_iter()
        .map(|(base, mut rungs)| {
            rungs.sort_by(|a, b| {
                a.rank
                    .cmp(&b.rank)
                    .then_with(|| a.card.answer().cmp(b.card.answer()))
                    .then_with(|| a.card.id().cmp(&b.card.id()))
            });
            Ladder { base, rungs }
        })
        .collect()
}

//
// ─── COMPOSITION MODES ─────────────────────────────────────────────────────────
//

/// Due conjugation cards as ladders, earliest-due base first.
///
/// Due-ness is checked per card, so a ladder may be partial.
#[must_use]
pub fn review_ladders(state: &AppState, cards: &[&Card], now: DateTime<Utc>) -> Vec<CardId> {
    let mut ladders = group(state, cards, now, |due| due <= now);
    ladders.sort_by(|a, b| {
        a.min_due()
            .cmp(&b.min_due())
            .then_with(|| a.base.cmp(b.base))
    });
    ladders.iter().flat_map(Ladder::card_ids).collect()
}

/// Whole ladders for free practice, least-practiced base first.
///
/// Bases are ordered by average review count, then earliest due, then base.
/// Ladders are appended whole until the next one would pass `limit`; the
/// first ladder is always returned even when it alone exceeds the limit.
/// A `limit` of `0` returns every ladder.
#[must_use]
pub fn practice_ladders(
    state: &AppState,
    cards: &[&Card],
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<CardId> {
    let mut ladders = group(state, cards, now, |_| true);
    ladders.sort_by(|a, b| {
        a.average_reviews()
            .total_cmp(&b.average_reviews())
            .then_with(|| a.min_due().cmp(&b.min_due()))
            .then_with(|| a.base.cmp(b.base))
    });

    let mut queue = Vec::new();
    for ladder in &ladders {
        if limit > 0 && !queue.is_empty() && queue.len() + ladder.rungs.len() > limit {
            break;
        }
        queue.extend(ladder.card_ids());
    }
    queue
}

/// Individual forms in random order, ignoring ladders.
#[must_use]
pub fn mixed_forms<R: Rng + ?Sized>(cards: &[&Card], limit: usize, rng: &mut R) -> Vec<CardId> {
    let mut ids: Vec<CardId> = cards
        .iter()
        .filter(|c| c.conjugation().is_some())
        .map(|c| c.id())
        .collect();
    ids.shuffle(rng);
    apply_limit(&mut ids, limit);
    ids
}

/// Ladders for exactly the given bases, in the given order.
///
/// Bases with no cards and repeated bases are skipped.
#[must_use]
pub fn explicit_bases(
    state: &AppState,
    cards: &[&Card],
    now: DateTime<Utc>,
    bases: &[VerbBase],
) -> Vec<CardId> {
    let ladders: BTreeMap<&VerbBase, Ladder<'_>> = group(state, cards, now, |_| true)
        .into_iter()
        .map(|ladder| (ladder.base, ladder))
        .collect();

    let mut seen = HashSet::new();
    bases
        .iter()
        .filter(|base| seen.insert(*base))
        .filter_map(|base| ladders.get(base))
        .flat_map(Ladder::card_ids)
        .collect()
}

//
// ─── BROWSING HELPERS ──────────────────────────────────────────────────────────
//

/// Distinct bases in first-appearance order.
fn distinct_bases<'a>(cards: &[&'a Card]) -> Vec<&'a VerbBase> {
    let mut seen = HashSet::new();
    cards
        .iter()
        .filter_map(|c| c.conjugation())
        .map(|verb| verb.base())
        .filter(|base| seen.insert(*base))
        .collect()
}

/// Endings present among the conjugation cards.
#[must_use]
pub fn verb_endings(cards: &[&Card]) -> BTreeSet<VerbEnding> {
    distinct_bases(cards)
        .into_iter()
        .filter_map(VerbBase::ending)
        .collect()
}

/// Bases split by morphological class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassPartition {
    pub ichidan: Vec<VerbBase>,
    pub godan: Vec<VerbBase>,
    pub irregular: Vec<VerbBase>,
}

impl ClassPartition {
    #[must_use]
    pub fn of(&self, class: VerbClass) -> &[VerbBase] {
        match class {
            VerbClass::Ichidan => &self.ichidan,
            VerbClass::Godan => &self.godan,
            VerbClass::Irregular => &self.irregular,
        }
    }
}

#[must_use]
pub fn partition_by_class<C: VerbClassifier + ?Sized>(
    cards: &[&Card],
    classifier: &C,
) -> ClassPartition {
    let mut partition = ClassPartition::default();
    for base in distinct_bases(cards) {
        let bucket = match classifier.classify(base) {
            VerbClass::Ichidan => &mut partition.ichidan,
            VerbClass::Godan => &mut partition.godan,
            VerbClass::Irregular => &mut partition.irregular,
        };
        bucket.push(base.clone());
    }
    partition
}

/// Subset of bases to feed into [`explicit_bases`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseSelector {
    Class(VerbClass),
    Ending(VerbEnding),
}

/// Bases matching `selector`, in first-appearance order.
#[must_use]
pub fn bases_matching<C: VerbClassifier + ?Sized>(
    cards: &[&Card],
    selector: BaseSelector,
    classifier: &C,
) -> Vec<VerbBase> {
    distinct_bases(cards)
        .into_iter()
        .filter(|base| match selector {
            BaseSelector::Class(class) => classifier.classify(base) == class,
            BaseSelector::Ending(ending) => base.ending() == Some(ending),
        })
        .cloned()
        .collect()
}

/// Verb cards kept out of ladders because they failed the ladder guard.
#[must_use]
pub fn excluded_verb_count(cards: &[&Card]) -> usize {
    let excluded = cards.iter().filter(|c| c.is_legacy_verb()).count();
    if excluded > 0 {
        tracing::debug!(excluded, "legacy verb cards left out of ladders");
    }
    excluded
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
