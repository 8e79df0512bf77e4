use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, HashSet};

use kotoba_core::model::{AppState, CardId, Deck, VerbBase};

use super::{apply_limit, due, filter, ladder};

/// How a conjugation deck composes a practice queue. Ignored for other decks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LadderMode {
    /// Whole ladders, least-practiced verb first.
    #[default]
    Ladder,
    /// Individual forms, shuffled.
    Mixed,
    /// Ladders for exactly these bases, in this order. The limit is not applied.
    Bases(Vec<VerbBase>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PracticeOptions {
    /// Maximum queue length; `0` means unlimited.
    pub limit: usize,
    /// When non-empty, only cards carrying one of these tags.
    pub tags: Vec<String>,
    pub mode: LadderMode,
}

impl PracticeOptions {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: LadderMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Builds an on-demand practice queue for `deck`.
///
/// Standard decks put due cards first, in due-set order. The remaining
/// eligible cards follow bucketed by lifetime review count, fewest first;
/// each bucket is sorted by due time and then shuffled as a whole, so due
/// time only biases the order inside a bucket. The result is truncated to
/// `limit`.
///
/// Conjugation decks dispatch on `options.mode` to the ladder composers. A
/// conjugation deck with no ladder cards among the eligible ones falls back
/// to the ordering above.
pub fn build_practice_queue<R: Rng + ?Sized>(
    state: &AppState,
    deck: &Deck,
    now: DateTime<Utc>,
    options: &PracticeOptions,
    rng: &mut R,
) -> Vec<CardId> {
    let eligible = filter::eligible_cards(state, deck, &options.tags);
    if eligible.is_empty() {
        tracing::debug!(deck = %deck.id(), "no eligible cards for practice");
        return Vec::new();
    }

    let has_ladders = eligible.iter().any(|card| card.conjugation().is_some());
    if deck.kind().is_conjugation() && has_ladders {
        let excluded = ladder::excluded_verb_count(&eligible);
        let queue = match &options.mode {
            LadderMode::Ladder => ladder::practice_ladders(state, &eligible, now, options.limit),
            LadderMode::Mixed => ladder::mixed_forms(&eligible, options.limit, rng),
            LadderMode::Bases(bases) => ladder::explicit_bases(state, &eligible, now, bases),
        };
        tracing::debug!(
            deck = %deck.id(),
            excluded,
            queued = queue.len(),
            "ladder practice queue built"
        );
        return queue;
    }

    let eligible_ids: HashSet<CardId> = eligible.iter().map(|c| c.id()).collect();
    let mut queue: Vec<CardId> = due::due_card_ids(state, deck, now, rng)
        .into_iter()
        .filter(|id| eligible_ids.contains(id))
        .collect();
    let due_count = queue.len();
    let already: HashSet<CardId> = queue.iter().copied().collect();

    let mut buckets: BTreeMap<u32, Vec<(DateTime<Utc>, CardId)>> = BTreeMap::new();
    for card in eligible.iter().filter(|c| !already.contains(&c.id())) {
        buckets
            .entry(state.reviews_of(card.id()))
            .or_default()
            .push((state.due_at(card.id(), now), card.id()));
    }
    for mut bucket in buckets.into_values() {
        bucket.sort_by_key(|(at, _)| *at);
        bucket.shuffle(rng);
        queue.extend(bucket.into_iter().map(|(_, id)| id));
    }

    apply_limit(&mut queue, options.limit);
    tracing::debug!(
        deck = %deck.id(),
        eligible = eligible.len(),
        due = due_count,
        queued = queue.len(),
        "practice queue built"
    );
    queue
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use kotoba_core::model::{
        CardDraft, CardType, DeckId, DeckKind, Direction, PracticeFilter, RecallState,
        VocabCategory,
    };
    use kotoba_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn vocab_state(pos: &[&str]) -> AppState {
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
        for (i, p) in pos.iter().enumerate() {
            let draft = CardDraft::new(DeckId::new(1), CardType::Vocab, format!("w{i}"), "x")
                .with_part_of_speech(*p);
            state.add_card(draft.validate().unwrap()).unwrap();
        }
        state
    }

    fn review(state: &mut AppState, id: u64, due: DateTime<Utc>, times: u32) {
        let mut recall = RecallState::new_at(fixed_now());
        recall.due = due;
        for _ in 0..times {
            state.record_review(CardId::new(id), recall.clone(), true);
        }
    }

    #[test]
    fn due_cards_come_first_then_least_practiced() {
        let now = fixed_now();
        let mut state = vocab_state(&["noun"; 5]);
        // Only card 1 is due; the rest bucket by review count as {3, 4}, {2}, {5}.
        review(&mut state, 1, now - Duration::hours(1), 3);
        review(&mut state, 2, now + Duration::days(2), 2);
        review(&mut state, 3, now + Duration::days(1), 1);
        review(&mut state, 4, now + Duration::days(5), 1);
        review(&mut state, 5, now + Duration::days(9), 4);

        let deck = state.deck(DeckId::new(1)).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let queue = build_practice_queue(&state, deck, now, &PracticeOptions::new(0), &mut rng);

        assert_eq!(queue[0], CardId::new(1));
        let mut ones = queue[1..3].to_vec();
        ones.sort();
        assert_eq!(ones, vec![CardId::new(3), CardId::new(4)]);
        assert_eq!(queue[3..], [CardId::new(2), CardId::new(5)]);
    }

    #[test]
    fn queue_is_a_permutation_when_limit_covers_deck() {
        let mut state = vocab_state(&["noun"; 8]);
        review(&mut state, 2, fixed_now() + Duration::days(1), 1);
        review(&mut state, 5, fixed_now() + Duration::days(3), 2);
        let deck = state.deck(DeckId::new(1)).unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        let mut queue =
            build_practice_queue(&state, deck, fixed_now(), &PracticeOptions::new(50), &mut rng);
        queue.sort();
        assert_eq!(queue, (1..=8).map(CardId::new).collect::<Vec<_>>());
    }

    #[test]
    fn noun_only_filter_with_limit() {
        let mut state = vocab_state(&[
            "noun",
            "Godan verb",
            "pronoun",
            "adverb",
            "noun",
            "noun",
            "particle",
            "noun",
            "noun",
            "noun",
        ]);
        state.set_practice_filter(DeckId::new(1), PracticeFilter::only(&[VocabCategory::Noun]));
        let deck = state.deck(DeckId::new(1)).unwrap();

        let mut rng = StdRng::seed_from_u64(9);
        let queue =
            build_practice_queue(&state, deck, fixed_now(), &PracticeOptions::new(5), &mut rng);
        assert_eq!(queue.len(), 5);
        for id in queue {
            let pos = state.card(id).unwrap().part_of_speech();
            assert_eq!(VocabCategory::classify(pos), VocabCategory::Noun);
        }
    }

    #[test]
    fn disabled_filter_yields_empty_queue() {
        let mut state = vocab_state(&["noun", "adverb"]);
        state.set_practice_filter(DeckId::new(1), PracticeFilter::only(&[]));
        let deck = state.deck(DeckId::new(1)).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let queue =
            build_practice_queue(&state, deck, fixed_now(), &PracticeOptions::new(10), &mut rng);
        assert!(queue.is_empty());
    }

    #[test]
    fn tags_narrow_the_queue() {
        let mut state = vocab_state(&[]);
        for (prompt, tag) in [("a", "restaurant"), ("b", "greeting"), ("c", "restaurant")] {
            let draft = CardDraft::new(DeckId::new(1), CardType::Sentence, prompt, "x")
                .with_tags([tag]);
            state.add_card(draft.validate().unwrap()).unwrap();
        }
        let deck = state.deck(DeckId::new(1)).unwrap();
        let options = PracticeOptions::new(0).with_tags(["restaurant"]);
        let mut queue =
            build_practice_queue(&state, deck, fixed_now(), &options, &mut StdRng::seed_from_u64(2));
        queue.sort();
        assert_eq!(queue, vec![CardId::new(1), CardId::new(3)]);
    }

    #[test]
    fn conjugation_deck_of_hand_written_verbs_still_practices() {
        let mut state = AppState::new();
        let deck = Deck::new(
            DeckId::new(1),
            "Verbs",
            None,
            Direction::EnJa,
            DeckKind::VerbConjugation,
            fixed_now(),
        )
        .unwrap();
        state.add_deck(deck).unwrap();
        for (prompt, answer) in [("to rest", "やすむ"), ("to play", "あそぶ"), ("to die", "しぬ")] {
            let draft = CardDraft::new(DeckId::new(1), CardType::Verb, prompt, answer);
            state.add_card(draft.validate().unwrap()).unwrap();
        }
        review(&mut state, 2, fixed_now() + Duration::days(4), 1);
        let deck = state.deck(DeckId::new(1)).unwrap();

        for mode in [LadderMode::Ladder, LadderMode::Mixed] {
            let options = PracticeOptions::new(0).with_mode(mode);
            let mut queue = build_practice_queue(
                &state,
                deck,
                fixed_now(),
                &options,
                &mut StdRng::seed_from_u64(8),
            );
            assert_eq!(queue.len(), 3);
            assert_ne!(queue[0], CardId::new(2));
            queue.sort();
            assert_eq!(queue, vec![CardId::new(1), CardId::new(2), CardId::new(3)]);
        }
    }
}
