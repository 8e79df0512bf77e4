use std::collections::BTreeSet;

use kotoba_core::model::{AppState, Card, CardId, CardType, Deck, PracticeFilter, VocabCategory};

/// Narrows `cards` to the enabled part-of-speech categories.
///
/// Only vocabulary-only sets are filtered; anything else passes through
/// unchanged. With every category disabled the result is empty.
#[must_use]
pub fn filter_by_category<'a>(cards: &[&'a Card], filter: &PracticeFilter) -> Vec<&'a Card> {
    if !cards.iter().all(|c| c.card_type() == CardType::Vocab) {
        return cards.to_vec();
    }
    if filter.enabled_count() == 0 {
        return Vec::new();
    }
    cards
        .iter()
        .copied()
        .filter(|c| filter.is_enabled(VocabCategory::classify(c.part_of_speech())))
        .collect()
}

/// Cards carrying at least one of `tags`. Matching ignores case and
/// surrounding whitespace; untagged cards never match.
#[must_use]
pub fn filter_by_tags<'a, S: AsRef<str>>(cards: &[&'a Card], tags: &[S]) -> Vec<&'a Card> {
    let wanted: BTreeSet<String> = tags
        .iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    cards
        .iter()
        .copied()
        .filter(|c| c.tags().iter().any(|t| wanted.contains(t)))
        .collect()
}

/// Cards of `deck` that practice may draw from: the deck's category filter,
/// then `tags` when any are given.
#[must_use]
pub fn eligible_cards<'a, S: AsRef<str>>(
    state: &'a AppState,
    deck: &Deck,
    tags: &[S],
) -> Vec<&'a Card> {
    let cards = state.cards_in_deck(deck);
    let filter = state.practice_filter(deck.id());
    let cards = filter_by_category(&cards, &filter);
    if tags.is_empty() {
        cards
    } else {
        filter_by_tags(&cards, tags)
    }
}

#[must_use]
pub fn eligible_card_ids<S: AsRef<str>>(state: &AppState, deck: &Deck, tags: &[S]) -> Vec<CardId> {
    eligible_cards(state, deck, tags)
        .into_iter()
        .map(Card::id)
        .collect()
}
