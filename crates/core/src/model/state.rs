use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::model::{
    card::{Card, ValidatedCard},
    deck::Deck,
    filter::PracticeFilter,
    ids::{CardId, DeckId},
    review::{RecallState, ReviewStats},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StateError {
    #[error("deck {0} does not exist")]
    UnknownDeck(DeckId),
    #[error("deck {0} already exists")]
    DuplicateDeck(DeckId),
}

/// Whole-application snapshot: everything the queue engine reads.
///
/// Stored as one blob; every review produces a modified copy that replaces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    decks: BTreeMap<DeckId, Deck>,
    cards: BTreeMap<CardId, Card>,
    #[serde(default)]
    recall: BTreeMap<CardId, RecallState>,
    #[serde(default)]
    stats: BTreeMap<CardId, ReviewStats>,
    #[serde(default)]
    filters: BTreeMap<DeckId, PracticeFilter>,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a deck.
    ///
    /// # Errors
    ///
    /// Returns `StateError::DuplicateDeck` if a deck with the same id exists.
    pub fn add_deck(&mut self, deck: Deck) -> Result<DeckId, StateError> {
        let id = deck.id();
        if self.decks.contains_key(&id) {
            return Err(StateError::DuplicateDeck(id));
        }
        self.decks.insert(id, deck);
        Ok(id)
    }

    /// Stores a validated card under the next free id and appends it to its deck.
    ///
    /// # Errors
    ///
    /// Returns `StateError::UnknownDeck` if the card's deck is missing.
    pub fn add_card(&mut self, card: ValidatedCard) -> Result<CardId, StateError> {
        let id = self.next_card_id();
        let deck = self
            .decks
            .get_mut(&card.deck_id)
            .ok_or(StateError::UnknownDeck(card.deck_id))?;
        deck.push_card(id);
        self.cards.insert(id, card.assign_id(id));
        Ok(id)
    }

    #[must_use]
    pub fn next_card_id(&self) -> CardId {
        let last = self.cards.keys().next_back().map_or(0, CardId::value);
        CardId::new(last + 1)
    }

    #[must_use]
    pub fn deck(&self, id: DeckId) -> Option<&Deck> {
        self.decks.get(&id)
    }

    pub fn decks(&self) -> impl Iterator<Item = &Deck> {
        self.decks.values()
    }

    #[must_use]
    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.get(&id)
    }

    #[must_use]
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    /// Cards of a deck in deck order, each at most once. Dangling ids are skipped.
    #[must_use]
    pub fn cards_in_deck(&self, deck: &Deck) -> Vec<&Card> {
        let mut seen = HashSet::with_capacity(deck.card_ids().len());
        deck.card_ids()
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| self.cards.get(id))
            .collect()
    }

    #[must_use]
    pub fn recall(&self, id: CardId) -> Option<&RecallState> {
        self.recall.get(&id)
    }

    /// Recall state of a card, treating a never-reviewed card as due at `now`.
    #[must_use]
    pub fn recall_or_default(&self, id: CardId, now: DateTime<Utc>) -> RecallState {
        self.recall
            .get(&id)
            .cloned()
            .unwrap_or_else(|| RecallState::new_at(now))
    }

    /// When a card becomes due; `now` for cards that were never reviewed.
    #[must_use]
    pub fn due_at(&self, id: CardId, now: DateTime<Utc>) -> DateTime<Utc> {
        self.recall.get(&id).map_or(now, |r| r.due)
    }

    #[must_use]
    pub fn stats(&self, id: CardId) -> ReviewStats {
        self.stats.get(&id).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn reviews_of(&self, id: CardId) -> u32 {
        self.stats(id).reviews
    }

    #[must_use]
    pub fn practice_filter(&self, deck_id: DeckId) -> PracticeFilter {
        self.filters.get(&deck_id).cloned().unwrap_or_default()
    }

    pub fn set_practice_filter(&mut self, deck_id: DeckId, filter: PracticeFilter) {
        self.filters.insert(deck_id, filter);
    }

    /// Replaces a card's recall state and counts the answer in its stats.
    pub fn record_review(&mut self, id: CardId, state: RecallState, correct: bool) {
        self.recall.insert(id, state);
        self.stats.entry(id).or_default().record(correct);
    }

    /// Deletes a card with its recall state, stats and deck membership.
    pub fn remove_card(&mut self, id: CardId) -> Option<Card> {
        let card = self.cards.remove(&id)?;
        self.recall.remove(&id);
        self.stats.remove(&id);
        if let Some(deck) = self.decks.get_mut(&card.deck_id()) {
            deck.retain_cards(|c| c != id);
        }
        Some(card)
    }

    /// Cleanup pass: drops repeated and dangling ids from every deck, and
    /// recall/stats entries for cards that no longer exist.
    ///
    /// Returns the number of deck entries removed.
    pub fn dedupe_deck_cards(&mut self) -> usize {
        let cards = &self.cards;
        let removed: usize = self
            .decks
            .values_mut()
            .map(|deck| deck.retain_cards(|id| cards.contains_key(&id)))
            .sum();
        self.recall.retain(|id, _| cards.contains_key(id));
        self.stats.retain(|id, _| cards.contains_key(id));
        if removed > 0 {
            tracing::info!(removed, "removed duplicate or dangling deck entries");
        }
        removed
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
