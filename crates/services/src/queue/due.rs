use chrono::{DateTime, Utc};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use kotoba_core::model::{AppState, Card, CardId, Deck};

use super::ladder;

/// Cards of `deck` that are due at `now`.
///
/// Conjugation decks keep each verb's forms together (see
/// [`ladder::review_ladders`]) and append their due non-ladder cards after
/// the ladders. Other decks return the due set in random order so that
/// position in the queue carries no hint.
pub fn due_card_ids<R: Rng + ?Sized>(
    state: &AppState,
    deck: &Deck,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<CardId> {
    let cards = state.cards_in_deck(deck);
    let ids = if deck.kind().is_conjugation() {
        let mut ids = ladder::review_ladders(state, &cards, now);
        let loose: Vec<&Card> = cards
            .iter()
            .copied()
            .filter(|card| card.conjugation().is_none())
            .collect();
        ids.extend(shuffled_due(state, &loose, now, rng));
        ids
    } else {
        shuffled_due(state, &cards, now, rng)
    };
    tracing::debug!(deck = %deck.id(), due = ids.len(), "due set selected");
    ids
}

fn shuffled_due<R: Rng + ?Sized>(
    state: &AppState,
    cards: &[&Card],
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<CardId> {
    let mut due: Vec<(DateTime<Utc>, CardId)> = cards
        .iter()
        .map(|card| (state.due_at(card.id(), now), card.id()))
        .filter(|(at, _)| *at <= now)
        .collect();
    due.sort_by_key(|(at, _)| *at);

    let mut ids: Vec<CardId> = due.into_iter().map(|(_, id)| id).collect();
    ids.shuffle(rng);
    ids
}

/// Number of due cards in `deck`: the length of [`due_card_ids`].
#[must_use]
pub fn count_due(state: &AppState, deck: &Deck, now: DateTime<Utc>) -> usize {
    // Shuffling never changes the length; any seed will do.
    let mut rng = StdRng::seed_from_u64(0);
    due_card_ids(state, deck, now, &mut rng).len()
}
