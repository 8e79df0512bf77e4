use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::model::ids::{CardId, DeckId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeckError {
    #[error("deck name cannot be empty")]
    EmptyName,
}

//
// ─── DIRECTION & KIND ──────────────────────────────────────────────────────────
//

/// Which side of a card is shown as the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "en-ja")]
    EnJa,
    #[serde(rename = "ja-en")]
    JaEn,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Direction::EnJa => "en-ja",
            Direction::JaEn => "ja-en",
        })
    }
}

/// Queue discipline for a deck, fixed when the deck is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeckKind {
    #[default]
    Standard,
    /// Cards are conjugation ladders and are queued verb by verb.
    VerbConjugation,
}

impl DeckKind {
    /// Infers the kind from a display name.
    ///
    /// Only for importing decks that predate the explicit kind field.
    #[must_use]
    pub fn from_legacy_name(name: &str) -> Self {
        if name.to_lowercase().contains("verb conjugation") {
            DeckKind::VerbConjugation
        } else {
            DeckKind::Standard
        }
    }

    #[must_use]
    pub fn is_conjugation(self) -> bool {
        matches!(self, DeckKind::VerbConjugation)
    }
}

//
// ─── DECK ──────────────────────────────────────────────────────────────────────
//

/// A named, ordered collection of card ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    id: DeckId,
    name: String,
    description: Option<String>,
    direction: Direction,
    kind: DeckKind,
    card_ids: Vec<CardId>,
    created_at: DateTime<Utc>,
}

impl Deck {
    /// Creates a new, empty Deck.
    ///
    /// # Errors
    ///
    /// Returns `DeckError::EmptyName` if name is empty or whitespace-only.
    pub fn new(
        id: DeckId,
        name: impl Into<String>,
        description: Option<String>,
        direction: Direction,
        kind: DeckKind,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DeckError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DeckError::EmptyName);
        }

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            name: name.trim().to_owned(),
            description,
            direction,
            kind,
            card_ids: Vec::new(),
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> DeckId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn kind(&self) -> DeckKind {
        self.kind
    }

    #[must_use]
    pub fn card_ids(&self) -> &[CardId] {
        &self.card_ids
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Appends a card id; ids already in the deck are ignored.
    pub fn push_card(&mut self, id: CardId) {
        if !self.card_ids.contains(&id) {
            self.card_ids.push(id);
        }
    }

    /// Drops repeated ids and ids rejected by `keep`. Returns how many were removed.
    pub fn retain_cards(&mut self, mut keep: impl FnMut(CardId) -> bool) -> usize {
        let before = self.card_ids.len();
        let mut seen = HashSet::with_capacity(before);
        self.card_ids.retain(|id| seen.insert(*id) && keep(*id));
        before - self.card_ids.len()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
