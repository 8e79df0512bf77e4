use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::model::{
    ids::{CardId, DeckId},
    verb::{GeneratedVerb, VerbDraft},
};

//
// ─── CARD TYPES ────────────────────────────────────────────────────────────────
//

/// Coarse card type as authored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Vocab,
    Verb,
    Sentence,
}

/// What a card is, decided once when the card is validated.
///
/// Only `Conjugation` cards take part in verb ladders; hand-authored or
/// malformed verb cards end up as `LegacyVerb`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "verb")]
pub enum CardKind {
    Vocab,
    Sentence,
    LegacyVerb,
    Conjugation(GeneratedVerb),
}

impl CardKind {
    #[must_use]
    pub fn card_type(&self) -> CardType {
        match self {
            CardKind::Vocab => CardType::Vocab,
            CardKind::Sentence => CardType::Sentence,
            CardKind::LegacyVerb | CardKind::Conjugation(_) => CardType::Verb,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDraft {
    pub deck_id: DeckId,
    pub card_type: CardType,
    pub prompt: String,
    pub answer: String,
    pub part_of_speech: Option<String>,
    pub verb: Option<VerbDraft>,
    pub tags: Vec<String>,
}

impl CardDraft {
    #[must_use]
    pub fn new(
        deck_id: DeckId,
        card_type: CardType,
        prompt: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            deck_id,
            card_type,
            prompt: prompt.into(),
            answer: answer.into(),
            part_of_speech: None,
            verb: None,
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_part_of_speech(mut self, pos: impl Into<String>) -> Self {
        self.part_of_speech = Some(pos.into());
        self
    }

    #[must_use]
    pub fn with_verb(mut self, verb: VerbDraft) -> Self {
        self.verb = Some(verb);
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Validate the draft and settle its `CardKind`.
    ///
    /// Verb drafts that fail the ladder guard are kept as `LegacyVerb`.
    ///
    /// # Errors
    ///
    /// Returns `CardError` for blank prompt/answer, or verb fields on a non-verb card.
    pub fn validate(self) -> Result<ValidatedCard, CardError> {
        let prompt = self.prompt.trim().to_owned();
        if prompt.is_empty() {
            return Err(CardError::EmptyPrompt);
        }
        let answer = self.answer.trim().to_owned();
        if answer.is_empty() {
            return Err(CardError::EmptyAnswer);
        }
        let part_of_speech = self
            .part_of_speech
            .map(|pos| pos.trim().to_owned())
            .filter(|pos| !pos.is_empty());

        let kind = match (self.card_type, self.verb) {
            (CardType::Vocab, None) => CardKind::Vocab,
            (CardType::Sentence, None) => CardKind::Sentence,
            (CardType::Verb, None) => CardKind::LegacyVerb,
            (CardType::Verb, Some(draft)) => {
                match GeneratedVerb::validate(
                    &draft,
                    part_of_speech.as_deref(),
                    [prompt.as_str(), answer.as_str()],
                ) {
                    Ok(verb) => CardKind::Conjugation(verb),
                    Err(reason) => {
                        tracing::debug!(%reason, prompt = %prompt, "verb card kept out of ladders");
                        CardKind::LegacyVerb
                    }
                }
            }
            (_, Some(_)) => return Err(CardError::UnexpectedVerbFields),
        };

        let tags = self
            .tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        Ok(ValidatedCard {
            deck_id: self.deck_id,
            kind,
            prompt,
            answer,
            part_of_speech,
            tags,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCard {
    pub deck_id: DeckId,
    pub kind: CardKind,
    pub prompt: String,
    pub answer: String,
    pub part_of_speech: Option<String>,
    pub tags: BTreeSet<String>,
}

impl ValidatedCard {
    #[must_use]
    pub fn assign_id(self, id: CardId) -> Card {
        Card {
            id,
            deck_id: self.deck_id,
            kind: self.kind,
            prompt: self.prompt,
            answer: self.answer,
            part_of_speech: self.part_of_speech,
            tags: self.tags,
        }
    }
}

/// An atomic study item. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    id: CardId,
    deck_id: DeckId,
    kind: CardKind,
    prompt: String,
    answer: String,
    part_of_speech: Option<String>,
    #[serde(default)]
    tags: BTreeSet<String>,
}

impl Card {
    #[must_use]
    pub fn id(&self) -> CardId {
        self.id
    }

    #[must_use]
    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    #[must_use]
    pub fn kind(&self) -> &CardKind {
        &self.kind
    }

    #[must_use]
    pub fn card_type(&self) -> CardType {
        self.kind.card_type()
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn part_of_speech(&self) -> Option<&str> {
        self.part_of_speech.as_deref()
    }

    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// The ladder identity of a generated conjugation card.
    #[must_use]
    pub fn conjugation(&self) -> Option<&GeneratedVerb> {
        match &self.kind {
            CardKind::Conjugation(verb) => Some(verb),
            _ => None,
        }
    }

    /// True for verb cards the ladder guard rejected.
    #[must_use]
    pub fn is_legacy_verb(&self) -> bool {
        matches!(self.kind, CardKind::LegacyVerb)
    }
}

//
// ─── CARD ERRORS ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CardError {
    #[error("card prompt cannot be empty")]
    EmptyPrompt,

    #[error("card answer cannot be empty")]
    EmptyAnswer,

    #[error("verb fields are only allowed on verb cards")]
    UnexpectedVerbFields,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::verb::VerbForm;

    #[test]
    fn card_fails_if_prompt_text_empty() {
        let draft = CardDraft::new(DeckId::new(1), CardType::Vocab, "   ", "ok");
        assert_eq!(draft.validate().unwrap_err(), CardError::EmptyPrompt);
    }

    #[test]
    fn card_fails_if_answer_text_empty() {
        let draft = CardDraft::new(DeckId::new(1), CardType::Vocab, "ok", " ");
        assert_eq!(draft.validate().unwrap_err(), CardError::EmptyAnswer);
    }

    #[test]
    fn verb_fields_on_vocab_card_are_rejected() {
        let draft = CardDraft::new(DeckId::new(1), CardType::Vocab, "to eat", "たべる")
            .with_verb(VerbDraft::new("たべる", None, VerbForm::Dictionary));
        assert_eq!(draft.validate().unwrap_err(), CardError::UnexpectedVerbFields);
    }

    #[test]
    fn generated_verb_becomes_conjugation_card() {
        let card = CardDraft::new(DeckId::new(2), CardType::Verb, "to eat (past)", "たべた")
            .with_part_of_speech("Ichidan verb")
            .with_verb(VerbDraft::new("たべる", Some("食べる"), VerbForm::Past))
            .validate()
            .unwrap()
            .assign_id(CardId::new(9));

        let verb = card.conjugation().unwrap();
        assert_eq!(verb.form(), VerbForm::Past);
        assert_eq!(verb.base().key(), "食べる|たべる");
        assert_eq!(card.card_type(), CardType::Verb);
    }

    #[test]
    fn hand_authored_verb_is_legacy() {
        let plain = CardDraft::new(DeckId::new(2), CardType::Verb, "eat", "たべる")
            .validate()
            .unwrap()
            .assign_id(CardId::new(1));
        assert!(plain.is_legacy_verb());

        let corrupted = CardDraft::new(DeckId::new(2), CardType::Verb, "tall", "たかかった")
            .with_verb(VerbDraft::new("たかい", None, VerbForm::Past))
            .validate()
            .unwrap()
            .assign_id(CardId::new(2));
        assert!(corrupted.is_legacy_verb());
        assert!(corrupted.conjugation().is_none());
    }

    #[test]
    fn tags_are_normalized() {
        let card = CardDraft::new(DeckId::new(1), CardType::Sentence, "Hello", "こんにちは")
            .with_tags([" Greeting ", "", "greeting", "Basics"])
            .validate()
            .unwrap()
            .assign_id(CardId::new(3));
        let tags: Vec<_> = card.tags().iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["basics", "greeting"]);
    }

    #[test]
    fn card_kind_round_trips_through_json() {
        let card = CardDraft::new(DeckId::new(2), CardType::Verb, "to drink (te-form)", "のんで")
            .with_verb(VerbDraft::new("のむ", Some("飲む"), VerbForm::Te))
            .validate()
            .unwrap()
            .assign_id(CardId::new(4));
        let json = serde_json::to_string(&card).unwrap();
        let back: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(back, card);
    }
}
