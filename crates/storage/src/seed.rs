//! Default corpus written into an empty store and on reset.

use chrono::{DateTime, Utc};
use kotoba_core::conjugate::conjugate_ladder;
use kotoba_core::model::{
    AppState, CardDraft, CardType, Deck, DeckId, DeckKind, Direction, RuleClassifier, VerbBase,
    VerbClassifier, VerbDraft,
};

pub const VOCAB_DECK_ID: DeckId = DeckId::new(1);
pub const CONJUGATION_DECK_ID: DeckId = DeckId::new(2);
pub const PHRASE_DECK_ID: DeckId = DeckId::new(3);

/// (english, japanese, part of speech)
const VOCABULARY: &[(&str, &str, &str)] = &[
    ("water", "みず", "noun"),
    ("book", "ほん", "noun"),
    ("I; me", "わたし", "pronoun"),
    ("to eat", "たべる", "Ichidan verb"),
    ("to drink", "のむ", "Godan verb"),
    ("big", "おおきい", "i-adjective"),
    ("quiet", "しずか", "na-adjective"),
    ("very", "とても", "adverb"),
    ("slowly", "ゆっくり", "adverb"),
    ("but; however", "でも", "conjunction"),
    ("and (joining nouns)", "と", "particle"),
    ("thank you", "ありがとう", "expression"),
    ("long, thin objects (counter)", "ほん", "counter"),
];

/// (kana, kanji, english)
const VERBS: &[(&str, &str, &str)] = &[
    ("たべる", "食べる", "eat"),
    ("みる", "見る", "see"),
    ("のむ", "飲む", "drink"),
    ("かく", "書く", "write"),
    ("いく", "行く", "go"),
    ("はなす", "話す", "speak"),
    ("まつ", "待つ", "wait"),
    ("かう", "買う", "buy"),
    ("かえる", "帰る", "return home"),
    ("およぐ", "泳ぐ", "swim"),
    ("する", "", "do"),
    ("くる", "来る", "come"),
];

/// (english, japanese, tags)
const PHRASES: &[(&str, &str, &[&str])] = &[
    ("Good morning.", "おはようございます。", &["greeting"]),
    ("Nice to meet you.", "はじめまして。", &["greeting"]),
    ("Excuse me!", "すみません！", &["restaurant", "greeting"]),
    ("Water, please.", "おみずをください。", &["restaurant"]),
    ("The check, please.", "おかいけいをおねがいします。", &["restaurant"]),
    ("Where is the station?", "えきはどこですか。", &["directions"]),
];

/// Builds the default decks: vocabulary, generated verb ladders, and tagged phrases.
///
/// # Errors
///
/// Returns `kotoba_core::Error` if any seed entry fails validation.
pub fn default_state(now: DateTime<Utc>) -> Result<AppState, kotoba_core::Error> {
    let mut state = AppState::new();

    state.add_deck(Deck::new(
        VOCAB_DECK_ID,
        "Core Vocabulary",
        Some("Everyday words across parts of speech".into()),
        Direction::EnJa,
        DeckKind::Standard,
        now,
    )?)?;
    for (english, japanese, pos) in VOCABULARY {
        let card = CardDraft::new(VOCAB_DECK_ID, CardType::Vocab, *english, *japanese)
            .with_part_of_speech(*pos)
            .validate()?;
        state.add_card(card)?;
    }

    state.add_deck(Deck::new(
        CONJUGATION_DECK_ID,
        "Verb Conjugation",
        Some("Twelve forms per verb, practiced as a ladder".into()),
        Direction::EnJa,
        DeckKind::VerbConjugation,
        now,
    )?)?;
    let classifier = RuleClassifier;
    for (kana, kanji, english) in VERBS {
        let kanji = (!kanji.is_empty()).then_some(*kanji);
        let base = VerbBase::new(*kana, kanji);
        let class = classifier.classify(&base);
        let Some(ladder) = conjugate_ladder(&base, class) else {
            tracing::warn!(base = %base, %class, "seed verb could not be conjugated");
            continue;
        };
        for rung in ladder {
            let prompt = format!("to {english} ({})", rung.form.label());
            // Either spelling is accepted when the verb has a kanji form.
            let answer = match rung.kanji {
                Some(kanji) if kanji != rung.kana => format!("{}; {kanji}", rung.kana),
                _ => rung.kana,
            };
            let card = CardDraft::new(CONJUGATION_DECK_ID, CardType::Verb, prompt, answer)
                .with_part_of_speech(format!("{class} verb"))
                .with_verb(VerbDraft::new(*kana, kanji, rung.form))
                .validate()?;
            state.add_card(card)?;
        }
    }

    state.add_deck(Deck::new(
        PHRASE_DECK_ID,
        "Everyday Phrases",
        None,
        Direction::JaEn,
        DeckKind::Standard,
        now,
    )?)?;
    for (english, japanese, tags) in PHRASES {
        let card = CardDraft::new(PHRASE_DECK_ID, CardType::Sentence, *japanese, *english)
            .with_tags(tags.iter().copied())
            .validate()?;
        state.add_card(card)?;
    }

    tracing::debug!(cards = state.card_count(), "seed corpus built");
    Ok(state)
}
