use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

static ADVERB: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\badverb\b").expect("valid regex"));
static VERB: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bverb\b").expect("valid regex"));

const CONNECTOR_MARKERS: &[&str] = &[
    "conjunction",
    "particle",
    "determiner",
    "interjection",
    "auxiliary",
    "suffix",
    "expression",
];

/// Part-of-speech bucket used by practice filters on vocabulary decks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabCategory {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Connector,
    Other,
}

impl VocabCategory {
    pub const ALL: [VocabCategory; 6] = [
        VocabCategory::Noun,
        VocabCategory::Verb,
        VocabCategory::Adjective,
        VocabCategory::Adverb,
        VocabCategory::Connector,
        VocabCategory::Other,
    ];

    /// Buckets a free-form part-of-speech string such as "Godan verb" or "i-adjective".
    #[must_use]
    pub fn classify(part_of_speech: Option<&str>) -> Self {
        let Some(pos) = part_of_speech else {
            return VocabCategory::Other;
        };
        let pos = pos.to_lowercase();

        if ADVERB.is_match(&pos) {
            VocabCategory::Adverb
        } else if VERB.is_match(&pos) {
            VocabCategory::Verb
        } else if pos.contains("adjective") {
            VocabCategory::Adjective
        } else if pos.contains("noun") {
            // covers "pronoun" as well
            VocabCategory::Noun
        } else if CONNECTOR_MARKERS.iter().any(|m| pos.contains(m)) {
            VocabCategory::Connector
        } else {
            VocabCategory::Other
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            VocabCategory::Noun => "noun",
            VocabCategory::Verb => "verb",
            VocabCategory::Adjective => "adjective",
            VocabCategory::Adverb => "adverb",
            VocabCategory::Connector => "connector",
            VocabCategory::Other => "other",
        }
    }
}

impl fmt::Display for VocabCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-deck switchboard of vocabulary categories. Everything is enabled by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeFilter {
    categories: BTreeMap<VocabCategory, bool>,
}

impl Default for PracticeFilter {
    fn default() -> Self {
        Self {
            categories: VocabCategory::ALL.iter().map(|c| (*c, true)).collect(),
        }
    }
}

impl PracticeFilter {
    /// A filter with exactly the given categories enabled.
    #[must_use]
    pub fn only(enabled: &[VocabCategory]) -> Self {
        Self {
            categories: VocabCategory::ALL
                .iter()
                .map(|c| (*c, enabled.contains(c)))
                .collect(),
        }
    }

    #[must_use]
    pub fn is_enabled(&self, category: VocabCategory) -> bool {
        self.categories.get(&category).copied().unwrap_or(true)
    }

    pub fn set(&mut self, category: VocabCategory, enabled: bool) {
        self.categories.insert(category, enabled);
    }

    #[must_use]
    pub fn enabled_count(&self) -> usize {
        VocabCategory::ALL
            .iter()
            .filter(|c| self.is_enabled(**c))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(pos: &str) -> VocabCategory {
        VocabCategory::classify(Some(pos))
    }

    #[test]
    fn verb_and_adverb_use_word_boundaries() {
        assert_eq!(classify("Godan verb"), VocabCategory::Verb);
        assert_eq!(classify("suru verb"), VocabCategory::Verb);
        assert_eq!(classify("Adverb"), VocabCategory::Adverb);
        assert_eq!(classify("verbal noun"), VocabCategory::Noun);
    }

    #[test]
    fn remaining_categories() {
        assert_eq!(classify("i-adjective"), VocabCategory::Adjective);
        assert_eq!(classify("Pronoun"), VocabCategory::Noun);
        assert_eq!(classify("particle"), VocabCategory::Connector);
        assert_eq!(classify("Expression"), VocabCategory::Connector);
        assert_eq!(classify("counter"), VocabCategory::Other);
        assert_eq!(VocabCategory::classify(None), VocabCategory::Other);
    }

    #[test]
    fn filter_defaults_and_toggles() {
        let mut filter = PracticeFilter::default();
        assert_eq!(filter.enabled_count(), 6);
        filter.set(VocabCategory::Other, false);
        assert!(!filter.is_enabled(VocabCategory::Other));
        assert_eq!(filter.enabled_count(), 5);

        let nouns = PracticeFilter::only(&[VocabCategory::Noun]);
        assert_eq!(nouns.enabled_count(), 1);
        assert!(nouns.is_enabled(VocabCategory::Noun));
        assert_eq!(PracticeFilter::only(&[]).enabled_count(), 0);
    }
}
