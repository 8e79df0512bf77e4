//! Answer checking for typed responses.

/// Decides whether a typed answer matches the expected one.
pub trait AnswerGrader: Send + Sync {
    fn is_correct(&self, given: &str, expected: &str) -> bool;
}

/// Trailing marks that never change the meaning of an answer.
const TRAILING_PUNCTUATION: &[char] = &['.', '!', '?', ',', '。', '！', '？', '、', '…'];

/// Separators between accepted alternatives in an expected answer ("I; me").
const ALTERNATIVE_SEPARATORS: &[char] = &[';', '；', '/'];

/// Compares answers after trimming, case-folding, collapsing whitespace, and
/// dropping trailing punctuation. An expected answer listing alternatives
/// accepts any one of them. Blank input is never correct.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedGrader;

impl NormalizedGrader {
    #[must_use]
    pub fn normalize(text: &str) -> String {
        let collapsed = text
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        collapsed
            .trim_end_matches(|c: char| TRAILING_PUNCTUATION.contains(&c) || c.is_whitespace())
            .to_owned()
    }
}

impl AnswerGrader for NormalizedGrader {
    fn is_correct(&self, given: &str, expected: &str) -> bool {
        let given = Self::normalize(given);
        if given.is_empty() {
            return false;
        }
        if given == Self::normalize(expected) {
            return true;
        }
        expected
            .split(ALTERNATIVE_SEPARATORS)
            .map(Self::normalize)
            .any(|alt| !alt.is_empty() && alt == given)
    }
}
