use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── VERB FORMS ────────────────────────────────────────────────────────────────
//

/// The twelve conjugated forms a generated verb card can drill.
///
/// Declaration order is the ladder order; `rank` exposes it as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbForm {
    Dictionary,
    PolitePresent,
    PoliteNegative,
    Te,
    Progressive,
    Past,
    Negative,
    PastNegative,
    Want,
    DontWant,
    WantPast,
    DontWantPast,
}

impl VerbForm {
    pub const ALL: [VerbForm; 12] = [
        VerbForm::Dictionary,
        VerbForm::PolitePresent,
        VerbForm::PoliteNegative,
        VerbForm::Te,
        VerbForm::Progressive,
        VerbForm::Past,
        VerbForm::Negative,
        VerbForm::PastNegative,
        VerbForm::Want,
        VerbForm::DontWant,
        VerbForm::WantPast,
        VerbForm::DontWantPast,
    ];

    /// Position of this form inside a ladder (dictionary = 0).
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            VerbForm::Dictionary => 0,
            VerbForm::PolitePresent => 1,
            VerbForm::PoliteNegative => 2,
            VerbForm::Te => 3,
            VerbForm::Progressive => 4,
            VerbForm::Past => 5,
            VerbForm::Negative => 6,
            VerbForm::PastNegative => 7,
            VerbForm::Want => 8,
            VerbForm::DontWant => 9,
            VerbForm::WantPast => 10,
            VerbForm::DontWantPast => 11,
        }
    }

    /// Stable tag used in persisted card data.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            VerbForm::Dictionary => "dictionary",
            VerbForm::PolitePresent => "polite_present",
            VerbForm::PoliteNegative => "polite_negative",
            VerbForm::Te => "te",
            VerbForm::Progressive => "progressive",
            VerbForm::Past => "past",
            VerbForm::Negative => "negative",
            VerbForm::PastNegative => "past_negative",
            VerbForm::Want => "want",
            VerbForm::DontWant => "dont_want",
            VerbForm::WantPast => "want_past",
            VerbForm::DontWantPast => "dont_want_past",
        }
    }

    /// Human readable label shown next to a prompt.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            VerbForm::Dictionary => "dictionary form",
            VerbForm::PolitePresent => "polite present",
            VerbForm::PoliteNegative => "polite negative",
            VerbForm::Te => "te-form",
            VerbForm::Progressive => "progressive",
            VerbForm::Past => "past",
            VerbForm::Negative => "negative",
            VerbForm::PastNegative => "past negative",
            VerbForm::Want => "want to",
            VerbForm::DontWant => "don't want to",
            VerbForm::WantPast => "wanted to",
            VerbForm::DontWantPast => "didn't want to",
        }
    }
}

impl fmt::Display for VerbForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown verb form tag: {0:?}")]
pub struct VerbFormParseError(pub String);

impl FromStr for VerbForm {
    type Err = VerbFormParseError;

    /// Accepts the snake_case tags plus kebab-case spellings and `te-form`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let tag = match normalized.as_str() {
            "te_form" => "te",
            other => other,
        };
        VerbForm::ALL
            .into_iter()
            .find(|form| form.as_str() == tag)
            .ok_or_else(|| VerbFormParseError(s.to_owned()))
    }
}

//
// ─── VERB BASE ─────────────────────────────────────────────────────────────────
//

/// Dictionary form of a verb: the key every card of one ladder shares.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VerbBase {
    kanji: Option<String>,
    kana: String,
}

impl VerbBase {
    /// Builds a base from trimmed kana and optional kanji. Blank kanji is dropped.
    #[must_use]
    pub fn new(kana: impl Into<String>, kanji: Option<impl Into<String>>) -> Self {
        let kanji = kanji
            .map(|k| {
                let k: String = k.into();
                k.trim().to_owned()
            })
            .filter(|k| !k.is_empty());
        Self {
            kanji,
            kana: kana.into().trim().to_owned(),
        }
    }

    #[must_use]
    pub fn kana(&self) -> &str {
        &self.kana
    }

    #[must_use]
    pub fn kanji(&self) -> Option<&str> {
        self.kanji.as_deref()
    }

    /// `kanji|kana`, or the kana alone when the verb has no kanji spelling.
    #[must_use]
    pub fn key(&self) -> String {
        match &self.kanji {
            Some(kanji) => format!("{kanji}|{}", self.kana),
            None => self.kana.clone(),
        }
    }

    #[must_use]
    pub fn ending(&self) -> Option<VerbEnding> {
        VerbEnding::of(&self.kana)
    }
}

impl fmt::Display for VerbBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kanji {
            Some(kanji) => write!(f, "{kanji} ({})", self.kana),
            None => f.write_str(&self.kana),
        }
    }
}

//
// ─── ENDINGS ───────────────────────────────────────────────────────────────────
//

/// Final kana of a dictionary form, with the compound する/くる endings split out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbEnding {
    U,
    Ku,
    Gu,
    Su,
    Tsu,
    Nu,
    Bu,
    Mu,
    Ru,
    Suru,
    Kuru,
}

impl VerbEnding {
    /// Detects the ending of a kana dictionary form.
    ///
    /// Returns `None` when the word does not end in a u-row kana.
    #[must_use]
    pub fn of(kana: &str) -> Option<Self> {
        let kana = kana.trim();
        if kana == "くる" {
            return Some(VerbEnding::Kuru);
        }
        if kana.ends_with("する") {
            return Some(VerbEnding::Suru);
        }
        match kana.chars().last()? {
            'う' => Some(VerbEnding::U),
            'く' => Some(VerbEnding::Ku),
            'ぐ' => Some(VerbEnding::Gu),
            'す' => Some(VerbEnding::Su),
            'つ' => Some(VerbEnding::Tsu),
            'ぬ' => Some(VerbEnding::Nu),
            'ぶ' => Some(VerbEnding::Bu),
            'む' => Some(VerbEnding::Mu),
            'る' => Some(VerbEnding::Ru),
            _ => None,
        }
    }

    #[must_use]
    pub fn kana(self) -> &'static str {
        match self {
            VerbEnding::U => "う",
            VerbEnding::Ku => "く",
            VerbEnding::Gu => "ぐ",
            VerbEnding::Su => "す",
            VerbEnding::Tsu => "つ",
            VerbEnding::Nu => "ぬ",
            VerbEnding::Bu => "ぶ",
            VerbEnding::Mu => "む",
            VerbEnding::Ru => "る",
            VerbEnding::Suru => "する",
            VerbEnding::Kuru => "くる",
        }
    }
}

impl fmt::Display for VerbEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kana())
    }
}

//
// ─── CLASSIFICATION ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbClass {
    Ichidan,
    Godan,
    Irregular,
}

impl fmt::Display for VerbClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VerbClass::Ichidan => "ichidan",
            VerbClass::Godan => "godan",
            VerbClass::Irregular => "irregular",
        })
    }
}

/// Decides the morphological class of a dictionary-form verb.
pub trait VerbClassifier {
    fn classify(&self, base: &VerbBase) -> VerbClass;
}

/// Godan verbs that look ichidan (る after an i/e-row kana).
const GODAN_EXCEPTIONS_KANJI: &[&str] = &[
    "帰る", "入る", "走る", "知る", "切る", "要る", "減る", "限る", "喋る", "蹴る", "滑る",
    "握る", "参る", "練る", "覆る", "遮る", "罵る", "捻る", "翻る", "嘲る", "焦る", "湿る",
    "茂る", "散る", "陥る",
];

/// Kana-only spellings that are unambiguously godan.
const GODAN_EXCEPTIONS_KANA: &[&str] = &[
    "はいる", "はしる", "しゃべる", "すべる", "にぎる", "まいる", "かぎる", "ける", "あせる",
    "ちる", "おちいる",
];

const I_E_ROW: &str = "いきぎしじちぢにひびぴみりえけげせぜてでねへべぺめれ";

/// Spelling-based classifier: good enough for textbook vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleClassifier;

impl VerbClassifier for RuleClassifier {
    fn classify(&self, base: &VerbBase) -> VerbClass {
        let kana = base.kana();
        if matches!(
            VerbEnding::of(kana),
            Some(VerbEnding::Suru | VerbEnding::Kuru)
        ) || base.kanji().is_some_and(|k| k == "来る")
        {
            return VerbClass::Irregular;
        }

        let mut tail = kana.chars().rev();
        let (Some('る'), Some(before)) = (tail.next(), tail.next()) else {
            return VerbClass::Godan;
        };
        if !I_E_ROW.contains(before) {
            return VerbClass::Godan;
        }

        let is_exception = match base.kanji() {
            Some(kanji) => GODAN_EXCEPTIONS_KANJI.contains(&kanji),
            None => GODAN_EXCEPTIONS_KANA.contains(&kana),
        };
        if is_exception {
            VerbClass::Godan
        } else {
            VerbClass::Ichidan
        }
    }
}

//
// ─── GENERATED VERB CARDS ──────────────────────────────────────────────────────
//

/// Raw verb fields as they arrive from seed data, imports, or manual entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbDraft {
    pub base_kana: String,
    pub base_kanji: Option<String>,
    pub form: String,
}

impl VerbDraft {
    #[must_use]
    pub fn new(base_kana: impl Into<String>, base_kanji: Option<&str>, form: VerbForm) -> Self {
        Self {
            base_kana: base_kana.into(),
            base_kanji: base_kanji.map(str::to_owned),
            form: form.as_str().to_owned(),
        }
    }
}

/// Why a verb card was kept out of ladder grouping.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LadderGuardFailure {
    #[error("verb card has no base kana")]
    MissingBase,
    #[error("base {0:?} does not end in a verb kana")]
    UnknownEnding(String),
    #[error(transparent)]
    UnknownForm(#[from] VerbFormParseError),
    #[error("card is not tagged as a verb and its English side does not start with \"to \"")]
    NotVerbLike,
}

/// A mechanically generated conjugation card: one form of one base verb.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneratedVerb {
    base: VerbBase,
    form: VerbForm,
}

impl GeneratedVerb {
    /// Applies the ladder guard to raw verb fields.
    ///
    /// A draft qualifies when its base kana is present and ends in a verb
    /// kana, its form is one of the twelve known tags, and the card either
    /// carries a verb part of speech or has an English side starting with
    /// "to ". `english_sides` holds the prompt and answer texts.
    ///
    /// # Errors
    ///
    /// Returns the first failing condition as a `LadderGuardFailure`.
    pub fn validate(
        draft: &VerbDraft,
        part_of_speech: Option<&str>,
        english_sides: [&str; 2],
    ) -> Result<Self, LadderGuardFailure> {
        let base = VerbBase::new(draft.base_kana.as_str(), draft.base_kanji.as_deref());
        if base.kana().is_empty() {
            return Err(LadderGuardFailure::MissingBase);
        }
        if base.ending().is_none() {
            return Err(LadderGuardFailure::UnknownEnding(base.kana().to_owned()));
        }
        let form: VerbForm = draft.form.parse()?;

        let pos_says_verb =
            part_of_speech.is_some_and(|pos| pos.to_lowercase().contains("verb"));
        let reads_as_verb = english_sides
            .iter()
            .any(|side| side.trim_start().to_lowercase().starts_with("to "));
        if !(pos_says_verb || reads_as_verb) {
            return Err(LadderGuardFailure::NotVerbLike);
        }

        Ok(Self { base, form })
    }

    #[must_use]
    pub fn base(&self) -> &VerbBase {
        &self.base
    }

    #[must_use]
    pub fn form(&self) -> VerbForm {
        self.form
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_follow_declaration_order() {
        for (index, form) in VerbForm::ALL.iter().enumerate() {
            assert_eq!(usize::from(form.rank()), index);
        }
        assert!(VerbForm::Dictionary < VerbForm::DontWantPast);
    }

    #[test]
    fn form_parses_tags_and_aliases() {
        assert_eq!("polite_negative".parse::<VerbForm>().unwrap(), VerbForm::PoliteNegative);
        assert_eq!("dont-want-past".parse::<VerbForm>().unwrap(), VerbForm::DontWantPast);
        assert_eq!("te-form".parse::<VerbForm>().unwrap(), VerbForm::Te);
        assert!("potential".parse::<VerbForm>().is_err());
    }

    #[test]
    fn base_key_uses_kanji_when_present() {
        let with_kanji = VerbBase::new("たべる", Some("食べる"));
        assert_eq!(with_kanji.key(), "食べる|たべる");
        let kana_only = VerbBase::new("する", Some("  "));
        assert_eq!(kana_only.key(), "する");
        assert_eq!(kana_only.kanji(), None);
    }

    #[test]
    fn endings_cover_u_row_and_compounds() {
        assert_eq!(VerbEnding::of("のむ"), Some(VerbEnding::Mu));
        assert_eq!(VerbEnding::of("べんきょうする"), Some(VerbEnding::Suru));
        assert_eq!(VerbEnding::of("くる"), Some(VerbEnding::Kuru));
        assert_eq!(VerbEnding::of("つくる"), Some(VerbEnding::Ru));
        assert_eq!(VerbEnding::of("たかい"), None);
        assert_eq!(VerbEnding::of(""), None);
    }

    #[test]
    fn rule_classifier_handles_common_cases() {
        let c = RuleClassifier;
        assert_eq!(c.classify(&VerbBase::new("たべる", Some("食べる"))), VerbClass::Ichidan);
        assert_eq!(c.classify(&VerbBase::new("みる", Some("見る"))), VerbClass::Ichidan);
        assert_eq!(c.classify(&VerbBase::new("のむ", Some("飲む"))), VerbClass::Godan);
        assert_eq!(c.classify(&VerbBase::new("わかる", Some("分かる"))), VerbClass::Godan);
        assert_eq!(c.classify(&VerbBase::new("かえる", Some("帰る"))), VerbClass::Godan);
        assert_eq!(c.classify(&VerbBase::new("はいる", None::<&str>)), VerbClass::Godan);
        assert_eq!(c.classify(&VerbBase::new("する", None::<&str>)), VerbClass::Irregular);
        assert_eq!(c.classify(&VerbBase::new("くる", Some("来る"))), VerbClass::Irregular);
    }

    #[test]
    fn guard_accepts_generated_card() {
        let draft = VerbDraft::new("たべる", Some("食べる"), VerbForm::Past);
        let verb = GeneratedVerb::validate(&draft, Some("Ichidan verb"), ["to eat (past)", "たべた"])
            .unwrap();
        assert_eq!(verb.form(), VerbForm::Past);
        assert_eq!(verb.base().kana(), "たべる");
    }

    #[test]
    fn guard_accepts_english_prompt_without_pos() {
        let draft = VerbDraft::new("のむ", None, VerbForm::Te);
        assert!(GeneratedVerb::validate(&draft, None, ["To drink (te-form)", "のんで"]).is_ok());
    }

    #[test]
    fn guard_rejects_each_failing_condition() {
        let blank = VerbDraft::new("  ", None, VerbForm::Past);
        assert_eq!(
            GeneratedVerb::validate(&blank, Some("verb"), ["to x", ""]),
            Err(LadderGuardFailure::MissingBase)
        );

        let adjective = VerbDraft::new("たかい", None, VerbForm::Past);
        assert!(matches!(
            GeneratedVerb::validate(&adjective, Some("verb"), ["to x", ""]),
            Err(LadderGuardFailure::UnknownEnding(_))
        ));

        let bad_form = VerbDraft {
            base_kana: "のむ".into(),
            base_kanji: None,
            form: "causative".into(),
        };
        assert!(matches!(
            GeneratedVerb::validate(&bad_form, Some("verb"), ["to drink", ""]),
            Err(LadderGuardFailure::UnknownForm(_))
        ));

        let not_verb = VerbDraft::new("のむ", None, VerbForm::Past);
        assert_eq!(
            GeneratedVerb::validate(&not_verb, Some("noun"), ["drink", "のんだ"]),
            Err(LadderGuardFailure::NotVerbLike)
        );
    }
}
