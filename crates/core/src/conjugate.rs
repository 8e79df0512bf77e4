//! Mechanical conjugation of dictionary-form verbs into the twelve ladder forms.

use crate::model::{VerbBase, VerbClass, VerbForm};

/// One generated ladder rung, in kana and (when the base has one) kanji spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConjugatedForm {
    pub form: VerbForm,
    pub kana: String,
    pub kanji: Option<String>,
}

/// The four stems every ladder form is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Stems {
    masu: String,
    te: String,
    ta: String,
    negative: String,
}

fn godan_i(c: char) -> Option<char> {
    Some(match c {
        'う' => 'い',
        'く' => 'き',
        'ぐ' => 'ぎ',
        'す' => 'し',
        'つ' => 'ち',
        'ぬ' => 'に',
        'ぶ' => 'び',
        'む' => 'み',
        'る' => 'り',
        _ => return None,
    })
}

fn godan_a(c: char) -> Option<char> {
    Some(match c {
        'う' => 'わ',
        'く' => 'か',
        'ぐ' => 'が',
        'す' => 'さ',
        'つ' => 'た',
        'ぬ' => 'な',
        'ぶ' => 'ば',
        'む' => 'ま',
        'る' => 'ら',
        _ => return None,
    })
}

/// Sound change for te/ta: returns the (te, ta) suffixes replacing the final kana.
fn godan_te_ta(c: char) -> Option<(&'static str, &'static str)> {
    Some(match c {
        'う' | 'つ' | 'る' => ("って", "った"),
        'く' => ("いて", "いた"),
        'ぐ' => ("いで", "いだ"),
        'す' => ("して", "した"),
        'ぬ' | 'ぶ' | 'む' => ("んで", "んだ"),
        _ => return None,
    })
}

fn is_iku(word: &str) -> bool {
    word == "いく" || word.ends_with("行く")
}

fn is_aru(word: &str) -> bool {
    matches!(word, "ある" | "有る" | "在る")
}

fn stems(word: &str, class: VerbClass) -> Option<Stems> {
    match class {
        VerbClass::Ichidan => {
            let stem = word.strip_suffix('る').filter(|s| !s.is_empty())?;
            Some(Stems {
                masu: stem.to_owned(),
                te: format!("{stem}て"),
                ta: format!("{stem}た"),
                negative: format!("{stem}ない"),
            })
        }
        VerbClass::Godan => {
            let last = word.chars().last()?;
            let prefix = &word[..word.len() - last.len_utf8()];
            let (te, ta) = if is_iku(word) {
                ("って", "った")
            } else {
                godan_te_ta(last)?
            };
            let negative = if is_aru(word) {
                "ない".to_owned()
            } else {
                format!("{prefix}{}ない", godan_a(last)?)
            };
            Some(Stems {
                masu: format!("{prefix}{}", godan_i(last)?),
                te: format!("{prefix}{te}"),
                ta: format!("{prefix}{ta}"),
                negative,
            })
        }
        VerbClass::Irregular => {
            if let Some(prefix) = word.strip_suffix("する") {
                return Some(Stems {
                    masu: format!("{prefix}し"),
                    te: format!("{prefix}して"),
                    ta: format!("{prefix}した"),
                    negative: format!("{prefix}しない"),
                });
            }
            if let Some(prefix) = word.strip_suffix("来る") {
                return Some(Stems {
                    masu: format!("{prefix}来"),
                    te: format!("{prefix}来て"),
                    ta: format!("{prefix}来た"),
                    negative: format!("{prefix}来ない"),
                });
            }
            let prefix = word.strip_suffix("くる")?;
            Some(Stems {
                masu: format!("{prefix}き"),
                te: format!("{prefix}きて"),
                ta: format!("{prefix}きた"),
                negative: format!("{prefix}こない"),
            })
        }
    }
}

/// Inflects a single spelling (kana or kanji) into one form.
///
/// Returns `None` when the spelling does not end the way `class` requires.
#[must_use]
pub fn inflect(word: &str, class: VerbClass, form: VerbForm) -> Option<String> {
    let word = word.trim();
    let s = stems(word, class)?;
    let negative_stem = s.negative.strip_suffix('い').unwrap_or(&s.negative);
    Some(match form {
        VerbForm::Dictionary => word.to_owned(),
        VerbForm::PolitePresent => format!("{}ます", s.masu),
        VerbForm::PoliteNegative => format!("{}ません", s.masu),
        VerbForm::Te => s.te,
        VerbForm::Progressive => format!("{}いる", s.te),
        VerbForm::Past => s.ta,
        VerbForm::Negative => s.negative.clone(),
        VerbForm::PastNegative => format!("{negative_stem}かった"),
        VerbForm::Want => format!("{}たい", s.masu),
        VerbForm::DontWant => format!("{}たくない", s.masu),
        VerbForm::WantPast => format!("{}たかった", s.masu),
        VerbForm::DontWantPast => format!("{}たくなかった", s.masu),
    })
}

/// Generates the full twelve-rung ladder for a base verb.
///
/// The kanji spelling is inflected alongside the kana; if it cannot be
/// inflected the rung keeps only its kana.
#[must_use]
pub fn conjugate_ladder(base: &VerbBase, class: VerbClass) -> Option<Vec<ConjugatedForm>> {
    VerbForm::ALL
        .into_iter()
        .map(|form| {
            let kana = inflect(base.kana(), class, form)?;
            let kanji = base.kanji().and_then(|k| inflect(k, class, form));
            Some(ConjugatedForm { form, kana, kanji })
        })
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
