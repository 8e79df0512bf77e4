mod card;
mod deck;
mod filter;
mod ids;
mod review;
mod state;
mod verb;

pub use ids::{CardId, DeckId, ParseIdError};

pub use card::{Card, CardDraft, CardError, CardKind, CardType, ValidatedCard};
pub use deck::{Deck, DeckError, DeckKind, Direction};
pub use filter::{PracticeFilter, VocabCategory};
pub use review::{DEFAULT_EASE_FACTOR, RecallState, ReviewLog, ReviewStats};
pub use state::{AppState, StateError};
pub use verb::{
    GeneratedVerb, LadderGuardFailure, RuleClassifier, VerbBase, VerbClass, VerbClassifier,
    VerbDraft, VerbEnding, VerbForm, VerbFormParseError,
};
