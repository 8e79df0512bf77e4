use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use kotoba_core::model::{AppState, Deck, DeckId, RuleClassifier, VerbBase, VerbClass, VerbEnding};
use services::queue::{self, BaseSelector};
use services::{LadderMode, PracticeOptions, StudyService, StudySession};
use storage::SqliteStore;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDeckId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidLimit { raw: String },
    InvalidMode { raw: String },
    InvalidSeed { raw: String },
    InvalidClass { raw: String },
    InvalidEnding { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDeckId { raw } => write!(f, "invalid --deck value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidLimit { raw } => write!(f, "invalid --limit value: {raw}"),
            ArgsError::InvalidMode { raw } => {
                write!(f, "invalid --mode value (expected ladder or mixed): {raw}")
            }
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidClass { raw } => {
                write!(f, "invalid --class value (expected ichidan, godan or irregular): {raw}")
            }
            ArgsError::InvalidEnding { raw } => write!(f, "invalid --ending value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  kotoba decks    [--db <sqlite_url>]");
    eprintln!("  kotoba due      [--db <sqlite_url>] [--deck <id>] [--seed <n>]");
    eprintln!("  kotoba practice [--db <sqlite_url>] [--deck <id>] [--limit <n>] [--tag <t>]...");
    eprintln!("                  [--mode ladder|mixed] [--verb <kana|kanji:kana>]...");
    eprintln!("                  [--class ichidan|godan|irregular] [--ending <kana>] [--seed <n>]");
    eprintln!("  kotoba study    [same flags as practice] [--practice]");
    eprintln!("  kotoba verbs    [--db <sqlite_url>] [--deck <id>]");
    eprintln!("  kotoba reset    [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://kotoba.sqlite3");
    eprintln!("  --deck 1");
    eprintln!("  --limit 20  (0 = no limit)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  KOTOBA_DB_URL, KOTOBA_DECK_ID, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Decks,
    Due,
    Practice,
    Study,
    Verbs,
    Reset,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "decks" => Some(Self::Decks),
            "due" => Some(Self::Due),
            "practice" => Some(Self::Practice),
            "study" => Some(Self::Study),
            "verbs" => Some(Self::Verbs),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

/// Which bases to drill on a conjugation deck, resolved against the deck's cards.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BasePick {
    Listed(Vec<VerbBase>),
    Matching(BaseSelector),
}

struct Args {
    db_url: String,
    deck_id: DeckId,
    limit: usize,
    tags: Vec<String>,
    mode: LadderMode,
    bases: Option<BasePick>,
    seed: Option<u64>,
    practice: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("KOTOBA_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://kotoba.sqlite3".into(), normalize_sqlite_url);
        let mut deck_id = std::env::var("KOTOBA_DECK_ID")
            .ok()
            .and_then(|value| value.parse::<DeckId>().ok())
            .unwrap_or(DeckId::new(1));
        let mut limit = 20;
        let mut tags = Vec::new();
        let mut mode = LadderMode::Ladder;
        let mut listed = Vec::new();
        let mut selector = None;
        let mut seed = None;
        let mut practice = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--deck" => {
                    let value = require_value(args, "--deck")?;
                    deck_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDeckId { raw: value.clone() })?;
                }
                "--limit" => {
                    let value = require_value(args, "--limit")?;
                    limit = value
                        .trim()
                        .parse()
                        .map_err(|_| ArgsError::InvalidLimit { raw: value.clone() })?;
                }
                "--tag" => tags.push(require_value(args, "--tag")?),
                "--mode" => {
                    let value = require_value(args, "--mode")?;
                    mode = match value.trim() {
                        "ladder" => LadderMode::Ladder,
                        "mixed" => LadderMode::Mixed,
                        _ => return Err(ArgsError::InvalidMode { raw: value }),
                    };
                }
                "--verb" => listed.push(parse_base(&require_value(args, "--verb")?)),
                "--class" => {
                    let value = require_value(args, "--class")?;
                    let class = match value.trim() {
                        "ichidan" => VerbClass::Ichidan,
                        "godan" => VerbClass::Godan,
                        "irregular" => VerbClass::Irregular,
                        _ => return Err(ArgsError::InvalidClass { raw: value }),
                    };
                    selector = Some(BaseSelector::Class(class));
                }
                "--ending" => {
                    let value = require_value(args, "--ending")?;
                    let ending = VerbEnding::of(&value)
                        .filter(|e| e.kana() == value.trim())
                        .ok_or_else(|| ArgsError::InvalidEnding { raw: value.clone() })?;
                    selector = Some(BaseSelector::Ending(ending));
                }
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    seed = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?,
                    );
                }
                "--practice" => practice = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let bases = if !listed.is_empty() {
            Some(BasePick::Listed(listed))
        } else {
            selector.map(BasePick::Matching)
        };

        Ok(Self {
            db_url,
            deck_id,
            limit,
            tags,
            mode,
            bases,
            seed,
            practice,
        })
    }

    /// Practice options for `deck`, resolving any base selection into explicit-bases mode.
    fn practice_options(&self, state: &AppState, deck: &Deck) -> PracticeOptions {
        let mode = match &self.bases {
            None => self.mode.clone(),
            Some(BasePick::Listed(bases)) => LadderMode::Bases(bases.clone()),
            Some(BasePick::Matching(selector)) => {
                let cards = state.cards_in_deck(deck);
                LadderMode::Bases(queue::bases_matching(&cards, *selector, &RuleClassifier))
            }
        };
        PracticeOptions::new(self.limit)
            .with_tags(self.tags.iter().cloned())
            .with_mode(mode)
    }
}

/// `kanji:kana` or bare kana.
fn parse_base(raw: &str) -> VerbBase {
    match raw.split_once(':') {
        Some((kanji, kana)) => VerbBase::new(kana, Some(kanji)),
        None => VerbBase::new(raw, None::<String>),
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false);
    if subscriber.try_init().is_ok() {
        tracing::debug!("tracing initialized");
    }
}

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

fn deck_or_err(state: &AppState, deck_id: DeckId) -> Result<&Deck, Box<dyn std::error::Error>> {
    state
        .deck(deck_id)
        .ok_or_else(|| format!("deck {deck_id} does not exist").into())
}

fn list_decks(service: &StudyService, state: &AppState) {
    let now = service.now();
    for deck in state.decks() {
        let kind = if deck.kind().is_conjugation() {
            "conjugation"
        } else {
            "standard"
        };
        println!(
            "{:>3}  {:<24} {:<6} {:<12} {:>4} cards  {:>4} due",
            deck.id().value(),
            deck.name(),
            deck.direction(),
            kind,
            deck.card_ids().len(),
            queue::count_due(state, deck, now),
        );
    }
}

fn print_queue(state: &AppState, session: &StudySession) {
    for (i, id) in session.queue().iter().enumerate() {
        let Some(card) = state.card(*id) else {
            continue;
        };
        println!("{:>3}. [{}] {}", i + 1, id, card.prompt());
    }
    println!("{} card(s)", session.queue().len());
}

fn list_verbs(state: &AppState, deck: &Deck) {
    let cards = state.cards_in_deck(deck);
    let partition = queue::partition_by_class(&cards, &RuleClassifier);
    for class in [VerbClass::Ichidan, VerbClass::Godan, VerbClass::Irregular] {
        let bases = partition.of(class);
        if bases.is_empty() {
            continue;
        }
        let names: Vec<String> = bases.iter().map(ToString::to_string).collect();
        println!("{:<10} {}", class.to_string(), names.join(", "));
    }
    let endings: Vec<&str> = queue::verb_endings(&cards)
        .into_iter()
        .map(VerbEnding::kana)
        .collect();
    println!("endings    {}", endings.join(" "));

    let excluded = queue::excluded_verb_count(&cards);
    if excluded > 0 {
        println!("{excluded} hand-written verb card(s) are not part of any ladder");
    }
}

async fn run_study(
    service: &StudyService,
    state: &mut AppState,
    mut session: StudySession,
) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "{} card(s). Type the answer; empty line skips, :q quits.",
        session.queue().len()
    );
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while !session.is_complete() {
        // Ids left in a queue after their card was removed are passed over.
        let Some(card) = session.current_card(state) else {
            session.skip(service.now())?;
            continue;
        };
        let progress = session.progress();
        print!(
            "[{}/{}] {} > ",
            progress.total - progress.remaining + 1,
            progress.total,
            card.prompt()
        );
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        match line.trim() {
            ":q" => break,
            "" => {
                let skipped = session.skip(service.now())?;
                tracing::debug!(card = %skipped, "skipped");
            }
            given => {
                let result = service.answer(&mut session, state, given).await?;
                if result.correct {
                    println!("  correct (next in {} day(s))", result.applied.state.interval_days);
                } else {
                    println!("  expected: {}", result.expected);
                }
            }
        }
    }

    let summary = session.summary();
    println!(
        "{} correct, {} incorrect, {} skipped of {}",
        summary.correct, summary.incorrect, summary.skipped, summary.total
    );
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            io::Error::new(io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&parsed.db_url)?;
    let store = Arc::new(SqliteStore::open(&parsed.db_url).await?);
    let mut service = StudyService::new(store);
    if let Some(seed) = parsed.seed {
        service = service.with_seed(seed);
    }

    if cmd == Command::Reset {
        let state = service.reset().await?;
        println!("reset: {} deck(s), {} card(s)", state.decks().count(), state.card_count());
        return Ok(());
    }

    let mut state = service.load().await?;

    match cmd {
        Command::Decks => list_decks(&service, &state),
        Command::Due => {
            let session = service.start_due(&state, parsed.deck_id)?;
            print_queue(&state, &session);
        }
        Command::Practice => {
            let deck = deck_or_err(&state, parsed.deck_id)?;
            let options = parsed.practice_options(&state, deck);
            let session = service.start_practice(&state, parsed.deck_id, &options)?;
            print_queue(&state, &session);
        }
        Command::Study => {
            let session = if parsed.practice {
                let deck = deck_or_err(&state, parsed.deck_id)?;
                let options = parsed.practice_options(&state, deck);
                service.start_practice(&state, parsed.deck_id, &options)?
            } else {
                service.start_due(&state, parsed.deck_id)?
            };
            run_study(&service, &mut state, session).await?;
        }
        Command::Verbs => {
            let deck = deck_or_err(&state, parsed.deck_id)?;
            list_verbs(&state, deck);
        }
        Command::Reset => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|s| (*s).to_string());
        Args::parse(&mut iter)
    }

    #[test]
    fn parses_practice_flags() {
        let args = parse(&[
            "--db", "sqlite://x.db", "--deck", "2", "--limit", "0", "--tag", "greeting", "--tag",
            "restaurant", "--mode", "mixed", "--seed", "42",
        ])
        .unwrap();
        assert_eq!(args.db_url, "sqlite://x.db");
        assert_eq!(args.deck_id, DeckId::new(2));
        assert_eq!(args.limit, 0);
        assert_eq!(args.tags, vec!["greeting", "restaurant"]);
        assert_eq!(args.mode, LadderMode::Mixed);
        assert_eq!(args.seed, Some(42));
        assert!(args.bases.is_none());
    }

    #[test]
    fn verb_flags_pick_bases() {
        let args = parse(&["--verb", "食べる:たべる", "--verb", "する"]).unwrap();
        assert_eq!(
            args.bases,
            Some(BasePick::Listed(vec![
                VerbBase::new("たべる", Some("食べる")),
                VerbBase::new("する", None::<String>),
            ]))
        );

        let args = parse(&["--ending", "る"]).unwrap();
        assert_eq!(
            args.bases,
            Some(BasePick::Matching(BaseSelector::Ending(VerbEnding::Ru)))
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(parse(&["--limit", "lots"]), Err(ArgsError::InvalidLimit { .. })));
        assert!(matches!(parse(&["--mode", "random"]), Err(ArgsError::InvalidMode { .. })));
        assert!(matches!(parse(&["--ending", "たべる"]), Err(ArgsError::InvalidEnding { .. })));
        assert!(matches!(parse(&["--deck"]), Err(ArgsError::MissingValue { flag: "--deck" })));
        assert!(matches!(parse(&["--wat"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn sqlite_urls_become_absolute() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        let url = normalize_sqlite_url("sqlite:data/kotoba.db".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/kotoba.db"));
    }
}
