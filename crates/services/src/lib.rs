#![forbid(unsafe_code)]

pub mod error;
pub mod grading;
pub mod queue;
pub mod review_service;
pub mod study;

pub use kotoba_core::Clock;

pub use error::{ReviewServiceError, SessionError};
pub use grading::{AnswerGrader, NormalizedGrader};
pub use queue::{LadderMode, PracticeOptions};
pub use review_service::{ReviewResult, ReviewService};
pub use study::{SessionProgress, StudyMode, StudyService, StudySession, StudySummary};
