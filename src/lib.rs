//! mathce1 - exercise engine for CE1 (French second grade) math practice
//!
//! mathce1 generates exercises in five domains at a requested difficulty
//! and pedagogical phase, grades typed or spoken answers, tracks per-domain
//! mastery, escalates hints on repeated mistakes and awards stars and
//! badges. Everything persists through a pluggable key-value store.

pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod french;
pub mod generators;
pub mod hints;
pub mod progress;
pub mod storage;
pub mod validator;

pub use config::Config;
pub use core::{Domain, Exercise, ExerciseKind, Feedback, FeedbackKind, Hint, HintTier, Phase};
pub use engine::{
    AnswerResult, ExerciseEngine, KeyOutcome, NextStep, SessionOptions, SessionProgress,
    SessionSummary, SpokenAnswer,
};
pub use error::{FailOpen, MathError, Result};
pub use generators::{ExerciseGenerator, ExerciseRequest, GeneratorRegistry};
pub use hints::{HintSystem, IssuedHint};
pub use progress::{
    Badge, BadgeService, ChildProfiles, DomainProgress, Progression, ProgressionService,
    Session, SessionService, StoredChildProfiles,
};
pub use storage::{FileStore, JsonStorage, KeyValueStore, MemoryStore};
pub use validator::{AnswerValidator, KeyInput, ValidatorOptions};

// CLI commands
pub use cli::{
    BadgesCommand, GenerateCommand, HistoryCommand, NumbersCommand, PlayCommand, StatsCommand,
};
