//! Core types for mathce1.
//!
//! Domains, pedagogical phases, the difficulty range table and the
//! exercise value types every other module passes around.

pub mod domain;
pub mod exercise;

pub use domain::{
    clamp_difficulty, Domain, NumberRange, Phase, DEFAULT_DIFFICULTY, MAX_DIFFICULTY,
    MIN_DIFFICULTY,
};
pub use exercise::{
    digit_count, feedback, generate_exercise_id, AdditionSubtype, Arrangement, CountedObject,
    Exercise, ExerciseKind, ExerciseType, Extremum, Feedback, FeedbackKind, Hint, HintTier,
    Measure, OrderDirection, Operation, PlaceValue, Ruler, Shape, ShapeCount, Strategy,
};
