//! Graduated hints for the exercise on screen.
//!
//! Wrong answers are counted; once the count reaches the threshold, each
//! further error offers the next rung of the exercise's hint ladder
//! (conceptual, strategic, then partial reveal). A correct answer resets the
//! error count but not the ladder position.

use serde::{Deserialize, Serialize};

use crate::config::HintConfig;
use crate::core::{Exercise, HintTier};

/// Mascot lines used when no exercise is loaded.
const GENERIC_HINTS: &[&str] = &[
    "Regarde bien les cubes...",
    "Compte doucement...",
    "Utilise tes doigts si tu veux !",
];

/// A hint handed to the child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedHint {
    pub tier: HintTier,
    pub text: String,
    /// Hints given on this exercise so far, this one included.
    pub hints_given: u32,
}

#[derive(Debug, Clone)]
pub struct HintSystem {
    threshold: u32,
    exercise: Option<Exercise>,
    error_count: u32,
    hints_given: u32,
}

impl Default for HintSystem {
    fn default() -> Self {
        Self::from(&HintConfig::default())
    }
}

impl From<&HintConfig> for HintSystem {
    fn from(config: &HintConfig) -> Self {
        Self::new(config.errors_before_hint)
    }
}

impl HintSystem {
    /// A threshold of 0 behaves like 1: the first error already earns a hint.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            exercise: None,
            error_count: 0,
            hints_given: 0,
        }
    }

    /// Load a new exercise; both counters start over.
    pub fn set_exercise(&mut self, exercise: &Exercise) {
        self.exercise = Some(exercise.clone());
        self.error_count = 0;
        self.hints_given = 0;
    }

    /// Count a wrong answer. Returns a hint once the threshold is reached.
    pub fn record_error(&mut self) -> Option<IssuedHint> {
        self.error_count += 1;
        tracing::debug!(errors = self.error_count, "hint system: error recorded");
        if self.should_show_hint() {
            Some(self.request_hint())
        } else {
            None
        }
    }

    pub fn record_success(&mut self) {
        self.error_count = 0;
    }

    /// Next hint on the ladder, regardless of the error count.
    pub fn request_hint(&mut self) -> IssuedHint {
        self.hints_given += 1;
        let tier = HintTier::for_hint_number(self.hints_given);

        let text = match &self.exercise {
            Some(exercise) => exercise
                .hint(tier)
                .map(|h| h.text.clone())
                .unwrap_or_else(|| self.generic_hint().to_string()),
            None => self.generic_hint().to_string(),
        };

        IssuedHint {
            tier,
            text,
            hints_given: self.hints_given,
        }
    }

    fn generic_hint(&self) -> &'static str {
        let idx = (self.hints_given.saturating_sub(1) as usize) % GENERIC_HINTS.len();
        GENERIC_HINTS[idx]
    }

    pub fn should_show_hint(&self) -> bool {
        self.error_count >= self.threshold
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn hints_given(&self) -> u32 {
        self.hints_given
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Forget the exercise and both counters.
    pub fn reset(&mut self) {
        self.exercise = None;
        self.error_count = 0;
        self.hints_given = 0;
    }
}
