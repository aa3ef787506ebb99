//! Exercise value types.
//!
//! An [`Exercise`] is a shared envelope (id, domain, phase, difficulty,
//! answer, question, hint ladder) around an [`ExerciseKind`] that carries only
//! the fields of its own exercise type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::core::domain::{Domain, Phase};

/// Counter keeping exercise ids unique within the same millisecond.
static EXERCISE_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Generate a new exercise id.
///
/// Format: `ex_<unix millis>_<NNNN>`.
pub fn generate_exercise_id() -> String {
    let now = Utc::now();
    let counter = EXERCISE_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("ex_{}_{:04}", now.timestamp_millis(), counter % 10_000)
}

/// Number of decimal digits in `n`.
pub fn digit_count(n: u32) -> usize {
    n.to_string().len()
}

/// A generated exercise. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub domain: Domain,
    pub phase: Phase,
    /// Difficulty 1..=10 the exercise was generated at.
    pub difficulty: u8,
    /// Type-specific operands and metadata.
    pub kind: ExerciseKind,
    /// The single correct answer.
    pub answer: u32,
    /// Digit length of `answer`; the keyboard auto-submits at this length.
    pub expected_digits: usize,
    /// Short form, e.g. `7 + 5 = ?`.
    pub question: String,
    /// Full French sentence read aloud to the child.
    pub question_text: String,
    /// Conceptual, strategic and partial-reveal hints, in that order.
    pub hints: Vec<Hint>,
    pub created_at: DateTime<Utc>,
}

impl Exercise {
    /// Create an exercise with no question text or hints yet.
    pub fn new(
        domain: Domain,
        phase: Phase,
        difficulty: u8,
        kind: ExerciseKind,
        answer: u32,
    ) -> Self {
        Self {
            id: generate_exercise_id(),
            domain,
            phase,
            difficulty,
            kind,
            answer,
            expected_digits: digit_count(answer),
            question: String::new(),
            question_text: String::new(),
            hints: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Set the short question and the spoken sentence.
    pub fn with_question(mut self, question: impl Into<String>, text: impl Into<String>) -> Self {
        self.question = question.into();
        self.question_text = text.into();
        self
    }

    /// Attach the three-rung hint ladder; the partial rung is derived from the answer.
    pub fn with_hints(mut self, conceptual: impl Into<String>, strategic: impl Into<String>) -> Self {
        self.hints = vec![
            Hint::new(HintTier::Conceptual, conceptual),
            Hint::new(HintTier::Strategic, strategic),
            Hint::partial_reveal(self.answer),
        ];
        self
    }

    /// Type id within the domain (`addition`, `countSides`, ...).
    pub fn type_id(&self) -> &'static str {
        self.kind.type_id()
    }

    /// The hint for a tier, if the ladder has one.
    pub fn hint(&self, tier: HintTier) -> Option<&Hint> {
        self.hints.iter().find(|h| h.tier == tier)
    }

    /// Check an answer.
    pub fn is_correct(&self, given: u32) -> bool {
        given == self.answer
    }
}

/// Exercise type metadata, as listed in the domain menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExerciseType {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
}

/// Type-specific exercise payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExerciseKind {
    Addition {
        a: u32,
        b: u32,
        subtype: AdditionSubtype,
        strategies: Vec<Strategy>,
    },
    Subtraction {
        a: u32,
        b: u32,
    },
    Counting {
        count: u32,
        object: CountedObject,
        arrangement: Arrangement,
    },
    Comparison {
        a: u32,
        b: u32,
        ask: Extremum,
    },
    Ordering {
        number: u32,
        direction: OrderDirection,
    },
    Decomposition {
        number: u32,
        tens: u32,
        units: u32,
        ask: PlaceValue,
    },
    Recognition {
        shape: Shape,
        /// Shuffled choices; the answer is the 1-based position of `shape`.
        options: Vec<Shape>,
    },
    CountSides {
        shape: Shape,
    },
    CountShapes {
        target: Shape,
        count: u32,
        distractors: Vec<ShapeCount>,
    },
    Length {
        length_cm: u32,
        ruler: Ruler,
    },
    Time {
        hours: u32,
        minutes: u32,
    },
    Money {
        coins: Vec<u32>,
    },
    MeasureComparison {
        measure: Measure,
        a: u32,
        b: u32,
        ask: Extremum,
    },
    WordProblem {
        operation: Operation,
        a: u32,
        b: u32,
        template: String,
        equation: String,
        strategy: String,
    },
}

impl ExerciseKind {
    /// Type id within the domain.
    pub fn type_id(&self) -> &'static str {
        match self {
            ExerciseKind::Addition { .. } => "addition",
            ExerciseKind::Subtraction { .. } => "subtraction",
            ExerciseKind::Counting { .. } => "counting",
            ExerciseKind::Comparison { .. } => "comparison",
            ExerciseKind::Ordering { .. } => "ordering",
            ExerciseKind::Decomposition { .. } => "decomposition",
            ExerciseKind::Recognition { .. } => "recognition",
            ExerciseKind::CountSides { .. } => "countSides",
            ExerciseKind::CountShapes { .. } => "countShapes",
            ExerciseKind::Length { .. } => "length",
            ExerciseKind::Time { .. } => "time",
            ExerciseKind::Money { .. } => "money",
            ExerciseKind::MeasureComparison { .. } => "comparison",
            ExerciseKind::WordProblem { operation, .. } => operation.id(),
        }
    }

    /// The two operands of an addition, if this is one.
    fn addends(&self) -> Option<(u32, u32)> {
        match self {
            ExerciseKind::Addition { a, b, .. } => Some((*a, *b)),
            ExerciseKind::WordProblem {
                operation: Operation::Addition,
                a,
                b,
                ..
            } => Some((*a, *b)),
            _ => None,
        }
    }
}

/// Addition difficulty classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdditionSubtype {
    /// Sum at most 10.
    SingleDigit,
    /// Sum up to 20 with an operand of at most 10.
    BridgeTen,
    /// Any other sum up to 20.
    DoubleDigitSimple,
    /// Sum up to 50.
    DoubleDigit,
    /// Sum above 50.
    Advanced,
}

/// Mental-math strategies suggested for an addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    CountAll,
    CountOn,
    Make10,
    Doubles,
    NearDoubles,
}

/// Which of two numbers the child must pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extremum {
    Larger,
    Smaller,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    After,
    Before,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceValue {
    Tens,
    Units,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    Length,
    Money,
}

impl Measure {
    pub fn unit(&self) -> &'static str {
        match self {
            Measure::Length => "cm",
            Measure::Money => "€",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Addition,
    Subtraction,
}

impl Operation {
    pub fn id(&self) -> &'static str {
        match self {
            Operation::Addition => "addition",
            Operation::Subtraction => "subtraction",
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Operation::Addition => '+',
            Operation::Subtraction => '-',
        }
    }
}

/// Themed object used in counting exercises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountedObject {
    pub icon: String,
    pub singular: String,
    pub plural: String,
}

/// Grid the counted objects are laid out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrangement {
    pub rows: u32,
    pub cols: u32,
}

impl Arrangement {
    /// Near-square grid holding `count` objects.
    pub fn grid(count: u32) -> Self {
        let count = count.max(1);
        let cols = (count as f64).sqrt().ceil() as u32;
        let rows = count.div_ceil(cols);
        Self { rows, cols }
    }
}

/// Ruler shown next to a length exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruler {
    pub length_cm: u32,
    /// Graduations are hidden in the abstract phase.
    pub show_marks: bool,
}

/// The geometry shape catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Circle,
    Square,
    Rectangle,
    Triangle,
    Pentagon,
    Hexagon,
}

impl Shape {
    /// All shapes; the first four are the ones shown at difficulty 1 and 2.
    pub fn all() -> &'static [Shape] {
        &[
            Shape::Circle,
            Shape::Square,
            Shape::Rectangle,
            Shape::Triangle,
            Shape::Pentagon,
            Shape::Hexagon,
        ]
    }

    /// French name.
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Circle => "cercle",
            Shape::Square => "carré",
            Shape::Rectangle => "rectangle",
            Shape::Triangle => "triangle",
            Shape::Pentagon => "pentagone",
            Shape::Hexagon => "hexagone",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Shape::Circle => "⭕",
            Shape::Square => "🟥",
            Shape::Rectangle => "🟦",
            Shape::Triangle => "🔺",
            Shape::Pentagon => "⬠",
            Shape::Hexagon => "⬡",
        }
    }

    pub fn sides(&self) -> u32 {
        match self {
            Shape::Circle => 0,
            Shape::Square | Shape::Rectangle => 4,
            Shape::Triangle => 3,
            Shape::Pentagon => 5,
            Shape::Hexagon => 6,
        }
    }
}

/// A distractor shape in a counting scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeCount {
    pub shape: Shape,
    pub count: u32,
}

/// Hint ladder rung.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintTier {
    /// Strategy description, no new numbers.
    Conceptual,
    /// A worked micro-step.
    Strategic,
    /// Part of the answer, never all of it.
    Partial,
}

impl HintTier {
    /// Tier for the n-th hint given on an exercise (1-based). Calls past
    /// the third stay on the partial rung.
    pub fn for_hint_number(n: u32) -> HintTier {
        match n {
            0 | 1 => HintTier::Conceptual,
            2 => HintTier::Strategic,
            _ => HintTier::Partial,
        }
    }

    /// 1, 2 or 3.
    pub fn level(&self) -> u8 {
        match self {
            HintTier::Conceptual => 1,
            HintTier::Strategic => 2,
            HintTier::Partial => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub tier: HintTier,
    pub text: String,
}

impl Hint {
    pub fn new(tier: HintTier, text: impl Into<String>) -> Self {
        Self {
            tier,
            text: text.into(),
        }
    }

    /// Partial reveal: the first digit of a multi-digit answer, or a
    /// three-wide bracket around a single-digit one.
    pub fn partial_reveal(answer: u32) -> Self {
        let text = if answer >= 10 {
            let first = answer.to_string().chars().next().unwrap_or('0');
            format!("La réponse commence par \"{}\"...", first)
        } else {
            let low = answer.saturating_sub(1);
            let high = (answer + 1).max(low + 2);
            format!("La réponse est entre {} et {}...", low, high)
        };
        Self::new(HintTier::Partial, text)
    }
}

/// Classification of an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Correct,
    /// Off by one.
    Close,
    /// Gave one of the two addends.
    Partial,
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub message: String,
}

/// Classify `given` against the exercise's answer, with a French message.
pub fn feedback(exercise: &Exercise, given: u32) -> Feedback {
    let (kind, message) = if exercise.is_correct(given) {
        (FeedbackKind::Correct, "Bravo !")
    } else if exercise.answer.abs_diff(given) == 1 {
        (FeedbackKind::Close, "Presque ! Tu es très proche.")
    } else if exercise
        .kind
        .addends()
        .is_some_and(|(a, b)| given == a || given == b)
    {
        (
            FeedbackKind::Partial,
            "Tu n'as compté qu'un seul groupe. Additionne les deux !",
        )
    } else {
        (FeedbackKind::Incorrect, "Réessaie !")
    };

    Feedback {
        kind,
        message: message.to_string(),
    }
}
