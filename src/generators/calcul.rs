//! Addition and subtraction.

use rand::RngCore;

use crate::core::{AdditionSubtype, Domain, Exercise, ExerciseKind, ExerciseType, Strategy};
use crate::generators::{rand_between, ExerciseGenerator, ExerciseRequest};

const TYPES: &[ExerciseType] = &[
    ExerciseType {
        id: "addition",
        name: "Addition",
        icon: "➕",
    },
    ExerciseType {
        id: "subtraction",
        name: "Soustraction",
        icon: "➖",
    },
];

/// Highest sum an addition may reach at `difficulty`.
pub fn max_sum(difficulty: u8) -> u32 {
    match difficulty {
        1 => 10,
        2 => 20,
        3 => 50,
        _ => 100,
    }
}

/// Calcul domain generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculGenerator;

impl CalculGenerator {
    fn addition(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise {
        let difficulty = request.difficulty();
        let range = request.range();
        let max_sum = max_sum(difficulty);

        let (a, b) = if difficulty <= 2 {
            let a = rand_between(rng, 1, range.max.min(max_sum - 1));
            let b = rand_between(rng, 1, (max_sum - a).min(range.max));
            (a, b)
        } else {
            // Operands up to 60% of the range, sum still within the tier
            let cap = range.max * 6 / 10;
            let a = rand_between(rng, range.min, cap);
            let b_max = cap.min(max_sum - a);
            let b = rand_between(rng, range.min.min(b_max).max(1), b_max);
            (a, b)
        };
        let answer = a + b;

        let larger = a.max(b);
        let smaller = a.min(b);
        let strategic = match make_ten(a, b) {
            Some((complement, remainder)) => format!(
                "Fais un 10 ! {} + {} = 10, puis ajoute {}.",
                larger, complement, remainder
            ),
            None if answer <= 10 => format!("Pose {} doigts, puis ajoute {} doigts.", a, b),
            None => format!("Commence par {} et ajoute {}.", larger, smaller),
        };

        Exercise::new(
            Domain::Calcul,
            request.phase,
            difficulty,
            ExerciseKind::Addition {
                a,
                b,
                subtype: subtype(a, b),
                strategies: strategies(a, b),
            },
            answer,
        )
        .with_question(
            format!("{} + {} = ?", a, b),
            format!("Combien font {} plus {} ?", a, b),
        )
        .with_hints("Compte tous les éléments ensemble.", strategic)
    }

    fn subtraction(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise {
        let difficulty = request.difficulty();
        let range = request.range();

        let (a, b) = if difficulty <= 2 {
            let a = rand_between(rng, 3, range.max.min(20));
            let b = rand_between(rng, 1, a - 1);
            (a, b)
        } else {
            // b biased toward at most 60% of a
            let a = rand_between(rng, range.min + 5, range.max);
            let b_max = (a * 6 / 10).max(1);
            let b = rand_between(rng, range.min.min(b_max), b_max);
            (a, b)
        };
        let answer = a - b;

        Exercise::new(
            Domain::Calcul,
            request.phase,
            difficulty,
            ExerciseKind::Subtraction { a, b },
            answer,
        )
        .with_question(
            format!("{} - {} = ?", a, b),
            format!("Combien font {} moins {} ?", a, b),
        )
        .with_hints(
            "Enlève les éléments et compte ce qui reste.",
            format!("Commence à {} et compte {} en arrière.", a, b),
        )
    }
}

impl ExerciseGenerator for CalculGenerator {
    fn domain(&self) -> Domain {
        Domain::Calcul
    }

    fn exercise_types(&self) -> &'static [ExerciseType] {
        TYPES
    }

    fn generate(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise {
        match self.pick_type(request, rng) {
            "subtraction" => self.subtraction(request, rng),
            _ => self.addition(request, rng),
        }
    }
}

/// Make-10 split: `(complement, remainder)` when the sum crosses 10 and the
/// smaller addend can fill the larger one up to 10.
pub fn make_ten(a: u32, b: u32) -> Option<(u32, u32)> {
    let larger = a.max(b);
    let smaller = a.min(b);
    if a + b <= 10 || larger >= 10 {
        return None;
    }
    let complement = 10 - larger;
    (complement <= smaller).then(|| (complement, smaller - complement))
}

/// Classify an addition by the size of its sum.
pub fn subtype(a: u32, b: u32) -> AdditionSubtype {
    let sum = a + b;
    if sum <= 10 {
        AdditionSubtype::SingleDigit
    } else if sum <= 20 && (a <= 10 || b <= 10) {
        AdditionSubtype::BridgeTen
    } else if sum <= 20 {
        AdditionSubtype::DoubleDigitSimple
    } else if sum <= 50 {
        AdditionSubtype::DoubleDigit
    } else {
        AdditionSubtype::Advanced
    }
}

/// Mental-math strategies that apply to `a + b`.
pub fn strategies(a: u32, b: u32) -> Vec<Strategy> {
    let mut out = Vec::new();
    if a + b <= 10 {
        out.push(Strategy::CountAll);
    }
    out.push(Strategy::CountOn);
    if make_ten(a, b).is_some() {
        out.push(Strategy::Make10);
    }
    if a == b {
        out.push(Strategy::Doubles);
    }
    if a.abs_diff(b) == 1 {
        out.push(Strategy::NearDoubles);
    }
    out
}
