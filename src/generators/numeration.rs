//! Counting, comparing, ordering and place value.

use rand::RngCore;

use crate::core::{
    Arrangement, CountedObject, Domain, Exercise, ExerciseKind, ExerciseType, Extremum,
    OrderDirection, Phase, PlaceValue,
};
use crate::generators::{coin_flip, pick, rand_between, ExerciseGenerator, ExerciseRequest};

const TYPES: &[ExerciseType] = &[
    ExerciseType {
        id: "counting",
        name: "Comptage",
        icon: "🔢",
    },
    ExerciseType {
        id: "comparison",
        name: "Comparaison",
        icon: "⚖️",
    },
    ExerciseType {
        id: "ordering",
        name: "Suite",
        icon: "➡️",
    },
    ExerciseType {
        id: "decomposition",
        name: "Dizaines/Unités",
        icon: "🧮",
    },
];

/// (icon, singular, plural)
const OBJECTS: &[(&str, &str, &str)] = &[
    ("🔵", "jeton", "jetons"),
    ("⭐", "étoile", "étoiles"),
    ("🍎", "pomme", "pommes"),
    ("🏀", "ballon", "ballons"),
    ("🌸", "fleur", "fleurs"),
];

/// Added to the pool from difficulty 3.
const HARDER_OBJECTS: &[(&str, &str, &str)] = &[("🧊", "cube", "cubes"), ("📦", "boîte", "boîtes")];

/// Counting never asks for more than this many objects.
const MAX_COUNT: u32 = 20;

/// Numeration domain generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumerationGenerator;

impl NumerationGenerator {
    fn counting(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise {
        let range = request.range();
        let count = rand_between(rng, range.min, range.max.min(MAX_COUNT));

        let pool: Vec<&(&str, &str, &str)> = if request.difficulty() >= 3 {
            OBJECTS.iter().chain(HARDER_OBJECTS).collect()
        } else {
            OBJECTS.iter().collect()
        };
        let &&(icon, singular, plural) = pick(rng, &pool);
        let arrangement = Arrangement::grid(count);

        let conceptual = match request.phase {
            Phase::Concrete => format!("Touche chaque {} en comptant à voix haute.", singular),
            _ => format!("Montre chaque {} du doigt en comptant.", singular),
        };
        let strategic = format!(
            "Compte ligne par ligne : il y a {} lignes de {} au plus.",
            arrangement.rows, arrangement.cols
        );

        Exercise::new(
            Domain::Numeration,
            request.phase,
            request.difficulty(),
            ExerciseKind::Counting {
                count,
                object: CountedObject {
                    icon: icon.to_string(),
                    singular: singular.to_string(),
                    plural: plural.to_string(),
                },
                arrangement,
            },
            count,
        )
        .with_question(
            format!("Combien y a-t-il de {} ?", plural),
            format!("Compte les {}. Combien y en a-t-il ?", plural),
        )
        .with_hints(conceptual, strategic)
    }

    fn comparison(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise {
        let range = request.range();
        let a = rand_between(rng, range.min, range.max);
        let b = distant_from(rng, a, range.min, range.max);

        let ask = if coin_flip(rng) {
            Extremum::Larger
        } else {
            Extremum::Smaller
        };
        let (answer, word, conceptual) = match ask {
            Extremum::Larger => (
                a.max(b),
                "le plus grand",
                "Le plus grand nombre a plus d'éléments.",
            ),
            Extremum::Smaller => (
                a.min(b),
                "le plus petit",
                "Le plus petit nombre a moins d'éléments.",
            ),
        };
        let strategic = if a >= 10 || b >= 10 {
            format!(
                "Compare d'abord les dizaines : {} a {} dizaines, {} en a {}.",
                a,
                a / 10,
                b,
                b / 10
            )
        } else {
            format!("Compte jusqu'à {}, puis jusqu'à {}.", a, b)
        };

        let question = format!("Quel nombre est {} : {} ou {} ?", word, a, b);
        Exercise::new(
            Domain::Numeration,
            request.phase,
            request.difficulty(),
            ExerciseKind::Comparison { a, b, ask },
            answer,
        )
        .with_question(question.clone(), question)
        .with_hints(conceptual, strategic)
    }

    fn ordering(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise {
        let range = request.range();
        let direction = if coin_flip(rng) {
            OrderDirection::After
        } else {
            OrderDirection::Before
        };

        // Keep the neighbour inside the range
        let (number, answer, word, conceptual, strategic) = match direction {
            OrderDirection::After => {
                let n = rand_between(rng, range.min, range.max - 1);
                (
                    n,
                    n + 1,
                    "après",
                    format!("Compte : {}, puis...", n),
                    format!("Ajoute 1 à {}.", n),
                )
            }
            OrderDirection::Before => {
                let n = rand_between(rng, range.min + 1, range.max);
                (
                    n,
                    n - 1,
                    "avant",
                    format!("Compte à rebours : {}, puis...", n),
                    format!("Enlève 1 à {}.", n),
                )
            }
        };

        let question = format!("Quel nombre vient {} {} ?", word, number);
        Exercise::new(
            Domain::Numeration,
            request.phase,
            request.difficulty(),
            ExerciseKind::Ordering { number, direction },
            answer,
        )
        .with_question(question.clone(), question)
        .with_hints(conceptual, strategic)
    }

    fn decomposition(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise {
        let range = request.range();
        let number = rand_between(rng, range.min.max(10), range.max.min(99));
        let tens = number / 10;
        let units = number % 10;

        let ask = if coin_flip(rng) {
            PlaceValue::Tens
        } else {
            PlaceValue::Units
        };
        let (answer, word, strategic) = match ask {
            PlaceValue::Tens => (
                tens,
                "dizaines",
                format!("Fais des paquets de 10 avec les {} unités.", number),
            ),
            PlaceValue::Units => (
                units,
                "unités",
                "Les unités, c'est le chiffre de droite.".to_string(),
            ),
        };

        Exercise::new(
            Domain::Numeration,
            request.phase,
            request.difficulty(),
            ExerciseKind::Decomposition {
                number,
                tens,
                units,
                ask,
            },
            answer,
        )
        .with_question(
            format!("Combien de {} dans {} ?", word, number),
            format!("Combien de {} y a-t-il dans {} ?", word, number),
        )
        .with_hints("Une dizaine, c'est 10 unités.", strategic)
    }
}

impl ExerciseGenerator for NumerationGenerator {
    fn domain(&self) -> Domain {
        Domain::Numeration
    }

    fn exercise_types(&self) -> &'static [ExerciseType] {
        TYPES
    }

    fn generate(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise {
        match self.pick_type(request, rng) {
            "comparison" => self.comparison(request, rng),
            "ordering" => self.ordering(request, rng),
            "decomposition" => self.decomposition(request, rng),
            _ => self.counting(request, rng),
        }
    }
}

/// A second number in `min..=max` at least 2 away from `a`.
pub(crate) fn distant_from(rng: &mut dyn RngCore, a: u32, min: u32, max: u32) -> u32 {
    for _ in 0..64 {
        let b = rand_between(rng, min, max);
        if a.abs_diff(b) >= 2 {
            return b;
        }
    }
    if a + 2 <= max {
        a + 2
    } else {
        a.saturating_sub(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::HintTier;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generate(difficulty: u8, kind: &str, seed: u64) -> Exercise {
        let mut rng = StdRng::seed_from_u64(seed);
        NumerationGenerator.generate(
            &ExerciseRequest::new(difficulty, Phase::Concrete).with_type(kind),
            &mut rng,
        )
    }

    #[test]
    fn test_counting_capped_at_twenty() {
        for difficulty in 1..=10u8 {
            for seed in 0..30 {
                let ex = generate(difficulty, "counting", seed);
                let ExerciseKind::Counting {
                    count, arrangement, ..
                } = &ex.kind
                else {
                    panic!("expected counting");
                };
                assert!(*count <= MAX_COUNT);
                assert_eq!(ex.answer, *count);
                assert!(arrangement.rows * arrangement.cols >= *count);
            }
        }
    }

    #[test]
    fn test_counting_harder_objects_only_from_difficulty_three() {
        for seed in 0..100 {
            let ex = generate(1, "counting", seed);
            let ExerciseKind::Counting { object, .. } = &ex.kind else {
                panic!("expected counting");
            };
            assert!(object.plural != "cubes" && object.plural != "boîtes");
            assert!(ex.question.contains(&object.plural));
        }
    }

    #[test]
    fn test_counting_hint_depends_on_phase() {
        let mut rng = StdRng::seed_from_u64(1);
        let concrete = NumerationGenerator.generate(
            &ExerciseRequest::new(1, Phase::Concrete).with_type("counting"),
            &mut rng,
        );
        let abstract_ = NumerationGenerator.generate(
            &ExerciseRequest::new(1, Phase::Abstract).with_type("counting"),
            &mut rng,
        );
        assert!(concrete.hints[0].text.starts_with("Touche"));
        assert!(abstract_.hints[0].text.starts_with("Montre"));
    }

    #[test]
    fn test_comparison_numbers_are_apart() {
        for seed in 0..200 {
            let ex = generate(1, "comparison", seed);
            let ExerciseKind::Comparison { a, b, ask } = ex.kind else {
                panic!("expected comparison");
            };
            assert!(a.abs_diff(b) >= 2);
            let expected = match ask {
                Extremum::Larger => a.max(b),
                Extremum::Smaller => a.min(b),
            };
            assert_eq!(ex.answer, expected);
        }
    }

    #[test]
    fn test_ordering_answer_in_range() {
        for difficulty in 1..=10u8 {
            let range = crate::core::NumberRange::for_difficulty(difficulty);
            for seed in 0..50 {
                let ex = generate(difficulty, "ordering", seed);
                let ExerciseKind::Ordering { number, direction } = ex.kind else {
                    panic!("expected ordering");
                };
                assert!(range.contains(ex.answer));
                match direction {
                    OrderDirection::After => assert_eq!(ex.answer, number + 1),
                    OrderDirection::Before => assert_eq!(ex.answer, number - 1),
                }
            }
        }
    }

    #[test]
    fn test_decomposition() {
        for difficulty in 1..=10u8 {
            for seed in 0..30 {
                let ex = generate(difficulty, "decomposition", seed);
                let ExerciseKind::Decomposition {
                    number,
                    tens,
                    units,
                    ask,
                } = ex.kind
                else {
                    panic!("expected decomposition");
                };
                assert!((10..=99).contains(&number));
                assert_eq!(tens * 10 + units, number);
                match ask {
                    PlaceValue::Tens => assert_eq!(ex.answer, tens),
                    PlaceValue::Units => assert_eq!(ex.answer, units),
                }
                assert_eq!(
                    ex.hint(HintTier::Conceptual).unwrap().text,
                    "Une dizaine, c'est 10 unités."
                );
            }
        }
    }

    #[test]
    fn test_distant_from_fallback() {
        let mut rng = StdRng::seed_from_u64(0);
        // Only 7 is two away from 5 within 5..=7
        let b = distant_from(&mut rng, 5, 5, 7);
        assert_eq!(b, 7);
    }
}
