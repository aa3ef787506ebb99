//! Length, clock reading, money and measure comparison.

use rand::RngCore;

use crate::core::{
    Domain, Exercise, ExerciseKind, ExerciseType, Extremum, Measure, Phase, Ruler,
};
use crate::generators::numeration::distant_from;
use crate::generators::{coin_flip, pick, rand_between, ExerciseGenerator, ExerciseRequest};

const TYPES: &[ExerciseType] = &[
    ExerciseType {
        id: "length",
        name: "Longueurs",
        icon: "📏",
    },
    ExerciseType {
        id: "time",
        name: "L'heure",
        icon: "🕐",
    },
    ExerciseType {
        id: "money",
        name: "La monnaie",
        icon: "💰",
    },
    ExerciseType {
        id: "comparison",
        name: "Comparer",
        icon: "⚖️",
    },
];

const BASIC_COINS: &[u32] = &[1, 2, 5];
const ALL_COINS: &[u32] = &[1, 2, 5, 10, 20];

/// Mesures domain generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct MesuresGenerator;

impl MesuresGenerator {
    fn length(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise {
        let max = if request.difficulty() <= 2 { 20 } else { 50 };
        let length_cm = rand_between(rng, 5, max);
        let ruler = Ruler {
            length_cm,
            show_marks: request.phase != Phase::Abstract,
        };

        Exercise::new(
            Domain::Mesures,
            request.phase,
            request.difficulty(),
            ExerciseKind::Length { length_cm, ruler },
            length_cm,
        )
        .with_question(
            "Quelle est la longueur de cette ligne ?",
            "Mesure cette ligne. Combien de centimètres mesure-t-elle ?",
        )
        .with_hints(
            "Compte les graduations sur la règle.",
            "Pose le début de la ligne sur le 0 de la règle, puis lis le nombre au bout.",
        )
    }

    fn time(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise {
        let hours = rand_between(rng, 1, 12);
        let minute_choices: &[u32] = if request.difficulty() <= 2 {
            &[0, 30]
        } else {
            &[0, 15, 30, 45]
        };
        let minutes = *pick(rng, minute_choices);

        let strategic = if minutes == 0 {
            "La grande aiguille est sur le 12 : c'est une heure pile."
        } else {
            "La petite aiguille est entre deux nombres : prends le plus petit."
        };

        // Only the hour is graded
        Exercise::new(
            Domain::Mesures,
            request.phase,
            request.difficulty(),
            ExerciseKind::Time { hours, minutes },
            hours,
        )
        .with_question(
            "Quelle heure est-il ?",
            "Regarde l'horloge. Quelle heure est-il ?",
        )
        .with_hints("La petite aiguille indique les heures.", strategic)
    }

    fn money(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise {
        let difficulty = request.difficulty();
        let available = if difficulty <= 2 { BASIC_COINS } else { ALL_COINS };
        let count = rand_between(rng, 2, 5u32.min(u32::from(difficulty) + 2));
        let coins: Vec<u32> = (0..count).map(|_| *pick(rng, available)).collect();
        let total: u32 = coins.iter().sum();
        let largest = coins.iter().copied().max().unwrap_or(0);

        Exercise::new(
            Domain::Mesures,
            request.phase,
            difficulty,
            ExerciseKind::Money { coins },
            total,
        )
        .with_question(
            "Combien d'euros au total ?",
            "Compte toutes les pièces. Combien d'euros y a-t-il au total ?",
        )
        .with_hints(
            "Additionne toutes les pièces.",
            format!(
                "Commence par la plus grosse pièce, {} €, puis ajoute les autres une par une.",
                largest
            ),
        )
    }

    fn comparison(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise {
        let measure = if coin_flip(rng) {
            Measure::Length
        } else {
            Measure::Money
        };
        let a = rand_between(rng, 5, 30);
        let b = distant_from(rng, a, 5, 30);
        let ask = if coin_flip(rng) {
            Extremum::Larger
        } else {
            Extremum::Smaller
        };

        let word = match (measure, ask) {
            (Measure::Length, Extremum::Larger) => "plus long",
            (Measure::Length, Extremum::Smaller) => "plus court",
            (Measure::Money, Extremum::Larger) => "plus grand",
            (Measure::Money, Extremum::Smaller) => "plus petit",
        };
        let answer = match ask {
            Extremum::Larger => a.max(b),
            Extremum::Smaller => a.min(b),
        };
        let unit = measure.unit();
        let question = format!("Quel est le {} : {}{} ou {}{} ?", word, a, unit, b, unit);

        Exercise::new(
            Domain::Mesures,
            request.phase,
            request.difficulty(),
            ExerciseKind::MeasureComparison { measure, a, b, ask },
            answer,
        )
        .with_question(question.clone(), question)
        .with_hints(
            "Compare les deux nombres.",
            format!(
                "Place {} et {} sur la bande numérique : le plus grand est le plus à droite.",
                a, b
            ),
        )
    }
}

impl ExerciseGenerator for MesuresGenerator {
    fn domain(&self) -> Domain {
        Domain::Mesures
    }

    fn exercise_types(&self) -> &'static [ExerciseType] {
        TYPES
    }

    fn generate(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise {
        match self.pick_type(request, rng) {
            "time" => self.time(request, rng),
            "money" => self.money(request, rng),
            "comparison" => self.comparison(request, rng),
            _ => self.length(request, rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generate(difficulty: u8, phase: Phase, kind: &str, seed: u64) -> Exercise {
        let mut rng = StdRng::seed_from_u64(seed);
        MesuresGenerator.generate(
            &ExerciseRequest::new(difficulty, phase).with_type(kind),
            &mut rng,
        )
    }

    #[test]
    fn test_length_bounds_and_ruler() {
        for seed in 0..100 {
            let low = generate(2, Phase::Pictorial, "length", seed);
            assert!((5..=20).contains(&low.answer));
            let high = generate(6, Phase::Abstract, "length", seed);
            assert!((5..=50).contains(&high.answer));

            let ExerciseKind::Length { ruler, .. } = high.kind else {
                panic!("expected length");
            };
            assert!(!ruler.show_marks);
        }
        let ExerciseKind::Length { ruler, .. } = generate(1, Phase::Concrete, "length", 1).kind
        else {
            panic!("expected length");
        };
        assert!(ruler.show_marks);
    }

    #[test]
    fn test_time_grades_hours_only() {
        for seed in 0..100 {
            let ex = generate(1, Phase::Pictorial, "time", seed);
            let ExerciseKind::Time { hours, minutes } = ex.kind else {
                panic!("expected time");
            };
            assert!((1..=12).contains(&hours));
            assert!(minutes == 0 || minutes == 30);
            assert_eq!(ex.answer, hours);
        }
        for seed in 0..100 {
            let ex = generate(5, Phase::Pictorial, "time", seed);
            let ExerciseKind::Time { minutes, .. } = ex.kind else {
                panic!("expected time");
            };
            assert!([0, 15, 30, 45].contains(&minutes));
        }
    }

    #[test]
    fn test_money_sums_coins() {
        for difficulty in 1..=10u8 {
            for seed in 0..30 {
                let ex = generate(difficulty, Phase::Concrete, "money", seed);
                let ExerciseKind::Money { coins } = &ex.kind else {
                    panic!("expected money");
                };
                assert!(coins.len() >= 2);
                assert!(coins.len() as u32 <= 5u32.min(u32::from(difficulty) + 2));
                if difficulty <= 2 {
                    assert!(coins.iter().all(|c| BASIC_COINS.contains(c)));
                }
                assert_eq!(ex.answer, coins.iter().sum::<u32>());
            }
        }
    }

    #[test]
    fn test_comparison_vocabulary() {
        for seed in 0..100 {
            let ex = generate(3, Phase::Abstract, "comparison", seed);
            let ExerciseKind::MeasureComparison { measure, a, b, ask } = ex.kind else {
                panic!("expected comparison");
            };
            assert!((5..=30).contains(&a) && (5..=30).contains(&b));
            assert_ne!(a, b);
            match measure {
                Measure::Length => {
                    assert!(ex.question.contains("plus long") || ex.question.contains("plus court"));
                    assert!(ex.question.contains("cm"));
                }
                Measure::Money => {
                    assert!(ex.question.contains("plus grand") || ex.question.contains("plus petit"));
                    assert!(ex.question.contains('€'));
                }
            }
            match ask {
                Extremum::Larger => assert_eq!(ex.answer, a.max(b)),
                Extremum::Smaller => assert_eq!(ex.answer, a.min(b)),
            }
            assert_eq!(ex.type_id(), "comparison");
        }
    }
}
