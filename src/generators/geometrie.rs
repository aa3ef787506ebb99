//! Shape recognition and counting.

use rand::seq::SliceRandom;
use rand::RngCore;

use crate::core::{Domain, Exercise, ExerciseKind, ExerciseType, Shape, ShapeCount};
use crate::generators::{pick, rand_between, ExerciseGenerator, ExerciseRequest};

const TYPES: &[ExerciseType] = &[
    ExerciseType {
        id: "recognition",
        name: "Reconnaître",
        icon: "👁️",
    },
    ExerciseType {
        id: "countSides",
        name: "Compter les côtés",
        icon: "📐",
    },
    ExerciseType {
        id: "countShapes",
        name: "Compter les formes",
        icon: "🔢",
    },
];

/// Choices offered in a recognition exercise.
const OPTION_COUNT: usize = 4;

/// Shapes available at `difficulty`: the first four up to difficulty 2.
pub fn shapes_for(difficulty: u8) -> &'static [Shape] {
    let all = Shape::all();
    if difficulty <= 2 {
        &all[..4]
    } else {
        all
    }
}

/// Geometrie domain generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometrieGenerator;

impl GeometrieGenerator {
    fn recognition(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise {
        let available = shapes_for(request.difficulty());
        let shape = *pick(rng, available);

        let mut others: Vec<Shape> = available.iter().copied().filter(|s| *s != shape).collect();
        others.shuffle(rng);
        let mut options = vec![shape];
        options.extend(others.into_iter().take(OPTION_COUNT - 1));
        options.shuffle(rng);

        // 1-based so the answer can be typed on the digit keyboard
        let answer = options
            .iter()
            .position(|s| *s == shape)
            .map(|i| i as u32 + 1)
            .unwrap_or(1);

        let listing = options
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {}", i + 1, s.name()))
            .collect::<Vec<_>>()
            .join(", ");

        let (conceptual, strategic) = match shape.sides() {
            0 => (
                "Cette forme n'a aucun coin.".to_string(),
                "Cherche la forme toute ronde.".to_string(),
            ),
            sides => (
                format!("Cette forme a {} côtés.", sides),
                format!("Élimine les formes qui n'ont pas {} côtés.", sides),
            ),
        };

        Exercise::new(
            Domain::Geometrie,
            request.phase,
            request.difficulty(),
            ExerciseKind::Recognition { shape, options },
            answer,
        )
        .with_question(
            "Quel est le nom de cette forme ?",
            format!(
                "Comment s'appelle cette forme ? Tape le numéro de la bonne réponse : {}.",
                listing
            ),
        )
        .with_hints(conceptual, strategic)
    }

    fn count_sides(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise {
        let polygons: Vec<Shape> = shapes_for(request.difficulty())
            .iter()
            .copied()
            .filter(|s| s.sides() > 0)
            .collect();
        let shape = *pick(rng, &polygons);
        let name = shape.name();
        let question = format!("Combien de côtés a un {} ?", name);

        Exercise::new(
            Domain::Geometrie,
            request.phase,
            request.difficulty(),
            ExerciseKind::CountSides { shape },
            shape.sides(),
        )
        .with_question(question.clone(), question)
        .with_hints(
            format!("Compte chaque côté du {}.", name),
            format!(
                "Pose ton doigt sur un coin et fais le tour du {} en comptant.",
                name
            ),
        )
    }

    fn count_shapes(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise {
        let difficulty = request.difficulty();
        let available = shapes_for(difficulty);
        let target = *pick(rng, available);
        let count = rand_between(rng, 2, 8u32.min(u32::from(difficulty) + 4));

        let mut others: Vec<Shape> = available.iter().copied().filter(|s| *s != target).collect();
        others.shuffle(rng);
        let kinds = rand_between(rng, 1, 4) as usize;
        let distractors: Vec<ShapeCount> = others
            .into_iter()
            .take(kinds)
            .map(|shape| ShapeCount {
                shape,
                count: rand_between(rng, 1, 3),
            })
            .collect();

        let name = target.name();
        Exercise::new(
            Domain::Geometrie,
            request.phase,
            difficulty,
            ExerciseKind::CountShapes {
                target,
                count,
                distractors,
            },
            count,
        )
        .with_question(
            format!("Combien de {}s vois-tu ?", name),
            format!("Compte les {}s. Combien y en a-t-il ?", name),
        )
        .with_hints(
            format!("Touche chaque {} en comptant.", name),
            format!(
                "Barre chaque {} quand tu l'as compté, et ignore les autres formes.",
                name
            ),
        )
    }
}

impl ExerciseGenerator for GeometrieGenerator {
    fn domain(&self) -> Domain {
        Domain::Geometrie
    }

    fn exercise_types(&self) -> &'static [ExerciseType] {
        TYPES
    }

    fn generate(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise {
        match self.pick_type(request, rng) {
            "countSides" => self.count_sides(request, rng),
            "countShapes" => self.count_shapes(request, rng),
            _ => self.recognition(request, rng),
        }
    }
}
