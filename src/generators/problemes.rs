//! Template-based word problems.

use rand::RngCore;

use crate::core::{Domain, Exercise, ExerciseKind, ExerciseType, Operation};
use crate::generators::{pick, rand_between, ExerciseGenerator, ExerciseRequest};

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

/// A story with placeholders and the objects it can be told about.
///
/// `{a.object}` takes the noun form agreeing with `a`. The named child is
/// never referred to by a pronoun, so any name fits any story.
struct Template {
    id: &'static str,
    text: &'static str,
    /// (singular, plural)
    objects: &'static [(&'static str, &'static str)],
}

const ADDITION_TEMPLATES: &[Template] = &[
    Template {
        id: "add_fruits",
        text: "{name} a {a} {a.object}. {nom2} lui en donne {b} de plus. Combien de {object.plural} a {name} maintenant ?",
        objects: &[("pomme", "pommes"), ("orange", "oranges"), ("banane", "bananes")],
    },
    Template {
        id: "add_toys",
        text: "Il y a {a} {a.object} sur la table. Maman en pose {b} de plus. Combien y a-t-il de {object.plural} sur la table ?",
        objects: &[("jouet", "jouets"), ("crayon", "crayons"), ("bille", "billes")],
    },
    Template {
        id: "add_animals",
        text: "Au parc, {name} compte {a} {a.object}. Ensuite, {name} en compte {b} de plus. Combien de {object.plural} a compté {name} en tout ?",
        objects: &[("oiseau", "oiseaux"), ("écureuil", "écureuils"), ("canard", "canards")],
    },
];

const SUBTRACTION_TEMPLATES: &[Template] = &[
    Template {
        id: "sub_candies",
        text: "{name} a {a} {a.object}. {name} en mange {b}. Combien lui reste-t-il de {object.plural} ?",
        objects: &[("bonbon", "bonbons"), ("gâteau", "gâteaux"), ("biscuit", "biscuits")],
    },
    Template {
        id: "sub_leave",
        text: "Il y a {a} {a.object} dans la cour. La maîtresse en appelle {b} en classe. Combien d'enfants reste-t-il dans la cour ?",
        objects: &[("enfant", "enfants")],
    },
    Template {
        id: "sub_balloons",
        text: "{name} a {a} {a.object}. Le vent en emporte {b}. Combien lui reste-t-il de {object.plural} ?",
        objects: &[("ballon", "ballons"), ("cerf-volant", "cerfs-volants")],
    },
];

const NAMES: &[&str] = &[
    "Lucas", "Emma", "Léo", "Chloé", "Hugo", "Jade", "Arthur", "Louise",
];

const SECOND_CHARACTERS: &[&str] = &["son ami", "sa sœur", "son frère", "sa maman"];

/// Problemes domain generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProblemesGenerator;

impl ProblemesGenerator {
    fn problem(
        &self,
        operation: Operation,
        request: &ExerciseRequest,
        rng: &mut dyn RngCore,
    ) -> Exercise {
        let ceiling = if request.difficulty() <= 2 { 20 } else { 50 };

        let (a, b, answer, templates, strategy) = match operation {
            Operation::Addition => {
                let a = rand_between(rng, 1, ceiling / 2);
                let b = rand_between(rng, 1, ceiling - a);
                (
                    a,
                    b,
                    a + b,
                    ADDITION_TEMPLATES,
                    "Trouve les deux nombres dans le texte et additionne-les.",
                )
            }
            Operation::Subtraction => {
                let a = rand_between(rng, 5, ceiling);
                let b = rand_between(rng, 1, a - 1);
                (
                    a,
                    b,
                    a - b,
                    SUBTRACTION_TEMPLATES,
                    "Trouve les deux nombres dans le texte et fais une soustraction.",
                )
            }
        };

        let template = pick(rng, templates);
        let &(singular, plural) = pick(rng, template.objects);
        let a_object = if a == 1 { singular } else { plural };
        let name = *pick(rng, NAMES);
        let second = *pick(rng, SECOND_CHARACTERS);

        let text = fill_template(
            template.text,
            &[
                ("a", a.to_string().as_str()),
                ("b", b.to_string().as_str()),
                ("name", name),
                ("nom2", second),
                ("a.object", a_object),
                ("object.plural", plural),
            ],
        );
        let equation = format!("{} {} {} = ?", a, operation.symbol(), b);

        Exercise::new(
            Domain::Problemes,
            request.phase,
            request.difficulty(),
            ExerciseKind::WordProblem {
                operation,
                a,
                b,
                template: template.id.to_string(),
                equation: equation.clone(),
                strategy: strategy.to_string(),
            },
            answer,
        )
        .with_question(text.clone(), text)
        .with_hints(strategy, equation)
    }
}

impl ExerciseGenerator for ProblemesGenerator {
    fn domain(&self) -> Domain {
        Domain::Problemes
    }

    fn exercise_types(&self) -> &'static [ExerciseType] {
        TYPES
    }

    fn generate(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise {
        let operation = match self.pick_type(request, rng) {
            "subtraction" => Operation::Subtraction,
            _ => Operation::Addition,
        };
        self.problem(operation, request, rng)
    }
}

/// Substitute `{key}` placeholders and capitalize each sentence.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut text = template.to_string();
    for (key, value) in values {
        text = text.replace(&format!("{{{}}}", key), value);
    }

    let mut out = String::with_capacity(text.len());
    let mut capitalize = true;
    for c in text.chars() {
        if capitalize && c.is_alphabetic() {
            out.extend(c.to_uppercase());
            capitalize = false;
        } else {
            if c.is_alphanumeric() {
                capitalize = false;
            }
            out.push(c);
        }
        if matches!(c, '.' | '?' | '!') {
            capitalize = true;
        }
    }
    out
}
