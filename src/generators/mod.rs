//! Exercise generators, one per domain.
//!
//! Every generator implements [`ExerciseGenerator`]; the engine looks them up
//! through a [`GeneratorRegistry`] keyed by [`Domain`]. Adding a domain means
//! registering one more generator.
//!
//! Randomness is always injected as `&mut dyn RngCore` so a seeded RNG gives
//! reproducible exercises in tests.

pub mod calcul;
pub mod geometrie;
pub mod mesures;
pub mod numeration;
pub mod problemes;

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use crate::core::{Domain, Exercise, ExerciseType, NumberRange, Phase, MAX_DIFFICULTY, MIN_DIFFICULTY};
use crate::error::{MathError, Result};

pub use calcul::CalculGenerator;
pub use geometrie::GeometrieGenerator;
pub use mesures::MesuresGenerator;
pub use numeration::NumerationGenerator;
pub use problemes::ProblemesGenerator;

/// What the caller wants generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseRequest {
    pub difficulty: u8,
    pub phase: Phase,
    /// Exercise type id; `None` picks one at random.
    pub exercise_type: Option<String>,
}

impl ExerciseRequest {
    pub fn new(difficulty: u8, phase: Phase) -> Self {
        Self {
            difficulty,
            phase,
            exercise_type: None,
        }
    }

    pub fn with_type(mut self, exercise_type: impl Into<String>) -> Self {
        self.exercise_type = Some(exercise_type.into());
        self
    }

    /// The requested difficulty, or 1 when it lies outside 1..=10.
    pub fn difficulty(&self) -> u8 {
        if (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&self.difficulty) {
            self.difficulty
        } else {
            MIN_DIFFICULTY
        }
    }

    /// Operand range for the effective difficulty.
    pub fn range(&self) -> NumberRange {
        NumberRange::for_difficulty(self.difficulty())
    }
}

/// A domain's exercise factory.
pub trait ExerciseGenerator: Send + Sync {
    /// Domain this generator produces exercises for.
    fn domain(&self) -> Domain;

    /// Exercise types this generator knows, in menu order.
    fn exercise_types(&self) -> &'static [ExerciseType];

    /// Generate one exercise.
    fn generate(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> Exercise;

    /// Resolve the requested type id, choosing uniformly when absent.
    ///
    /// Unknown ids are logged and replaced by a random known type.
    fn pick_type(&self, request: &ExerciseRequest, rng: &mut dyn RngCore) -> &'static str {
        let types = self.exercise_types();
        if let Some(wanted) = request.exercise_type.as_deref() {
            if let Some(t) = types.iter().find(|t| t.id == wanted) {
                return t.id;
            }
            tracing::warn!(
                "unknown exercise type '{}' for {}, picking one at random",
                wanted,
                self.domain()
            );
        }
        types.choose(rng).map(|t| t.id).unwrap_or_default()
    }
}

/// Uniform draw in `min..=max`; returns `min` when the range is empty.
pub(crate) fn rand_between(rng: &mut dyn RngCore, min: u32, max: u32) -> u32 {
    if max <= min {
        return min;
    }
    rng.gen_range(min..=max)
}

/// Fair coin.
pub(crate) fn coin_flip(rng: &mut dyn RngCore) -> bool {
    rng.gen_bool(0.5)
}

/// Pick from a non-empty static slice.
pub(crate) fn pick<'a, T>(rng: &mut dyn RngCore, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

/// Map from domain to generator.
pub struct GeneratorRegistry {
    generators: HashMap<Domain, Box<dyn ExerciseGenerator>>,
}

impl GeneratorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            generators: HashMap::new(),
        }
    }

    /// Registry with the five built-in generators.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(NumerationGenerator));
        registry.register(Box::new(CalculGenerator));
        registry.register(Box::new(GeometrieGenerator));
        registry.register(Box::new(MesuresGenerator));
        registry.register(Box::new(ProblemesGenerator));
        registry
    }

    /// Register a generator, replacing any previous one for its domain.
    pub fn register(&mut self, generator: Box<dyn ExerciseGenerator>) {
        self.generators.insert(generator.domain(), generator);
    }

    /// Generator for `domain`, if registered.
    pub fn get(&self, domain: Domain) -> Option<&dyn ExerciseGenerator> {
        self.generators.get(&domain).map(|g| g.as_ref())
    }

    /// Generator for `domain`, falling back to Calcul when it is missing.
    pub fn resolve(&self, domain: Domain) -> Result<&dyn ExerciseGenerator> {
        if let Some(generator) = self.get(domain) {
            return Ok(generator);
        }
        tracing::warn!("no generator registered for {}, falling back to calcul", domain);
        self.get(Domain::Calcul)
            .ok_or_else(|| MathError::unknown_domain(domain.id()))
    }

    /// Generate an exercise for `domain`.
    pub fn generate(
        &self,
        domain: Domain,
        request: &ExerciseRequest,
        rng: &mut dyn RngCore,
    ) -> Result<Exercise> {
        let exercise = self.resolve(domain)?.generate(request, rng);
        tracing::debug!(
            id = %exercise.id,
            domain = %exercise.domain,
            kind = exercise.type_id(),
            answer = exercise.answer,
            "generated exercise"
        );
        Ok(exercise)
    }

    /// Registered domains, in menu order.
    pub fn domains(&self) -> Vec<Domain> {
        let mut domains: Vec<Domain> = self.generators.keys().copied().collect();
        domains.sort();
        domains
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
