//! Generate command: print exercises without playing them.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::core::{clamp_difficulty, Domain, Exercise, Phase, DEFAULT_DIFFICULTY};
use crate::generators::{ExerciseRequest, GeneratorRegistry};

/// Options for the generate command.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    pub domain: Domain,
    pub difficulty: u8,
    pub phase: Phase,
    /// Exercise type id within the domain; random when `None`.
    pub exercise_type: Option<String>,
    pub count: u32,
    /// Seed for reproducible output.
    pub seed: Option<u64>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            json: false,
            quiet: false,
            domain: Domain::Calcul,
            difficulty: DEFAULT_DIFFICULTY,
            phase: Phase::Abstract,
            exercise_type: None,
            count: 1,
            seed: None,
        }
    }
}

/// Output format for the generate command.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateOutput {
    pub success: bool,
    pub domain: Domain,
    pub difficulty: u8,
    pub exercises: Vec<Exercise>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateOutput {
    /// Create a successful output.
    pub fn success(domain: Domain, difficulty: u8, exercises: Vec<Exercise>) -> Self {
        Self {
            success: true,
            domain,
            difficulty,
            exercises,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(domain: Domain, error: impl Into<String>) -> Self {
        Self {
            success: false,
            domain,
            difficulty: 0,
            exercises: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The generate command implementation.
pub struct GenerateCommand {
    generators: GeneratorRegistry,
}

impl Default for GenerateCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerateCommand {
    /// Create a generate command over the built-in generators.
    pub fn new() -> Self {
        Self {
            generators: GeneratorRegistry::with_defaults(),
        }
    }

    /// Run the generate command.
    pub fn run(&self, options: &GenerateOptions) -> GenerateOutput {
        let difficulty = clamp_difficulty(options.difficulty);
        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut request = ExerciseRequest::new(difficulty, options.phase);
        if let Some(exercise_type) = &options.exercise_type {
            request = request.with_type(exercise_type.as_str());
        }

        let mut exercises = Vec::new();
        for _ in 0..options.count.max(1) {
            match self.generators.generate(options.domain, &request, &mut rng) {
                Ok(exercise) => exercises.push(exercise),
                Err(e) => return GenerateOutput::failure(options.domain, e.to_string()),
            }
        }

        GenerateOutput::success(options.domain, difficulty, exercises)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &GenerateOutput, options: &GenerateOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &GenerateOutput) -> String {
        if !output.success {
            return format!(
                "Generation failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut lines = vec![format!(
            "{} {} (niveau {})\n",
            output.domain.icon(),
            output.domain.display_name(),
            output.difficulty
        )];
        for (i, exercise) in output.exercises.iter().enumerate() {
            lines.push(format!("{}. [{}] {}", i + 1, exercise.type_id(), exercise.question));
            if exercise.question_text != exercise.question {
                lines.push(format!("   {}", exercise.question_text));
            }
            lines.push(format!("   réponse : {}\n", exercise.answer));
        }
        lines.join("\n")
    }
}
