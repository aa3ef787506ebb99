//! Play command: an interactive session in the terminal.
//!
//! Each line the child types is one of:
//! - digits, fed key by key through the validator (a short answer is
//!   submitted at the end of the line),
//! - French words (`douze`, `vingt et un`), graded like a speech transcript,
//! - `?` for a hint, `passe` to skip the exercise, `fin` to stop.
//!
//! A wrong answer keeps the same exercise on screen; hints escalate on
//! their own after repeated mistakes.

use std::io::{BufRead, Write};
use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::core::{Domain, Exercise, Phase};
use crate::engine::{
    AnswerResult, ExerciseEngine, KeyOutcome, NextStep, SessionOptions, SessionProgress,
    SessionSummary, SpokenAnswer,
};
use crate::error::Result;
use crate::progress::StoredChildProfiles;
use crate::storage::KeyValueStore;

const HINT_COMMAND: &str = "?";
const SKIP_COMMAND: &str = "passe";
const STOP_COMMAND: &str = "fin";

/// Options for the play command.
#[derive(Debug, Clone)]
pub struct PlayOptions {
    /// Print the final summary as JSON.
    pub json: bool,
    /// Suppress the final summary.
    pub quiet: bool,
    pub domain: Domain,
    pub phase: Phase,
    /// Exercises in the session; the configured default when `None`.
    pub count: Option<u32>,
    /// Fixed difficulty; the child's level when `None`.
    pub difficulty: Option<u8>,
    /// Seed for reproducible exercises.
    pub seed: Option<u64>,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            json: false,
            quiet: false,
            domain: Domain::Calcul,
            phase: Phase::Abstract,
            count: None,
            difficulty: None,
            seed: None,
        }
    }
}

/// Output format for the play command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayOutput {
    pub success: bool,
    pub child_id: String,
    pub summary: Option<SessionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlayOutput {
    /// Create a successful output.
    pub fn success(child_id: &str, summary: SessionSummary) -> Self {
        Self {
            success: true,
            child_id: child_id.to_string(),
            summary: Some(summary),
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(child_id: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            child_id: child_id.to_string(),
            summary: None,
            error: Some(error.into()),
        }
    }
}

/// The play command implementation.
pub struct PlayCommand<S: KeyValueStore + 'static> {
    store: Arc<S>,
    config: Config,
}

impl<S: KeyValueStore + 'static> PlayCommand<S> {
    /// Create a new play command.
    pub fn new(store: Arc<S>, config: Config) -> Self {
        Self { store, config }
    }

    /// Play one session, reading answers from `input` and writing the
    /// dialogue to `out`.
    pub fn run<R: BufRead, W: Write>(
        &self,
        child_id: &str,
        options: &PlayOptions,
        input: R,
        out: &mut W,
    ) -> PlayOutput {
        match self.play(child_id, options, input, out) {
            Ok(summary) => PlayOutput::success(child_id, summary),
            Err(e) => PlayOutput::failure(child_id, e.to_string()),
        }
    }

    fn play<R: BufRead, W: Write>(
        &self,
        child_id: &str,
        options: &PlayOptions,
        input: R,
        out: &mut W,
    ) -> Result<SessionSummary> {
        let profile = StoredChildProfiles::new(Arc::clone(&self.store)).get_or_register(child_id)?;

        let mut engine = ExerciseEngine::new(Arc::clone(&self.store), self.config.clone());
        if let Some(seed) = options.seed {
            engine = engine.with_seed(seed);
        }

        let session_options = SessionOptions {
            exercise_count: options
                .count
                .unwrap_or(self.config.session.default_exercise_count),
            phase: options.phase,
            difficulty: options.difficulty,
        };
        let first = engine.start_session(&profile.id, options.domain, session_options)?;

        writeln!(
            out,
            "Bonjour {} ! {} {}, niveau {}.",
            profile.name,
            options.domain.icon(),
            options.domain.display_name(),
            engine.difficulty().unwrap_or_default()
        )?;
        writeln!(
            out,
            "({} = indice, {} = passer, {} = arrêter)",
            HINT_COMMAND, SKIP_COMMAND, STOP_COMMAND
        )?;
        show_exercise(out, &first, engine.progress())?;

        let mut lines = input.lines();
        loop {
            if engine.time_limit_reached() {
                writeln!(out, "C'est l'heure de faire une pause !")?;
                break;
            }

            write!(out, "> ")?;
            out.flush()?;
            let Some(line) = lines.next() else {
                writeln!(out)?;
                break;
            };
            let line = line?;

            let step = match line.trim() {
                "" => continue,
                HINT_COMMAND => {
                    let hint = engine.get_hint();
                    writeln!(out, "💡 {}", hint.text)?;
                    continue;
                }
                SKIP_COMMAND => engine.skip_exercise()?,
                STOP_COMMAND => break,
                answer => {
                    let Some(result) = grade(&mut engine, answer)? else {
                        writeln!(out, "Je n'ai pas compris. Réponds avec un nombre.")?;
                        continue;
                    };
                    report(out, &result)?;
                    if !result.is_correct {
                        continue;
                    }
                    engine.next_exercise()?
                }
            };

            match step {
                NextStep::Exercise(exercise) => show_exercise(out, &exercise, engine.progress())?,
                NextStep::Complete(summary) => return Ok(*summary),
            }
        }

        engine.end_session()
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &PlayOutput, options: &PlayOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &PlayOutput) -> String {
        let Some(summary) = output.summary.as_ref().filter(|_| output.success) else {
            return format!(
                "Play failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        };

        let mut lines = vec!["=== Séance terminée ===".to_string()];
        lines.push(format!(
            "Réussis : {}/{} ({}%)",
            summary.correct_answers, summary.total_exercises, summary.success_rate
        ));
        lines.push(format!("⭐ {} étoiles gagnées", summary.stars_earned));
        lines.push(format!("Meilleure série : {}\n", summary.best_streak));
        lines.join("\n")
    }
}

/// Grade one line of input. `None` when no number could be read.
fn grade<S: KeyValueStore + 'static>(
    engine: &mut ExerciseEngine<S>,
    answer: &str,
) -> Result<Option<AnswerResult>> {
    if answer.chars().all(|c| c.is_ascii_digit()) {
        for digit in answer.chars() {
            if let Some(KeyOutcome {
                result: Some(result),
                ..
            }) = engine.press_digit(digit)?
            {
                return Ok(Some(result));
            }
        }
        // Fewer digits than the answer has
        return Ok(engine.submit_typed()?.and_then(|outcome| outcome.result));
    }

    match engine.submit_spoken(answer, &[])? {
        SpokenAnswer::Answered(result) => Ok(Some(*result)),
        SpokenAnswer::Unrecognized { .. } => Ok(None),
    }
}

fn show_exercise<W: Write>(out: &mut W, exercise: &Exercise, progress: SessionProgress) -> Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "[{}/{}] {}",
        progress.current, progress.total, exercise.question_text
    )?;
    Ok(())
}

fn report<W: Write>(out: &mut W, result: &AnswerResult) -> Result<()> {
    if result.is_correct {
        if result.stars_earned > 0 {
            writeln!(out, "✅ {} (+{} ⭐)", result.feedback.message, result.stars_earned)?;
        } else {
            writeln!(out, "✅ {}", result.feedback.message)?;
        }
    } else {
        writeln!(out, "❌ {}", result.feedback.message)?;
        if let Some(hint) = &result.hint {
            writeln!(out, "💡 {}", hint.text)?;
        }
    }

    if result.progress.level_up {
        writeln!(out, "🎉 Tu passes au niveau {} !", result.progress.new_level)?;
    }

    for badge in &result.new_badges {
        writeln!(out, "🏅 Nouveau badge : {} {}", badge.icon, badge.name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::generate::{GenerateCommand, GenerateOptions};
    use crate::french;
    use crate::progress::ChildProfiles;
    use crate::storage::MemoryStore;
    use std::io::Cursor;

    const SEED: u64 = 11;

    fn setup() -> (Arc<MemoryStore>, PlayCommand<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let cmd = PlayCommand::new(Arc::clone(&store), Config::default());
        (store, cmd)
    }

    fn options(count: u32) -> PlayOptions {
        PlayOptions {
            count: Some(count),
            difficulty: Some(1),
            seed: Some(SEED),
            ..Default::default()
        }
    }

    /// Answers of the exercises a session with `options` will show, as long
    /// as every one is answered correctly.
    fn expected_answers(options: &PlayOptions) -> Vec<u32> {
        let output = GenerateCommand::new().run(&GenerateOptions {
            domain: options.domain,
            difficulty: options.difficulty.unwrap_or(1),
            phase: options.phase,
            count: options.count.unwrap_or(1),
            seed: options.seed,
            ..Default::default()
        });
        output.exercises.iter().map(|e| e.answer).collect()
    }

    /// Same digit count as `answer`, different value.
    fn wrong(answer: u32) -> String {
        let text = answer.to_string();
        let first = if text.starts_with('9') { '8' } else { '9' };
        let rest: String = text.chars().skip(1).collect();
        let guess = format!("{}{}", first, rest);
        if guess == text {
            "1".repeat(text.len())
        } else {
            guess
        }
    }

    fn play(cmd: &PlayCommand<MemoryStore>, options: &PlayOptions, input: &str) -> (PlayOutput, String) {
        let mut out = Vec::new();
        let output = cmd.run("lea", options, Cursor::new(input.to_string()), &mut out);
        (output, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_all_correct_session() {
        let (store, cmd) = setup();
        let options = options(3);
        let input: String = expected_answers(&options)
            .iter()
            .map(|a| format!("{}\n", a))
            .collect();

        let (output, transcript) = play(&cmd, &options, &input);
        assert!(output.success, "{:?}", output.error);
        let summary = output.summary.unwrap();
        assert_eq!(summary.total_exercises, 3);
        assert_eq!(summary.correct_answers, 3);
        assert_eq!(summary.stars_earned, 3);
        assert!(transcript.contains("Bonjour lea !"));
        assert!(transcript.contains("[3/3]"));
        assert_eq!(transcript.matches("✅").count(), 3);

        // Profile registered on first play and credited
        let profiles = StoredChildProfiles::new(store);
        assert_eq!(profiles.stars("lea"), 3);
    }

    #[test]
    fn test_wrong_answers_escalate_to_hint() {
        let (_, cmd) = setup();
        let options = options(2);
        let first = expected_answers(&options)[0];
        let input = format!("{}\n{}\nfin\n", wrong(first), wrong(first));

        let (output, transcript) = play(&cmd, &options, &input);
        let summary = output.summary.unwrap();
        assert_eq!(summary.total_exercises, 2);
        assert_eq!(summary.incorrect_answers, 2);
        assert_eq!(transcript.matches("❌").count(), 2);
        // Second mistake reaches the default threshold
        assert_eq!(transcript.matches("💡").count(), 1);
        // Same exercise stays on screen
        assert!(!transcript.contains("[2/2]"));
    }

    #[test]
    fn test_french_words_answer() {
        let (_, cmd) = setup();
        let options = options(1);
        let answer = expected_answers(&options)[0];
        let words = french::format(answer).unwrap();

        let (output, transcript) = play(&cmd, &options, &format!("{}\n", words));
        assert_eq!(output.summary.unwrap().correct_answers, 1);
        assert!(transcript.contains("✅"));
    }

    #[test]
    fn test_commands_and_unrecognized_input() {
        let (_, cmd) = setup();
        let options = options(2);
        let (output, transcript) = play(&cmd, &options, "?\nbanane\npasse\npasse\n");

        assert!(output.success);
        let summary = output.summary.unwrap();
        assert_eq!(summary.total_exercises, 0);
        assert!(transcript.contains("💡"));
        assert!(transcript.contains("Je n'ai pas compris"));
        assert!(transcript.contains("[2/2]"));
    }

    #[test]
    fn test_end_of_input_closes_session() {
        let (store, cmd) = setup();
        let (output, _) = play(&cmd, &options(5), "");
        assert!(output.success);
        let summary = output.summary.unwrap();
        assert_eq!(summary.total_exercises, 0);
        assert!(summary.session.is_some());

        let history = crate::progress::SessionService::new(
            store,
            Config::default().rewards,
            Config::default().session,
        )
        .history("lea");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_level_up_reported_on_a_wrong_answer() {
        let store = Arc::new(MemoryStore::new());
        let mut engine = ExerciseEngine::new(store, Config::default()).with_seed(SEED);
        let mut exercise = engine
            .start_session(
                "lea",
                Domain::Calcul,
                SessionOptions {
                    exercise_count: 20,
                    phase: Phase::Abstract,
                    difficulty: Some(1),
                },
            )
            .unwrap();
        for _ in 0..9 {
            engine.submit_answer(exercise.answer).unwrap();
            if let NextStep::Exercise(next) = engine.next_exercise().unwrap() {
                exercise = *next;
            }
        }
        let result = engine.submit_answer(exercise.answer + 50).unwrap();
        assert!(!result.is_correct);

        let mut out = Vec::new();
        report(&mut out, &result).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("❌"));
        assert!(text.contains("Tu passes au niveau 2"));
    }

    #[test]
    fn test_invalid_child_name_fails() {
        let (_, cmd) = setup();
        let mut out = Vec::new();
        let output = cmd.run(
            "a-child-id-that-is-far-too-long",
            &options(1),
            Cursor::new(String::new()),
            &mut out,
        );
        assert!(!output.success);
        assert!(output.summary.is_none());
    }

    #[test]
    fn test_format_output() {
        let (_, cmd) = setup();
        let options = options(1);
        let answer = expected_answers(&options)[0];
        let (output, _) = play(&cmd, &options, &format!("{}\n", answer));

        let text = cmd.format_output(&output, &options);
        assert!(text.contains("Séance terminée"));
        assert!(text.contains("Réussis : 1/1 (100%)"));

        let json_options = PlayOptions {
            json: true,
            ..options.clone()
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&cmd.format_output(&output, &json_options)).unwrap();
        assert_eq!(parsed["summary"]["correctAnswers"], 1);

        let quiet = PlayOptions {
            quiet: true,
            ..options
        };
        assert!(cmd.format_output(&output, &quiet).is_empty());
    }
}
