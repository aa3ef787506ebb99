//! Exercise engine for mathce1.
//!
//! The engine owns one play session at a time and wires the pieces
//! together: it asks the generator registry for exercises, grades answers
//! (typed, spoken or given directly), feeds the outcome to the session,
//! progression and badge services, credits stars to the child profile, and
//! escalates hints on repeated mistakes.
//!
//! Every service shares the same backing store through an `Arc<S>`.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, Timelike, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::Config;
use crate::core::{clamp_difficulty, feedback, Domain, Exercise, Feedback, Phase};
use crate::error::{MathError, Result};
use crate::french;
use crate::generators::{ExerciseRequest, GeneratorRegistry};
use crate::hints::{HintSystem, IssuedHint};
use crate::progress::{
    consecutive_days, Badge, BadgeService, BadgeStats, ChildProfiles, ExerciseOutcome,
    ProgressResult, ProgressionService, Session, SessionService, StoredChildProfiles,
};
use crate::storage::KeyValueStore;
use crate::validator::{AnswerValidator, KeyInput, TimeoutEvent, ValidatorOptions};

/// Played before this local hour counts as a morning session.
const MORNING_END_HOUR: u32 = 9;

/// Per-session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub exercise_count: u32,
    pub phase: Phase,
    /// Fixed difficulty; `None` uses the child's level in the domain.
    pub difficulty: Option<u8>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            exercise_count: 5,
            phase: Phase::Abstract,
            difficulty: None,
        }
    }
}

impl SessionOptions {
    /// Defaults with the configured exercise count.
    pub fn from_config(config: &Config) -> Self {
        Self {
            exercise_count: config.session.default_exercise_count,
            ..Self::default()
        }
    }
}

/// One graded answer within the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredExercise {
    pub exercise: Exercise,
    pub user_answer: u32,
    pub is_correct: bool,
    pub response_time_ms: u64,
}

/// Everything that follows from one answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub is_correct: bool,
    pub correct_answer: u32,
    pub user_answer: u32,
    pub exercise: Exercise,
    pub feedback: Feedback,
    pub progress: ProgressResult,
    pub new_badges: Vec<&'static Badge>,
    /// Set on a wrong answer once the error threshold is reached.
    pub hint: Option<IssuedHint>,
    pub stars_earned: u32,
}

/// Outcome of a key press.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyOutcome {
    pub input: KeyInput,
    /// Present when the key completed the answer.
    pub result: Option<AnswerResult>,
}

/// Outcome of a spoken answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SpokenAnswer {
    /// No number could be read from the transcript; ask again.
    Unrecognized { transcript: String },
    Answered(Box<AnswerResult>),
}

/// What comes after the current exercise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "next", rename_all = "camelCase")]
pub enum NextStep {
    Exercise(Box<Exercise>),
    Complete(Box<SessionSummary>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub current: u32,
    pub total: u32,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub domain: Domain,
    pub total_exercises: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    pub success_rate: u32,
    pub stars_earned: u32,
    pub best_streak: u32,
    pub exercises: Vec<AnsweredExercise>,
    pub session: Option<Session>,
}

type Slot<T> = Option<Box<dyn FnMut(&T)>>;

/// Single-listener event hooks.
#[derive(Default)]
struct Hooks {
    exercise_loaded: Slot<Exercise>,
    correct_answer: Slot<AnswerResult>,
    incorrect_answer: Slot<AnswerResult>,
    level_up: Slot<ProgressResult>,
    badge_earned: Slot<Badge>,
    session_complete: Slot<SessionSummary>,
}

fn emit<T: ?Sized>(slot: &mut Option<Box<dyn FnMut(&T)>>, value: &T) {
    if let Some(f) = slot.as_mut() {
        f(value);
    }
}

/// State of the running session.
struct ActiveSession {
    child_id: String,
    domain: Domain,
    phase: Phase,
    difficulty: u8,
    target: u32,
    loaded: u32,
    current: Option<Exercise>,
    shown_at: Instant,
    answered: Vec<AnsweredExercise>,
}

/// Session orchestrator.
pub struct ExerciseEngine<S: KeyValueStore + 'static> {
    config: Config,
    generators: GeneratorRegistry,
    progression: ProgressionService<Arc<S>>,
    sessions: SessionService<Arc<S>>,
    badges: BadgeService<Arc<S>>,
    profiles: Box<dyn ChildProfiles>,
    hints: HintSystem,
    validator: AnswerValidator,
    rng: StdRng,
    active: Option<ActiveSession>,
    hooks: Hooks,
}

impl<S: KeyValueStore + 'static> ExerciseEngine<S> {
    /// Engine over `store`, with profiles kept in the same store.
    pub fn new(store: Arc<S>, config: Config) -> Self {
        Self {
            generators: GeneratorRegistry::with_defaults(),
            progression: ProgressionService::new(Arc::clone(&store), config.progression.clone()),
            sessions: SessionService::new(
                Arc::clone(&store),
                config.rewards.clone(),
                config.session.clone(),
            ),
            badges: BadgeService::new(Arc::clone(&store)),
            profiles: Box::new(StoredChildProfiles::new(store)),
            hints: HintSystem::from(&config.hints),
            validator: AnswerValidator::new(ValidatorOptions::from(&config.input)),
            rng: StdRng::from_entropy(),
            active: None,
            hooks: Hooks::default(),
            config,
        }
    }

    /// Use a fixed RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Replace the child profile collaborator.
    pub fn with_profiles(mut self, profiles: Box<dyn ChildProfiles>) -> Self {
        self.profiles = profiles;
        self
    }

    /// Replace the generator registry.
    pub fn with_generators(mut self, generators: GeneratorRegistry) -> Self {
        self.generators = generators;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn progression(&self) -> &ProgressionService<Arc<S>> {
        &self.progression
    }

    pub fn sessions(&self) -> &SessionService<Arc<S>> {
        &self.sessions
    }

    pub fn badges(&self) -> &BadgeService<Arc<S>> {
        &self.badges
    }

    /// The validator, for wiring its keyboard callbacks.
    pub fn validator_mut(&mut self) -> &mut AnswerValidator {
        &mut self.validator
    }

    // =========================================================================
    // Event hooks
    // =========================================================================

    pub fn on_exercise_loaded(&mut self, f: impl FnMut(&Exercise) + 'static) {
        self.hooks.exercise_loaded = Some(Box::new(f));
    }

    pub fn on_correct_answer(&mut self, f: impl FnMut(&AnswerResult) + 'static) {
        self.hooks.correct_answer = Some(Box::new(f));
    }

    pub fn on_incorrect_answer(&mut self, f: impl FnMut(&AnswerResult) + 'static) {
        self.hooks.incorrect_answer = Some(Box::new(f));
    }

    pub fn on_level_up(&mut self, f: impl FnMut(&ProgressResult) + 'static) {
        self.hooks.level_up = Some(Box::new(f));
    }

    pub fn on_badge_earned(&mut self, f: impl FnMut(&Badge) + 'static) {
        self.hooks.badge_earned = Some(Box::new(f));
    }

    pub fn on_session_complete(&mut self, f: impl FnMut(&SessionSummary) + 'static) {
        self.hooks.session_complete = Some(Box::new(f));
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Start a session and load its first exercise.
    ///
    /// A session still running is abandoned without a summary.
    pub fn start_session(
        &mut self,
        child_id: &str,
        domain: Domain,
        options: SessionOptions,
    ) -> Result<Exercise> {
        if self.active.is_some() {
            tracing::warn!("starting a session while another is running");
        }

        let difficulty = match options.difficulty {
            Some(d) => clamp_difficulty(d),
            None => self.progression.level(child_id, domain),
        };
        let target = options.exercise_count.max(1);

        self.sessions.start_session(child_id, domain);
        self.hints.reset();
        self.active = Some(ActiveSession {
            child_id: child_id.to_string(),
            domain,
            phase: options.phase,
            difficulty,
            target,
            loaded: 0,
            current: None,
            shown_at: Instant::now(),
            answered: Vec::new(),
        });
        tracing::debug!(child_id, %domain, difficulty, target, "engine session started");

        match self.load_next()? {
            NextStep::Exercise(exercise) => Ok(*exercise),
            // target is at least 1, so the first load always yields an exercise
            NextStep::Complete(_) => Err(MathError::NoActiveSession),
        }
    }

    fn load_next(&mut self) -> Result<NextStep> {
        let active = self.active.as_mut().ok_or(MathError::NoActiveSession)?;
        if active.loaded >= active.target {
            return self.end_session().map(|s| NextStep::Complete(Box::new(s)));
        }

        let request = ExerciseRequest::new(active.difficulty, active.phase);
        let exercise = self
            .generators
            .generate(active.domain, &request, &mut self.rng)?;

        self.hints.set_exercise(&exercise);
        self.validator.set_expected_answer(exercise.answer);
        active.loaded += 1;
        active.shown_at = Instant::now();
        active.current = Some(exercise.clone());

        emit(&mut self.hooks.exercise_loaded, &exercise);
        Ok(NextStep::Exercise(Box::new(exercise)))
    }

    /// Move on to the next exercise, or finish when the target is reached.
    pub fn next_exercise(&mut self) -> Result<NextStep> {
        self.load_next()
    }

    /// Abandon the current exercise and move on.
    pub fn skip_exercise(&mut self) -> Result<NextStep> {
        if let Some(exercise) = self.current_exercise() {
            tracing::debug!(id = %exercise.id, "exercise skipped");
        }
        self.load_next()
    }

    /// Finish the session and summarize it.
    pub fn end_session(&mut self) -> Result<SessionSummary> {
        let active = self.active.take().ok_or(MathError::NoActiveSession)?;
        let session = self.sessions.end_session();

        let total = active.answered.len() as u32;
        let correct = active.answered.iter().filter(|a| a.is_correct).count() as u32;
        let summary = SessionSummary {
            domain: active.domain,
            total_exercises: total,
            correct_answers: correct,
            incorrect_answers: total - correct,
            success_rate: crate::progress::percentage(correct, total),
            stars_earned: session.as_ref().map(|s| s.stars_earned).unwrap_or(0),
            best_streak: session.as_ref().map(|s| s.best_streak).unwrap_or(0),
            exercises: active.answered,
            session,
        };

        self.hints.reset();
        self.validator.reset();
        emit(&mut self.hooks.session_complete, &summary);
        tracing::debug!(
            domain = %summary.domain,
            correct = summary.correct_answers,
            total = summary.total_exercises,
            "engine session complete"
        );
        Ok(summary)
    }

    // =========================================================================
    // Answers
    // =========================================================================

    /// Grade `answer` against the current exercise and record the outcome.
    pub fn submit_answer(&mut self, answer: u32) -> Result<AnswerResult> {
        let active = self.active.as_mut().ok_or(MathError::NoActiveSession)?;
        let exercise = active.current.clone().ok_or(MathError::NoActiveSession)?;
        let child_id = active.child_id.clone();
        let domain = active.domain;
        let phase = active.phase;

        let is_correct = exercise.is_correct(answer);
        let response_time_ms = active.shown_at.elapsed().as_millis() as u64;
        active.answered.push(AnsweredExercise {
            exercise: exercise.clone(),
            user_answer: answer,
            is_correct,
            response_time_ms,
        });

        let stars_earned = self
            .sessions
            .record_exercise(ExerciseOutcome {
                exercise_id: exercise.id.clone(),
                is_correct,
                response_time_ms,
                hints_used: self.hints.hints_given(),
                answer,
                expected: exercise.answer,
            })
            .unwrap_or(0);
        if stars_earned > 0 {
            self.profiles.add_stars(&child_id, stars_earned);
        }

        let progress = self
            .progression
            .update_progression(&child_id, domain, is_correct, phase);
        self.progression
            .update_streak(&child_id, domain, self.sessions.streak());

        let stats = self.badge_stats(&child_id);
        let new_badges = self.badges.check_and_award(&child_id, &stats);

        let mut result = AnswerResult {
            is_correct,
            correct_answer: exercise.answer,
            user_answer: answer,
            feedback: feedback(&exercise, answer),
            exercise,
            progress,
            new_badges,
            hint: None,
            stars_earned,
        };

        if is_correct {
            self.hints.record_success();
            emit(&mut self.hooks.correct_answer, &result);
        } else {
            result.hint = self.hints.record_error();
            emit(&mut self.hooks.incorrect_answer, &result);
        }

        // The mastery batch can close on a miss (9/10 still passes)
        if result.progress.level_up {
            if let Some(active) = self.active.as_mut() {
                active.difficulty = result.progress.new_level;
            }
            emit(&mut self.hooks.level_up, &result.progress);
        }

        for badge in &result.new_badges {
            emit(&mut self.hooks.badge_earned, *badge);
        }
        Ok(result)
    }

    /// Type one digit. Completing the answer grades it.
    ///
    /// `Ok(None)` means the key was ignored (not a digit).
    pub fn press_digit(&mut self, digit: char) -> Result<Option<KeyOutcome>> {
        self.require_exercise()?;
        let Some(input) = self.validator.add_digit(digit) else {
            return Ok(None);
        };
        self.finish_key_input(input).map(Some)
    }

    /// Grade typed digits now (for when auto-validation is off).
    pub fn submit_typed(&mut self) -> Result<Option<KeyOutcome>> {
        self.require_exercise()?;
        match self.validator.submit() {
            Some(input) => self.finish_key_input(input).map(Some),
            None => Ok(None),
        }
    }

    fn finish_key_input(&mut self, input: KeyInput) -> Result<KeyOutcome> {
        let result = if input.complete {
            let answer = input.value.parse::<u32>().unwrap_or(u32::MAX);
            Some(self.submit_answer(answer)?)
        } else {
            None
        };
        Ok(KeyOutcome { input, result })
    }

    /// Erase the last typed digit.
    pub fn remove_digit(&mut self) -> bool {
        self.validator.remove_digit()
    }

    /// Digits typed so far.
    pub fn typed_input(&self) -> &str {
        self.validator.current_input()
    }

    /// Forward the partial-input timeout check.
    pub fn poll_input_timeout(&mut self, now: Instant) -> Option<TimeoutEvent> {
        self.validator.poll_timeout(now)
    }

    /// Answer from a speech transcript, with optional recognizer alternatives.
    pub fn submit_spoken(&mut self, transcript: &str, alternatives: &[&str]) -> Result<SpokenAnswer> {
        self.require_exercise()?;
        let Some(number) = french::parse_best(transcript, alternatives) else {
            tracing::debug!(transcript, "no number recognized in speech");
            return Ok(SpokenAnswer::Unrecognized {
                transcript: transcript.to_string(),
            });
        };
        // Graded again below; this call only drives the validator's callbacks
        self.validator.validate_voice(number);
        let result = self.submit_answer(number)?;
        Ok(SpokenAnswer::Answered(Box::new(result)))
    }

    /// Next hint for the current exercise, whatever the error count.
    pub fn get_hint(&mut self) -> IssuedHint {
        self.hints.request_hint()
    }

    fn require_exercise(&self) -> Result<()> {
        match self.active.as_ref().and_then(|a| a.current.as_ref()) {
            Some(_) => Ok(()),
            None => Err(MathError::NoActiveSession),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.active.as_ref().and_then(|a| a.current.as_ref())
    }

    pub fn is_session_active(&self) -> bool {
        self.active.is_some() && self.sessions.is_active()
    }

    /// Exercises loaded so far over the session target.
    pub fn progress(&self) -> SessionProgress {
        match &self.active {
            Some(active) => SessionProgress {
                current: active.loaded,
                total: active.target,
                percentage: crate::progress::percentage(active.loaded, active.target),
            },
            None => SessionProgress {
                current: 0,
                total: 0,
                percentage: 0,
            },
        }
    }

    /// Difficulty exercises are currently generated at.
    pub fn difficulty(&self) -> Option<u8> {
        self.active.as_ref().map(|a| a.difficulty)
    }

    pub fn available_domains(&self) -> Vec<Domain> {
        self.generators.domains()
    }

    /// Whether the session has run past the configured duration.
    pub fn time_limit_reached(&self) -> bool {
        self.sessions.time_limit_reached(Utc::now())
    }

    /// Aggregates for badge rules.
    pub fn badge_stats(&self, child_id: &str) -> BadgeStats {
        let progression = self.progression.get_progression(child_id);
        let overall = self.progression.overall_stats(child_id);
        let session = self.sessions.current().filter(|s| s.child_id == child_id);

        let today = Local::now().date_naive();
        let mut days: Vec<_> = self
            .sessions
            .history(child_id)
            .iter()
            .map(|h| h.started_at.with_timezone(&Local).date_naive())
            .collect();
        if let Some(s) = session {
            days.push(s.started_at.with_timezone(&Local).date_naive());
        }

        BadgeStats {
            stars: self.profiles.stars(child_id),
            total_correct: overall.total_correct,
            best_streak: overall
                .best_streak
                .max(session.map(|s| s.best_streak).unwrap_or(0)),
            max_level: progression.max_level(),
            domain_correct: progression
                .domains
                .iter()
                .map(|(d, p)| (*d, p.total_correct))
                .collect(),
            consecutive_days: consecutive_days(days, today),
            morning_play: session
                .is_some_and(|s| s.started_at.with_timezone(&Local).hour() < MORNING_END_HOUR),
        }
    }
}
