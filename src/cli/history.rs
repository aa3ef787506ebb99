//! History command: a child's archived play sessions.

use std::sync::Arc;

use chrono::Local;
use serde::Serialize;

use crate::config::Config;
use crate::progress::{SessionHistoryEntry, SessionService, StoredChildProfiles};
use crate::storage::KeyValueStore;

/// Options for the history command.
#[derive(Debug, Clone, Default)]
pub struct HistoryOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Show at most this many sessions.
    pub limit: Option<usize>,
}

/// Output format for the history command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryOutput {
    pub success: bool,
    pub child_id: String,
    /// Newest first.
    pub sessions: Vec<SessionHistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HistoryOutput {
    /// Create a successful output.
    pub fn success(child_id: &str, sessions: Vec<SessionHistoryEntry>) -> Self {
        Self {
            success: true,
            child_id: child_id.to_string(),
            sessions,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(child_id: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            child_id: child_id.to_string(),
            sessions: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The history command implementation.
pub struct HistoryCommand<S: KeyValueStore> {
    profiles: StoredChildProfiles<Arc<S>>,
    sessions: SessionService<Arc<S>>,
}

impl<S: KeyValueStore> HistoryCommand<S> {
    /// Create a new history command.
    pub fn new(store: Arc<S>, config: Config) -> Self {
        Self {
            profiles: StoredChildProfiles::new(Arc::clone(&store)),
            sessions: SessionService::new(store, config.rewards, config.session),
        }
    }

    /// Run the history command for one child.
    pub fn run(&self, child_id: &str, options: &HistoryOptions) -> HistoryOutput {
        if self.profiles.get(child_id).is_none() {
            return HistoryOutput::failure(child_id, format!("no child named '{}'", child_id));
        }

        let mut sessions = self.sessions.history(child_id);
        sessions.reverse();
        if let Some(limit) = options.limit {
            sessions.truncate(limit);
        }
        HistoryOutput::success(child_id, sessions)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &HistoryOutput, options: &HistoryOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &HistoryOutput) -> String {
        if !output.success {
            return format!(
                "History failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if output.sessions.is_empty() {
            return "Aucune séance pour l'instant.\n".to_string();
        }

        let mut lines = Vec::new();
        for entry in &output.sessions {
            lines.push(format!(
                "{}  {} {:<12} {}/{} réussis  ⭐ {}  série {}  ({})",
                entry
                    .started_at
                    .with_timezone(&Local)
                    .format("%d/%m/%Y %H:%M"),
                entry.domain.icon(),
                entry.domain.display_name(),
                entry.correct_answers,
                entry.total_exercises,
                entry.stars_earned,
                entry.best_streak,
                format_duration(entry.duration)
            ));
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

/// `95` -> `1 min 35 s`.
fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    if seconds < 60 {
        format!("{} s", seconds)
    } else {
        format!("{} min {:02} s", seconds / 60, seconds % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Domain;
    use crate::progress::ExerciseOutcome;
    use crate::storage::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, HistoryCommand<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        StoredChildProfiles::new(Arc::clone(&store))
            .register("lea", "Léa")
            .unwrap();
        let cmd = HistoryCommand::new(Arc::clone(&store), Config::default());
        (store, cmd)
    }

    fn play(store: &Arc<MemoryStore>, domain: Domain, correct: u32) {
        let config = Config::default();
        let mut sessions = SessionService::new(Arc::clone(store), config.rewards, config.session);
        sessions.start_session("lea", domain);
        for i in 0..correct {
            sessions.record_exercise(ExerciseOutcome {
                exercise_id: format!("ex_{}", i),
                is_correct: true,
                response_time_ms: 1000,
                hints_used: 0,
                answer: 1,
                expected: 1,
            });
        }
        sessions.end_session();
    }

    #[test]
    fn test_unknown_child() {
        let (_, cmd) = setup();
        assert!(!cmd.run("ghost", &HistoryOptions::default()).success);
    }

    #[test]
    fn test_newest_first_with_limit() {
        let (store, cmd) = setup();
        play(&store, Domain::Calcul, 1);
        play(&store, Domain::Mesures, 2);
        play(&store, Domain::Geometrie, 3);

        let output = cmd.run("lea", &HistoryOptions::default());
        assert_eq!(output.sessions.len(), 3);
        assert_eq!(output.sessions[0].domain, Domain::Geometrie);
        assert_eq!(output.sessions[2].domain, Domain::Calcul);

        let limited = cmd.run(
            "lea",
            &HistoryOptions {
                limit: Some(1),
                ..Default::default()
            },
        );
        assert_eq!(limited.sessions.len(), 1);
        assert_eq!(limited.sessions[0].correct_answers, 3);
    }

    #[test]
    fn test_empty_history_text() {
        let (_, cmd) = setup();
        let output = cmd.run("lea", &HistoryOptions::default());
        assert!(output.success);
        let text = cmd.format_output(&output, &HistoryOptions::default());
        assert!(text.contains("Aucune séance"));
    }

    #[test]
    fn test_human_readable_rows() {
        let (store, cmd) = setup();
        play(&store, Domain::Calcul, 2);
        let output = cmd.run("lea", &HistoryOptions::default());
        let text = cmd.format_output(&output, &HistoryOptions::default());
        assert!(text.contains("Calcul"));
        assert!(text.contains("2/2 réussis"));
    }

    #[test]
    fn test_json_output() {
        let (store, cmd) = setup();
        play(&store, Domain::Calcul, 1);
        let options = HistoryOptions {
            json: true,
            ..Default::default()
        };
        let output = cmd.run("lea", &options);
        let parsed: serde_json::Value =
            serde_json::from_str(&cmd.format_output(&output, &options)).unwrap();
        assert_eq!(parsed["sessions"][0]["domain"], "calcul");
        assert_eq!(parsed["sessions"][0]["totalExercises"], 1);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42), "42 s");
        assert_eq!(format_duration(95), "1 min 35 s");
        assert_eq!(format_duration(-3), "0 s");
    }
}
