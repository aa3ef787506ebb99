//! Stats command: a child's mastery levels and success rates.

use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::core::Domain;
use crate::progress::{DomainStats, OverallStats, ProgressionService, StoredChildProfiles};
use crate::storage::KeyValueStore;

/// Options for the stats command.
#[derive(Debug, Clone, Default)]
pub struct StatsOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Only show this domain.
    pub domain: Option<Domain>,
}

/// Output format for the stats command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOutput {
    pub success: bool,
    pub child_id: String,
    pub name: String,
    pub stars: u32,
    pub overall: OverallStats,
    pub domains: Vec<DomainStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatsOutput {
    /// Create a failed output.
    pub fn failure(child_id: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            child_id: child_id.to_string(),
            name: String::new(),
            stars: 0,
            overall: OverallStats::default(),
            domains: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The stats command implementation.
pub struct StatsCommand<S: KeyValueStore> {
    profiles: StoredChildProfiles<Arc<S>>,
    progression: ProgressionService<Arc<S>>,
}

impl<S: KeyValueStore> StatsCommand<S> {
    /// Create a new stats command.
    pub fn new(store: Arc<S>, config: Config) -> Self {
        Self {
            profiles: StoredChildProfiles::new(Arc::clone(&store)),
            progression: ProgressionService::new(store, config.progression),
        }
    }

    /// Run the stats command for one child.
    pub fn run(&self, child_id: &str, options: &StatsOptions) -> StatsOutput {
        let Some(profile) = self.profiles.get(child_id) else {
            return StatsOutput::failure(child_id, format!("no child named '{}'", child_id));
        };

        let domains = match options.domain {
            Some(domain) => vec![domain],
            None => Domain::all().to_vec(),
        };

        StatsOutput {
            success: true,
            child_id: profile.id,
            name: profile.name,
            stars: profile.stars,
            overall: self.progression.overall_stats(child_id),
            domains: domains
                .into_iter()
                .map(|d| self.progression.domain_stats(child_id, d))
                .collect(),
            error: None,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &StatsOutput, options: &StatsOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &StatsOutput) -> String {
        if !output.success {
            return format!(
                "Stats failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut lines = Vec::new();
        lines.push(format!("=== {} ===\n", output.name));
        lines.push(format!("⭐ {} étoiles", output.stars));
        lines.push(format!(
            "   Exercices : {} | Réussis : {} | Réussite : {}% | Meilleure série : {}\n",
            output.overall.total_exercises,
            output.overall.total_correct,
            output.overall.success_rate,
            output.overall.best_streak
        ));

        for stats in &output.domains {
            lines.push(format!(
                "{} {:<12} niveau {:>2}  réussite {:>3}%  vers le niveau suivant {:>3}%",
                stats.domain.icon(),
                stats.domain.display_name(),
                stats.progress.level,
                stats.success_rate,
                stats.progress_to_next_level
            ));
        }
        lines.push(String::new());

        lines.join("\n")
    }
}
