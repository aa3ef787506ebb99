//! Badges command: the badge catalog with a child's earned flags.

use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::progress::{BadgeCounts, BadgeService, BadgeStatus, StoredChildProfiles};
use crate::storage::KeyValueStore;

/// Options for the badges command.
#[derive(Debug, Clone, Default)]
pub struct BadgesOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Only list badges already earned.
    pub earned_only: bool,
}

/// Output format for the badges command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgesOutput {
    pub success: bool,
    pub child_id: String,
    pub counts: BadgeCounts,
    pub badges: Vec<BadgeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BadgesOutput {
    /// Create a successful output.
    pub fn success(child_id: &str, counts: BadgeCounts, badges: Vec<BadgeStatus>) -> Self {
        Self {
            success: true,
            child_id: child_id.to_string(),
            counts,
            badges,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(child_id: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            child_id: child_id.to_string(),
            counts: BadgeCounts {
                earned: 0,
                total: 0,
                percentage: 0,
            },
            badges: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The badges command implementation.
pub struct BadgesCommand<S: KeyValueStore> {
    profiles: StoredChildProfiles<Arc<S>>,
    badges: BadgeService<Arc<S>>,
}

impl<S: KeyValueStore> BadgesCommand<S> {
    /// Create a new badges command.
    pub fn new(store: Arc<S>, _config: Config) -> Self {
        Self {
            profiles: StoredChildProfiles::new(Arc::clone(&store)),
            badges: BadgeService::new(store),
        }
    }

    /// Run the badges command for one child.
    pub fn run(&self, child_id: &str, options: &BadgesOptions) -> BadgesOutput {
        if self.profiles.get(child_id).is_none() {
            return BadgesOutput::failure(child_id, format!("no child named '{}'", child_id));
        }

        let mut badges = self.badges.all_badges(child_id);
        if options.earned_only {
            badges.retain(|b| b.earned);
        }
        BadgesOutput::success(child_id, self.badges.badge_counts(child_id), badges)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &BadgesOutput, options: &BadgesOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &BadgesOutput) -> String {
        if !output.success {
            return format!(
                "Badges failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut lines = vec![format!(
            "🏅 {}/{} badges ({}%)\n",
            output.counts.earned, output.counts.total, output.counts.percentage
        )];
        for status in &output.badges {
            let mark = if status.earned { "x" } else { " " };
            lines.push(format!(
                "[{}] {} {} : {}",
                mark, status.badge.icon, status.badge.name, status.badge.description
            ));
        }
        lines.push(String::new());
        lines.join("\n")
    }
}
