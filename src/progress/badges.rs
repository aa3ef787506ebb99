//! Badge catalog and awarding.
//!
//! Badges are pure rules over a [`BadgeStats`] snapshot. Earned badge ids are
//! kept per child under the `badges` key; a badge is awarded at most once.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::core::Domain;
use crate::progress::percentage;
use crate::storage::{keys, JsonStorage, KeyValueStore};

/// Aggregates the rules are evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeStats {
    pub stars: u32,
    pub total_correct: u32,
    pub best_streak: u32,
    pub max_level: u8,
    /// Correct answers per domain.
    pub domain_correct: BTreeMap<Domain, u32>,
    /// Consecutive calendar days played, ending today.
    pub consecutive_days: u32,
    /// Played before 9 a.m. local time.
    pub morning_play: bool,
}

/// Condition a badge tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum BadgeRule {
    TotalCorrect(u32),
    Stars(u32),
    BestStreak(u32),
    MaxLevel(u8),
    DomainCorrect(Domain, u32),
    ConsecutiveDays(u32),
    MorningPlay,
}

impl BadgeRule {
    pub fn check(&self, stats: &BadgeStats) -> bool {
        match *self {
            BadgeRule::TotalCorrect(n) => stats.total_correct >= n,
            BadgeRule::Stars(n) => stats.stars >= n,
            BadgeRule::BestStreak(n) => stats.best_streak >= n,
            BadgeRule::MaxLevel(n) => stats.max_level >= n,
            BadgeRule::DomainCorrect(domain, n) => {
                stats.domain_correct.get(&domain).copied().unwrap_or(0) >= n
            }
            BadgeRule::ConsecutiveDays(n) => stats.consecutive_days >= n,
            BadgeRule::MorningPlay => stats.morning_play,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub rule: BadgeRule,
}

/// The full catalog, in display order.
pub const BADGES: &[Badge] = &[
    Badge {
        id: "first_exercise",
        name: "Premier Pas",
        description: "Réussir ton premier exercice",
        icon: "🎯",
        rule: BadgeRule::TotalCorrect(1),
    },
    Badge {
        id: "star_10",
        name: "Collectionneur",
        description: "Gagner 10 étoiles",
        icon: "⭐",
        rule: BadgeRule::Stars(10),
    },
    Badge {
        id: "star_50",
        name: "Super Star",
        description: "Gagner 50 étoiles",
        icon: "🌟",
        rule: BadgeRule::Stars(50),
    },
    Badge {
        id: "star_100",
        name: "Légende",
        description: "Gagner 100 étoiles",
        icon: "✨",
        rule: BadgeRule::Stars(100),
    },
    Badge {
        id: "streak_5",
        name: "En feu !",
        description: "Faire une série de 5 bonnes réponses",
        icon: "🔥",
        rule: BadgeRule::BestStreak(5),
    },
    Badge {
        id: "streak_10",
        name: "Inarrêtable",
        description: "Faire une série de 10 bonnes réponses",
        icon: "💫",
        rule: BadgeRule::BestStreak(10),
    },
    Badge {
        id: "streak_20",
        name: "Champion",
        description: "Faire une série de 20 bonnes réponses",
        icon: "🏆",
        rule: BadgeRule::BestStreak(20),
    },
    Badge {
        id: "level_up",
        name: "Progression",
        description: "Monter d'un niveau",
        icon: "📈",
        rule: BadgeRule::MaxLevel(2),
    },
    Badge {
        id: "level_5",
        name: "Expert",
        description: "Atteindre le niveau 5",
        icon: "🧠",
        rule: BadgeRule::MaxLevel(5),
    },
    Badge {
        id: "calcul_master",
        name: "As du Calcul",
        description: "Réussir 50 exercices de calcul",
        icon: "➕",
        rule: BadgeRule::DomainCorrect(Domain::Calcul, 50),
    },
    Badge {
        id: "numeration_master",
        name: "Expert Nombres",
        description: "Réussir 50 exercices de numération",
        icon: "🔢",
        rule: BadgeRule::DomainCorrect(Domain::Numeration, 50),
    },
    Badge {
        id: "daily_player",
        name: "Assidu",
        description: "Jouer 3 jours consécutifs",
        icon: "📅",
        rule: BadgeRule::ConsecutiveDays(3),
    },
    Badge {
        id: "morning_star",
        name: "Lève-tôt",
        description: "Jouer avant 9h",
        icon: "🌅",
        rule: BadgeRule::MorningPlay,
    },
];

/// Look a badge up by id.
pub fn find_badge(id: &str) -> Option<&'static Badge> {
    BADGES.iter().find(|b| b.id == id)
}

/// Count the run of consecutive days ending at `today`.
///
/// Returns 0 if `today` itself was not played.
pub fn consecutive_days(played: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = played.into_iter().collect();
    let mut count = 0;
    let mut day = today;
    while days.contains(&day) {
        count += 1;
        day -= Duration::days(1);
    }
    count
}

/// A catalog entry with the child's earned flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BadgeStatus {
    #[serde(flatten)]
    pub badge: &'static Badge,
    pub earned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeCounts {
    pub earned: usize,
    pub total: usize,
    pub percentage: u32,
}

type BadgeMap = HashMap<String, Vec<String>>;

pub struct BadgeService<S: KeyValueStore> {
    storage: JsonStorage<S>,
}

impl<S: KeyValueStore> BadgeService<S> {
    pub fn new(store: S) -> Self {
        Self {
            storage: JsonStorage::new(store),
        }
    }

    fn load_all(&self) -> BadgeMap {
        self.storage.get(keys::BADGES, BadgeMap::new())
    }

    fn save(&self, child_id: &str, earned: Vec<String>) -> bool {
        let mut all = self.load_all();
        all.insert(child_id.to_string(), earned);
        self.storage.set(keys::BADGES, &all)
    }

    /// Earned badge ids, in the order they were earned.
    pub fn earned_badges(&self, child_id: &str) -> Vec<String> {
        self.load_all().remove(child_id).unwrap_or_default()
    }

    pub fn all_badges(&self, child_id: &str) -> Vec<BadgeStatus> {
        let earned = self.earned_badges(child_id);
        BADGES
            .iter()
            .map(|badge| BadgeStatus {
                badge,
                earned: earned.iter().any(|id| id == badge.id),
            })
            .collect()
    }

    /// Award every not-yet-earned badge whose rule passes. Returns the new ones.
    pub fn check_and_award(&self, child_id: &str, stats: &BadgeStats) -> Vec<&'static Badge> {
        let mut earned = self.earned_badges(child_id);
        let new: Vec<&'static Badge> = BADGES
            .iter()
            .filter(|b| !earned.iter().any(|id| id == b.id) && b.rule.check(stats))
            .collect();

        if !new.is_empty() {
            earned.extend(new.iter().map(|b| b.id.to_string()));
            self.save(child_id, earned);
            tracing::debug!(
                child_id,
                badges = ?new.iter().map(|b| b.id).collect::<Vec<_>>(),
                "badges awarded"
            );
        }
        new
    }

    /// Award one badge directly. `None` if already earned or not in the catalog.
    pub fn award_badge(&self, child_id: &str, badge_id: &str) -> Option<&'static Badge> {
        let Some(badge) = find_badge(badge_id) else {
            tracing::warn!(badge_id, "unknown badge");
            return None;
        };
        let mut earned = self.earned_badges(child_id);
        if earned.iter().any(|id| id == badge_id) {
            return None;
        }
        earned.push(badge_id.to_string());
        self.save(child_id, earned);
        Some(badge)
    }

    pub fn badge_counts(&self, child_id: &str) -> BadgeCounts {
        let earned = self.earned_badges(child_id).len();
        let total = BADGES.len();
        BadgeCounts {
            earned,
            total,
            percentage: percentage(earned as u32, total as u32),
        }
    }

    pub fn reset_badges(&self, child_id: &str) -> bool {
        self.save(child_id, Vec::new())
    }
}
