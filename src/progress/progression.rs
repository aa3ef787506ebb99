//! Per-child, per-domain mastery tracking.
//!
//! All children's records live in one blob under the `progressions` key:
//! load it, mutate one domain, write it back. A level is earned once at
//! least `exercises_to_advance` answers have been given in the current level
//! and at least `mastery_threshold` percent of them were correct. Both
//! in-level counters reset on level-up; nothing resets them otherwise, and
//! levels never go down.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ProgressionConfig;
use crate::core::{Domain, Phase, MIN_DIFFICULTY};
use crate::storage::{keys, JsonStorage, KeyValueStore};

/// Rounded percentage of `part` over `whole`; 0 when `whole` is 0.
pub fn percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let (part, whole) = (part as u64, whole as u64);
    ((part * 200 + whole) / (2 * whole)) as u32
}

/// Mastery state of one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomainProgress {
    pub level: u8,
    pub current_phase: Phase,
    pub exercises_in_level: u32,
    pub correct_in_level: u32,
    pub total_exercises: u32,
    pub total_correct: u32,
    pub streak_best: u32,
    pub last_played: Option<DateTime<Utc>>,
}

impl Default for DomainProgress {
    fn default() -> Self {
        Self {
            level: MIN_DIFFICULTY,
            current_phase: Phase::Concrete,
            exercises_in_level: 0,
            correct_in_level: 0,
            total_exercises: 0,
            total_correct: 0,
            streak_best: 0,
            last_played: None,
        }
    }
}

/// Whole-child record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progression {
    pub domains: BTreeMap<Domain, DomainProgress>,
    pub last_updated: DateTime<Utc>,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            domains: Domain::all()
                .iter()
                .map(|d| (*d, DomainProgress::default()))
                .collect(),
            last_updated: Utc::now(),
        }
    }
}

impl Progression {
    /// Progress for a domain, defaulting when the record predates it.
    pub fn domain(&self, domain: Domain) -> DomainProgress {
        self.domains.get(&domain).cloned().unwrap_or_default()
    }

    /// Highest level across domains.
    pub fn max_level(&self) -> u8 {
        self.domains
            .values()
            .map(|d| d.level)
            .max()
            .unwrap_or(MIN_DIFFICULTY)
    }
}

/// Outcome of [`ProgressionService::update_progression`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResult {
    pub level_up: bool,
    pub new_level: u8,
    pub progression: DomainProgress,
}

/// Read-side view of one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainStats {
    pub domain: Domain,
    #[serde(flatten)]
    pub progress: DomainProgress,
    pub success_rate: u32,
    pub progress_to_next_level: u32,
}

/// Read-side aggregate over all domains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub total_exercises: u32,
    pub total_correct: u32,
    pub success_rate: u32,
    pub domains_played: u32,
    pub best_streak: u32,
}

type ProgressionMap = HashMap<String, Progression>;

pub struct ProgressionService<S: KeyValueStore> {
    storage: JsonStorage<S>,
    config: ProgressionConfig,
}

impl<S: KeyValueStore> ProgressionService<S> {
    pub fn new(store: S, config: ProgressionConfig) -> Self {
        Self {
            storage: JsonStorage::new(store),
            config,
        }
    }

    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    fn load_all(&self) -> ProgressionMap {
        self.storage.get(keys::PROGRESSIONS, ProgressionMap::new())
    }

    fn save_all(&self, all: &ProgressionMap) -> bool {
        self.storage.set(keys::PROGRESSIONS, all)
    }

    /// The child's record, or a fresh one (not persisted) if none exists.
    pub fn get_progression(&self, child_id: &str) -> Progression {
        self.load_all().remove(child_id).unwrap_or_default()
    }

    /// Current level in a domain.
    pub fn level(&self, child_id: &str, domain: Domain) -> u8 {
        self.get_progression(child_id).domain(domain).level
    }

    /// Record one answer and evaluate level-up.
    ///
    /// `phase` overwrites the stored phase: it is whatever the session was
    /// played in, not something computed here.
    pub fn update_progression(
        &self,
        child_id: &str,
        domain: Domain,
        correct: bool,
        phase: Phase,
    ) -> ProgressResult {
        let mut all = self.load_all();
        let progression = all.entry(child_id.to_string()).or_default();
        let now = Utc::now();

        let progress = progression.domains.entry(domain).or_default();
        progress.total_exercises += 1;
        progress.exercises_in_level += 1;
        progress.last_played = Some(now);
        progress.current_phase = phase;
        if correct {
            progress.total_correct += 1;
            progress.correct_in_level += 1;
        }

        let level_up = check_level_up(&self.config, progress);
        if level_up {
            tracing::debug!(child_id, %domain, level = progress.level, "level up");
        }

        let result = ProgressResult {
            level_up,
            new_level: progress.level,
            progression: progress.clone(),
        };
        progression.last_updated = now;
        self.save_all(&all);
        result
    }

    /// Keep the best streak seen in a domain. Returns whether it improved.
    ///
    /// Does nothing for a child with no record yet.
    pub fn update_streak(&self, child_id: &str, domain: Domain, streak: u32) -> bool {
        let mut all = self.load_all();
        let Some(progress) = all
            .get_mut(child_id)
            .and_then(|p| p.domains.get_mut(&domain))
        else {
            return false;
        };
        if streak <= progress.streak_best {
            return false;
        }
        progress.streak_best = streak;
        self.save_all(&all)
    }

    /// Put a domain back to level 1 with zeroed counters.
    pub fn reset_domain(&self, child_id: &str, domain: Domain) -> bool {
        let mut all = self.load_all();
        let Some(progression) = all.get_mut(child_id) else {
            return false;
        };
        progression.domains.insert(domain, DomainProgress::default());
        progression.last_updated = Utc::now();
        tracing::debug!(child_id, %domain, "domain progression reset");
        self.save_all(&all)
    }

    pub fn domain_stats(&self, child_id: &str, domain: Domain) -> DomainStats {
        let progress = self.get_progression(child_id).domain(domain);
        let to_advance = self.config.exercises_to_advance.max(1);
        DomainStats {
            domain,
            success_rate: percentage(progress.total_correct, progress.total_exercises),
            progress_to_next_level: percentage(progress.exercises_in_level, to_advance).min(100),
            progress,
        }
    }

    pub fn overall_stats(&self, child_id: &str) -> OverallStats {
        let progression = self.get_progression(child_id);
        let mut stats = OverallStats::default();
        for progress in progression.domains.values() {
            stats.total_exercises += progress.total_exercises;
            stats.total_correct += progress.total_correct;
            if progress.total_exercises > 0 {
                stats.domains_played += 1;
            }
            stats.best_streak = stats.best_streak.max(progress.streak_best);
        }
        stats.success_rate = percentage(stats.total_correct, stats.total_exercises);
        stats
    }
}

/// Apply the mastery rule to one domain. Returns whether the level went up.
pub fn check_level_up(config: &ProgressionConfig, progress: &mut DomainProgress) -> bool {
    if progress.exercises_in_level < config.exercises_to_advance.max(1) {
        return false;
    }
    let mastered = u64::from(progress.correct_in_level) * 100
        >= u64::from(config.mastery_threshold) * u64::from(progress.exercises_in_level);
    if !mastered || progress.level >= config.max_level {
        return false;
    }
    progress.level += 1;
    progress.exercises_in_level = 0;
    progress.correct_in_level = 0;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn service() -> ProgressionService<MemoryStore> {
        ProgressionService::new(MemoryStore::new(), ProgressionConfig::default())
    }

    fn play(service: &ProgressionService<MemoryStore>, results: &[bool]) -> ProgressResult {
        let mut last = None;
        for &correct in results {
            last = Some(service.update_progression("lea", Domain::Calcul, correct, Phase::Abstract));
        }
        last.unwrap()
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(10, 10), 100);
    }

    #[test]
    fn test_fresh_progression_has_all_domains() {
        let p = service().get_progression("nobody");
        assert_eq!(p.domains.len(), 5);
        assert!(p.domains.values().all(|d| d.level == 1));
        assert_eq!(p.max_level(), 1);
    }

    #[test]
    fn test_eight_of_ten_levels_up() {
        let service = service();
        let mut results = vec![true; 8];
        results.extend([false, false]);
        let result = play(&service, &results);

        assert!(result.level_up);
        assert_eq!(result.new_level, 2);
        assert_eq!(result.progression.exercises_in_level, 0);
        assert_eq!(result.progression.correct_in_level, 0);
        assert_eq!(result.progression.total_exercises, 10);
        assert_eq!(service.level("lea", Domain::Calcul), 2);
    }

    #[test]
    fn test_seven_of_ten_stays() {
        let service = service();
        let mut results = vec![true; 7];
        results.extend([false, false, false]);
        let result = play(&service, &results);

        assert!(!result.level_up);
        assert_eq!(result.new_level, 1);
        assert_eq!(result.progression.exercises_in_level, 10);
    }

    #[test]
    fn test_counters_accumulate_after_missed_batch() {
        let service = service();
        let mut results = vec![false; 3];
        results.extend(vec![true; 7]);
        play(&service, &results);

        // 8/11 is still under 80%
        let result = play(&service, &[true]);
        assert!(!result.level_up);
        assert_eq!(result.progression.exercises_in_level, 11);

        // 12/15 reaches it
        let result = play(&service, &[true, true, true, true]);
        assert!(result.level_up);
    }

    #[test]
    fn test_no_level_up_before_batch_complete() {
        let service = service();
        let result = play(&service, &[true; 9]);
        assert!(!result.level_up);
    }

    #[test]
    fn test_level_capped() {
        let config = ProgressionConfig {
            max_level: 2,
            ..ProgressionConfig::default()
        };
        let service = ProgressionService::new(MemoryStore::new(), config);
        play(&service, &[true; 10]);
        let result = play(&service, &[true; 10]);

        assert!(!result.level_up);
        assert_eq!(result.new_level, 2);
        assert_eq!(result.progression.exercises_in_level, 10);
    }

    #[test]
    fn test_phase_overwritten() {
        let service = service();
        service.update_progression("lea", Domain::Geometrie, true, Phase::Pictorial);
        let p = service.get_progression("lea").domain(Domain::Geometrie);
        assert_eq!(p.current_phase, Phase::Pictorial);
        assert!(p.last_played.is_some());
    }

    #[test]
    fn test_children_are_independent() {
        let service = service();
        service.update_progression("lea", Domain::Calcul, true, Phase::Concrete);
        service.update_progression("tom", Domain::Calcul, false, Phase::Concrete);

        assert_eq!(service.overall_stats("lea").total_correct, 1);
        assert_eq!(service.overall_stats("tom").total_correct, 0);
        assert_eq!(service.overall_stats("tom").total_exercises, 1);
    }

    #[test]
    fn test_update_streak() {
        let service = service();
        assert!(!service.update_streak("lea", Domain::Calcul, 3));

        service.update_progression("lea", Domain::Calcul, true, Phase::Concrete);
        assert!(service.update_streak("lea", Domain::Calcul, 3));
        assert!(!service.update_streak("lea", Domain::Calcul, 2));
        assert_eq!(service.overall_stats("lea").best_streak, 3);
    }

    #[test]
    fn test_reset_domain() {
        let service = service();
        play(&service, &[true; 10]);
        assert!(service.reset_domain("lea", Domain::Calcul));
        assert_eq!(service.level("lea", Domain::Calcul), 1);
        assert_eq!(service.overall_stats("lea").total_exercises, 0);
        assert!(!service.reset_domain("nobody", Domain::Calcul));
    }

    #[test]
    fn test_domain_stats() {
        let service = service();
        play(&service, &[true, true, false]);
        let stats = service.domain_stats("lea", Domain::Calcul);
        assert_eq!(stats.success_rate, 67);
        assert_eq!(stats.progress_to_next_level, 30);
    }

    #[test]
    fn test_overall_stats() {
        let service = service();
        service.update_progression("lea", Domain::Calcul, true, Phase::Concrete);
        service.update_progression("lea", Domain::Mesures, false, Phase::Concrete);

        let stats = service.overall_stats("lea");
        assert_eq!(stats.total_exercises, 2);
        assert_eq!(stats.total_correct, 1);
        assert_eq!(stats.success_rate, 50);
        assert_eq!(stats.domains_played, 2);
    }

    #[test]
    fn test_stored_blob_shape() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let service = ProgressionService::new(store.clone(), ProgressionConfig::default());
        service.update_progression("lea", Domain::Calcul, true, Phase::Concrete);

        let blob = store.get("mathce1_progressions").unwrap().unwrap();
        let calcul = &blob["lea"]["domains"]["calcul"];
        assert_eq!(calcul["level"], 1);
        assert_eq!(calcul["exercisesInLevel"], 1);
        assert_eq!(calcul["currentPhase"], "concrete");
    }

    #[test]
    fn test_missing_domain_in_stored_record() {
        let store = std::sync::Arc::new(MemoryStore::new());
        store
            .put(
                "mathce1_progressions",
                &serde_json::json!({
                    "lea": { "domains": { "calcul": { "level": 3 } }, "lastUpdated": "2026-01-05T08:00:00Z" }
                }),
            )
            .unwrap();
        let service = ProgressionService::new(store, ProgressionConfig::default());

        assert_eq!(service.level("lea", Domain::Calcul), 3);
        assert_eq!(service.level("lea", Domain::Problemes), 1);
        let result = service.update_progression("lea", Domain::Problemes, true, Phase::Concrete);
        assert_eq!(result.progression.total_exercises, 1);
    }

    #[test]
    fn test_corrupt_blob_falls_back() {
        let store = std::sync::Arc::new(MemoryStore::new());
        store
            .put("mathce1_progressions", &serde_json::json!("garbage"))
            .unwrap();
        let service = ProgressionService::new(store, ProgressionConfig::default());
        assert_eq!(service.level("lea", Domain::Calcul), 1);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn counters_stay_consistent(results in proptest::collection::vec(any::<bool>(), 1..60)) {
                let service = service();
                let mut previous_level = 1;
                for correct in results {
                    let r = service.update_progression("p", Domain::Numeration, correct, Phase::Abstract);
                    prop_assert!(r.progression.correct_in_level <= r.progression.exercises_in_level);
                    prop_assert!(r.progression.total_correct <= r.progression.total_exercises);
                    prop_assert!(r.new_level >= previous_level);
                    prop_assert!(r.new_level <= 10);
                    previous_level = r.new_level;
                }
            }
        }
    }
}
