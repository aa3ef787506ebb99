//! Play-session tracking.
//!
//! The running session is mirrored under `currentSession` after every
//! change so an interrupted session can be resumed. Ending a session archives
//! a summary into the child's history, trimmed to the most recent
//! `max_sessions_stored` entries.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{RewardsConfig, SessionConfig};
use crate::core::Domain;
use crate::progress::percentage;
use crate::storage::{keys, JsonStorage, KeyValueStore};

/// Result of one answer, as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseOutcome {
    pub exercise_id: String,
    pub is_correct: bool,
    pub response_time_ms: u64,
    pub hints_used: u32,
    pub answer: u32,
    pub expected: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRecord {
    #[serde(flatten)]
    pub outcome: ExerciseOutcome,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub child_id: String,
    pub domain: Domain,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub exercises: Vec<ExerciseRecord>,
    pub total_exercises: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    pub hints_used: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub stars_earned: u32,
    /// Seconds, set when the session ends.
    pub duration: i64,
    pub is_complete: bool,
}

impl Session {
    fn new(child_id: &str, domain: Domain, now: DateTime<Utc>) -> Self {
        Self {
            id: format!("session_{}", now.timestamp_millis()),
            child_id: child_id.to_string(),
            domain,
            started_at: now,
            ended_at: None,
            exercises: Vec::new(),
            total_exercises: 0,
            correct_answers: 0,
            incorrect_answers: 0,
            hints_used: 0,
            streak: 0,
            best_streak: 0,
            stars_earned: 0,
            duration: 0,
            is_complete: false,
        }
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            total_exercises: self.total_exercises,
            correct_answers: self.correct_answers,
            incorrect_answers: self.incorrect_answers,
            success_rate: percentage(self.correct_answers, self.total_exercises),
            streak: self.streak,
            best_streak: self.best_streak,
            stars_earned: self.stars_earned,
        }
    }
}

/// Archived summary of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHistoryEntry {
    pub id: String,
    pub domain: Domain,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration: i64,
    pub total_exercises: u32,
    pub correct_answers: u32,
    pub best_streak: u32,
    pub stars_earned: u32,
}

impl From<&Session> for SessionHistoryEntry {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            domain: session.domain,
            started_at: session.started_at,
            ended_at: session.ended_at,
            duration: session.duration,
            total_exercises: session.total_exercises,
            correct_answers: session.correct_answers,
            best_streak: session.best_streak,
            stars_earned: session.stars_earned,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_exercises: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    pub success_rate: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub stars_earned: u32,
}

type HistoryMap = HashMap<String, Vec<SessionHistoryEntry>>;

/// Stars for the answer that brought the streak to `streak`.
pub fn stars_for_answer(rewards: &RewardsConfig, correct: bool, streak: u32) -> u32 {
    if !correct {
        return 0;
    }
    let bonus_every = rewards.streak_length_for_bonus;
    let bonus = bonus_every > 0 && streak >= bonus_every && streak % bonus_every == 0;
    rewards.stars_per_exercise + if bonus { rewards.streak_bonus_stars } else { 0 }
}

pub struct SessionService<S: KeyValueStore> {
    storage: JsonStorage<S>,
    rewards: RewardsConfig,
    limits: SessionConfig,
    current: Option<Session>,
}

impl<S: KeyValueStore> SessionService<S> {
    pub fn new(store: S, rewards: RewardsConfig, limits: SessionConfig) -> Self {
        Self {
            storage: JsonStorage::new(store),
            rewards,
            limits,
            current: None,
        }
    }

    /// Begin a session, replacing any running one without archiving it.
    pub fn start_session(&mut self, child_id: &str, domain: Domain) -> &Session {
        let session = Session::new(child_id, domain, Utc::now());
        tracing::debug!(id = %session.id, child_id, %domain, "session started");
        self.storage.set(keys::CURRENT_SESSION, &session);
        self.current.insert(session)
    }

    /// Add an answer to the running session. Returns the stars it earned,
    /// or `None` when no session is running.
    pub fn record_exercise(&mut self, outcome: ExerciseOutcome) -> Option<u32> {
        let Some(session) = self.current.as_mut() else {
            tracing::warn!("exercise recorded with no active session");
            return None;
        };

        session.total_exercises += 1;
        session.hints_used += outcome.hints_used;
        let stars = if outcome.is_correct {
            session.correct_answers += 1;
            session.streak += 1;
            session.best_streak = session.best_streak.max(session.streak);
            stars_for_answer(&self.rewards, true, session.streak)
        } else {
            session.incorrect_answers += 1;
            session.streak = 0;
            0
        };
        session.stars_earned += stars;
        session.exercises.push(ExerciseRecord {
            outcome,
            timestamp: Utc::now(),
        });

        self.storage.set(keys::CURRENT_SESSION, &*session);
        Some(stars)
    }

    /// Finish the running session and archive its summary.
    pub fn end_session(&mut self) -> Option<Session> {
        let mut session = self.current.take()?;
        let now = Utc::now();
        session.ended_at = Some(now);
        session.is_complete = true;
        session.duration = (now - session.started_at).num_seconds();

        self.archive(&session);
        self.storage.remove(keys::CURRENT_SESSION);
        tracing::debug!(id = %session.id, duration = session.duration, "session ended");
        Some(session)
    }

    fn archive(&self, session: &Session) {
        let mut all: HistoryMap = self.storage.get(keys::SESSIONS, HistoryMap::new());
        let history = all.entry(session.child_id.clone()).or_default();
        history.push(SessionHistoryEntry::from(session));

        let keep = self.limits.max_sessions_stored.max(1);
        if history.len() > keep {
            let excess = history.len() - keep;
            history.drain(..excess);
        }
        self.storage.set(keys::SESSIONS, &all);
    }

    /// Pick up an unfinished session left in storage.
    pub fn resume_session(&mut self) -> Option<&Session> {
        let saved: Option<Session> = self.storage.get(keys::CURRENT_SESSION, None);
        match saved {
            Some(session) if !session.is_complete => {
                tracing::debug!(id = %session.id, "session resumed");
                Some(&*self.current.insert(session))
            }
            _ => None,
        }
    }

    /// Archived sessions for a child, oldest first.
    pub fn history(&self, child_id: &str) -> Vec<SessionHistoryEntry> {
        let mut all: HistoryMap = self.storage.get(keys::SESSIONS, HistoryMap::new());
        all.remove(child_id).unwrap_or_default()
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn current_stats(&self) -> Option<SessionStats> {
        self.current.as_ref().map(Session::stats)
    }

    pub fn is_active(&self) -> bool {
        self.current.as_ref().is_some_and(|s| !s.is_complete)
    }

    pub fn streak(&self) -> u32 {
        self.current.as_ref().map(|s| s.streak).unwrap_or(0)
    }

    /// Whether the running session has gone past `max_duration_minutes`.
    pub fn time_limit_reached(&self, now: DateTime<Utc>) -> bool {
        let limit = Duration::minutes(i64::from(self.limits.max_duration_minutes));
        self.current
            .as_ref()
            .is_some_and(|s| now - s.started_at >= limit)
    }
}
