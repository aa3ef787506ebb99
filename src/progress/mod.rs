//! Persistent learning state: mastery levels, play sessions, badges and the
//! child roster.

pub mod badges;
pub mod profiles;
pub mod progression;
pub mod session;

pub use badges::{
    consecutive_days, find_badge, Badge, BadgeCounts, BadgeRule, BadgeService, BadgeStats,
    BadgeStatus, BADGES,
};
pub use profiles::{ChildProfile, ChildProfiles, StoredChildProfiles, MAX_CHILDREN, MAX_NAME_LEN};
pub use progression::{
    check_level_up, percentage, DomainProgress, DomainStats, OverallStats, ProgressResult,
    Progression, ProgressionService,
};
pub use session::{
    stars_for_answer, ExerciseOutcome, ExerciseRecord, Session, SessionHistoryEntry,
    SessionService, SessionStats,
};
