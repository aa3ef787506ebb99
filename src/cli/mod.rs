//! CLI commands for mathce1.
//!
//! - **Play**: play (interactive session)
//! - **Child commands**: stats, history, badges
//! - **Utility commands**: generate, parse/format (numbers)

// Play
pub mod play;

// Child commands
pub mod badges;
pub mod history;
pub mod stats;

// Utility commands
pub mod generate;
pub mod numbers;

pub use badges::BadgesCommand;
pub use generate::GenerateCommand;
pub use history::HistoryCommand;
pub use numbers::NumbersCommand;
pub use play::PlayCommand;
pub use stats::StatsCommand;
