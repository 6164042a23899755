// src/services/mod.rs

pub mod attempts;
pub mod leaderboard;
pub mod progress;
pub mod quiz;
pub mod stages;
pub mod users;

pub use attempts::AttemptRecorder;
pub use leaderboard::LeaderboardAggregator;
pub use progress::ProgressStore;
pub use quiz::QuizService;
pub use stages::StageProgressionService;
pub use users::UserDirectory;
