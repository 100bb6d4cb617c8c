//! Tabular Q-learning for Othello: an ε-greedy agent that learns from
//! self-play and from games against a human, keeping its action values in a
//! table persisted between runs.

pub mod agent;
pub mod config;
pub mod episode;
pub mod error;
pub mod play;
pub mod policy;
pub mod q_table;
pub mod reward;
pub mod session;
pub mod stats;
pub mod training;

// Re-export commonly used types
pub use agent::{Agent, PendingUpdate, UpdateRecord};
pub use config::{LearnerConfig, SaveCadence};
pub use episode::{Episode, PlayMode, StepOutcome};
pub use error::{LearnError, Refusal};
pub use q_table::QTable;
pub use reward::RewardConfig;
pub use session::{Progress, Session};
pub use stats::{GameResult, LearningStats, Tally};
pub use training::TrainingSummary;
