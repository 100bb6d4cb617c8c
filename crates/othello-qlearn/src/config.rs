use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::episode::PlayMode;
use crate::error::ConfigError;
use crate::reward::RewardConfig;

pub const ALPHA: f64 = 0.15;
pub const GAMMA: f64 = 0.99;
pub const EPSILON: f64 = 0.08;
pub const HISTORY_SAVE_INTERVAL: u32 = 10;
pub const QTABLE_PATH: &str = "qtable.bin";
pub const LEARNING_STATS_PATH: &str = "learning_stats.json";

/// When the Q-table is written back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaveCadence {
    /// After every agent move, so a crash loses at most one update.
    EveryAgentMove,
    /// Once per finished episode.
    EveryEpisode,
}

impl SaveCadence {
    /// Human games save after every agent move; self-play once per episode.
    pub fn for_mode(mode: PlayMode) -> Self {
        match mode {
            PlayMode::SelfPlay => SaveCadence::EveryEpisode,
            PlayMode::HumanVsAgent { .. } => SaveCadence::EveryAgentMove,
        }
    }
}

/// Everything the learner needs that is not learned.
///
/// Deserializes from JSON with every field optional:
///
/// ```
/// use othello_qlearn::LearnerConfig;
///
/// let config: LearnerConfig = serde_json::from_str(r#"{ "epsilon": 0.2, "rewards": { "win": 500.0 } }"#).unwrap();
/// assert_eq!(config.epsilon, 0.2);
/// assert_eq!(config.rewards.win, 500.0);
/// assert_eq!(config.alpha, othello_qlearn::config::ALPHA);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    /// Learning rate α
    pub alpha: f64,
    /// Discount factor γ
    pub gamma: f64,
    /// Exploration rate ε
    pub epsilon: f64,
    pub rewards: RewardConfig,
    /// Self-play episodes between statistics flushes
    pub history_save_interval: u32,
    pub qtable_path: PathBuf,
    pub learning_stats_path: PathBuf,
    /// Seed for the policy's RNG; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            alpha: ALPHA,
            gamma: GAMMA,
            epsilon: EPSILON,
            rewards: RewardConfig::default(),
            history_save_interval: HISTORY_SAVE_INTERVAL,
            qtable_path: PathBuf::from(QTABLE_PATH),
            learning_stats_path: PathBuf::from(LEARNING_STATS_PATH),
            seed: None,
        }
    }
}

impl LearnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_rewards(mut self, rewards: RewardConfig) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn with_history_save_interval(mut self, episodes: u32) -> Self {
        self.history_save_interval = episodes;
        self
    }

    pub fn with_qtable_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.qtable_path = path.into();
        self
    }

    pub fn with_learning_stats_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.learning_stats_path = path.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Rejects parameters the update rule cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(ConfigError::Invalid(format!("alpha must be in (0, 1], got {}", self.alpha)));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ConfigError::Invalid(format!("gamma must be in [0, 1], got {}", self.gamma)));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(ConfigError::Invalid(format!("epsilon must be in [0, 1], got {}", self.epsilon)));
        }
        if self.history_save_interval == 0 {
            return Err(ConfigError::Invalid("history_save_interval must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = LearnerConfig::default();
        assert_eq!(config.alpha, 0.15);
        assert_eq!(config.gamma, 0.99);
        assert_eq!(config.epsilon, 0.08);
        assert_eq!(config.history_save_interval, HISTORY_SAVE_INTERVAL);
        assert_eq!(config.qtable_path, PathBuf::from(QTABLE_PATH));
        assert_eq!(config.seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = LearnerConfig::default()
            .with_alpha(0.5)
            .with_gamma(0.9)
            .with_epsilon(0.0)
            .with_history_save_interval(3)
            .with_qtable_path("a/q.bin")
            .with_learning_stats_path("a/s.json")
            .with_seed(7);

        assert_eq!(config.alpha, 0.5);
        assert_eq!(config.gamma, 0.9);
        assert_eq!(config.epsilon, 0.0);
        assert_eq!(config.history_save_interval, 3);
        assert_eq!(config.qtable_path, PathBuf::from("a/q.bin"));
        assert_eq!(config.learning_stats_path, PathBuf::from("a/s.json"));
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(LearnerConfig::default().with_alpha(0.0).validate().is_err());
        assert!(LearnerConfig::default().with_alpha(1.5).validate().is_err());
        assert!(LearnerConfig::default().with_gamma(-0.1).validate().is_err());
        assert!(LearnerConfig::default().with_epsilon(f64::NAN).validate().is_err());
        assert!(LearnerConfig::default().with_history_save_interval(0).validate().is_err());
        assert!(LearnerConfig::default().with_alpha(1.0).with_epsilon(1.0).validate().is_ok());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "alpha": 0.3, "qtable_path": "tables/q.bin", "rewards": { "corner": 10.0 } }"#).unwrap();

        let config = LearnerConfig::from_json_file(&path).unwrap();
        assert_eq!(config.alpha, 0.3);
        assert_eq!(config.gamma, GAMMA);
        assert_eq!(config.qtable_path, PathBuf::from("tables/q.bin"));
        assert_eq!(config.rewards.corner, 10.0);
        assert_eq!(config.rewards.edge, crate::reward::REWARD_EDGE);

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(LearnerConfig::from_json_file(&path), Err(ConfigError::Parse { .. })));
        assert!(matches!(
            LearnerConfig::from_json_file(&dir.path().join("absent.json")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_save_cadence_serde_names() {
        assert_eq!(serde_json::to_string(&SaveCadence::EveryAgentMove).unwrap(), "\"every-agent-move\"");
        let parsed: SaveCadence = serde_json::from_str("\"every-episode\"").unwrap();
        assert_eq!(parsed, SaveCadence::EveryEpisode);
    }

    #[test]
    fn test_save_cadence_for_mode() {
        assert_eq!(SaveCadence::for_mode(PlayMode::SelfPlay), SaveCadence::EveryEpisode);
        assert_eq!(
            SaveCadence::for_mode(PlayMode::HumanVsAgent { agent: othello::Color::White }),
            SaveCadence::EveryAgentMove
        );
    }
}
