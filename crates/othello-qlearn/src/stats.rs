//! Cumulative game counts, persisted as JSON next to the Q-table.

use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use othello::{Board, Color};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::episode::PlayMode;
use crate::error::StatsError;

/// Oldest history entries are dropped beyond this.
pub const MAX_HISTORY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    BlackWin,
    WhiteWin,
    Draw,
}

impl GameResult {
    pub fn from_board(board: &Board) -> Self {
        match board.leader() {
            Some(Color::Black) => GameResult::BlackWin,
            Some(Color::White) => GameResult::WhiteWin,
            None => GameResult::Draw,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub games: u64,
    pub black_wins: u64,
    pub white_wins: u64,
    pub draws: u64,
}

impl Tally {
    pub fn record(&mut self, result: GameResult) {
        self.games += 1;
        match result {
            GameResult::BlackWin => self.black_wins += 1,
            GameResult::WhiteWin => self.white_wins += 1,
            GameResult::Draw => self.draws += 1,
        }
    }

    pub fn black_win_rate(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.black_wins as f64 / self.games as f64
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} games: Black {} wins, White {} wins, Draws {} (black win rate: {:.1}%)",
            self.games,
            self.black_wins,
            self.white_wins,
            self.draws,
            self.black_win_rate() * 100.0
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeTag {
    SelfPlay,
    Human,
}

impl From<PlayMode> for ModeTag {
    fn from(mode: PlayMode) -> Self {
        match mode {
            PlayMode::SelfPlay => ModeTag::SelfPlay,
            PlayMode::HumanVsAgent { .. } => ModeTag::Human,
        }
    }
}

/// A dated snapshot of the totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub mode: ModeTag,
    pub totals: Tally,
    pub table_entries: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningStats {
    pub totals: Tally,
    pub self_play: Tally,
    pub human: Tally,
    pub history: Vec<HistoryEntry>,
}

impl LearningStats {
    pub fn record(&mut self, mode: PlayMode, result: GameResult) {
        self.totals.record(result);
        match ModeTag::from(mode) {
            ModeTag::SelfPlay => self.self_play.record(result),
            ModeTag::Human => self.human.record(result),
        }
    }

    pub fn push_history(&mut self, mode: PlayMode, table_entries: usize) {
        self.history.push(HistoryEntry {
            timestamp: Utc::now(),
            mode: mode.into(),
            totals: self.totals,
            table_entries: table_entries as u64,
        });
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(..excess);
        }
    }

    /// Writes pretty JSON to `path` by atomic replace.
    pub fn save(&self, path: &Path) -> Result<(), StatsError> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut w = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut w, self)?;
            w.flush()?;
        }
        tmp.persist(path).map_err(|e| e.error)?;

        debug!("Saved learning statistics to {}", path.display());
        Ok(())
    }

    pub fn try_load(path: &Path) -> Result<Self, StatsError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Reads the statistics at `path`, starting from zero when the file is
    /// missing or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::try_load(path) {
            Ok(stats) => {
                info!("Loaded learning statistics from {}: {}", path.display(), stats.totals);
                stats
            }
            Err(e) => {
                warn!("Could not load learning statistics from {} ({}), starting fresh", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_result_from_board() {
        let black = Board::from_diagram(&"BBBBBBBB\n".repeat(8)).unwrap();
        assert_eq!(GameResult::from_board(&black), GameResult::BlackWin);
        let drawn = Board::from_diagram(&"BBBBWWWW\n".repeat(8)).unwrap();
        assert_eq!(GameResult::from_board(&drawn), GameResult::Draw);
    }

    #[test]
    fn test_record_by_mode() {
        let mut stats = LearningStats::default();
        stats.record(PlayMode::SelfPlay, GameResult::BlackWin);
        stats.record(PlayMode::SelfPlay, GameResult::Draw);
        stats.record(PlayMode::HumanVsAgent { agent: Color::White }, GameResult::WhiteWin);

        assert_eq!(stats.totals, Tally { games: 3, black_wins: 1, white_wins: 1, draws: 1 });
        assert_eq!(stats.self_play.games, 2);
        assert_eq!(stats.human, Tally { games: 1, black_wins: 0, white_wins: 1, draws: 0 });
        assert!(stats.totals.to_string().starts_with("3 games: Black 1 wins"));
    }

    #[test]
    fn test_history_is_capped() {
        let mut stats = LearningStats::default();
        for i in 0..MAX_HISTORY + 5 {
            stats.push_history(PlayMode::SelfPlay, i);
        }
        assert_eq!(stats.history.len(), MAX_HISTORY);
        assert_eq!(stats.history[0].table_entries, 5);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("learning_stats.json");

        let mut stats = LearningStats::default();
        stats.record(PlayMode::SelfPlay, GameResult::WhiteWin);
        stats.push_history(PlayMode::SelfPlay, 42);
        stats.save(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"white_wins\": 1"));
        assert!(text.contains("\"mode\": \"self_play\""));

        assert_eq!(LearningStats::try_load(&path).unwrap(), stats);
    }

    #[test]
    fn test_load_or_default_recovers() {
        let dir = tempdir().unwrap();
        assert_eq!(LearningStats::load_or_default(&dir.path().join("missing.json")), LearningStats::default());

        let path = dir.path().join("broken.json");
        fs::write(&path, "{ \"totals\": ").unwrap();
        assert_eq!(LearningStats::load_or_default(&path), LearningStats::default());

        // Older files without per-mode tallies still load.
        fs::write(&path, r#"{ "totals": { "games": 2, "black_wins": 2, "white_wins": 0, "draws": 0 } }"#).unwrap();
        assert_eq!(LearningStats::load_or_default(&path).totals.black_wins, 2);
    }
}
