use othello::{Board, Color};
use tracing::{info, warn};

use crate::agent::Agent;
use crate::config::{LearnerConfig, SaveCadence};
use crate::episode::{Episode, PlayMode, StepOutcome};
use crate::error::{Refusal, Result};
use crate::q_table::QTable;
use crate::stats::{GameResult, LearningStats, Tally};

/// Read-only view of a session for hosts.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub mode: PlayMode,
    /// Episodes finished since the session was opened.
    pub episodes: u64,
    /// Results since the session was opened.
    pub session: Tally,
    /// Results across every run that shared the statistics file.
    pub totals: Tally,
    pub table_entries: usize,
    pub side_to_move: Color,
    /// (black, white)
    pub score: (u32, u32),
    pub terminated: bool,
}

/// The single owner of the Q-table, the agent and the current game.
///
/// A host pumps it through [`Session::agent_move`] and
/// [`Session::human_move`]; persistence follows the save cadence of the
/// current mode.
#[derive(Debug)]
pub struct Session {
    pub(crate) config: LearnerConfig,
    pub(crate) table: QTable,
    pub(crate) agent: Agent,
    pub(crate) episode: Episode,
    pub(crate) stats: LearningStats,
    cadence: SaveCadence,
    pub(crate) episodes: u64,
    pub(crate) session_tally: Tally,
    recorded: bool,
    /// Table writes not yet on disk.
    unsaved: bool,
}

impl Session {
    /// Validates `config` and loads the table and statistics it points at.
    pub fn open(config: LearnerConfig) -> Result<Self> {
        let table = QTable::load_or_default(&config.qtable_path);
        Self::with_table(config, table)
    }

    /// Like [`Session::open`] but starting from `table` instead of the file.
    pub fn with_table(config: LearnerConfig, table: QTable) -> Result<Self> {
        config.validate()?;
        let stats = LearningStats::load_or_default(&config.learning_stats_path);
        let agent = Agent::new(&config);
        let mode = PlayMode::SelfPlay;

        Ok(Session {
            config,
            table,
            agent,
            episode: Episode::new(mode),
            stats,
            cadence: SaveCadence::for_mode(mode),
            episodes: 0,
            session_tally: Tally::default(),
            recorded: false,
            unsaved: false,
        })
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn stats(&self) -> &LearningStats {
        &self.stats
    }

    pub fn episode(&self) -> &Episode {
        &self.episode
    }

    pub fn mode(&self) -> PlayMode {
        self.episode.mode()
    }

    /// Whether the table holds writes that have not been saved yet.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn save_cadence(&self) -> SaveCadence {
        self.cadence
    }

    /// Overrides the cadence picked by [`Session::set_mode`].
    pub fn set_save_cadence(&mut self, cadence: SaveCadence) {
        self.cadence = cadence;
    }

    /// Switches mode and starts a new game in it.
    pub fn set_mode(&mut self, mode: PlayMode) {
        self.cadence = SaveCadence::for_mode(mode);
        self.episode = Episode::new(mode);
        self.recorded = false;
    }

    /// Starts a new game in the current mode. Outstanding updates of the
    /// abandoned game are dropped.
    pub fn reset(&mut self) {
        self.episode = Episode::new(self.mode());
        self.recorded = false;
    }

    /// Starts a game from an arbitrary position.
    pub fn load_position(&mut self, board: Board, to_move: Color) {
        self.episode = Episode::from_position(board, to_move, self.mode());
        self.recorded = false;
    }

    pub fn legal_moves_now(&self) -> Vec<(usize, usize)> {
        self.episode.legal_moves_now()
    }

    pub fn side_to_move(&self) -> Color {
        self.episode.side_to_move()
    }

    /// (black, white)
    pub fn score_now(&self) -> (u32, u32) {
        self.episode.score()
    }

    pub fn terminated_now(&self) -> bool {
        self.episode.is_terminated()
    }

    pub fn agent_move(&mut self) -> Result<StepOutcome> {
        let step = self.episode.agent_move(&mut self.agent, &mut self.table)?;
        self.unsaved |= !step.updates.is_empty();
        if step.action.action_key().is_some() && self.cadence == SaveCadence::EveryAgentMove {
            self.save_table();
        }
        if step.terminated {
            self.finish_episode();
        }
        Ok(step)
    }

    pub fn human_move(&mut self, row: usize, col: usize) -> std::result::Result<StepOutcome, Refusal> {
        let step = self.episode.human_move(row, col, &self.agent, &mut self.table)?;
        self.unsaved |= !step.updates.is_empty();
        if !step.updates.is_empty() && self.cadence == SaveCadence::EveryAgentMove {
            self.save_table();
        }
        if step.terminated {
            self.finish_episode();
        }
        Ok(step)
    }

    /// Passes for the side to move when it has no placement.
    pub fn pass_now(&mut self) -> std::result::Result<StepOutcome, Refusal> {
        self.episode.pass_now()
    }

    pub fn snapshot(&self) -> Progress {
        Progress {
            mode: self.mode(),
            episodes: self.episodes,
            session: self.session_tally,
            totals: self.stats.totals,
            table_entries: self.table.len(),
            side_to_move: self.side_to_move(),
            score: self.score_now(),
            terminated: self.terminated_now(),
        }
    }

    /// Writes the Q-table. A failure is logged and the in-memory table kept,
    /// so the next save retries.
    pub fn save_table(&mut self) -> bool {
        match self.table.save(&self.config.qtable_path) {
            Ok(()) => {
                self.unsaved = false;
                true
            }
            Err(e) => {
                warn!("Failed to save Q-table to {}: {}", self.config.qtable_path.display(), e);
                false
            }
        }
    }

    pub fn save_stats(&self) -> bool {
        match self.stats.save(&self.config.learning_stats_path) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save learning statistics to {}: {}", self.config.learning_stats_path.display(), e);
                false
            }
        }
    }

    /// Appends a history entry and writes the statistics, plus the table if
    /// it has changed since the last successful save.
    pub fn flush(&mut self) -> bool {
        self.stats.push_history(self.mode(), self.table.len());
        let table = !self.unsaved || self.save_table();
        let stats = self.save_stats();
        table && stats
    }

    /// Books the result of a finished game once.
    fn finish_episode(&mut self) {
        if self.recorded {
            return;
        }
        self.recorded = true;

        let result = GameResult::from_board(&self.episode.game().board);
        let mode = self.mode();
        self.stats.record(mode, result);
        self.session_tally.record(result);
        self.episodes += 1;

        match mode {
            PlayMode::SelfPlay => {
                if self.cadence == SaveCadence::EveryEpisode {
                    self.save_table();
                }
            }
            PlayMode::HumanVsAgent { agent } => {
                let (black, white) = self.score_now();
                info!("Game over: Black {} - White {} (agent played {})", black, white, agent);
                self.flush();
            }
        }
    }
}
