//! Self-play training: N episodes of the agent against itself, with periodic
//! persistence and win accounting.

use std::fmt;
use std::ops::ControlFlow;

use tracing::info;

use crate::episode::PlayMode;
use crate::error::Result;
use crate::session::{Progress, Session};
use crate::stats::Tally;

/// Outcome of a [`Session::selfplay`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingSummary {
    /// Episodes completed in this run.
    pub episodes: u64,
    pub black_wins: u64,
    pub white_wins: u64,
    pub draws: u64,
    /// Whether the observer stopped the run early.
    pub cancelled: bool,
    pub table_entries: usize,
}

impl fmt::Display for TrainingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} episodes{}: Black {} wins, White {} wins, Draws {} ({} Q-values)",
            self.episodes,
            if self.cancelled { " (cancelled)" } else { "" },
            self.black_wins,
            self.white_wins,
            self.draws,
            self.table_entries
        )
    }
}

impl Session {
    /// Runs `episodes` self-play games.
    pub fn selfplay(&mut self, episodes: u64) -> Result<TrainingSummary> {
        self.selfplay_with(episodes, |_| ControlFlow::Continue(()))
    }

    /// Runs `episodes` self-play games, reporting after each one. Returning
    /// `Break` from `observer` stops the run; the table and statistics are
    /// flushed either way.
    ///
    /// The session is left in self-play mode on a fresh board. A cadence set
    /// with [`Session::set_save_cadence`] is kept when the session is already
    /// in self-play.
    pub fn selfplay_with<F>(&mut self, episodes: u64, mut observer: F) -> Result<TrainingSummary>
    where
        F: FnMut(&Progress) -> ControlFlow<()>,
    {
        info!(
            "Starting self-play: {} episodes (alpha = {}, gamma = {}, epsilon = {}, {} Q-values loaded)",
            episodes,
            self.config.alpha,
            self.config.gamma,
            self.config.epsilon,
            self.table.len()
        );

        if self.mode() != PlayMode::SelfPlay {
            self.set_mode(PlayMode::SelfPlay);
        }
        let start = self.session_tally;
        let interval = u64::from(self.config.history_save_interval);
        let mut cancelled = false;

        for episode_idx in 0..episodes {
            self.reset();
            while !self.terminated_now() {
                self.agent_move()?;
            }

            let done = episode_idx + 1;
            let run = delta(&self.session_tally, &start);
            let flushed = done % interval == 0 || done == episodes;
            if flushed {
                info!(
                    "Self-play progress: {}/{} episodes (black: {}, white: {}, draws: {}, {} Q-values)",
                    done,
                    episodes,
                    run.black_wins,
                    run.white_wins,
                    run.draws,
                    self.table.len()
                );
                self.flush();
            }

            if observer(&self.snapshot()).is_break() {
                info!("Self-play cancelled after {} episodes", done);
                cancelled = true;
                if !flushed {
                    self.flush();
                }
                break;
            }
        }
        if episodes == 0 {
            self.flush();
        }
        self.reset();

        let run = delta(&self.session_tally, &start);
        let summary = TrainingSummary {
            episodes: run.games,
            black_wins: run.black_wins,
            white_wins: run.white_wins,
            draws: run.draws,
            cancelled,
            table_entries: self.table.len(),
        };
        info!("Self-play finished: {}", summary);
        Ok(summary)
    }
}

fn delta(now: &Tally, start: &Tally) -> Tally {
    Tally {
        games: now.games - start.games,
        black_wins: now.black_wins - start.black_wins,
        white_wins: now.white_wins - start.white_wins,
        draws: now.draws - start.draws,
    }
}
