//! One game from the opening (or a loaded position) to termination.
//!
//! The driver owns the board and the side to move. Each non-pass half-move
//! schedules exactly one update for its mover; that update is written when
//! the same side next has a choice (bootstrapping from the best value it
//! sees there), or folded together with that side's terminal reward once
//! the game ends. Passes are never learned.

use othello::{ActionKey, Board, Color, Move, OthelloError, OthelloGame};
use tracing::debug;

use crate::agent::{Agent, PendingUpdate, UpdateRecord};
use crate::error::{LearnError, Refusal, Result};
use crate::policy;
use crate::q_table::QTable;
use crate::reward::Transition;

/// Who drives each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    /// The agent plays both sides against itself.
    SelfPlay,
    /// The agent plays `agent`, a human plays the other colour. Only the
    /// agent learns.
    HumanVsAgent { agent: Color },
}

impl PlayMode {
    /// Whether `side` is played by the agent.
    pub fn is_agent(&self, side: Color) -> bool {
        match *self {
            PlayMode::SelfPlay => true,
            PlayMode::HumanVsAgent { agent } => agent == side,
        }
    }
}

/// What a single step did.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub mover: Color,
    pub action: Move,
    pub flipped: Vec<(usize, usize)>,
    pub terminated: bool,
    /// Shaped reward of the placement, for agent placements only.
    pub shaped_reward: Option<f64>,
    /// Table writes made during this step, oldest first.
    pub updates: Vec<UpdateRecord>,
}

impl StepOutcome {
    fn pass(mover: Color, terminated: bool) -> Self {
        StepOutcome {
            mover,
            action: Move::Pass,
            flipped: Vec::new(),
            terminated,
            shaped_reward: None,
            updates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Episode {
    game: OthelloGame,
    mode: PlayMode,
    pending: [Option<PendingUpdate>; 2],
    folded: bool,
}

impl Episode {
    pub fn new(mode: PlayMode) -> Self {
        Self::from_position(Board::new(), Color::Black, mode)
    }

    pub fn from_position(board: Board, to_move: Color, mode: PlayMode) -> Self {
        Episode { game: OthelloGame::from_position(board, to_move), mode, pending: [None, None], folded: false }
    }

    pub fn game(&self) -> &OthelloGame {
        &self.game
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    pub fn side_to_move(&self) -> Color {
        self.game.current_turn
    }

    pub fn is_terminated(&self) -> bool {
        self.game.game_over()
    }

    /// Whether the terminal reward has been written this episode.
    pub fn terminal_folded(&self) -> bool {
        self.folded
    }

    pub fn pending(&self, side: Color) -> Option<&PendingUpdate> {
        self.pending[side.index()].as_ref()
    }

    pub fn legal_moves_now(&self) -> Vec<(usize, usize)> {
        self.game.legal_moves(self.game.current_turn)
    }

    /// (black, white)
    pub fn score(&self) -> (u32, u32) {
        self.game.score()
    }

    /// Advances the game by one agent half-move.
    ///
    /// A side without legal moves passes, without any learning. On a
    /// terminated game this returns a pass with `terminated` set and touches
    /// nothing. In human mode it is an error to call this on the human's turn
    /// while the human still has a move.
    pub fn agent_move(&mut self, agent: &mut Agent, table: &mut QTable) -> Result<StepOutcome> {
        let side = self.game.current_turn;
        if self.game.game_over() {
            return Ok(StepOutcome::pass(side, true));
        }

        let legal = self.game.legal_moves(side);
        if legal.is_empty() {
            self.game.pass(side)?;
            debug!("{} has no legal move and passes", side);
            return Ok(StepOutcome::pass(side, false));
        }

        if let PlayMode::HumanVsAgent { agent: agent_side } = self.mode {
            if side != agent_side {
                return Err(LearnError::NotAgentTurn(agent_side));
            }
        }

        let state = self.game.state_key();
        let mut updates = Vec::new();

        // This is the mover's next choice after its previous placement.
        if let Some(pending) = self.pending[side.index()].take() {
            let bootstrap = policy::bootstrap(table, &state, &legal);
            updates.push(agent.learn(table, pending, bootstrap));
        }

        let action = agent.choose(table, &state, &legal);
        let (row, col) = match action {
            Move::Place(row, col) => (row, col),
            Move::Pass => return Err(OthelloError::CannotPass(side).into()),
        };

        let before = self.game.board;
        let flipped = self.game.play(row, col, side)?;
        let transition = Transition {
            before: &before,
            after: &self.game.board,
            row,
            col,
            flipped: flipped.len(),
            side,
        };
        let shaped = agent.rewards.shaped(&transition);
        self.pending[side.index()] = Some(PendingUpdate { state, action: ActionKey::new(row, col), reward: shaped });

        let terminated = self.game.game_over();
        if terminated {
            updates.extend(self.fold_terminal(agent, table, side));
        }

        Ok(StepOutcome { mover: side, action, flipped, terminated, shaped_reward: Some(shaped), updates })
    }

    /// Plays the human's placement. Refusals leave the game untouched.
    ///
    /// The human's moves are not learned, but if this move ends the game the
    /// agent's outstanding update is completed with its terminal reward.
    pub fn human_move(
        &mut self,
        row: usize,
        col: usize,
        agent: &Agent,
        table: &mut QTable,
    ) -> std::result::Result<StepOutcome, Refusal> {
        let PlayMode::HumanVsAgent { agent: agent_side } = self.mode else {
            return Err(Refusal::NotYourTurn);
        };
        let human = agent_side.opponent();

        if self.game.game_over() {
            return Err(Refusal::GameOver);
        }
        if self.game.current_turn != human {
            return Err(Refusal::NotYourTurn);
        }
        if !self.game.board.has_legal_move(human) {
            return Err(Refusal::MustPass);
        }

        let flipped = self.game.play(row, col, human)?;

        let terminated = self.game.game_over();
        let updates = if terminated { self.fold_terminal(agent, table, human) } else { Vec::new() };

        Ok(StepOutcome {
            mover: human,
            action: Move::Place(row, col),
            flipped,
            terminated,
            shaped_reward: None,
            updates,
        })
    }

    /// Passes for the side to move, which must have no legal placement.
    pub fn pass_now(&mut self) -> std::result::Result<StepOutcome, Refusal> {
        let side = self.game.current_turn;
        self.game.pass(side)?;
        debug!("{} passes", side);
        Ok(StepOutcome::pass(side, false))
    }

    /// Writes every outstanding update with its owner's terminal reward and
    /// no bootstrap. The side that did not make the final placement goes
    /// first, so an update of the final mover is always the last record.
    fn fold_terminal(&mut self, agent: &Agent, table: &mut QTable, last_mover: Color) -> Vec<UpdateRecord> {
        let (black, white) = self.game.score();
        let mut records = Vec::with_capacity(2);

        for side in [last_mover.opponent(), last_mover] {
            let Some(pending) = self.pending[side.index()].take() else {
                continue;
            };
            let terminal = agent.rewards.terminal(&self.game.board, side);
            records.push(agent.learn(table, PendingUpdate { reward: pending.reward + terminal, ..pending }, 0.0));
            debug!("Game over at {}-{}: {} receives terminal reward {}", black, white, side, terminal);
        }

        self.folded |= !records.is_empty();
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LearnerConfig;
    use othello::StateKey;

    fn board(diagram: &str) -> Board {
        Board::from_diagram(diagram).unwrap()
    }

    fn agent(seed: u64) -> Agent {
        Agent::new(&LearnerConfig::default().with_seed(seed))
    }

    /// Black's only move is (7,0). White then has only (0,3), which ends the
    /// game 4-3 in white's favour.
    fn human_finish() -> Board {
        board(
            "WBB.....
             ........
             ........
             ........
             ........
             ........
             ........
             .WB.....",
        )
    }

    #[test]
    fn test_self_play_episode_terminates_with_one_fold() {
        let mut agent = agent(5);
        let mut table = QTable::new();
        let mut episode = Episode::new(PlayMode::SelfPlay);

        let mut placements = 0;
        let mut writes = 0;
        let mut folds = 0;
        for _ in 0..200 {
            let step = episode.agent_move(&mut agent, &mut table).unwrap();
            if step.action != Move::Pass {
                placements += 1;
            } else {
                assert!(step.updates.is_empty());
            }
            writes += step.updates.len();
            if step.terminated {
                folds += 1;
                break;
            }
        }

        assert_eq!(folds, 1);
        assert!(episode.is_terminated());
        assert!(episode.terminal_folded());
        assert!(episode.pending(Color::Black).is_none());
        assert!(episode.pending(Color::White).is_none());
        // Every placement is written exactly once, the last one of each side
        // together with its terminal reward.
        assert_eq!(writes, placements);
        assert!(!table.is_empty());

        let after = episode.agent_move(&mut agent, &mut table).unwrap();
        assert_eq!(after.action, Move::Pass);
        assert!(after.terminated);
        assert!(after.updates.is_empty());
    }

    #[test]
    fn test_pending_resolves_at_movers_next_choice() {
        let mut agent = agent(6);
        let mut table = QTable::new();
        let mut episode = Episode::new(PlayMode::SelfPlay);

        let first = episode.agent_move(&mut agent, &mut table).unwrap();
        assert!(first.updates.is_empty());
        let scheduled = *episode.pending(Color::Black).unwrap();
        assert_eq!(scheduled.reward, first.shaped_reward.unwrap());

        let reply = episode.agent_move(&mut agent, &mut table).unwrap();
        assert_eq!(reply.mover, Color::White);
        assert!(reply.updates.is_empty());
        assert!(table.is_empty());

        let third = episode.agent_move(&mut agent, &mut table).unwrap();
        assert_eq!(third.updates.len(), 1);
        let record = third.updates[0];
        assert_eq!(record.state, scheduled.state);
        assert_eq!(record.action, scheduled.action);
        assert_eq!(record.reward, scheduled.reward);
        // Empty table: the bootstrap is 0, so Q = α r.
        assert_eq!(record.bootstrap, 0.0);
        assert!((record.new - 0.15 * scheduled.reward).abs() < 1e-12);
    }

    #[test]
    fn test_self_play_end_folds_both_sides() {
        let mut agent = agent(11);
        let start = human_finish();
        let black_state = StateKey::new(&start, Color::Black);
        let black_action = ActionKey::new(7, 0);
        let mut table = QTable::new();
        table.set(black_state, black_action, 3.0);
        let mut episode = Episode::from_position(start, Color::Black, PlayMode::SelfPlay);

        let black = episode.agent_move(&mut agent, &mut table).unwrap();
        assert_eq!(black.action, Move::Place(7, 0));
        let black_shaped = black.shaped_reward.unwrap();

        let white = episode.agent_move(&mut agent, &mut table).unwrap();
        assert_eq!(white.action, Move::Place(0, 3));
        assert!(white.terminated);
        assert_eq!(episode.score(), (3, 4));
        assert_eq!(white.updates.len(), 2);

        // Black's last placement learns its loss.
        let loser = white.updates[0];
        assert_eq!((loser.state, loser.action), (black_state, black_action));
        assert_eq!(loser.bootstrap, 0.0);
        let expected = 3.0 + 0.15 * (black_shaped + agent.rewards.lose - 3.0);
        assert!((table.get(&black_state, black_action) - expected).abs() < 1e-9);

        // White's finishing placement learns its win.
        let winner = white.updates[1];
        assert_eq!(winner.action, ActionKey::new(0, 3));
        let expected = 0.15 * (white.shaped_reward.unwrap() + agent.rewards.win);
        assert!((winner.new - expected).abs() < 1e-9);

        assert!(episode.pending(Color::Black).is_none());
        assert!(episode.pending(Color::White).is_none());
    }

    #[test]
    fn test_human_turn_is_not_played_by_the_agent() {
        let mut agent = agent(7);
        let mut table = QTable::new();
        let mut episode = Episode::new(PlayMode::HumanVsAgent { agent: Color::White });

        assert!(matches!(
            episode.agent_move(&mut agent, &mut table),
            Err(LearnError::NotAgentTurn(Color::White))
        ));
        assert_eq!(episode.game().move_count(), 0);
    }

    #[test]
    fn test_human_refusals_change_nothing() {
        let agent = agent(8);
        let mut table = QTable::new();
        let mut episode = Episode::new(PlayMode::HumanVsAgent { agent: Color::White });
        let before = *episode.game();

        assert_eq!(episode.human_move(0, 0, &agent, &mut table), Err(Refusal::NoCapture));
        assert_eq!(episode.human_move(3, 3, &agent, &mut table), Err(Refusal::Occupied));
        assert_eq!(episode.human_move(9, 0, &agent, &mut table), Err(Refusal::OutOfBounds));
        assert_eq!(episode.pass_now(), Err(Refusal::CannotPass));
        assert_eq!(*episode.game(), before);
        assert!(table.is_empty());

        let step = episode.human_move(2, 3, &agent, &mut table).unwrap();
        assert_eq!(step.flipped, vec![(3, 3)]);
        assert!(step.updates.is_empty());
        assert_eq!(episode.human_move(2, 2, &agent, &mut table), Err(Refusal::NotYourTurn));
    }

    #[test]
    fn test_human_finishing_move_folds_agent_update() {
        let mut agent = agent(9);
        let mut table = QTable::new();
        let start = human_finish();
        let mut episode = Episode::from_position(start, Color::Black, PlayMode::HumanVsAgent { agent: Color::Black });

        let step = episode.agent_move(&mut agent, &mut table).unwrap();
        assert_eq!(step.action, Move::Place(7, 0));
        assert!(!step.terminated);
        let shaped = step.shaped_reward.unwrap();

        let finish = episode.human_move(0, 3, &agent, &mut table).unwrap();
        assert!(finish.terminated);
        assert_eq!(episode.score(), (3, 4));
        assert_eq!(finish.updates.len(), 1);

        let key = StateKey::new(&start, Color::Black);
        let expected = 0.15 * (shaped + agent.rewards.lose);
        assert!((table.get(&key, ActionKey::new(7, 0)) - expected).abs() < 1e-9);
        assert!(episode.terminal_folded());
        assert_eq!(episode.human_move(1, 1, &agent, &mut table), Err(Refusal::GameOver));
    }

    #[test]
    fn test_human_must_pass_when_stuck() {
        let agent = agent(10);
        let mut table = QTable::new();
        // White (the human) has nothing to capture; black still does.
        let start = board(
            "BW......
             ........
             ........
             ........
             ........
             ........
             ........
             ........",
        );
        let mut episode = Episode::from_position(start, Color::White, PlayMode::HumanVsAgent { agent: Color::Black });

        assert_eq!(episode.human_move(0, 2, &agent, &mut table), Err(Refusal::MustPass));
        let step = episode.pass_now().unwrap();
        assert_eq!(step.action, Move::Pass);
        assert_eq!(episode.side_to_move(), Color::Black);
    }
}
