use othello::{ActionKey, Move, StateKey};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::trace;

use crate::config::LearnerConfig;
use crate::policy;
use crate::q_table::QTable;
use crate::reward::RewardConfig;

/// A learning step that was scheduled but not yet written: the mover took
/// `action` in `state` and earned `reward`. It is resolved against the
/// mover's next choice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingUpdate {
    pub state: StateKey,
    pub action: ActionKey,
    pub reward: f64,
}

/// One table write, as reported to hosts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateRecord {
    pub state: StateKey,
    pub action: ActionKey,
    pub reward: f64,
    pub bootstrap: f64,
    pub old: f64,
    pub new: f64,
}

/// The learner's parameters and its source of exploration noise. The table
/// itself is owned elsewhere and handed in per call.
#[derive(Debug, Clone)]
pub struct Agent {
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
    pub rewards: RewardConfig,
    rng: StdRng,
}

impl Agent {
    pub fn new(config: &LearnerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Agent {
            alpha: config.alpha,
            gamma: config.gamma,
            epsilon: config.epsilon,
            rewards: config.rewards.clone(),
            rng,
        }
    }

    /// ε-greedy pick among `legal` in `state`.
    pub fn choose(&mut self, table: &QTable, state: &StateKey, legal: &[(usize, usize)]) -> Move {
        policy::select_action(table, state, legal, self.epsilon, &mut self.rng)
    }

    /// Writes `pending` into the table with the given bootstrap value.
    pub fn learn(&self, table: &mut QTable, pending: PendingUpdate, bootstrap: f64) -> UpdateRecord {
        let (old, new) =
            policy::q_update(table, pending.state, pending.action, pending.reward, bootstrap, self.alpha, self.gamma);
        trace!(
            "Q({:?}, {}) {:.4} -> {:.4} (r = {:.3}, bootstrap = {:.3})",
            pending.state.side(),
            pending.action.index(),
            old,
            new,
            pending.reward,
            bootstrap
        );
        UpdateRecord { state: pending.state, action: pending.action, reward: pending.reward, bootstrap, old, new }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use othello::{Board, Color};

    #[test]
    fn test_seeded_agents_agree() {
        let config = LearnerConfig::default().with_epsilon(1.0).with_seed(11);
        let mut a = Agent::new(&config);
        let mut b = Agent::new(&config);

        let table = QTable::new();
        let board = Board::new();
        let state = StateKey::new(&board, Color::Black);
        let legal = board.legal_moves(Color::Black);

        let picks_a: Vec<Move> = (0..32).map(|_| a.choose(&table, &state, &legal)).collect();
        let picks_b: Vec<Move> = (0..32).map(|_| b.choose(&table, &state, &legal)).collect();
        assert_eq!(picks_a, picks_b);
    }

    #[test]
    fn test_unvalidated_epsilon_still_picks_legal_moves() {
        let board = Board::new();
        let state = StateKey::new(&board, Color::Black);
        let legal = board.legal_moves(Color::Black);
        let table = QTable::new();

        for epsilon in [2.0, -1.0, f64::NAN] {
            let mut agent = Agent::new(&LearnerConfig::default().with_epsilon(epsilon).with_seed(12));
            for _ in 0..20 {
                let Move::Place(r, c) = agent.choose(&table, &state, &legal) else {
                    panic!("the opening always has a placement");
                };
                assert!(legal.contains(&(r, c)));
            }
        }
    }

    #[test]
    fn test_learn_writes_one_entry() {
        let config = LearnerConfig::default();
        let agent = Agent::new(&config);
        let mut table = QTable::new();
        let state = StateKey::new(&Board::new(), Color::Black);
        let pending = PendingUpdate { state, action: ActionKey::new(2, 3), reward: 20.0 };

        let record = agent.learn(&mut table, pending, 10.0);
        let expected = 0.15 * (20.0 + 0.99 * 10.0);
        assert_eq!(table.len(), 1);
        assert_eq!(record.old, 0.0);
        assert!((record.new - expected).abs() < 1e-12);
        assert_eq!(table.get(&state, ActionKey::new(2, 3)), record.new);
    }
}
