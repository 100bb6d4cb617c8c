//! ε-greedy action selection and the one-step Q-learning update.

use othello::{ActionKey, Move, StateKey};
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::q_table::QTable;

/// Every move in `legal` whose value equals the maximum, in list order.
pub fn best_actions(table: &QTable, state: &StateKey, legal: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let Some(best) = table.max_over(state, legal) else {
        return Vec::new();
    };
    legal
        .iter()
        .copied()
        .filter(|&cell| table.get(state, ActionKey::from(cell)) == best)
        .collect()
}

/// Picks a move for the side to move in `state`.
///
/// With probability `epsilon` the pick is uniform over `legal`; otherwise it
/// is uniform over the moves with the highest value. An empty `legal` is a
/// pass and never touches the table or the RNG. An `epsilon` above 1 always
/// explores; one at or below 0, or NaN, never does.
pub fn select_action<R: Rng + ?Sized>(
    table: &QTable,
    state: &StateKey,
    legal: &[(usize, usize)],
    epsilon: f64,
    rng: &mut R,
) -> Move {
    if legal.is_empty() {
        return Move::Pass;
    }

    let explore = if epsilon >= 1.0 {
        true
    } else if epsilon > 0.0 {
        rng.random_bool(epsilon)
    } else {
        false
    };
    let pool = if explore { legal.to_vec() } else { best_actions(table, state, legal) };

    match pool.choose(rng) {
        Some(&(r, c)) => Move::Place(r, c),
        None => Move::Pass,
    }
}

/// Bootstrap value for the mover's next choice: the best value over its
/// legal moves there, or 0 when it has none.
pub fn bootstrap(table: &QTable, state: &StateKey, legal: &[(usize, usize)]) -> f64 {
    table.max_over(state, legal).unwrap_or(0.0)
}

/// Applies Q(s,a) ← Q(s,a) + α (r + γ·bootstrap − Q(s,a)) and returns
/// `(old, new)`.
pub fn q_update(
    table: &mut QTable,
    state: StateKey,
    action: ActionKey,
    reward: f64,
    bootstrap: f64,
    alpha: f64,
    gamma: f64,
) -> (f64, f64) {
    let old = table.get(&state, action);
    let target = reward + gamma * bootstrap;
    let new = old + alpha * (target - old);
    table.set(state, action, new);
    (old, new)
}
