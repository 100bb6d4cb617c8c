//! Shaped rewards for a single half-move, from the mover's point of view.
//!
//! The dense terms (flips, corners, edges, stable stones, mobility, centre
//! control, square weights, forced passes) guide early exploration; the
//! terminal terms are an order of magnitude larger so that the game outcome
//! dominates once values have propagated back from the end of the game.

use othello::bitboard::BitBoard;
use othello::{Board, Color};
use serde::{Deserialize, Serialize};

pub const REWARD_FLIP_PER_STONE: f64 = 1.1;
pub const REWARD_CORNER: f64 = 80.0;
pub const REWARD_EDGE: f64 = -20.0;
pub const REWARD_STABLE_STONE: f64 = 6.0;
pub const REWARD_MOBILITY: f64 = 1.3;
pub const REWARD_TERRITORY: f64 = 0.8;
pub const REWARD_POSITIONAL: f64 = 0.5;
pub const REWARD_PASS_FORCE: f64 = 15.0;
/// Never produced by the driver: the agent only ever picks from legal moves.
pub const REWARD_INVALID_MOVE: f64 = -40.0;
pub const REWARD_WIN: f64 = 200.0;
pub const REWARD_LOSE: f64 = -150.0;
pub const REWARD_DRAW: f64 = 100.0;

/// Square weights, indexed `[row][col]`.
pub const POSITION_WEIGHTS: [[i32; 8]; 8] = [
    [100, -20, 10, 5, 5, 10, -20, 100],
    [-20, -50, -2, -2, -2, -2, -50, -20],
    [10, -2, -1, -1, -1, -1, -2, 10],
    [5, -2, -1, -1, -1, -1, -2, 5],
    [5, -2, -1, -1, -1, -1, -2, 5],
    [10, -2, -1, -1, -1, -1, -2, 10],
    [-20, -50, -2, -2, -2, -2, -50, -20],
    [100, -20, 10, 5, 5, 10, -20, 100],
];

const CORNERS: [(usize, usize); 4] = [(0, 0), (0, 7), (7, 0), (7, 7)];

/// Rows 2..=5, columns 2..=5.
const CENTRE: BitBoard = BitBoard(0x0000_3c3c_3c3c_0000);

/// Game result from one side's perspective.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    pub fn for_side(board: &Board, side: Color) -> Self {
        match board.leader() {
            Some(leader) if leader == side => Outcome::Win,
            Some(_) => Outcome::Loss,
            None => Outcome::Draw,
        }
    }
}

/// A placement and the positions on either side of it.
#[derive(Clone, Copy, Debug)]
pub struct Transition<'a> {
    pub before: &'a Board,
    pub after: &'a Board,
    pub row: usize,
    pub col: usize,
    pub flipped: usize,
    pub side: Color,
}

/// Reward magnitudes. Every field defaults to the matching `REWARD_*` constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub flip_per_stone: f64,
    pub corner: f64,
    pub edge: f64,
    pub stable_stone: f64,
    pub mobility: f64,
    pub territory: f64,
    pub positional: f64,
    pub pass_force: f64,
    pub invalid_move: f64,
    pub win: f64,
    pub lose: f64,
    pub draw: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            flip_per_stone: REWARD_FLIP_PER_STONE,
            corner: REWARD_CORNER,
            edge: REWARD_EDGE,
            stable_stone: REWARD_STABLE_STONE,
            mobility: REWARD_MOBILITY,
            territory: REWARD_TERRITORY,
            positional: REWARD_POSITIONAL,
            pass_force: REWARD_PASS_FORCE,
            invalid_move: REWARD_INVALID_MOVE,
            win: REWARD_WIN,
            lose: REWARD_LOSE,
            draw: REWARD_DRAW,
        }
    }
}

impl RewardConfig {
    /// Immediate reward for a placement, without any terminal term.
    pub fn shaped(&self, t: &Transition<'_>) -> f64 {
        let opponent = t.side.opponent();
        let mut reward = t.flipped as f64 * self.flip_per_stone;

        if is_corner(t.row, t.col) {
            reward += self.corner;
        } else if is_edge(t.row, t.col) && !next_to_own_corner(t.before, t.side, t.row, t.col) {
            reward += self.edge;
        }

        reward += stable_stones(t.after, t.side).count() as f64 * self.stable_stone;

        let mobility = t.after.mobility(t.side) as f64 - t.after.mobility(opponent) as f64;
        reward += mobility * self.mobility;

        reward += (t.after.stones(t.side) & CENTRE).count() as f64 * self.territory;

        reward += POSITION_WEIGHTS[t.row][t.col] as f64 * self.positional;

        // Only a real forced pass: if the mover is also stuck the game is over.
        if !t.after.has_legal_move(opponent) && t.after.has_legal_move(t.side) {
            reward += self.pass_force;
        }

        reward
    }

    /// Outcome term for `side` on a finished board.
    pub fn terminal(&self, board: &Board, side: Color) -> f64 {
        match Outcome::for_side(board, side) {
            Outcome::Win => self.win,
            Outcome::Loss => self.lose,
            Outcome::Draw => self.draw,
        }
    }

    /// Shaped reward plus, when `terminal`, the outcome term.
    pub fn reward(&self, t: &Transition<'_>, terminal: bool) -> f64 {
        let shaped = self.shaped(t);
        if terminal {
            shaped + self.terminal(t.after, t.side)
        } else {
            shaped
        }
    }
}

pub fn is_corner(row: usize, col: usize) -> bool {
    CORNERS.contains(&(row, col))
}

pub fn is_edge(row: usize, col: usize) -> bool {
    row == 0 || row == 7 || col == 0 || col == 7
}

/// Whether (row, col) touches, including diagonally, a corner `side` holds.
fn next_to_own_corner(board: &Board, side: Color, row: usize, col: usize) -> bool {
    CORNERS
        .iter()
        .any(|&(cr, cc)| board.get(cr, cc) == Some(side) && row.abs_diff(cr) <= 1 && col.abs_diff(cc) <= 1)
}

/// Edge stones of `side` that can never be flipped: every own corner, plus
/// each own stone joined to an own corner by an unbroken run of own stones
/// along the same edge.
pub fn stable_stones(board: &Board, side: Color) -> BitBoard {
    let mut stable = BitBoard::EMPTY;

    for (cr, cc) in CORNERS {
        if board.get(cr, cc) != Some(side) {
            continue;
        }
        let dr: isize = if cr == 0 { 1 } else { -1 };
        let dc: isize = if cc == 0 { 1 } else { -1 };

        // Along the row edge, then along the column edge.
        for (step_r, step_c) in [(0, dc), (dr, 0)] {
            let (mut r, mut c) = (cr as isize, cc as isize);
            while (0..8).contains(&r) && (0..8).contains(&c) && board.get(r as usize, c as usize) == Some(side) {
                stable.set(r as usize, c as usize);
                r += step_r;
                c += step_c;
            }
        }
    }

    stable
}
