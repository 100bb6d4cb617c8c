//! Hashable keys for (position, side to move) and for placements.
//!
//! A [`StateKey`] is the two colour planes plus the side to move, so equality
//! is exactly structural equality of (board, side). No symmetry folding is
//! done: rotated or mirrored positions are different keys.

use crate::bitboard::BitBoard;
use crate::board::Board;
use crate::othello_game::{Color, Move};

/// Immutable key for a position with a given side to move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateKey {
    black: u64,
    white: u64,
    side: Color,
}

impl StateKey {
    /// Size of [`StateKey::to_le_bytes`].
    pub const ENCODED_LEN: usize = 17;

    pub fn new(board: &Board, side: Color) -> Self {
        StateKey { black: board.black.0, white: board.white.0, side }
    }

    pub fn board(&self) -> Board {
        Board { black: BitBoard(self.black), white: BitBoard(self.white) }
    }

    pub fn side(&self) -> Color {
        self.side
    }

    /// `black u64 | white u64 | side u8`, little-endian. Side is 1 for black
    /// and 2 for white.
    pub fn to_le_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[0..8].copy_from_slice(&self.black.to_le_bytes());
        out[8..16].copy_from_slice(&self.white.to_le_bytes());
        out[16] = match self.side {
            Color::Black => 1,
            Color::White => 2,
        };
        out
    }

    /// Inverse of [`StateKey::to_le_bytes`]. Rejects an unknown side tag and
    /// overlapping colour planes.
    pub fn from_le_bytes(bytes: &[u8; Self::ENCODED_LEN]) -> Option<Self> {
        let black = u64::from_le_bytes(bytes[0..8].try_into().ok()?);
        let white = u64::from_le_bytes(bytes[8..16].try_into().ok()?);
        if black & white != 0 {
            return None;
        }
        let side = match bytes[16] {
            1 => Color::Black,
            2 => Color::White,
            _ => return None,
        };
        Some(StateKey { black, white, side })
    }
}

/// Shorthand for [`StateKey::new`].
pub fn encode(board: &Board, side: Color) -> StateKey {
    StateKey::new(board, side)
}

/// A placement as a compact key: the row-major cell index `row * 8 + col`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionKey(u8);

impl ActionKey {
    pub fn new(row: usize, col: usize) -> Self {
        debug_assert!(row < 8 && col < 8, "action ({row}, {col}) is off the board");
        ActionKey((row * 8 + col) as u8)
    }

    pub fn from_index(index: u8) -> Option<Self> {
        (index < 64).then_some(ActionKey(index))
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    pub fn row(&self) -> usize {
        self.0 as usize / 8
    }

    pub fn col(&self) -> usize {
        self.0 as usize % 8
    }

    pub fn coords(&self) -> (usize, usize) {
        (self.row(), self.col())
    }
}

impl From<(usize, usize)> for ActionKey {
    fn from((row, col): (usize, usize)) -> Self {
        ActionKey::new(row, col)
    }
}

impl Move {
    /// The table key for a placement. A pass has none: it is never learned.
    pub fn action_key(&self) -> Option<ActionKey> {
        match *self {
            Move::Place(row, col) => Some(ActionKey::new(row, col)),
            Move::Pass => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equal_states_give_equal_keys() {
        let a = encode(&Board::new(), Color::Black);
        let b = encode(&Board::new(), Color::Black);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_side_to_move_is_part_of_the_key() {
        let black = encode(&Board::new(), Color::Black);
        let white = encode(&Board::new(), Color::White);
        assert_ne!(black, white);
    }

    #[test]
    fn test_no_symmetry_folding() {
        // Black's four opening moves lead to positions that are symmetric to
        // each other; each must keep its own key.
        let board = Board::new();
        let keys: HashSet<StateKey> = board
            .legal_moves(Color::Black)
            .into_iter()
            .map(|(r, c)| encode(&board.apply(Color::Black, r, c).unwrap().0, Color::White))
            .collect();
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn test_key_bytes_and_board_recovery() {
        let (board, _) = Board::new().apply(Color::Black, 2, 3).unwrap();
        let key = encode(&board, Color::White);
        let bytes = key.to_le_bytes();
        assert_eq!(bytes[16], 2);
        assert_eq!(StateKey::from_le_bytes(&bytes), Some(key));
        assert_eq!(key.board(), board);
        assert_eq!(key.side(), Color::White);

        let mut bad_side = bytes;
        bad_side[16] = 7;
        assert_eq!(StateKey::from_le_bytes(&bad_side), None);

        let mut overlapping = bytes;
        overlapping[8..16].copy_from_slice(&board.black.0.to_le_bytes());
        assert_eq!(StateKey::from_le_bytes(&overlapping), None);
    }

    #[test]
    fn test_action_keys() {
        let key = ActionKey::new(2, 3);
        assert_eq!(key.index(), 19);
        assert_eq!(key.coords(), (2, 3));
        assert_eq!(ActionKey::from((7, 7)).index(), 63);
        assert_eq!(ActionKey::from_index(64), None);
        assert_eq!(Move::Place(2, 3).action_key(), Some(key));
        assert_eq!(Move::Pass.action_key(), None);
    }
}
