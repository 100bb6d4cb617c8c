//! Pure Othello rules over a pair of bitboards.
//!
//! Every operation here is a function of the position and the side asked
//! about. Nothing in this module knows whose turn it is; that lives in
//! [`crate::othello_game::OthelloGame`].

use std::fmt;

use crate::bitboard::BitBoard;
use crate::othello_game::{Color, OthelloError};

// Masks to prevent wrapping when shifting
const NOT_A_FILE: BitBoard = BitBoard(0xfefefefefefefefe);
const NOT_H_FILE: BitBoard = BitBoard(0x7f7f7f7f7f7f7f7f);

/// Shift amount and the mask that discards bits wrapped onto the wrong file.
const DIRECTIONS: [(i32, BitBoard); 8] = [
    (8, BitBoard::FULL),  // south (row + 1)
    (-8, BitBoard::FULL), // north (row - 1)
    (1, NOT_A_FILE),      // east
    (-1, NOT_H_FILE),     // west
    (9, NOT_A_FILE),      // south-east
    (7, NOT_H_FILE),      // south-west
    (-7, NOT_A_FILE),     // north-east
    (-9, NOT_H_FILE),     // north-west
];

#[inline]
fn shift(bb: BitBoard, amount: i32, mask: BitBoard) -> BitBoard {
    if amount > 0 {
        (bb << amount as u32) & mask
    } else {
        (bb >> (-amount) as u32) & mask
    }
}

/// An 8×8 Othello position: one bitboard per colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Board {
    pub black: BitBoard,
    pub white: BitBoard,
}

impl Board {
    /// The standard starting position.
    pub fn new() -> Self {
        let mut board = Board::empty();
        board.set(3, 4, Color::Black);
        board.set(4, 3, Color::Black);
        board.set(3, 3, Color::White);
        board.set(4, 4, Color::White);
        board
    }

    pub fn empty() -> Self {
        Board { black: BitBoard::EMPTY, white: BitBoard::EMPTY }
    }

    /// Parses an 8-row diagram. `B`/`X` is black, `W`/`O` is white and `.`/`-`
    /// is empty; whitespace inside a row is ignored and blank lines are skipped.
    ///
    /// ```
    /// use othello::board::Board;
    ///
    /// let board = Board::from_diagram(
    ///     "........
    ///      ........
    ///      ........
    ///      ...WB...
    ///      ...BW...
    ///      ........
    ///      ........
    ///      ........",
    /// )
    /// .unwrap();
    /// assert_eq!(board, Board::new());
    /// ```
    pub fn from_diagram(diagram: &str) -> Result<Self, OthelloError> {
        let rows: Vec<Vec<char>> = diagram
            .lines()
            .map(|line| line.chars().filter(|c| !c.is_whitespace()).collect::<Vec<_>>())
            .filter(|row| !row.is_empty())
            .collect();

        if rows.len() != 8 {
            return Err(OthelloError::InvalidDiagram(format!("expected 8 rows, found {}", rows.len())));
        }

        let mut board = Board::empty();
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != 8 {
                return Err(OthelloError::InvalidDiagram(format!(
                    "row {} has {} cells, expected 8",
                    row,
                    cells.len()
                )));
            }
            for (col, ch) in cells.iter().enumerate() {
                match ch {
                    'B' | 'b' | 'X' | 'x' => board.set(row, col, Color::Black),
                    'W' | 'w' | 'O' | 'o' => board.set(row, col, Color::White),
                    '.' | '-' => {}
                    other => {
                        return Err(OthelloError::InvalidDiagram(format!(
                            "unexpected '{}' at ({}, {})",
                            other, row, col
                        )))
                    }
                }
            }
        }
        Ok(board)
    }

    /// Returns the color at a given square, if any.
    pub fn get(&self, row: usize, col: usize) -> Option<Color> {
        if self.black.get(row, col) {
            Some(Color::Black)
        } else if self.white.get(row, col) {
            Some(Color::White)
        } else {
            None
        }
    }

    /// Sets a square to a given color.
    pub fn set(&mut self, row: usize, col: usize, color: Color) {
        match color {
            Color::Black => {
                self.black.set(row, col);
                self.white.clear(row, col);
            }
            Color::White => {
                self.white.set(row, col);
                self.black.clear(row, col);
            }
        }
    }

    pub fn stones(&self, color: Color) -> BitBoard {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }

    pub fn occupied(&self) -> BitBoard {
        self.black | self.white
    }

    /// Stones of `side`'s opponent that a stone placed at (row, col) would flip.
    ///
    /// Empty when the placement brackets nothing, which is exactly when it is
    /// illegal for an empty cell.
    pub fn flips_mask(&self, side: Color, row: usize, col: usize) -> BitBoard {
        if row >= 8 || col >= 8 || self.occupied().get(row, col) {
            return BitBoard::EMPTY;
        }

        let me = self.stones(side);
        let opp = self.stones(side.opponent());
        let start = BitBoard::cell(row, col);
        let mut flips = BitBoard::EMPTY;

        for (amount, mask) in DIRECTIONS {
            let mut run = BitBoard::EMPTY;
            let mut cursor = shift(start, amount, mask);
            while !(cursor & opp).is_empty() {
                run |= cursor;
                cursor = shift(cursor, amount, mask);
            }
            // A run only counts when the scan stops on one of our stones.
            if !(cursor & me).is_empty() {
                flips |= run;
            }
        }

        flips
    }

    /// The flipped cells for a placement, in row-major order.
    pub fn flips(&self, side: Color, row: usize, col: usize) -> Vec<(usize, usize)> {
        self.flips_mask(side, row, col).cells().collect()
    }

    pub fn is_legal(&self, side: Color, row: usize, col: usize) -> bool {
        !self.flips_mask(side, row, col).is_empty()
    }

    /// Places a stone for `side` and flips every bracketed run.
    ///
    /// Returns the new position and the flipped cells. The receiver is left
    /// untouched, and an illegal placement is an error rather than a no-op.
    pub fn apply(&self, side: Color, row: usize, col: usize) -> Result<(Board, Vec<(usize, usize)>), OthelloError> {
        if row >= 8 || col >= 8 {
            return Err(OthelloError::OutOfBounds { row, col });
        }
        if self.occupied().get(row, col) {
            return Err(OthelloError::Occupied { row, col });
        }

        let flips = self.flips_mask(side, row, col);
        if flips.is_empty() {
            return Err(OthelloError::IllegalMove { row, col });
        }

        let placed = flips | BitBoard::cell(row, col);
        let next = match side {
            Color::Black => Board { black: self.black | placed, white: self.white & !flips },
            Color::White => Board { white: self.white | placed, black: self.black & !flips },
        };
        Ok((next, flips.cells().collect()))
    }

    /// Return a bitmask of all legal moves for the given player
    pub fn legal_moves_mask(&self, player: Color) -> BitBoard {
        let me = self.stones(player);
        let opp = self.stones(player.opponent());

        let empty = !(me | opp);
        let mut moves = BitBoard::EMPTY;

        for (amount, mask) in DIRECTIONS {
            let mut candidates = shift(me, amount, mask) & opp;

            let mut run = candidates;
            while !candidates.is_empty() {
                candidates = shift(candidates, amount, mask) & opp;
                run |= candidates;
            }

            moves |= shift(run, amount, mask) & empty;
        }

        moves
    }

    /// Legal placements for `player` as (row, col), in row-major order.
    pub fn legal_moves(&self, player: Color) -> Vec<(usize, usize)> {
        self.legal_moves_mask(player).cells().collect()
    }

    pub fn has_legal_move(&self, player: Color) -> bool {
        !self.legal_moves_mask(player).is_empty()
    }

    /// Number of legal placements for `player`.
    pub fn mobility(&self, player: Color) -> u32 {
        self.legal_moves_mask(player).count()
    }

    /// (black_count, white_count)
    pub fn score(&self) -> (u32, u32) {
        (self.black.count(), self.white.count())
    }

    /// True when neither side can place a stone. A full board is one case of this.
    pub fn is_terminal(&self) -> bool {
        !self.has_legal_move(Color::Black) && !self.has_legal_move(Color::White)
    }

    /// The side with more stones, or `None` on equal counts.
    pub fn leader(&self) -> Option<Color> {
        let (black, white) = self.score();
        match black.cmp(&white) {
            std::cmp::Ordering::Greater => Some(Color::Black),
            std::cmp::Ordering::Less => Some(Color::White),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  0 1 2 3 4 5 6 7")?;
        for row in 0..8 {
            write!(f, "{}", row)?;
            for col in 0..8 {
                let glyph = match self.get(row, col) {
                    Some(Color::White) => '●',
                    Some(Color::Black) => '○',
                    None => '.',
                };
                write!(f, " {}", glyph)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
