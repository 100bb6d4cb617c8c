use std::fmt;

use thiserror::Error;

use crate::board::Board;
use crate::encoding::StateKey;

/// A color enum to represent white and black
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Stable slot index: black is 0, white is 1.
    pub fn index(self) -> usize {
        match self {
            Color::Black => 0,
            Color::White => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "Black"),
            Color::White => write!(f, "White"),
        }
    }
}

/// A single action: place a stone, or pass when no placement exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    Place(usize, usize),
    Pass,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Place(r, c) => write!(f, "({}, {})", r, c),
            Move::Pass => write!(f, "pass"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OthelloError {
    #[error("({row}, {col}) is off the board")]
    OutOfBounds { row: usize, col: usize },

    #[error("({row}, {col}) is already occupied")]
    Occupied { row: usize, col: usize },

    #[error("({row}, {col}) does not capture any stone")]
    IllegalMove { row: usize, col: usize },

    #[error("it is not {0}'s turn")]
    NotYourTurn(Color),

    #[error("{0} has a legal move and cannot pass")]
    CannotPass(Color),

    #[error("the game is over")]
    GameOver,

    #[error("invalid board diagram: {0}")]
    InvalidDiagram(String),
}

/// Game state for one episode: the position plus whose turn it is, a move
/// counter and the last placement made by each side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OthelloGame {
    pub board: Board,
    pub current_turn: Color,
    move_count: u32,
    last_moves: [Option<(usize, usize)>; 2],
}

impl Default for OthelloGame {
    fn default() -> Self {
        Self::new()
    }
}

impl OthelloGame {
    /// Creates a new Othello game with the standard starting position.
    pub fn new() -> Self {
        Self::from_position(Board::new(), Color::Black)
    }

    /// Starts from an arbitrary position with `to_move` on turn.
    pub fn from_position(board: Board, to_move: Color) -> Self {
        OthelloGame {
            board,
            current_turn: to_move,
            move_count: 0,
            last_moves: [None, None],
        }
    }

    /// Returns the color at a given square, if any.
    pub fn get(&self, row: usize, col: usize) -> Option<Color> {
        self.board.get(row, col)
    }

    /// Return a vector of legal moves as (row, col)
    pub fn legal_moves(&self, player: Color) -> Vec<(usize, usize)> {
        self.board.legal_moves(player)
    }

    pub fn game_over(&self) -> bool {
        self.board.is_terminal()
    }

    /// (black_count, white_count)
    pub fn score(&self) -> (u32, u32) {
        self.board.score()
    }

    /// Half-moves played so far, passes included.
    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    /// Most recent placement made by `color`, if any.
    pub fn last_move(&self, color: Color) -> Option<(usize, usize)> {
        self.last_moves[color.index()]
    }

    /// The state key for the side to move.
    pub fn state_key(&self) -> StateKey {
        StateKey::new(&self.board, self.current_turn)
    }

    /// Places a stone for `player` and hands the turn to the opponent.
    ///
    /// On success returns the flipped cells. On error nothing changes.
    pub fn play(&mut self, row: usize, col: usize, player: Color) -> Result<Vec<(usize, usize)>, OthelloError> {
        if self.game_over() {
            return Err(OthelloError::GameOver);
        }
        if player != self.current_turn {
            return Err(OthelloError::NotYourTurn(player));
        }

        let (next, flipped) = self.board.apply(player, row, col)?;
        self.board = next;
        self.last_moves[player.index()] = Some((row, col));
        self.move_count += 1;
        self.current_turn = player.opponent();
        Ok(flipped)
    }

    /// Passes for `player`; only allowed when it has no placement and the game
    /// is still running.
    pub fn pass(&mut self, player: Color) -> Result<(), OthelloError> {
        if self.game_over() {
            return Err(OthelloError::GameOver);
        }
        if player != self.current_turn {
            return Err(OthelloError::NotYourTurn(player));
        }
        if self.board.has_legal_move(player) {
            return Err(OthelloError::CannotPass(player));
        }

        self.move_count += 1;
        self.current_turn = player.opponent();
        Ok(())
    }

    /// Applies either kind of [`Move`], returning the flipped cells.
    pub fn play_move(&mut self, m: Move, player: Color) -> Result<Vec<(usize, usize)>, OthelloError> {
        match m {
            Move::Place(row, col) => self.play(row, col, player),
            Move::Pass => self.pass(player).map(|()| Vec::new()),
        }
    }
}

impl fmt::Display for OthelloGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board)?;
        let (black, white) = self.score();
        writeln!(f, "● White: {}, ○ Black: {}", white, black)
    }
}
