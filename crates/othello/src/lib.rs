//! Othello rules engine.
//!
//! [`board::Board`] holds the pure rules (legality, flips, legal-move
//! enumeration, scoring, terminal detection), [`othello_game::OthelloGame`]
//! adds turn order and passing on top, and [`encoding`] turns positions and
//! placements into hashable keys.

pub mod bitboard;
pub mod board;
pub mod encoding;
pub mod othello_game;

pub use board::Board;
pub use encoding::{encode, ActionKey, StateKey};
pub use othello_game::{Color, Move, OthelloError, OthelloGame};
