use std::path::PathBuf;

use othello::OthelloError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LearnError {
    /// The engine rejected a move the agent itself chose. Always a bug.
    #[error("engine rejected an agent move: {0}")]
    Engine(#[from] OthelloError),

    #[error("it is the human's turn; the agent plays {0}")]
    NotAgentTurn(othello::Color),

    #[error("Q-table error: {0}")]
    QTable(#[from] QTableError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum QTableError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad magic 0x{0:08x}, not a Q-table file")]
    BadMagic(u32),

    #[error("unsupported Q-table version {0}")]
    UnsupportedVersion(u32),

    #[error("expected {expected} bytes, found {actual}")]
    Length { expected: u64, actual: u64 },

    #[error("entry {0} is malformed")]
    InvalidEntry(u64),
}

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed statistics: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("cannot parse {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("{0}")]
    Invalid(String),
}

/// Why a human move was turned down. The state is unchanged and nothing is
/// learned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    #[error("that square is off the board")]
    OutOfBounds,

    #[error("that square is already taken")]
    Occupied,

    #[error("that move does not capture anything")]
    NoCapture,

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("you have no legal move and must pass")]
    MustPass,

    #[error("the game is over")]
    GameOver,

    #[error("you have a legal move and cannot pass")]
    CannotPass,
}

impl Refusal {
    /// Discrete code for hosts that cannot carry the enum.
    pub fn code(self) -> u8 {
        match self {
            Refusal::OutOfBounds => 1,
            Refusal::Occupied => 2,
            Refusal::NoCapture => 3,
            Refusal::NotYourTurn => 4,
            Refusal::MustPass => 5,
            Refusal::GameOver => 6,
            Refusal::CannotPass => 7,
        }
    }
}

impl From<OthelloError> for Refusal {
    fn from(err: OthelloError) -> Self {
        match err {
            OthelloError::OutOfBounds { .. } | OthelloError::InvalidDiagram(_) => Refusal::OutOfBounds,
            OthelloError::Occupied { .. } => Refusal::Occupied,
            OthelloError::IllegalMove { .. } => Refusal::NoCapture,
            OthelloError::NotYourTurn(_) => Refusal::NotYourTurn,
            OthelloError::CannotPass(_) => Refusal::CannotPass,
            OthelloError::GameOver => Refusal::GameOver,
        }
    }
}

pub type Result<T> = std::result::Result<T, LearnError>;
