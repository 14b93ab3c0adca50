use serde::Deserialize;
use serde::Serialize;

/// Result of a game for one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Score {
    Win,
    Loss,
    Draw,
}

impl Score {
    pub fn value(self) -> f64 {
        match self {
            Self::Win => 1.0,
            Self::Loss => 0.0,
            Self::Draw => 0.5,
        }
    }
    /// The same game from the other side of the board.
    pub fn flip(self) -> Self {
        match self {
            Self::Win => Self::Loss,
            Self::Loss => Self::Win,
            Self::Draw => Self::Draw,
        }
    }
    pub fn won(self) -> bool {
        self == Self::Win
    }
}
