use sm_core::*;

/// Standard starting position.
pub const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// How a move ended the game, from the mover's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    MoverWins,
    Draw,
}

/// The oracle's ruling on one move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub position: String,
    pub ending: Option<Ending>,
}

/// External chess rules oracle.
///
/// Given the current position and a move in the client's notation, either
/// rejects the move with [`Error::IllegalMove`] or returns the resulting
/// position and whether the game is over.
pub trait Rules: Send + Sync {
    fn apply(&self, position: &str, notation: &str, ply: Ply) -> Result<Verdict, Error>;
}

/// Accepts any well-formed move token and never ends the game.
/// The position is carried through unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct Permissive;

impl Rules for Permissive {
    fn apply(&self, position: &str, notation: &str, _: Ply) -> Result<Verdict, Error> {
        match notation.trim() {
            "" => Err(Error::IllegalMove("empty move".into())),
            s if s.len() > 16 || s.chars().any(char::is_whitespace) => {
                Err(Error::IllegalMove(format!("unreadable move {:?}", s)))
            }
            _ => Ok(Verdict {
                position: position.to_string(),
                ending: None,
            }),
        }
    }
}
