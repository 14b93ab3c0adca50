use super::*;
use serde::Serialize;
use sm_core::*;

/// An open game as shown in the lobby.
///
/// `gap` is the distance between the viewer's rating and the creator's.
/// Joining across [`MAX_RATING_GAP`] is allowed; clients use `matched` to
/// ask for confirmation first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(flatten)]
    pub game: Game,
    pub creator_name: String,
    pub creator_rating: Rating,
    pub gap: Option<Rating>,
    pub matched: bool,
}

impl Listing {
    pub fn new(game: Game, creator_name: String, creator_rating: Rating, viewer: Option<Rating>) -> Self {
        let gap = viewer.map(|r| (r - creator_rating).abs());
        Self {
            game,
            creator_name,
            creator_rating,
            gap,
            matched: gap.is_none_or(|g| g <= MAX_RATING_GAP),
        }
    }
}

/// Totals over every game ever created. `volume` sums the wagers of
/// completed games.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub games: i64,
    pub volume: Amount,
}

/// Result of joining a game.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Joined {
    pub game: Game,
    pub gap: Rating,
    pub matched: bool,
}

/// Result of recording a move.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Played {
    #[serde(rename = "move")]
    pub entry: Move,
    pub game: Game,
}
