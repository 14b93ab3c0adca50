use super::Score;
use sm_core::*;

/// Probability that a player rated `rating` beats one rated `other`.
pub fn expected(rating: Rating, other: Rating) -> f64 {
    1.0 / (1.0 + 10f64.powf((other - rating) as f64 / 400.0))
}

/// Development coefficient for a player with `games` finished games.
pub fn k(games: i32, rating: Rating) -> f64 {
    if games < PROVISIONAL_GAMES {
        K_PROVISIONAL
    } else if rating < MASTER_RATING {
        K_ESTABLISHED
    } else {
        K_MASTER
    }
}

/// Rating change for one side of a finished game.
pub fn delta(rating: Rating, other: Rating, games: i32, score: Score) -> Rating {
    (k(games, rating) * (score.value() - expected(rating, other))).round() as Rating
}
