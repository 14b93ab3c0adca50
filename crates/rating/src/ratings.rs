use super::*;
use sm_core::*;
use sm_ledger::*;

/// Applies ELO updates for finished games.
///
/// Callers guarantee at-most-once per game; this service only computes
/// both deltas from the pre-game ratings and writes each side through the
/// ledger's compare-and-swap.
#[derive(Clone)]
pub struct Ratings {
    ledger: Ledger,
}

impl Ratings {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    /// Rates a game between `a` and `b` where `score` is `a`'s result.
    /// Returns the deltas applied to `a` and `b`.
    pub async fn update(
        &self,
        a: ID<Account>,
        b: ID<Account>,
        score: Score,
    ) -> Result<(Rating, Rating), Error> {
        let x = self.ledger.account(a).await?;
        let y = self.ledger.account(b).await?;
        let dx = elo::delta(x.rating(), y.rating(), x.games(), score);
        let dy = elo::delta(y.rating(), x.rating(), y.games(), score.flip());
        self.ledger
            .update(a, |acc| Ok(acc.rated(dx, score.won())))
            .await?;
        self.ledger
            .update(b, |acc| Ok(acc.rated(dy, score.flip().won())))
            .await?;
        log::info!(
            "[rating] {} {:+} ({}), {} {:+} ({})",
            a,
            dx,
            x.rating() + dx,
            b,
            dy,
            y.rating() + dy
        );
        Ok((dx, dy))
    }
}
