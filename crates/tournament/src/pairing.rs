use super::*;
use serde::Serialize;
use sm_core::*;
use sm_gameroom::Game;
use sm_ledger::Account;

/// One slot of a bracket round: a game between two entrants, or a bye.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pairing {
    id: ID<Self>,
    tournament: ID<Tournament>,
    round: Round,
    home: ID<Account>,
    away: Option<ID<Account>>,
    game: Option<ID<Game>>,
    winner: Option<ID<Account>>,
}

impl Pairing {
    pub fn matched(tournament: ID<Tournament>, round: Round, game: &Game) -> Self {
        Self {
            id: ID::default(),
            tournament,
            round,
            home: game.creator(),
            away: game.opponent(),
            game: Some(game.id()),
            winner: None,
        }
    }
    /// A bye advances `home` without playing.
    pub fn bye(tournament: ID<Tournament>, round: Round, home: ID<Account>) -> Self {
        Self {
            id: ID::default(),
            tournament,
            round,
            home,
            away: None,
            game: None,
            winner: Some(home),
        }
    }
    pub fn tournament(&self) -> ID<Tournament> {
        self.tournament
    }
    pub fn round(&self) -> Round {
        self.round
    }
    pub fn home(&self) -> ID<Account> {
        self.home
    }
    pub fn away(&self) -> Option<ID<Account>> {
        self.away
    }
    pub fn game(&self) -> Option<ID<Game>> {
        self.game
    }
    pub fn winner(&self) -> Option<ID<Account>> {
        self.winner
    }
    pub fn is_bye(&self) -> bool {
        self.away.is_none()
    }
    pub fn is_resolved(&self) -> bool {
        self.winner.is_some()
    }
    /// The entrant who did not win.
    pub fn loser(&self) -> Option<ID<Account>> {
        match (self.winner, self.away) {
            (Some(w), Some(away)) if w == self.home => Some(away),
            (Some(_), Some(_)) => Some(self.home),
            _ => None,
        }
    }
    pub fn resolve(&mut self, winner: ID<Account>) -> Result<(), Error> {
        if winner != self.home && Some(winner) != self.away {
            return Err(Error::NotAParticipant);
        }
        self.winner = Some(winner);
        Ok(())
    }
    /// Points the pairing at a replayed game after a drawn one.
    pub fn rematch(&mut self, game: &Game) {
        self.game = Some(game.id());
    }
}

impl Unique for Pairing {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

/// Pairs entrants in seed order, 1 vs 2, 3 vs 4 and so on.
/// With an odd count the last seed receives the bye.
pub fn bracket(seeded: &[ID<Account>]) -> (Vec<(ID<Account>, ID<Account>)>, Option<ID<Account>>) {
    let pairs = seeded
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .collect();
    let bye = match seeded.len() % 2 {
        1 => seeded.last().copied(),
        _ => None,
    };
    (pairs, bye)
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use sm_pg::*;

    impl Schema for Pairing {
        fn name() -> &'static str {
            PAIRINGS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                PAIRINGS,
                " (
                    id              UUID PRIMARY KEY,
                    tournament_id   UUID NOT NULL REFERENCES ",
                TOURNAMENTS,
                "(id) ON DELETE CASCADE,
                    round           INTEGER NOT NULL,
                    home            UUID NOT NULL,
                    away            UUID,
                    game_id         UUID REFERENCES ",
                GAMES,
                "(id),
                    winner          UUID
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_pairings_tournament ON ",
                PAIRINGS,
                " (tournament_id, round);
                 CREATE INDEX IF NOT EXISTS idx_pairings_game ON ",
                PAIRINGS,
                " (game_id);"
            )
        }
    }

    impl From<&tokio_postgres::Row> for Pairing {
        fn from(row: &tokio_postgres::Row) -> Self {
            Self {
                id: ID::from(row.get::<_, uuid::Uuid>(0)),
                tournament: ID::from(row.get::<_, uuid::Uuid>(1)),
                round: row.get::<_, Round>(2),
                home: ID::from(row.get::<_, uuid::Uuid>(3)),
                away: row.get::<_, Option<uuid::Uuid>>(4).map(ID::from),
                game: row.get::<_, Option<uuid::Uuid>>(5).map(ID::from),
                winner: row.get::<_, Option<uuid::Uuid>>(6).map(ID::from),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entrant_appears_once() {
        for n in 2..=9 {
            let seeded = (0..n).map(|_| ID::default()).collect::<Vec<ID<Account>>>();
            let (pairs, bye) = bracket(&seeded);
            let mut seen = pairs.iter().flat_map(|&(a, b)| [a, b]).collect::<Vec<_>>();
            seen.extend(bye);
            seen.sort();
            let mut expected = seeded.clone();
            expected.sort();
            assert_eq!(seen, expected);
            assert_eq!(bye.is_some(), n % 2 == 1);
        }
    }
    #[test]
    fn pairs_follow_seed_order() {
        let seeded = (0..5).map(|_| ID::default()).collect::<Vec<ID<Account>>>();
        let (pairs, bye) = bracket(&seeded);
        assert_eq!(pairs, vec![(seeded[0], seeded[1]), (seeded[2], seeded[3])]);
        assert_eq!(bye, Some(seeded[4]));
    }
    #[test]
    fn losers_and_byes() {
        let t = ID::default();
        let (a, b) = (ID::default(), ID::default());
        let game = Game::bracket(a, b, Default::default());
        let mut pairing = Pairing::matched(t, 1, &game);
        assert_eq!(pairing.loser(), None);
        pairing.resolve(b).unwrap();
        assert_eq!(pairing.loser(), Some(a));
        assert!(pairing.resolve(ID::default()).is_err());
        let bye = Pairing::bye(t, 1, a);
        assert!(bye.is_resolved() && bye.is_bye());
        assert_eq!(bye.loser(), None);
    }
}
