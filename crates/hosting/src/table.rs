use super::*;
use sm_core::*;
use sm_gameroom::Game;
use sm_ledger::Account;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

pub type Tx = UnboundedSender<String>;

struct Link {
    conn: ID<Connection>,
    tx: Tx,
    room: Option<ID<Game>>,
}

/// Who is connected, which room they are in, and whose grace timer is running.
///
/// One live link per account. Every method is a plain synchronous update so
/// that the [`Hub`] can apply it under a single lock.
#[derive(Default)]
pub struct Table {
    links: HashMap<ID<Account>, Link>,
    timers: HashMap<(ID<Account>, ID<Game>), u64>,
    epoch: u64,
}

impl Table {
    /// Makes `conn` the account's live link. Returns whether an older link
    /// was replaced.
    pub fn bind(&mut self, account: ID<Account>, conn: ID<Connection>, tx: Tx) -> bool {
        let room = self.links.get(&account).and_then(|l| l.room);
        self.links
            .insert(account, Link { conn, tx, room })
            .is_some()
    }
    /// Drops the account's link if it still belongs to `conn`, returning
    /// the room it was in.
    pub fn unbind(&mut self, account: ID<Account>, conn: ID<Connection>) -> Option<Option<ID<Game>>> {
        match self.links.get(&account) {
            Some(link) if link.conn == conn => self.links.remove(&account).map(|l| l.room),
            _ => None,
        }
    }
    pub fn enter(&mut self, account: ID<Account>, game: ID<Game>) {
        if let Some(link) = self.links.get_mut(&account) {
            link.room = Some(game);
        }
    }
    pub fn room(&self, account: ID<Account>) -> Option<ID<Game>> {
        self.links.get(&account).and_then(|l| l.room)
    }
    pub fn is_bound(&self, account: ID<Account>) -> bool {
        self.links.contains_key(&account)
    }
    pub fn send(&self, account: ID<Account>, message: &ServerMessage) {
        if let Some(link) = self.links.get(&account) {
            let _ = link.tx.send(message.to_json());
        }
    }
    /// Sends to every connection in `game`'s room.
    pub fn broadcast(&self, game: ID<Game>, message: &ServerMessage) {
        let json = message.to_json();
        for link in self.links.values().filter(|l| l.room == Some(game)) {
            let _ = link.tx.send(json.clone());
        }
    }
    /// Starts a grace timer for `account` in `game`, superseding any
    /// earlier one for the same pair.
    pub fn arm(&mut self, account: ID<Account>, game: ID<Game>) -> u64 {
        self.epoch += 1;
        self.timers.insert((account, game), self.epoch);
        self.epoch
    }
    /// Stops every grace timer the account has running, returning their games.
    pub fn disarm(&mut self, account: ID<Account>) -> Vec<ID<Game>> {
        let games = self
            .timers
            .keys()
            .filter(|(a, _)| *a == account)
            .map(|(_, g)| *g)
            .collect::<Vec<_>>();
        for game in games.iter() {
            self.timers.remove(&(account, *game));
        }
        games
    }
    /// Claims an expired timer. Only the timer armed at `epoch` may fire.
    pub fn expire(&mut self, account: ID<Account>, game: ID<Game>, epoch: u64) -> bool {
        match self.timers.get(&(account, game)) {
            Some(&armed) if armed == epoch => self.timers.remove(&(account, game)).is_some(),
            _ => false,
        }
    }
    /// Stops every grace timer running against `game`.
    pub fn settle(&mut self, game: ID<Game>) {
        self.timers.retain(|(_, g), _| *g != game);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn stale_connections_cannot_unbind_their_successor() {
        let mut table = Table::default();
        let account = ID::default();
        let game = ID::default();
        let (old, new) = (ID::default(), ID::default());
        let (tx, _rx) = unbounded_channel();
        assert!(!table.bind(account, old, tx.clone()));
        table.enter(account, game);
        assert!(table.bind(account, new, tx));
        assert_eq!(table.room(account), Some(game));
        assert_eq!(table.unbind(account, old), None);
        assert!(table.is_bound(account));
        assert_eq!(table.unbind(account, new), Some(Some(game)));
        assert!(!table.is_bound(account));
    }
    #[test]
    fn only_the_latest_timer_fires() {
        let mut table = Table::default();
        let account = ID::default();
        let game = ID::default();
        let first = table.arm(account, game);
        let second = table.arm(account, game);
        assert!(!table.expire(account, game, first));
        assert!(table.expire(account, game, second));
        assert!(!table.expire(account, game, second));
        let third = table.arm(account, game);
        assert_eq!(table.disarm(account), vec![game]);
        assert!(!table.expire(account, game, third));
    }
    #[test]
    fn timers_run_per_game() {
        let mut table = Table::default();
        let account = ID::default();
        let (one, two) = (ID::default(), ID::default());
        let first = table.arm(account, one);
        let second = table.arm(account, two);
        table.settle(one);
        assert!(!table.expire(account, one, first));
        assert!(table.expire(account, two, second));
        assert!(table.disarm(account).is_empty());
    }
    #[test]
    fn broadcasts_reach_the_room_only() {
        let mut table = Table::default();
        let (a, b, c) = (ID::default(), ID::default(), ID::default());
        let game = ID::default();
        let (tx_a, mut rx_a) = unbounded_channel();
        let (tx_b, mut rx_b) = unbounded_channel();
        let (tx_c, mut rx_c) = unbounded_channel();
        table.bind(a, ID::default(), tx_a);
        table.bind(b, ID::default(), tx_b);
        table.bind(c, ID::default(), tx_c);
        table.enter(a, game);
        table.enter(b, game);
        table.broadcast(game, &ServerMessage::OpponentReconnected);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
        assert!(rx_c.try_recv().is_err());
    }
}
