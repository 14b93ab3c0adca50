use super::*;

/// Notified after a game reaches a terminal state.
///
/// Called outside the game's lock, at most once per game, with the final
/// snapshot. Implementations may call back into the registry.
#[async_trait::async_trait]
pub trait Observer: Send + Sync {
    async fn finished(&self, game: &Game);
}
