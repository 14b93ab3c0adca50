//! Stakemate backend binary.
//!
//! Serves the HTTP API and the `/ws` endpoint on `BIND_ADDR`
//! (default `0.0.0.0:8080`), backed by PostgreSQL when `DB_URL` is set.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sm_core::log();
    sm_core::kys();
    sm_server::run().await
}
