use super::*;
use sm_core::*;
use sm_pg::*;
use std::sync::Arc;
use tokio_postgres::Client;

#[async_trait::async_trait]
impl AuthRepository for Arc<Client> {
    async fn signin(&self, session: &Session) -> Result<(), Error> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                SESSIONS,
                " (id, account_id, token_hash, expires_at) VALUES ($1, $2, $3, $4)"
            ),
            &[
                &session.id().inner(),
                &session.account().inner(),
                &session.hash(),
                &session.expires_at(),
            ],
        )
        .await
        .map(|_| ())
        .map_err(Error::from)
    }
    async fn fetch(&self, id: ID<Session>) -> Result<Option<Session>, Error> {
        self.query_opt(
            const_format::concatcp!(
                "SELECT id, account_id, token_hash, expires_at, revoked FROM ",
                SESSIONS,
                " WHERE id = $1"
            ),
            &[&id.inner()],
        )
        .await
        .map(|opt| opt.as_ref().map(Session::from))
        .map_err(Error::from)
    }
    async fn revoke(&self, id: ID<Session>) -> Result<(), Error> {
        let n = self
            .execute(
                const_format::concatcp!("UPDATE ", SESSIONS, " SET revoked = TRUE WHERE id = $1"),
                &[&id.inner()],
            )
            .await?;
        match n {
            1 => Ok(()),
            _ => Err(Error::NotFound),
        }
    }
}
