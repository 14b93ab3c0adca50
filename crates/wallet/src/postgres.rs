use super::*;
use sm_core::*;
use sm_ledger::Account;
use sm_pg::*;
use std::sync::Arc;
use tokio_postgres::Client;

#[rustfmt::skip]
const COLUMNS: &str = "id, account_id, kind, amount, method, address, reference, status, created, resolved";

#[async_trait::async_trait]
impl TransferRepository for Arc<Client> {
    async fn create(&self, t: &Transfer) -> Result<(), Error> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                TRANSFERS,
                " (",
                COLUMNS,
                ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
            ),
            &[
                &t.id().inner(),
                &t.account().inner(),
                &t.kind().as_str(),
                &t.amount().inner(),
                &t.method().as_str(),
                &t.address(),
                &t.reference(),
                &t.status().as_str(),
                &t.created(),
                &t.resolved(),
            ],
        )
        .await
        .map(|_| ())
        .map_err(Error::from)
    }
    async fn fetch(&self, id: ID<Transfer>) -> Result<Option<Transfer>, Error> {
        self.query_opt(
            const_format::concatcp!("SELECT ", COLUMNS, " FROM ", TRANSFERS, " WHERE id = $1"),
            &[&id.inner()],
        )
        .await?
        .as_ref()
        .map(Transfer::try_from)
        .transpose()
    }
    async fn resolve(&self, t: &Transfer) -> Result<bool, Error> {
        let n = self
            .execute(
                const_format::concatcp!(
                    "UPDATE ",
                    TRANSFERS,
                    " SET status = $2, reference = $3, resolved = $4",
                    " WHERE id = $1 AND status = 'pending'"
                ),
                &[
                    &t.id().inner(),
                    &t.status().as_str(),
                    &t.reference(),
                    &t.resolved(),
                ],
            )
            .await?;
        Ok(n == 1)
    }
    async fn history(&self, account: ID<Account>, limit: i64) -> Result<Vec<Transfer>, Error> {
        self.query(
            const_format::concatcp!(
                "SELECT ",
                COLUMNS,
                " FROM ",
                TRANSFERS,
                " WHERE account_id = $1 ORDER BY created DESC LIMIT $2"
            ),
            &[&account.inner(), &limit],
        )
        .await?
        .iter()
        .map(Transfer::try_from)
        .collect()
    }
}
