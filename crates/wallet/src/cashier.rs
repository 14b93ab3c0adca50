use super::*;
use sm_core::*;
use sm_ledger::*;
use std::sync::Arc;

const HISTORY_LIMIT: i64 = 100;

/// Moves funds between the outside world and custodial balances.
///
/// Deposits credit the ledger only when confirmed. Withdrawals debit it up
/// front, so the funds cannot be wagered while the payout is in flight, and
/// are refunded if the payout fails. A transfer resolves at most once.
#[derive(Clone)]
pub struct Cashier {
    ledger: Ledger,
    repo: Arc<dyn TransferRepository>,
    payments: Arc<dyn Payments>,
}

impl Cashier {
    pub fn new(ledger: Ledger, repo: Arc<dyn TransferRepository>, payments: Arc<dyn Payments>) -> Self {
        Self {
            ledger,
            repo,
            payments,
        }
    }

    /// Records an incoming deposit awaiting confirmation.
    pub async fn deposit(
        &self,
        account: ID<Account>,
        amount: Amount,
        method: Method,
        reference: Option<String>,
    ) -> Result<Transfer, Error> {
        self.ledger.account(account).await?;
        let transfer = Transfer::deposit(account, amount, method, reference)?;
        self.repo.create(&transfer).await?;
        log::info!("[wallet] {} requested deposit {} of {} SOL", account, transfer.id(), amount);
        Ok(transfer)
    }

    /// Opens a card payment and records the matching pending deposit.
    pub async fn intent(&self, account: ID<Account>, amount: Amount) -> Result<(Transfer, String), Error> {
        if !amount.is_positive() {
            return Err(Error::invalid("amount must be positive"));
        }
        let Intent { reference, secret } = self.payments.intent(amount).await?;
        let transfer = self.deposit(account, amount, Method::Card, Some(reference)).await?;
        Ok((transfer, secret))
    }

    /// Debits `amount` and records a withdrawal to `address`.
    pub async fn withdraw(&self, account: ID<Account>, amount: Amount, address: &str) -> Result<Transfer, Error> {
        let transfer = Transfer::withdrawal(account, amount, address)?;
        self.ledger.debit(account, amount).await?;
        if let Err(e) = self.repo.create(&transfer).await {
            let _ = self
                .ledger
                .refund(account, amount, "withdrawal rollback")
                .await;
            return Err(e);
        }
        log::info!("[wallet] {} requested withdrawal {} of {} SOL", account, transfer.id(), amount);
        Ok(transfer)
    }

    /// Confirms a pending transfer of the given `kind`. Deposits are credited.
    pub async fn complete(&self, id: ID<Transfer>, kind: Kind, reference: Option<String>) -> Result<Transfer, Error> {
        let transfer = self.pending(id, kind).await?;
        let next = transfer.complete(reference)?;
        if !self.repo.resolve(&next).await? {
            return Err(Error::AlreadySettled);
        }
        if kind == Kind::Deposit {
            if let Err(e) = self.ledger.credit(next.account(), next.amount()).await {
                log::error!(
                    "RECONCILE deposit {} of {} SOL to {} confirmed but not credited: {:?}",
                    next.id(),
                    next.amount(),
                    next.account(),
                    e
                );
                return Err(e);
            }
        }
        log::info!("[wallet] {} {} completed", kind.as_str(), id);
        Ok(next)
    }

    /// Fails a pending transfer of the given `kind`. Withdrawals are refunded.
    pub async fn fail(&self, id: ID<Transfer>, kind: Kind) -> Result<Transfer, Error> {
        let transfer = self.pending(id, kind).await?;
        let next = transfer.fail()?;
        if !self.repo.resolve(&next).await? {
            return Err(Error::AlreadySettled);
        }
        if kind == Kind::Withdrawal {
            self.ledger
                .refund(next.account(), next.amount(), &format!("withdrawal {} failed", id))
                .await?;
        }
        log::info!("[wallet] {} {} failed", kind.as_str(), id);
        Ok(next)
    }

    pub async fn history(&self, account: ID<Account>) -> Result<Vec<Transfer>, Error> {
        self.repo.history(account, HISTORY_LIMIT).await
    }

    pub async fn balance(&self, account: ID<Account>) -> Result<Amount, Error> {
        self.ledger.balance(account).await
    }

    async fn pending(&self, id: ID<Transfer>, kind: Kind) -> Result<Transfer, Error> {
        match self.repo.fetch(id).await? {
            Some(t) if t.kind() == kind => Ok(t),
            _ => Err(Error::NotFound),
        }
    }
}
