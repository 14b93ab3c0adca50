use super::*;
use sm_core::*;
use sm_ledger::*;
use std::sync::Arc;

/// Issues, verifies and revokes session tokens.
///
/// A token is only as good as its session row: [`verify`](Self::verify)
/// rejects tokens whose session was revoked even if the signature and
/// expiry still check out.
pub struct Authority {
    crypto: Crypto,
    ledger: Ledger,
    provider: Arc<dyn Provider>,
    sessions: Arc<dyn AuthRepository>,
}

impl Authority {
    pub fn new(
        crypto: Crypto,
        ledger: Ledger,
        provider: Arc<dyn Provider>,
        sessions: Arc<dyn AuthRepository>,
    ) -> Self {
        Self {
            crypto,
            ledger,
            provider,
            sessions,
        }
    }

    /// Trades a provider proof for a session token, opening the account on
    /// first login.
    pub async fn login(&self, external: &str, proof: &str, name: &str) -> Result<(String, Account), Error> {
        if !self.provider.verify(external, proof).await {
            log::warn!("[auth] rejected proof for {}", external);
            return Err(Error::Unauthorized);
        }
        let account = self.ledger.open(external, name).await?;
        if !account.active() {
            return Err(Error::Unauthorized);
        }
        let sid = ID::<Session>::default();
        let claims = Claims::new(account.id(), sid, account.name().to_string());
        let token = self
            .crypto
            .encode(&claims)
            .map_err(|e| Error::Storage(e.to_string()))?;
        self.sessions
            .signin(&Session::new(sid, account.id(), Crypto::hash(&token)))
            .await?;
        log::info!("[auth] {} signed in as {}", external, account.id());
        Ok((token, account))
    }

    pub async fn verify(&self, token: &str) -> Result<Claims, Error> {
        let claims = self.crypto.decode(token).map_err(|_| Error::Unauthorized)?;
        if claims.expired() {
            return Err(Error::Unauthorized);
        }
        match self.sessions.fetch(claims.session()).await? {
            Some(s) if s.is_live() && s.hash() == Crypto::hash(token).as_slice() => Ok(claims),
            _ => Err(Error::Unauthorized),
        }
    }

    pub async fn logout(&self, claims: &Claims) -> Result<(), Error> {
        self.sessions.revoke(claims.session()).await?;
        log::info!("[auth] {} signed out", claims.account());
        Ok(())
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}
