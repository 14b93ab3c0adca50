use super::*;

/// External identity provider.
///
/// Accounts are never provisioned here. The provider vouches that whoever
/// presents `proof` controls `external`, and the ledger opens or finds the
/// matching account.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    async fn verify(&self, external: &str, proof: &str) -> bool;
}

/// Proofs are `hex(sha256(secret ‖ external))`, minted by a trusted
/// frontend that shares `secret` with this server. Without a secret
/// every proof is refused.
pub struct Shared {
    secret: Vec<u8>,
}

impl Shared {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: secret.to_vec(),
        }
    }
    pub fn from_env() -> Self {
        let secret = std::env::var("IDENTITY_SECRET").unwrap_or_else(|_| {
            log::warn!("[auth] IDENTITY_SECRET is not set, logins are disabled");
            String::default()
        });
        Self::new(secret.as_bytes())
    }
    pub fn prove(&self, external: &str) -> String {
        use sha2::Digest;
        let digest = sha2::Sha256::new()
            .chain_update(&self.secret)
            .chain_update(external.as_bytes())
            .finalize();
        hex(&digest)
    }
}

#[async_trait::async_trait]
impl Provider for Shared {
    async fn verify(&self, external: &str, proof: &str) -> bool {
        !self.secret.is_empty()
            && !external.is_empty()
            && self.prove(external).eq_ignore_ascii_case(proof.trim())
    }
}
