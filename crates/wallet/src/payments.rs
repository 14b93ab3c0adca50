use sm_core::*;

/// A card payment the client still has to authorize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    /// Processor-side id, echoed back on confirmation.
    pub reference: String,
    /// Handed to the client to complete the payment.
    pub secret: String,
}

/// Card payment processor.
#[async_trait::async_trait]
pub trait Payments: Send + Sync {
    async fn intent(&self, amount: Amount) -> Result<Intent, Error>;
}

/// Mints intents locally. Nothing is charged; confirmations come from the
/// webhook endpoint exactly as they would from a real processor.
#[derive(Default)]
pub struct Sandbox;

#[async_trait::async_trait]
impl Payments for Sandbox {
    async fn intent(&self, amount: Amount) -> Result<Intent, Error> {
        let reference = format!("pi_{}", uuid::Uuid::new_v4().simple());
        let secret = format!("{}_secret_{}", reference, uuid::Uuid::new_v4().simple());
        log::debug!("[wallet] sandbox intent {} for {} SOL", reference, amount);
        Ok(Intent { reference, secret })
    }
}
