use super::*;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::web;
use sm_auth::Auth;
use sm_auth::Crypto;
use sm_auth::Failure;
use sm_core::Error;
use sm_core::ID;
use sm_wallet::Cashier;
use sm_wallet::Kind;
use sm_wallet::Transfer;

/// Header carrying the shared secret on processor callbacks.
pub const WEBHOOK_HEADER: &str = "X-Webhook-Secret";

/// Shared secret for processor callbacks, held as its sha256 digest.
/// Without one every callback is refused.
#[derive(Clone, Debug, Default)]
pub struct Webhook(Option<Vec<u8>>);

impl Webhook {
    pub fn new(secret: impl AsRef<str>) -> Self {
        Self(Some(Crypto::hash(secret.as_ref())))
    }
    pub fn from_env() -> Self {
        match std::env::var("WEBHOOK_SECRET") {
            Ok(secret) if !secret.is_empty() => Self::new(secret),
            _ => {
                log::warn!("[wallet] WEBHOOK_SECRET not set, transfer confirmations are disabled");
                Self(None)
            }
        }
    }
    fn admit(&self, req: &HttpRequest) -> Result<(), Error> {
        let given = req
            .headers()
            .get(WEBHOOK_HEADER)
            .and_then(|h| h.to_str().ok());
        match (self.0.as_deref(), given) {
            (Some(digest), Some(given)) if Self::same(digest, &Crypto::hash(given)) => Ok(()),
            _ => Err(Error::Unauthorized),
        }
    }
    /// Digests are fixed-length, so every byte is compared regardless of
    /// where the first mismatch is.
    fn same(a: &[u8], b: &[u8]) -> bool {
        a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

fn transfer(path: web::Path<uuid::Uuid>) -> ID<Transfer> {
    ID::from(path.into_inner())
}

pub async fn balance(cashier: web::Data<Cashier>, auth: Auth) -> Result<HttpResponse, Failure> {
    let balance = cashier.balance(auth.account()).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse { balance }))
}

pub async fn transactions(cashier: web::Data<Cashier>, auth: Auth) -> Result<HttpResponse, Failure> {
    Ok(HttpResponse::Ok().json(cashier.history(auth.account()).await?))
}

pub async fn deposit(
    cashier: web::Data<Cashier>,
    auth: Auth,
    req: web::Json<DepositRequest>,
) -> Result<HttpResponse, Failure> {
    let req = req.into_inner();
    let transfer = cashier
        .deposit(auth.account(), req.amount, req.method, req.reference)
        .await?;
    Ok(HttpResponse::Created().json(transfer))
}

pub async fn withdraw(
    cashier: web::Data<Cashier>,
    auth: Auth,
    req: web::Json<WithdrawalRequest>,
) -> Result<HttpResponse, Failure> {
    let transfer = cashier
        .withdraw(auth.account(), req.amount, &req.address)
        .await?;
    Ok(HttpResponse::Created().json(transfer))
}

pub async fn intent(
    cashier: web::Data<Cashier>,
    auth: Auth,
    req: web::Json<IntentRequest>,
) -> Result<HttpResponse, Failure> {
    let (transfer, client_secret) = cashier.intent(auth.account(), req.amount).await?;
    Ok(HttpResponse::Created().json(IntentResponse {
        transfer,
        client_secret,
    }))
}

async fn resolve(
    cashier: &Cashier,
    webhook: &Webhook,
    req: &HttpRequest,
    id: ID<Transfer>,
    kind: Kind,
    body: Option<ConfirmRequest>,
) -> Result<HttpResponse, Failure> {
    webhook.admit(req)?;
    let transfer = match body {
        Some(body) => cashier.complete(id, kind, body.reference).await?,
        None => cashier.fail(id, kind).await?,
    };
    Ok(HttpResponse::Ok().json(transfer))
}

pub async fn confirm_deposit(
    cashier: web::Data<Cashier>,
    webhook: web::Data<Webhook>,
    req: HttpRequest,
    path: web::Path<uuid::Uuid>,
    body: Option<web::Json<ConfirmRequest>>,
) -> Result<HttpResponse, Failure> {
    let body = body.map(|b| b.into_inner()).unwrap_or_default();
    resolve(&cashier, &webhook, &req, transfer(path), Kind::Deposit, Some(body)).await
}

pub async fn fail_deposit(
    cashier: web::Data<Cashier>,
    webhook: web::Data<Webhook>,
    req: HttpRequest,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, Failure> {
    resolve(&cashier, &webhook, &req, transfer(path), Kind::Deposit, None).await
}

pub async fn confirm_withdrawal(
    cashier: web::Data<Cashier>,
    webhook: web::Data<Webhook>,
    req: HttpRequest,
    path: web::Path<uuid::Uuid>,
    body: Option<web::Json<ConfirmRequest>>,
) -> Result<HttpResponse, Failure> {
    let body = body.map(|b| b.into_inner()).unwrap_or_default();
    resolve(&cashier, &webhook, &req, transfer(path), Kind::Withdrawal, Some(body)).await
}

pub async fn fail_withdrawal(
    cashier: web::Data<Cashier>,
    webhook: web::Data<Webhook>,
    req: HttpRequest,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, Failure> {
    resolve(&cashier, &webhook, &req, transfer(path), Kind::Withdrawal, None).await
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/wallet")
            .route("/balance", web::get().to(balance))
            .route("/transactions", web::get().to(transactions))
            .route("/deposits", web::post().to(deposit))
            .route("/withdrawals", web::post().to(withdraw))
            .route("/intent", web::post().to(intent))
            .route("/deposits/{id}/confirm", web::post().to(confirm_deposit))
            .route("/deposits/{id}/fail", web::post().to(fail_deposit))
            .route("/withdrawals/{id}/confirm", web::post().to(confirm_withdrawal))
            .route("/withdrawals/{id}/fail", web::post().to(fail_withdrawal)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn knock(webhook: &Webhook, secret: Option<&str>) -> Result<(), Error> {
        let req = match secret {
            Some(secret) => TestRequest::default().insert_header((WEBHOOK_HEADER, secret)),
            None => TestRequest::default(),
        };
        webhook.admit(&req.to_http_request())
    }

    #[test]
    fn webhook_admits_only_the_exact_secret() {
        let webhook = Webhook::new("processor-secret");
        assert_eq!(knock(&webhook, Some("processor-secret")), Ok(()));
        assert_eq!(knock(&webhook, Some("processor-secreT")), Err(Error::Unauthorized));
        assert_eq!(knock(&webhook, Some("processor")), Err(Error::Unauthorized));
        assert_eq!(knock(&webhook, Some("")), Err(Error::Unauthorized));
        assert_eq!(knock(&webhook, None), Err(Error::Unauthorized));
        assert_eq!(knock(&Webhook::default(), Some("")), Err(Error::Unauthorized));
    }
}
