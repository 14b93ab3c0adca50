use super::*;
use actix_web::FromRequest;
use actix_web::HttpRequest;
use actix_web::dev::Payload;
use actix_web::web;
use sm_core::Error;
use sm_core::ID;
use sm_ledger::Account;
use std::future::Future;
use std::pin::Pin;

/// Extractor for authenticated requests.
/// Validates the bearer token and checks its session is still live.
pub struct Auth(pub Claims);

impl Auth {
    pub fn claims(&self) -> &Claims {
        &self.0
    }
    pub fn account(&self) -> ID<Account> {
        self.0.account()
    }
}

/// The raw bearer token of a request, if any.
pub fn bearer(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_owned())
}

impl FromRequest for Auth {
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;
    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let authority = req.app_data::<web::Data<Authority>>().cloned();
        let token = bearer(req);
        Box::pin(async move {
            let token = token.ok_or(Failure(Error::Unauthorized))?;
            let authority = authority.ok_or_else(|| {
                actix_web::error::ErrorInternalServerError("authority not configured")
            })?;
            let claims = authority.verify(&token).await.map_err(Failure)?;
            Ok(Auth(claims))
        })
    }
}

/// Optional authentication extractor - does not fail if unauthenticated.
pub struct MaybeAuth(pub Option<Claims>);

impl MaybeAuth {
    pub fn claims(&self) -> Option<&Claims> {
        self.0.as_ref()
    }
    pub fn account(&self) -> Option<ID<Account>> {
        self.0.as_ref().map(|c| c.account())
    }
}

impl FromRequest for MaybeAuth {
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;
    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let auth_future = Auth::from_request(req, payload);
        Box::pin(async move {
            match auth_future.await {
                Ok(Auth(claims)) => Ok(MaybeAuth(Some(claims))),
                Err(_) => Ok(MaybeAuth(None)),
            }
        })
    }
}
