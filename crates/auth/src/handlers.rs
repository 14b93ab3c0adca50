use super::*;
use actix_web::HttpResponse;
use actix_web::web;

pub async fn login(
    authority: web::Data<Authority>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, Failure> {
    let (token, account) = authority
        .login(&req.external_id, &req.proof, &req.name)
        .await?;
    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        account: AccountInfo::from(&account),
    }))
}

pub async fn logout(authority: web::Data<Authority>, auth: Auth) -> Result<HttpResponse, Failure> {
    authority.logout(auth.claims()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"status": "logged_out"})))
}

pub async fn me(authority: web::Data<Authority>, auth: Auth) -> Result<HttpResponse, Failure> {
    let account = authority.ledger().account(auth.account()).await?;
    Ok(HttpResponse::Ok().json(AccountInfo::from(&account)))
}
