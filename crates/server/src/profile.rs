use super::*;
use actix_web::HttpResponse;
use actix_web::web;
use sm_auth::AccountInfo;
use sm_auth::Auth;
use sm_auth::Failure;
use sm_core::*;
use sm_gameroom::Registry;
use sm_ledger::Ledger;
use sm_tournament::Tournaments;

pub async fn profile(ledger: web::Data<Ledger>, auth: Auth) -> Result<HttpResponse, Failure> {
    let account = ledger.account(auth.account()).await?;
    Ok(HttpResponse::Ok().json(AccountInfo::from(&account)))
}

/// The caller's finished and ongoing games, newest first.
pub async fn history(registry: web::Data<Registry>, auth: Auth) -> Result<HttpResponse, Failure> {
    Ok(HttpResponse::Ok().json(registry.history(auth.account()).await?))
}

/// Seeds the rating from an external lookup. Only accounts without rated
/// games may be seeded.
pub async fn rating(
    ledger: web::Data<Ledger>,
    auth: Auth,
    req: web::Json<RatingRequest>,
) -> Result<HttpResponse, Failure> {
    let account = ledger.seed(auth.account(), req.rating).await?;
    Ok(HttpResponse::Ok().json(AccountInfo::from(&account)))
}

pub async fn rename(
    ledger: web::Data<Ledger>,
    auth: Auth,
    req: web::Json<RenameRequest>,
) -> Result<HttpResponse, Failure> {
    let account = ledger.rename(auth.account(), &req.name).await?;
    Ok(HttpResponse::Ok().json(AccountInfo::from(&account)))
}

/// Top players by rating with platform totals and recent tournament winners.
pub async fn leaderboard(
    ledger: web::Data<Ledger>,
    registry: web::Data<Registry>,
    tournaments: web::Data<Tournaments>,
) -> Result<HttpResponse, Failure> {
    let players = ledger
        .leaders(LEADERBOARD_SIZE)
        .await?
        .iter()
        .map(Standing::from)
        .collect::<Vec<_>>();
    let stats = Stats::new(
        ledger.population().await?,
        registry.tally().await?,
        tournaments.running().await?,
    );
    let mut recent_winners = Vec::new();
    for t in tournaments.champions(RECENT_WINNERS).await? {
        let Some(winner) = t.winner() else { continue };
        recent_winners.push(Champion::new(&t, &ledger.account(winner).await?));
    }
    Ok(HttpResponse::Ok().json(Leaderboard {
        players,
        stats,
        recent_winners,
    }))
}

pub async fn earnings(ledger: web::Data<Ledger>) -> Result<HttpResponse, Failure> {
    let players = ledger
        .earners(LEADERBOARD_SIZE)
        .await?
        .iter()
        .map(Standing::from)
        .collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(Earners { players }))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/leaderboard", web::get().to(leaderboard))
        .route("/leaderboard/earnings", web::get().to(earnings))
        .service(
            web::scope("/profile")
                .route("", web::get().to(profile))
                .route("/history", web::get().to(history))
                .route("/rating", web::post().to(rating))
                .route("/name", web::post().to(rename)),
        );
}
