use super::*;
use actix_web::HttpResponse;
use actix_web::web;
use sm_auth::Auth;
use sm_auth::Failure;
use sm_core::ID;
use sm_tournament::Tournament;
use sm_tournament::Tournaments;

fn tournament(path: web::Path<uuid::Uuid>) -> ID<Tournament> {
    ID::from(path.into_inner())
}

pub async fn list(tournaments: web::Data<Tournaments>) -> Result<HttpResponse, Failure> {
    Ok(HttpResponse::Ok().json(tournaments.list().await?))
}

pub async fn create(
    tournaments: web::Data<Tournaments>,
    auth: Auth,
    req: web::Json<CreateTournamentRequest>,
) -> Result<HttpResponse, Failure> {
    let req = req.into_inner();
    let t = tournaments
        .create(
            auth.account(),
            &req.name,
            &req.description,
            req.entry_fee,
            req.max_participants,
            req.time_control,
        )
        .await?;
    Ok(HttpResponse::Created().json(t))
}

/// The tournament with its entrants and every pairing so far.
pub async fn get(tournaments: web::Data<Tournaments>, path: web::Path<uuid::Uuid>) -> Result<HttpResponse, Failure> {
    Ok(HttpResponse::Ok().json(tournaments.get(tournament(path)).await?))
}

pub async fn join(
    tournaments: web::Data<Tournaments>,
    auth: Auth,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, Failure> {
    Ok(HttpResponse::Ok().json(tournaments.join(tournament(path), auth.account()).await?))
}

pub async fn start(
    tournaments: web::Data<Tournaments>,
    auth: Auth,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, Failure> {
    Ok(HttpResponse::Ok().json(tournaments.start(tournament(path), auth.account()).await?))
}

pub async fn cancel(
    tournaments: web::Data<Tournaments>,
    auth: Auth,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, Failure> {
    Ok(HttpResponse::Ok().json(tournaments.cancel(tournament(path), auth.account()).await?))
}

pub async fn conclude(
    tournaments: web::Data<Tournaments>,
    auth: Auth,
    path: web::Path<uuid::Uuid>,
    req: web::Json<ConcludeRequest>,
) -> Result<HttpResponse, Failure> {
    let t = tournaments
        .conclude(tournament(path), auth.account(), req.winner)
        .await?;
    Ok(HttpResponse::Ok().json(t))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tournaments")
            .route("", web::get().to(list))
            .route("", web::post().to(create))
            .route("/{id}", web::get().to(get))
            .route("/{id}/join", web::post().to(join))
            .route("/{id}/start", web::post().to(start))
            .route("/{id}/cancel", web::post().to(cancel))
            .route("/{id}/conclude", web::post().to(conclude)),
    );
}
