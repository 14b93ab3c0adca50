use super::*;
use actix_web::HttpResponse;
use actix_web::web;
use sm_auth::Auth;
use sm_auth::Failure;
use sm_auth::MaybeAuth;
use sm_core::ID;
use sm_gameroom::Game;
use sm_gameroom::Registry;
use sm_hosting::Hub;
use sm_hosting::ServerMessage;

fn game(path: web::Path<uuid::Uuid>) -> ID<Game> {
    ID::from(path.into_inner())
}

/// Open games, with the rating gap to the caller when signed in.
pub async fn list(registry: web::Data<Registry>, auth: MaybeAuth) -> Result<HttpResponse, Failure> {
    Ok(HttpResponse::Ok().json(registry.open_games(auth.account()).await?))
}

pub async fn create(
    registry: web::Data<Registry>,
    auth: Auth,
    req: web::Json<CreateGameRequest>,
) -> Result<HttpResponse, Failure> {
    let game = registry
        .create(auth.account(), req.wager, req.time_control)
        .await?;
    Ok(HttpResponse::Created().json(game))
}

pub async fn get(registry: web::Data<Registry>, path: web::Path<uuid::Uuid>) -> Result<HttpResponse, Failure> {
    Ok(HttpResponse::Ok().json(registry.game(game(path)).await?))
}

pub async fn join(
    registry: web::Data<Registry>,
    auth: Auth,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, Failure> {
    Ok(HttpResponse::Ok().json(registry.join(game(path), auth.account()).await?))
}

pub async fn cancel(
    registry: web::Data<Registry>,
    hub: web::Data<Hub>,
    auth: Auth,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, Failure> {
    let game = registry.withdraw(game(path), auth.account()).await?;
    hub.announce(&game).await;
    Ok(HttpResponse::Ok().json(game))
}

pub async fn resign(
    registry: web::Data<Registry>,
    hub: web::Data<Hub>,
    auth: Auth,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, Failure> {
    let game = registry.resign(game(path), auth.account()).await?;
    hub.announce(&game).await;
    Ok(HttpResponse::Ok().json(game))
}

pub async fn moves(
    registry: web::Data<Registry>,
    path: web::Path<uuid::Uuid>,
    query: web::Query<SinceQuery>,
) -> Result<HttpResponse, Failure> {
    Ok(HttpResponse::Ok().json(registry.moves(game(path), query.since).await?))
}

/// Moves played over HTTP reach the room exactly like socket moves.
pub async fn play(
    registry: web::Data<Registry>,
    hub: web::Data<Hub>,
    auth: Auth,
    path: web::Path<uuid::Uuid>,
    req: web::Json<MoveRequest>,
) -> Result<HttpResponse, Failure> {
    let id = game(path);
    let played = registry.record_move(id, auth.account(), &req.notation).await?;
    hub.broadcast(id, &ServerMessage::GameMove { data: played.clone() })
        .await;
    if played.game.status().is_terminal() {
        hub.announce(&played.game).await;
    }
    Ok(HttpResponse::Ok().json(played))
}

pub async fn chat(
    registry: web::Data<Registry>,
    auth: Auth,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, Failure> {
    Ok(HttpResponse::Ok().json(registry.chat(game(path), auth.account()).await?))
}

pub async fn post_chat(
    registry: web::Data<Registry>,
    hub: web::Data<Hub>,
    auth: Auth,
    path: web::Path<uuid::Uuid>,
    req: web::Json<ChatRequest>,
) -> Result<HttpResponse, Failure> {
    let id = game(path);
    let message = registry.post_chat(id, auth.account(), &req.content).await?;
    hub.broadcast(id, &ServerMessage::ChatMessage { data: message.clone() })
        .await;
    Ok(HttpResponse::Created().json(message))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/games")
            .route("", web::get().to(list))
            .route("", web::post().to(create))
            .route("/{id}", web::get().to(get))
            .route("/{id}/join", web::post().to(join))
            .route("/{id}/cancel", web::post().to(cancel))
            .route("/{id}/resign", web::post().to(resign))
            .route("/{id}/moves", web::get().to(moves))
            .route("/{id}/moves", web::post().to(play))
            .route("/{id}/chat", web::get().to(chat))
            .route("/{id}/chat", web::post().to(post_chat)),
    );
}
