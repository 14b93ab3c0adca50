//! Stakemate HTTP and WebSocket server.
//!
//! Wires the ledger, game registry, tournaments, wallet, authority and
//! realtime hub into one actix-web application.
//!
//! ## Routes
//!
//! - [`games`] — Wagered games, moves and chat
//! - [`tournaments`] — Single-elimination brackets
//! - [`wallet`] — Balances, deposits, withdrawals and processor callbacks
//! - [`profile`] — Own profile, history, rating seed and the leaderboard
//! - [`realtime`] — The `/ws` upgrade into the [`sm_hosting::Hub`]
//!
//! ## Storage
//!
//! With `DB_URL` set every repository is PostgreSQL and tables are migrated
//! on boot. Without it the server runs on in-memory stores.
mod dto;
mod services;

pub mod games;
pub mod profile;
pub mod realtime;
pub mod tournaments;
pub mod wallet;

pub use dto::*;
pub use services::*;
pub use wallet::Webhook;

use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::middleware::Logger;
use actix_web::web;
use std::sync::Arc;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

async fn health(services: web::Data<Services>) -> impl Responder {
    let Some(client) = services.database.as_ref() else {
        return HttpResponse::Ok().body("ok");
    };
    match client
        .execute("SELECT 1", &[])
        .await
        .inspect_err(|e| log::error!("health check failed: {}", e))
    {
        Ok(_) => HttpResponse::Ok().body("ok"),
        Err(_) => HttpResponse::ServiceUnavailable().body("database unavailable"),
    }
}

/// Mounts every route and the services behind them.
#[rustfmt::skip]
pub fn mount(cfg: &mut web::ServiceConfig, services: &Services, webhook: &Webhook) {
    services.register(cfg);
    cfg.app_data(web::Data::new(webhook.clone()))
        .route("/health", web::get().to(health))
        .service(
            web::scope("/auth")
                .route("/login", web::post().to(sm_auth::login))
                .route("/logout", web::post().to(sm_auth::logout))
                .route("/me", web::get().to(sm_auth::me)),
        )
        .configure(games::routes)
        .configure(tournaments::routes)
        .configure(wallet::routes)
        .configure(profile::routes)
        .configure(realtime::routes);
}

async fn stores() -> anyhow::Result<Stores> {
    match std::env::var("DB_URL") {
        Ok(_) => {
            let client = sm_pg::db().await;
            Stores::migrate(&client).await?;
            Ok(Stores::postgres(client))
        }
        Err(_) => {
            log::warn!("DB_URL not set, running on in-memory stores");
            Ok(Stores::memory())
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let services = Services::build(
        stores().await?,
        sm_auth::Crypto::from_env(),
        Arc::new(sm_auth::Shared::from_env()),
        Arc::new(sm_wallet::Sandbox),
        Arc::new(sm_gameroom::Permissive),
    )
    .await?;
    let webhook = Webhook::from_env();
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    log::info!("starting stakemate server on {}", addr);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .configure(|cfg| mount(cfg, &services, &webhook))
    })
    .workers(6)
    .bind(addr)?
    .run()
    .await?;
    Ok(())
}
