use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::web;
use sm_hosting::Hub;

/// Upgrades to a WebSocket and hands the socket to the hub.
/// Authentication happens in-band with the first `auth` message.
pub async fn connect(
    hub: web::Data<Hub>,
    req: HttpRequest,
    body: web::Payload,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, session, streams) = actix_ws::handle(&req, body)?;
    hub.into_inner().bridge(session, streams);
    Ok(response)
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws", web::get().to(connect));
}
