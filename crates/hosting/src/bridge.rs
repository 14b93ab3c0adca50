use super::*;
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;

impl Hub {
    /// Spawns the pump between one WebSocket and the hub.
    ///
    /// Outbound frames queued for the connection are written to the socket;
    /// inbound text frames are handled in order. However the stream ends, the
    /// hub treats it as a disconnect.
    pub fn bridge(self: &Arc<Self>, mut session: actix_ws::Session, mut streams: actix_ws::MessageStream) {
        use futures::StreamExt;
        let (tx, mut rx) = unbounded_channel::<String>();
        let mut conn = self.connect(tx);
        let hub = self.clone();
        actix_web::rt::spawn(async move {
            'sesh: loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Some(json) => if session.text(json).await.is_err() { break 'sesh },
                        None => break 'sesh,
                    },
                    msg = streams.next() => match msg {
                        Some(Ok(actix_ws::Message::Text(text))) => hub.handle(&mut conn, &text).await,
                        Some(Ok(actix_ws::Message::Ping(bytes))) => if session.pong(&bytes).await.is_err() { break 'sesh },
                        Some(Ok(actix_ws::Message::Close(_))) => break 'sesh,
                        Some(Err(_)) => break 'sesh,
                        None => break 'sesh,
                        _ => continue 'sesh,
                    },
                }
            }
            hub.disconnect(&conn).await;
            let _ = session.close(None).await;
        });
    }
}
