use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};
use warp::ws::{Message, WebSocket};

use crate::config::Config;
use crate::error::RelayError;
use crate::hub::RoomHub;
use duel_types::{ClientFrame, ServerFrame};

pub mod connection;
pub mod handlers;
pub mod rate_limiter;


use connection::ConnectionId;
pub use connection::ConnectionManager;
use handlers::MessageHandler;
use rate_limiter::RateLimiter;

pub async fn handle_connection(
    websocket: WebSocket,
    connection_manager: Arc<ConnectionManager>,
    hub: Arc<RoomHub>,
    config: Arc<Config>,
) {
    let connection_id = ConnectionId::new();
    info!("New WebSocket connection: {}", connection_id);

    let (mut ws_sender, mut ws_receiver) = websocket.split();
    let mut rate_limiter = RateLimiter::new(config.rate_limit_burst, config.rate_limit_refill());

    let message_receiver = connection_manager.create_connection(connection_id).await;
    let message_handler = MessageHandler::new(connection_id, connection_manager.clone(), hub);

    let incoming_handler = {
        let message_handler = message_handler.clone();
        let connection_manager = connection_manager.clone();

        async move {
            while let Some(result) = ws_receiver.next().await {
                match result {
                    Ok(msg) => {
                        if let Err(e) =
                            handle_message(msg, &mut rate_limiter, &message_handler).await
                        {
                            error!("Error handling message for {}: {}", connection_id, e);
                            let _ = connection_manager
                                .send_to_connection(
                                    connection_id,
                                    ServerFrame::Error {
                                        message: e.to_string(),
                                    },
                                )
                                .await;
                            if e == RelayError::RateLimited || e == RelayError::ConnectionClosed {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        warn!("WebSocket error for {}: {}", connection_id, e);
                        break;
                    }
                }
            }
        }
    };

    let outgoing_handler = async move {
        let mut receiver = message_receiver;

        while let Some(frame) = receiver.recv().await {
            let json = match serde_json::to_string(&frame) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize frame: {:?}", e);
                    continue;
                }
            };

            if let Err(e) = ws_sender.send(Message::text(json)).await {
                warn!("Failed to send frame to {}: {:?}", connection_id, e);
                break;
            }
        }
    };

    let mut outgoing = tokio::spawn(outgoing_handler);
    let outgoing_finished = tokio::select! {
        _ = incoming_handler => false,
        _ = &mut outgoing => true,
    };

    info!("Connection {} disconnected", connection_id);
    message_handler.handle_disconnect().await;
    connection_manager.remove_connection(connection_id).await;

    // Removing the connection closes its queue; let the writer flush what
    // was already queued (a final error frame, say) before the socket drops.
    if !outgoing_finished {
        let _ = outgoing.await;
    }
}

async fn handle_message(
    msg: Message,
    rate_limiter: &mut RateLimiter,
    message_handler: &MessageHandler,
) -> Result<(), RelayError> {
    if !rate_limiter.check_rate_limit() {
        return Err(RelayError::RateLimited);
    }

    // Pings, pongs and binary frames are not part of the protocol
    if !msg.is_text() {
        return Ok(());
    }

    let text = msg
        .to_str()
        .map_err(|_| RelayError::InvalidFrame("not valid text".to_string()))?;
    let frame: ClientFrame = serde_json::from_str(text)
        .map_err(|e| RelayError::InvalidFrame(format!("Invalid JSON message: {}", e)))?;

    message_handler.handle_message(frame).await
}
