use std::sync::Arc;
use warp::Filter;

use crate::config::Config;
use crate::hub::RoomHub;
use crate::websocket::ConnectionManager;

pub mod client;
pub mod config;
pub mod error;
pub mod hub;
pub mod websocket;

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    hub: Arc<RoomHub>,
    config: Arc<Config>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let hub_filter = warp::any().map({
        let hub = hub.clone();
        move || hub.clone()
    });

    let config_filter = warp::any().map({
        let config = config.clone();
        move || config.clone()
    });

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connection_manager_filter)
        .and(hub_filter.clone())
        .and(config_filter)
        .map(|ws: warp::ws::Ws, conn_mgr, hub, config| {
            ws.on_upgrade(move |socket| websocket::handle_connection(socket, conn_mgr, hub, config))
        });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Who is in a room; never exposes game data
    let room = warp::path!("rooms" / String)
        .and(warp::get())
        .and(hub_filter)
        .map(|room_id: String, hub: Arc<RoomHub>| match hub.summary(&room_id) {
            Some(summary) => warp::reply::with_status(
                warp::reply::json(&summary),
                warp::http::StatusCode::OK,
            ),
            None => warp::reply::with_status(
                warp::reply::json(&serde_json::json!({ "error": "Room not found" })),
                warp::http::StatusCode::NOT_FOUND,
            ),
        });

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET"]);

    websocket
        .or(health)
        .or(room)
        .with(cors)
        .with(warp::log("word_duel"))
}
