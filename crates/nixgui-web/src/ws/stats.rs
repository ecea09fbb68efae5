use std::time::Duration;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use rand::Rng;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StatsQuery {
    ticket: Option<String>,
}

pub async fn stats_handler(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    // The ticket is checked (and burned) before looking at the upgrade.
    let Some(username) = super::redeem_ticket(&state.ws_tickets, query.ticket.as_deref()) else {
        return AppError::unauthorized().into_response();
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let interval = Duration::from_secs(state.config.ws.stats_interval_secs.max(1));
    ws.on_upgrade(move |socket| stream_stats(socket, interval, username))
}

async fn stream_stats(socket: WebSocket, period: Duration, username: String) {
    tracing::info!("Stats WebSocket opened for {username}");
    let (mut sender, mut receiver) = socket.split();
    let mut ticker = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let frame = stats_frame(sample_cpu_usage(), chrono::Utc::now().timestamp_millis());
                if sender.send(Message::Text(frame.to_string().into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::info!("Stats WebSocket closed for {username}");
}

fn sample_cpu_usage() -> f64 {
    rand::thread_rng().gen_range(0.0..100.0)
}

fn stats_frame(cpu_usage: f64, timestamp_ms: i64) -> serde_json::Value {
    serde_json::json!({
        "type": "system-stats",
        "data": {
            "cpu": { "usage": cpu_usage },
            "timestamp": timestamp_ms,
        }
    })
}
