mod stats;

use std::time::Duration;

use axum::routing::get;
use axum::Router;
use dashmap::DashMap;

use crate::state::{AppState, WsTicket};

/// How long a ticket from `POST /api/ws/ticket` stays redeemable.
pub const TICKET_TTL: Duration = Duration::from_secs(30);

pub fn router() -> Router<AppState> {
    Router::new().route("/stats", get(stats::stats_handler))
}

/// Consumes `ticket_id` and returns its owner if it has not expired.
/// A ticket is removed on the first attempt, valid or not.
pub fn redeem_ticket(tickets: &DashMap<String, WsTicket>, ticket_id: Option<&str>) -> Option<String> {
    let (_, ticket) = tickets.remove(ticket_id?)?;
    if ticket.created_at.elapsed() > TICKET_TTL {
        return None;
    }
    Some(ticket.username)
}

/// Drops tickets nobody redeemed in time.
pub fn sweep_expired_tickets(tickets: &DashMap<String, WsTicket>) {
    tickets.retain(|_, t| t.created_at.elapsed() <= TICKET_TTL);
}
