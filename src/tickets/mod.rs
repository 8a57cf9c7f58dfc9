use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::shared::schema::tickets;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{null_as_default, parse_id, parse_payload, with_conn};
use crate::core::shared::{CrmError, CrmResult};

pub const TICKET_NOT_FOUND: &str = "Ticket not found";

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable)]
#[diesel(table_name = tickets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Ticket {
    pub id: i32,
    pub ticket_code: String,
    pub customer_id: i64,
    pub subject: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub assignee: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Writable ticket fields. Anything absent or `null` in the request body is
/// written as its empty value; `id` and the timestamps are never taken from input.
#[derive(Debug, Clone, Default, Deserialize, Insertable, AsChangeset)]
#[diesel(table_name = tickets)]
#[serde(default)]
pub struct TicketPayload {
    #[serde(deserialize_with = "null_as_default")]
    pub ticket_code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub customer_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub priority: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub assignee: String,
}

pub fn list_tickets(conn: &mut SqliteConnection) -> CrmResult<Vec<Ticket>> {
    let rows = tickets::table
        .order(tickets::id.asc())
        .select(Ticket::as_select())
        .load(conn)?;
    Ok(rows)
}

pub fn get_ticket(conn: &mut SqliteConnection, id: i32) -> CrmResult<Ticket> {
    tickets::table
        .find(id)
        .select(Ticket::as_select())
        .first(conn)
        .optional()?
        .ok_or(CrmError::NotFound(TICKET_NOT_FOUND))
}

pub fn create_ticket(conn: &mut SqliteConnection, payload: &TicketPayload) -> CrmResult<Ticket> {
    let now = Utc::now();
    let ticket = diesel::insert_into(tickets::table)
        .values((
            payload,
            tickets::created_at.eq(now),
            tickets::updated_at.eq(now),
        ))
        .returning(Ticket::as_returning())
        .get_result(conn)?;
    Ok(ticket)
}

/// Full replace of every writable field. `created_at` is kept.
pub fn update_ticket(
    conn: &mut SqliteConnection,
    id: i32,
    payload: &TicketPayload,
) -> CrmResult<Ticket> {
    diesel::update(tickets::table.find(id))
        .set((payload, tickets::updated_at.eq(Utc::now())))
        .returning(Ticket::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or(CrmError::NotFound(TICKET_NOT_FOUND))
}

/// Messages referencing the ticket are left in place.
pub fn delete_ticket(conn: &mut SqliteConnection, id: i32) -> CrmResult<usize> {
    let removed = diesel::delete(tickets::table.find(id)).execute(conn)?;
    Ok(removed)
}

pub async fn list_tickets_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Ticket>>, CrmError> {
    let rows = with_conn(&state.conn, list_tickets).await?;
    Ok(Json(rows))
}

pub async fn get_ticket_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Ticket>, CrmError> {
    let id = parse_id::<i32>(&raw_id).ok_or(CrmError::NotFound(TICKET_NOT_FOUND))?;
    let ticket = with_conn(&state.conn, move |conn| get_ticket(conn, id)).await?;
    Ok(Json(ticket))
}

pub async fn create_ticket_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Ticket>), CrmError> {
    let payload: TicketPayload = parse_payload(&body)?;
    let ticket = with_conn(&state.conn, move |conn| create_ticket(conn, &payload)).await?;
    info!("Created ticket {} ({})", ticket.id, ticket.ticket_code);
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn update_ticket_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Json<Ticket>, CrmError> {
    let id = parse_id::<i32>(&raw_id).ok_or(CrmError::NotFound(TICKET_NOT_FOUND))?;
    let ticket = with_conn(&state.conn, move |conn| {
        // existence is reported before any complaint about the body
        get_ticket(conn, id)?;
        let payload: TicketPayload = parse_payload(&body)?;
        update_ticket(conn, id, &payload)
    })
    .await?;
    Ok(Json(ticket))
}

pub async fn delete_ticket_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<serde_json::Value>, CrmError> {
    if let Some(id) = parse_id::<i32>(&raw_id) {
        let removed = with_conn(&state.conn, move |conn| delete_ticket(conn, id)).await?;
        if removed > 0 {
            info!("Deleted ticket {id}");
        }
    }
    Ok(Json(serde_json::json!({ "message": "Ticket deleted" })))
}

pub fn configure_tickets_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/tickets",
            get(list_tickets_handler).post(create_ticket_handler),
        )
        .route(
            "/api/tickets/:id",
            get(get_ticket_handler)
                .put(update_ticket_handler)
                .delete(delete_ticket_handler),
        )
}
