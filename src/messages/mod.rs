use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::shared::schema::messages;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{null_as_default, parse_id, parse_payload, with_conn};
use crate::core::shared::{CrmError, CrmResult};

/// A single entry in a ticket's conversation. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Message {
    pub id: i32,
    pub ticket_id: i64,
    pub sender: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Insertable)]
#[diesel(table_name = messages)]
#[serde(default)]
pub struct MessagePayload {
    #[serde(deserialize_with = "null_as_default")]
    pub ticket_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub sender: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
}

/// The ticket itself is not looked up; an unknown id simply has no messages.
pub fn list_messages_for_ticket(
    conn: &mut SqliteConnection,
    ticket_id: i64,
) -> CrmResult<Vec<Message>> {
    let rows = messages::table
        .filter(messages::ticket_id.eq(ticket_id))
        .order(messages::id.asc())
        .select(Message::as_select())
        .load(conn)?;
    Ok(rows)
}

pub fn create_message(conn: &mut SqliteConnection, payload: &MessagePayload) -> CrmResult<Message> {
    let message = diesel::insert_into(messages::table)
        .values((payload, messages::created_at.eq(Utc::now())))
        .returning(Message::as_returning())
        .get_result(conn)?;
    Ok(message)
}

pub async fn list_ticket_messages_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_ticket_id): Path<String>,
) -> Result<Json<Vec<Message>>, CrmError> {
    let Some(ticket_id) = parse_id::<i64>(&raw_ticket_id) else {
        return Ok(Json(Vec::new()));
    };
    let rows = with_conn(&state.conn, move |conn| {
        list_messages_for_ticket(conn, ticket_id)
    })
    .await?;
    Ok(Json(rows))
}

pub async fn create_message_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Message>), CrmError> {
    let payload: MessagePayload = parse_payload(&body)?;
    let message = with_conn(&state.conn, move |conn| create_message(conn, &payload)).await?;
    debug!("Stored message {} on ticket {}", message.id, message.ticket_id);
    Ok((StatusCode::CREATED, Json(message)))
}

pub fn configure_messages_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/messages/ticket/:ticket_id",
            get(list_ticket_messages_handler),
        )
        .route("/api/messages", post(create_message_handler))
}
