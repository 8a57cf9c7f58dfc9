use axum::{extract::State, routing::get, Json, Router};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;

use crate::core::shared::schema::{customers, tickets};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::with_conn;
use crate::core::shared::{CrmError, CrmResult};

pub const STATUS_OPEN: &str = "Open";
pub const STATUS_PENDING: &str = "Pending";
pub const STATUS_RESOLVED: &str = "Resolved";

/// Tickets in any other status (e.g. "In Progress") count only toward
/// `total_tickets`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_tickets: i64,
    pub open_tickets: i64,
    pub pending_tickets: i64,
    pub resolved_tickets: i64,
    pub total_customers: i64,
}

fn count_with_status(conn: &mut SqliteConnection, status: &str) -> QueryResult<i64> {
    tickets::table
        .filter(tickets::status.eq(status))
        .count()
        .get_result(conn)
}

/// All five counts come from one read transaction; any failure fails the lot.
pub fn compute_stats(conn: &mut SqliteConnection) -> CrmResult<DashboardStats> {
    conn.transaction::<_, CrmError, _>(|conn| {
        Ok(DashboardStats {
            total_tickets: tickets::table.count().get_result(conn)?,
            open_tickets: count_with_status(conn, STATUS_OPEN)?,
            pending_tickets: count_with_status(conn, STATUS_PENDING)?,
            resolved_tickets: count_with_status(conn, STATUS_RESOLVED)?,
            total_customers: customers::table.count().get_result(conn)?,
        })
    })
}

pub async fn dashboard_stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, CrmError> {
    let stats = with_conn(&state.conn, compute_stats).await?;
    Ok(Json(stats))
}

pub fn configure_dashboards_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/dashboard/stats", get(dashboard_stats_handler))
}
