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

use crate::core::shared::schema::customers;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{null_as_default, parse_id, parse_payload, with_conn};
use crate::core::shared::{CrmError, CrmResult};

pub const CUSTOMER_NOT_FOUND: &str = "Customer not found";

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable)]
#[diesel(table_name = customers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub status: String,
    pub since: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Insertable, AsChangeset)]
#[diesel(table_name = customers)]
#[serde(default)]
pub struct CustomerPayload {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub since: String,
}

pub fn list_customers(conn: &mut SqliteConnection) -> CrmResult<Vec<Customer>> {
    let rows = customers::table
        .order(customers::id.asc())
        .select(Customer::as_select())
        .load(conn)?;
    Ok(rows)
}

pub fn get_customer(conn: &mut SqliteConnection, id: i32) -> CrmResult<Customer> {
    customers::table
        .find(id)
        .select(Customer::as_select())
        .first(conn)
        .optional()?
        .ok_or(CrmError::NotFound(CUSTOMER_NOT_FOUND))
}

/// Fails with `Conflict` when the email is already registered.
pub fn create_customer(
    conn: &mut SqliteConnection,
    payload: &CustomerPayload,
) -> CrmResult<Customer> {
    let customer = diesel::insert_into(customers::table)
        .values((payload, customers::created_at.eq(Utc::now())))
        .returning(Customer::as_returning())
        .get_result(conn)?;
    Ok(customer)
}

pub fn update_customer(
    conn: &mut SqliteConnection,
    id: i32,
    payload: &CustomerPayload,
) -> CrmResult<Customer> {
    diesel::update(customers::table.find(id))
        .set(payload)
        .returning(Customer::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or(CrmError::NotFound(CUSTOMER_NOT_FOUND))
}

pub async fn list_customers_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Customer>>, CrmError> {
    let rows = with_conn(&state.conn, list_customers).await?;
    Ok(Json(rows))
}

pub async fn get_customer_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Customer>, CrmError> {
    let id = parse_id::<i32>(&raw_id).ok_or(CrmError::NotFound(CUSTOMER_NOT_FOUND))?;
    let customer = with_conn(&state.conn, move |conn| get_customer(conn, id)).await?;
    Ok(Json(customer))
}

pub async fn create_customer_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Customer>), CrmError> {
    let payload: CustomerPayload = parse_payload(&body)?;
    let customer = with_conn(&state.conn, move |conn| create_customer(conn, &payload)).await?;
    info!("Created customer {}", customer.id);
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer_handler(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Json<Customer>, CrmError> {
    let id = parse_id::<i32>(&raw_id).ok_or(CrmError::NotFound(CUSTOMER_NOT_FOUND))?;
    let customer = with_conn(&state.conn, move |conn| {
        get_customer(conn, id)?;
        let payload: CustomerPayload = parse_payload(&body)?;
        update_customer(conn, id, &payload)
    })
    .await?;
    Ok(Json(customer))
}

pub fn configure_customers_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/customers",
            get(list_customers_handler).post(create_customer_handler),
        )
        .route(
            "/api/customers/:id",
            get(get_customer_handler).put(update_customer_handler),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_util::test_pool;
    use crate::{assert_err, assert_ok};
    use tempfile::TempDir;

    fn payload(name: &str, email: &str) -> CustomerPayload {
        CustomerPayload {
            name: name.to_string(),
            email: email.to_string(),
            phone: "555-0100".to_string(),
            status: "Active".to_string(),
            since: "2023-04".to_string(),
        }
    }

    #[test]
    fn test_fresh_email_is_retrievable() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(dir.path());
        let mut conn = pool.get().unwrap();

        let created = assert_ok!(create_customer(&mut conn, &payload("Ana", "ana@example.com")));
        assert!(created.id > 0);
        let fetched = assert_ok!(get_customer(&mut conn, created.id));
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_duplicate_email_fails() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(dir.path());
        let mut conn = pool.get().unwrap();

        assert_ok!(create_customer(&mut conn, &payload("Ana", "ana@example.com")));
        let err = assert_err!(create_customer(&mut conn, &payload("Other", "ana@example.com")));
        assert!(matches!(err, CrmError::Conflict(_)));
        assert_eq!(list_customers(&mut conn).unwrap().len(), 1);
    }

    #[test]
    fn test_update_to_taken_email_fails() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(dir.path());
        let mut conn = pool.get().unwrap();

        create_customer(&mut conn, &payload("Ana", "ana@example.com")).unwrap();
        let bo = create_customer(&mut conn, &payload("Bo", "bo@example.com")).unwrap();
        let err = assert_err!(update_customer(
            &mut conn,
            bo.id,
            &payload("Bo", "ana@example.com")
        ));
        assert!(matches!(err, CrmError::Conflict(_)));
    }

    #[test]
    fn test_update_replaces_fields_and_keeps_created_at() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(dir.path());
        let mut conn = pool.get().unwrap();

        let created = create_customer(&mut conn, &payload("Ana", "ana@example.com")).unwrap();
        let replacement = CustomerPayload {
            email: "ana@example.com".to_string(),
            status: "VIP".to_string(),
            ..CustomerPayload::default()
        };
        let updated = assert_ok!(update_customer(&mut conn, created.id, &replacement));
        assert_eq!(updated.status, "VIP");
        assert_eq!(updated.name, "");
        assert_eq!(updated.phone, "");
        assert_eq!(updated.created_at, created.created_at);
    }

    #[test]
    fn test_missing_customer_is_not_found() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(dir.path());
        let mut conn = pool.get().unwrap();

        let err = assert_err!(get_customer(&mut conn, 5));
        assert_eq!(err.to_string(), CUSTOMER_NOT_FOUND);
        let err = assert_err!(update_customer(&mut conn, 5, &payload("X", "x@example.com")));
        assert!(matches!(err, CrmError::NotFound(_)));
    }
}
