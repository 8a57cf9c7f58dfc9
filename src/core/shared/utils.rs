use crate::core::shared::error::{CrmError, CrmResult};
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::SqliteConnection;
use log::info;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

const BUSY_TIMEOUT_MS: u32 = 5_000;

#[derive(Debug, Clone, Copy)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}; PRAGMA journal_mode = WAL;"
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Opens the pool. Building it establishes a connection, so an unreachable
/// database file fails here rather than on the first request.
pub fn create_conn(database_url: &str, max_connections: u32) -> Result<DbPool, diesel::r2d2::PoolError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .max_size(max_connections.max(1))
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)
}

/// Run database migrations
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS).map_err(
        |e| -> Box<dyn std::error::Error + Send + Sync> {
            Box::new(std::io::Error::other(format!("Migration error: {e}")))
        },
    )?;
    info!("Schema ready ({} migration(s) applied)", applied.len());
    Ok(())
}

/// Runs a blocking diesel operation on a pooled connection.
pub async fn with_conn<T, F>(pool: &DbPool, op: F) -> CrmResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut SqliteConnection) -> CrmResult<T> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get().map_err(CrmError::from)?;
        op(&mut *conn)
    })
    .await?
}

/// Path ids that are not integers can never match a row.
pub fn parse_id<T: std::str::FromStr>(raw: &str) -> Option<T> {
    raw.trim().parse().ok()
}

/// A literal `null` body decodes to the default payload.
pub fn parse_payload<T>(body: &[u8]) -> CrmResult<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    serde_json::from_slice::<Option<T>>(body)
        .map(Option::unwrap_or_default)
        .map_err(|e| CrmError::BadRequest(e.to_string()))
}

/// Field-level `deserialize_with` that reads an explicit JSON `null` as the
/// field's zero value.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de> + Default,
{
    use serde::Deserialize;
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Sample {
        #[serde(deserialize_with = "null_as_default")]
        name: String,
        #[serde(deserialize_with = "null_as_default")]
        owner_id: i64,
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id::<i32>("42"), Some(42));
        assert_eq!(parse_id::<i32>(" 7 "), Some(7));
        assert_eq!(parse_id::<i32>("abc"), None);
        assert_eq!(parse_id::<i32>(""), None);
        assert_eq!(parse_id::<i32>("3000000000"), None);
        assert_eq!(parse_id::<i64>("3000000000"), Some(3_000_000_000));
    }

    #[test]
    fn test_parse_payload_tolerates_unknown_fields() {
        let sample: Sample = parse_payload(br#"{"name":"x","extra":1}"#).unwrap();
        assert_eq!(sample.name, "x");
    }

    #[test]
    fn test_parse_payload_rejects_empty_body() {
        let err = parse_payload::<Sample>(b"").unwrap_err();
        assert!(matches!(err, CrmError::BadRequest(_)));
    }

    #[test]
    fn test_parse_payload_rejects_wrong_type() {
        let err = parse_payload::<Sample>(br#"{"name":5}"#).unwrap_err();
        assert!(matches!(err, CrmError::BadRequest(_)));
    }

    #[test]
    fn test_parse_payload_reads_null_fields_as_defaults() {
        let sample: Sample =
            parse_payload(br#"{"name":null,"owner_id":null}"#).unwrap();
        assert_eq!(sample.name, "");
        assert_eq!(sample.owner_id, 0);
    }

    #[test]
    fn test_parse_payload_null_body_is_default() {
        let sample: Sample = parse_payload(b"null").unwrap();
        assert_eq!(sample.name, "");
        assert_eq!(sample.owner_id, 0);
    }

    #[test]
    fn test_parse_payload_accepts_wide_ids() {
        let sample: Sample = parse_payload(br#"{"owner_id":3000000000}"#).unwrap();
        assert_eq!(sample.owner_id, 3_000_000_000);
    }
}
