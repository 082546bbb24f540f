use std::time::Duration;

use async_trait::async_trait;
use bb8::{
    ErrorSink,
    ManageConnection,
    Pool,
    RunError,
};
use bb8_postgres::PostgresConnectionManager;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tokio_postgres::{
    NoTls,
    Row,
};
use tracing::{
    info,
    instrument,
    warn,
};

use crate::{
    error::StoreError,
    price_info::PriceRecord,
    storage::PriceStore,
};



const MAX_OPEN_CONNECTIONS: u32 = 10;
const IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const MAX_CONNECTION_LIFETIME: Duration = Duration::from_secs(5 * 60);
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_SCHEMA_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS bitcoin_prices (
        id SERIAL PRIMARY KEY,
        price DECIMAL(15,2) NOT NULL,
        timestamp TIMESTAMP DEFAULT NOW()
    );

    CREATE INDEX IF NOT EXISTS idx_bitcoin_prices_timestamp
    ON bitcoin_prices(timestamp);
"#;



/// Postgres storage implementation backed by a bb8 connection pool.
///
/// Cloning is cheap and shares the pool. The pool is released once the last
/// handle is dropped or closed.
#[derive(Clone)]
pub struct Postgres {
    pool: Pool<PostgresConnectionManager<NoTls>>,
}



/// Pool connect failures are not retried, they are logged with the driver
/// error before the waiting call gives up.
#[derive(Debug, Clone, Copy)]
struct LogErrorSink;



impl ErrorSink<tokio_postgres::Error> for LogErrorSink {
    fn sink(&self, error: tokio_postgres::Error) {
        warn!(error = %error, "database connection failed");
    }

    fn boxed_clone(&self) -> Box<dyn ErrorSink<tokio_postgres::Error>> {
        Box::new(*self)
    }
}



impl Postgres {
    /// Verify the database answers, open the pool and make sure the schema
    /// exists. Any failure here is fatal for the process.
    #[instrument(skip_all)]
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let manager = PostgresConnectionManager::new_from_stringlike(
            database_url, NoTls
        ).map_err(StoreError::Open)?;

        ping(&manager).await?;

        let pool = Pool::builder()
            .max_size(MAX_OPEN_CONNECTIONS)
            .idle_timeout(Some(IDLE_TIMEOUT))
            .max_lifetime(Some(MAX_CONNECTION_LIFETIME))
            .connection_timeout(CONNECTION_TIMEOUT)
            .retry_connection(false)
            .error_sink(Box::new(LogErrorSink))
            .build(manager)
            .await
            .map_err(StoreError::Open)?;

        let store = Self { pool };
        store.migrate().await?;

        info!("Database initialized successfully");
        Ok(store)
    }



    /// Create the price table and its timestamp index. Idempotent.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let conn = self.pool.get().await.map_err(StoreError::Schema)?;
        conn.batch_execute(CREATE_SCHEMA_SQL)
            .await
            .map_err(|e| StoreError::Schema(RunError::User(e)))?;

        Ok(())
    }



    /// Release this handle on the pool. Consuming `self` makes a second close
    /// on the same handle impossible.
    pub fn close(self) {
        let state = self.pool.state();
        drop(self.pool);
        info!(
            connections = state.connections,
            idle = state.idle_connections,
            "Database pool released"
        );
    }
}



/// Single round trip on a dedicated connection, outside the pool, so the
/// driver error is what the caller sees.
async fn ping(
    manager: &PostgresConnectionManager<NoTls>
) -> Result<(), StoreError> {
    let client = manager.connect().await.map_err(StoreError::Ping)?;
    client.simple_query("SELECT 1").await.map_err(StoreError::Ping)?;

    Ok(())
}



fn record_from_row(row: &Row) -> Result<PriceRecord, tokio_postgres::Error> {
    let id: i32 = row.try_get("id")?;
    let price: Decimal = row.try_get("price")?;
    let timestamp: NaiveDateTime = row.try_get("timestamp")?;

    Ok(PriceRecord::new(id, price, timestamp))
}



#[async_trait]
impl PriceStore for Postgres {
    async fn insert(&self, price: Decimal) -> Result<i32, StoreError> {
        let conn = self.pool.get().await.map_err(StoreError::Insert)?;

        let sql = "INSERT INTO bitcoin_prices (price) VALUES ($1) RETURNING id";
        let row = conn.query_one(sql, &[&price])
            .await
            .map_err(|e| StoreError::Insert(RunError::User(e)))?;

        let id: i32 = row.try_get(0)
            .map_err(|e| StoreError::Insert(RunError::User(e)))?;

        info!(%price, id, "Saved price to database");
        Ok(id)
    }



    async fn latest(&self, limit: usize) -> Result<Vec<PriceRecord>, StoreError> {
        let conn = self.pool.get().await.map_err(StoreError::Query)?;

        let sql = r#"
            SELECT id, price, timestamp
            FROM bitcoin_prices
            ORDER BY timestamp DESC, id DESC
            LIMIT $1
        "#;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = conn.query(sql, &[&limit])
            .await
            .map_err(|e| StoreError::Query(RunError::User(e)))?;

        rows.iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Query(RunError::User(e)))
    }
}



#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[tokio::test]
    async fn test_connect_to_closed_port_fails_fast_with_driver_error() {
        // Nothing listens on port 1 locally.
        let result = tokio::time::timeout(
            Duration::from_secs(10),
            Postgres::connect("postgres://u:p@127.0.0.1:1/db"),
        )
        .await;

        let Ok(Err(err)) = result else {
            panic!("connect should fail before the timeout");
        };
        assert!(matches!(err, StoreError::Ping(_)), "unexpected error: {err:?}");

        let driver = err.source().and_then(|s| s.downcast_ref::<tokio_postgres::Error>());
        assert!(driver.is_some(), "cause should be the tokio_postgres error");
    }

    #[tokio::test]
    async fn test_malformed_url_is_open_error() {
        let result = Postgres::connect("postgres://u:p@127.0.0.1:notaport/db").await;
        assert!(matches!(result, Err(StoreError::Open(_))));
    }
}
