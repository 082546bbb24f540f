use reqwest::StatusCode;
use thiserror::Error;



/// Pooled Postgres failures: either the pool could not hand out a connection
/// in time, or the statement itself failed.
pub type PgError = bb8::RunError<tokio_postgres::Error>;



/// Everything that can go wrong while retrieving a price quote.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to make HTTP request")]
    Request(#[source] reqwest::Error),

    #[error("API request failed with status: {0}")]
    Status(StatusCode),

    #[error("failed to read response body")]
    Body(#[source] reqwest::Error),

    #[error("failed to parse JSON response")]
    Decode(#[from] serde_json::Error),

    #[error("response carries no bitcoin/usd price")]
    MissingPrice,

    #[error("invalid price received: {0}")]
    InvalidPrice(f64),
}



#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to open database")]
    Open(#[source] tokio_postgres::Error),

    #[error("failed to ping database")]
    Ping(#[source] tokio_postgres::Error),

    #[error("failed to create table")]
    Schema(#[source] PgError),

    #[error("failed to save price to database")]
    Insert(#[source] PgError),

    #[error("failed to query prices")]
    Query(#[source] PgError),
}



/// Error of one fetch-and-persist run, tagged with the stage that failed.
#[derive(Error, Debug)]
pub enum OperationError {
    #[error("failed to fetch Bitcoin price")]
    Fetch(#[source] FetchError),

    #[error("failed to save price")]
    Persist(#[source] StoreError),
}
