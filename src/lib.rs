//! Bitcoin price tracker.
//!
//! Fetches the BTC/USD quote from CoinGecko, appends it to a Postgres table
//! and either does so once (`fetch`), on a fixed schedule (`scheduler`), or
//! prints the latest stored quotes (`display`).

pub mod command;
pub mod config;
pub mod error;
pub mod job;
pub mod price_client;
pub mod price_info;
pub mod scheduler;
pub mod shared_state;
pub mod storage;
pub mod terminal_output;
