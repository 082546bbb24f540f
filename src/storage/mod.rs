pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{
    error::StoreError,
    price_info::PriceRecord,
};



/// Append-only store of price records. Implementations never update or
/// delete rows.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Append one price, timestamped by the store. Returns the new id once the
    /// row is committed.
    async fn insert(&self, price: Decimal) -> Result<i32, StoreError>;

    /// Up to `limit` newest records, newest first. Ties on timestamp are
    /// broken by id, newest first. Empty store yields an empty vector.
    async fn latest(&self, limit: usize) -> Result<Vec<PriceRecord>, StoreError>;
}
