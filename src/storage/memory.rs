use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::{
    error::StoreError,
    price_info::{
        round_to_cents,
        PriceRecord,
    },
    storage::PriceStore,
};



/// Volatile store that keeps records in process memory. Mirrors the Postgres
/// table semantics: sequential ids, insertion timestamps, prices rounded to
/// 2 decimal digits.
///
/// Public so the integration tests under `tests/` can drive the dispatcher
/// without a database.
#[derive(Clone, Default)]
pub struct Memory {
    rows: Arc<Mutex<Vec<PriceRecord>>>,
}



impl Memory {
    pub fn new() -> Self {
        Self::default()
    }



    /// Start from existing records. Ids handed out later continue after the
    /// highest seeded id.
    pub fn with_records(records: Vec<PriceRecord>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(records)),
        }
    }



    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }



    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }
}



#[async_trait]
impl PriceStore for Memory {
    async fn insert(&self, price: Decimal) -> Result<i32, StoreError> {
        let mut rows = self.rows.lock().await;

        let id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let timestamp = Utc::now().naive_utc();
        rows.push(PriceRecord::new(id, round_to_cents(price), timestamp));

        Ok(id)
    }



    async fn latest(&self, limit: usize) -> Result<Vec<PriceRecord>, StoreError> {
        let mut records = self.rows.lock().await.clone();

        records.sort_by(|a, b| {
            b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id))
        });
        records.truncate(limit);

        Ok(records)
    }
}



#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::*;

    fn at(hour: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap_or_else(|| unreachable!())
    }

    #[tokio::test]
    async fn test_latest_on_empty_store_is_empty() -> Result<(), StoreError> {
        let store = Memory::new();
        assert!(store.latest(10).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() -> Result<(), StoreError> {
        let store = Memory::new();
        let first = store.insert(dec!(100.00)).await?;
        let second = store.insert(dec!(200.00)).await?;
        assert!(second > first);
        assert_eq!(store.len().await, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_latest_respects_limit_and_order() -> Result<(), StoreError> {
        let store = Memory::new();
        for price in [dec!(1), dec!(2), dec!(3), dec!(4)] {
            store.insert(price).await?;
        }

        let two = store.latest(2).await?;
        assert_eq!(two.len(), 2);
        assert_eq!(two[0].price, dec!(4));
        assert_eq!(two[1].price, dec!(3));

        let all = store.latest(10).await?;
        assert_eq!(all.len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_latest_orders_by_timestamp_not_id() -> Result<(), StoreError> {
        let store = Memory::with_records(vec![
            PriceRecord::new(1, dec!(10.00), at(12)),
            PriceRecord::new(2, dec!(20.00), at(8)),
            PriceRecord::new(3, dec!(30.00), at(16)),
        ]);

        let ids: Vec<i32> = store.latest(3).await?.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_rounds_to_cents() -> Result<(), StoreError> {
        let store = Memory::new();
        store.insert(dec!(43250.756)).await?;
        let latest = store.latest(1).await?;
        assert_eq!(latest[0].price, dec!(43250.76));
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_rounds_half_cent_up() -> Result<(), StoreError> {
        let store = Memory::new();
        store.insert(dec!(0.125)).await?;
        let latest = store.latest(1).await?;
        assert_eq!(latest[0].price, dec!(0.13));
        Ok(())
    }

    #[tokio::test]
    async fn test_seeded_ids_continue() -> Result<(), StoreError> {
        let store = Memory::with_records(vec![PriceRecord::new(7, dec!(1.00), at(1))]);
        assert_eq!(store.insert(dec!(2.00)).await?, 8);
        Ok(())
    }
}
