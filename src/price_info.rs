use chrono::NaiveDateTime;
use rust_decimal::{
    Decimal,
    RoundingStrategy,
};



/// Digits after the decimal point kept for a stored price.
pub const PRICE_SCALE: u32 = 2;



/// Round `price` to cents the way a Postgres `DECIMAL(15,2)` column does,
/// halves away from zero.
pub fn round_to_cents(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}



/// One observed Bitcoin price as stored in `bitcoin_prices`.
///
/// `id` - assigned by the store on insert, strictly increasing.
/// `price` - quoted price in USD, kept with 2 decimal digits.
/// `timestamp` - moment the row was inserted, set by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub id: i32,
    pub price: Decimal,
    pub timestamp: NaiveDateTime,
}



impl PriceRecord {
    pub fn new(id: i32, price: Decimal, timestamp: NaiveDateTime) -> Self {
        Self {
            id, price, timestamp,
        }
    }
}
