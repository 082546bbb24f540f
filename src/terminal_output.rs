use std::io::{
    self,
    Write,
};

use crate::price_info::PriceRecord;



const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const RULE: &str = "----------------------------------------";



/// Render price records as a fixed-width table:
///
/// ```text
///
/// ID    Price (USD)  Timestamp
/// ----------------------------------------
/// 3     $50000.00    2024-01-15 16:00:00
///
/// ```
pub fn write_price_table<W: Write>(out: &mut W, records: &[PriceRecord]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{:<5} {:<12} {:<20}", "ID", "Price (USD)", "Timestamp")?;
    writeln!(out, "{}", RULE)?;

    for record in records {
        let price = format!("${:.2}", record.price);
        let timestamp = record.timestamp.format(TIMESTAMP_FORMAT).to_string();
        writeln!(out, "{:<5} {:<12} {:<20}", record.id, price, timestamp)?;
    }

    writeln!(out)?;
    out.flush()
}
