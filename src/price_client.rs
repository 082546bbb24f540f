use std::time::Duration;

use reqwest::Client;

use rust_decimal::{
    prelude::FromPrimitive,
    Decimal,
};

use serde::Deserialize;

use tracing::debug;

use crate::{
    error::FetchError,
    price_info::round_to_cents,
};



pub const ASSET: &str = "bitcoin";
pub const CURRENCY: &str = "usd";



/// Client for the CoinGecko `simple/price` endpoint, fixed to BTC/USD.
///
/// Every call is a single request bounded by the configured timeout. There is
/// no retry here, the scheduler's next tick is the retry.
pub struct PriceClient {
    client: Client,
    url: String,
}



/// Structure that stores deserialized response from the price endpoint:
/// `{"bitcoin": {"usd": 43250.75}}`.
#[derive(Deserialize, Debug, Clone)]
struct DecodedBody {
    bitcoin: Option<DecodedQuote>,
}



#[derive(Deserialize, Debug, Clone)]
struct DecodedQuote {
    usd: Option<f64>,
}



impl PriceClient {
    /// `api_url` is the API base, i.e. `https://api.coingecko.com/api/v3`.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Request)?;

        Ok(Self {
            client,
            url: format!("{}/simple/price", api_url.trim_end_matches('/')),
        })
    }



    /// Retrieve the current price, rounded to cents. Only a 2xx response
    /// whose body carries a price of at least one cent counts as success.
    pub async fn fetch(&self) -> Result<Decimal, FetchError> {
        debug!(url = %self.url, "requesting price quote");

        let response = self.client
            .get(&self.url)
            .query(&[("ids", ASSET), ("vs_currencies", CURRENCY)])
            .send()
            .await
            .map_err(FetchError::Request)?;

        // Body of an error response is never parsed.
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status))
        }

        let body = response.text().await.map_err(FetchError::Body)?;
        let decoded: DecodedBody = serde_json::from_str(&body)?;

        let Some(raw) = decoded.bitcoin.and_then(|quote| quote.usd) else {
            return Err(FetchError::MissingPrice)
        };

        if !raw.is_finite() {
            return Err(FetchError::InvalidPrice(raw))
        }

        // Checked after rounding, a sub-cent quote would be stored as 0.00.
        let price = Decimal::from_f64(raw)
            .map(round_to_cents)
            .ok_or(FetchError::InvalidPrice(raw))?;
        if price <= Decimal::ZERO {
            return Err(FetchError::InvalidPrice(raw))
        }

        Ok(price)
    }
}
