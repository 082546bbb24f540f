use async_trait::async_trait;
use tracing::info;

use crate::{
    error::OperationError,
    price_client::PriceClient,
    storage::PriceStore,
};



/// Unit of work driven by the scheduler.
#[async_trait]
pub trait Job: Send + Sync {
    async fn run(&self) -> Result<(), OperationError>;
}



/// Fetch the current price and append it to the store.
///
/// A failed fetch never touches the store. A failed insert drops the fetched
/// price, the next run simply tries again.
pub struct FetchAndPersist<S> {
    client: PriceClient,
    store: S,
}



impl<S: PriceStore> FetchAndPersist<S> {
    pub fn new(client: PriceClient, store: S) -> Self {
        Self {
            client,
            store,
        }
    }



    pub fn store(&self) -> &S {
        &self.store
    }



    pub fn into_store(self) -> S {
        self.store
    }
}



#[async_trait]
impl<S: PriceStore> Job for FetchAndPersist<S> {
    async fn run(&self) -> Result<(), OperationError> {
        info!("Fetching Bitcoin price...");

        let price = self.client.fetch().await.map_err(OperationError::Fetch)?;
        let id = self.store.insert(price).await.map_err(OperationError::Persist)?;

        info!(%price, id, "Successfully recorded Bitcoin price");
        Ok(())
    }
}
