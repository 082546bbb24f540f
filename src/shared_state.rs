use tokio_util::sync::CancellationToken;
use tracing::{
    info,
    warn,
};



#[derive(Default)]
pub struct SharedState {
    // Cancelled once the process should stop. Long running loops select on
    // it, one-shot commands ignore it.
    pub shut_down: CancellationToken,
}



impl SharedState {
    /// Cancel `shut_down` on Ctrl-C.
    pub fn shut_down_on_ctrl_c(&self) -> tokio::task::JoinHandle<()> {
        let shut_down = self.shut_down.clone();

        tokio::spawn(async move {
            tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    match res {
                        Ok(()) => info!("Shutdown signal received"),
                        Err(e) => warn!(error = %e, "could not listen for Ctrl-C"),
                    }
                    shut_down.cancel();
                }
                _ = shut_down.cancelled() => {}
            }
        })
    }
}
