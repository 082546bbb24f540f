use std::{
    error::Error,
    time::Duration,
};

use tokio::time::{
    interval,
    MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;
use tracing::{
    error,
    info,
};

use crate::job::Job;



/// Default period between two price fetches.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(4 * 60 * 60);



/// Run `job` right away and then once per `period` until `shut_down` is
/// cancelled.
///
/// Failed runs are logged and never stop the loop. Runs are serialized: the
/// next tick is only awaited after the current run finished, and ticks missed
/// meanwhile collapse into a single one.
pub async fn run<J: Job + ?Sized>(job: &J, period: Duration, shut_down: CancellationToken) {
    info!(period_secs = period.as_secs(), "Starting Bitcoin price scheduler");

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // First tick completes immediately, that is the startup run.
    let mut startup = true;

    loop {
        tokio::select! {
            biased;

            _ = shut_down.cancelled() => {
                info!("Scheduler stopped");
                return
            }
            _ = ticker.tick() => {}
        }

        if let Err(e) = job.run().await {
            let stage = if startup { "startup" } else { "scheduled" };
            error!(error = &e as &(dyn Error + 'static), stage, "Error fetching price");
        }
        startup = false;
    }
}
