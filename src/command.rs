use std::{
    error::Error,
    io::Write,
    time::Duration,
};

use tokio_util::sync::CancellationToken;
use tracing::{
    error,
    info,
};

use crate::{
    error::OperationError,
    job::{
        FetchAndPersist,
        Job,
    },
    scheduler,
    storage::PriceStore,
    terminal_output::write_price_table,
};



/// Number of records shown by `display`.
pub const DISPLAY_LIMIT: usize = 10;

pub const AVAILABLE_COMMANDS: &str = "fetch, display, scheduler";



/// Mode the process runs in, selected by the first positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch and store one price, then exit.
    Fetch,
    /// Print the latest stored prices, then exit.
    Display,
    /// Fetch on startup and every period until shut down.
    Scheduler,
    Unknown(String),
}



impl Command {
    /// No argument means scheduler mode.
    pub fn parse(arg: Option<&str>) -> Self {
        match arg {
            None | Some("scheduler") => Command::Scheduler,
            Some("fetch") => Command::Fetch,
            Some("display") => Command::Display,
            Some(other) => Command::Unknown(other.to_string()),
        }
    }



    /// Whether the command keeps running until shut down. Only such commands
    /// need the Ctrl-C listener, one-shot commands keep the default signal
    /// handling and die on Ctrl-C.
    pub fn runs_until_shut_down(&self) -> bool {
        matches!(self, Command::Scheduler)
    }
}



/// Everything a command may need to run.
pub struct Context<'a, S, W> {
    pub job: &'a FetchAndPersist<S>,
    pub period: Duration,
    pub shut_down: CancellationToken,
    pub out: &'a mut W,
}



/// Run `command`. Only a failed one-shot fetch is reported as an error,
/// display failures are logged and the scheduler logs failures per run.
pub async fn dispatch<S, W>(command: Command, ctx: Context<'_, S, W>)
    -> Result<(), OperationError>
where
    S: PriceStore,
    W: Write,
{
    match command {
        Command::Fetch => ctx.job.run().await,

        Command::Display => {
            display_latest_prices(ctx.job.store(), ctx.out).await;
            Ok(())
        }

        Command::Scheduler => {
            scheduler::run(ctx.job, ctx.period, ctx.shut_down).await;
            Ok(())
        }

        Command::Unknown(name) => {
            info!("Unknown command: {}", name);
            info!("Available commands: {}", AVAILABLE_COMMANDS);
            Ok(())
        }
    }
}



async fn display_latest_prices<S: PriceStore, W: Write>(store: &S, out: &mut W) {
    info!("Displaying latest price records...");

    let records = match store.latest(DISPLAY_LIMIT).await {
        Ok(records) => records,
        Err(e) => {
            error!(error = &e as &(dyn Error + 'static), "Error fetching latest prices");
            return
        }
    };

    if records.is_empty() {
        info!("No price records found in database");
        return
    }

    if let Err(e) = write_price_table(out, &records) {
        error!(error = %e, "could not write price table");
    }
}
