use std::{
    error::Error,
    io,
    process::ExitCode,
};

use clap::Parser;
use tracing::{
    debug,
    error,
    info,
};
use tracing_subscriber::EnvFilter;

use price_tracker::{
    command::{
        self,
        Command,
        Context,
    },
    config::Config,
    job::FetchAndPersist,
    price_client::PriceClient,
    shared_state::SharedState,
    storage::postgres::Postgres,
};



/// Track the Bitcoin price in a Postgres table.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// Mode to run: fetch, display or scheduler (default).
    command: Option<String>,
}



fn init_tracing() {
    let (filter, env_err) = match EnvFilter::try_from_default_env() {
        Ok(f) => (f, None),
        Err(e) => (EnvFilter::new("price_tracker=info"), Some(e)),
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();
    if let Some(e) = env_err {
        // RUST_LOG unset ends up here as well.
        debug!(error = %e, "invalid RUST_LOG filter, using default");
    }
}



#[tokio::main]
async fn main() -> ExitCode {
    let dotenv_result = dotenv::dotenv();
    init_tracing();

    if let Err(e) = dotenv_result {
        debug!(error = %e, "no .env loaded, using process environment only");
    }

    let cli = Cli::parse();
    info!("Starting Bitcoin Price Tracker");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            return ExitCode::FAILURE
        }
    };

    let client = match PriceClient::new(&config.api_url, config.http_timeout) {
        Ok(client) => client,
        Err(e) => {
            error!(error = &e as &(dyn Error + 'static), "Failed to build HTTP client");
            return ExitCode::FAILURE
        }
    };

    let store = match Postgres::connect(&config.database_url).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = &e as &(dyn Error + 'static), "Failed to initialize database");
            return ExitCode::FAILURE
        }
    };

    let job = FetchAndPersist::new(client, store);
    let command = Command::parse(cli.command.as_deref());

    let state = SharedState::default();
    let signal_h = command.runs_until_shut_down()
        .then(|| state.shut_down_on_ctrl_c());

    let mut stdout = io::stdout();
    let result = command::dispatch(command, Context {
        job: &job,
        period: config.fetch_interval,
        shut_down: state.shut_down.clone(),
        out: &mut stdout,
    }).await;

    // Stop the signal listener, if any, and release the pool on every path.
    state.shut_down.cancel();
    if let Some(handle) = signal_h {
        if let Err(e) = handle.await {
            debug!(error = %e, "signal listener did not finish cleanly");
        }
    }
    job.into_store().close();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = &e as &(dyn Error + 'static), "Failed to fetch price");
            ExitCode::FAILURE
        }
    }
}
