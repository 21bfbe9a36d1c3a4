#![warn(clippy::all)]

use std::sync::Arc;

use anyhow::Context;
use foodgram::{
    config::Config, database::connection::establish_pooled_connection, http::start_server,
    store::DatabaseStore,
};
use tokio::runtime::Runtime;
use tracing::{info, trace_span};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

fn main() -> anyhow::Result<()> {
    let stdout_log = tracing_subscriber::fmt::layer();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default().with(filter).with(stdout_log);

    tracing::subscriber::set_global_default(subscriber)
        .context("Unable to set global subscriber")?;

    start()
}

fn start() -> anyhow::Result<()> {
    let span = trace_span!("starting main");
    let _guard = span.enter();

    let config = Config::load()?;

    info!("Establishing pooled connection");
    let pool = establish_pooled_connection(&config).context("Failed to create pool")?;
    let store = Arc::new(DatabaseStore::new(pool));

    let rt = Runtime::new().context("Unable to create Runtime")?;
    rt.block_on(start_server(store, config.port))?;

    Ok(())
}
