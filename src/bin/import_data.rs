#![warn(clippy::all)]

use std::{env, path::PathBuf};

use anyhow::Context;
use foodgram::{
    catalog::import_catalog, config::Config, database::connection::establish_connection,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load()?;
    let data_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.data_dir.clone());

    let mut connection = establish_connection(&config)
        .context("Error connecting to the database")?;

    info!("Importing catalog from {}", data_dir.display());
    let report = import_catalog(&mut connection, &data_dir)?;
    info!(
        ingredients = report.ingredients,
        tags = report.tags,
        "Catalog imported"
    );

    Ok(())
}
