mod worker;

use anyhow::{Context, Result};
use clap::Parser;
use common::config::DEFAULT_CONFIG_PATH;
use common::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "worker")]
#[command(about = "Worker del WordCount: pide tareas al coordinator hasta que no quede nada")]
struct Args {
    /// Identificador del worker (si no se pasa, se genera uno)
    #[arg(value_name = "ID")]
    id: Option<String>,

    /// Archivo de configuración YAML
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("worker=debug,reqwest=info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load_or_default(&args.config)
        .with_context(|| format!("cargando {}", args.config.display()))?;

    let worker_id = args
        .id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    worker::run(config, worker_id).await
}
