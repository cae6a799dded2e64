mod handlers;
mod input;
mod monitor;
mod state;

use crate::state::{AppState, ShutdownHook};
use anyhow::{Context, Result};
use clap::Parser;
use common::config::DEFAULT_CONFIG_PATH;
use common::{Config, Scheduler};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coordinator")]
#[command(about = "Reparte las tareas map/reduce del WordCount entre los workers")]
struct Args {
    /// Archivo de configuración YAML
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("coordinator=debug,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load_or_default(&args.config)
        .with_context(|| format!("cargando {}", args.config.display()))?;

    // carpetas limpias para este job
    input::prepare_dir(&config.directories.intermediate)?;
    input::prepare_dir(&config.directories.output)?;

    let units = input::discover_inputs(&config.directories.input)?;

    let mut scheduler = Scheduler::new();
    scheduler.create_tasks(
        &units,
        config.mapreduce.num_map_tasks,
        config.mapreduce.num_reduce_tasks,
    )?;
    info!(
        "{} archivos de entrada -> {} tareas map, {} tareas reduce",
        units.len(),
        scheduler.num_map_tasks(),
        scheduler.num_reduce_tasks()
    );

    let (hook, shutdown_rx) = ShutdownHook::new();
    let state = AppState::new(scheduler, hook);

    // router HTTP
    let app = handlers::build_router(state.clone());

    // monitor de fin de job en segundo plano
    let monitor_state = state.clone();
    let interval = config.coordinator.monitor_interval;
    tokio::spawn(async move {
        monitor::watch_completion(monitor_state, interval).await;
    });

    let listener = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("no se pudo escuchar en {}", config.bind_addr()))?;
    info!("coordinator escuchando en {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_rx))
        .await?;

    info!("coordinator detenido");
    Ok(())
}

async fn shutdown_signal(rx: oneshot::Receiver<()>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("no se pudo escuchar ctrl-c: {:?}", e);
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = rx => {}
        _ = ctrl_c => {}
    }
}
