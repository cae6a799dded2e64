use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use common::config::DEFAULT_CONFIG_PATH;
use common::protocol::{SHUTDOWN_PATH, STATUS_PATH};
use common::{Config, ShutdownResponse, StatusResponse};
use reqwest::Client;
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::process::{Child, Command};

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "CLI simple para hablar con el coordinator")]
pub struct Cli {
    /// Archivo de configuración YAML
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Consulta cuántas tareas map/reduce están completadas
    Status,

    /// Pide al coordinator que se apague
    Shutdown,

    /// Lanza un coordinator y N workers en esta máquina
    Launch {
        /// Cantidad de workers
        #[arg(value_name = "WORKERS", default_value_t = 4)]
        workers: usize,

        /// Segundos a esperar antes de lanzar los workers
        #[arg(long, default_value_t = 5)]
        startup_delay: u64,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("cargando {}", cli.config.display()))?;
    let client = Client::new();
    let base_url = config.coordinator_base_url();

    match cli.command {
        Commands::Status => {
            let url = format!("{}{}", base_url, STATUS_PATH);
            let resp = client.get(&url).send().await?;
            if resp.status().is_success() {
                let st: StatusResponse = resp.json().await?;
                print!("{}", render_status(&st));
            } else {
                println!("Error consultando {} (status {})", STATUS_PATH, resp.status());
            }
        }

        Commands::Shutdown => {
            let url = format!("{}{}", base_url, SHUTDOWN_PATH);
            let resp = client.post(&url).send().await?;
            let code = resp.status();
            let body: ShutdownResponse = resp.json().await?;
            println!("Coordinator: {} (status {})", body.status, code);
            if !code.is_success() {
                bail!("el coordinator no pudo apagarse");
            }
        }

        Commands::Launch {
            workers,
            startup_delay,
        } => {
            launch(&cli.config, workers, Duration::from_secs(startup_delay)).await?;
        }
    }

    Ok(())
}

fn render_status(st: &StatusResponse) -> String {
    let mut out = String::new();
    out.push_str("Job:\n");
    out.push_str(&format!(
        "  map    : {}/{} completadas ({} pendientes)\n",
        st.completed_map_tasks, st.num_map_tasks, st.pending_map_tasks
    ));
    out.push_str(&format!(
        "  reduce : {}/{} completadas ({} pendientes)\n",
        st.completed_reduce_tasks, st.num_reduce_tasks, st.pending_reduce_tasks
    ));
    out.push_str(&format!("  terminado: {}\n", st.all_completed));
    if let Some(ref started) = st.started_at {
        out.push_str(&format!("  iniciado: {}\n", started));
    }
    if let Some(ref done) = st.finished_at {
        out.push_str(&format!("  finalizado: {}\n", done));
    }
    out
}

/// Ruta a otro binario del workspace, en la misma carpeta que este ejecutable.
fn sibling_binary(name: &str) -> Result<PathBuf> {
    let exe = env::current_exe().context("no se pudo ubicar el ejecutable actual")?;
    let mut path = exe.with_file_name(name);
    if cfg!(windows) {
        path.set_extension("exe");
    }
    Ok(path)
}

async fn launch(config_path: &Path, workers: usize, startup_delay: Duration) -> Result<()> {
    let mut coordinator = Command::new(sibling_binary("coordinator")?)
        .arg("--config")
        .arg(config_path)
        .spawn()
        .context("no se pudo lanzar el coordinator")?;
    println!("Launcher: coordinator lanzado.");

    // le damos tiempo a que cree las tareas y abra el puerto
    tokio::time::sleep(startup_delay).await;

    let worker_bin = sibling_binary("worker")?;
    let mut children: Vec<Child> = Vec::new();
    for i in 0..workers {
        let child = Command::new(&worker_bin)
            .arg(i.to_string())
            .arg("--config")
            .arg(config_path)
            .spawn()
            .with_context(|| format!("no se pudo lanzar el worker {}", i))?;
        children.push(child);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    println!("Launcher: {} workers lanzados.", workers);

    let status = coordinator.wait().await?;
    println!("Launcher: coordinator terminó ({}).", status);

    for (i, mut child) in children.into_iter().enumerate() {
        let st = child.wait().await?;
        if !st.success() {
            println!("Launcher: worker {} terminó con {}", i, st);
        }
    }

    Ok(())
}
