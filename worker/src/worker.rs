use anyhow::{bail, Context, Result};
use common::protocol::{COMPLETE_TASK_PATH, NEXT_TASK_PATH, WAIT_MESSAGE};
use common::wordcount::{run_map_task, run_reduce_task};
use common::{
    Config, Task, TaskAssignmentRequest, TaskAssignmentResponse, TaskCompleteRequest,
    WaitResponse,
};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Lo que contestó el coordinator al pedir tarea.
#[derive(Debug, PartialEq)]
pub enum Poll {
    Task(Task),
    Wait(String),
    Done,
    Unexpected(StatusCode, String),
}

/// Interpreta la respuesta de `/tasks/next` según el código HTTP.
pub fn classify(status: StatusCode, body: &[u8]) -> Poll {
    match status {
        StatusCode::OK => match serde_json::from_slice::<TaskAssignmentResponse>(body) {
            Ok(TaskAssignmentResponse { task: Some(task) }) => Poll::Task(task),
            Ok(TaskAssignmentResponse { task: None }) => Poll::Done,
            Err(e) => Poll::Unexpected(status, format!("respuesta inválida: {e}")),
        },
        StatusCode::ACCEPTED => {
            let message = serde_json::from_slice::<WaitResponse>(body)
                .map(|w| w.message)
                .unwrap_or_else(|_| WAIT_MESSAGE.to_string());
            Poll::Wait(message)
        }
        StatusCode::NO_CONTENT => Poll::Done,
        other => Poll::Unexpected(other, String::from_utf8_lossy(body).to_string()),
    }
}

/// Cuenta fallos de red seguidos. Con `attempts = 0` el primer fallo ya aborta.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
    failures: u32,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts,
            delay,
            failures: 0,
        }
    }

    /// Registra un fallo y duerme `delay`. Devuelve `true` si se puede reintentar.
    pub async fn backoff(&mut self) -> bool {
        self.failures += 1;
        sleep(self.delay).await;
        self.failures <= self.attempts
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }
}

/// Loop principal del worker.
/// - Pide tarea al coordinator.
/// - 204 (o 200 sin tarea): termina.
/// - 202: duerme `retry_delay` y vuelve a pedir.
/// - 200 con tarea: la ejecuta y reporta que terminó.
/// - Cualquier otra cosa: termina con error.
///
/// Si el coordinator deja de responder después de haber contestado al menos
/// una vez, se asume que terminó el job y se apagó: el worker sale con `Ok`.
pub async fn run(config: Config, worker_id: String) -> Result<()> {
    let client = Client::new();
    let base_url = config.coordinator_base_url();
    let delay = config.task_settings.retry_delay;
    let mut retries = RetryPolicy::new(config.task_settings.retry_attempts, delay);

    let hostname = hostname::get()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    info!("worker {} arrancando en {} contra {}", worker_id, hostname, base_url);

    let mut contacted = false;

    loop {
        let poll = match fetch_task(&client, &base_url, &worker_id).await {
            Ok(p) => {
                contacted = true;
                retries.reset();
                p
            }
            Err(e) => {
                warn!("worker {}: error hablando con el coordinator: {:?}", worker_id, e);
                if retries.backoff().await {
                    continue;
                }
                if contacted {
                    info!(
                        "worker {}: el coordinator ya no responde (job terminado?), saliendo",
                        worker_id
                    );
                    return Ok(());
                }
                bail!("worker {}: coordinator inalcanzable, abortando", worker_id);
            }
        };

        match poll {
            Poll::Done => {
                info!("worker {}: no quedan tareas, saliendo", worker_id);
                return Ok(());
            }
            Poll::Wait(message) => {
                info!(
                    "worker {}: señal de espera ({}), reintento en {:?}",
                    worker_id, message, delay
                );
                sleep(delay).await;
            }
            Poll::Task(task) => {
                info!(
                    "worker {}: procesando tarea {:?} {}",
                    worker_id,
                    task.kind(),
                    task.id()
                );
                execute_task(&config, task.clone()).await?;
                report_with_retries(&client, &base_url, &worker_id, &task, &mut retries).await?;
            }
            Poll::Unexpected(status, detail) => {
                bail!(
                    "worker {}: respuesta inesperada {} del coordinator: {}",
                    worker_id,
                    status,
                    detail
                );
            }
        }
    }
}

async fn fetch_task(client: &Client, base_url: &str, worker_id: &str) -> Result<Poll> {
    let url = format!("{}{}", base_url, NEXT_TASK_PATH);
    let resp = client
        .post(&url)
        .json(&TaskAssignmentRequest {
            worker_id: worker_id.to_string(),
        })
        .send()
        .await?;

    let status = resp.status();
    let body = resp.bytes().await?;
    Ok(classify(status, &body))
}

async fn report_completion(client: &Client, base_url: &str, worker_id: &str, task: &Task) -> Result<()> {
    let url = format!("{}{}", base_url, COMPLETE_TASK_PATH);
    client
        .post(&url)
        .json(&TaskCompleteRequest::for_task(worker_id, task))
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

async fn report_with_retries(
    client: &Client,
    base_url: &str,
    worker_id: &str,
    task: &Task,
    retries: &mut RetryPolicy,
) -> Result<()> {
    loop {
        match report_completion(client, base_url, worker_id, task).await {
            Ok(()) => {
                debug!("worker {}: tarea {} reportada", worker_id, task.id());
                retries.reset();
                return Ok(());
            }
            Err(e) => {
                warn!(
                    "worker {}: no se pudo reportar la tarea {}: {:?}",
                    worker_id,
                    task.id(),
                    e
                );
                if !retries.backoff().await {
                    bail!("worker {}: coordinator inalcanzable, abortando", worker_id);
                }
            }
        }
    }
}

/// Ejecuta el cuerpo de la tarea en un hilo de bloqueo (todo es I/O de archivos).
/// Un error acá es fatal para el worker: la tarea nunca se reporta.
pub async fn execute_task(config: &Config, task: Task) -> Result<()> {
    let dirs = config.directories.clone();
    let num_reduce = u32::try_from(config.mapreduce.num_reduce_tasks)
        .context("mapreduce.num_reduce_tasks fuera de rango")?;
    let label = format!("{:?} {}", task.kind(), task.id());

    tokio::task::spawn_blocking(move || match &task {
        Task::Map { task_id, files } => {
            run_map_task(*task_id, files, &dirs.input, &dirs.intermediate, num_reduce)
        }
        Task::Reduce { task_id } => run_reduce_task(*task_id, &dirs.intermediate, &dirs.output),
    })
    .await
    .with_context(|| format!("panic o join error en tarea {}", label))?
    .with_context(|| format!("error procesando tarea {}", label))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::{env, fs, path::PathBuf};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn temp_dir(sub: &str) -> PathBuf {
        let base = env::temp_dir().join("worker_tests").join(sub);
        let _ = fs::remove_dir_all(&base);
        fs::create_dir_all(&base).unwrap();
        base
    }

    #[test]
    fn classify_200_con_tarea() {
        let body = json!({"task": {"type": "map", "task_id": 2, "files": ["a.txt"]}}).to_string();
        assert_eq!(
            classify(StatusCode::OK, body.as_bytes()),
            Poll::Task(Task::Map {
                task_id: 2,
                files: vec!["a.txt".to_string()]
            })
        );
    }

    #[test]
    fn classify_200_sin_tarea_y_204_son_done() {
        assert_eq!(classify(StatusCode::OK, br#"{"task": null}"#), Poll::Done);
        assert_eq!(classify(StatusCode::NO_CONTENT, b""), Poll::Done);
    }

    #[test]
    fn classify_202_es_espera() {
        let body = json!({"status": "wait", "message": "espera"}).to_string();
        assert_eq!(
            classify(StatusCode::ACCEPTED, body.as_bytes()),
            Poll::Wait("espera".to_string())
        );
        // cuerpo roto: igual es espera
        assert_eq!(
            classify(StatusCode::ACCEPTED, b"???"),
            Poll::Wait(WAIT_MESSAGE.to_string())
        );
    }

    #[test]
    fn classify_otros_codigos_son_inesperados() {
        assert!(matches!(
            classify(StatusCode::INTERNAL_SERVER_ERROR, b"boom"),
            Poll::Unexpected(StatusCode::INTERNAL_SERVER_ERROR, _)
        ));
        assert!(matches!(
            classify(StatusCode::OK, b"no es json"),
            Poll::Unexpected(StatusCode::OK, _)
        ));
    }

    fn config_against(port: u16) -> Config {
        let mut config = Config::default();
        config.coordinator.host = "127.0.0.1".to_string();
        config.coordinator.port = port;
        config.task_settings.retry_attempts = 0;
        config.task_settings.retry_delay = Duration::from_millis(1);
        config
    }

    /// Puerto que nadie escucha.
    async fn free_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    /// Lee un request HTTP entero (headers + body por content-length).
    async fn read_request(sock: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = sock.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let len = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + len {
                    return;
                }
            }
        }
    }

    #[tokio::test]
    async fn run_sin_coordinator_termina_con_error() {
        let config = config_against(free_port().await);
        let res = run(config, "w-test".to_string()).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn run_sale_bien_si_el_coordinator_desaparece_despues_de_contestar() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            // se cierra el puerto antes de contestar: el próximo pedido falla
            drop(listener);
            read_request(&mut sock).await;
            sock.write_all(b"HTTP/1.1 202 Accepted\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .await
                .unwrap();
            sock.shutdown().await.unwrap();
        });

        let res = run(config_against(port), "w-test".to_string()).await;
        server.await.unwrap();
        assert!(res.is_ok(), "{:?}", res);
    }

    #[tokio::test]
    async fn execute_task_rechaza_num_reduce_fuera_de_rango() {
        if usize::BITS <= u32::BITS {
            return;
        }
        let mut config = Config::default();
        config.mapreduce.num_reduce_tasks = (u32::MAX as usize).saturating_add(1);
        let res = execute_task(
            &config,
            Task::Map {
                task_id: 0,
                files: vec![],
            },
        )
        .await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn retry_policy_con_cero_intentos_aborta_al_primer_fallo() {
        let mut p = RetryPolicy::new(0, Duration::from_millis(1));
        assert!(!p.backoff().await);
    }

    #[tokio::test]
    async fn retry_policy_cuenta_fallos_seguidos() {
        let mut p = RetryPolicy::new(2, Duration::from_millis(1));
        assert!(p.backoff().await);
        assert!(p.backoff().await);
        assert!(!p.backoff().await);

        p.reset();
        assert!(p.backoff().await);
    }

    #[tokio::test]
    async fn execute_task_corre_map_y_reduce_en_disco() {
        let tmp = temp_dir("execute");
        let mut config = Config::default();
        config.directories.input = tmp.join("input");
        config.directories.intermediate = tmp.join("intermediate");
        config.directories.output = tmp.join("output");
        config.mapreduce.num_reduce_tasks = 2;
        fs::create_dir_all(&config.directories.input).unwrap();
        fs::write(config.directories.input.join("x.txt"), "Apple. apple bee\n").unwrap();

        execute_task(
            &config,
            Task::Map {
                task_id: 0,
                files: vec!["x.txt".to_string()],
            },
        )
        .await
        .unwrap();
        for r in 0..2 {
            execute_task(&config, Task::Reduce { task_id: r }).await.unwrap();
        }

        let mut all = String::new();
        for r in 0..2 {
            all.push_str(&fs::read_to_string(config.directories.output.join(format!("out-{}", r))).unwrap());
        }
        let mut lines: Vec<&str> = all.lines().collect();
        lines.sort();
        assert_eq!(lines, vec!["apple 2", "bee 1"]);
    }

    #[tokio::test]
    async fn execute_task_falla_si_falta_el_archivo() {
        let tmp = temp_dir("execute_missing");
        let mut config = Config::default();
        config.directories.input = tmp.clone();
        config.directories.intermediate = tmp.join("intermediate");

        let res = execute_task(
            &config,
            Task::Map {
                task_id: 0,
                files: vec!["nada.txt".to_string()],
            },
        )
        .await;
        assert!(res.is_err());
    }
}
