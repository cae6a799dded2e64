use crate::state::{AppState, ShutdownOutcome};
use chrono::Utc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Espera a que todas las tareas (map y reduce) estén completadas y
/// apaga el servidor una sola vez.
///
/// Se despierta con cada tarea completada (`completions`) o, como mucho,
/// cada `interval`.
pub async fn watch_completion(state: AppState, interval: Duration) {
    loop {
        let done = match state.scheduler.lock() {
            Ok(scheduler) => scheduler.is_all_completed(),
            Err(_) => {
                warn!("lock del scheduler envenenado, el monitor se detiene");
                return;
            }
        };

        if done {
            break;
        }

        tokio::select! {
            _ = state.completions.notified() => {}
            _ = sleep(interval) => {}
        }
    }

    if let Ok(mut finished) = state.finished_at.lock() {
        *finished = Some(Utc::now());
    }

    info!("todas las tareas completadas, apagando el coordinator");
    match state.shutdown.trigger() {
        ShutdownOutcome::Initiated => {}
        ShutdownOutcome::AlreadyInProgress => info!("el apagado ya estaba en curso"),
        ShutdownOutcome::Unavailable => {
            warn!("no se pudo apagar el servidor: gancho de apagado no disponible")
        }
    }
}
