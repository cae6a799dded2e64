// coordinator/src/state.rs

use chrono::{DateTime, Utc};
use common::Scheduler;
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};

#[derive(Clone)]
pub struct AppState {
    // cola de tareas + completadas, todo detrás de un único lock
    pub scheduler: Arc<Mutex<Scheduler>>,
    // avisa al monitor cada vez que se registra una tarea completada
    pub completions: Arc<Notify>,
    pub shutdown: ShutdownHook,

    pub started_at: DateTime<Utc>,
    pub finished_at: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    pub fn new(scheduler: Scheduler, shutdown: ShutdownHook) -> Self {
        Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            completions: Arc::new(Notify::new()),
            shutdown,
            started_at: Utc::now(),
            finished_at: Arc::new(Mutex::new(None)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    Initiated,
    AlreadyInProgress,
    /// No hay servidor escuchando el aviso: el proceso no se va a detener.
    Unavailable,
}

/// Gancho para apagar el servidor HTTP. Sólo se puede disparar una vez.
#[derive(Clone, Default)]
pub struct ShutdownHook {
    inner: Arc<Mutex<HookInner>>,
}

#[derive(Default)]
struct HookInner {
    tx: Option<oneshot::Sender<()>>,
    fired: bool,
}

impl ShutdownHook {
    /// Devuelve el gancho y el receiver que hay que pasarle a
    /// `with_graceful_shutdown`.
    pub fn new() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let hook = Self {
            inner: Arc::new(Mutex::new(HookInner {
                tx: Some(tx),
                fired: false,
            })),
        };
        (hook, rx)
    }

    /// Gancho sin servidor detrás (tests, o estado armado a mano).
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn trigger(&self) -> ShutdownOutcome {
        let Ok(mut inner) = self.inner.lock() else {
            return ShutdownOutcome::Unavailable;
        };

        if inner.fired {
            return ShutdownOutcome::AlreadyInProgress;
        }

        match inner.tx.take() {
            Some(tx) => {
                if tx.send(()).is_ok() {
                    inner.fired = true;
                    ShutdownOutcome::Initiated
                } else {
                    ShutdownOutcome::Unavailable
                }
            }
            None => ShutdownOutcome::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_se_dispara_una_sola_vez() {
        let (hook, mut rx) = ShutdownHook::new();
        assert_eq!(hook.trigger(), ShutdownOutcome::Initiated);
        assert_eq!(hook.clone().trigger(), ShutdownOutcome::AlreadyInProgress);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn shutdown_sin_servidor_es_unavailable() {
        assert_eq!(ShutdownHook::unavailable().trigger(), ShutdownOutcome::Unavailable);

        let (hook, rx) = ShutdownHook::new();
        drop(rx);
        assert_eq!(hook.trigger(), ShutdownOutcome::Unavailable);
        // sigue sin poder apagarse
        assert_eq!(hook.trigger(), ShutdownOutcome::Unavailable);
    }
}
