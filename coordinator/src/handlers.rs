use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use common::protocol::{
    COMPLETE_TASK_PATH, HEALTH_PATH, NEXT_TASK_PATH, SHUTDOWN_PATH, STATUS_PATH,
};
use common::{
    Assignment, CompletionOutcome, ShutdownResponse, StatusResponse, TaskAssignmentRequest,
    TaskAssignmentResponse, TaskCompleteRequest, TaskCompleteResponse, WaitResponse,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::state::{AppState, ShutdownOutcome};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(NEXT_TASK_PATH, post(assign_task))
        .route(COMPLETE_TASK_PATH, post(complete_task))
        .route(STATUS_PATH, get(status))
        .route(SHUTDOWN_PATH, post(shutdown))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

// Entrega la siguiente tarea: 200 con tarea, 202 si hay que esperar, 204 si no queda nada
async fn assign_task(
    State(state): State<AppState>,
    Json(req): Json<TaskAssignmentRequest>,
) -> Result<Response, StatusCode> {
    let assignment = {
        let mut scheduler = state
            .scheduler
            .lock()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        scheduler.next_task()
    };

    let resp = match assignment {
        Assignment::Task(task) => {
            info!(
                "asignando tarea {:?} {} al worker {}",
                task.kind(),
                task.id(),
                req.worker_id
            );
            (
                StatusCode::OK,
                Json(TaskAssignmentResponse { task: Some(task) }),
            )
                .into_response()
        }
        Assignment::Wait => {
            debug!(
                "worker {} pidió tarea durante la barrera map->reduce, que espere",
                req.worker_id
            );
            (StatusCode::ACCEPTED, Json(WaitResponse::map_phase_in_flight())).into_response()
        }
        Assignment::Done => {
            debug!("worker {} pidió tarea pero no queda nada", req.worker_id);
            StatusCode::NO_CONTENT.into_response()
        }
    };

    Ok(resp)
}

// Worker reporta que terminó una tarea
async fn complete_task(
    State(state): State<AppState>,
    Json(req): Json<TaskCompleteRequest>,
) -> Result<Json<TaskCompleteResponse>, StatusCode> {
    let outcome = {
        let mut scheduler = state
            .scheduler
            .lock()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        scheduler.complete_task(req.kind, req.task_id)
    };

    match outcome {
        CompletionOutcome::Recorded => {
            info!(
                "worker {} completó tarea {:?} {}",
                req.worker_id, req.kind, req.task_id
            );
            state.completions.notify_one();
        }
        CompletionOutcome::Duplicate => {
            debug!(
                "tarea {:?} {} ya estaba completada (reporte repetido de {})",
                req.kind, req.task_id, req.worker_id
            );
        }
        CompletionOutcome::Unknown => {
            warn!(
                "worker {} reportó tarea desconocida {:?} {}, se ignora",
                req.worker_id, req.kind, req.task_id
            );
        }
    }

    Ok(Json(TaskCompleteResponse::success()))
}

async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    let mut status = {
        let scheduler = state
            .scheduler
            .lock()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        scheduler.status()
    };

    status.started_at = Some(state.started_at);
    status.finished_at = *state
        .finished_at
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(status))
}

async fn shutdown(State(state): State<AppState>) -> (StatusCode, Json<ShutdownResponse>) {
    info!("pedido de apagado recibido");

    let (code, msg) = match state.shutdown.trigger() {
        ShutdownOutcome::Initiated => (StatusCode::OK, "shutdown initiated"),
        ShutdownOutcome::AlreadyInProgress => (StatusCode::ACCEPTED, "shutdown already in progress"),
        ShutdownOutcome::Unavailable => {
            warn!("no hay gancho de apagado disponible, el servidor sigue corriendo");
            (StatusCode::SERVICE_UNAVAILABLE, "shutdown unavailable")
        }
    };

    (
        code,
        Json(ShutdownResponse {
            status: msg.to_string(),
        }),
    )
}
