use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskId, TaskKind};

pub type WorkerId = String;

/* --------- Rutas HTTP del coordinator --------- */

pub const HEALTH_PATH: &str = "/health";
pub const NEXT_TASK_PATH: &str = "/api/v1/tasks/next";
pub const COMPLETE_TASK_PATH: &str = "/api/v1/tasks/complete";
pub const STATUS_PATH: &str = "/api/v1/status";
pub const SHUTDOWN_PATH: &str = "/api/v1/shutdown";

pub const WAIT_MESSAGE: &str = "All map tasks started, please wait.";

/* --------- Pedir tarea --------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignmentRequest {
    pub worker_id: WorkerId,
}

/// Cuerpo del 200 de `/tasks/next`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignmentResponse {
    pub task: Option<Task>,
}

/// Cuerpo del 202: la fase map sigue en vuelo, hay que reintentar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitResponse {
    pub status: String,
    pub message: String,
}

impl WaitResponse {
    pub fn map_phase_in_flight() -> Self {
        Self {
            status: "wait".to_string(),
            message: WAIT_MESSAGE.to_string(),
        }
    }
}

/* --------- Reportar tarea completada --------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCompleteRequest {
    pub worker_id: WorkerId,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub task_id: TaskId,
}

impl TaskCompleteRequest {
    pub fn for_task(worker_id: &str, task: &Task) -> Self {
        Self {
            worker_id: worker_id.to_string(),
            kind: task.kind(),
            task_id: task.id(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCompleteResponse {
    pub status: String,
}

impl TaskCompleteResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}

/* --------- Estado y apagado --------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub completed_map_tasks: usize,
    pub completed_reduce_tasks: usize,
    pub all_completed: bool,

    pub num_map_tasks: usize,
    pub num_reduce_tasks: usize,
    pub pending_map_tasks: usize,
    pub pending_reduce_tasks: usize,

    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownResponse {
    pub status: String,
}
