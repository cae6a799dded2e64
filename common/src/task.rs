use serde::{Deserialize, Serialize};

pub type TaskId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Map,
    Reduce,
}

/// Unidad de trabajo que se reparte a los workers.
///
/// Se crean todas al arrancar el job y no se modifican nunca:
/// sólo salen de la cola pendiente o se marcan como completadas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Task {
    Map {
        task_id: TaskId,
        /// Nombres de archivo relativos al directorio de entrada
        files: Vec<String>,
    },
    Reduce {
        task_id: TaskId,
    },
}

impl Task {
    pub fn id(&self) -> TaskId {
        match self {
            Task::Map { task_id, .. } | Task::Reduce { task_id } => *task_id,
        }
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            Task::Map { .. } => TaskKind::Map,
            Task::Reduce { .. } => TaskKind::Reduce,
        }
    }
}

/// Archivo de entrada descubierto por el coordinator. `size` es el peso
/// que usa el particionador.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputUnit {
    pub name: String,
    pub size: u64,
}

impl InputUnit {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_map_se_serializa_con_tag_type() {
        let t = Task::Map {
            task_id: 3,
            files: vec!["a.txt".to_string()],
        };
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v, json!({"type": "map", "task_id": 3, "files": ["a.txt"]}));
    }

    #[test]
    fn task_reduce_se_lee_desde_json() {
        let t: Task = serde_json::from_value(json!({"type": "reduce", "task_id": 1})).unwrap();
        assert_eq!(t, Task::Reduce { task_id: 1 });
        assert_eq!(t.kind(), TaskKind::Reduce);
        assert_eq!(t.id(), 1);
    }
}
