use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no se pudo leer la configuración {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML inválido: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("configuración inválida: {0}")]
    Invalid(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PartitionError {
    #[error("se pidieron 0 grupos para {items} elementos")]
    ZeroGroups { items: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("las tareas ya fueron creadas")]
    AlreadyCreated,
    #[error("hace falta al menos una tarea reduce")]
    NoReduceTasks,
    #[error("hay {units} archivos de entrada pero se pidieron 0 tareas map")]
    NoMapTasks { units: usize },
    #[error("{requested} tareas no entran en el rango de ids")]
    TooManyTasks { requested: usize },
}

impl From<PartitionError> for SchedulerError {
    fn from(e: PartitionError) -> Self {
        match e {
            PartitionError::ZeroGroups { items } => SchedulerError::NoMapTasks { units: items },
        }
    }
}
