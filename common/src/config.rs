use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Configuración del job completo. Se lee una vez al arrancar y se pasa
/// por valor (o referencia) al coordinator y al worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mapreduce: MapReduceConfig,
    pub directories: DirectoriesConfig,
    pub coordinator: CoordinatorConfig,
    pub task_settings: TaskSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapReduceConfig {
    pub num_map_tasks: usize,
    pub num_reduce_tasks: usize,
}

impl Default for MapReduceConfig {
    fn default() -> Self {
        Self {
            num_map_tasks: 6,
            num_reduce_tasks: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoriesConfig {
    pub input: PathBuf,
    pub intermediate: PathBuf,
    pub output: PathBuf,
}

impl Default for DirectoriesConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/input"),
            intermediate: PathBuf::from("data/intermediate"),
            output: PathBuf::from("data/output"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub host: String,
    pub port: u16,
    /// Cada cuánto revisa el monitor si el job terminó (además del aviso
    /// que llega con cada tarea completada).
    #[serde(with = "humantime_serde")]
    pub monitor_interval: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            monitor_interval: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSettings {
    /// Fallos de red seguidos que el worker tolera antes de abortar.
    /// Con 0 el worker duerme `retry_delay` una vez y sale.
    pub retry_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            retry_attempts: 0,
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl Config {
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Lee `path` si existe; si no, usa los valores por defecto.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mapreduce.num_map_tasks == 0 {
            return Err(ConfigError::Invalid(
                "mapreduce.num_map_tasks debe ser mayor que 0".to_string(),
            ));
        }
        if self.mapreduce.num_reduce_tasks == 0 {
            return Err(ConfigError::Invalid(
                "mapreduce.num_reduce_tasks debe ser mayor que 0".to_string(),
            ));
        }
        for (key, value) in [
            ("mapreduce.num_map_tasks", self.mapreduce.num_map_tasks),
            ("mapreduce.num_reduce_tasks", self.mapreduce.num_reduce_tasks),
        ] {
            if u32::try_from(value).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "{} no puede superar {}",
                    key,
                    u32::MAX
                )));
            }
        }
        if self.coordinator.port == 0 {
            return Err(ConfigError::Invalid(
                "coordinator.port no puede ser 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.coordinator.host, self.coordinator.port)
    }

    /// URL base del coordinator.
    /// - Si está definida COORDINATOR_URL, se usa tal cual.
    /// - Si no, se arma con host y puerto de la configuración.
    pub fn coordinator_base_url(&self) -> String {
        env::var("COORDINATOR_URL")
            .unwrap_or_else(|_| format!("http://{}", self.bind_addr()))
    }
}
