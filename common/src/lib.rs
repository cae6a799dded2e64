pub mod config;
pub mod error;
pub mod partition;
pub mod protocol;
pub mod scheduler;
pub mod task;
pub mod wordcount;

pub use config::Config;
pub use error::{ConfigError, PartitionError, SchedulerError};
pub use protocol::{
    ShutdownResponse, StatusResponse, TaskAssignmentRequest, TaskAssignmentResponse,
    TaskCompleteRequest, TaskCompleteResponse, WaitResponse, WorkerId,
};
pub use scheduler::{Assignment, CompletionOutcome, Scheduler};
pub use task::{InputUnit, Task, TaskId, TaskKind};
