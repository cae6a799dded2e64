use std::collections::{HashSet, VecDeque};

use crate::error::SchedulerError;
use crate::partition::balanced_groups;
use crate::protocol::StatusResponse;
use crate::task::{InputUnit, Task, TaskId, TaskKind};

/// Resultado de pedir la siguiente tarea.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    Task(Task),
    /// La fase map está en vuelo: volver a preguntar más tarde.
    Wait,
    /// No hay nada que repartir ahora y no tiene sentido esperar.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    Recorded,
    Duplicate,
    /// Id fuera de rango: se acepta el reporte pero no se cuenta.
    Unknown,
}

/// Cola de tareas + registro de completadas.
///
/// No es thread-safe por sí mismo: el coordinator lo guarda detrás de un
/// único `Mutex` y todas las operaciones pasan por ese lock.
#[derive(Debug, Default)]
pub struct Scheduler {
    pending_map: VecDeque<Task>,
    pending_reduce: VecDeque<Task>,
    completed_map: HashSet<TaskId>,
    completed_reduce: HashSet<TaskId>,
    num_map: usize,
    num_reduce: usize,
    created: bool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Crea las tareas map (agrupando `units` por tamaño) y las `num_reduce`
    /// tareas reduce. Sólo se puede llamar una vez, antes de repartir nada.
    pub fn create_tasks(
        &mut self,
        units: &[InputUnit],
        num_map_requested: usize,
        num_reduce: usize,
    ) -> Result<(), SchedulerError> {
        if self.created {
            return Err(SchedulerError::AlreadyCreated);
        }
        if num_reduce == 0 {
            return Err(SchedulerError::NoReduceTasks);
        }

        let k = num_map_requested.min(units.len());
        task_id_for(k)?;
        task_id_for(num_reduce)?;

        let weights: Vec<u64> = units.iter().map(|u| u.size).collect();
        let groups = balanced_groups(&weights, k)?;

        for (i, group) in groups.into_iter().enumerate() {
            let files = group.into_iter().map(|idx| units[idx].name.clone()).collect();
            self.pending_map.push_back(Task::Map {
                task_id: task_id_for(i)?,
                files,
            });
        }
        // N efectivo: grupos no vacíos
        self.num_map = self.pending_map.len();

        for i in 0..num_reduce {
            self.pending_reduce.push_back(Task::Reduce {
                task_id: task_id_for(i)?,
            });
        }
        self.num_reduce = num_reduce;
        self.created = true;

        Ok(())
    }

    pub fn next_task(&mut self) -> Assignment {
        if let Some(task) = self.pending_map.pop_front() {
            return Assignment::Task(task);
        }

        if self.map_phase_done() {
            if let Some(task) = self.pending_reduce.pop_front() {
                return Assignment::Task(task);
            }
        }

        let done_maps = self.completed_map.len();
        if done_maps > 0 && done_maps < self.num_map {
            return Assignment::Wait;
        }

        Assignment::Done
    }

    pub fn complete_task(&mut self, kind: TaskKind, id: TaskId) -> CompletionOutcome {
        let (set, limit) = match kind {
            TaskKind::Map => (&mut self.completed_map, self.num_map),
            TaskKind::Reduce => (&mut self.completed_reduce, self.num_reduce),
        };

        if (id as usize) >= limit {
            return CompletionOutcome::Unknown;
        }
        if set.insert(id) {
            CompletionOutcome::Recorded
        } else {
            CompletionOutcome::Duplicate
        }
    }

    pub fn is_all_completed(&self) -> bool {
        self.map_phase_done() && self.completed_reduce.len() == self.num_reduce
    }

    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            completed_map_tasks: self.completed_map.len(),
            completed_reduce_tasks: self.completed_reduce.len(),
            all_completed: self.is_all_completed(),
            num_map_tasks: self.num_map,
            num_reduce_tasks: self.num_reduce,
            pending_map_tasks: self.pending_map.len(),
            pending_reduce_tasks: self.pending_reduce.len(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn num_map_tasks(&self) -> usize {
        self.num_map
    }

    pub fn num_reduce_tasks(&self) -> usize {
        self.num_reduce
    }

    fn map_phase_done(&self) -> bool {
        self.completed_map.len() == self.num_map
    }
}

fn task_id_for(i: usize) -> Result<TaskId, SchedulerError> {
    TaskId::try_from(i).map_err(|_| SchedulerError::TooManyTasks { requested: i })
}
