use crate::clock::Clock;
use crate::error::Result;
use crate::storage::{ArchiveKey, TaskBackend, TaskStore};
use crate::task::ActiveTask;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Started,
    CheckedIn,
    Switched { archived: ArchiveKey },
    MarkedDistracted,
    NoCurrentTask,
}

/// Applies user actions to the store's current-task slot.
#[derive(Debug)]
pub struct TaskController<B, C> {
    store: TaskStore<B>,
    clock: C,
}

impl<B: TaskBackend, C: Clock> TaskController<B, C> {
    pub fn new(store: TaskStore<B>, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &TaskStore<B> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TaskStore<B> {
        &mut self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The task being tracked. A slot left holding an archived task reads as empty.
    pub fn current_task(&self) -> Result<Option<ActiveTask>> {
        Ok(self.store.current_task()?.filter(|task| !task.is_archived()))
    }

    /// Starts `name`, checks in if it is already current, or archives the
    /// current task and switches to `name`.
    pub fn start_or_switch(&mut self, name: &str) -> Result<Transition> {
        let now = self.clock.now_ms();
        let mut transition = Transition::Started;
        let mut archived_slot = None;

        if let Some(mut current) = self.store.current_task()? {
            if current.is_archived() {
                // An earlier switch archived this task but never installed its successor.
                let key = current.id.as_deref().map(str::parse::<ArchiveKey>);
                if let Some(Ok(archived)) = key {
                    transition = Transition::Switched { archived };
                }
            } else if current.name == name {
                current.still_working(now);
                self.store.set_current_task(Some(&current))?;
                return Ok(Transition::CheckedIn);
            } else {
                current.complete(now);
                let archived = self.store.archive(&current, self.clock.today())?;
                current.id = Some(archived.to_string());
                transition = Transition::Switched { archived };
                archived_slot = Some(current);
            }
        }

        let task = ActiveTask::new(name, now);
        if let Err(err) = self.store.set_current_task(Some(&task)) {
            // Leave the archived copy in the slot so a retry cannot archive it twice.
            if let Some(archived) = &archived_slot {
                if let Err(mark_err) = self.store.set_current_task(Some(archived)) {
                    tracing::error!(%mark_err, task = %archived.name, "could not mark the slot as archived");
                }
            }
            return Err(err);
        }
        tracing::debug!(task = name, "started task");
        Ok(transition)
    }

    pub fn still_working(&mut self) -> Result<Transition> {
        let Some(mut current) = self.current_task()? else {
            return Ok(Transition::NoCurrentTask);
        };
        current.still_working(self.clock.now_ms());
        self.store.set_current_task(Some(&current))?;
        Ok(Transition::CheckedIn)
    }

    pub fn distracted(&mut self) -> Result<Transition> {
        let Some(mut current) = self.current_task()? else {
            return Ok(Transition::NoCurrentTask);
        };
        current.mark_distracted(self.clock.now_ms());
        self.store.set_current_task(Some(&current))?;
        Ok(Transition::MarkedDistracted)
    }

    /// Today's archived tasks followed by the current task.
    pub fn today(&self) -> Result<Vec<ActiveTask>> {
        let mut tasks = self.store.read_day(self.clock.today())?;
        if let Some(current) = self.current_task()? {
            tasks.push(current);
        }
        Ok(tasks)
    }
}
