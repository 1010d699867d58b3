pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod reminder;
pub mod storage;
pub mod task;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{TaskController, Transition};
pub use error::{StorageError, TaskError};
pub use storage::{ArchiveKey, FileBackend, MemoryBackend, TaskBackend, TaskStore};
pub use task::ActiveTask;
