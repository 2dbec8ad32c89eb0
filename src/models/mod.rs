pub mod task;

pub use task::{NewTask, Priority, Status, Task, UpdateTask};
