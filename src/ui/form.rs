use crate::db::repository;
use crate::models::{NewTask, Priority, Status, Task, UpdateTask};

/// Which form field currently has input focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Priority,
    DueDate,
}

impl FormField {
    pub fn next(self) -> FormField {
        match self {
            FormField::Title => FormField::Description,
            FormField::Description => FormField::Priority,
            FormField::Priority => FormField::DueDate,
            FormField::DueDate => FormField::Title,
        }
    }

    pub fn prev(self) -> FormField {
        match self {
            FormField::Title => FormField::DueDate,
            FormField::Description => FormField::Title,
            FormField::Priority => FormField::Description,
            FormField::DueDate => FormField::Priority,
        }
    }
}

/// State of the modal add/edit dialog. The status field is deliberately
/// absent: editing preserves the task's existing status.
#[derive(Debug, Clone)]
pub struct TaskForm {
    pub task_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_at: String,
    pub status: Status,
    pub focus: FormField,
    pub error: Option<String>,
}

impl TaskForm {
    pub fn add() -> Self {
        Self {
            task_id: None,
            title: String::new(),
            description: String::new(),
            priority: Priority::default(),
            due_at: String::new(),
            status: Status::default(),
            focus: FormField::Title,
            error: None,
        }
    }

    pub fn edit(task: &Task) -> Self {
        Self {
            task_id: Some(task.id),
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            due_at: task
                .due_at
                .map(|d| d.format(repository::DUE_DATE_FORMAT).to_string())
                .unwrap_or_default(),
            status: task.status,
            focus: FormField::Title,
            error: None,
        }
    }

    pub fn is_edit(&self) -> bool {
        self.task_id.is_some()
    }

    pub fn push_char(&mut self, c: char) {
        self.error = None;
        match self.focus {
            FormField::Title => self.title.push(c),
            FormField::Description => self.description.push(c),
            FormField::DueDate => self.due_at.push(c),
            FormField::Priority => {}
        }
    }

    pub fn pop_char(&mut self) {
        self.error = None;
        match self.focus {
            FormField::Title => {
                self.title.pop();
            }
            FormField::Description => {
                self.description.pop();
            }
            FormField::DueDate => {
                self.due_at.pop();
            }
            FormField::Priority => {}
        }
    }

    pub fn cycle_priority(&mut self) {
        let all = Priority::ALL;
        let idx = all.iter().position(|p| *p == self.priority).unwrap_or(1);
        self.priority = all[(idx + 1) % all.len()];
    }

    /// Client-side validation, mirroring the checks the store applies. Runs
    /// before the store call so the dialog can show the error in place.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        repository::parse_due_date(Some(self.due_at.as_str()))
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    fn due_at_input(&self) -> Option<String> {
        let trimmed = self.due_at.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    pub fn to_new_task(&self) -> NewTask {
        NewTask {
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            priority: self.priority,
            due_at: self.due_at_input(),
        }
    }

    pub fn to_update_task(&self) -> UpdateTask {
        UpdateTask {
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            priority: self.priority,
            status: self.status,
            due_at: self.due_at_input(),
        }
    }
}
