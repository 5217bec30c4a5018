//! Task filter resolution
//!
//! A [`TaskFilter`] holds up to four optional exact-match criteria. Instead
//! of dispatching each of the sixteen present/absent combinations to its own
//! query, the filter is lowered into the list of [`Predicate`]s for the
//! fields that are present and the stores evaluate their conjunction: the
//! PostgreSQL store renders one `column = $n` clause per predicate, the
//! in-memory store checks [`TaskFilter::matches`]. An empty list selects
//! every task.

use crate::models::{Task, TaskPriority, TaskStatus};

/// One exact-equality criterion on a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Status(TaskStatus),
    Priority(TaskPriority),
    Author(i64),
    Assignee(i64),
}

impl Predicate {
    /// Column of the `tasks` table the predicate compares
    pub fn column(&self) -> &'static str {
        match self {
            Predicate::Status(_) => "status",
            Predicate::Priority(_) => "priority",
            Predicate::Author(_) => "author_id",
            Predicate::Assignee(_) => "assignee_id",
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match *self {
            Predicate::Status(status) => task.status == status,
            Predicate::Priority(priority) => task.priority == priority,
            Predicate::Author(author_id) => task.author_id == author_id,
            // A task without assignee never matches an assignee criterion
            Predicate::Assignee(assignee_id) => task.assignee_id == Some(assignee_id),
        }
    }
}

/// Optional criteria of a task listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub author_id: Option<i64>,
    pub assignee_id: Option<i64>,
}

impl TaskFilter {
    /// Filter matching every task
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn author(mut self, author_id: i64) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn assignee(mut self, assignee_id: i64) -> Self {
        self.assignee_id = Some(assignee_id);
        self
    }

    fn present(&self) -> impl Iterator<Item = Predicate> {
        [
            self.status.map(Predicate::Status),
            self.priority.map(Predicate::Priority),
            self.author_id.map(Predicate::Author),
            self.assignee_id.map(Predicate::Assignee),
        ]
        .into_iter()
        .flatten()
    }

    /// Predicates for the present fields, in status, priority, author,
    /// assignee order
    pub fn predicates(&self) -> Vec<Predicate> {
        self.present().collect()
    }

    /// True when `task` satisfies every present criterion
    pub fn matches(&self, task: &Task) -> bool {
        self.present().all(|predicate| predicate.matches(task))
    }
}
