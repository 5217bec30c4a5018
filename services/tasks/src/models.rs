//! Domain models and HTTP payloads for the tasks service

use serde::Deserialize;

pub mod page;
pub mod task;

pub use page::{Page, PageRequest, Sort, SortDirection, SortField};
pub use task::{Comment, NewComment, NewTask, Task, TaskDraft, TaskPriority, TaskStatus, TaskUpdate};

/// Query parameters for task listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub author_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

impl TaskQuery {
    pub fn paging(&self) -> PageParams {
        PageParams {
            page: self.page,
            size: self.size,
            sort: self.sort.clone(),
        }
    }
}

/// Pagination query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    /// Page number (0-based)
    pub page: Option<u32>,
    /// Number of items per page
    pub size: Option<u32>,
    /// `field[,asc|desc]`
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusParam {
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriorityParam {
    pub priority: TaskPriority,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssigneeParam {
    pub assignee_id: i64,
}
