//! Task storage
//!
//! [`TaskStore`] is the persistence seam of the task engine. Both
//! implementations resolve listings from the same [`TaskFilter`] predicates
//! and enforce the task version on update.

use common::error::DatabaseResult;
use std::future::Future;

use crate::{
    filter::TaskFilter,
    models::{Comment, Page, PageRequest, Task, TaskDraft},
};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryTaskStore;
pub use postgres::PgTaskStore;

/// Storage of tasks and their comments
pub trait TaskStore: Send + Sync {
    /// Persist a new task with version 0
    fn insert(&self, draft: &TaskDraft) -> impl Future<Output = DatabaseResult<Task>> + Send;

    fn find_by_id(&self, id: i64) -> impl Future<Output = DatabaseResult<Option<Task>>> + Send;

    /// Write every editable field of `task` if the stored version still
    /// equals `task.version`
    ///
    /// Returns the stored task with its version bumped, or `None` when the
    /// task is gone or was changed by someone else since it was loaded.
    fn update(&self, task: &Task) -> impl Future<Output = DatabaseResult<Option<Task>>> + Send;

    /// Delete a task together with its comments; false if it did not exist
    fn delete(&self, id: i64) -> impl Future<Output = DatabaseResult<bool>> + Send;

    /// One page of the tasks matching every predicate of `filter`
    fn query(
        &self,
        filter: &TaskFilter,
        page: &PageRequest,
    ) -> impl Future<Output = DatabaseResult<Page<Task>>> + Send;

    /// Append a comment to a task; `None` if the task does not exist
    fn append_comment(
        &self,
        task_id: i64,
        user_id: i64,
        content: &str,
    ) -> impl Future<Output = DatabaseResult<Option<Comment>>> + Send;

    /// Comments of a task in insertion order
    fn comments(&self, task_id: i64) -> impl Future<Output = DatabaseResult<Vec<Comment>>> + Send;
}
