//! In-memory task store
//!
//! Tables live behind a single `RwLock` so every operation sees and leaves a
//! consistent aggregate, matching the transactional behaviour of the
//! PostgreSQL store.

use chrono::Utc;
use common::error::DatabaseResult;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::RwLock;

use super::TaskStore;
use crate::{
    filter::TaskFilter,
    models::{Comment, Page, PageRequest, Task, TaskDraft},
};

#[derive(Debug, Default)]
struct Tables {
    tasks: BTreeMap<i64, Task>,
    comments: BTreeMap<i64, Comment>,
    last_task_id: i64,
    last_comment_id: i64,
}

/// Task store kept in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored comments across all tasks
    pub async fn comment_count(&self) -> usize {
        self.tables.read().await.comments.len()
    }
}

impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, draft: &TaskDraft) -> DatabaseResult<Task> {
        let mut tables = self.tables.write().await;
        tables.last_task_id += 1;

        let now = Utc::now();
        let task = Task {
            id: tables.last_task_id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            status: draft.status,
            priority: draft.priority,
            author_id: draft.author_id,
            assignee_id: draft.assignee_id,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.insert(task.id, task.clone());

        Ok(task)
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Task>> {
        Ok(self.tables.read().await.tasks.get(&id).cloned())
    }

    async fn update(&self, task: &Task) -> DatabaseResult<Option<Task>> {
        let mut tables = self.tables.write().await;

        let Some(stored) = tables.tasks.get_mut(&task.id) else {
            return Ok(None);
        };
        if stored.version != task.version {
            return Ok(None);
        }

        *stored = Task {
            version: task.version + 1,
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..task.clone()
        };

        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: i64) -> DatabaseResult<bool> {
        let mut tables = self.tables.write().await;

        if tables.tasks.remove(&id).is_none() {
            return Ok(false);
        }
        tables.comments.retain(|_, comment| comment.task_id != id);

        Ok(true)
    }

    async fn query(&self, filter: &TaskFilter, page: &PageRequest) -> DatabaseResult<Page<Task>> {
        let tables = self.tables.read().await;

        let mut matching: Vec<&Task> = tables
            .tasks
            .values()
            .filter(|task| filter.matches(task))
            .collect();
        matching.sort_by(|a, b| page.sort.compare(a, b));

        let total = matching.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let content = matching
            .into_iter()
            .skip(offset)
            .take(page.size as usize)
            .cloned()
            .collect();

        Ok(Page::new(content, page, total))
    }

    async fn append_comment(
        &self,
        task_id: i64,
        user_id: i64,
        content: &str,
    ) -> DatabaseResult<Option<Comment>> {
        let mut tables = self.tables.write().await;

        let now = Utc::now();
        match tables.tasks.get_mut(&task_id) {
            Some(task) => task.updated_at = now,
            None => return Ok(None),
        }

        tables.last_comment_id += 1;
        let comment = Comment {
            id: tables.last_comment_id,
            content: content.to_string(),
            task_id,
            user_id,
            created_at: now,
        };
        tables.comments.insert(comment.id, comment.clone());

        Ok(Some(comment))
    }

    async fn comments(&self, task_id: i64) -> DatabaseResult<Vec<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .values()
            .filter(|comment| comment.task_id == task_id)
            .cloned()
            .collect())
    }
}
