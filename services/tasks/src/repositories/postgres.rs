//! PostgreSQL-backed task store

use common::error::{DatabaseError, DatabaseResult};
use sqlx::{
    PgPool, Postgres, Row,
    postgres::{PgArguments, PgRow},
    query::Query,
};
use tracing::{debug, info};

use super::TaskStore;
use crate::{
    filter::{Predicate, TaskFilter},
    models::{Comment, Page, PageRequest, Sort, SortField, Task, TaskDraft},
};

const TASK_COLUMNS: &str =
    "id, title, description, status, priority, author_id, assignee_id, version, created_at, updated_at";

const COMMENT_COLUMNS: &str = "id, content, task_id, user_id, created_at";

/// Task store over the `tasks` and `comments` tables
#[derive(Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `WHERE` clause comparing one column per predicate, placeholders numbered
/// from `$1`; empty when there are no predicates
fn where_clause(predicates: &[Predicate]) -> String {
    if predicates.is_empty() {
        return String::new();
    }

    let conditions: Vec<String> = predicates
        .iter()
        .enumerate()
        .map(|(index, predicate)| format!("{} = ${}", predicate.column(), index + 1))
        .collect();

    format!(" WHERE {}", conditions.join(" AND "))
}

fn order_clause(sort: &Sort) -> String {
    let mut clause = format!(
        " ORDER BY {} {}",
        sort.field.sql_expression(),
        sort.direction.as_sql()
    );
    if sort.field != SortField::Id {
        clause.push_str(", id ASC");
    }
    clause
}

fn count_sql(predicates: &[Predicate]) -> String {
    format!("SELECT COUNT(*) FROM tasks{}", where_clause(predicates))
}

fn page_sql(predicates: &[Predicate], sort: &Sort) -> String {
    let next = predicates.len() + 1;
    format!(
        "SELECT {} FROM tasks{}{} LIMIT ${} OFFSET ${}",
        TASK_COLUMNS,
        where_clause(predicates),
        order_clause(sort),
        next,
        next + 1
    )
}

/// Bind predicate values in the order [`where_clause`] numbered them
fn bind_predicates<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    predicates: &[Predicate],
) -> Query<'q, Postgres, PgArguments> {
    for predicate in predicates {
        query = match *predicate {
            Predicate::Status(status) => query.bind(status.as_str()),
            Predicate::Priority(priority) => query.bind(priority.as_str()),
            Predicate::Author(id) | Predicate::Assignee(id) => query.bind(id),
        };
    }
    query
}

fn task_from_row(row: &PgRow) -> DatabaseResult<Task> {
    let status: String = row.try_get("status").map_err(DatabaseError::Query)?;
    let priority: String = row.try_get("priority").map_err(DatabaseError::Query)?;

    Ok(Task {
        id: row.try_get("id").map_err(DatabaseError::Query)?,
        title: row.try_get("title").map_err(DatabaseError::Query)?,
        description: row.try_get("description").map_err(DatabaseError::Query)?,
        status: status.parse().map_err(DatabaseError::Decode)?,
        priority: priority.parse().map_err(DatabaseError::Decode)?,
        author_id: row.try_get("author_id").map_err(DatabaseError::Query)?,
        assignee_id: row.try_get("assignee_id").map_err(DatabaseError::Query)?,
        version: row.try_get("version").map_err(DatabaseError::Query)?,
        created_at: row.try_get("created_at").map_err(DatabaseError::Query)?,
        updated_at: row.try_get("updated_at").map_err(DatabaseError::Query)?,
    })
}

fn comment_from_row(row: &PgRow) -> DatabaseResult<Comment> {
    Ok(Comment {
        id: row.try_get("id").map_err(DatabaseError::Query)?,
        content: row.try_get("content").map_err(DatabaseError::Query)?,
        task_id: row.try_get("task_id").map_err(DatabaseError::Query)?,
        user_id: row.try_get("user_id").map_err(DatabaseError::Query)?,
        created_at: row.try_get("created_at").map_err(DatabaseError::Query)?,
    })
}

impl TaskStore for PgTaskStore {
    async fn insert(&self, draft: &TaskDraft) -> DatabaseResult<Task> {
        info!("Creating task: {}", draft.title);

        let row = sqlx::query(&format!(
            "INSERT INTO tasks (title, description, status, priority, author_id, assignee_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.status.as_str())
        .bind(draft.priority.as_str())
        .bind(draft.author_id)
        .bind(draft.assignee_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        task_from_row(&row)
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Task>> {
        let row = sqlx::query(&format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        row.as_ref().map(task_from_row).transpose()
    }

    async fn update(&self, task: &Task) -> DatabaseResult<Option<Task>> {
        info!("Updating task {} at version {}", task.id, task.version);

        let row = sqlx::query(&format!(
            "UPDATE tasks SET title = $1, description = $2, status = $3, priority = $4, \
             author_id = $5, assignee_id = $6, version = version + 1, updated_at = NOW() \
             WHERE id = $7 AND version = $8 RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.author_id)
        .bind(task.assignee_id)
        .bind(task.id)
        .bind(task.version)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        row.as_ref().map(task_from_row).transpose()
    }

    async fn delete(&self, id: i64) -> DatabaseResult<bool> {
        info!("Deleting task: {}", id);

        // Comments go with the task through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, filter: &TaskFilter, page: &PageRequest) -> DatabaseResult<Page<Task>> {
        let predicates = filter.predicates();

        let count_sql = count_sql(&predicates);
        debug!("Counting tasks: {}", count_sql);
        let count_row = bind_predicates(sqlx::query(&count_sql), &predicates)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;
        let total: i64 = count_row.try_get(0).map_err(DatabaseError::Query)?;
        let total = u64::try_from(total).unwrap_or_default();

        if total == 0 {
            return Ok(Page::new(Vec::new(), page, 0));
        }

        let offset = i64::try_from(page.offset())
            .map_err(|_| DatabaseError::Configuration("page offset out of range".to_string()))?;

        let page_sql = page_sql(&predicates, &page.sort);
        debug!("Listing tasks: {}", page_sql);
        let rows = bind_predicates(sqlx::query(&page_sql), &predicates)
            .bind(i64::from(page.size))
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        let content = rows
            .iter()
            .map(task_from_row)
            .collect::<DatabaseResult<Vec<_>>>()?;

        Ok(Page::new(content, page, total))
    }

    async fn append_comment(
        &self,
        task_id: i64,
        user_id: i64,
        content: &str,
    ) -> DatabaseResult<Option<Comment>> {
        info!("Adding comment to task {} by user {}", task_id, user_id);

        let mut tx = self.pool.begin().await.map_err(DatabaseError::Query)?;

        // Locks the task row so a concurrent delete cannot orphan the comment
        let touched = sqlx::query("UPDATE tasks SET updated_at = NOW() WHERE id = $1 RETURNING id")
            .bind(task_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(DatabaseError::Query)?;

        if touched.is_none() {
            tx.rollback().await.map_err(DatabaseError::Query)?;
            return Ok(None);
        }

        let row = sqlx::query(&format!(
            "INSERT INTO comments (content, task_id, user_id) VALUES ($1, $2, $3) RETURNING {}",
            COMMENT_COLUMNS
        ))
        .bind(content)
        .bind(task_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(DatabaseError::from_query)?;

        tx.commit().await.map_err(DatabaseError::Query)?;

        comment_from_row(&row).map(Some)
    }

    async fn comments(&self, task_id: i64) -> DatabaseResult<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM comments WHERE task_id = $1 ORDER BY id ASC",
            COMMENT_COLUMNS
        ))
        .bind(task_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        rows.iter().map(comment_from_row).collect()
    }
}
